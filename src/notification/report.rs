use serde::Serialize;
use uuid::Uuid;

/// Where the dispatch snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Snapshot read from the subscription store; permanent failures are pruned.
    Stored,
    /// Caller-supplied subscriptions; nothing is ever removed from the store.
    Explicit,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Stored => "stored",
            DispatchMode::Explicit => "explicit",
        }
    }
}

/// Terminal outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Success {
        status_code: u16,
    },
    Failure {
        /// `None` when no HTTP response was received
        status_code: Option<u16>,
        reason: String,
        /// Push service reported the endpoint as gone
        permanent: bool,
    },
}

/// Outcome for one subscription of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub endpoint: String,
    pub outcome: DeliveryOutcome,
    /// Removal from the store was issued for this subscription
    pub pruned: bool,
}

impl DeliveryResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Success { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.outcome {
            DeliveryOutcome::Success { status_code } => Some(*status_code),
            DeliveryOutcome::Failure { status_code, .. } => *status_code,
        }
    }
}

/// Summary of one `deliver` call.
///
/// `results` follows snapshot order. `attempted` is the snapshot size; when
/// `timed_out` is set, `results` only holds the subscriptions that completed
/// before the deadline.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub dispatch_id: Uuid,
    pub mode: DispatchMode,
    pub attempted: usize,
    pub results: Vec<DeliveryResult>,
    pub timed_out: bool,
}

impl DispatchReport {
    pub(crate) fn empty(dispatch_id: Uuid, mode: DispatchMode) -> Self {
        Self {
            dispatch_id,
            mode,
            attempted: 0,
            results: Vec::new(),
            timed_out: false,
        }
    }

    /// Assemble a report from per-index slots; unfilled slots are attempts
    /// cut off by the deadline.
    pub(crate) fn from_slots(
        dispatch_id: Uuid,
        mode: DispatchMode,
        slots: Vec<Option<DeliveryResult>>,
        timed_out: bool,
    ) -> Self {
        let attempted = slots.len();
        Self {
            dispatch_id,
            mode,
            attempted,
            results: slots.into_iter().flatten().collect(),
            timed_out,
        }
    }

    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.delivered()
    }

    pub fn pruned(&self) -> usize {
        self.results.iter().filter(|r| r.pruned).count()
    }

    pub fn result_for(&self, endpoint: &str) -> Option<&DeliveryResult> {
        self.results.iter().find(|r| r.endpoint == endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(endpoint: &str) -> DeliveryResult {
        DeliveryResult {
            endpoint: endpoint.to_string(),
            outcome: DeliveryOutcome::Success { status_code: 201 },
            pruned: false,
        }
    }

    fn gone(endpoint: &str) -> DeliveryResult {
        DeliveryResult {
            endpoint: endpoint.to_string(),
            outcome: DeliveryOutcome::Failure {
                status_code: Some(410),
                reason: "gone".to_string(),
                permanent: true,
            },
            pruned: true,
        }
    }

    #[test]
    fn test_from_slots_keeps_order_and_counts() {
        let report = DispatchReport::from_slots(
            Uuid::nil(),
            DispatchMode::Stored,
            vec![Some(success("a")), None, Some(gone("c"))],
            true,
        );

        assert_eq!(report.attempted, 3);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].endpoint, "a");
        assert_eq!(report.results[1].endpoint, "c");
        assert_eq!(report.delivered(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.pruned(), 1);
        assert_eq!(report.result_for("c").and_then(|r| r.status_code()), Some(410));
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(gone("https://push.example/1")).unwrap();
        assert_eq!(value["outcome"]["status"], "failure");
        assert_eq!(value["outcome"]["status_code"], 410);
        assert_eq!(value["pruned"], true);

        let value = serde_json::to_value(success("https://push.example/2")).unwrap();
        assert_eq!(value["outcome"]["status"], "success");
    }
}
