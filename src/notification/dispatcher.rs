use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::metrics::PushMetrics;
use crate::push::PushTransport;
use crate::subscription::{StoreError, Subscription, SubscriptionStore};
use crate::telemetry::{attributes, record_attribute};

use super::classify::{classify, Classification, GONE_STATUS_CODES};
use super::{DeliveryOutcome, DeliveryResult, DispatchMode, DispatchReport, NotificationPayload};

/// Call-level dispatch failure. Individual recipients never produce one.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("subscription store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

/// Fan-out tuning, fixed for the dispatcher's lifetime.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Delivery attempts in flight at once; 1 means strictly sequential
    pub max_concurrency: usize,
    /// Default bound for a whole `deliver` call
    pub deadline: Option<Duration>,
    /// Statuses that mark an endpoint as permanently gone
    pub prune_status_codes: Vec<u16>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            deadline: None,
            prune_status_codes: GONE_STATUS_CODES.to_vec(),
        }
    }
}

impl From<&DispatchConfig> for DispatchPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            deadline: config.deadline_ms.map(Duration::from_millis),
            prune_status_codes: config.prune_status_codes.clone(),
        }
    }
}

/// Statistics for the push dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub dispatches: AtomicU64,
    pub explicit_dispatches: AtomicU64,
    pub delivered: AtomicU64,
    pub transient_failures: AtomicU64,
    pub permanent_failures: AtomicU64,
    pub pruned: AtomicU64,
    pub prune_failures: AtomicU64,
    pub timeouts: AtomicU64,
    pub store_failures: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            explicit_dispatches: self.explicit_dispatches.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
            permanent_failures: self.permanent_failures.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            prune_failures: self.prune_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub dispatches: u64,
    pub explicit_dispatches: u64,
    pub delivered: u64,
    pub transient_failures: u64,
    pub permanent_failures: u64,
    pub pruned: u64,
    pub prune_failures: u64,
    pub timeouts: u64,
    pub store_failures: u64,
}

/// Delivers one notification to every subscription of a snapshot.
pub struct PushDispatcher {
    store: Arc<dyn SubscriptionStore>,
    transport: Arc<dyn PushTransport>,
    policy: DispatchPolicy,
    stats: DispatcherStats,
}

impl PushDispatcher {
    /// Sequential dispatcher pruning on 404/410, without a deadline.
    pub fn new(store: Arc<dyn SubscriptionStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self::with_policy(store, transport, DispatchPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn SubscriptionStore>,
        transport: Arc<dyn PushTransport>,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            store,
            transport,
            policy,
            stats: DispatcherStats::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SubscriptionStore> {
        &self.store
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Deliver `payload` to every stored subscription, or to `subscriptions`
    /// when given (store untouched, pruning disabled).
    ///
    /// Fails only when the store snapshot cannot be read. The policy deadline,
    /// if any, applies.
    pub async fn deliver(
        &self,
        payload: &NotificationPayload,
        subscriptions: Option<Vec<Subscription>>,
    ) -> Result<DispatchReport, DispatchError> {
        let deadline = self.policy.deadline.map(|d| Instant::now() + d);
        self.deliver_until(payload, subscriptions, deadline).await
    }

    /// Like [`deliver`](Self::deliver) with an explicit deadline. On expiry the
    /// in-flight attempts are dropped and the completed part is returned.
    #[tracing::instrument(
        name = "dispatcher.deliver",
        skip_all,
        fields(
            dispatch_id = tracing::field::Empty,
            mode = tracing::field::Empty,
            snapshot_size = tracing::field::Empty
        )
    )]
    pub async fn deliver_until(
        &self,
        payload: &NotificationPayload,
        subscriptions: Option<Vec<Subscription>>,
        deadline: Option<Instant>,
    ) -> Result<DispatchReport, DispatchError> {
        let started = std::time::Instant::now();
        let dispatch_id = Uuid::new_v4();
        let mode = match subscriptions {
            Some(_) => DispatchMode::Explicit,
            None => DispatchMode::Stored,
        };

        let span = tracing::Span::current();
        span.record("dispatch_id", tracing::field::display(dispatch_id));
        span.record("mode", mode.as_str());

        let snapshot = match subscriptions {
            Some(list) => list,
            None => self.store.list_all().await.map_err(|e| {
                self.stats.store_failures.fetch_add(1, Ordering::Relaxed);
                PushMetrics::record_store_unavailable();
                record_attribute(&span, attributes::store_backend(self.store.backend()));
                tracing::error!(
                    backend = self.store.backend(),
                    error = %e,
                    "Failed to read subscription snapshot"
                );
                DispatchError::StoreUnavailable(e)
            })?,
        };
        span.record("snapshot_size", snapshot.len());

        self.stats.dispatches.fetch_add(1, Ordering::Relaxed);
        if mode == DispatchMode::Explicit {
            self.stats.explicit_dispatches.fetch_add(1, Ordering::Relaxed);
        }
        PushMetrics::record_dispatch(mode.as_str());

        if snapshot.is_empty() {
            tracing::debug!("No subscriptions to deliver to");
            return Ok(DispatchReport::empty(dispatch_id, mode));
        }

        let prune = mode == DispatchMode::Stored;
        let (slots, timed_out) = self.fan_out(&snapshot, payload, prune, deadline).await;
        let report = DispatchReport::from_slots(dispatch_id, mode, slots, timed_out);

        if timed_out {
            self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
            PushMetrics::record_timeout();
        }
        PushMetrics::record_dispatch_duration(started.elapsed().as_secs_f64());

        tracing::info!(
            attempted = report.attempted,
            delivered = report.delivered(),
            failed = report.failed(),
            pruned = report.pruned(),
            timed_out = timed_out,
            "Dispatch complete"
        );

        record_attribute(&span, attributes::dispatch_id(dispatch_id));
        record_attribute(&span, attributes::dispatch_mode(mode.as_str()));
        record_attribute(&span, attributes::attempted_count(report.attempted));
        record_attribute(&span, attributes::delivered_count(report.delivered()));
        record_attribute(&span, attributes::failed_count(report.failed()));
        record_attribute(&span, attributes::pruned_count(report.pruned()));

        Ok(report)
    }

    /// Attempt every subscription with at most `max_concurrency` in flight.
    ///
    /// Results land in the slot of their snapshot index, so completion order
    /// never affects report order. Returns `true` when the deadline fired.
    async fn fan_out(
        &self,
        snapshot: &[Subscription],
        payload: &NotificationPayload,
        prune: bool,
        deadline: Option<Instant>,
    ) -> (Vec<Option<DeliveryResult>>, bool) {
        let total = snapshot.len();
        let limit = self.policy.max_concurrency.max(1);
        let mut slots: Vec<Option<DeliveryResult>> = vec![None; total];
        let mut in_flight = FuturesUnordered::new();
        let mut next = 0;

        let expiry = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expiry);

        loop {
            while in_flight.len() < limit && next < total {
                let index = next;
                let subscription = &snapshot[index];
                in_flight.push(async move { (index, self.attempt(subscription, payload, prune).await) });
                next += 1;
            }

            tokio::select! {
                biased;
                completed = in_flight.next() => match completed {
                    Some((index, result)) => slots[index] = Some(result),
                    None => return (slots, false),
                },
                _ = &mut expiry => {
                    let abandoned = in_flight.len() + (total - next);
                    tracing::warn!(
                        completed = total - abandoned,
                        abandoned = abandoned,
                        "Dispatch deadline reached, returning partial report"
                    );
                    return (slots, true);
                }
            }
        }
    }

    /// One subscription: send, classify, prune when permanent. Never fails.
    #[tracing::instrument(name = "dispatcher.attempt", level = "debug", skip_all)]
    async fn attempt(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
        prune: bool,
    ) -> DeliveryResult {
        let started = std::time::Instant::now();
        let sent = self.transport.send(subscription, payload).await;
        PushMetrics::record_attempt_latency(started.elapsed().as_secs_f64());

        let span = tracing::Span::current();
        record_attribute(&span, attributes::endpoint(&subscription.endpoint));
        match &sent {
            Ok(status) => record_attribute(&span, attributes::http_status(*status)),
            Err(e) => {
                if let Some(status) = e.status_code {
                    record_attribute(&span, attributes::http_status(status));
                }
            }
        }

        let endpoint = subscription.endpoint.clone();

        match classify(sent, &self.policy.prune_status_codes) {
            Classification::Delivered { status_code } => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                PushMetrics::record_delivered();
                tracing::debug!(endpoint = %endpoint, status = status_code, "Push delivered");

                DeliveryResult {
                    endpoint,
                    outcome: DeliveryOutcome::Success { status_code },
                    pruned: false,
                }
            }
            Classification::Permanent { status_code, reason } => {
                self.stats.permanent_failures.fetch_add(1, Ordering::Relaxed);
                PushMetrics::record_permanent_failure();
                tracing::info!(
                    endpoint = %endpoint,
                    status = status_code,
                    prune = prune,
                    "Push endpoint gone"
                );

                if prune {
                    self.prune(&endpoint).await;
                }

                DeliveryResult {
                    endpoint,
                    outcome: DeliveryOutcome::Failure {
                        status_code: Some(status_code),
                        reason,
                        permanent: true,
                    },
                    pruned: prune,
                }
            }
            Classification::Transient { status_code, reason } => {
                self.stats.transient_failures.fetch_add(1, Ordering::Relaxed);
                PushMetrics::record_transient_failure();
                tracing::warn!(
                    endpoint = %endpoint,
                    status = ?status_code,
                    reason = %reason,
                    "Push delivery failed"
                );

                DeliveryResult {
                    endpoint,
                    outcome: DeliveryOutcome::Failure {
                        status_code,
                        reason,
                        permanent: false,
                    },
                    pruned: false,
                }
            }
        }
    }

    /// Best-effort removal; failures are logged and counted only.
    async fn prune(&self, endpoint: &str) {
        match self.store.remove(endpoint).await {
            Ok(()) => {
                self.stats.pruned.fetch_add(1, Ordering::Relaxed);
                PushMetrics::record_pruned();
            }
            Err(e) => {
                self.stats.prune_failures.fetch_add(1, Ordering::Relaxed);
                PushMetrics::record_prune_failed();
                tracing::warn!(endpoint = %endpoint, error = %e, "Failed to prune subscription");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_config() {
        let config = DispatchConfig {
            max_concurrency: 0,
            deadline_ms: Some(1500),
            prune_status_codes: vec![410],
            ..DispatchConfig::default()
        };
        let policy = DispatchPolicy::from(&config);
        assert_eq!(policy.max_concurrency, 1);
        assert_eq!(policy.deadline, Some(Duration::from_millis(1500)));
        assert_eq!(policy.prune_status_codes, vec![410]);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = DispatcherStats::default();
        stats.dispatches.fetch_add(3, Ordering::Relaxed);
        stats.pruned.fetch_add(2, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.dispatches, 3);
        assert_eq!(snapshot.pruned, 2);
        assert_eq!(snapshot.delivered, 0);
    }
}
