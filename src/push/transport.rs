use async_trait::async_trait;
use thiserror::Error;

use crate::notification::NotificationPayload;
use crate::subscription::Subscription;

/// A delivery attempt that did not end in a 2xx response.
///
/// `status_code` is `None` when no HTTP response was received (DNS, TLS,
/// timeout, or the message could not be built).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.status_code, .body))]
pub struct PushDeliveryError {
    pub status_code: Option<u16>,
    pub body: String,
}

fn describe(status_code: &Option<u16>, body: &str) -> String {
    match *status_code {
        Some(status) if body.is_empty() => format!("push service responded with HTTP {status}"),
        Some(status) => format!("push service responded with HTTP {status}: {body}"),
        None => format!("push request failed: {body}"),
    }
}

impl PushDeliveryError {
    /// Push service answered with a non-2xx status.
    pub fn http(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            body: body.into(),
        }
    }

    /// No HTTP response was obtained.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            body: message.into(),
        }
    }
}

/// One authenticated delivery attempt to one push endpoint.
///
/// Returns the 2xx status code on success. Credentials belong to the
/// implementation and are fixed at construction.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<u16, PushDeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            PushDeliveryError::http(410, "").to_string(),
            "push service responded with HTTP 410"
        );
        assert_eq!(
            PushDeliveryError::http(400, "bad jwt").to_string(),
            "push service responded with HTTP 400: bad jwt"
        );
        assert_eq!(
            PushDeliveryError::network("connection refused").to_string(),
            "push request failed: connection refused"
        );
    }
}
