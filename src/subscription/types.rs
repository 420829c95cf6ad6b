use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A registered push endpoint plus the keys needed to encrypt a message to it.
///
/// Serializes in the browser `PushSubscription.toJSON()` shape:
/// `{ "endpoint": "...", "keys": { "p256dh": "...", "auth": "..." } }`.
/// The endpoint is the unique key of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Push service URL
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Client P-256 ECDH public key (base64url)
    pub p256dh: String,
    /// Client auth secret (base64url)
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("subscription endpoint is empty")]
    EmptyEndpoint,

    #[error("subscription {0} has an empty p256dh or auth key")]
    EmptyKeys(String),
}

impl Subscription {
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }

    /// Check the endpoint and both keys are non-empty.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        if self.endpoint.trim().is_empty() {
            return Err(SubscriptionError::EmptyEndpoint);
        }
        if self.keys.p256dh.trim().is_empty() || self.keys.auth.trim().is_empty() {
            return Err(SubscriptionError::EmptyKeys(self.endpoint.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_json_shape() {
        let json = r#"{
            "endpoint": "https://fcm.googleapis.com/fcm/send/abc",
            "expirationTime": null,
            "keys": { "p256dh": "BPk", "auth": "xyz" }
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub, Subscription::new("https://fcm.googleapis.com/fcm/send/abc", "BPk", "xyz"));

        let value = serde_json::to_value(&sub).unwrap();
        assert_eq!(value["keys"]["auth"], "xyz");
    }

    #[test]
    fn test_validate() {
        assert!(Subscription::new("https://push.example/1", "k", "a").validate().is_ok());
        assert_eq!(
            Subscription::new("  ", "k", "a").validate(),
            Err(SubscriptionError::EmptyEndpoint)
        );
        assert_eq!(
            Subscription::new("https://push.example/1", "k", "").validate(),
            Err(SubscriptionError::EmptyKeys("https://push.example/1".to_string()))
        );
    }
}
