//! Web Push transport: RFC 8291 payload encryption and VAPID signing via the
//! `web-push` crate, HTTP delivery via `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessage, WebPushMessageBuilder,
};

use crate::config::DispatchConfig;
use crate::notification::NotificationPayload;
use crate::subscription::Subscription;

use super::{PushDeliveryError, PushTransport, VapidCredentials};

/// Push transport reusing one `reqwest::Client` for connection pooling.
pub struct WebPushTransport {
    client: reqwest::Client,
    credentials: Arc<VapidCredentials>,
    ttl_seconds: u32,
}

impl WebPushTransport {
    pub fn new(
        credentials: Arc<VapidCredentials>,
        config: &DispatchConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            credentials,
            ttl_seconds: config.ttl_seconds,
        })
    }

    /// Encrypt `content` for `subscription` and sign the request.
    fn build_message(
        &self,
        subscription: &Subscription,
        content: &[u8],
    ) -> Result<WebPushMessage, PushDeliveryError> {
        let sub_info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        );

        let mut sig_builder =
            VapidSignatureBuilder::from_base64(self.credentials.private_key_base64url(), &sub_info)
                .map_err(|e| PushDeliveryError::network(format!("VAPID key rejected: {e}")))?;
        sig_builder.add_claim("sub", self.credentials.subject());
        let signature = sig_builder
            .build()
            .map_err(|e| PushDeliveryError::network(format!("VAPID signing failed: {e}")))?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, content);
        builder.set_vapid_signature(signature);
        builder.set_ttl(self.ttl_seconds);

        builder
            .build()
            .map_err(|e| PushDeliveryError::network(format!("message encryption failed: {e}")))
    }
}

/// Map a push service response onto the transport result.
fn response_outcome(status: u16, body: String) -> Result<u16, PushDeliveryError> {
    if (200..300).contains(&status) {
        Ok(status)
    } else {
        Err(PushDeliveryError::http(status, body))
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<u16, PushDeliveryError> {
        let content = payload
            .to_bytes()
            .map_err(|e| PushDeliveryError::network(format!("payload serialization failed: {e}")))?;
        let message = self.build_message(subscription, &content)?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushDeliveryError::network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = if response.status().is_success() {
            String::new()
        } else {
            response.text().await.unwrap_or_default()
        };

        tracing::trace!(endpoint = %subscription.endpoint, status = status, "Push service responded");

        response_outcome(status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
    use p256::ecdsa::SigningKey;
    use p256::elliptic_curve::rand_core::OsRng;

    /// A subscription with real browser-side keys so encryption succeeds.
    fn browser_subscription(endpoint: &str) -> Subscription {
        let client_key = SigningKey::random(&mut OsRng);
        let p256dh = BASE64URL.encode(client_key.verifying_key().to_encoded_point(false).as_bytes());
        let auth = BASE64URL.encode([42u8; 16]);
        Subscription::new(endpoint, p256dh, auth)
    }

    fn transport() -> WebPushTransport {
        let credentials = Arc::new(VapidCredentials::generate("mailto:ops@example.com"));
        WebPushTransport::new(credentials, &DispatchConfig::default()).unwrap()
    }

    #[test]
    fn test_build_message_encrypts_payload() {
        let transport = transport();
        let sub = browser_subscription("https://push.example.com/send/abc");
        let plaintext = NotificationPayload::new("Hello", "World").to_bytes().unwrap();

        let message = transport.build_message(&sub, &plaintext).expect("message builds");
        assert_eq!(message.endpoint.to_string(), "https://push.example.com/send/abc");
        assert_eq!(message.ttl, 86_400);

        let payload = message.payload.expect("encrypted payload");
        assert_eq!(payload.content_encoding.to_str(), "aes128gcm");
        assert!(!payload.content.is_empty());
        assert_ne!(payload.content, plaintext);
    }

    #[test]
    fn test_build_message_rejects_garbage_keys() {
        let transport = transport();
        let sub = Subscription::new("https://push.example.com/send/abc", "bogus", "bogus");

        let err = transport.build_message(&sub, b"{}").unwrap_err();
        assert_eq!(err.status_code, None);
    }

    #[test]
    fn test_response_outcome() {
        assert_eq!(response_outcome(201, String::new()), Ok(201));
        assert_eq!(
            response_outcome(410, "gone".into()),
            Err(PushDeliveryError::http(410, "gone"))
        );
        assert_eq!(
            response_outcome(503, String::new()).unwrap_err().status_code,
            Some(503)
        );
    }
}
