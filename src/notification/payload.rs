use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URL opened when the notification is clicked and none was given.
pub const DEFAULT_TARGET_URL: &str = "/";

/// Canonical notification document delivered to every subscription.
///
/// Serialized as `{ "title", "body", "icon"?, "url" }`, the shape the
/// receiving service worker reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    title: String,
    body: String,
    #[serde(rename = "icon", skip_serializing_if = "Option::is_none")]
    icon_ref: Option<String>,
    #[serde(rename = "url")]
    target_url: String,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon_ref: None,
            target_url: DEFAULT_TARGET_URL.to_string(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon_ref = Some(icon.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon_ref.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.target_url
    }

    /// JSON bytes handed to the transport for encryption.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("notification title is required")]
    MissingTitle,
}

/// Notification as received from callers.
///
/// Older clients send the text as `message`; `body` wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub message: Option<String>,
    pub icon: Option<String>,
    pub url: Option<String>,
}

impl InboundPayload {
    /// Normalize into a `NotificationPayload`, filling the icon from `default_icon`
    /// and the URL from [`DEFAULT_TARGET_URL`] when absent.
    pub fn normalize(self, default_icon: Option<&str>) -> Result<NotificationPayload, PayloadError> {
        let title = non_blank(self.title).ok_or(PayloadError::MissingTitle)?;
        let mut payload = NotificationPayload::new(title, self.body.or(self.message).unwrap_or_default());

        if let Some(icon) = non_blank(self.icon).or_else(|| default_icon.map(str::to_string)) {
            payload = payload.with_icon(icon);
        }
        if let Some(url) = non_blank(self.url) {
            payload = payload.with_url(url);
        }

        Ok(payload)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_field_names() {
        let payload = NotificationPayload::new("Sale", "50% off").with_icon("/icon-192.png");
        let value: serde_json::Value = serde_json::from_slice(&payload.to_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "title": "Sale", "body": "50% off", "icon": "/icon-192.png", "url": "/" })
        );

        let no_icon = serde_json::to_value(NotificationPayload::new("t", "b")).unwrap();
        assert!(no_icon.get("icon").is_none());
    }

    #[test]
    fn test_message_alias_normalizes_to_body() {
        let inbound: InboundPayload =
            serde_json::from_value(json!({ "title": "Hi", "message": "legacy text" })).unwrap();
        let payload = inbound.normalize(None).unwrap();
        assert_eq!(payload.body(), "legacy text");
        assert_eq!(payload.url(), "/");
        assert_eq!(payload.icon(), None);
    }

    #[test]
    fn test_body_and_message_both_present() {
        let inbound: InboundPayload = serde_json::from_value(
            json!({ "title": "Hi", "body": "current text", "message": "legacy text" }),
        )
        .unwrap();
        let payload = inbound.normalize(None).unwrap();
        assert_eq!(payload.body(), "current text");
    }

    #[test]
    fn test_default_icon_and_url() {
        let inbound = InboundPayload {
            title: Some("Hi".into()),
            body: Some("there".into()),
            icon: Some("  ".into()),
            url: Some("/coupons".into()),
            ..Default::default()
        };
        let payload = inbound.normalize(Some("https://cdn.example/icon.png")).unwrap();
        assert_eq!(payload.icon(), Some("https://cdn.example/icon.png"));
        assert_eq!(payload.url(), "/coupons");
    }

    #[test]
    fn test_missing_title_rejected() {
        let inbound = InboundPayload {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(inbound.normalize(None), Err(PayloadError::MissingTitle));
    }
}
