//! Dispatch trigger endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::notification::{DeliveryResult, DispatchMode, DispatchReport, InboundPayload};
use crate::server::AppState;
use crate::subscription::Subscription;

/// Request to deliver one notification
#[derive(Debug, Deserialize)]
pub struct SendPushRequest {
    /// Notification content
    pub payload: InboundPayload,
    /// Explicit recipients; when absent every stored subscription is used
    #[serde(default)]
    pub subscriptions: Option<Vec<Subscription>>,
}

/// Query-string form of a stored dispatch: `?title=..&message=..`
#[derive(Debug, Default, Deserialize)]
pub struct SendPushQuery {
    pub title: Option<String>,
    pub message: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub url: Option<String>,
}

impl From<SendPushQuery> for InboundPayload {
    fn from(query: SendPushQuery) -> Self {
        InboundPayload {
            title: query.title,
            body: query.body,
            message: query.message,
            icon: query.icon,
            url: query.url,
        }
    }
}

/// Response for dispatch operations
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    /// Every subscription reached a terminal outcome (no deadline cut-off)
    pub success: bool,
    pub dispatch_id: Uuid,
    pub mode: DispatchMode,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub pruned: usize,
    pub timed_out: bool,
    /// Per-subscription outcomes in snapshot order
    pub results: Vec<DeliveryResult>,
    pub timestamp: DateTime<Utc>,
}

impl From<DispatchReport> for DispatchResponse {
    fn from(report: DispatchReport) -> Self {
        Self {
            success: !report.timed_out,
            dispatch_id: report.dispatch_id,
            mode: report.mode,
            attempted: report.attempted,
            delivered: report.delivered(),
            failed: report.failed(),
            pruned: report.pruned(),
            timed_out: report.timed_out,
            results: report.results,
            timestamp: Utc::now(),
        }
    }
}

/// POST /api/v1/push/send
pub async fn send_push(
    State(state): State<AppState>,
    Json(request): Json<SendPushRequest>,
) -> Result<Json<DispatchResponse>> {
    let payload = request
        .payload
        .normalize(state.settings.dispatch.default_icon.as_deref())?;

    if let Some(subscriptions) = &request.subscriptions {
        for subscription in subscriptions {
            subscription.validate()?;
        }
    }

    let report = state
        .dispatcher
        .deliver(&payload, request.subscriptions)
        .await?;

    Ok(Json(DispatchResponse::from(report)))
}

/// GET /api/v1/push/send - stored dispatch driven by query parameters
pub async fn send_push_query(
    State(state): State<AppState>,
    Query(query): Query<SendPushQuery>,
) -> Result<Json<DispatchResponse>> {
    let payload = InboundPayload::from(query)
        .normalize(state.settings.dispatch.default_icon.as_deref())?;

    let report = state.dispatcher.deliver(&payload, None).await?;

    Ok(Json(DispatchResponse::from(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_message_is_body() {
        let query = SendPushQuery {
            title: Some("Hi".into()),
            message: Some("from query".into()),
            ..SendPushQuery::default()
        };
        let payload = InboundPayload::from(query).normalize(None).unwrap();
        assert_eq!(payload.body(), "from query");
    }

    #[test]
    fn test_request_without_subscriptions() {
        let request: SendPushRequest = serde_json::from_value(json!({
            "payload": { "title": "Hello", "message": "World" }
        }))
        .unwrap();
        assert!(request.subscriptions.is_none());
        assert_eq!(request.payload.message.as_deref(), Some("World"));
    }
}
