use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::server::AppState;
use crate::subscription::Subscription;

#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    pub backend: &'static str,
    pub count: usize,
    pub subscriptions: Vec<Subscription>,
}

/// GET /api/v1/subscriptions - current store snapshot
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<SubscriptionListResponse>> {
    let subscriptions = state.store.list_all().await?;

    Ok(Json(SubscriptionListResponse {
        backend: state.store.backend(),
        count: subscriptions.len(),
        subscriptions,
    }))
}
