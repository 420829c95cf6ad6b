use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::push::{send_push, send_push_query};
use super::subscriptions::list_subscriptions;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Push endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/push/send", get(send_push_query).post(send_push))
                .route("/subscriptions", get(list_subscriptions))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
