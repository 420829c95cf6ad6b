//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod metrics;
mod push;
mod routes;
mod subscriptions;

// Re-export all handlers for use in server/app.rs
pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use push::{send_push, send_push_query, DispatchResponse, SendPushQuery, SendPushRequest};
pub use routes::api_routes;
pub use subscriptions::{list_subscriptions, SubscriptionListResponse};
