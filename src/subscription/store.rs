//! Store contract consumed by the dispatcher.

use async_trait::async_trait;
use thiserror::Error;

use crate::infrastructure::PoolError;

use super::Subscription;

/// Errors raised by subscription store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend is temporarily unavailable (e.g. circuit breaker open)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Postgres(e) => StoreError::Postgres(e),
            PoolError::Redis(e) => StoreError::Redis(e),
            PoolError::CircuitOpen => StoreError::Unavailable("circuit breaker is open".to_string()),
        }
    }
}

/// Durable registry of push subscriptions.
///
/// Implementations must tolerate `list_all` running while `remove` calls from
/// another dispatch are still in flight.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Whether the backend currently accepts requests.
    fn is_available(&self) -> bool {
        true
    }

    /// Point-in-time snapshot of every stored subscription.
    async fn list_all(&self) -> Result<Vec<Subscription>, StoreError>;

    /// Delete a subscription by endpoint. Unknown endpoints are not an error.
    async fn remove(&self, endpoint: &str) -> Result<(), StoreError>;
}

/// Drop rows that violate the subscription invariants, keeping order.
pub(crate) fn retain_valid(backend: &str, subscriptions: Vec<Subscription>) -> Vec<Subscription> {
    subscriptions
        .into_iter()
        .filter(|sub| match sub.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(backend = backend, error = %e, "Skipping invalid stored subscription");
                false
            }
        })
        .collect()
}
