//! PostgreSQL-backed subscription store.
//!
//! Table structure:
//! - `push_subscriptions(endpoint TEXT PRIMARY KEY, p256dh TEXT, auth TEXT, created_at TIMESTAMPTZ)`

use std::sync::Arc;

use async_trait::async_trait;

use crate::infrastructure::PostgresPool;

use super::store::{retain_valid, StoreError, SubscriptionStore};
use super::Subscription;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS push_subscriptions (
    endpoint   TEXT PRIMARY KEY,
    p256dh     TEXT NOT NULL,
    auth       TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const LIST_SQL: &str = r#"
SELECT endpoint, p256dh, auth
FROM push_subscriptions
ORDER BY created_at ASC, endpoint ASC
"#;

const DELETE_SQL: &str = "DELETE FROM push_subscriptions WHERE endpoint = $1";

pub struct PostgresSubscriptionStore {
    pool: Arc<PostgresPool>,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: Arc<PostgresPool>) -> Self {
        Self { pool }
    }

    /// Create the subscriptions table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(self.pool.pool())
            .await?;
        tracing::info!("push_subscriptions table ready");
        Ok(())
    }
}

fn row_to_subscription((endpoint, p256dh, auth): (String, String, String)) -> Subscription {
    Subscription::new(endpoint, p256dh, auth)
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn is_available(&self) -> bool {
        self.pool.circuit_breaker().allow_request()
    }

    async fn list_all(&self) -> Result<Vec<Subscription>, StoreError> {
        let rows: Vec<(String, String, String)> = self
            .pool
            .execute_with_circuit_breaker(|pool| async move {
                sqlx::query_as(LIST_SQL).fetch_all(&pool).await
            })
            .await?;

        let subscriptions = rows.into_iter().map(row_to_subscription).collect();
        Ok(retain_valid(self.backend(), subscriptions))
    }

    async fn remove(&self, endpoint: &str) -> Result<(), StoreError> {
        let endpoint = endpoint.to_string();
        let result = self
            .pool
            .execute_with_circuit_breaker(|pool| async move {
                sqlx::query(DELETE_SQL).bind(endpoint).execute(&pool).await
            })
            .await?;

        tracing::trace!(rows = result.rows_affected(), "Subscription delete executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let sub = row_to_subscription((
            "https://push.example/1".to_string(),
            "key".to_string(),
            "auth".to_string(),
        ));
        assert_eq!(sub.endpoint, "https://push.example/1");
        assert_eq!(sub.keys.p256dh, "key");
        assert_eq!(sub.keys.auth, "auth");
    }

    #[test]
    fn test_delete_is_keyed_by_endpoint() {
        assert!(DELETE_SQL.contains("WHERE endpoint = $1"));
        assert!(LIST_SQL.contains("ORDER BY"));
    }
}
