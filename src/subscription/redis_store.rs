//! Redis-backed subscription store.
//!
//! All subscriptions live in one hash: field = endpoint, value = subscription JSON.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::infrastructure::RedisPool;

use super::store::{retain_valid, StoreError, SubscriptionStore};
use super::Subscription;

pub struct RedisSubscriptionStore {
    pool: Arc<RedisPool>,
    key: String,
}

impl RedisSubscriptionStore {
    pub fn new(pool: Arc<RedisPool>, key: impl Into<String>) -> Self {
        Self {
            pool,
            key: key.into(),
        }
    }
}

/// Decode hash entries, skipping corrupt values, ordered by endpoint.
fn decode_entries(entries: HashMap<String, String>) -> Vec<Subscription> {
    let mut subscriptions: Vec<Subscription> = entries
        .into_iter()
        .filter_map(|(endpoint, raw)| match serde_json::from_str::<Subscription>(&raw) {
            Ok(sub) if sub.endpoint == endpoint => Some(sub),
            Ok(_) => {
                tracing::warn!(endpoint = %endpoint, "Stored subscription endpoint mismatch, skipping");
                None
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Failed to decode stored subscription, skipping");
                None
            }
        })
        .collect();

    subscriptions.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
    subscriptions
}

#[async_trait]
impl SubscriptionStore for RedisSubscriptionStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    fn is_available(&self) -> bool {
        self.pool.circuit_breaker().allow_request()
    }

    async fn list_all(&self) -> Result<Vec<Subscription>, StoreError> {
        let key = self.key.clone();
        let entries: HashMap<String, String> = self
            .pool
            .execute_with_circuit_breaker(|mut conn| async move { conn.hgetall(key).await })
            .await?;

        Ok(retain_valid(self.backend(), decode_entries(entries)))
    }

    async fn remove(&self, endpoint: &str) -> Result<(), StoreError> {
        let key = self.key.clone();
        let field = endpoint.to_string();
        let removed: i64 = self
            .pool
            .execute_with_circuit_breaker(|mut conn| async move { conn.hdel(key, field).await })
            .await?;

        tracing::trace!(removed = removed, "Subscription hash field deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sub: &Subscription) -> (String, String) {
        (sub.endpoint.clone(), serde_json::to_string(sub).unwrap())
    }

    #[test]
    fn test_decode_sorts_and_skips_corrupt_values() {
        let a = Subscription::new("https://push.example/a", "k", "s");
        let b = Subscription::new("https://push.example/b", "k", "s");

        let mut entries = HashMap::new();
        entries.extend([entry(&b), entry(&a)]);
        entries.insert("https://push.example/c".to_string(), "not json".to_string());
        entries.insert("https://push.example/d".to_string(), serde_json::to_string(&a).unwrap());

        let decoded = decode_entries(entries);
        assert_eq!(decoded, vec![a, b]);
    }
}
