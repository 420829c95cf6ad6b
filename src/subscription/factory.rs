//! Subscription store factory

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::infrastructure::{PostgresPool, RedisPool};

use super::memory_store::MemorySubscriptionStore;
use super::postgres_store::PostgresSubscriptionStore;
use super::redis_store::RedisSubscriptionStore;
use super::store::SubscriptionStore;

/// Create a subscription store based on configuration.
///
/// - `"postgres"`: `PostgresSubscriptionStore` if a PostgreSQL pool is provided
/// - `"redis"`: `RedisSubscriptionStore` if a Redis pool is provided
/// - `"memory"` (default): `MemorySubscriptionStore`
///
/// A backend whose pool is missing falls back to memory with a warning.
pub fn create_subscription_store(
    settings: &StoreConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
    redis_pool: Option<Arc<RedisPool>>,
) -> Arc<dyn SubscriptionStore> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL subscription store");
                Arc::new(PostgresSubscriptionStore::new(pool))
            } else {
                tracing::warn!(
                    "PostgreSQL store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemorySubscriptionStore::new())
            }
        }
        "redis" => {
            if let Some(pool) = redis_pool {
                tracing::info!(
                    backend = "redis",
                    key = %settings.prefix,
                    "Creating Redis subscription store"
                );
                Arc::new(RedisSubscriptionStore::new(pool, settings.prefix.clone()))
            } else {
                tracing::warn!("Redis store requested but no pool provided, falling back to memory");
                Arc::new(MemorySubscriptionStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory subscription store");
            Arc::new(MemorySubscriptionStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_config(backend: &str) -> StoreConfig {
        StoreConfig {
            backend: backend.to_string(),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_memory_is_default() {
        let store = create_subscription_store(&store_config("anything"), None, None);
        assert_eq!(store.backend(), "memory");
        assert!(store.is_available());
    }

    #[test]
    fn test_missing_pool_falls_back_to_memory() {
        let store = create_subscription_store(&store_config("postgres"), None, None);
        assert_eq!(store.backend(), "memory");

        let store = create_subscription_store(&store_config("redis"), None, None);
        assert_eq!(store.backend(), "memory");
    }
}
