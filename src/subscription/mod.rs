//! Push subscriptions and the stores that hold them.
//!
//! # Store backends
//!
//! - `MemorySubscriptionStore`: insertion-ordered, process-local (default)
//! - `PostgresSubscriptionStore`: `push_subscriptions` table
//! - `RedisSubscriptionStore`: one hash keyed by endpoint
//!
//! Use `create_subscription_store()` to pick a backend from configuration.

mod factory;
mod memory_store;
mod postgres_store;
mod redis_store;
mod store;
mod types;

pub use factory::create_subscription_store;
pub use memory_store::MemorySubscriptionStore;
pub use postgres_store::PostgresSubscriptionStore;
pub use redis_store::RedisSubscriptionStore;
pub use store::{StoreError, SubscriptionStore};
pub use types::{Subscription, SubscriptionError, SubscriptionKeys};
