//! Infrastructure layer modules
//!
//! - `circuit_breaker`: fail-fast guard shared by the store backends
//! - `postgres_pool`: PostgreSQL connection pool
//! - `redis_pool`: Redis connection manager

mod circuit_breaker;
mod postgres_pool;
mod redis_pool;

use thiserror::Error;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use postgres_pool::PostgresPool;
pub use redis_pool::RedisPool;

/// Errors raised by the connection pools.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Circuit breaker is open")]
    CircuitOpen,
}

/// Current time in milliseconds since epoch
pub(crate) fn current_time_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
