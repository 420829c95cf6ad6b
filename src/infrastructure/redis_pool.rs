//! Redis connection handle with circuit breaker integration.

use std::future::Future;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::RedisResult;

use crate::config::RedisConfig;

use super::{CircuitBreaker, PoolError};

/// Auto-reconnecting Redis connection shared by all store operations.
///
/// `ConnectionManager` is cheap to clone; every operation gets its own clone so
/// concurrent reads and deletes never wait on each other.
#[derive(Clone)]
pub struct RedisPool {
    manager: ConnectionManager,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl RedisPool {
    pub async fn new(
        config: &RedisConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, PoolError> {
        let client = redis::Client::open(config.url.as_str())?;
        let manager = client.get_connection_manager().await?;

        tracing::info!("Redis connection manager created");

        Ok(Self {
            manager,
            circuit_breaker,
        })
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// Run `operation` unless the breaker is open, recording its outcome.
    pub async fn execute_with_circuit_breaker<T, F, Fut>(&self, operation: F) -> Result<T, PoolError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        if !self.circuit_breaker.allow_request() {
            return Err(PoolError::CircuitOpen);
        }

        match operation(self.manager.clone()).await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                Err(PoolError::Redis(e))
            }
        }
    }
}
