use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::infrastructure::CircuitBreaker;
use crate::notification::PushDispatcher;
use crate::subscription::SubscriptionStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<PushDispatcher>,
    pub store: Arc<dyn SubscriptionStore>,
    /// Breaker guarding the persistent store, absent for the memory backend
    pub store_circuit_breaker: Option<Arc<CircuitBreaker>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, dispatcher: Arc<PushDispatcher>) -> Self {
        let store = dispatcher.store().clone();

        Self {
            settings: Arc::new(settings),
            dispatcher,
            store,
            store_circuit_breaker: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.store_circuit_breaker = Some(circuit_breaker);
        self
    }
}
