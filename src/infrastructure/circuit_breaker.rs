//! Circuit breaker guarding subscription store backends.
//!
//! After `FAILURE_THRESHOLD` consecutive backend errors the breaker opens and
//! store calls fail fast. Once `OPEN_TIMEOUT_MS` has passed it lets a trial
//! request through; success closes it again, failure reopens it.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};

use super::current_time_ms;

const FAILURE_THRESHOLD: u32 = 5;
const OPEN_TIMEOUT_MS: i64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    /// Store calls are rejected without touching the backend
    Open = 1,
    /// A trial request is allowed to test the backend
    HalfOpen = 2,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Lock-free breaker shared by a store pool and the `/stats` endpoint.
pub struct CircuitBreaker {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    /// ms since epoch
    opened_at: AtomicI64,
    failure_threshold: u32,
    open_timeout_ms: i64,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_limits(FAILURE_THRESHOLD, OPEN_TIMEOUT_MS)
    }

    fn with_limits(failure_threshold: u32, open_timeout_ms: i64) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU32::new(0),
            opened_at: AtomicI64::new(0),
            failure_threshold,
            open_timeout_ms,
        }
    }

    /// Current state; an open breaker whose timeout elapsed becomes half-open.
    pub fn state(&self) -> CircuitState {
        let current = CircuitState::from(self.state.load(Ordering::Acquire));
        if current != CircuitState::Open {
            return current;
        }

        let elapsed = current_time_ms() - self.opened_at.load(Ordering::Acquire);
        if elapsed < self.open_timeout_ms {
            return CircuitState::Open;
        }

        if self
            .state
            .compare_exchange(
                CircuitState::Open as u8,
                CircuitState::HalfOpen as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            tracing::info!("Store circuit breaker half-open, allowing a trial request");
        }
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        let previous = self.state.swap(CircuitState::Closed as u8, Ordering::AcqRel);
        if CircuitState::from(previous) == CircuitState::HalfOpen {
            tracing::info!("Store circuit breaker closed after recovery");
        }
    }

    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        let reopen = CircuitState::from(self.state.load(Ordering::Acquire)) == CircuitState::HalfOpen;

        if reopen || failures >= self.failure_threshold {
            self.opened_at.store(current_time_ms(), Ordering::Release);
            let previous = self.state.swap(CircuitState::Open as u8, Ordering::AcqRel);
            if CircuitState::from(previous) != CircuitState::Open {
                tracing::warn!(failures, "Store circuit breaker opened");
            }
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }
}
