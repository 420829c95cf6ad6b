//! Prometheus metrics for the push service.
//!
//! - Dispatch metrics (calls by mode, duration, deadline hits)
//! - Delivery metrics (delivered, failed by class, attempt latency)
//! - Store metrics (prunes, prune failures, snapshot failures, breaker state)

mod helpers;

pub use helpers::{encode_metrics, PushMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "push";

lazy_static! {
    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Dispatch calls by snapshot source
    pub static ref DISPATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatches_total", METRIC_PREFIX),
        "Total dispatch calls",
        &["mode"]
    ).unwrap();

    /// Dispatches cut short by their deadline
    pub static ref DISPATCH_TIMEOUTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_dispatch_timeouts_total", METRIC_PREFIX),
        "Total dispatch calls that hit their deadline"
    ).unwrap();

    /// Whole-dispatch duration
    pub static ref DISPATCH_DURATION: Histogram = register_histogram!(
        format!("{}_dispatch_duration_seconds", METRIC_PREFIX),
        "Dispatch call duration in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Deliveries accepted by a push service
    pub static ref DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_delivered_total", METRIC_PREFIX),
        "Total push messages accepted by push services"
    ).unwrap();

    /// Failed deliveries by class
    pub static ref FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_failed_total", METRIC_PREFIX),
        "Total failed push deliveries",
        &["class"]
    ).unwrap();

    /// Single delivery attempt latency
    pub static ref ATTEMPT_LATENCY: Histogram = register_histogram!(
        format!("{}_attempt_latency_seconds", METRIC_PREFIX),
        "Push delivery attempt latency in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Subscriptions removed after a permanent failure
    pub static ref PRUNED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_pruned_total", METRIC_PREFIX),
        "Total subscriptions pruned after permanent failures"
    ).unwrap();

    /// Prune attempts the store rejected
    pub static ref PRUNE_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_prune_failed_total", METRIC_PREFIX),
        "Total subscription prunes that failed"
    ).unwrap();

    /// Dispatches aborted because the snapshot could not be read
    pub static ref STORE_UNAVAILABLE_TOTAL: IntCounter = register_int_counter!(
        format!("{}_store_unavailable_total", METRIC_PREFIX),
        "Total dispatch calls aborted by store failures"
    ).unwrap();

    /// Store availability (1 = accepting requests, 0 = circuit open)
    pub static ref STORE_AVAILABLE: IntGauge = register_int_gauge!(
        format!("{}_store_available", METRIC_PREFIX),
        "Subscription store availability (1=available, 0=circuit open)"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        STORE_AVAILABLE.set(1);
        DELIVERED_TOTAL.inc();

        let output = encode_metrics().expect("metrics encode");
        assert!(output.contains("push_store_available"));
        assert!(output.contains("push_delivered_total"));
    }
}
