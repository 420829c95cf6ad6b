//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    ATTEMPT_LATENCY, DELIVERED_TOTAL, DISPATCHES_TOTAL, DISPATCH_DURATION,
    DISPATCH_TIMEOUTS_TOTAL, FAILED_TOTAL, PRUNED_TOTAL, PRUNE_FAILED_TOTAL,
    STORE_UNAVAILABLE_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch metrics
pub struct PushMetrics;

impl PushMetrics {
    pub fn record_dispatch(mode: &str) {
        DISPATCHES_TOTAL.with_label_values(&[mode]).inc();
    }

    pub fn record_dispatch_duration(seconds: f64) {
        DISPATCH_DURATION.observe(seconds);
    }

    pub fn record_timeout() {
        DISPATCH_TIMEOUTS_TOTAL.inc();
    }

    pub fn record_attempt_latency(seconds: f64) {
        ATTEMPT_LATENCY.observe(seconds);
    }

    pub fn record_delivered() {
        DELIVERED_TOTAL.inc();
    }

    pub fn record_transient_failure() {
        FAILED_TOTAL.with_label_values(&["transient"]).inc();
    }

    pub fn record_permanent_failure() {
        FAILED_TOTAL.with_label_values(&["permanent"]).inc();
    }

    pub fn record_pruned() {
        PRUNED_TOTAL.inc();
    }

    pub fn record_prune_failed() {
        PRUNE_FAILED_TOTAL.inc();
    }

    pub fn record_store_unavailable() {
        STORE_UNAVAILABLE_TOTAL.inc();
    }
}
