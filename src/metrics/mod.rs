//! Prometheus metrics for the mail dispatch service.
//!
//! - Dispatch metrics (calls by outcome, duration)
//! - Message metrics (sent, failed, batches)

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "mailer";

lazy_static! {
    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Dispatch calls by outcome (completed, validation_error, transport_error, auth_error)
    pub static ref DISPATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatches_total", METRIC_PREFIX),
        "Total dispatch calls by outcome",
        &["outcome"]
    ).unwrap();

    /// Wall time of a dispatch including inter-batch delays
    pub static ref DISPATCH_DURATION: Histogram = register_histogram!(
        format!("{}_dispatch_duration_seconds", METRIC_PREFIX),
        "Dispatch duration in seconds",
        vec![0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]
    ).unwrap();

    // ============================================================================
    // Message Metrics
    // ============================================================================

    /// Messages accepted by the mail server
    pub static ref MESSAGES_SENT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_sent_total", METRIC_PREFIX),
        "Total messages accepted by the mail server"
    ).unwrap();

    /// Messages rejected or failed in transit
    pub static ref MESSAGES_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Total per-recipient send failures"
    ).unwrap();

    /// Batches processed
    pub static ref BATCHES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_batches_total", METRIC_PREFIX),
        "Total recipient batches processed"
    ).unwrap();
}

/// Helper for recording dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_outcome(outcome: &str) {
        DISPATCHES_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn record_duration(seconds: f64) {
        DISPATCH_DURATION.observe(seconds);
    }

    pub fn record_sent() {
        MESSAGES_SENT_TOTAL.inc();
    }

    pub fn record_failed() {
        MESSAGES_FAILED_TOTAL.inc();
    }

    pub fn record_batch() {
        BATCHES_TOTAL.inc();
    }
}

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
