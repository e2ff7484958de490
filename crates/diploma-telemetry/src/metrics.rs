//! Prometheus metrics for the diploma verification client.
//!
//! All metrics follow the naming convention: `diploma_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // API CLIENT METRICS
    // =========================================================================

    /// Outbound API requests
    pub static ref API_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("diploma_api_requests_total", "Outbound API requests"),
        &["endpoint", "outcome"]  // outcome: success/api_error/transport_error/decode_error
    ).expect("metric creation failed");

    /// Outbound API request duration
    pub static ref API_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "diploma_api_request_duration_seconds",
            "Round-trip time of outbound API requests"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid buckets")),
        &["endpoint"]
    ).expect("metric creation failed");

    // =========================================================================
    // SESSION METRICS
    // =========================================================================

    /// Wallet connect attempts
    pub static ref SESSION_CONNECTS: CounterVec = CounterVec::new(
        Opts::new("diploma_session_connects_total", "Wallet connect attempts"),
        &["outcome"]  // outcome: connected/rejected/no_signer/signer_error/in_progress/cancelled
    ).expect("metric creation failed");

    // =========================================================================
    // FLOW METRICS
    // =========================================================================

    /// Completed verifications by result
    pub static ref VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("diploma_verifications_total", "Completed diploma verifications"),
        &["result"]  // result: valid/invalid
    ).expect("metric creation failed");

    /// Diplomas successfully submitted for issuance
    pub static ref DIPLOMAS_CREATED: Counter = Counter::new(
        "diploma_issuer_diplomas_created_total",
        "Diplomas accepted by the issuance endpoint"
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(API_REQUESTS.clone()),
        Box::new(API_REQUEST_DURATION.clone()),
        Box::new(SESSION_CONNECTS.clone()),
        Box::new(VERIFICATIONS.clone()),
        Box::new(DIPLOMAS_CREATED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Start a timer for one label set of a histogram vector.
    pub fn labelled(histogram: &HistogramVec, labels: &[&str]) -> Self {
        Self::new(&histogram.with_label_values(labels))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
