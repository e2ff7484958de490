//! # Diploma Telemetry
//!
//! Observability for the diploma verification client.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and a
//!   pretty (development) or JSON (containers) formatter
//! - **Metrics**: Prometheus counters and histograms for API traffic,
//!   wallet connections, verifications and diploma issuance
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diploma_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DIPLOMA_SERVICE_NAME` | `diploma-client` | Service name attached to logs |
//! | `DIPLOMA_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `DIPLOMA_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `DIPLOMA_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, API_REQUESTS,
    API_REQUEST_DURATION, DIPLOMAS_CREATED, SESSION_CONNECTS, VERIFICATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register client metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
