//! Error types for telemetry setup and rendering.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed, or installation failed.
    #[error("failed to install tracing subscriber")]
    Subscriber {
        /// Underlying subscriber error.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
    /// A collector could not be built or added to the registry.
    #[error("failed to set up metric")]
    Metric {
        /// `build` or `register`.
        stage: &'static str,
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// The registry could not be rendered as Prometheus text.
    #[error("failed to render metrics")]
    Render {
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// Rendered output was not UTF-8.
    #[error("rendered metrics were not utf-8")]
    RenderEncoding {
        /// Underlying conversion error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl TelemetryError {
    pub(crate) const fn build(name: &'static str, source: PrometheusError) -> Self {
        Self::Metric {
            stage: "build",
            name,
            source,
        }
    }

    pub(crate) const fn register(name: &'static str, source: PrometheusError) -> Self {
        Self::Metric {
            stage: "register",
            name,
            source,
        }
    }
}
