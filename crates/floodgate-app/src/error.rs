//! # Design
//!
//! - Centralize bootstrap errors.
//! - Constant messages with the failing operation carried as a field.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: floodgate_config::ConfigError,
    },
    /// Telemetry could not be initialised.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: floodgate_telemetry::TelemetryError,
    },
    /// The engine transport could not be built.
    #[error("engine transport setup failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Source transport error.
        source: floodgate_rpc::TransportError,
    },
    /// The HTTP API failed to bind or serve.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: floodgate_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: floodgate_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: floodgate_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn transport(
        operation: &'static str,
        source: floodgate_rpc::TransportError,
    ) -> Self {
        Self::Transport { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: floodgate_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}
