//! Error types for configuration and settings translation.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A settings value could not be translated into the engine's vocabulary.
    #[error("invalid setting value")]
    InvalidSetting {
        /// External identifier of the setting.
        id: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Two descriptors claimed the same external identifier.
    #[error("duplicate setting identifier")]
    DuplicateSetting {
        /// External identifier registered twice.
        id: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
