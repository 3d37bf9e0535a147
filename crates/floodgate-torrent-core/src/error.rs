//! Error types for torrent domain values.

use thiserror::Error;

/// Primary error type for torrent DTO validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TorrentError {
    /// Torrent hash was not a 40 character hex digest.
    #[error("invalid torrent hash")]
    InvalidHash {
        /// Offending value.
        value: String,
    },
    /// Priority value fell outside the range the engine understands.
    #[error("invalid priority")]
    InvalidPriority {
        /// Priority family (`torrent` or `file`).
        kind: &'static str,
        /// Offending value.
        value: i64,
    },
    /// A request payload failed validation.
    #[error("invalid torrent request")]
    InvalidRequest {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for torrent DTO results.
pub type TorrentResult<T> = Result<T, TorrentError>;
