//! Error types for client service operations.
//!
//! # Design
//! - Each variant keeps the underlying layer's error as `source`.
//! - Operation names travel in fields so HTTP mapping and logs stay constant-message.

use floodgate_config::ConfigError;
use floodgate_fsops::FsOpsError;
use floodgate_rpc::RpcError;
use floodgate_torrent_core::{TorrentError, TorrentHash};
use thiserror::Error;

/// Result alias for client service operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by [`crate::ClientService`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The engine could not be reached or rejected a call.
    #[error("engine operation failed")]
    Engine {
        /// Client operation that issued the calls.
        operation: &'static str,
        /// Underlying RPC error.
        source: RpcError,
    },
    /// A settings value could not be translated.
    #[error("settings translation failed")]
    Settings {
        /// Underlying translation error.
        source: ConfigError,
    },
    /// A local filesystem step failed.
    #[error("filesystem operation failed")]
    FileSystem {
        /// Client operation that ran the step.
        operation: &'static str,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
    /// The request payload failed validation.
    #[error("invalid request")]
    InvalidRequest {
        /// Underlying validation error.
        #[from]
        source: TorrentError,
    },
    /// The request was structurally valid but cannot be served.
    #[error("invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// The torrent is not present in the state cache.
    #[error("torrent not found")]
    NotFound {
        /// Requested info-hash.
        hash: TorrentHash,
    },
}

impl ClientError {
    pub(crate) const fn engine(operation: &'static str, source: RpcError) -> Self {
        Self::Engine { operation, source }
    }

    pub(crate) const fn fs(operation: &'static str, source: FsOpsError) -> Self {
        Self::FileSystem { operation, source }
    }

    /// Whether the failure came from the request rather than the engine or disk.
    #[must_use]
    pub const fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::InvalidInput { .. } | Self::Settings { .. }
        )
    }
}
