//! # Design
//!
//! - Transport failures are cloneable so one failure can be handed to every
//!   operation in a batch unchanged.
//! - Messages are constant; engine context lives in fields.

use thiserror::Error;

/// Failure of the physical round trip to the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The engine endpoint could not be reached.
    #[error("engine unreachable")]
    Unreachable {
        /// Endpoint that was contacted.
        endpoint: String,
        /// Underlying client error rendered as text.
        detail: String,
    },
    /// The engine answered with a non-success HTTP status.
    #[error("engine returned an error status")]
    Status {
        /// HTTP status code.
        code: u16,
    },
    /// The engine response did not follow the RPC envelope.
    #[error("malformed engine response")]
    Malformed {
        /// Static description of what was wrong.
        reason: &'static str,
    },
    /// The round trip exceeded the configured deadline.
    #[error("engine request timed out")]
    Timeout,
}

/// Error reported by the engine for one specific call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("engine fault")]
pub struct EngineFault {
    /// Engine fault code.
    pub code: i64,
    /// Engine fault message.
    pub message: String,
}

/// Errors surfaced to operation callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The batch carrying this operation failed in transit.
    #[error("rpc transport failed")]
    Transport(#[from] TransportError),
    /// The engine rejected one of the operation's calls.
    #[error("engine rejected call")]
    Fault {
        /// Operation that issued the call.
        operation: &'static str,
        /// Engine method that faulted.
        method: String,
        /// Engine fault code.
        code: i64,
        /// Engine fault message.
        message: String,
    },
    /// The post-processing transform could not interpret the engine's rows.
    #[error("engine response could not be decoded")]
    Decode {
        /// Operation whose rows were being decoded.
        operation: &'static str,
        /// Field being decoded.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// The engine returned a different number of results than calls submitted.
    #[error("engine result count mismatch")]
    ResultCount {
        /// Number of calls submitted.
        expected: usize,
        /// Number of results returned.
        actual: usize,
    },
    /// The operation's handle was read before its batch was submitted.
    #[error("operation was never completed")]
    Abandoned {
        /// Operation that never completed.
        operation: &'static str,
    },
}

impl RpcError {
    /// Build a decode error for a post-processing transform.
    #[must_use]
    pub const fn decode(
        operation: &'static str,
        field: &'static str,
        reason: &'static str,
    ) -> Self {
        Self::Decode {
            operation,
            field,
            reason,
        }
    }

    /// Whether the failure happened before the engine could answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ResultCount { .. })
    }
}

/// Convenience alias for RPC results.
pub type RpcResult<T> = Result<T, RpcError>;
