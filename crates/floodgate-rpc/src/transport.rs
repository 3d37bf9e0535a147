//! Engine RPC boundary.

use async_trait::async_trait;

use crate::call::MethodCall;
use crate::error::{EngineFault, TransportError};
use crate::value::RpcValue;

/// Result of one call inside a round trip: a value or an engine-reported fault.
pub type CallOutcome = Result<RpcValue, EngineFault>;

/// Physical channel to the engine. Implementations own wire encoding and
/// serialise or multiplex I/O as they see fit.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Execute `calls` in one round trip, returning one outcome per call in order.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the round trip itself fails.
    async fn multicall(&self, calls: &[MethodCall]) -> Result<Vec<CallOutcome>, TransportError>;

    /// Execute a single call.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the round trip itself fails.
    async fn call(&self, call: &MethodCall) -> Result<CallOutcome, TransportError> {
        self.multicall(std::slice::from_ref(call))
            .await?
            .into_iter()
            .next()
            .ok_or(TransportError::Malformed {
                reason: "empty result list",
            })
    }
}
