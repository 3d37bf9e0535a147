//! In-memory engine that records every round trip and answers from a script.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use floodgate_rpc::{CallOutcome, EngineFault, MethodCall, RpcTransport, RpcValue, TransportError};

#[derive(Default)]
struct Script {
    sticky: HashMap<String, CallOutcome>,
    queued: HashMap<String, VecDeque<CallOutcome>>,
    transport_failure: Option<TransportError>,
    round_trips: Vec<Vec<MethodCall>>,
}

/// Scripted [`RpcTransport`].
///
/// Unscripted methods answer `0`. Queued responses are consumed before sticky
/// ones. Failed round trips are still recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    /// Create a transport that answers `0` to everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Always answer `method` with `value`.
    pub fn respond(&self, method: &str, value: RpcValue) -> &Self {
        self.script().sticky.insert(method.to_string(), Ok(value));
        self
    }

    /// Answer the next call to `method` with `value`.
    pub fn respond_once(&self, method: &str, value: RpcValue) -> &Self {
        self.script()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(value));
        self
    }

    /// Always answer `method` with an engine fault.
    pub fn fault(&self, method: &str, code: i64, message: &str) -> &Self {
        self.script().sticky.insert(
            method.to_string(),
            Err(EngineFault {
                code,
                message: message.to_string(),
            }),
        );
        self
    }

    /// Answer the next call to `method` with an engine fault.
    pub fn fault_once(&self, method: &str, code: i64, message: &str) -> &Self {
        self.script()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Err(EngineFault {
                code,
                message: message.to_string(),
            }));
        self
    }

    /// Fail every subsequent round trip with `error` until [`Self::restore_transport`].
    pub fn fail_transport(&self, error: TransportError) -> &Self {
        self.script().transport_failure = Some(error);
        self
    }

    /// Stop failing round trips.
    pub fn restore_transport(&self) -> &Self {
        self.script().transport_failure = None;
        self
    }

    /// Every recorded round trip, in order.
    #[must_use]
    pub fn round_trips(&self) -> Vec<Vec<MethodCall>> {
        self.script().round_trips.clone()
    }

    /// Method names of each recorded round trip.
    #[must_use]
    pub fn round_trip_methods(&self) -> Vec<Vec<String>> {
        self.script()
            .round_trips
            .iter()
            .map(|calls| calls.iter().map(|call| call.method.clone()).collect())
            .collect()
    }

    /// All recorded method names, flattened in call order.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.round_trip_methods().into_iter().flatten().collect()
    }

    /// Number of calls to `method` across all round trips.
    #[must_use]
    pub fn count(&self, method: &str) -> usize {
        self.methods().iter().filter(|name| *name == method).count()
    }

    /// Forget recorded round trips, keeping the script.
    pub fn clear_history(&self) {
        self.script().round_trips.clear();
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn multicall(&self, calls: &[MethodCall]) -> Result<Vec<CallOutcome>, TransportError> {
        let mut script = self.script();
        script.round_trips.push(calls.to_vec());
        if let Some(err) = &script.transport_failure {
            return Err(err.clone());
        }
        Ok(calls
            .iter()
            .map(|call| {
                if let Some(outcome) = script
                    .queued
                    .get_mut(&call.method)
                    .and_then(VecDeque::pop_front)
                {
                    return outcome;
                }
                script
                    .sticky
                    .get(&call.method)
                    .cloned()
                    .unwrap_or(Ok(RpcValue::Int(0)))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_answers_take_precedence_over_sticky_ones() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport
            .respond("system.pid", RpcValue::Int(1))
            .respond_once("system.pid", RpcValue::Int(99));

        let calls = [MethodCall::new("system.pid"), MethodCall::new("system.pid")];
        let outcomes = transport.multicall(&calls).await?;
        assert_eq!(outcomes, vec![Ok(RpcValue::Int(99)), Ok(RpcValue::Int(1))]);
        assert_eq!(transport.round_trips().len(), 1);
        assert_eq!(transport.count("system.pid"), 2);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failures_are_recorded_then_restored() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.fail_transport(TransportError::Timeout);
        assert!(transport.call(&MethodCall::new("d.start")).await.is_err());
        transport.restore_transport();
        assert_eq!(
            transport.call(&MethodCall::new("d.start")).await?,
            Ok(RpcValue::Int(0))
        );
        assert_eq!(transport.round_trips().len(), 2);
        Ok(())
    }
}
