//! Batch Executor: one physical round trip per [`Batch`].
//!
//! # Design
//! - All calls of all operations are flattened in submission order, sent once,
//!   then sliced back per operation by call count.
//! - A transport failure (or a result list of the wrong length) is delivered to
//!   every operation unchanged; engine faults only fail the owning operation.

use std::sync::Arc;

use floodgate_telemetry::Metrics;
use tracing::{debug, warn};

use crate::call::{Batch, MethodCall, Operation};
use crate::error::{RpcError, RpcResult};
use crate::transport::{CallOutcome, RpcTransport};

/// Submits batches over a shared transport.
#[derive(Clone)]
pub struct BatchExecutor {
    transport: Arc<dyn RpcTransport>,
    metrics: Option<Metrics>,
}

impl BatchExecutor {
    /// Create an executor over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            metrics: None,
        }
    }

    /// Record round trips in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Submit a batch in one round trip and complete every operation handle.
    ///
    /// # Errors
    ///
    /// Returns the batch-wide failure (transport error or result-count mismatch).
    /// The same error has already been delivered to every handle when this returns.
    pub async fn submit(&self, batch: Batch) -> RpcResult<()> {
        let Batch { pending } = batch;
        if pending.is_empty() {
            return Ok(());
        }

        let calls: Vec<MethodCall> = pending
            .iter()
            .flat_map(|op| op.calls.iter().cloned())
            .collect();
        let names: Vec<&'static str> = pending.iter().map(|op| op.name).collect();

        let outcome = self.round_trip(&calls).await;
        match outcome {
            Ok(mut results) => {
                debug!(
                    operations = ?names,
                    calls = calls.len(),
                    "engine batch completed"
                );
                // Drain front to back so each operation takes its own slice.
                for op in pending {
                    let rest = results.split_off(op.calls.len());
                    let own = std::mem::replace(&mut results, rest);
                    (op.complete)(Ok(own));
                }
                Ok(())
            }
            Err(err) => {
                warn!(operations = ?names, error = %err, "engine batch failed");
                for op in pending {
                    (op.complete)(Err(err.clone()));
                }
                Err(err)
            }
        }
    }

    /// Submit a single operation as its own batch and return its result.
    ///
    /// # Errors
    ///
    /// Returns the operation's transport, fault, or decode error.
    pub async fn execute<T>(&self, operation: Operation<T>) -> RpcResult<T>
    where
        T: Send + 'static,
    {
        let mut batch = Batch::new();
        let handle = batch.push(operation);
        // The handle already carries the batch-wide error.
        let _ = self.submit(batch).await;
        handle.outcome().await
    }

    async fn round_trip(&self, calls: &[MethodCall]) -> RpcResult<Vec<CallOutcome>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let result = match calls {
            [single] => self.transport.call(single).await.map(|outcome| vec![outcome]),
            _ => self.transport.multicall(calls).await,
        };
        let result = result.map_err(RpcError::from).and_then(|results| {
            if results.len() == calls.len() {
                Ok(results)
            } else {
                Err(RpcError::ResultCount {
                    expected: calls.len(),
                    actual: results.len(),
                })
            }
        });
        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(_) => "ok",
                Err(RpcError::ResultCount { .. }) => "result_count",
                Err(_) => "transport_error",
            };
            metrics.record_rpc_round_trip(outcome, calls.len());
        }
        result
    }
}

impl std::fmt::Debug for BatchExecutor {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BatchExecutor")
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{EngineFault, TransportError};
    use crate::value::RpcValue;

    /// Echoes each call's first argument, faulting on `fail.*` methods.
    #[derive(Default)]
    struct EchoTransport {
        round_trips: Mutex<Vec<Vec<String>>>,
        broken: Option<TransportError>,
        truncate: bool,
    }

    #[async_trait]
    impl RpcTransport for EchoTransport {
        async fn multicall(
            &self,
            calls: &[MethodCall],
        ) -> Result<Vec<CallOutcome>, TransportError> {
            if let Ok(mut trips) = self.round_trips.lock() {
                trips.push(calls.iter().map(|call| call.method.clone()).collect());
            }
            if let Some(err) = &self.broken {
                return Err(err.clone());
            }
            let mut results: Vec<CallOutcome> = calls
                .iter()
                .map(|call| {
                    if call.method.starts_with("fail.") {
                        Err(EngineFault {
                            code: -1,
                            message: "rejected".into(),
                        })
                    } else {
                        Ok(call.args.first().cloned().unwrap_or(RpcValue::Nil))
                    }
                })
                .collect();
            if self.truncate {
                results.pop();
            }
            Ok(results)
        }
    }

    fn echo(name: &'static str, values: &[i64]) -> Operation {
        Operation::new(name).calls(
            values
                .iter()
                .map(|value| MethodCall::new("echo").arg(*value)),
        )
    }

    #[tokio::test]
    async fn results_are_demultiplexed_in_submission_order() -> anyhow::Result<()> {
        let transport = Arc::new(EchoTransport::default());
        let executor = BatchExecutor::new(transport.clone());

        let mut batch = Batch::new();
        let first = batch.push(echo("first", &[1, 2]));
        let second = batch.push(echo("second", &[3]));
        let third = batch.push(echo("third", &[4, 5, 6]).post_process(|rows| {
            Ok(rows.iter().filter_map(RpcValue::as_i64).sum::<i64>())
        }));
        executor.submit(batch).await?;

        assert_eq!(
            first.outcome().await?,
            vec![RpcValue::Int(1), RpcValue::Int(2)]
        );
        assert_eq!(second.outcome().await?, vec![RpcValue::Int(3)]);
        assert_eq!(third.outcome().await?, 15);

        let trips = transport
            .round_trips
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_reaches_every_operation_identically() {
        let transport = Arc::new(EchoTransport {
            broken: Some(TransportError::Timeout),
            ..EchoTransport::default()
        });
        let executor = BatchExecutor::new(transport);

        let mut batch = Batch::new();
        let first = batch.push(echo("first", &[1]));
        let second = batch.push(echo("second", &[2]));
        let submitted = executor.submit(batch).await;

        let expected = Err(RpcError::Transport(TransportError::Timeout));
        assert_eq!(submitted, expected);
        assert_eq!(first.outcome().await.map(|_| ()), expected);
        assert_eq!(second.outcome().await.map(|_| ()), expected);
    }

    #[tokio::test]
    async fn engine_fault_leaves_siblings_intact() -> anyhow::Result<()> {
        let executor = BatchExecutor::new(Arc::new(EchoTransport::default()));

        let mut batch = Batch::new();
        let failing = batch.push(Operation::new("failing").call(MethodCall::new("fail.now")));
        let healthy = batch.push(echo("healthy", &[9]));
        executor.submit(batch).await?;

        assert!(matches!(
            failing.outcome().await,
            Err(RpcError::Fault { operation: "failing", .. })
        ));
        assert_eq!(healthy.outcome().await?, vec![RpcValue::Int(9)]);
        Ok(())
    }

    #[tokio::test]
    async fn short_result_list_fails_the_whole_batch() {
        let executor = BatchExecutor::new(Arc::new(EchoTransport {
            truncate: true,
            ..EchoTransport::default()
        }));
        let result = executor.execute(echo("pair", &[1, 2])).await;
        assert_eq!(
            result,
            Err(RpcError::ResultCount {
                expected: 2,
                actual: 1
            })
        );
    }

    #[tokio::test]
    async fn operations_without_calls_skip_the_round_trip() -> anyhow::Result<()> {
        let transport = Arc::new(EchoTransport::default());
        let executor = BatchExecutor::new(transport.clone());
        let rows = executor.execute(Operation::new("empty")).await?;
        assert!(rows.is_empty());
        let trips = transport
            .round_trips
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert!(trips.is_empty());
        Ok(())
    }
}
