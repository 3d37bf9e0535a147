//! Call Builder: method invocations, logical operations, and batches.
//!
//! # Design
//! - An [`Operation`] is one or more [`MethodCall`]s plus a post-processing
//!   transform that reshapes the raw rows into a domain value.
//! - A [`Batch`] erases operation result types so unrelated operations can
//!   share one round trip; each push yields an [`OperationHandle`] that
//!   receives that operation's own outcome.

use std::fmt;

use tokio::sync::oneshot;

use crate::error::{EngineFault, RpcError, RpcResult};
use crate::value::RpcValue;

/// One remote method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    /// Engine method name.
    pub method: String,
    /// Ordered, already-shaped arguments.
    pub args: Vec<RpcValue>,
}

impl MethodCall {
    /// Start a call to `method` with no arguments.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<RpcValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RpcValue>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for MethodCall {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.method)
    }
}

type PostProcess<T> = Box<dyn FnOnce(Vec<RpcValue>) -> RpcResult<T> + Send>;

/// One logical unit of work against the engine. Built once, sent once.
pub struct Operation<T = Vec<RpcValue>> {
    name: &'static str,
    calls: Vec<MethodCall>,
    post_process: PostProcess<T>,
}

impl Operation<Vec<RpcValue>> {
    /// Create an operation whose result is the raw ordered rows.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Vec::new(),
            post_process: Box::new(Ok),
        }
    }

    /// Attach the transform applied to the raw rows before they reach the caller.
    ///
    /// The transform sees one row per call, in call order, and must not talk to the
    /// engine. An operation whose calls produced no rows passes an empty vector.
    #[must_use]
    pub fn post_process<U, F>(self, transform: F) -> Operation<U>
    where
        F: FnOnce(Vec<RpcValue>) -> RpcResult<U> + Send + 'static,
    {
        Operation {
            name: self.name,
            calls: self.calls,
            post_process: Box::new(transform),
        }
    }
}

impl<T> Operation<T> {
    /// Append a method call.
    #[must_use]
    pub fn call(mut self, call: MethodCall) -> Self {
        self.calls.push(call);
        self
    }

    /// Append several method calls.
    #[must_use]
    pub fn calls(mut self, calls: impl IntoIterator<Item = MethodCall>) -> Self {
        self.calls.extend(calls);
        self
    }

    /// Operation name used in logs and error context.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Method calls in submission order.
    #[must_use]
    pub fn method_calls(&self) -> &[MethodCall] {
        &self.calls
    }

    /// Resolve the operation from its per-call outcomes.
    ///
    /// The first engine fault fails the whole operation; otherwise the rows are
    /// handed to the post-processing transform exactly once.
    pub(crate) fn complete(self, outcomes: Vec<Result<RpcValue, EngineFault>>) -> RpcResult<T> {
        let mut rows = Vec::with_capacity(outcomes.len());
        for (call, outcome) in self.calls.iter().zip(outcomes) {
            match outcome {
                Ok(value) => rows.push(value),
                Err(fault) => {
                    return Err(RpcError::Fault {
                        operation: self.name,
                        method: call.method.clone(),
                        code: fault.code,
                        message: fault.message,
                    });
                }
            }
        }
        (self.post_process)(rows)
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Operation")
            .field("name", &self.name)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

type Completion = Box<dyn FnOnce(RpcResult<Vec<Result<RpcValue, EngineFault>>>) + Send>;

pub(crate) struct PendingOperation {
    pub(crate) name: &'static str,
    pub(crate) calls: Vec<MethodCall>,
    pub(crate) complete: Completion,
}

/// Ordered collection of operations submitted in one round trip.
#[derive(Default)]
pub struct Batch {
    pub(crate) pending: Vec<PendingOperation>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an operation and receive the handle its outcome is delivered to.
    pub fn push<T>(&mut self, operation: Operation<T>) -> OperationHandle<T>
    where
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let name = operation.name;
        let calls = operation.calls.clone();
        let complete: Completion = Box::new(move |outcome| {
            let result = outcome.and_then(|outcomes| operation.complete(outcomes));
            let _ = sender.send(result);
        });
        self.pending.push(PendingOperation {
            name,
            calls,
            complete,
        });
        OperationHandle { name, receiver }
    }

    /// Number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the batch has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total number of method calls across all operations.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.pending.iter().map(|op| op.calls.len()).sum()
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Batch")
            .field(
                "operations",
                &self.pending.iter().map(|op| op.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Receives the outcome of one operation inside a submitted batch.
#[derive(Debug)]
pub struct OperationHandle<T> {
    name: &'static str,
    receiver: oneshot::Receiver<RpcResult<T>>,
}

impl<T> OperationHandle<T> {
    /// Wait for the operation's outcome.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or [`RpcError::Abandoned`] when the batch
    /// was dropped without being submitted.
    pub async fn outcome(self) -> RpcResult<T> {
        self.receiver
            .await
            .unwrap_or(Err(RpcError::Abandoned {
                operation: self.name,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_argument_order() {
        let call = MethodCall::new("load.start")
            .arg("")
            .arg("magnet:?xt=urn:btih:abc")
            .args(["d.directory.set=\"/data\"".to_string()]);
        assert_eq!(call.method, "load.start");
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.args[1].as_str(), Some("magnet:?xt=urn:btih:abc"));
        assert_eq!(call.to_string(), "load.start");
    }

    #[test]
    fn first_fault_fails_the_operation() {
        let operation = Operation::new("stop_torrents")
            .call(MethodCall::new("d.stop").arg("A"))
            .call(MethodCall::new("d.close").arg("A"));
        let result = operation.complete(vec![
            Ok(RpcValue::Int(0)),
            Err(EngineFault {
                code: -501,
                message: "Could not find info-hash.".into(),
            }),
        ]);
        assert!(matches!(
            result,
            Err(RpcError::Fault { method, code: -501, .. }) if method == "d.close"
        ));
    }

    #[test]
    fn post_process_runs_on_empty_rows() {
        let operation = Operation::new("peers").post_process(|rows| Ok(rows.len()));
        assert_eq!(operation.complete(Vec::new()), Ok(0));
    }

    #[tokio::test]
    async fn dropped_batch_abandons_handles() {
        let mut batch = Batch::new();
        let handle = batch.push(Operation::new("noop").call(MethodCall::new("system.pid")));
        assert_eq!(batch.call_count(), 1);
        drop(batch);
        assert_eq!(
            handle.outcome().await,
            Err(RpcError::Abandoned { operation: "noop" })
        );
    }
}
