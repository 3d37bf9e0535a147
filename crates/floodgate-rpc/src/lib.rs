#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Engine RPC plumbing: call builder, batch executor, response pipeline, and the
//! transport boundary.
//!
//! Layout: `value.rs` (wire primitives), `call.rs` (calls, operations, batches),
//! `executor.rs` (round trips), `transport.rs` (boundary trait), `http.rs`
//! (JSON-RPC adapter), `commands.rs` (engine method builders).

pub mod call;
pub mod commands;
pub mod error;
pub mod executor;
pub mod http;
pub mod transport;
pub mod value;

pub use call::{Batch, MethodCall, Operation, OperationHandle};
pub use error::{EngineFault, RpcError, RpcResult, TransportError};
pub use executor::BatchExecutor;
pub use http::JsonRpcTransport;
pub use transport::{CallOutcome, RpcTransport};
pub use value::RpcValue;
