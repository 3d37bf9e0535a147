#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! HTTP surface for the Floodgate client service.
//!
//! Layout: `error.rs` (`ApiServerError`), `http/` (router, handlers, errors, middleware),
//! `models.rs` (request and response bodies), `state.rs` (shared handler state).

pub mod error;
pub mod http;
pub mod models;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::ApiState;
