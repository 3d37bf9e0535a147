#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (file trees, engine rows), transport.rs (scripted engine).

pub mod fixtures;
pub mod transport;

pub use transport::ScriptedTransport;
