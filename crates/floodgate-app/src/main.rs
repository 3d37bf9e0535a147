#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Binary entrypoint for the Floodgate service.

use floodgate_app::{AppResult, run_app};

/// Boots the service and blocks until the API listener stops.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
