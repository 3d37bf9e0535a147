#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Orchestration layer between callers and the torrent engine.
//!
//! Layout: `service.rs` (client operations), `workflow.rs` (step sequencer),
//! `moves.rs` (move workflow), `cache.rs` (torrent cache and refresh hooks),
//! `rows.rs` (engine row decoding), `error.rs` (`ClientError`).

pub mod cache;
pub mod error;
pub mod moves;
mod rows;
pub mod service;
pub mod workflow;

pub use cache::{CacheRefresher, RefreshTrigger, TorrentCache};
pub use error::{ClientError, ClientResult};
pub use moves::{MoveStep, MoveTorrentsPlan};
pub use service::{ClientDeps, ClientService};
pub use workflow::{Workflow, WorkflowState, WorkflowStep};
