#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Engine-agnostic torrent DTOs shared across the Floodgate workspace.
//!
//! Layout: `model/` (summaries, details, file trees, request payloads), `error.rs`
//! (`TorrentError`).

pub mod error;
pub mod model;

pub use error::{TorrentError, TorrentResult};
pub use model::{
    AddTorrentFiles, AddTorrentUrls, FilePriority, FileTree, MoveTorrents, PeerSnapshot,
    SpeedDirection, TorrentDetails, TorrentFile, TorrentHash, TorrentPriority, TorrentStatus,
    TorrentSummary, TorrentUpload, TrackerSnapshot, join_tags, parse_tags,
};
