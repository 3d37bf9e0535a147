//! Core torrent domain types and DTOs shared across the workspace.

mod tree;

pub use tree::{FileTree, TorrentFile};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TorrentError, TorrentResult};

const HASH_LEN: usize = 40;

/// Info-hash identifying a torrent inside the engine.
///
/// Stored upper-case so lookups against engine output are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TorrentHash(String);

impl TorrentHash {
    /// Validate and normalise a hex digest.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidHash`] when the value is not 40 hex digits.
    pub fn parse(value: &str) -> TorrentResult<Self> {
        let trimmed = value.trim();
        if trimmed.len() != HASH_LEN || !trimmed.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(TorrentError::InvalidHash {
                value: value.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Borrow the normalised digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TorrentHash {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl TryFrom<String> for TorrentHash {
    type Error = TorrentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TorrentHash> for String {
    fn from(value: TorrentHash) -> Self {
        value.0
    }
}

/// High-level lifecycle state derived from the engine's status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
    /// Closed or stopped by the user.
    Stopped,
    /// Started but not actively transferring.
    Paused,
    /// Verifying on-disk pieces.
    Checking,
    /// Transferring with pieces still missing.
    Downloading,
    /// Complete and sharing.
    Seeding,
}

impl TorrentStatus {
    /// Collapse the engine's independent status flags into one lifecycle state.
    #[must_use]
    pub const fn from_flags(started: bool, active: bool, complete: bool, hashing: bool) -> Self {
        if hashing {
            Self::Checking
        } else if !started {
            Self::Stopped
        } else if !active {
            Self::Paused
        } else if complete {
            Self::Seeding
        } else {
            Self::Downloading
        }
    }
}

/// Torrent-level priority recognised by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TorrentPriority {
    /// Do not transfer.
    Off,
    /// Below normal.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Above normal.
    High,
}

impl TorrentPriority {
    /// Decode the engine's numeric priority.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidPriority`] for values outside `0..=3`.
    pub const fn from_engine(value: i64) -> TorrentResult<Self> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Low),
            2 => Ok(Self::Normal),
            3 => Ok(Self::High),
            other => Err(TorrentError::InvalidPriority {
                kind: "torrent",
                value: other,
            }),
        }
    }

    /// Encode as the engine's numeric priority.
    #[must_use]
    pub const fn as_engine(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Low => 1,
            Self::Normal => 2,
            Self::High => 3,
        }
    }
}

/// Per-file download priority recognised by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilePriority {
    /// Skip the file.
    Off,
    /// Default priority.
    #[default]
    Normal,
    /// Download first.
    High,
}

impl FilePriority {
    /// Decode the engine's numeric file priority.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidPriority`] for values outside `0..=2`.
    pub const fn from_engine(value: i64) -> TorrentResult<Self> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Normal),
            2 => Ok(Self::High),
            other => Err(TorrentError::InvalidPriority {
                kind: "file",
                value: other,
            }),
        }
    }

    /// Encode as the engine's numeric file priority.
    #[must_use]
    pub const fn as_engine(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }
}

/// Last-known attributes of a torrent as held by the state cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentSummary {
    /// Engine info-hash.
    pub hash: TorrentHash,
    /// Display name.
    pub name: String,
    /// Directory holding the torrent payload.
    pub directory: String,
    /// Total payload size.
    pub size_bytes: u64,
    /// Bytes verified on disk.
    pub completed_bytes: u64,
    /// Lifecycle state.
    pub status: TorrentStatus,
    /// Torrent-level priority.
    pub priority: TorrentPriority,
    /// User-assigned taxonomy tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Last engine message (tracker errors and similar), when non-empty.
    pub message: Option<String>,
}

impl TorrentSummary {
    /// Percentage of the payload that is complete.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        if self.size_bytes == 0 {
            0.0
        } else {
            (self.completed_bytes as f64 / self.size_bytes as f64) * 100.0
        }
    }
}

/// Split the engine's comma-separated tag field.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render tags into the engine's comma-separated tag field.
#[must_use]
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Connected peer as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    /// Remote address.
    pub address: String,
    /// Reported client version.
    pub client_version: String,
    /// Download rate from this peer (bytes/sec).
    pub download_bps: u64,
    /// Upload rate to this peer (bytes/sec).
    pub upload_bps: u64,
    /// Peer completion percentage.
    pub completed_percent: u64,
    /// Whether the connection is encrypted.
    pub is_encrypted: bool,
    /// Whether the peer initiated the connection.
    pub is_incoming: bool,
}

/// Tracker attached to a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Announce URL.
    pub url: String,
    /// Engine tracker type (1 = HTTP, 2 = UDP, 3 = DHT).
    pub kind: i64,
    /// Whether the tracker is enabled.
    pub is_enabled: bool,
}

/// Detailed view of a single torrent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TorrentDetails {
    /// Connected peers.
    pub peers: Vec<PeerSnapshot>,
    /// Attached trackers.
    pub trackers: Vec<TrackerSnapshot>,
    /// Hierarchical file listing.
    pub file_tree: FileTree,
}

/// Request payload for adding torrents by URL or magnet link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentUrls {
    /// URLs or magnet links to load.
    pub urls: Vec<String>,
    /// Destination directory.
    pub destination: String,
    /// Whether `destination` is the final base path rather than a parent directory.
    #[serde(default)]
    pub is_base_path: bool,
    /// Start the torrents immediately.
    #[serde(default)]
    pub start: bool,
    /// Taxonomy tags applied on load.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AddTorrentUrls {
    /// Validate the request payload.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidRequest`] for empty URL lists or destinations.
    pub fn validate(&self) -> TorrentResult<()> {
        if self.urls.iter().all(|url| url.trim().is_empty()) {
            return Err(TorrentError::InvalidRequest {
                field: "urls",
                reason: "empty",
            });
        }
        validate_destination(&self.destination)
    }
}

/// One uploaded `.torrent` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentUpload {
    /// Original file name.
    pub name: String,
    /// Bencoded metainfo bytes.
    pub metainfo: Vec<u8>,
}

/// Request payload for adding uploaded `.torrent` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentFiles {
    /// Uploaded metainfo files.
    pub files: Vec<TorrentUpload>,
    /// Destination directory.
    pub destination: String,
    /// Whether `destination` is the final base path rather than a parent directory.
    #[serde(default)]
    pub is_base_path: bool,
    /// Start the torrents immediately.
    #[serde(default)]
    pub start: bool,
    /// Taxonomy tags applied on load.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AddTorrentFiles {
    /// Validate the request payload.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidRequest`] when no files were supplied, a file is
    /// empty, or the destination is blank.
    pub fn validate(&self) -> TorrentResult<()> {
        if self.files.is_empty() {
            return Err(TorrentError::InvalidRequest {
                field: "files",
                reason: "empty",
            });
        }
        if self.files.iter().any(|file| file.metainfo.is_empty()) {
            return Err(TorrentError::InvalidRequest {
                field: "files.metainfo",
                reason: "empty",
            });
        }
        validate_destination(&self.destination)
    }
}

/// Request payload for relocating torrents to a new directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveTorrents {
    /// Torrents to relocate.
    pub hashes: Vec<TorrentHash>,
    /// New directory.
    pub destination: String,
    /// Whether `destination` is the final base path rather than a parent directory.
    #[serde(default)]
    pub is_base_path: bool,
    /// Physically move the payload on disk before re-checking.
    #[serde(default)]
    pub move_files: bool,
    /// Current payload paths, one per moved payload.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Payload names placed under `destination`, paired with `sources` by position.
    #[serde(default)]
    pub filenames: Vec<String>,
}

impl MoveTorrents {
    /// Validate the request payload.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidRequest`] for empty hash lists, blank destinations,
    /// or mismatched source/filename pairs when a physical move is requested.
    pub fn validate(&self) -> TorrentResult<()> {
        if self.hashes.is_empty() {
            return Err(TorrentError::InvalidRequest {
                field: "hashes",
                reason: "empty",
            });
        }
        validate_destination(&self.destination)?;
        if self.move_files && self.sources.len() != self.filenames.len() {
            return Err(TorrentError::InvalidRequest {
                field: "filenames",
                reason: "length_mismatch",
            });
        }
        Ok(())
    }
}

/// Direction of a global throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedDirection {
    /// Inbound transfer.
    Download,
    /// Outbound transfer.
    Upload,
}

fn validate_destination(destination: &str) -> TorrentResult<()> {
    if destination.trim().is_empty() {
        return Err(TorrentError::InvalidRequest {
            field: "destination",
            reason: "empty",
        });
    }
    Ok(())
}
