//! Request and response bodies for the HTTP surface.

use chrono::{DateTime, Utc};
use floodgate_torrent_core::{FilePriority, SpeedDirection, TorrentHash, TorrentPriority};
use serde::{Deserialize, Serialize};

/// RFC9457-compatible problem document surfaced on failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Human-readable explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Request fields that failed validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON pointer to the offending field.
    pub pointer: String,
    /// Machine-readable reason.
    pub message: String,
}

/// Liveness and cache freshness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` once the cache has been filled, `starting` before.
    pub status: String,
    /// Build identifier.
    pub build: String,
    /// Torrents currently cached.
    pub cached_torrents: usize,
    /// Time of the last successful cache refresh.
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Target torrents of a lifecycle action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashesRequest {
    /// Info-hashes to act on.
    pub hashes: Vec<TorrentHash>,
}

/// Remove torrents, optionally deleting their data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTorrentsRequest {
    /// Info-hashes to remove.
    pub hashes: Vec<TorrentHash>,
    /// Delete payload files as well.
    #[serde(default)]
    pub delete_data: bool,
}

/// Change torrent priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityRequest {
    /// Info-hashes to update.
    pub hashes: Vec<TorrentHash>,
    /// New priority.
    pub priority: TorrentPriority,
}

/// Change per-file priority inside one torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePriorityRequest {
    /// Torrent owning the files.
    pub hash: TorrentHash,
    /// Engine file indices.
    pub indices: Vec<u32>,
    /// New priority.
    pub priority: FilePriority,
}

/// Replace taxonomy tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyRequest {
    /// Info-hashes to update.
    pub hashes: Vec<TorrentHash>,
    /// Full replacement tag list.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One uploaded torrent file, metainfo encoded as standard base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedTorrent {
    /// Original file name.
    pub name: String,
    /// Base64 metainfo.
    pub metainfo: String,
}

/// Add torrents from uploaded files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFilesRequest {
    /// Uploaded files.
    pub files: Vec<UploadedTorrent>,
    /// Download directory.
    pub destination: String,
    /// Treat `destination` as the payload root.
    #[serde(default)]
    pub is_base_path: bool,
    /// Start immediately.
    #[serde(default = "default_start")]
    pub start: bool,
    /// Taxonomy tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

const fn default_start() -> bool {
    true
}

/// Query string for file downloads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadQuery {
    /// Comma-separated engine file indices.
    #[serde(default)]
    pub indices: String,
}

/// Query string for settings reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsQuery {
    /// Comma-separated external identifiers; empty reads everything.
    #[serde(default)]
    pub property: Option<String>,
}

/// Global throttle update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedLimitRequest {
    /// Throttled direction.
    pub direction: SpeedDirection,
    /// Ceiling in bytes per second; zero removes the limit.
    pub bytes_per_sec: u64,
}

/// Introspection passthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCallRequest {
    /// `system.listMethods`, `system.methodHelp`, or `system.methodSignature`.
    pub method: String,
    /// String arguments.
    #[serde(default)]
    pub args: Vec<String>,
}
