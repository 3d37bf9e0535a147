//! Typed builders for the engine methods the client layer issues.
//!
//! Every builder shapes arguments into the primitives the engine expects
//! (strings, integers, byte blobs); none of them perform I/O.

use floodgate_torrent_core::{FilePriority, SpeedDirection, TorrentHash, TorrentPriority, join_tags};

use crate::call::{MethodCall, Operation};

/// Fields fetched per torrent by [`list_torrents`], in column order.
pub const LIST_FIELDS: &[&str] = &[
    "d.hash=",
    "d.name=",
    "d.directory=",
    "d.size_bytes=",
    "d.completed_bytes=",
    "d.state=",
    "d.is_active=",
    "d.complete=",
    "d.hashing=",
    "d.custom1=",
    "d.priority=",
    "d.message=",
];

/// Fields fetched per peer by [`peers`], in column order.
pub const PEER_FIELDS: &[&str] = &[
    "p.address=",
    "p.client_version=",
    "p.down_rate=",
    "p.up_rate=",
    "p.completed_percent=",
    "p.is_encrypted=",
    "p.is_incoming=",
];

/// Fields fetched per file by [`files`], in column order.
pub const FILE_FIELDS: &[&str] = &[
    "f.path=",
    "f.size_bytes=",
    "f.priority=",
    "f.completed_chunks=",
    "f.size_chunks=",
];

/// Fields fetched per tracker by [`trackers`], in column order.
pub const TRACKER_FIELDS: &[&str] = &["t.url=", "t.type=", "t.is_enabled="];

/// Introspection methods callers may invoke through [`introspect`].
pub const INTROSPECTION_METHODS: &[&str] = &[
    "system.listMethods",
    "system.methodHelp",
    "system.methodSignature",
];

fn per_hash(
    name: &'static str,
    hashes: &[TorrentHash],
    methods: &[&'static str],
) -> Operation {
    Operation::new(name).calls(hashes.iter().flat_map(|hash| {
        methods
            .iter()
            .map(move |method| MethodCall::new(*method).arg(hash.as_str()))
    }))
}

/// Open and start each torrent.
#[must_use]
pub fn start(hashes: &[TorrentHash]) -> Operation {
    per_hash("start_torrents", hashes, &["d.open", "d.start"])
}

/// Stop and close each torrent.
#[must_use]
pub fn stop(hashes: &[TorrentHash]) -> Operation {
    per_hash("stop_torrents", hashes, &["d.stop", "d.close"])
}

/// Re-verify each torrent's on-disk pieces.
#[must_use]
pub fn check_hash(hashes: &[TorrentHash]) -> Operation {
    per_hash("check_hash", hashes, &["d.check_hash"])
}

/// Remove each torrent from the engine session.
#[must_use]
pub fn erase(hashes: &[TorrentHash]) -> Operation {
    per_hash("erase_torrents", hashes, &["d.erase"])
}

/// Fetch each torrent's payload path (file or top-level directory).
#[must_use]
pub fn base_paths(hashes: &[TorrentHash]) -> Operation {
    per_hash("base_paths", hashes, &["d.base_path"])
}

/// Point each torrent at a new download directory.
///
/// With `is_base_path` the directory is the payload root itself; otherwise the
/// engine appends the torrent name for multi-file torrents.
#[must_use]
pub fn set_directory(hashes: &[TorrentHash], destination: &str, is_base_path: bool) -> Operation {
    let method = directory_method(is_base_path);
    Operation::new("set_directory").calls(
        hashes
            .iter()
            .map(|hash| MethodCall::new(method).arg(hash.as_str()).arg(destination)),
    )
}

/// Set torrent-level priority and recompute piece priorities.
#[must_use]
pub fn set_priority(hashes: &[TorrentHash], priority: TorrentPriority) -> Operation {
    Operation::new("set_priority").calls(hashes.iter().flat_map(|hash| {
        [
            MethodCall::new("d.priority.set")
                .arg(hash.as_str())
                .arg(priority.as_engine()),
            MethodCall::new("d.update_priorities").arg(hash.as_str()),
        ]
    }))
}

/// Set the priority of individual files and recompute piece priorities once.
#[must_use]
pub fn set_file_priority(hash: &TorrentHash, indices: &[u32], priority: FilePriority) -> Operation {
    Operation::new("set_file_priority")
        .calls(indices.iter().map(|index| {
            MethodCall::new("f.priority.set")
                .arg(format!("{hash}:f{index}"))
                .arg(priority.as_engine())
        }))
        .call(MethodCall::new("d.update_priorities").arg(hash.as_str()))
}

/// Replace each torrent's taxonomy tags.
#[must_use]
pub fn set_taxonomy(hashes: &[TorrentHash], tags: &[String]) -> Operation {
    let joined = join_tags(tags);
    Operation::new("set_taxonomy").calls(hashes.iter().map(|hash| {
        MethodCall::new("d.custom1.set")
            .arg(hash.as_str())
            .arg(joined.as_str())
    }))
}

/// Create `path` (and parents) on the engine host.
#[must_use]
pub fn create_directory(path: &str) -> MethodCall {
    MethodCall::new("execute.throw")
        .arg("")
        .arg("mkdir")
        .arg("-p")
        .arg(path)
}

/// Recursively delete `path` on the engine host.
#[must_use]
pub fn delete_path(path: &str) -> MethodCall {
    MethodCall::new("execute.throw")
        .arg("")
        .arg("rm")
        .arg("-rf")
        .arg("--")
        .arg(path)
}

/// Options applied to a torrent when it is loaded.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions<'a> {
    /// Download directory.
    pub destination: &'a str,
    /// Treat `destination` as the payload root.
    pub is_base_path: bool,
    /// Start immediately after loading.
    pub start: bool,
    /// Taxonomy tags.
    pub tags: &'a [String],
}

impl LoadOptions<'_> {
    fn post_load_commands(&self) -> [String; 2] {
        [
            format!(
                "{}=\"{}\"",
                directory_method(self.is_base_path),
                escape(self.destination)
            ),
            format!("d.custom1.set=\"{}\"", escape(&join_tags(self.tags))),
        ]
    }
}

/// Load a torrent from a URL or magnet link.
#[must_use]
pub fn load_url(url: &str, options: &LoadOptions<'_>) -> MethodCall {
    let method = if options.start { "load.start" } else { "load.normal" };
    MethodCall::new(method)
        .arg("")
        .arg(url)
        .args(options.post_load_commands())
}

/// Load a torrent from raw metainfo bytes.
#[must_use]
pub fn load_raw(metainfo: Vec<u8>, options: &LoadOptions<'_>) -> MethodCall {
    let method = if options.start {
        "load.raw_start"
    } else {
        "load.raw"
    };
    MethodCall::new(method)
        .arg("")
        .arg(metainfo)
        .args(options.post_load_commands())
}

/// Set the global throttle for one direction, in bytes per second.
#[must_use]
pub fn set_throttle(direction: SpeedDirection, bytes_per_sec: u64) -> MethodCall {
    let method = match direction {
        SpeedDirection::Download => "throttle.global_down.max_rate.set",
        SpeedDirection::Upload => "throttle.global_up.max_rate.set",
    };
    MethodCall::new(method)
        .arg("")
        .arg(i64::try_from(bytes_per_sec).unwrap_or(i64::MAX))
}

/// Fetch one row of [`LIST_FIELDS`] per torrent in the main view.
#[must_use]
pub fn list_torrents() -> MethodCall {
    MethodCall::new("d.multicall2")
        .arg("")
        .arg("main")
        .args(LIST_FIELDS.iter().copied())
}

fn per_item(method: &str, hash: &TorrentHash, fields: &[&str]) -> MethodCall {
    MethodCall::new(method)
        .arg(hash.as_str())
        .arg("")
        .args(fields.iter().copied())
}

/// Fetch one row of [`PEER_FIELDS`] per connected peer.
#[must_use]
pub fn peers(hash: &TorrentHash) -> MethodCall {
    per_item("p.multicall", hash, PEER_FIELDS)
}

/// Fetch one row of [`FILE_FIELDS`] per file, ordered by file index.
#[must_use]
pub fn files(hash: &TorrentHash) -> MethodCall {
    per_item("f.multicall", hash, FILE_FIELDS)
}

/// Fetch one row of [`TRACKER_FIELDS`] per tracker.
#[must_use]
pub fn trackers(hash: &TorrentHash) -> MethodCall {
    per_item("t.multicall", hash, TRACKER_FIELDS)
}

/// Pass an introspection call through unchanged.
#[must_use]
pub fn introspect(method: &str, args: Vec<String>) -> MethodCall {
    MethodCall::new(method).args(args)
}

const fn directory_method(is_base_path: bool) -> &'static str {
    if is_base_path {
        "d.directory_base.set"
    } else {
        "d.directory.set"
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
