//! File-tree and engine-row fixtures.

use std::fs;
use std::path::Path;

use floodgate_rpc::RpcValue;
use floodgate_torrent_core::{FilePriority, FileTree, TorrentFile, TorrentHash};

/// Tree with a root-level leaf (index 2) and nested leaves (5, 7):
///
/// ```text
/// notes.txt            #2
/// extras/bonus.bin     #5
/// extras/art/cover.jpg #7
/// ```
#[must_use]
pub fn nested_tree() -> FileTree {
    FileTree::from_files([
        leaf(2, "notes.txt", 12),
        leaf(5, "extras/bonus.bin", 2048),
        leaf(7, "extras/art/cover.jpg", 512),
    ])
}

/// A leaf with normal priority and no progress.
#[must_use]
pub fn leaf(index: u32, path: &str, size_bytes: u64) -> TorrentFile {
    TorrentFile {
        index,
        path: path.to_string(),
        size_bytes,
        priority: FilePriority::Normal,
        percent_complete: 0.0,
    }
}

/// Write every leaf of `tree` under `root` with `size_bytes` of filler.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn write_tree_payload(root: &Path, tree: &FileTree) -> anyhow::Result<()> {
    for file in &tree.files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let size = usize::try_from(file.size_bytes)?;
        fs::write(&path, vec![b'x'; size])?;
    }
    for child in tree.directories.values() {
        write_tree_payload(root, child)?;
    }
    Ok(())
}

/// Deterministic hash made of one repeated hex digit.
///
/// # Errors
///
/// Returns an error if `digit` is not a hex digit.
pub fn sample_hash(digit: char) -> anyhow::Result<TorrentHash> {
    Ok(TorrentHash::parse(&digit.to_string().repeat(40))?)
}

/// One `d.multicall2` row for a started, active, incomplete torrent.
#[must_use]
pub fn list_row(hash: &TorrentHash, name: &str, directory: &str, tags: &str) -> RpcValue {
    RpcValue::List(vec![
        RpcValue::from(hash.as_str()),
        RpcValue::from(name),
        RpcValue::from(directory),
        RpcValue::Int(4096),
        RpcValue::Int(1024),
        RpcValue::Int(1),
        RpcValue::Int(1),
        RpcValue::Int(0),
        RpcValue::Int(0),
        RpcValue::from(tags),
        RpcValue::Int(2),
        RpcValue::from(""),
    ])
}

/// One `f.multicall` row.
#[must_use]
pub fn file_row(path: &str, size_bytes: i64, priority: i64) -> RpcValue {
    RpcValue::List(vec![
        RpcValue::from(path),
        RpcValue::Int(size_bytes),
        RpcValue::Int(priority),
        RpcValue::Int(1),
        RpcValue::Int(2),
    ])
}
