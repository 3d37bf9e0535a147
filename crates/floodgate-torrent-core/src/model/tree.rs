//! Hierarchical file listing for a torrent payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FilePriority;

/// Leaf entry in a [`FileTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentFile {
    /// Engine-assigned file index within the torrent.
    pub index: u32,
    /// Path relative to the torrent directory, `/` separated.
    pub path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Download priority.
    pub priority: FilePriority,
    /// Completion percentage.
    pub percent_complete: f64,
}

impl TorrentFile {
    /// Final path component.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Directory node: files that live directly in it plus named subdirectories.
///
/// Subdirectories are keyed in a `BTreeMap`, so traversal order is lexical by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileTree {
    /// Files directly inside this directory.
    #[serde(default)]
    pub files: Vec<TorrentFile>,
    /// Named subdirectories.
    #[serde(default)]
    pub directories: BTreeMap<String, FileTree>,
}

impl FileTree {
    /// Build a tree from flat engine file entries, splitting each path on `/`.
    #[must_use]
    pub fn from_files(files: impl IntoIterator<Item = TorrentFile>) -> Self {
        let mut root = Self::default();
        for file in files {
            let segments: Vec<&str> = file
                .path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect();
            let parents = segments.len().saturating_sub(1);
            let mut node = &mut root;
            for segment in &segments[..parents] {
                node = node.directories.entry((*segment).to_string()).or_default();
            }
            node.files.push(file);
        }
        root
    }

    /// Whether the tree contains no files at any depth.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.values().all(Self::is_empty)
    }

    /// Number of files at any depth.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
            + self
                .directories
                .values()
                .map(Self::file_count)
                .sum::<usize>()
    }
}
