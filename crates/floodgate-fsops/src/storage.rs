//! Temporary storage for download archives.
//!
//! # Design
//! - Each [`ArchiveArtifact`] is exclusively owned; dropping it deletes the file.
//! - Names are `<hash>-<millis>.tar`; a counter suffix resolves collisions
//!   between artifacts created in the same millisecond.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use floodgate_telemetry::Metrics;
use floodgate_torrent_core::TorrentHash;
use tracing::{debug, warn};

use crate::error::{FsOpsError, FsOpsResult};

const MAX_NAME_ATTEMPTS: u64 = 64;

/// Directory that hands out uniquely named archive artifacts.
#[derive(Debug, Clone)]
pub struct TemporaryStorage {
    root: PathBuf,
    sequence: Arc<AtomicU64>,
    metrics: Option<Metrics>,
}

impl TemporaryStorage {
    /// Use `root` for artifacts. The directory is created on first allocation.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sequence: Arc::new(AtomicU64::new(0)),
            metrics: None,
        }
    }

    /// Record artifact lifecycle in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Directory holding the artifacts.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create an empty artifact file for `hash`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory or file cannot be created.
    pub fn allocate(&self, hash: &TorrentHash) -> FsOpsResult<ArchiveArtifact> {
        std::fs::create_dir_all(&self.root)
            .map_err(|source| FsOpsError::io("storage.create_root", &self.root, source))?;

        let stamp = Utc::now().timestamp_millis();
        let mut attempt = 0;
        loop {
            let name = if attempt == 0 {
                format!("{hash}-{stamp}.tar")
            } else {
                let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
                format!("{hash}-{stamp}-{sequence}.tar")
            };
            let path = self.root.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    debug!(path = %path.display(), "allocated archive artifact");
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_archive_artifact("created");
                    }
                    return Ok(ArchiveArtifact {
                        path,
                        metrics: self.metrics.clone(),
                    });
                }
                Err(err)
                    if err.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS =>
                {
                    attempt += 1;
                }
                Err(err) => return Err(FsOpsError::io("storage.allocate", path, err)),
            }
        }
    }
}

/// A temporary archive file removed when dropped.
#[derive(Debug)]
pub struct ArchiveArtifact {
    path: PathBuf,
    metrics: Option<Metrics>,
}

impl ArchiveArtifact {
    /// Location of the artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArchiveArtifact {
    fn drop(&mut self) {
        let outcome = match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed archive artifact");
                "removed"
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => "removed",
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove archive artifact"
                );
                "cleanup_failed"
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.inc_archive_artifact(outcome);
        }
    }
}
