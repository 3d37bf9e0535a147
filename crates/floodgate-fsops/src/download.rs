//! Download planning: one file is served directly, several are archived first.

use std::path::{Path, PathBuf};

use floodgate_torrent_core::{TorrentFile, TorrentHash};
use tracing::{debug, info};

use crate::archive::build_artifact;
use crate::error::{FsOpsError, FsOpsResult};
use crate::storage::{ArchiveArtifact, TemporaryStorage};

/// What to send back for a file-download request.
#[derive(Debug)]
pub enum DownloadPlan {
    /// Stream one payload file under its own base name.
    Single {
        /// On-disk location.
        path: PathBuf,
        /// Attachment file name.
        filename: String,
        /// Content length.
        size: u64,
    },
    /// Stream a freshly built archive, removed once the stream ends.
    Archive {
        /// Temporary archive file.
        artifact: ArchiveArtifact,
        /// Attachment file name (`<torrent name>.tar`).
        filename: String,
        /// Content length.
        size: u64,
    },
    /// Nothing matched, or the single selected file is missing on disk.
    NotFound,
}

impl DownloadPlan {
    /// Attachment file name, if there is anything to send.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Single { filename, .. } | Self::Archive { filename, .. } => Some(filename),
            Self::NotFound => None,
        }
    }
}

/// Torrent-level context for resolving selected files on disk.
#[derive(Debug, Clone, Copy)]
pub struct DownloadSource<'a> {
    /// Torrent being downloaded from.
    pub hash: &'a TorrentHash,
    /// Torrent display name, used for archive names.
    pub name: &'a str,
    /// Directory the file paths are relative to.
    pub directory: &'a Path,
}

/// Resolve `selected` into a download plan.
///
/// # Errors
///
/// Returns IO errors other than a missing single file, and any error raised
/// while building an archive (the artifact is removed in that case).
pub async fn plan_download(
    storage: &TemporaryStorage,
    source: DownloadSource<'_>,
    selected: &[&TorrentFile],
) -> FsOpsResult<DownloadPlan> {
    match selected {
        [] => Ok(DownloadPlan::NotFound),
        [file] => {
            let path = source.directory.join(&file.path);
            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => {
                    debug!(path = %path.display(), "serving single file");
                    Ok(DownloadPlan::Single {
                        filename: file.filename().to_string(),
                        size: metadata.len(),
                        path,
                    })
                }
                Ok(_) => Ok(DownloadPlan::NotFound),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Ok(DownloadPlan::NotFound)
                }
                Err(err) => Err(FsOpsError::io("download.stat", path, err)),
            }
        }
        files => {
            let sources: Vec<PathBuf> = files
                .iter()
                .map(|file| source.directory.join(&file.path))
                .collect();
            let artifact =
                build_artifact(storage.clone(), source.hash.clone(), sources).await?;
            let size = tokio::fs::metadata(artifact.path())
                .await
                .map_err(|err| FsOpsError::io("download.stat_archive", artifact.path(), err))?
                .len();
            info!(
                torrent_hash = %source.hash,
                files = files.len(),
                bytes = size,
                "built download archive"
            );
            Ok(DownloadPlan::Archive {
                artifact,
                filename: format!("{}.tar", source.name),
                size,
            })
        }
    }
}
