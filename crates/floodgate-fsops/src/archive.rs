//! tar Archiver for multi-file downloads.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use floodgate_torrent_core::TorrentHash;
use tar::Builder;
use tracing::debug;

use crate::error::{FsOpsError, FsOpsResult};
use crate::storage::{ArchiveArtifact, TemporaryStorage};

/// Write `sources` into the file at `target` as an uncompressed tar archive.
///
/// Entries are stored sequentially under their base name. Two sources with the
/// same base name produce two entries with the same name; extraction keeps the
/// later one.
///
/// # Errors
///
/// Returns an IO error when a source cannot be read or the archive cannot be written.
pub fn build_tar_archive(target: &Path, sources: &[PathBuf]) -> FsOpsResult<()> {
    if sources.is_empty() {
        return Err(FsOpsError::InvalidInput {
            field: "sources",
            reason: "empty",
            value: None,
        });
    }

    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(target)
        .map_err(|source| FsOpsError::io("archive.open", target, source))?;
    let mut builder = Builder::new(file);
    builder.follow_symlinks(true);

    for source in sources {
        let name = source
            .file_name()
            .ok_or_else(|| FsOpsError::InvalidInput {
                field: "sources",
                reason: "missing file name",
                value: Some(source.to_string_lossy().into_owned()),
            })?;
        builder
            .append_path_with_name(source, name)
            .map_err(|err| FsOpsError::io("archive.append", source, err))?;
    }

    builder
        .into_inner()
        .and_then(|file| file.sync_all())
        .map_err(|err| FsOpsError::io("archive.finish", target, err))?;
    debug!(path = %target.display(), entries = sources.len(), "archive finalised");
    Ok(())
}

/// Allocate an artifact for `hash` and build the archive on the blocking pool.
///
/// The artifact is owned by the blocking task until it is returned. If the
/// caller stops waiting, the task still runs to completion and the artifact is
/// removed when its result is discarded. On failure the artifact is removed
/// before the error is returned.
///
/// # Errors
///
/// Returns the archiving error, or [`FsOpsError::Task`] if the blocking task panicked.
pub async fn build_artifact(
    storage: TemporaryStorage,
    hash: TorrentHash,
    sources: Vec<PathBuf>,
) -> FsOpsResult<ArchiveArtifact> {
    tokio::task::spawn_blocking(move || {
        let artifact = storage.allocate(&hash)?;
        build_tar_archive(artifact.path(), &sources)?;
        Ok(artifact)
    })
    .await
    .map_err(|_| FsOpsError::Task {
        operation: "archive.build",
    })?
}
