//! Physical relocation of torrent payloads on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// One payload to move: current location and new location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Current payload path (file or directory).
    pub source: PathBuf,
    /// Target payload path.
    pub destination: PathBuf,
}

/// Move every payload in order, stopping at the first failure.
///
/// Uses a rename where possible and falls back to copy-then-remove across
/// filesystems. Payloads whose source equals their destination are skipped.
///
/// # Errors
///
/// Returns the first IO or traversal failure; earlier moves are not undone.
pub async fn relocate_payloads(relocations: Vec<Relocation>) -> FsOpsResult<()> {
    tokio::task::spawn_blocking(move || {
        for relocation in &relocations {
            if relocation.source == relocation.destination {
                continue;
            }
            move_tree(&relocation.source, &relocation.destination)?;
            info!(
                source = %relocation.source.display(),
                destination = %relocation.destination.display(),
                "relocated payload"
            );
        }
        Ok(())
    })
    .await
    .map_err(|_| FsOpsError::Task {
        operation: "relocate.move",
    })?
}

fn move_tree(source: &Path, destination: &Path) -> FsOpsResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| FsOpsError::io("relocate.create_parent", parent, err))?;
    }
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }

    copy_tree(source, destination)?;
    let removed = if source.is_dir() {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    };
    match removed {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            Err(FsOpsError::io("relocate.cleanup", source, err))
        }
        _ => Ok(()),
    }
}

fn copy_tree(source: &Path, destination: &Path) -> FsOpsResult<()> {
    if source.is_file() {
        fs::copy(source, destination)
            .map_err(|err| FsOpsError::io("relocate.copy_file", destination, err))?;
        return Ok(());
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| FsOpsError::walkdir("relocate.walk", source, err))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| FsOpsError::InvalidInput {
                field: "source",
                reason: "strip_prefix",
                value: Some(entry.path().to_string_lossy().into_owned()),
            })?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|err| FsOpsError::io("relocate.create_dir", &target, err))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|err| FsOpsError::io("relocate.copy_entry", &target, err))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directories_and_files_move_into_place() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let old = dir.path().join("old");
        fs::create_dir_all(old.join("album/disc1"))?;
        fs::write(old.join("album/disc1/track.flac"), b"music")?;
        fs::write(old.join("single.iso"), b"iso")?;
        let new = dir.path().join("new");

        relocate_payloads(vec![
            Relocation {
                source: old.join("album"),
                destination: new.join("album"),
            },
            Relocation {
                source: old.join("single.iso"),
                destination: new.join("single.iso"),
            },
        ])
        .await?;

        assert_eq!(fs::read(new.join("album/disc1/track.flac"))?, b"music");
        assert_eq!(fs::read(new.join("single.iso"))?, b"iso");
        assert!(!old.join("album").exists());
        Ok(())
    }

    #[test]
    fn copy_fallback_reproduces_nested_layout() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("src");
        fs::create_dir_all(source.join("a/b"))?;
        fs::write(source.join("a/b/c.txt"), b"c")?;
        let destination = dir.path().join("dst");

        copy_tree(&source, &destination)?;
        assert_eq!(fs::read(destination.join("a/b/c.txt"))?, b"c");
        Ok(())
    }

    #[tokio::test]
    async fn missing_source_fails() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let result = relocate_payloads(vec![Relocation {
            source: dir.path().join("absent"),
            destination: dir.path().join("elsewhere/absent"),
        }])
        .await;
        assert!(result.is_err());
        Ok(())
    }
}
