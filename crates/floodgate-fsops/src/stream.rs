//! Chunked file streams for HTTP responses.

use std::path::PathBuf;

use bytes::Bytes;
use futures_util::Stream;
use tokio::io::AsyncReadExt;

use crate::storage::ArchiveArtifact;

const CHUNK_SIZE: usize = 64 * 1024;

/// Stream the file at `path` in fixed-size chunks.
pub fn file_stream(path: PathBuf) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    read_chunks(path, None)
}

/// Stream an archive artifact, removing it once the stream finishes, fails, or is dropped.
pub fn artifact_stream(
    artifact: ArchiveArtifact,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    let path = artifact.path().to_path_buf();
    read_chunks(path, Some(artifact))
}

fn read_chunks(
    path: PathBuf,
    guard: Option<ArchiveArtifact>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    async_stream::try_stream! {
        // Held for the stream's lifetime; dropped with the generator.
        let _guard = guard;
        let mut file = tokio::fs::File::open(&path).await?;
        let mut buffer = vec![0_u8; CHUNK_SIZE];
        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buffer[..read]);
        }
    }
}
