#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Filesystem operations: file selection by index, temporary archive storage,
//! tar archiving, download streaming, and payload relocation.

pub mod archive;
pub mod download;
pub mod error;
pub mod relocate;
pub mod select;
pub mod storage;
pub mod stream;

pub use archive::{build_artifact, build_tar_archive};
pub use download::{DownloadPlan, DownloadSource, plan_download};
pub use error::{FsOpsError, FsOpsResult};
pub use relocate::{Relocation, relocate_payloads};
pub use select::{parse_indices, select_by_indices};
pub use storage::{ArchiveArtifact, TemporaryStorage};
pub use stream::{artifact_stream, file_stream};
