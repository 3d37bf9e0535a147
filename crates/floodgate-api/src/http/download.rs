//! Streamed file downloads.
//!
//! One selected file is streamed from the payload directory; several are
//! streamed from a temporary tar archive that is removed when the body is
//! dropped, whether the transfer finished, failed, or the client went away.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use floodgate_fsops::{DownloadPlan, artifact_stream, file_stream, parse_indices};
use tracing::{error, info};

use crate::http::constants::{CONTENT_TYPE_BINARY, CONTENT_TYPE_TAR};
use crate::http::errors::ApiError;
use crate::http::torrents::parse_hash;
use crate::models::DownloadQuery;
use crate::state::ApiState;

pub(crate) async fn download_files(
    State(state): State<Arc<ApiState>>,
    Path(hash): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let hash = parse_hash(&hash)?;
    let indices = parse_indices(&query.indices);
    let plan = state.client.download_files(&hash, &indices).await?;
    let (body, filename, size, content_type) = match plan {
        DownloadPlan::NotFound => {
            return Err(ApiError::not_found("no matching files on disk"));
        }
        DownloadPlan::Single {
            path,
            filename,
            size,
        } => (
            Body::from_stream(file_stream(path)),
            filename,
            size,
            CONTENT_TYPE_BINARY,
        ),
        DownloadPlan::Archive {
            artifact,
            filename,
            size,
        } => (
            Body::from_stream(artifact_stream(artifact)),
            filename,
            size,
            CONTENT_TYPE_TAR,
        ),
    };
    info!(torrent_hash = %hash, file = %filename, bytes = size, "streaming download");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size)
        .header(header::CONTENT_DISPOSITION, attachment(&filename)?)
        .body(body)
        .map_err(|err| {
            error!(error = %err, "failed to build download response");
            ApiError::internal("failed to build download response")
        })
}

fn attachment(filename: &str) -> Result<HeaderValue, ApiError> {
    let safe: String = filename
        .chars()
        .map(|ch| if ch == '"' || ch == '\\' || ch.is_control() { '_' } else { ch })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .map_err(|_| ApiError::internal("attachment name is not a valid header"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestApi, test_api};
    use floodgate_rpc::RpcValue;
    use floodgate_test_support::fixtures::{file_row, list_row, sample_hash};

    async fn seed(api: &TestApi, digit: char) -> anyhow::Result<String> {
        let hash = sample_hash(digit)?;
        let payload = api.scratch.path().join("payload");
        std::fs::create_dir_all(&payload)?;
        std::fs::write(payload.join("a.txt"), b"alpha")?;
        std::fs::write(payload.join("b.txt"), b"beta")?;
        api.transport.respond(
            "d.multicall2",
            RpcValue::List(vec![list_row(
                &hash,
                "Pack \"One\"",
                &payload.display().to_string(),
                "",
            )]),
        );
        api.transport.respond(
            "f.multicall",
            RpcValue::List(vec![file_row("a.txt", 5, 1), file_row("b.txt", 4, 1)]),
        );
        api.state.client.refresh_torrents().await?;
        Ok(hash.to_string())
    }

    fn query(indices: &str) -> Query<DownloadQuery> {
        Query(DownloadQuery {
            indices: indices.to_string(),
        })
    }

    #[tokio::test]
    async fn single_selection_streams_the_file_under_its_name() -> anyhow::Result<()> {
        let api = test_api()?;
        let hash = seed(&api, 'a').await?;
        let response = download_files(State(api.state.clone()), Path(hash), query("1"))
            .await
            .map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION),
            Some(&HeaderValue::from_static("attachment; filename=\"b.txt\""))
        );
        assert_eq!(
            response.headers().get(header::CONTENT_LENGTH),
            Some(&HeaderValue::from_static("4"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn archive_is_named_after_the_torrent_and_removed_with_the_body() -> anyhow::Result<()> {
        let api = test_api()?;
        let hash = seed(&api, 'b').await?;
        let response = download_files(State(api.state.clone()), Path(hash), query("0,1"))
            .await
            .map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION),
            Some(&HeaderValue::from_static(
                "attachment; filename=\"Pack _One_.tar\""
            ))
        );
        let artifacts = api.scratch.path().join("artifacts");
        assert_eq!(std::fs::read_dir(&artifacts)?.count(), 1);
        drop(response);
        assert_eq!(std::fs::read_dir(&artifacts)?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn empty_selection_is_not_found() -> anyhow::Result<()> {
        let api = test_api()?;
        let hash = seed(&api, 'c').await?;
        let result = download_files(State(api.state), Path(hash), query("9")).await;
        assert_eq!(result.err().map(|err| err.status), Some(StatusCode::NOT_FOUND));
        Ok(())
    }
}
