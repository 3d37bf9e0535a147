//! Torrent handlers: cache reads, details, and mutating actions.
//!
//! Mutating handlers answer with the operation's own outcome; they never wait
//! for the cache refresh the operation triggers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use floodgate_rpc::RpcValue;
use floodgate_torrent_core::{
    AddTorrentFiles, AddTorrentUrls, MoveTorrents, TorrentDetails, TorrentHash, TorrentSummary,
    TorrentUpload,
};
use serde_json::Value;
use tracing::info;

use crate::http::errors::ApiError;
use crate::models::{
    AddFilesRequest, FilePriorityRequest, HashesRequest, PriorityRequest, RemoveTorrentsRequest,
    TaxonomyRequest,
};
use crate::state::ApiState;

pub(crate) fn parse_hash(raw: &str) -> Result<TorrentHash, ApiError> {
    TorrentHash::parse(raw).map_err(ApiError::from)
}

pub(crate) async fn list_torrents(State(state): State<Arc<ApiState>>) -> Json<Vec<TorrentSummary>> {
    Json(state.client.list_torrents().await)
}

pub(crate) async fn get_torrent(
    State(state): State<Arc<ApiState>>,
    Path(hash): Path<String>,
) -> Result<Json<TorrentSummary>, ApiError> {
    let hash = parse_hash(&hash)?;
    Ok(Json(state.client.get_torrent(&hash).await?))
}

pub(crate) async fn torrent_details(
    State(state): State<Arc<ApiState>>,
    Path(hash): Path<String>,
) -> Result<Json<TorrentDetails>, ApiError> {
    let hash = parse_hash(&hash)?;
    Ok(Json(state.client.get_torrent_details(&hash).await?))
}

pub(crate) async fn add_urls(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AddTorrentUrls>,
) -> Result<StatusCode, ApiError> {
    let count = request.urls.len();
    state.client.add_urls(request).await?;
    info!(urls = count, "torrents added from urls");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_files(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AddFilesRequest>,
) -> Result<StatusCode, ApiError> {
    let files = request
        .files
        .into_iter()
        .map(|file| {
            BASE64
                .decode(file.metainfo.as_bytes())
                .map(|metainfo| TorrentUpload {
                    name: file.name,
                    metainfo,
                })
                .map_err(|_| {
                    ApiError::bad_request("metainfo must be base64")
                        .with_invalid_param("files", "invalid_base64")
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let count = files.len();
    state
        .client
        .add_files(AddTorrentFiles {
            files,
            destination: request.destination,
            is_base_path: request.is_base_path,
            start: request.start,
            tags: request.tags,
        })
        .await?;
    info!(files = count, "torrents added from uploads");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn start_torrents(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<HashesRequest>,
) -> Result<StatusCode, ApiError> {
    state.client.start_torrents(&request.hashes).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn stop_torrents(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<HashesRequest>,
) -> Result<StatusCode, ApiError> {
    state.client.stop_torrents(&request.hashes).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn check_hash(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<HashesRequest>,
) -> Result<StatusCode, ApiError> {
    state.client.check_hash(&request.hashes).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn remove_torrents(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RemoveTorrentsRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .client
        .remove_torrents(&request.hashes, request.delete_data)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn move_torrents(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<MoveTorrents>,
) -> Result<Json<Value>, ApiError> {
    let rows = state.client.move_torrents(request).await?;
    Ok(Json(RpcValue::List(rows).to_json()))
}

pub(crate) async fn set_priority(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<PriorityRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .client
        .set_priority(&request.hashes, request.priority)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn set_file_priority(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<FilePriorityRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .client
        .set_file_priority(&request.hash, &request.indices, request.priority)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn set_taxonomy(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TaxonomyRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .client
        .set_taxonomy(&request.hashes, &request.tags)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
