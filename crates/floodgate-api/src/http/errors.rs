//! RFC9457-style API error wrapper.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use floodgate_client::ClientError;
use floodgate_torrent_core::TorrentError;
use tracing::{error, warn};

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_ENGINE_UNAVAILABLE, PROBLEM_INTERNAL, PROBLEM_NOT_FOUND,
};
use crate::models::{ProblemDetails, ProblemInvalidParam};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_param(mut self, field: &str, reason: &str) -> Self {
        self.invalid_params
            .get_or_insert_with(Vec::new)
            .push(ProblemInvalidParam {
                pointer: format!("/{field}"),
                message: reason.to_string(),
            });
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    pub(crate) fn engine_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            PROBLEM_ENGINE_UNAVAILABLE,
            "engine request failed",
        )
        .with_detail(detail)
    }
}

impl From<TorrentError> for ApiError {
    fn from(err: TorrentError) -> Self {
        match err {
            TorrentError::InvalidRequest { field, reason } => {
                Self::bad_request("request failed validation").with_invalid_param(field, reason)
            }
            TorrentError::InvalidHash { value } => {
                Self::bad_request("invalid torrent hash").with_invalid_param("hash", &value)
            }
            TorrentError::InvalidPriority { kind, .. } => {
                Self::bad_request("invalid priority").with_invalid_param("priority", kind)
            }
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidRequest { source } => source.into(),
            ClientError::InvalidInput { field, reason } => {
                Self::bad_request("request failed validation").with_invalid_param(field, reason)
            }
            ClientError::Settings { source } => {
                warn!(error = %source, "rejected settings value");
                Self::bad_request("settings value could not be translated")
            }
            ClientError::NotFound { hash } => {
                Self::not_found(format!("torrent {hash} is not known"))
            }
            ClientError::Engine { operation, source } => {
                warn!(operation, error = %source, "engine request failed");
                Self::engine_unavailable(format!("{operation}: {source}"))
            }
            ClientError::FileSystem { operation, source } => {
                error!(operation, error = %source, "filesystem operation failed");
                Self::internal("filesystem operation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodgate_rpc::{RpcError, TransportError};
    use floodgate_test_support::fixtures::sample_hash;

    #[test]
    fn client_errors_map_to_problem_statuses() -> anyhow::Result<()> {
        let cases = vec![
            (
                ClientError::Engine {
                    operation: "start_torrents",
                    source: RpcError::Transport(TransportError::Timeout),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ClientError::InvalidInput {
                    field: "method",
                    reason: "not_introspection",
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ClientError::NotFound {
                    hash: sample_hash('a')?,
                },
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
        Ok(())
    }

    #[test]
    fn validation_errors_carry_field_pointers() {
        let err = ApiError::from(TorrentError::InvalidRequest {
            field: "hashes",
            reason: "empty",
        });
        assert_eq!(err.kind, PROBLEM_BAD_REQUEST);
        let params = err.invalid_params.unwrap_or_default();
        assert_eq!(params[0].pointer, "/hashes");
        assert_eq!(params[0].message, "empty");
    }
}
