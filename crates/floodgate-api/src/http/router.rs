//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    middleware,
    routing::{get, patch, post, put},
};
use floodgate_client::ClientService;
use floodgate_telemetry::{Metrics, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::client::{call_method, get_settings, patch_settings, set_speed_limits};
use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::download::download_files;
use crate::http::health::{health, metrics};
use crate::http::telemetry::record_http_request;
use crate::http::torrents::{
    add_files, add_urls, check_hash, get_torrent, list_torrents, move_torrents, remove_torrents,
    set_file_priority, set_priority, set_taxonomy, start_torrents, stop_torrents, torrent_details,
};
use crate::state::ApiState;

/// Axum router wrapper that hosts the Floodgate API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router over `client`, recording request metrics in `telemetry`.
    #[must_use]
    pub fn new(client: ClientService, telemetry: Metrics) -> Self {
        let state = Arc::new(ApiState::new(client, telemetry));
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::PUT,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_REQUEST_ID)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(floodgate_telemetry::propagate_request_id_layer())
            .layer(floodgate_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                record_http_request,
            ));

        let router = Self::build_router()
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);
        Self { router }
    }

    fn build_router() -> Router<Arc<ApiState>> {
        Self::public_routes()
            .merge(Self::torrent_routes())
            .merge(Self::client_routes())
    }

    fn public_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
    }

    fn torrent_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/api/torrents", get(list_torrents))
            .route("/api/torrents/add-urls", post(add_urls))
            .route("/api/torrents/add-files", post(add_files))
            .route("/api/torrents/start", post(start_torrents))
            .route("/api/torrents/stop", post(stop_torrents))
            .route("/api/torrents/check-hash", post(check_hash))
            .route("/api/torrents/remove", post(remove_torrents))
            .route("/api/torrents/move", post(move_torrents))
            .route("/api/torrents/priority", patch(set_priority))
            .route("/api/torrents/file-priority", patch(set_file_priority))
            .route("/api/torrents/taxonomy", patch(set_taxonomy))
            .route("/api/torrents/{hash}", get(get_torrent))
            .route("/api/torrents/{hash}/details", get(torrent_details))
            .route("/api/torrents/{hash}/files", get(download_files))
    }

    fn client_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route(
                "/api/client/settings",
                get(get_settings).patch(patch_settings),
            )
            .route("/api/client/settings/speed-limits", put(set_speed_limits))
            .route("/api/client/methods", post(call_method))
    }

    /// Serve the API on `addr` until the server stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        tracing::info!(addr = %addr, "starting api listener");
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }

    /// Consume the server, returning the configured router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }
}
