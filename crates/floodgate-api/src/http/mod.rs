//! HTTP surface modules (router, handlers, middleware).

/// Client-level handlers: settings, throttles, introspection.
pub mod client;
/// Shared header names and problem URIs.
pub mod constants;
/// Streamed file downloads.
pub mod download;
/// Problem response helpers and error types.
pub mod errors;
/// Health and metrics endpoints.
pub mod health;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
/// Torrent handlers.
pub mod torrents;
