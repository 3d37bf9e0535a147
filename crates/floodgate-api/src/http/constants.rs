//! Shared HTTP constants (headers, problem URIs).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const PROBLEM_INTERNAL: &str = "https://floodgate.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://floodgate.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://floodgate.dev/problems/not-found";
pub(crate) const PROBLEM_ENGINE_UNAVAILABLE: &str =
    "https://floodgate.dev/problems/engine-unavailable";

pub(crate) const CONTENT_TYPE_TAR: &str = "application/x-tar";
pub(crate) const CONTENT_TYPE_BINARY: &str = "application/octet-stream";
pub(crate) const CONTENT_TYPE_METRICS: &str = "text/plain; version=0.0.4";
