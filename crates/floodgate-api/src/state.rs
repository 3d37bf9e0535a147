//! Shared state handed to every handler.

use floodgate_client::ClientService;
use floodgate_telemetry::Metrics;

/// Dependencies shared by HTTP handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub(crate) client: ClientService,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    /// Bundle the client service and metrics registry.
    #[must_use]
    pub const fn new(client: ClientService, telemetry: Metrics) -> Self {
        Self { client, telemetry }
    }
}
