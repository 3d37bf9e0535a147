//! Boot sequence: configuration, logging, engine client, cache refresher, HTTP API.

use std::sync::Arc;

use floodgate_api::ApiServer;
use floodgate_client::{ClientDeps, ClientService};
use floodgate_config::{AppConfig, SettingsTable};
use floodgate_fsops::TemporaryStorage;
use floodgate_rpc::{BatchExecutor, JsonRpcTransport, RpcTransport};
use floodgate_telemetry::{LogFormat, LoggingConfig, Metrics, build_sha, init_logging};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Dependencies required to boot the service.
pub(crate) struct BootstrapDependencies {
    config: AppConfig,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the process environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config = AppConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self { config, telemetry })
    }
}

/// Entry point for the Floodgate boot sequence.
///
/// # Errors
///
/// Returns an error if configuration is invalid, logging cannot be installed, the engine
/// transport cannot be built, or the API listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies { config, telemetry } = dependencies;

    let logging = LoggingConfig {
        level: &config.log_level,
        format: config
            .log_format
            .as_deref()
            .map_or_else(LogFormat::infer, LogFormat::from_name),
        build_sha: build_sha(),
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!(
        engine = %config.engine_url,
        temp_dir = %config.temp_dir.display(),
        "floodgate bootstrap starting"
    );

    let client = build_client(&config, &telemetry)?;

    match client.refresh_torrents().await {
        Ok(count) => info!(torrents = count, "initial cache refresh complete"),
        Err(err) => warn!(error = %err, "initial cache refresh failed"),
    }
    let refresh_task = client.refresher().spawn_periodic(config.refresh_interval);

    let serve_result = ApiServer::new(client, telemetry)
        .serve(config.bind_addr)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err));

    refresh_task.abort();
    if let Err(err) = refresh_task.await
        && !err.is_cancelled()
    {
        warn!(error = %err, "cache refresh task join failed");
    }

    serve_result
}

fn build_client(config: &AppConfig, telemetry: &Metrics) -> AppResult<ClientService> {
    let transport = JsonRpcTransport::new(config.engine_url.clone(), config.rpc_timeout)
        .map_err(|err| AppError::transport("rpc.transport", err))?;
    let transport: Arc<dyn RpcTransport> = Arc::new(transport);
    let executor = BatchExecutor::new(transport).with_metrics(telemetry.clone());
    let storage = TemporaryStorage::new(config.temp_dir.clone()).with_metrics(telemetry.clone());

    Ok(ClientService::new(ClientDeps {
        executor,
        settings: Arc::new(SettingsTable::standard()),
        storage,
        metrics: Some(telemetry.clone()),
    }))
}
