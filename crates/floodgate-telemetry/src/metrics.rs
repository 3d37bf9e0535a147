//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Collector registration stays private; callers only see typed recorders.
//! - Label values are plain `&str` so crates can record without importing Prometheus.

use std::sync::Arc;

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder, core::Collector,
};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    rpc_round_trips_total: IntCounterVec,
    rpc_calls_total: IntCounter,
    workflow_steps_total: IntCounterVec,
    cache_refresh_total: IntCounterVec,
    cached_torrents: IntGauge,
    archive_artifacts_total: IntCounterVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("Metrics").finish_non_exhaustive()
    }
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Torrents held by the state cache after the last refresh.
    pub cached_torrents: i64,
    /// Engine method invocations issued since start.
    pub rpc_calls_total: u64,
    /// Failed cache refreshes since start.
    pub cache_refresh_failures_total: u64,
}

impl Metrics {
    /// Construct a new registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = register(
            &registry,
            "http_requests_total",
            counter_vec(
                "http_requests_total",
                "Total HTTP requests served",
                &["route", "code"],
            )?,
        )?;
        let rpc_round_trips_total = register(
            &registry,
            "rpc_round_trips_total",
            counter_vec(
                "rpc_round_trips_total",
                "Physical round trips to the engine by outcome",
                &["outcome"],
            )?,
        )?;
        let rpc_calls_total = register(
            &registry,
            "rpc_calls_total",
            IntCounter::with_opts(Opts::new(
                "rpc_calls_total",
                "Engine method invocations issued",
            ))
            .map_err(|source| TelemetryError::build("rpc_calls_total", source))?,
        )?;
        let workflow_steps_total = register(
            &registry,
            "workflow_steps_total",
            counter_vec(
                "workflow_steps_total",
                "Workflow steps executed by workflow and status",
                &["workflow", "status"],
            )?,
        )?;
        let cache_refresh_total = register(
            &registry,
            "cache_refresh_total",
            counter_vec(
                "cache_refresh_total",
                "Torrent cache refreshes by outcome",
                &["outcome"],
            )?,
        )?;
        let cached_torrents = register(
            &registry,
            "cached_torrents",
            IntGauge::with_opts(Opts::new(
                "cached_torrents",
                "Torrents held by the state cache",
            ))
            .map_err(|source| TelemetryError::build("cached_torrents", source))?,
        )?;
        let archive_artifacts_total = register(
            &registry,
            "archive_artifacts_total",
            counter_vec(
                "archive_artifacts_total",
                "Temporary download archives by outcome",
                &["outcome"],
            )?,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                rpc_round_trips_total,
                rpc_calls_total,
                workflow_steps_total,
                cache_refresh_total,
                cached_torrents,
                archive_artifacts_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record one physical engine round trip carrying `calls` method invocations.
    pub fn record_rpc_round_trip(&self, outcome: &str, calls: usize) {
        self.inner
            .rpc_round_trips_total
            .with_label_values(&[outcome])
            .inc();
        self.inner
            .rpc_calls_total
            .inc_by(u64::try_from(calls).unwrap_or(u64::MAX));
    }

    /// Increment the workflow step counter.
    pub fn inc_workflow_step(&self, workflow: &str, status: &str) {
        self.inner
            .workflow_steps_total
            .with_label_values(&[workflow, status])
            .inc();
    }

    /// Record a cache refresh outcome.
    pub fn inc_cache_refresh(&self, outcome: &str) {
        self.inner
            .cache_refresh_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Set the cached torrent gauge.
    pub fn set_cached_torrents(&self, count: usize) {
        self.inner
            .cached_torrents
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record the fate of a temporary archive artifact.
    pub fn inc_archive_artifact(&self, outcome: &str) {
        self.inner
            .archive_artifacts_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or produces invalid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderEncoding { source })
    }

    /// Take a point-in-time snapshot of the gauges used by health reporting.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cached_torrents: self.inner.cached_torrents.get(),
            rpc_calls_total: self.inner.rpc_calls_total.get(),
            cache_refresh_failures_total: self
                .inner
                .cache_refresh_total
                .with_label_values(&["error"])
                .get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::build(name, source))
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<C>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::register(name, source))?;
    Ok(collector)
}
