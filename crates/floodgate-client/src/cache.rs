//! Torrent state cache and the refresh hooks that keep it current.
//!
//! # Design
//! - The cache is replaced wholesale from one `d.multicall2` snapshot; readers
//!   never observe a partially applied refresh.
//! - Each refresh takes a generation ticket before it queries the engine; a
//!   snapshot older than the one already applied is dropped.
//! - Mutating operations only *request* a refresh through [`RefreshTrigger`];
//!   refresh failures are logged and never reach the mutation's caller.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use floodgate_rpc::{BatchExecutor, Operation, commands};
use floodgate_telemetry::Metrics;
use floodgate_torrent_core::{TorrentHash, TorrentSummary};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::rows;

/// Hook invoked exactly once after each successful mutating operation.
pub trait RefreshTrigger: Send + Sync {
    /// Request a cache refresh after `operation` changed engine state.
    fn on_mutation_success(&self, operation: &'static str);
}

#[derive(Default)]
struct Snapshot {
    torrents: HashMap<TorrentHash, TorrentSummary>,
    refreshed_at: Option<DateTime<Utc>>,
    generation: u64,
}

/// Last-known torrent list, keyed by info-hash.
#[derive(Default)]
pub struct TorrentCache {
    snapshot: RwLock<Snapshot>,
    tickets: AtomicU64,
}

impl TorrentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the generation ticket for a refresh that is about to query the
    /// engine. Tickets increase monotonically.
    pub fn begin_refresh(&self) -> u64 {
        self.tickets.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    /// Replace the whole cache with `torrents` fetched under `generation`.
    ///
    /// Returns `false` and leaves the cache untouched when a newer generation
    /// has already been applied.
    pub async fn replace(&self, generation: u64, torrents: Vec<TorrentSummary>) -> bool {
        let mut snapshot = self.snapshot.write().await;
        if generation <= snapshot.generation {
            return false;
        }
        *snapshot = Snapshot {
            torrents: torrents
                .into_iter()
                .map(|summary| (summary.hash.clone(), summary))
                .collect(),
            refreshed_at: Some(Utc::now()),
            generation,
        };
        true
    }

    /// Every cached torrent, ordered by name then hash.
    pub async fn list(&self) -> Vec<TorrentSummary> {
        let mut values: Vec<_> = {
            let snapshot = self.snapshot.read().await;
            snapshot.torrents.values().cloned().collect()
        };
        values.sort_by(compare_summary);
        values
    }

    /// Cached entry for `hash`.
    pub async fn get(&self, hash: &TorrentHash) -> Option<TorrentSummary> {
        self.snapshot.read().await.torrents.get(hash).cloned()
    }

    /// Number of cached torrents.
    pub async fn len(&self) -> usize {
        self.snapshot.read().await.torrents.len()
    }

    /// Whether the cache holds no torrents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Time of the last successful refresh.
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.refreshed_at
    }
}

fn compare_summary(a: &TorrentSummary, b: &TorrentSummary) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.hash.as_str().cmp(b.hash.as_str()))
}

/// Fetches the torrent list from the engine into a [`TorrentCache`].
#[derive(Clone)]
pub struct CacheRefresher {
    executor: BatchExecutor,
    cache: Arc<TorrentCache>,
    metrics: Option<Metrics>,
}

impl CacheRefresher {
    /// Create a refresher writing into `cache`.
    #[must_use]
    pub fn new(executor: BatchExecutor, cache: Arc<TorrentCache>) -> Self {
        Self {
            executor,
            cache,
            metrics: None,
        }
    }

    /// Record refresh outcomes and cache size in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Shared cache this refresher writes into.
    #[must_use]
    pub fn cache(&self) -> &Arc<TorrentCache> {
        &self.cache
    }

    /// Fetch the torrent list now and replace the cache.
    ///
    /// # Errors
    ///
    /// Returns the engine error; the previous cache contents are kept.
    pub async fn refresh_now(&self) -> ClientResult<usize> {
        let operation = Operation::new("list_torrents")
            .call(commands::list_torrents())
            .post_process(rows::summaries);
        let generation = self.cache.begin_refresh();
        match self.executor.execute(operation).await {
            Ok(torrents) => {
                let count = torrents.len();
                if !self.cache.replace(generation, torrents).await {
                    debug!(generation, "stale torrent snapshot dropped");
                    return Ok(self.cache.len().await);
                }
                if let Some(metrics) = &self.metrics {
                    metrics.inc_cache_refresh("ok");
                    metrics.set_cached_torrents(count);
                }
                debug!(torrents = count, "torrent cache refreshed");
                Ok(count)
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_cache_refresh("error");
                }
                Err(ClientError::engine("list_torrents", err))
            }
        }
    }

    /// Refresh on a fixed interval until the returned task is aborted.
    #[must_use]
    pub fn spawn_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let refresher = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = refresher.refresh_now().await {
                    warn!(error = %err, "periodic torrent refresh failed");
                }
            }
        })
    }
}

impl RefreshTrigger for CacheRefresher {
    fn on_mutation_success(&self, operation: &'static str) {
        let refresher = self.clone();
        tokio::spawn(async move {
            if let Err(err) = refresher.refresh_now().await {
                warn!(operation, error = %err, "post-mutation refresh failed");
            }
        });
    }
}

impl std::fmt::Debug for CacheRefresher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CacheRefresher")
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodgate_rpc::{RpcValue, TransportError};
    use floodgate_test_support::ScriptedTransport;
    use floodgate_test_support::fixtures::{list_row, sample_hash};

    fn refresher(transport: &Arc<ScriptedTransport>) -> CacheRefresher {
        let executor = BatchExecutor::new(transport.clone());
        CacheRefresher::new(executor, Arc::new(TorrentCache::new()))
    }

    #[tokio::test]
    async fn refresh_replaces_the_whole_cache() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        let first = sample_hash('1')?;
        let second = sample_hash('2')?;
        transport.respond_once(
            "d.multicall2",
            RpcValue::List(vec![list_row(&first, "beta", "/data", "")]),
        );
        transport.respond_once(
            "d.multicall2",
            RpcValue::List(vec![list_row(&second, "alpha", "/data", "")]),
        );
        let refresher = refresher(&transport);

        assert_eq!(refresher.refresh_now().await?, 1);
        assert!(refresher.cache().get(&first).await.is_some());

        refresher.refresh_now().await?;
        assert!(refresher.cache().get(&first).await.is_none());
        assert_eq!(refresher.cache().list().await[0].name, "alpha");
        assert!(refresher.cache().refreshed_at().await.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_contents() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        let hash = sample_hash('3')?;
        transport.respond(
            "d.multicall2",
            RpcValue::List(vec![list_row(&hash, "kept", "/data", "")]),
        );
        let refresher = refresher(&transport);
        refresher.refresh_now().await?;

        transport.fail_transport(TransportError::Timeout);
        assert!(refresher.refresh_now().await.is_err());
        assert_eq!(refresher.cache().len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn list_orders_by_name_case_insensitively() -> anyhow::Result<()> {
        let cache = TorrentCache::new();
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "d.multicall2",
            RpcValue::List(vec![
                list_row(&sample_hash('4')?, "zeta", "/d", ""),
                list_row(&sample_hash('5')?, "Alpha", "/d", ""),
            ]),
        );
        let executor = BatchExecutor::new(transport.clone());
        let torrents = executor
            .execute(
                Operation::new("list_torrents")
                    .call(commands::list_torrents())
                    .post_process(rows::summaries),
            )
            .await?;
        let generation = cache.begin_refresh();
        assert!(cache.replace(generation, torrents).await);
        let names: Vec<_> = cache.list().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Alpha".to_string(), "zeta".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn older_snapshot_landing_late_is_dropped() -> anyhow::Result<()> {
        let cache = TorrentCache::new();
        let stale_hash = sample_hash('6')?;
        let fresh_hash = sample_hash('7')?;
        let summaries = |hash: &TorrentHash, name: &str| {
            rows::summaries(vec![list_row(hash, name, "/d", "")])
        };

        let stale = cache.begin_refresh();
        let fresh = cache.begin_refresh();
        assert!(fresh > stale);

        assert!(cache.replace(fresh, summaries(&fresh_hash, "fresh")?).await);
        assert!(!cache.replace(stale, summaries(&stale_hash, "stale")?).await);

        assert!(cache.get(&fresh_hash).await.is_some());
        assert!(cache.get(&stale_hash).await.is_none());
        assert_eq!(cache.len().await, 1);
        Ok(())
    }
}
