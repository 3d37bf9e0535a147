//! Client operations against the engine.
//!
//! # Design
//! - Every operation builds its calls through [`floodgate_rpc::commands`] and
//!   submits them through the shared [`BatchExecutor`].
//! - Mutating operations run through `mutate`, which fires the
//!   refresh trigger exactly once on success and never on error.
//! - Reads of the torrent list are served from the cache only.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use floodgate_config::SettingsTable;
use floodgate_fsops::{
    DownloadPlan, DownloadSource, TemporaryStorage, plan_download, select_by_indices,
};
use floodgate_rpc::commands::{self, INTROSPECTION_METHODS, LoadOptions};
use floodgate_rpc::{BatchExecutor, MethodCall, Operation, RpcValue};
use floodgate_telemetry::Metrics;
use floodgate_torrent_core::{
    AddTorrentFiles, AddTorrentUrls, FilePriority, MoveTorrents, SpeedDirection, TorrentDetails,
    TorrentError, TorrentHash, TorrentPriority, TorrentSummary,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cache::{CacheRefresher, RefreshTrigger, TorrentCache};
use crate::error::{ClientError, ClientResult};
use crate::moves::MoveTorrentsPlan;
use crate::rows;

/// Dependencies required to build a [`ClientService`].
pub struct ClientDeps {
    /// Executor over the engine transport.
    pub executor: BatchExecutor,
    /// Immutable settings translation table.
    pub settings: Arc<SettingsTable>,
    /// Scratch space for download archives.
    pub storage: TemporaryStorage,
    /// Shared metrics registry.
    pub metrics: Option<Metrics>,
}

/// Orchestration service exposing every client operation.
#[derive(Clone)]
pub struct ClientService {
    executor: BatchExecutor,
    settings: Arc<SettingsTable>,
    storage: TemporaryStorage,
    refresher: CacheRefresher,
    trigger: Arc<dyn RefreshTrigger>,
    metrics: Option<Metrics>,
}

impl ClientService {
    /// Build the service with an empty cache refreshed after every mutation.
    #[must_use]
    pub fn new(deps: ClientDeps) -> Self {
        let ClientDeps {
            executor,
            settings,
            storage,
            metrics,
        } = deps;
        let refresher = CacheRefresher::new(executor.clone(), Arc::new(TorrentCache::new()));
        let refresher = match &metrics {
            Some(metrics) => refresher.with_metrics(metrics.clone()),
            None => refresher,
        };
        Self {
            executor,
            settings,
            storage,
            trigger: Arc::new(refresher.clone()),
            refresher,
            metrics,
        }
    }

    /// Replace the post-mutation hook.
    #[must_use]
    pub fn with_refresh_trigger(mut self, trigger: Arc<dyn RefreshTrigger>) -> Self {
        self.trigger = trigger;
        self
    }

    /// Shared torrent cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<TorrentCache> {
        self.refresher.cache()
    }

    /// Refresher used for periodic and post-mutation refreshes.
    #[must_use]
    pub const fn refresher(&self) -> &CacheRefresher {
        &self.refresher
    }

    /// Cached torrents, ordered by name.
    pub async fn list_torrents(&self) -> Vec<TorrentSummary> {
        self.cache().list().await
    }

    /// Cached summary for `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the torrent is not cached.
    pub async fn get_torrent(&self, hash: &TorrentHash) -> ClientResult<TorrentSummary> {
        self.cache()
            .get(hash)
            .await
            .ok_or_else(|| ClientError::NotFound { hash: hash.clone() })
    }

    /// Refresh the cache now and return the number of torrents.
    ///
    /// # Errors
    ///
    /// Returns the engine error when the list cannot be fetched.
    pub async fn refresh_torrents(&self) -> ClientResult<usize> {
        self.refresher.refresh_now().await
    }

    /// Load torrents from URLs or magnet links in one round trip.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn add_urls(&self, request: AddTorrentUrls) -> ClientResult<()> {
        request.validate()?;
        let options = LoadOptions {
            destination: &request.destination,
            is_base_path: request.is_base_path,
            start: request.start,
            tags: &request.tags,
        };
        let loads: Vec<MethodCall> = request
            .urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(|url| commands::load_url(url, &options))
            .collect();
        let operation = Operation::new("add_urls")
            .call(commands::create_directory(&request.destination))
            .calls(loads);
        self.mutate("add_urls", async {
            self.run(operation).await?;
            Ok(())
        })
        .await
    }

    /// Load uploaded torrent files, one round trip per file.
    ///
    /// The engine caps request size, so uploads are never combined. Every file
    /// is submitted even when earlier ones are rejected; the operation reports
    /// the outcome of the last file.
    ///
    /// # Errors
    ///
    /// Returns validation errors, or the engine error of the last file.
    pub async fn add_files(&self, request: AddTorrentFiles) -> ClientResult<()> {
        request.validate()?;
        let AddTorrentFiles {
            files,
            destination,
            is_base_path,
            start,
            tags,
        } = request;
        let options = LoadOptions {
            destination: &destination,
            is_base_path,
            start,
            tags: &tags,
        };
        if let Err(err) = self
            .run(Operation::new("add_files").call(commands::create_directory(&destination)))
            .await
        {
            warn!(destination = %destination, error = %err, "destination directory not created");
        }
        self.mutate("add_files", async {
            let mut last = Ok(());
            for file in files {
                debug!(file = %file.name, bytes = file.metainfo.len(), "submitting torrent file");
                let name = file.name;
                last = self
                    .run(
                        Operation::new("add_files")
                            .call(commands::load_raw(file.metainfo, &options)),
                    )
                    .await
                    .map(|_| ());
                if let Err(err) = &last {
                    warn!(file = %name, error = %err, "torrent file rejected");
                }
            }
            last
        })
        .await
    }

    /// Open and start torrents.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn start_torrents(&self, hashes: &[TorrentHash]) -> ClientResult<()> {
        self.lifecycle(hashes, commands::start(hashes)).await
    }

    /// Stop and close torrents.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn stop_torrents(&self, hashes: &[TorrentHash]) -> ClientResult<()> {
        self.lifecycle(hashes, commands::stop(hashes)).await
    }

    /// Re-verify on-disk pieces.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn check_hash(&self, hashes: &[TorrentHash]) -> ClientResult<()> {
        self.lifecycle(hashes, commands::check_hash(hashes)).await
    }

    /// Erase torrents, optionally deleting their payloads afterwards.
    ///
    /// The cache refresh fires once the erase succeeds, even if deleting the
    /// payloads then fails.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn remove_torrents(
        &self,
        hashes: &[TorrentHash],
        delete_data: bool,
    ) -> ClientResult<()> {
        require_hashes(hashes)?;
        let paths = self
            .mutate("remove_torrents", async {
                let paths = if delete_data {
                    self.run(commands::base_paths(hashes).post_process(|rows| {
                        Ok(rows
                            .iter()
                            .filter_map(RpcValue::as_str)
                            .filter(|path| !path.is_empty())
                            .map(str::to_string)
                            .collect::<Vec<_>>())
                    }))
                    .await?
                } else {
                    Vec::new()
                };
                self.run(commands::erase(hashes)).await?;
                Ok(paths)
            })
            .await?;
        if paths.is_empty() {
            return Ok(());
        }
        info!(paths = paths.len(), "deleting torrent payloads");
        self.run(
            Operation::new("delete_payloads")
                .calls(paths.iter().map(|path| commands::delete_path(path))),
        )
        .await
        .inspect_err(|err| warn!(error = %err, "payload deletion failed"))?;
        Ok(())
    }

    /// Move torrents to a new directory, optionally moving their files.
    ///
    /// # Errors
    ///
    /// Returns validation errors, or the error of the first failing step;
    /// earlier steps stay applied.
    pub async fn move_torrents(&self, request: MoveTorrents) -> ClientResult<Vec<RpcValue>> {
        let plan = MoveTorrentsPlan::new(request)?;
        self.mutate(
            "move_torrents",
            plan.into_workflow(&self.executor, self.metrics.clone()).run(),
        )
        .await
    }

    /// Set torrent priority.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn set_priority(
        &self,
        hashes: &[TorrentHash],
        priority: TorrentPriority,
    ) -> ClientResult<()> {
        self.lifecycle(hashes, commands::set_priority(hashes, priority))
            .await
    }

    /// Set the priority of individual files within one torrent.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn set_file_priority(
        &self,
        hash: &TorrentHash,
        indices: &[u32],
        priority: FilePriority,
    ) -> ClientResult<()> {
        if indices.is_empty() {
            return Err(TorrentError::InvalidRequest {
                field: "indices",
                reason: "empty",
            }
            .into());
        }
        let operation = commands::set_file_priority(hash, indices, priority);
        self.mutate("set_file_priority", async {
            self.run(operation).await?;
            Ok(())
        })
        .await
    }

    /// Replace the taxonomy tags of torrents.
    ///
    /// # Errors
    ///
    /// Returns validation or engine errors.
    pub async fn set_taxonomy(&self, hashes: &[TorrentHash], tags: &[String]) -> ClientResult<()> {
        self.lifecycle(hashes, commands::set_taxonomy(hashes, tags))
            .await
    }

    /// Peers, files, and trackers of one torrent in one round trip.
    ///
    /// # Errors
    ///
    /// Returns engine or decode errors.
    pub async fn get_torrent_details(&self, hash: &TorrentHash) -> ClientResult<TorrentDetails> {
        self.run(
            Operation::new("torrent_details")
                .call(commands::peers(hash))
                .call(commands::files(hash))
                .call(commands::trackers(hash))
                .post_process(rows::details),
        )
        .await
    }

    /// Pass an introspection call through to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for non-introspection methods, or
    /// the engine error.
    pub async fn list_methods(&self, method: &str, args: Vec<String>) -> ClientResult<RpcValue> {
        if !INTROSPECTION_METHODS.contains(&method) {
            return Err(ClientError::InvalidInput {
                field: "method",
                reason: "not_introspection",
            });
        }
        self.run(
            Operation::new("list_methods")
                .call(commands::introspect(method, args))
                .post_process(|rows| Ok(rows.into_iter().next().unwrap_or(RpcValue::Nil))),
        )
        .await
    }

    /// Set the global throttle for one direction.
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub async fn set_speed_limits(
        &self,
        direction: SpeedDirection,
        bytes_per_sec: u64,
    ) -> ClientResult<()> {
        self.run(
            Operation::new("set_speed_limits")
                .call(commands::set_throttle(direction, bytes_per_sec)),
        )
        .await?;
        Ok(())
    }

    /// Read settings in one round trip, keyed by external identifier.
    ///
    /// An empty `ids` reads every known setting.
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub async fn get_settings(&self, ids: &[String]) -> ClientResult<Map<String, Value>> {
        let ids: Vec<String> = if ids.is_empty() {
            self.settings.external_ids().map(str::to_string).collect()
        } else {
            ids.to_vec()
        };
        let calls: Vec<MethodCall> = ids.iter().map(|id| self.settings.read_call(id)).collect();
        let table = Arc::clone(&self.settings);
        self.run(Operation::new("get_settings").calls(calls).post_process(move |rows| {
            Ok(ids
                .into_iter()
                .zip(rows)
                .map(|(id, value)| {
                    let value = table.outbound(&id, value);
                    (id, value)
                })
                .collect())
        }))
        .await
    }

    /// Write settings in one round trip.
    ///
    /// An empty write set succeeds without contacting the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Settings`] when a value cannot be translated, or
    /// the engine error.
    pub async fn set_settings(&self, changes: &[(String, Value)]) -> ClientResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let calls = changes
            .iter()
            .map(|(id, value)| self.settings.write_call(id, value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ClientError::Settings { source })?;
        self.run(Operation::new("set_settings").calls(calls)).await?;
        Ok(())
    }

    /// Resolve a download of the files whose indices are in `indices`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for uncached torrents, engine errors
    /// fetching the file list, or archive failures.
    pub async fn download_files(
        &self,
        hash: &TorrentHash,
        indices: &HashSet<String>,
    ) -> ClientResult<DownloadPlan> {
        let summary = self.get_torrent(hash).await?;
        let tree = self
            .run(
                Operation::new("torrent_files")
                    .call(commands::files(hash))
                    .post_process(rows::file_tree),
            )
            .await?;
        let selected = select_by_indices(indices, &tree);
        debug!(
            torrent_hash = %hash,
            requested = indices.len(),
            selected = selected.len(),
            "resolved download selection"
        );
        let source = DownloadSource {
            hash,
            name: &summary.name,
            directory: Path::new(&summary.directory),
        };
        plan_download(&self.storage, source, &selected)
            .await
            .map_err(|err| ClientError::fs("download_files", err))
    }

    async fn lifecycle(&self, hashes: &[TorrentHash], operation: Operation) -> ClientResult<()> {
        require_hashes(hashes)?;
        let name = operation.name();
        self.mutate(name, async {
            self.run(operation).await?;
            Ok(())
        })
        .await
    }

    async fn run<T>(&self, operation: Operation<T>) -> ClientResult<T>
    where
        T: Send + 'static,
    {
        let name = operation.name();
        self.executor
            .execute(operation)
            .await
            .map_err(|err| ClientError::engine(name, err))
    }

    async fn mutate<T, F>(&self, operation: &'static str, work: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        let result = work.await;
        match &result {
            Ok(_) => {
                info!(operation, "mutation applied");
                self.trigger.on_mutation_success(operation);
            }
            Err(err) => warn!(operation, error = %err, "mutation failed"),
        }
        result
    }
}

fn require_hashes(hashes: &[TorrentHash]) -> ClientResult<()> {
    if hashes.is_empty() {
        return Err(TorrentError::InvalidRequest {
            field: "hashes",
            reason: "empty",
        }
        .into());
    }
    Ok(())
}

impl std::fmt::Debug for ClientService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientService")
            .field("settings", &self.settings.len())
            .field("storage", &self.storage.root())
            .finish_non_exhaustive()
    }
}
