use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use floodgate_client::{ClientDeps, ClientError, ClientService, RefreshTrigger};
use floodgate_config::SettingsTable;
use floodgate_fsops::{DownloadPlan, TemporaryStorage};
use floodgate_rpc::{BatchExecutor, RpcValue, TransportError};
use floodgate_test_support::ScriptedTransport;
use floodgate_test_support::fixtures::{file_row, list_row, sample_hash};
use floodgate_torrent_core::{
    AddTorrentFiles, AddTorrentUrls, MoveTorrents, TorrentHash, TorrentPriority, TorrentUpload,
};
use serde_json::{Value, json};
use tempfile::TempDir;

#[derive(Default)]
struct CountingTrigger {
    calls: AtomicUsize,
}

impl CountingTrigger {
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RefreshTrigger for CountingTrigger {
    fn on_mutation_success(&self, _operation: &'static str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    transport: Arc<ScriptedTransport>,
    service: ClientService,
    refreshes: Arc<CountingTrigger>,
    scratch: TempDir,
}

fn harness() -> anyhow::Result<Harness> {
    let transport = Arc::new(ScriptedTransport::new());
    let scratch = tempfile::tempdir()?;
    let refreshes = Arc::new(CountingTrigger::default());
    let service = ClientService::new(ClientDeps {
        executor: BatchExecutor::new(transport.clone()),
        settings: Arc::new(SettingsTable::standard()),
        storage: TemporaryStorage::new(scratch.path().join("artifacts")),
        metrics: None,
    })
    .with_refresh_trigger(refreshes.clone());
    Ok(Harness {
        transport,
        service,
        refreshes,
        scratch,
    })
}

fn move_request(hash: TorrentHash, move_files: bool) -> MoveTorrents {
    MoveTorrents {
        hashes: vec![hash],
        destination: "/data/moved".into(),
        is_base_path: false,
        move_files,
        sources: Vec::new(),
        filenames: Vec::new(),
    }
}

#[tokio::test]
async fn move_without_file_move_runs_four_steps_in_order() -> anyhow::Result<()> {
    let h = harness()?;
    let hash = sample_hash('a')?;

    h.service.move_torrents(move_request(hash, false)).await?;

    assert_eq!(
        h.transport.round_trip_methods(),
        vec![
            vec!["d.stop".to_string(), "d.close".to_string()],
            vec!["d.directory.set".to_string()],
            vec!["d.check_hash".to_string()],
            vec!["d.open".to_string(), "d.start".to_string()],
        ]
    );
    assert_eq!(h.refreshes.count(), 1);
    Ok(())
}

#[tokio::test]
async fn move_with_file_move_relocates_payload_between_engine_steps() -> anyhow::Result<()> {
    let h = harness()?;
    let hash = sample_hash('b')?;
    let old_dir = h.scratch.path().join("old");
    let new_dir = h.scratch.path().join("new");
    std::fs::create_dir_all(&old_dir)?;
    std::fs::write(old_dir.join("movie.mkv"), b"payload")?;

    let request = MoveTorrents {
        hashes: vec![hash],
        destination: new_dir.display().to_string(),
        is_base_path: true,
        move_files: true,
        sources: vec![old_dir.join("movie.mkv").display().to_string()],
        filenames: vec!["movie.mkv".into()],
    };
    h.service.move_torrents(request).await?;

    assert_eq!(std::fs::read(new_dir.join("movie.mkv"))?, b"payload");
    assert!(!old_dir.join("movie.mkv").exists());
    assert_eq!(h.transport.round_trips().len(), 4);
    assert_eq!(h.transport.count("d.directory_base.set"), 1);
    Ok(())
}

#[tokio::test]
async fn failed_step_aborts_the_move_and_skips_refresh() -> anyhow::Result<()> {
    let h = harness()?;
    let hash = sample_hash('c')?;
    h.transport
        .fault("d.directory.set", -501, "Could not find info-hash.");

    let result = h.service.move_torrents(move_request(hash, false)).await;

    assert!(matches!(result, Err(ClientError::Engine { .. })));
    assert_eq!(h.transport.round_trips().len(), 2);
    assert_eq!(h.transport.count("d.check_hash"), 0);
    assert_eq!(h.transport.count("d.start"), 0);
    assert_eq!(h.refreshes.count(), 0);
    Ok(())
}

#[tokio::test]
async fn each_successful_mutation_refreshes_exactly_once() -> anyhow::Result<()> {
    let h = harness()?;
    let hashes = vec![sample_hash('d')?];

    h.service.start_torrents(&hashes).await?;
    assert_eq!(h.refreshes.count(), 1);
    h.service.set_priority(&hashes, TorrentPriority::High).await?;
    assert_eq!(h.refreshes.count(), 2);
    h.service
        .set_taxonomy(&hashes, &["linux".to_string()])
        .await?;
    assert_eq!(h.refreshes.count(), 3);

    h.transport.fail_transport(TransportError::Timeout);
    assert!(h.service.stop_torrents(&hashes).await.is_err());
    assert_eq!(h.refreshes.count(), 3);

    h.transport.restore_transport();
    h.service
        .set_speed_limits(floodgate_torrent_core::SpeedDirection::Download, 1024)
        .await?;
    assert_eq!(h.refreshes.count(), 3);
    Ok(())
}

#[tokio::test]
async fn empty_hash_lists_are_rejected_before_the_engine() -> anyhow::Result<()> {
    let h = harness()?;
    let result = h.service.check_hash(&[]).await;
    assert!(matches!(result, Err(ClientError::InvalidRequest { .. })));
    assert!(h.transport.round_trips().is_empty());
    assert_eq!(h.refreshes.count(), 0);
    Ok(())
}

#[tokio::test]
async fn settings_are_translated_in_both_directions() -> anyhow::Result<()> {
    let h = harness()?;

    h.service
        .set_settings(&[("downloadRateLimit".to_string(), json!(100))])
        .await?;
    let calls = h.transport.round_trips().concat();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "throttle.global_down.max_rate.set");
    assert_eq!(calls[0].args, vec![RpcValue::from(""), RpcValue::Int(102_400)]);

    h.transport
        .respond("throttle.global_down.max_rate", RpcValue::Int(102_400));
    h.transport.respond("protocol.pex", RpcValue::Int(1));
    let settings = h
        .service
        .get_settings(&["downloadRateLimit".to_string(), "peerExchange".to_string()])
        .await?;
    assert_eq!(settings.get("downloadRateLimit"), Some(&json!(100)));
    assert_eq!(settings.get("peerExchange"), Some(&Value::Bool(true)));
    assert_eq!(h.transport.round_trips().len(), 2);
    Ok(())
}

#[tokio::test]
async fn empty_settings_write_never_contacts_the_engine() -> anyhow::Result<()> {
    let h = harness()?;
    h.service.set_settings(&[]).await?;
    assert!(h.transport.round_trips().is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_settings_are_forwarded_unchanged() -> anyhow::Result<()> {
    let h = harness()?;
    h.service
        .set_settings(&[("session.name".to_string(), json!("seedbox"))])
        .await?;
    let calls = h.transport.round_trips().concat();
    assert_eq!(calls[0].method, "session.name.set");
    assert_eq!(calls[0].args[1], RpcValue::from("seedbox"));
    Ok(())
}

#[tokio::test]
async fn urls_are_loaded_in_one_round_trip() -> anyhow::Result<()> {
    let h = harness()?;
    h.service
        .add_urls(AddTorrentUrls {
            urls: vec!["magnet:?xt=one".into(), " ".into(), "https://x/two.torrent".into()],
            destination: "/data/incoming".into(),
            is_base_path: false,
            start: true,
            tags: vec!["tv".into()],
        })
        .await?;
    assert_eq!(
        h.transport.round_trip_methods(),
        vec![vec![
            "execute.throw".to_string(),
            "load.start".to_string(),
            "load.start".to_string(),
        ]]
    );
    assert_eq!(h.refreshes.count(), 1);
    Ok(())
}

#[tokio::test]
async fn uploads_use_one_round_trip_per_file() -> anyhow::Result<()> {
    let h = harness()?;
    let upload = |name: &str| TorrentUpload {
        name: name.into(),
        metainfo: b"d4:infod4:name1:xee".to_vec(),
    };
    h.service
        .add_files(AddTorrentFiles {
            files: vec![upload("a.torrent"), upload("b.torrent")],
            destination: "/data/incoming".into(),
            is_base_path: false,
            start: false,
            tags: Vec::new(),
        })
        .await?;
    assert_eq!(
        h.transport.round_trip_methods(),
        vec![
            vec!["execute.throw".to_string()],
            vec!["load.raw".to_string()],
            vec!["load.raw".to_string()],
        ]
    );
    assert_eq!(h.refreshes.count(), 1);

    let empty = h
        .service
        .add_files(AddTorrentFiles {
            files: Vec::new(),
            destination: "/data/incoming".into(),
            is_base_path: false,
            start: false,
            tags: Vec::new(),
        })
        .await;
    assert!(matches!(empty, Err(ClientError::InvalidRequest { .. })));
    assert_eq!(h.transport.round_trips().len(), 3);
    Ok(())
}

#[tokio::test]
async fn removing_with_data_erases_before_deleting_payloads() -> anyhow::Result<()> {
    let h = harness()?;
    let hashes = vec![sample_hash('e')?];
    h.transport
        .respond("d.base_path", RpcValue::from("/data/done/show"));

    h.service.remove_torrents(&hashes, true).await?;

    assert_eq!(
        h.transport.round_trip_methods(),
        vec![
            vec!["d.base_path".to_string()],
            vec!["d.erase".to_string()],
            vec!["execute.throw".to_string()],
        ]
    );
    let delete = &h.transport.round_trips()[2][0];
    assert_eq!(delete.args.last(), Some(&RpcValue::from("/data/done/show")));
    assert_eq!(h.refreshes.count(), 1);
    Ok(())
}

fn upload_request(names: &[&str]) -> AddTorrentFiles {
    AddTorrentFiles {
        files: names
            .iter()
            .map(|name| TorrentUpload {
                name: (*name).into(),
                metainfo: b"d4:infod4:name1:xee".to_vec(),
            })
            .collect(),
        destination: "/data/incoming".into(),
        is_base_path: false,
        start: false,
        tags: Vec::new(),
    }
}

#[tokio::test]
async fn rejected_upload_does_not_stop_the_remaining_files() -> anyhow::Result<()> {
    let h = harness()?;
    h.transport.fault_once("load.raw", -503, "invalid bencoding");

    h.service
        .add_files(upload_request(&["bad.torrent", "b.torrent", "c.torrent"]))
        .await?;

    assert_eq!(h.transport.count("load.raw"), 3);
    assert_eq!(h.refreshes.count(), 1);
    Ok(())
}

#[tokio::test]
async fn upload_outcome_follows_the_last_file() -> anyhow::Result<()> {
    let h = harness()?;
    h.transport
        .respond_once("load.raw", RpcValue::Int(0))
        .fault_once("load.raw", -503, "invalid bencoding");

    let result = h
        .service
        .add_files(upload_request(&["a.torrent", "bad.torrent"]))
        .await;

    assert!(matches!(result, Err(ClientError::Engine { .. })));
    assert_eq!(h.transport.count("load.raw"), 2);
    assert_eq!(h.refreshes.count(), 0);
    Ok(())
}

#[tokio::test]
async fn directory_creation_failure_does_not_abort_uploads() -> anyhow::Result<()> {
    let h = harness()?;
    h.transport.fault_once("execute.throw", -1, "mkdir: permission denied");

    h.service
        .add_files(upload_request(&["a.torrent", "b.torrent"]))
        .await?;

    assert_eq!(h.transport.count("load.raw"), 2);
    assert_eq!(h.refreshes.count(), 1);
    Ok(())
}

#[tokio::test]
async fn erased_torrents_refresh_even_when_payload_deletion_fails() -> anyhow::Result<()> {
    let h = harness()?;
    let hashes = vec![sample_hash('f')?];
    h.transport
        .respond("d.base_path", RpcValue::from("/data/done/show"))
        .fault("execute.throw", -1, "rm: permission denied");

    let result = h.service.remove_torrents(&hashes, true).await;

    assert!(result.is_err());
    assert_eq!(h.transport.count("d.erase"), 1);
    assert_eq!(h.refreshes.count(), 1);
    Ok(())
}

#[tokio::test]
async fn details_are_fetched_in_one_round_trip() -> anyhow::Result<()> {
    let h = harness()?;
    let hash = sample_hash('f')?;
    h.transport.respond(
        "f.multicall",
        RpcValue::List(vec![file_row("season/ep1.mkv", 100, 1)]),
    );
    h.transport.respond("p.multicall", RpcValue::List(Vec::new()));
    h.transport.respond("t.multicall", RpcValue::List(Vec::new()));

    let details = h.service.get_torrent_details(&hash).await?;

    assert_eq!(details.file_tree.file_count(), 1);
    assert!(details.peers.is_empty());
    assert_eq!(h.transport.round_trips().len(), 1);
    Ok(())
}

#[tokio::test]
async fn introspection_is_limited_to_system_methods() -> anyhow::Result<()> {
    let h = harness()?;
    let rejected = h.service.list_methods("d.erase", Vec::new()).await;
    assert!(matches!(rejected, Err(ClientError::InvalidInput { .. })));

    h.transport.respond(
        "system.listMethods",
        RpcValue::List(vec![RpcValue::from("d.name")]),
    );
    let methods = h.service.list_methods("system.listMethods", Vec::new()).await?;
    assert_eq!(methods.as_list().map(<[RpcValue]>::len), Some(1));
    Ok(())
}

async fn cache_torrent(
    h: &Harness,
    hash: &TorrentHash,
    directory: &std::path::Path,
) -> anyhow::Result<()> {
    h.transport.respond(
        "d.multicall2",
        RpcValue::List(vec![list_row(hash, "Show", &directory.display().to_string(), "")]),
    );
    h.service.refresh_torrents().await?;
    Ok(())
}

#[tokio::test]
async fn single_file_download_is_served_directly() -> anyhow::Result<()> {
    let h = harness()?;
    let hash = sample_hash('1')?;
    let payload = h.scratch.path().join("payload");
    std::fs::create_dir_all(payload.join("season"))?;
    std::fs::write(payload.join("season/ep1.mkv"), b"one")?;
    cache_torrent(&h, &hash, &payload).await?;
    h.transport.respond(
        "f.multicall",
        RpcValue::List(vec![
            file_row("season/ep1.mkv", 3, 1),
            file_row("season/ep2.mkv", 3, 1),
        ]),
    );

    let indices: HashSet<String> = ["0".to_string()].into();
    let plan = h.service.download_files(&hash, &indices).await?;

    assert!(matches!(plan, DownloadPlan::Single { .. }));
    assert_eq!(plan.filename(), Some("ep1.mkv"));
    assert!(!h.scratch.path().join("artifacts").exists());
    Ok(())
}

#[tokio::test]
async fn multi_file_download_builds_one_archive_named_after_the_torrent() -> anyhow::Result<()> {
    let h = harness()?;
    let hash = sample_hash('2')?;
    let payload = h.scratch.path().join("payload");
    std::fs::create_dir_all(&payload)?;
    std::fs::write(payload.join("a.txt"), b"a")?;
    std::fs::write(payload.join("b.txt"), b"b")?;
    cache_torrent(&h, &hash, &payload).await?;
    h.transport.respond(
        "f.multicall",
        RpcValue::List(vec![file_row("a.txt", 1, 1), file_row("b.txt", 1, 1)]),
    );

    let indices: HashSet<String> = ["0".to_string(), "1".to_string()].into();
    let plan = h.service.download_files(&hash, &indices).await?;

    assert_eq!(plan.filename(), Some("Show.tar"));
    let artifacts = h.scratch.path().join("artifacts");
    assert_eq!(std::fs::read_dir(&artifacts)?.count(), 1);
    drop(plan);
    assert_eq!(std::fs::read_dir(&artifacts)?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn downloads_for_unknown_torrents_are_not_found() -> anyhow::Result<()> {
    let h = harness()?;
    let hash = sample_hash('3')?;
    let result = h.service.download_files(&hash, &HashSet::new()).await;
    assert!(matches!(result, Err(ClientError::NotFound { .. })));
    assert!(h.transport.round_trips().is_empty());
    Ok(())
}
