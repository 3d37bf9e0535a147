//! Response Pipeline: decode engine multicall rows into torrent DTOs.
//!
//! Column order follows the field lists in [`floodgate_rpc::commands`].

use floodgate_rpc::{RpcError, RpcResult, RpcValue};
use floodgate_torrent_core::{
    FilePriority, FileTree, PeerSnapshot, TorrentDetails, TorrentFile, TorrentHash,
    TorrentPriority, TorrentStatus, TorrentSummary, TrackerSnapshot, parse_tags,
};

const LIST: &str = "list_torrents";
const DETAILS: &str = "torrent_details";
const FILES: &str = "torrent_files";

/// Decode the single `d.multicall2` row set into summaries.
pub(crate) fn summaries(rows: Vec<RpcValue>) -> RpcResult<Vec<TorrentSummary>> {
    let Some(table) = rows.into_iter().next() else {
        return Ok(Vec::new());
    };
    let table = table
        .into_list()
        .ok_or(RpcError::decode(LIST, "rows", "not_a_list"))?;
    table.iter().map(summary).collect()
}

fn summary(row: &RpcValue) -> RpcResult<TorrentSummary> {
    let columns = columns(LIST, row)?;
    let hash = TorrentHash::parse(text(LIST, columns, 0, "hash")?)
        .map_err(|_| RpcError::decode(LIST, "hash", "invalid_hash"))?;
    let started = flag(columns, 5);
    let active = flag(columns, 6);
    let complete = flag(columns, 7);
    let hashing = number(columns, 8) != 0;
    let priority = TorrentPriority::from_engine(signed(columns, 10))
        .map_err(|_| RpcError::decode(LIST, "priority", "out_of_range"))?;
    let message = columns
        .get(11)
        .and_then(RpcValue::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(TorrentSummary {
        hash,
        name: text(LIST, columns, 1, "name")?.to_string(),
        directory: text(LIST, columns, 2, "directory")?.to_string(),
        size_bytes: number(columns, 3),
        completed_bytes: number(columns, 4),
        status: TorrentStatus::from_flags(started, active, complete, hashing),
        priority,
        tags: columns
            .get(9)
            .and_then(RpcValue::as_str)
            .map(parse_tags)
            .unwrap_or_default(),
        message,
    })
}

/// Decode the peers, files, and trackers rows of one details batch.
pub(crate) fn details(rows: Vec<RpcValue>) -> RpcResult<TorrentDetails> {
    let mut rows = rows.into_iter();
    let peers = table(DETAILS, rows.next())?
        .iter()
        .map(peer)
        .collect::<RpcResult<Vec<_>>>()?;
    let file_tree = file_tree_from(DETAILS, rows.next())?;
    let trackers = table(DETAILS, rows.next())?
        .iter()
        .map(tracker)
        .collect::<RpcResult<Vec<_>>>()?;
    Ok(TorrentDetails {
        peers,
        trackers,
        file_tree,
    })
}

/// Decode a lone `f.multicall` response into a file tree.
pub(crate) fn file_tree(rows: Vec<RpcValue>) -> RpcResult<FileTree> {
    file_tree_from(FILES, rows.into_iter().next())
}

fn file_tree_from(operation: &'static str, row: Option<RpcValue>) -> RpcResult<FileTree> {
    let files = table(operation, row)?
        .iter()
        .enumerate()
        .map(|(index, row)| file(operation, index, row))
        .collect::<RpcResult<Vec<_>>>()?;
    Ok(FileTree::from_files(files))
}

fn peer(row: &RpcValue) -> RpcResult<PeerSnapshot> {
    let columns = columns(DETAILS, row)?;
    Ok(PeerSnapshot {
        address: text(DETAILS, columns, 0, "peer.address")?.to_string(),
        client_version: columns
            .get(1)
            .and_then(RpcValue::as_str)
            .unwrap_or_default()
            .to_string(),
        download_bps: number(columns, 2),
        upload_bps: number(columns, 3),
        completed_percent: number(columns, 4),
        is_encrypted: flag(columns, 5),
        is_incoming: flag(columns, 6),
    })
}

fn file(operation: &'static str, index: usize, row: &RpcValue) -> RpcResult<TorrentFile> {
    let columns = columns(operation, row)?;
    let index =
        u32::try_from(index).map_err(|_| RpcError::decode(operation, "file.index", "overflow"))?;
    let priority = FilePriority::from_engine(signed(columns, 2))
        .map_err(|_| RpcError::decode(operation, "file.priority", "out_of_range"))?;
    let done_chunks = number(columns, 3);
    let total_chunks = number(columns, 4);
    #[allow(clippy::cast_precision_loss)]
    let percent_complete = if total_chunks == 0 {
        0.0
    } else {
        (done_chunks as f64 / total_chunks as f64) * 100.0
    };
    Ok(TorrentFile {
        index,
        path: text(operation, columns, 0, "file.path")?.to_string(),
        size_bytes: number(columns, 1),
        priority,
        percent_complete,
    })
}

fn tracker(row: &RpcValue) -> RpcResult<TrackerSnapshot> {
    let columns = columns(DETAILS, row)?;
    Ok(TrackerSnapshot {
        url: text(DETAILS, columns, 0, "tracker.url")?.to_string(),
        kind: signed(columns, 1),
        is_enabled: flag(columns, 2),
    })
}

fn table(operation: &'static str, row: Option<RpcValue>) -> RpcResult<Vec<RpcValue>> {
    match row {
        None => Ok(Vec::new()),
        Some(value) => value
            .into_list()
            .ok_or(RpcError::decode(operation, "rows", "not_a_list")),
    }
}

fn columns<'a>(operation: &'static str, row: &'a RpcValue) -> RpcResult<&'a [RpcValue]> {
    row.as_list()
        .ok_or(RpcError::decode(operation, "row", "not_a_list"))
}

fn text<'a>(
    operation: &'static str,
    columns: &'a [RpcValue],
    index: usize,
    field: &'static str,
) -> RpcResult<&'a str> {
    columns
        .get(index)
        .and_then(RpcValue::as_str)
        .ok_or(RpcError::decode(operation, field, "missing"))
}

fn number(columns: &[RpcValue], index: usize) -> u64 {
    columns.get(index).and_then(RpcValue::as_u64).unwrap_or(0)
}

fn signed(columns: &[RpcValue], index: usize) -> i64 {
    columns.get(index).and_then(RpcValue::as_i64).unwrap_or(0)
}

fn flag(columns: &[RpcValue], index: usize) -> bool {
    columns
        .get(index)
        .and_then(RpcValue::as_bool)
        .unwrap_or(false)
}
