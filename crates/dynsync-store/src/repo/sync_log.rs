//! Sync log persistence
//!
//! One row per collection run, written by the engine after reconciliation
//! and schema analysis (or after the run was aborted).

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use dynsync_core::reconcile::{RunStatus, SyncSummary};
use dynsync_core_types::RunId;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::{from_millis, to_millis};
use crate::errors::{corrupt_row, from_rusqlite, Result};

const COLUMNS: &str = "id, run_id, collection, status, total_processed, new_count, updated_count, \
     unchanged_count, deleted_count, resurrected_count, error_count, new_tag_count, message, \
     execution_time_ms, synced_at";

/// One persisted run summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncLogEntry {
    /// Assigned by the database; `None` before `append`
    pub id: Option<i64>,
    pub run_id: RunId,
    pub collection: String,
    pub status: RunStatus,
    pub summary: SyncSummary,
    pub new_tag_count: u64,
    pub message: Option<String>,
    pub execution_time_ms: u64,
    pub synced_at: DateTime<Utc>,
}

/// Filter for listing recent entries
#[derive(Debug, Clone)]
pub struct SyncLogQuery {
    pub collection: Option<String>,
    pub limit: usize,
}

impl Default for SyncLogQuery {
    fn default() -> Self {
        Self {
            collection: None,
            limit: 20,
        }
    }
}

/// Append an entry, returning its row id
pub fn append(conn: &Connection, entry: &SyncLogEntry) -> Result<i64> {
    let s = &entry.summary;
    conn.execute(
        "INSERT INTO sync_logs (run_id, collection, status, total_processed, new_count,
                                updated_count, unchanged_count, deleted_count, resurrected_count,
                                error_count, new_tag_count, message, execution_time_ms, synced_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            entry.run_id.as_str(),
            entry.collection,
            entry.status.as_str(),
            s.total_processed as i64,
            s.new as i64,
            s.updated as i64,
            s.unchanged as i64,
            s.deleted as i64,
            s.resurrected as i64,
            s.errors as i64,
            entry.new_tag_count as i64,
            entry.message,
            entry.execution_time_ms as i64,
            to_millis(entry.synced_at),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(conn.last_insert_rowid())
}

/// Most recent entries first
pub fn recent(conn: &Connection, query: &SyncLogQuery) -> Result<Vec<SyncLogEntry>> {
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
    let sql = format!(
        "SELECT {} FROM sync_logs
         WHERE (?1 IS NULL OR collection = ?1)
         ORDER BY synced_at DESC, id DESC
         LIMIT ?2",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(params![query.collection, limit], raw_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<RawRow>, _>>()
        .map_err(from_rusqlite)?;
    rows.into_iter().map(decode).collect()
}

/// Latest entry of one collection
pub fn last_for(conn: &Connection, collection: &str) -> Result<Option<SyncLogEntry>> {
    let sql = format!(
        "SELECT {} FROM sync_logs WHERE collection = ?1 ORDER BY synced_at DESC, id DESC LIMIT 1",
        COLUMNS
    );
    let row = conn
        .query_row(&sql, [collection], raw_row)
        .optional()
        .map_err(from_rusqlite)?;
    row.map(decode).transpose()
}

/// Latest entry of one collection that reached reconciliation
///
/// Aborted runs are logged as `ERROR` with no processed records; they are
/// skipped here.
pub fn last_completed_for(conn: &Connection, collection: &str) -> Result<Option<SyncLogEntry>> {
    let sql = format!(
        "SELECT {} FROM sync_logs
         WHERE collection = ?1 AND NOT (status = ?2 AND total_processed = 0)
         ORDER BY synced_at DESC, id DESC
         LIMIT 1",
        COLUMNS
    );
    let row = conn
        .query_row(&sql, params![collection, RunStatus::Error.as_str()], raw_row)
        .optional()
        .map_err(from_rusqlite)?;
    row.map(decode).transpose()
}

struct RawRow {
    id: i64,
    run_id: String,
    collection: String,
    status: String,
    counts: [i64; 8],
    message: Option<String>,
    execution_time_ms: i64,
    synced_at: i64,
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        run_id: row.get(1)?,
        collection: row.get(2)?,
        status: row.get(3)?,
        counts: [
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
        ],
        message: row.get(12)?,
        execution_time_ms: row.get(13)?,
        synced_at: row.get(14)?,
    })
}

fn decode(raw: RawRow) -> Result<SyncLogEntry> {
    let count = |v: i64| u64::try_from(v).map_err(|e| corrupt_row("sync_logs", e));
    let [total_processed, new, updated, unchanged, deleted, resurrected, errors, new_tags] =
        raw.counts;
    Ok(SyncLogEntry {
        id: Some(raw.id),
        run_id: RunId::from_string(raw.run_id),
        collection: raw.collection,
        status: raw
            .status
            .parse::<RunStatus>()
            .map_err(|e| corrupt_row("sync_logs", e))?,
        summary: SyncSummary {
            total_processed: count(total_processed)?,
            new: count(new)?,
            updated: count(updated)?,
            unchanged: count(unchanged)?,
            deleted: count(deleted)?,
            resurrected: count(resurrected)?,
            errors: count(errors)?,
        },
        new_tag_count: count(new_tags)?,
        message: raw.message,
        execution_time_ms: count(raw.execution_time_ms)?,
        synced_at: from_millis("sync_logs", raw.synced_at)?,
    })
}
