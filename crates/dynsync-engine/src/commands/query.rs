//! Read-only queries over persisted sync state.
//!
//! Nothing here writes to the database.

#![allow(clippy::result_large_err)]

use dynsync_core::model::Tag;
use dynsync_store::errors::Result;
use dynsync_store::repo::sync_log::{self, SyncLogEntry, SyncLogQuery};
use dynsync_store::SqliteStore;
use rusqlite::Connection;

/// Tags of a collection, sorted by path
///
/// With `new_only`, returns only tags first seen in the most recent run of
/// the collection that reached reconciliation; aborted runs are ignored. A
/// collection without such a run has every tag counted as new.
///
/// # Errors
///
/// Fails when the tag catalog or the sync log cannot be read.
pub fn list_tags(conn: &Connection, collection: &str, new_only: bool) -> Result<Vec<Tag>> {
    let since = if new_only {
        sync_log::last_completed_for(conn, collection)?.map(|entry| entry.synced_at)
    } else {
        None
    };
    SqliteStore::new(conn).tags(collection, since)
}

/// Most recent sync log entries, newest first
///
/// # Errors
///
/// Fails when the sync log cannot be read.
pub fn sync_history(conn: &Connection, query: &SyncLogQuery) -> Result<Vec<SyncLogEntry>> {
    sync_log::recent(conn, query)
}
