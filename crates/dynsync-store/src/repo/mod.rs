//! Repository layer
//!
//! `SqliteStore` is the SQLite persistence adapter consumed by the
//! reconciliation engine and the drift analyzer; `sync_log` persists one
//! summary row per collection run.

pub mod sqlite_store;
pub mod sync_log;

pub use sqlite_store::SqliteStore;
pub use sync_log::{SyncLogEntry, SyncLogQuery};

use chrono::{DateTime, TimeZone, Utc};

use crate::errors::{corrupt_row, Result};

/// Timestamps are stored as Unix milliseconds
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(table: &str, millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| corrupt_row(table, format!("timestamp {} out of range", millis)))
}
