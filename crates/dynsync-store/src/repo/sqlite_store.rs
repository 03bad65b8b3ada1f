//! SQLite persistence adapter
//!
//! Implements `RecordStore` and `TagCatalog` over the `records` and
//! `schema_tags` tables. Every call is its own statement; no transaction spans
//! a reconciliation run.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use dynsync_core::adapter::{AdapterResult, RecordStore, TagCatalog};
use dynsync_core::errors::{ExError, SyncError};
use dynsync_core::model::{DataType, SnapshotRecord, StoredRecord, Tag};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

use super::{from_millis, to_millis};
use crate::errors::{corrupt_row, from_rusqlite, Result};

const RECORD_COLUMNS: &str = "collection, identity, payload, content_hash, first_seen_at, \
     last_updated_at, update_count, is_deleted, deleted_at";

const TAG_COLUMNS: &str =
    "path, data_type, occurrence_count, first_seen_at, last_seen_at, sample_value";

type RecordRow = (
    String,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    bool,
    Option<i64>,
);

type TagRow = (String, String, i64, i64, i64, Option<String>);

/// SQLite-backed adapter borrowing an open, migrated connection
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Load one record, including tombstoned ones
    pub fn record(&self, collection: &str, identity: &str) -> Result<Option<StoredRecord>> {
        let sql = format!(
            "SELECT {} FROM records WHERE collection = ?1 AND identity = ?2",
            RECORD_COLUMNS
        );
        let row: Option<RecordRow> = self
            .conn
            .query_row(&sql, params![collection, identity], record_row)
            .optional()
            .map_err(from_rusqlite)?;
        row.map(decode_record).transpose()
    }

    /// All records of a collection ordered by identity, including tombstoned ones
    pub fn records(&self, collection: &str) -> Result<Vec<StoredRecord>> {
        let sql = format!(
            "SELECT {} FROM records WHERE collection = ?1 ORDER BY identity",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([collection], record_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<RecordRow>, _>>()
            .map_err(from_rusqlite)?;
        rows.into_iter().map(decode_record).collect()
    }

    /// Tags of a collection ordered by path
    ///
    /// With `since`, only tags first seen at or after that instant.
    pub fn tags(&self, collection: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Tag>> {
        let sql = format!(
            "SELECT {} FROM schema_tags WHERE collection = ?1 AND first_seen_at >= ?2 ORDER BY path",
            TAG_COLUMNS
        );
        let floor = since.map(to_millis).unwrap_or(i64::MIN);
        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params![collection, floor], tag_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<TagRow>, _>>()
            .map_err(from_rusqlite)?;
        rows.into_iter().map(decode_tag).collect()
    }

    fn hashes_where(&self, collection: &str, deleted: bool) -> Result<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT identity, content_hash FROM records
                 WHERE collection = ?1 AND is_deleted = ?2",
            )
            .map_err(from_rusqlite)?;
        let map = stmt
            .query_map(params![collection, deleted], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(from_rusqlite)?;
        Ok(map)
    }

    fn exists(&self, collection: &str, identity: &str) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM records WHERE collection = ?1 AND identity = ?2",
                params![collection, identity],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(from_rusqlite)
    }
}

fn not_found(collection: &str, identity: &str) -> ExError {
    SyncError::RecordNotFound {
        collection: collection.to_string(),
        identity: identity.to_string(),
    }
    .into()
}

impl RecordStore for SqliteStore<'_> {
    fn fingerprints_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        self.hashes_where(collection, false)
    }

    fn tombstones_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        self.hashes_where(collection, true)
    }

    fn insert(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        self.conn
            .execute(
                "INSERT INTO records (collection, identity, payload, content_hash,
                                      first_seen_at, last_updated_at, update_count, is_deleted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5, 0, 0)
                 ON CONFLICT(collection, identity) DO NOTHING",
                params![
                    collection,
                    record.identity,
                    record.payload,
                    record.content_hash,
                    to_millis(now),
                ],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn update(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE records SET
                    payload = ?3,
                    content_hash = ?4,
                    last_updated_at = ?5,
                    update_count = update_count + 1,
                    is_deleted = 0,
                    deleted_at = NULL
                 WHERE collection = ?1 AND identity = ?2",
                params![
                    collection,
                    record.identity,
                    record.payload,
                    record.content_hash,
                    to_millis(now),
                ],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(not_found(collection, &record.identity));
        }
        Ok(())
    }

    fn touch(&mut self, collection: &str, identity: &str, now: DateTime<Utc>) -> AdapterResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE records SET last_updated_at = ?3, is_deleted = 0, deleted_at = NULL
                 WHERE collection = ?1 AND identity = ?2",
                params![collection, identity, to_millis(now)],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(not_found(collection, identity));
        }
        Ok(())
    }

    fn mark_deleted(
        &mut self,
        collection: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE records SET is_deleted = 1, deleted_at = ?3
                 WHERE collection = ?1 AND identity = ?2 AND is_deleted = 0",
                params![collection, identity, to_millis(now)],
            )
            .map_err(from_rusqlite)?;
        // Already tombstoned is a no-op; absent is an error
        if changed == 0 && !self.exists(collection, identity)? {
            return Err(not_found(collection, identity));
        }
        Ok(())
    }
}

impl TagCatalog for SqliteStore<'_> {
    fn tag_catalog(&self, collection: &str) -> AdapterResult<HashMap<String, Tag>> {
        Ok(self
            .tags(collection, None)?
            .into_iter()
            .map(|tag| (tag.path.clone(), tag))
            .collect())
    }

    fn upsert_tag(&mut self, collection: &str, tag: &Tag) -> AdapterResult<()> {
        self.conn
            .execute(
                "INSERT INTO schema_tags (collection, path, data_type, occurrence_count,
                                          first_seen_at, last_seen_at, sample_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(collection, path) DO UPDATE SET
                    data_type = excluded.data_type,
                    occurrence_count = excluded.occurrence_count,
                    first_seen_at = excluded.first_seen_at,
                    last_seen_at = excluded.last_seen_at,
                    sample_value = excluded.sample_value",
                params![
                    collection,
                    tag.path,
                    tag.data_type.as_str(),
                    tag.occurrence_count as i64,
                    to_millis(tag.first_seen_at),
                    to_millis(tag.last_seen_at),
                    tag.sample_value,
                ],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }
}

fn record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn decode_record(row: RecordRow) -> Result<StoredRecord> {
    let (
        collection,
        identity,
        payload,
        content_hash,
        first_seen_at,
        last_updated_at,
        update_count,
        is_deleted,
        deleted_at,
    ) = row;
    Ok(StoredRecord {
        collection,
        identity,
        payload,
        content_hash,
        first_seen_at: from_millis("records", first_seen_at)?,
        last_updated_at: from_millis("records", last_updated_at)?,
        update_count: u32::try_from(update_count).map_err(|e| corrupt_row("records", e))?,
        is_deleted,
        deleted_at: deleted_at.map(|ms| from_millis("records", ms)).transpose()?,
    })
}

fn tag_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TagRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode_tag(row: TagRow) -> Result<Tag> {
    let (path, data_type, occurrence_count, first_seen_at, last_seen_at, sample_value) = row;
    Ok(Tag {
        path,
        data_type: data_type.parse().unwrap_or(DataType::Unknown),
        occurrence_count: u64::try_from(occurrence_count)
            .map_err(|e| corrupt_row("schema_tags", e))?,
        first_seen_at: from_millis("schema_tags", first_seen_at)?,
        last_seen_at: from_millis("schema_tags", last_seen_at)?,
        sample_value,
    })
}
