use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;
use crate::fingerprint::{canonical_payload, fingerprint};
use crate::identity::{identity, KeySpec};

/// One incoming snapshot item, keyed and fingerprinted
///
/// This is what the reconciliation engine hands to the persistence adapter:
/// the identity, the canonical payload text and its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// Stable identity within the collection
    pub identity: String,

    /// Canonical serialized record (compact JSON, source field order)
    pub payload: String,

    /// SHA-256 hex digest of `payload`
    pub content_hash: String,
}

impl SnapshotRecord {
    /// Key and fingerprint a decoded record
    ///
    /// # Errors
    ///
    /// Returns `RecordNotObject` if `value` is not a JSON object, or
    /// `Serialization` if the canonical form cannot be produced.
    pub fn from_value(value: &Value, key: &KeySpec) -> Result<Self> {
        let identity = identity(value, key)?;
        let payload = canonical_payload(value)?;
        let content_hash = fingerprint(&payload);
        Ok(Self {
            identity,
            payload,
            content_hash,
        })
    }
}

/// A record as persisted by a persistence adapter
///
/// Rows are never physically removed; an identity absent from the latest
/// snapshot is tombstoned via `is_deleted` and revived when it reappears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Collection this record belongs to (e.g. `articles`, `order_lines`)
    pub collection: String,

    pub identity: String,

    pub payload: String,

    pub content_hash: String,

    /// Set on insert, never changed afterwards
    pub first_seen_at: DateTime<Utc>,

    /// Refreshed by update and touch
    pub last_updated_at: DateTime<Utc>,

    /// Number of content changes since insert (touches do not count)
    pub update_count: u32,

    /// Tombstone flag
    pub is_deleted: bool,

    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    /// Create a freshly inserted record
    pub fn new(collection: impl Into<String>, record: &SnapshotRecord, now: DateTime<Utc>) -> Self {
        Self {
            collection: collection.into(),
            identity: record.identity.clone(),
            payload: record.payload.clone(),
            content_hash: record.content_hash.clone(),
            first_seen_at: now,
            last_updated_at: now,
            update_count: 0,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Overwrite content after a fingerprint change; clears the tombstone
    pub fn apply_update(&mut self, record: &SnapshotRecord, now: DateTime<Utc>) {
        self.payload = record.payload.clone();
        self.content_hash = record.content_hash.clone();
        self.last_updated_at = now;
        self.update_count += 1;
        self.is_deleted = false;
        self.deleted_at = None;
    }

    /// Refresh `last_updated_at` without a content change; clears the tombstone
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated_at = now;
        self.is_deleted = false;
        self.deleted_at = None;
    }

    /// Tombstone the record, keeping its body
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        if !self.is_deleted {
            self.is_deleted = true;
            self.deleted_at = Some(now);
        }
    }
}
