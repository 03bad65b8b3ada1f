//! Persistence adapter contract
//!
//! The reconciliation engine and the schema drift analyzer never talk to a
//! database directly. They consume these two traits:
//!
//! - [`RecordStore`]: fingerprint lookup, insert, update, touch, soft delete
//! - [`TagCatalog`]: read and upsert the schema catalog
//!
//! All lookups exclude soft-deleted records except [`RecordStore::tombstones_of`],
//! which exists so that a reappearing identity is revived instead of inserted.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::errors::ExError;
use crate::model::{SnapshotRecord, Tag};

pub mod dry_run;
pub mod memory;

pub use dry_run::DryRun;
pub use memory::MemoryStore;

/// Result type for adapter operations
pub type AdapterResult<T> = std::result::Result<T, ExError>;

/// Record persistence as seen by the reconciliation engine
///
/// Every operation is scoped to one collection and independently durable;
/// no transaction spans a reconciliation run.
pub trait RecordStore {
    /// Map identity → content hash for live (non-deleted) records
    fn fingerprints_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>>;

    /// Identities of live (non-deleted) records
    fn identities_of(&self, collection: &str) -> AdapterResult<HashSet<String>> {
        self.fingerprints_of(collection)
            .map(|fingerprints| fingerprints.into_keys().collect())
    }

    /// Map identity → content hash for soft-deleted records only
    fn tombstones_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>>;

    /// Persist a new record with `update_count = 0`
    ///
    /// Must be idempotent: inserting an identity that already exists is a no-op.
    fn insert(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()>;

    /// Overwrite payload and hash, increment `update_count`, clear the tombstone
    fn update(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()>;

    /// Refresh `last_updated_at` and clear the tombstone
    fn touch(&mut self, collection: &str, identity: &str, now: DateTime<Utc>) -> AdapterResult<()>;

    /// Set `is_deleted` and `deleted_at`, keeping the record body
    fn mark_deleted(
        &mut self,
        collection: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> AdapterResult<()>;
}

/// Schema catalog persistence as seen by the drift analyzer
pub trait TagCatalog {
    /// All known tags of a collection keyed by path
    fn tag_catalog(&self, collection: &str) -> AdapterResult<HashMap<String, Tag>>;

    /// Insert or overwrite the tag at `tag.path`
    fn upsert_tag(&mut self, collection: &str, tag: &Tag) -> AdapterResult<()>;
}
