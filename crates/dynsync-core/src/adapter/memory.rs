use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use super::{AdapterResult, RecordStore, TagCatalog};
use crate::errors::{ExError, SyncError};
use crate::model::{SnapshotRecord, StoredRecord, Tag};

/// In-memory persistence adapter
///
/// BTreeMap-backed so that iteration order is deterministic. Not thread-safe;
/// designed for single-threaded runs, tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// collection → identity → record
    records: HashMap<String, BTreeMap<String, StoredRecord>>,
    /// collection → path → tag
    tags: HashMap<String, BTreeMap<String, Tag>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by identity, including tombstoned ones
    pub fn record(&self, collection: &str, identity: &str) -> Option<&StoredRecord> {
        self.records.get(collection)?.get(identity)
    }

    /// All records of a collection in identity order, including tombstoned ones
    pub fn records(&self, collection: &str) -> Vec<&StoredRecord> {
        self.records
            .get(collection)
            .map(|m| m.values().collect())
            .unwrap_or_default()
    }

    /// Get a tag by path
    pub fn tag(&self, collection: &str, path: &str) -> Option<&Tag> {
        self.tags.get(collection)?.get(path)
    }

    fn record_mut(&mut self, collection: &str, identity: &str) -> AdapterResult<&mut StoredRecord> {
        self.records
            .get_mut(collection)
            .and_then(|m| m.get_mut(identity))
            .ok_or_else(|| {
                ExError::from(SyncError::RecordNotFound {
                    collection: collection.to_string(),
                    identity: identity.to_string(),
                })
            })
    }

    fn hashes_where(&self, collection: &str, deleted: bool) -> HashMap<String, String> {
        self.records
            .get(collection)
            .map(|m| {
                m.values()
                    .filter(|r| r.is_deleted == deleted)
                    .map(|r| (r.identity.clone(), r.content_hash.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl RecordStore for MemoryStore {
    fn fingerprints_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        Ok(self.hashes_where(collection, false))
    }

    fn tombstones_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        Ok(self.hashes_where(collection, true))
    }

    fn insert(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        self.records
            .entry(collection.to_string())
            .or_default()
            .entry(record.identity.clone())
            .or_insert_with(|| StoredRecord::new(collection, record, now));
        Ok(())
    }

    fn update(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        self.record_mut(collection, &record.identity)?
            .apply_update(record, now);
        Ok(())
    }

    fn touch(&mut self, collection: &str, identity: &str, now: DateTime<Utc>) -> AdapterResult<()> {
        self.record_mut(collection, identity)?.touch(now);
        Ok(())
    }

    fn mark_deleted(
        &mut self,
        collection: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        self.record_mut(collection, identity)?.mark_deleted(now);
        Ok(())
    }
}

impl TagCatalog for MemoryStore {
    fn tag_catalog(&self, collection: &str) -> AdapterResult<HashMap<String, Tag>> {
        Ok(self
            .tags
            .get(collection)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn upsert_tag(&mut self, collection: &str, tag: &Tag) -> AdapterResult<()> {
        self.tags
            .entry(collection.to_string())
            .or_default()
            .insert(tag.path.clone(), tag.clone());
        Ok(())
    }
}
