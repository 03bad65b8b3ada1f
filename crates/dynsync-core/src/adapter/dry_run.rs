use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use super::{AdapterResult, RecordStore, TagCatalog};
use crate::model::{SnapshotRecord, Tag};

/// Adapter wrapper that serves reads and discards writes
///
/// Running the engine against `DryRun` yields the classification a real run
/// would produce without persisting anything.
#[derive(Debug)]
pub struct DryRun<'a, S: ?Sized> {
    inner: &'a S,
}

impl<'a, S: ?Sized> DryRun<'a, S> {
    pub fn new(inner: &'a S) -> Self {
        Self { inner }
    }
}

impl<S: RecordStore + ?Sized> RecordStore for DryRun<'_, S> {
    fn fingerprints_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        self.inner.fingerprints_of(collection)
    }

    fn identities_of(&self, collection: &str) -> AdapterResult<HashSet<String>> {
        self.inner.identities_of(collection)
    }

    fn tombstones_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        self.inner.tombstones_of(collection)
    }

    fn insert(&mut self, _: &str, _: &SnapshotRecord, _: DateTime<Utc>) -> AdapterResult<()> {
        Ok(())
    }

    fn update(&mut self, _: &str, _: &SnapshotRecord, _: DateTime<Utc>) -> AdapterResult<()> {
        Ok(())
    }

    fn touch(&mut self, _: &str, _: &str, _: DateTime<Utc>) -> AdapterResult<()> {
        Ok(())
    }

    fn mark_deleted(&mut self, _: &str, _: &str, _: DateTime<Utc>) -> AdapterResult<()> {
        Ok(())
    }
}

impl<S: TagCatalog + ?Sized> TagCatalog for DryRun<'_, S> {
    fn tag_catalog(&self, collection: &str) -> AdapterResult<HashMap<String, Tag>> {
        self.inner.tag_catalog(collection)
    }

    fn upsert_tag(&mut self, _: &str, _: &Tag) -> AdapterResult<()> {
        Ok(())
    }
}
