use chrono::{DateTime, TimeZone, Utc};
use dynsync_core::adapter::{AdapterResult, MemoryStore, RecordStore};
use dynsync_core::errors::{ExError, ExErrorKind};
use dynsync_core::model::SnapshotRecord;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Fixed run timestamp, `secs` after the epoch
#[allow(dead_code)]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Article-shaped record keyed on `ItemNumber`
#[allow(dead_code)]
pub fn article(item_number: &str, price: f64) -> Value {
    json!({ "ItemNumber": item_number, "Name": format!("Item {item_number}"), "Price": price })
}

/// Order-line-shaped record keyed on `SalesOrderNumber` + `LineNumber`
#[allow(dead_code)]
pub fn order_line(order: &str, line: u32, qty: u32) -> Value {
    json!({ "SalesOrderNumber": order, "LineNumber": line, "Quantity": qty })
}

/// Memory adapter that fails every write touching one identity
#[allow(dead_code)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub poisoned: String,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new(inner: MemoryStore, poisoned: &str) -> Self {
        Self {
            inner,
            poisoned: poisoned.to_string(),
        }
    }

    fn check(&self, identity: &str) -> AdapterResult<()> {
        if identity == self.poisoned {
            Err(ExError::new(ExErrorKind::Persistence).with_message("disk full"))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for FailingStore {
    fn fingerprints_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        self.inner.fingerprints_of(collection)
    }

    fn identities_of(&self, collection: &str) -> AdapterResult<HashSet<String>> {
        self.inner.identities_of(collection)
    }

    fn tombstones_of(&self, collection: &str) -> AdapterResult<HashMap<String, String>> {
        self.inner.tombstones_of(collection)
    }

    fn insert(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        self.check(&record.identity)?;
        self.inner.insert(collection, record, now)
    }

    fn update(
        &mut self,
        collection: &str,
        record: &SnapshotRecord,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        self.check(&record.identity)?;
        self.inner.update(collection, record, now)
    }

    fn touch(&mut self, collection: &str, identity: &str, now: DateTime<Utc>) -> AdapterResult<()> {
        self.check(identity)?;
        self.inner.touch(collection, identity, now)
    }

    fn mark_deleted(
        &mut self,
        collection: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> AdapterResult<()> {
        self.check(identity)?;
        self.inner.mark_deleted(collection, identity, now)
    }
}

/// Adapter whose reads fail, as if the database were unreachable
#[allow(dead_code)]
pub struct UnreachableStore;

impl RecordStore for UnreachableStore {
    fn fingerprints_of(&self, _collection: &str) -> AdapterResult<HashMap<String, String>> {
        Err(ExError::new(ExErrorKind::Persistence).with_message("connection refused"))
    }

    fn tombstones_of(&self, _collection: &str) -> AdapterResult<HashMap<String, String>> {
        Err(ExError::new(ExErrorKind::Persistence).with_message("connection refused"))
    }

    fn insert(&mut self, _: &str, _: &SnapshotRecord, _: DateTime<Utc>) -> AdapterResult<()> {
        unreachable!("reads fail first")
    }

    fn update(&mut self, _: &str, _: &SnapshotRecord, _: DateTime<Utc>) -> AdapterResult<()> {
        unreachable!("reads fail first")
    }

    fn touch(&mut self, _: &str, _: &str, _: DateTime<Utc>) -> AdapterResult<()> {
        unreachable!("reads fail first")
    }

    fn mark_deleted(&mut self, _: &str, _: &str, _: DateTime<Utc>) -> AdapterResult<()> {
        unreachable!("reads fail first")
    }
}
