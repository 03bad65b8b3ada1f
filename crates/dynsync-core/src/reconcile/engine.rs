//! Reconciliation computation engine.
//!
//! The core entry point is [`reconcile`], which classifies every incoming
//! record of one collection against the persisted state and tombstones the
//! identities that disappeared.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::adapter::RecordStore;
use crate::errors::ExError;
use crate::identity::KeySpec;
use crate::model::SnapshotRecord;
use crate::reconcile::model::{
    Classification, ClassifiedRecord, ReconcileOutcome, RecordResult, SyncSummary,
};
use crate::{log_op_end, log_op_error, log_op_start};

const OP: &str = "reconcile";

/// Persisted state of the collection, advanced as the run writes
struct WorkingState {
    /// Live identity → hash; grows with every successful write
    live: HashMap<String, String>,
    /// Tombstoned identity → hash; shrinks as identities are revived
    tombstones: HashMap<String, String>,
    /// Live identities at the start of the run
    existing: HashSet<String>,
    /// Identities present in the incoming snapshot
    seen: HashSet<String>,
}

impl WorkingState {
    fn load<S: RecordStore + ?Sized>(store: &S, collection: &str) -> Result<Self, ExError> {
        Ok(Self {
            live: store.fingerprints_of(collection)?,
            tombstones: store.tombstones_of(collection)?,
            existing: store.identities_of(collection)?,
            seen: HashSet::new(),
        })
    }
}

/// What the persisted state knew about an identity before this item
enum Prior {
    /// Live record; `true` if the fingerprint matches
    Live(bool),
    /// Tombstoned record; `true` if the fingerprint matches
    Tombstoned(bool),
    Absent,
}

/// Reconcile one collection's incoming snapshot against the persisted state.
///
/// `now` is stamped on every write of the run.
///
/// # Errors
///
/// Returns an error only when the persisted state cannot be read at the start
/// of the run. Failures while writing a single record, or while tombstoning a
/// single identity, are counted in `summary.errors` and reported in the
/// outcome without aborting the run.
pub fn reconcile<S: RecordStore + ?Sized>(
    store: &mut S,
    collection: &str,
    key: &KeySpec,
    incoming: &[Value],
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome, ExError> {
    let started = Instant::now();
    log_op_start!(OP, collection = collection, incoming = incoming.len());

    let mut state = match WorkingState::load(&*store, collection) {
        Ok(state) => state,
        Err(e) => {
            let e = e.with_op(OP).with_collection(collection);
            log_op_error!(
                OP,
                e.clone(),
                duration_ms = started.elapsed().as_millis() as u64,
                collection = collection
            );
            return Err(e);
        }
    };

    let mut summary = SyncSummary::default();
    let mut results = Vec::with_capacity(incoming.len());

    for item in incoming {
        summary.total_processed += 1;
        let result = reconcile_one(store, collection, key, item, now, &mut state);
        match &result {
            Ok(classified) => summary.count(classified),
            Err(e) => {
                summary.errors += 1;
                tracing::warn!(
                    op = OP,
                    collection = collection,
                    identity = e.identity().unwrap_or_default(),
                    err_code = e.code(),
                    "record failed: {}",
                    e
                );
            }
        }
        results.push(result);
    }

    // Barrier: only identities absent from the whole snapshot are tombstoned
    let mut gone: Vec<String> = state.existing.difference(&state.seen).cloned().collect();
    gone.sort();

    let mut deleted = Vec::with_capacity(gone.len());
    let mut deletion_failures = Vec::new();
    for identity in gone {
        match store.mark_deleted(collection, &identity, now) {
            Ok(()) => {
                summary.deleted += 1;
                deleted.push(identity);
            }
            Err(e) => {
                let e = e
                    .with_op("mark_deleted")
                    .with_collection(collection)
                    .with_identity(&identity);
                summary.errors += 1;
                tracing::warn!(
                    op = OP,
                    collection = collection,
                    identity = identity.as_str(),
                    err_code = e.code(),
                    "tombstone failed: {}",
                    e
                );
                deletion_failures.push(e);
            }
        }
    }

    log_op_end!(
        OP,
        duration_ms = started.elapsed().as_millis() as u64,
        collection = collection,
        total_processed = summary.total_processed,
        new = summary.new,
        updated = summary.updated,
        unchanged = summary.unchanged,
        deleted = summary.deleted,
        resurrected = summary.resurrected,
        errors = summary.errors
    );

    Ok(ReconcileOutcome {
        summary,
        results,
        deleted,
        deletion_failures,
    })
}

/// Classify and persist a single incoming item.
fn reconcile_one<S: RecordStore + ?Sized>(
    store: &mut S,
    collection: &str,
    key: &KeySpec,
    item: &Value,
    now: DateTime<Utc>,
    state: &mut WorkingState,
) -> RecordResult {
    let record = SnapshotRecord::from_value(item, key)
        .map_err(|e| ExError::from(e).with_op(OP).with_collection(collection))?;

    // Seen even if the write below fails: a failed update must not tombstone
    state.seen.insert(record.identity.clone());

    let prior = match (
        state.live.get(&record.identity),
        state.tombstones.get(&record.identity),
    ) {
        (Some(hash), _) => Prior::Live(*hash == record.content_hash),
        (None, Some(hash)) => Prior::Tombstoned(*hash == record.content_hash),
        (None, None) => Prior::Absent,
    };

    let (classification, resurrected) = match prior {
        Prior::Live(same) | Prior::Tombstoned(same) => {
            let resurrected = matches!(prior, Prior::Tombstoned(_));
            if same {
                store
                    .touch(collection, &record.identity, now)
                    .map_err(|e| scoped(e, "touch", collection, &record.identity))?;
                (Classification::Unchanged, resurrected)
            } else {
                store
                    .update(collection, &record, now)
                    .map_err(|e| scoped(e, "update", collection, &record.identity))?;
                (Classification::Updated, resurrected)
            }
        }
        Prior::Absent => {
            store
                .insert(collection, &record, now)
                .map_err(|e| scoped(e, "insert", collection, &record.identity))?;
            (Classification::New, false)
        }
    };

    // Later duplicates of this identity compare against what was just written
    state.tombstones.remove(&record.identity);
    state
        .live
        .insert(record.identity.clone(), record.content_hash);

    Ok(ClassifiedRecord {
        identity: record.identity,
        classification,
        resurrected,
    })
}

fn scoped(err: ExError, op: &str, collection: &str, identity: &str) -> ExError {
    err.with_op(op)
        .with_collection(collection)
        .with_identity(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_duplicate_identity_in_one_snapshot_is_not_inserted_twice() {
        let mut store = MemoryStore::new();
        let key = KeySpec::single("id");
        let incoming = vec![json!({"id": "D1", "v": 1}), json!({"id": "D1", "v": 2})];

        let outcome = reconcile(&mut store, "dups", &key, &incoming, Utc::now()).unwrap();

        assert_eq!(outcome.summary.total_processed, 2);
        assert_eq!(outcome.summary.new, 1);
        assert_eq!(outcome.summary.updated, 1);
        let stored = store.record("dups", "D1").unwrap();
        assert_eq!(stored.update_count, 1);
        assert_eq!(stored.payload, r#"{"id":"D1","v":2}"#);
    }

    #[test]
    fn test_identical_duplicate_is_unchanged() {
        let mut store = MemoryStore::new();
        let key = KeySpec::single("id");
        let incoming = vec![json!({"id": "D1"}), json!({"id": "D1"})];

        let outcome = reconcile(&mut store, "dups2", &key, &incoming, Utc::now()).unwrap();
        assert_eq!(outcome.summary.new, 1);
        assert_eq!(outcome.summary.unchanged, 1);
    }

    #[test]
    fn test_non_object_item_counts_as_error() {
        let mut store = MemoryStore::new();
        let key = KeySpec::single("id");
        let incoming = vec![json!({"id": "A"}), json!("oops"), json!({"id": "B"})];

        let outcome = reconcile(&mut store, "bad_items", &key, &incoming, Utc::now()).unwrap();
        assert_eq!(outcome.summary.total_processed, 3);
        assert_eq!(outcome.summary.new, 2);
        assert_eq!(outcome.summary.errors, 1);
        assert!(outcome.results[1].is_err());
    }
}
