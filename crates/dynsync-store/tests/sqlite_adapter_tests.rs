// Integration tests for the SQLite persistence adapter
//
// The same reconciliation scenarios run against the in-memory adapter and the
// SQLite adapter must leave identical record state behind.

use chrono::{DateTime, TimeZone, Utc};
use dynsync_core::adapter::{MemoryStore, RecordStore, TagCatalog};
use dynsync_core::drift::{analyze_snapshot, SchemaLimits};
use dynsync_core::identity::KeySpec;
use dynsync_core::model::{DataType, StoredRecord};
use dynsync_core::reconcile::{reconcile, SyncSummary};
use dynsync_store::migrations::apply_migrations;
use dynsync_store::{db, SqliteStore};
use rusqlite::Connection;
use serde_json::{json, Value};
use tempfile::TempDir;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    apply_migrations(&mut conn).expect("Failed to apply migrations");
    conn
}

fn runs() -> Vec<Vec<Value>> {
    vec![
        vec![json!({"id": "A", "v": 1}), json!({"id": "B", "v": 1}), json!({"id": "C"})],
        vec![json!({"id": "A", "v": 2}), json!({"id": "C"}), json!("not an object")],
        vec![json!({"id": "B", "v": 1}), json!({"id": "C"}), json!({"id": "C", "v": 3})],
        vec![],
    ]
}

#[test]
fn test_sqlite_adapter_matches_memory_adapter() {
    let key = KeySpec::single("id");
    let conn = setup_test_db();
    let mut sqlite = SqliteStore::new(&conn);
    let mut memory = MemoryStore::new();

    for (i, snapshot) in runs().iter().enumerate() {
        let now = at(100 * (i as i64 + 1));
        let from_sqlite = reconcile(&mut sqlite, "parity", &key, snapshot, now).unwrap();
        let from_memory = reconcile(&mut memory, "parity", &key, snapshot, now).unwrap();
        assert_eq!(from_sqlite.summary, from_memory.summary, "run {}", i + 1);
        assert_eq!(from_sqlite.deleted, from_memory.deleted, "run {}", i + 1);
    }

    let stored: Vec<StoredRecord> = sqlite.records("parity").unwrap();
    let expected: Vec<StoredRecord> = memory.records("parity").into_iter().cloned().collect();
    assert_eq!(stored, expected);
}

#[test]
fn test_resurrection_run_summary() {
    let key = KeySpec::single("id");
    let conn = setup_test_db();
    let mut store = SqliteStore::new(&conn);

    reconcile(&mut store, "revive", &key, &[json!({"id": "B", "v": 1})], at(1)).unwrap();
    reconcile(&mut store, "revive", &key, &[], at(2)).unwrap();
    assert!(store.fingerprints_of("revive").unwrap().is_empty());
    assert_eq!(store.tombstones_of("revive").unwrap().len(), 1);

    let outcome = reconcile(&mut store, "revive", &key, &[json!({"id": "B", "v": 1})], at(3)).unwrap();
    assert_eq!(
        outcome.summary,
        SyncSummary {
            total_processed: 1,
            unchanged: 1,
            resurrected: 1,
            ..Default::default()
        }
    );

    let b = store.record("revive", "B").unwrap().unwrap();
    assert!(!b.is_deleted);
    assert_eq!(b.deleted_at, None);
    assert_eq!(b.first_seen_at, at(1));
    assert_eq!(b.last_updated_at, at(3));
}

#[test]
fn test_mark_deleted_keeps_first_deletion_time() {
    let key = KeySpec::single("id");
    let conn = setup_test_db();
    let mut store = SqliteStore::new(&conn);
    reconcile(&mut store, "tomb", &key, &[json!({"id": "A"})], at(1)).unwrap();

    store.mark_deleted("tomb", "A", at(2)).unwrap();
    store.mark_deleted("tomb", "A", at(3)).unwrap();

    assert_eq!(store.record("tomb", "A").unwrap().unwrap().deleted_at, Some(at(2)));
    assert!(store.mark_deleted("tomb", "missing", at(4)).is_err());
}

#[test]
fn test_tag_catalog_round_trip() {
    let conn = setup_test_db();
    let mut store = SqliteStore::new(&conn);
    let limits = SchemaLimits::default();

    let first = vec![json!({"Name": "x", "Dims": {"W": 1}})];
    analyze_snapshot(&mut store, "tags", &first, &limits, at(10)).unwrap();
    let second = vec![json!({"Name": null, "Dims": {"W": 2, "H": 3}})];
    let report = analyze_snapshot(&mut store, "tags", &second, &limits, at(20)).unwrap();

    assert_eq!(report.new_paths, vec!["Dims.H"]);

    let catalog = store.tag_catalog("tags").unwrap();
    let name = &catalog["Name"];
    assert_eq!(name.data_type, DataType::String);
    assert_eq!(name.sample_value.as_deref(), Some("x"));
    assert_eq!(name.occurrence_count, 2);
    assert_eq!(name.first_seen_at, at(10));
    assert_eq!(name.last_seen_at, at(20));

    let fresh = store.tags("tags", Some(at(20))).unwrap();
    let paths: Vec<&str> = fresh.iter().map(|t| t.path.as_str()).collect();
    assert_eq!(paths, vec!["Dims.H"]);
}

#[test]
fn test_state_survives_reopening_file_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync.db");
    let key = KeySpec::single("id");

    {
        let conn = db::open_migrated(&path).unwrap();
        let mut store = SqliteStore::new(&conn);
        reconcile(&mut store, "file", &key, &[json!({"id": "A"})], at(1)).unwrap();
    }

    let conn = db::open_migrated(&path).unwrap();
    let mut store = SqliteStore::new(&conn);
    let outcome = reconcile(&mut store, "file", &key, &[json!({"id": "A"})], at(2)).unwrap();
    assert_eq!(outcome.summary.unchanged, 1);
    assert_eq!(outcome.summary.new, 0);
}
