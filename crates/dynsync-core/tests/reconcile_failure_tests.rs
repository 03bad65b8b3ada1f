#![allow(clippy::unwrap_used, clippy::expect_used)]

/// Partial failure, dry run and logging behavior of the reconciliation engine
mod common;

use common::{at, FailingStore, UnreachableStore};
use dynsync_core::adapter::{DryRun, MemoryStore};
use dynsync_core::errors::ExErrorKind;
use dynsync_core::identity::KeySpec;
use dynsync_core::logging_facility::test_capture::init_test_capture;
use dynsync_core::reconcile::reconcile;
use dynsync_core_types::schema::{EVENT_END, EVENT_END_ERROR};
use serde_json::json;

#[test]
fn test_failing_record_is_counted_and_run_continues() {
    // GIVEN an adapter that cannot write identity "B"
    let mut store = FailingStore::new(MemoryStore::new(), "B");
    let key = KeySpec::single("id");
    let incoming = vec![json!({"id": "A"}), json!({"id": "B"}), json!({"id": "C"})];

    // WHEN reconciling
    let outcome = reconcile(&mut store, "isolation", &key, &incoming, at(1)).unwrap();

    // THEN A and C are persisted and B is a per-record error
    assert_eq!(outcome.summary.total_processed, 3);
    assert_eq!(outcome.summary.new, 2);
    assert_eq!(outcome.summary.errors, 1);

    let err = outcome.results[1].as_ref().unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(err.op(), Some("insert"));
    assert_eq!(err.collection(), Some("isolation"));
    assert_eq!(err.identity(), Some("B"));

    assert!(store.inner.record("isolation", "A").is_some());
    assert!(store.inner.record("isolation", "B").is_none());
    assert!(store.inner.record("isolation", "C").is_some());
}

#[test]
fn test_failed_update_does_not_tombstone_the_record() {
    let mut inner = MemoryStore::new();
    let key = KeySpec::single("id");
    reconcile(&mut inner, "no_tombstone", &key, &[json!({"id": "B", "v": 1})], at(1)).unwrap();

    let mut store = FailingStore::new(inner, "B");
    let outcome =
        reconcile(&mut store, "no_tombstone", &key, &[json!({"id": "B", "v": 2})], at(2)).unwrap();

    assert_eq!(outcome.summary.errors, 1);
    assert_eq!(outcome.summary.deleted, 0);
    let b = store.inner.record("no_tombstone", "B").unwrap();
    assert!(!b.is_deleted);
    assert_eq!(b.payload, r#"{"id":"B","v":1}"#);
}

#[test]
fn test_failing_mark_deleted_is_counted() {
    let mut inner = MemoryStore::new();
    let key = KeySpec::single("id");
    let both = vec![json!({"id": "A"}), json!({"id": "B"})];
    reconcile(&mut inner, "del_fail", &key, &both, at(1)).unwrap();

    let mut store = FailingStore::new(inner, "A");
    let outcome = reconcile(&mut store, "del_fail", &key, &[], at(2)).unwrap();

    assert_eq!(outcome.summary.deleted, 1);
    assert_eq!(outcome.summary.errors, 1);
    assert_eq!(outcome.deleted, vec!["B"]);
    assert_eq!(outcome.deletion_failures.len(), 1);
    assert_eq!(outcome.deletion_failures[0].identity(), Some("A"));
    assert_eq!(outcome.failures().count(), 1);
}

#[test]
fn test_unreadable_state_aborts_the_run() {
    let mut store = UnreachableStore;
    let key = KeySpec::single("id");

    let err = reconcile(&mut store, "down", &key, &[json!({"id": "A"})], at(1)).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(err.op(), Some("reconcile"));
    assert_eq!(err.collection(), Some("down"));
}

#[test]
fn test_dry_run_classifies_without_writing() {
    let mut store = MemoryStore::new();
    let key = KeySpec::single("id");
    reconcile(&mut store, "preview", &key, &[json!({"id": "A", "v": 1}), json!({"id": "B"})], at(1))
        .unwrap();

    let incoming = vec![json!({"id": "A", "v": 2}), json!({"id": "C"})];
    let outcome = {
        let mut dry = DryRun::new(&store);
        reconcile(&mut dry, "preview", &key, &incoming, at(2)).unwrap()
    };

    assert_eq!(outcome.summary.new, 1);
    assert_eq!(outcome.summary.updated, 1);
    assert_eq!(outcome.summary.deleted, 1);

    // Nothing persisted
    assert!(store.record("preview", "C").is_none());
    assert!(!store.record("preview", "B").unwrap().is_deleted);
    assert_eq!(store.record("preview", "A").unwrap().update_count, 0);
}

#[test]
fn test_reconcile_logs_counts_on_end() {
    let capture = init_test_capture();
    let mut store = MemoryStore::new();
    let key = KeySpec::single("id");

    reconcile(&mut store, "logged_run", &key, &[json!({"id": "A"}), json!(7)], at(1)).unwrap();

    let end = capture
        .last_for("reconcile", EVENT_END, "logged_run")
        .expect("end event");
    assert_eq!(end.counter("total_processed"), Some(2));
    assert_eq!(end.counter("new"), Some(1));
    assert_eq!(end.counter("errors"), Some(1));
    assert!(end.fields.contains_key("duration_ms"));

    let warnings = capture.count_events(|e| {
        e.level == tracing::Level::WARN && e.collection.as_deref() == Some("logged_run")
    });
    assert_eq!(warnings, 1);
}

#[test]
fn test_failing_record_warning_names_its_identity() {
    let capture = init_test_capture();
    let mut store = FailingStore::new(MemoryStore::new(), "B");
    let incoming = vec![json!({"id": "A"}), json!({"id": "B"})];

    reconcile(&mut store, "logged_failure", &KeySpec::single("id"), &incoming, at(1)).unwrap();

    let warning = capture
        .events()
        .into_iter()
        .find(|e| {
            e.level == tracing::Level::WARN && e.collection.as_deref() == Some("logged_failure")
        })
        .expect("warning event");
    assert_eq!(warning.identity(), Some("B"));
    assert_eq!(warning.err_code(), Some("ERR_PERSISTENCE"));
}

#[test]
fn test_aborted_reconcile_logs_end_error() {
    let capture = init_test_capture();
    let mut store = UnreachableStore;

    let _ = reconcile(&mut store, "logged_abort", &KeySpec::single("id"), &[], at(1));

    let event = capture
        .last_for("reconcile", EVENT_END_ERROR, "logged_abort")
        .expect("end_error event");
    assert_eq!(event.err_code(), Some("ERR_PERSISTENCE"));
}
