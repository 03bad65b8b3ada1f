use dynsync_core::errors::{ExError, ExErrorKind, SyncError};
use dynsync_core_types::RunId;

#[test]
fn test_record_not_object_is_invalid_record() {
    let err = SyncError::RecordNotObject {
        found: "array".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidRecord);
    assert_eq!(ex_err.code(), "ERR_INVALID_RECORD");
    assert!(ex_err.message().contains("array"));
}

#[test]
fn test_record_not_found_carries_scope() {
    let err = SyncError::RecordNotFound {
        collection: "articles".to_string(),
        identity: "A-1".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.collection(), Some("articles"));
    assert_eq!(ex_err.identity(), Some("A-1"));
}

#[test]
fn test_empty_snapshot_distinct_from_invalid_snapshot() {
    let empty: ExError = SyncError::EmptySnapshot {
        collection: "articles".to_string(),
    }
    .into();
    let invalid: ExError = SyncError::InvalidSnapshot {
        reason: "missing value array".to_string(),
    }
    .into();

    assert_eq!(empty.code(), "ERR_EMPTY_SNAPSHOT");
    assert_eq!(invalid.code(), "ERR_INVALID_SNAPSHOT");
    assert_ne!(empty.kind(), invalid.kind());
}

#[test]
fn test_invalid_config_maps_to_config_kind() {
    let ex_err: ExError = SyncError::InvalidConfig {
        reason: "duplicate collection 'articles'".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::Config);
    assert_eq!(ex_err.message(), "duplicate collection 'articles'");
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::InvalidRecord, "ERR_INVALID_RECORD"),
        (ExErrorKind::InvalidSnapshot, "ERR_INVALID_SNAPSHOT"),
        (ExErrorKind::EmptySnapshot, "ERR_EMPTY_SNAPSHOT"),
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::Config, "ERR_CONFIG"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_display_includes_context() {
    let err = ExError::new(ExErrorKind::Persistence)
        .with_op("update")
        .with_collection("order_lines")
        .with_identity("P1_1")
        .with_message("database is locked");

    let text = err.to_string();
    assert!(text.contains("ERR_PERSISTENCE"));
    assert!(text.contains("update"));
    assert!(text.contains("order_lines"));
    assert!(text.contains("P1_1"));
    assert!(text.contains("database is locked"));
}

#[test]
fn test_run_id_context() {
    let run_id = RunId::new();
    let err = ExError::new(ExErrorKind::Internal).with_run_id(run_id.clone());
    assert_eq!(err.run_id(), Some(&run_id));
}
