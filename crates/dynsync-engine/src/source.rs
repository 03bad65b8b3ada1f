//! Snapshot sources
//!
//! A source yields the complete, decoded snapshot of one collection. The
//! upstream OData API wraps records as `{"value": [...]}`; a bare JSON array is
//! accepted as well.

#![allow(clippy::result_large_err)]

use dynsync_core::errors::{ExError, ExErrorKind, SyncError};
use dynsync_store::errors::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::CollectionSpec;

/// Property holding the record array in an OData response
pub const ODATA_VALUE_FIELD: &str = "value";

/// Supplies the full snapshot of a collection
pub trait SnapshotSource {
    /// Fetch every record currently present upstream for `collection`
    fn fetch(&self, collection: &CollectionSpec) -> Result<Vec<Value>>;
}

/// Decode a snapshot document into its records
pub fn decode_snapshot(bytes: &[u8]) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_slice(bytes).map_err(|e| {
        ExError::from(SyncError::InvalidSnapshot {
            reason: format!("not valid JSON: {}", e),
        })
    })?;

    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut envelope) => match envelope.remove(ODATA_VALUE_FIELD) {
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(SyncError::InvalidSnapshot {
                reason: format!("'{}' is not an array", ODATA_VALUE_FIELD),
            }
            .into()),
            None => Err(SyncError::InvalidSnapshot {
                reason: format!("object without a '{}' array", ODATA_VALUE_FIELD),
            }
            .into()),
        },
        _ => Err(SyncError::InvalidSnapshot {
            reason: "expected an array or an object with a 'value' array".to_string(),
        }
        .into()),
    }
}

/// Reads a snapshot previously saved from the upstream API
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for JsonFileSource {
    fn fetch(&self, collection: &CollectionSpec) -> Result<Vec<Value>> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("fetch_snapshot")
                .with_collection(&collection.name)
                .with_message(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        decode_snapshot(&bytes).map_err(|e| {
            e.with_op("fetch_snapshot")
                .with_collection(&collection.name)
        })
    }
}

/// Snapshot held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<Value>,
}

impl StaticSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

impl SnapshotSource for StaticSource {
    fn fetch(&self, _collection: &CollectionSpec) -> Result<Vec<Value>> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_odata_envelope() {
        let doc = br#"{"@odata.context": "x", "value": [{"id": 1}, {"id": 2}]}"#;
        let records = decode_snapshot(doc).unwrap();
        assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn test_decodes_bare_array() {
        assert_eq!(decode_snapshot(b"[]").unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_rejects_other_shapes() {
        let docs: [&[u8]; 4] = [b"{\"items\": []}", b"{\"value\": 3}", b"42", b"not json"];
        for doc in docs {
            let err = decode_snapshot(doc).unwrap_err();
            assert_eq!(err.kind(), ExErrorKind::InvalidSnapshot);
        }
    }
}
