//! Identity extraction
//!
//! Derives the stable key a record is tracked under across syncs. Simple
//! entities key on one field; line-structured entities (order lines) key on
//! `parent + "_" + line`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::{Result, SyncError};

/// Identity used when a key field is missing, null or not a scalar
///
/// Every malformed record of a collection collapses onto this one identity.
pub const UNKNOWN_IDENTITY: &str = "UNKNOWN";

/// Separator between parent key and line number in composite identities
pub const COMPOSITE_SEPARATOR: &str = "_";

/// How a collection derives record identity
///
/// Deserializes from `{ field = "..." }` or `{ parent = "...", line = "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    /// Single identifying field
    Single { field: String },
    /// Parent key field plus line-number field
    Composite { parent: String, line: String },
}

impl KeySpec {
    pub fn single(field: impl Into<String>) -> Self {
        KeySpec::Single {
            field: field.into(),
        }
    }

    pub fn composite(parent: impl Into<String>, line: impl Into<String>) -> Self {
        KeySpec::Composite {
            parent: parent.into(),
            line: line.into(),
        }
    }

    /// Field names this spec reads
    pub fn fields(&self) -> Vec<&str> {
        match self {
            KeySpec::Single { field } => vec![field.as_str()],
            KeySpec::Composite { parent, line } => vec![parent.as_str(), line.as_str()],
        }
    }
}

/// Compute the identity of `record` under `key`
///
/// # Errors
///
/// Returns `RecordNotObject` if `record` is not a JSON object. Missing or
/// unusable key fields are not errors; they resolve to [`UNKNOWN_IDENTITY`].
pub fn identity(record: &Value, key: &KeySpec) -> Result<String> {
    let obj = record.as_object().ok_or_else(|| SyncError::RecordNotObject {
        found: json_kind(record).to_string(),
    })?;

    Ok(match key {
        KeySpec::Single { field } => key_value(obj, field),
        KeySpec::Composite { parent, line } => format!(
            "{}{}{}",
            key_value(obj, parent),
            COMPOSITE_SEPARATOR,
            key_value(obj, line)
        ),
    })
}

/// Read one key field as a canonical string
fn key_value(obj: &Map<String, Value>, field: &str) -> String {
    match obj.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => canonical_number(n),
        Some(Value::Bool(b)) => b.to_string(),
        _ => UNKNOWN_IDENTITY.to_string(),
    }
}

/// Canonical decimal text for a JSON number
///
/// Integral values render without a fractional part so that `10`, `10.0`
/// and `"10"` key the same record.
pub fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // 2^53: beyond this f64 no longer holds every integer exactly
        Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            (f as i64).to_string()
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_string_field() {
        let key = KeySpec::single("ItemNumber");
        assert_eq!(identity(&json!({"ItemNumber": "A-100"}), &key).unwrap(), "A-100");
    }

    #[test]
    fn test_numeric_and_string_keys_agree() {
        let key = KeySpec::single("id");
        let from_int = identity(&json!({"id": 10}), &key).unwrap();
        let from_float = identity(&json!({"id": 10.0}), &key).unwrap();
        let from_str = identity(&json!({"id": "10"}), &key).unwrap();
        assert_eq!(from_int, "10");
        assert_eq!(from_float, "10");
        assert_eq!(from_str, "10");
    }

    #[test]
    fn test_fractional_number_kept() {
        let key = KeySpec::single("id");
        assert_eq!(identity(&json!({"id": 2.5}), &key).unwrap(), "2.5");
    }

    #[test]
    fn test_composite_identity() {
        let key = KeySpec::composite("SalesOrderNumber", "LineNumber");
        let rec = json!({"SalesOrderNumber": "P1", "LineNumber": 1});
        assert_eq!(identity(&rec, &key).unwrap(), "P1_1");
    }

    #[test]
    fn test_composite_distinguishes_parents() {
        let key = KeySpec::composite("order", "line");
        let a = identity(&json!({"order": "P1", "line": 1}), &key).unwrap();
        let b = identity(&json!({"order": "P2", "line": 1}), &key).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_and_null_fields_resolve_to_unknown() {
        let key = KeySpec::single("id");
        assert_eq!(identity(&json!({"name": "x"}), &key).unwrap(), UNKNOWN_IDENTITY);
        assert_eq!(identity(&json!({"id": null}), &key).unwrap(), UNKNOWN_IDENTITY);
        assert_eq!(identity(&json!({"id": {"nested": 1}}), &key).unwrap(), UNKNOWN_IDENTITY);

        let composite = KeySpec::composite("order", "line");
        assert_eq!(
            identity(&json!({"order": "P1"}), &composite).unwrap(),
            "P1_UNKNOWN"
        );
    }

    #[test]
    fn test_non_object_record_is_an_error() {
        let key = KeySpec::single("id");
        let err = identity(&json!(42), &key).unwrap_err();
        assert_eq!(
            err,
            SyncError::RecordNotObject {
                found: "number".to_string()
            }
        );
    }

    #[test]
    fn test_key_spec_deserializes_both_shapes() {
        let single: KeySpec = serde_json::from_value(json!({"field": "id"})).unwrap();
        assert_eq!(single, KeySpec::single("id"));

        let composite: KeySpec =
            serde_json::from_value(json!({"parent": "order", "line": "line"})).unwrap();
        assert_eq!(composite, KeySpec::composite("order", "line"));
        assert_eq!(composite.fields(), vec!["order", "line"]);
    }
}
