use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Coarse JSON type observed at a schema path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    /// Stored value that this build does not recognise
    Unknown,
}

impl DataType {
    /// Classify a JSON value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => DataType::String,
            Value::Number(_) => DataType::Number,
            Value::Bool(_) => DataType::Boolean,
            Value::Array(_) => DataType::Array,
            Value::Object(_) => DataType::Object,
            Value::Null => DataType::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "String",
            DataType::Number => "Number",
            DataType::Boolean => "Boolean",
            DataType::Array => "Array",
            DataType::Object => "Object",
            DataType::Null => "Null",
            DataType::Unknown => "Unknown",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataType::Null)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = std::convert::Infallible;

    /// Never fails: unrecognised names map to `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "String" => DataType::String,
            "Number" => DataType::Number,
            "Boolean" => DataType::Boolean,
            "Array" => DataType::Array,
            "Object" => DataType::Object,
            "Null" => DataType::Null,
            _ => DataType::Unknown,
        })
    }
}

/// Schema catalog entry for one dotted field path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Dotted path, truncated with `...` past the storage limit
    pub path: String,

    /// Most recently observed non-null type (or `Null` if never anything else)
    pub data_type: DataType,

    /// Only ever increases
    pub occurrence_count: u64,

    pub first_seen_at: DateTime<Utc>,

    pub last_seen_at: DateTime<Utc>,

    /// Truncated preview of a value seen at this path
    pub sample_value: Option<String>,
}

impl Tag {
    /// First observation of a path
    pub fn first_observation(
        path: impl Into<String>,
        data_type: DataType,
        sample_value: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            path: path.into(),
            data_type,
            occurrence_count: 1,
            first_seen_at: now,
            last_seen_at: now,
            sample_value,
        }
    }

    /// Fold another observation into this tag
    ///
    /// Type and sample are only overwritten by a non-null reading.
    pub fn observe(&mut self, data_type: DataType, sample_value: Option<String>, now: DateTime<Utc>) {
        self.occurrence_count += 1;
        self.last_seen_at = now;
        if !data_type.is_null() {
            self.data_type = data_type;
            self.sample_value = sample_value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_type_of() {
        assert_eq!(DataType::of(&json!("a")), DataType::String);
        assert_eq!(DataType::of(&json!(1.5)), DataType::Number);
        assert_eq!(DataType::of(&json!(false)), DataType::Boolean);
        assert_eq!(DataType::of(&json!([])), DataType::Array);
        assert_eq!(DataType::of(&json!({})), DataType::Object);
        assert_eq!(DataType::of(&Value::Null), DataType::Null);
    }

    #[test]
    fn test_data_type_parse_falls_back_to_unknown() {
        assert_eq!("Boolean".parse::<DataType>(), Ok(DataType::Boolean));
        assert_eq!("Decimal".parse::<DataType>(), Ok(DataType::Unknown));
    }

    #[test]
    fn test_observe_null_keeps_type_and_sample() {
        let now = Utc::now();
        let mut tag = Tag::first_observation("Price", DataType::Number, Some("9.5".into()), now);
        tag.observe(DataType::Null, None, now);

        assert_eq!(tag.occurrence_count, 2);
        assert_eq!(tag.data_type, DataType::Number);
        assert_eq!(tag.sample_value.as_deref(), Some("9.5"));
    }

    #[test]
    fn test_observe_non_null_replaces_null() {
        let now = Utc::now();
        let mut tag = Tag::first_observation("Notes", DataType::Null, None, now);
        tag.observe(DataType::String, Some("hello".into()), now);

        assert_eq!(tag.data_type, DataType::String);
        assert_eq!(tag.sample_value.as_deref(), Some("hello"));
    }
}
