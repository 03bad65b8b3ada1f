//! In-run schema observation.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::{truncate, SchemaLimits};
use crate::model::{DataType, Tag};

/// Accumulates the tags observed across the records of one run
///
/// Paths are kept in a sorted map, so iteration order (and therefore the
/// order of new-path reports) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct SchemaAnalyzer {
    limits: SchemaLimits,
    tags: BTreeMap<String, Tag>,
    records_observed: u64,
}

impl SchemaAnalyzer {
    pub fn new(limits: SchemaLimits) -> Self {
        Self {
            limits,
            tags: BTreeMap::new(),
            records_observed: 0,
        }
    }

    /// Walk one record and fold every path it contains into the tag map.
    ///
    /// Returns `false` (and observes nothing) if `record` is not an object.
    pub fn observe(&mut self, record: &Value, now: DateTime<Utc>) -> bool {
        let Some(fields) = record.as_object() else {
            return false;
        };
        self.records_observed += 1;
        self.walk_object(None, fields, now);
        true
    }

    fn walk_object(&mut self, prefix: Option<&str>, fields: &Map<String, Value>, now: DateTime<Utc>) {
        for (key, value) in fields {
            let full = match prefix {
                Some(parent) => format!("{parent}.{key}"),
                None => key.clone(),
            };
            self.record(&full, value, now);
            self.descend(&full, value, now);
        }
    }

    fn descend(&mut self, path: &str, value: &Value, now: DateTime<Utc>) {
        match value {
            Value::Object(fields) => self.walk_object(Some(path), fields, now),
            // First element only, joined to the array's own path
            Value::Array(items) => {
                if let Some(first) = items.first() {
                    self.descend(path, first, now);
                }
            }
            _ => {}
        }
    }

    fn record(&mut self, full_path: &str, value: &Value, now: DateTime<Utc>) {
        let path = truncate(full_path, self.limits.max_path_len);
        let data_type = DataType::of(value);
        let sample = sample_of(value).map(|s| truncate(&s, self.limits.max_sample_len));

        match self.tags.entry(path) {
            Entry::Occupied(mut slot) => slot.get_mut().observe(data_type, sample, now),
            Entry::Vacant(slot) => {
                let tag = Tag::first_observation(slot.key().clone(), data_type, sample, now);
                slot.insert(tag);
            }
        }
    }

    /// Fold another analyzer's observations into this one
    ///
    /// Counts add up, the seen-window widens, and type and sample come from
    /// whichever side saw a non-null value most recently.
    pub fn merge(&mut self, other: SchemaAnalyzer) {
        self.records_observed += other.records_observed;
        for (path, theirs) in other.tags {
            match self.tags.entry(path) {
                Entry::Vacant(slot) => {
                    slot.insert(theirs);
                }
                Entry::Occupied(mut slot) => {
                    let ours = slot.get_mut();
                    let take_theirs = !theirs.data_type.is_null()
                        && (ours.data_type.is_null() || theirs.last_seen_at >= ours.last_seen_at);
                    if take_theirs {
                        ours.data_type = theirs.data_type;
                        ours.sample_value = theirs.sample_value;
                    }
                    ours.occurrence_count += theirs.occurrence_count;
                    ours.first_seen_at = ours.first_seen_at.min(theirs.first_seen_at);
                    ours.last_seen_at = ours.last_seen_at.max(theirs.last_seen_at);
                }
            }
        }
    }

    pub fn tags(&self) -> &BTreeMap<String, Tag> {
        &self.tags
    }

    pub fn into_tags(self) -> BTreeMap<String, Tag> {
        self.tags
    }

    pub fn tag(&self, path: &str) -> Option<&Tag> {
        self.tags.get(path)
    }

    pub fn limits(&self) -> &SchemaLimits {
        &self.limits
    }

    /// Number of object records walked so far
    pub fn records_observed(&self) -> u64 {
        self.records_observed
    }
}

/// Preview text for a value; `None` for null
fn sample_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
    }
}
