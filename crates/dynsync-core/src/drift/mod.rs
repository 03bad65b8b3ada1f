//! Schema drift analyzer.
//!
//! Walks arbitrary nested JSON records, flattens them into dotted paths with a
//! coarse type per path, and merges the result into a persisted tag catalog so
//! that fields appearing upstream are detected and reported.
//!
//! ## Entry point
//!
//! ```
//! use chrono::Utc;
//! use dynsync_core::adapter::MemoryStore;
//! use dynsync_core::drift::{analyze_snapshot, SchemaLimits};
//! use serde_json::json;
//!
//! let mut catalog = MemoryStore::new();
//! let records = vec![json!({"id": "X1", "price": {"amount": 9.5}})];
//! let report = analyze_snapshot(&mut catalog, "articles", &records, &SchemaLimits::default(), Utc::now())?;
//! assert_eq!(report.new_paths, vec!["id", "price", "price.amount"]);
//! # Ok::<(), dynsync_core::ExError>(())
//! ```
//!
//! ## Path rules
//!
//! - Root keys are their own path; nested keys are `parent.key`.
//! - Arrays are sampled through their first element only, and the element's
//!   keys hang directly off the array's path (no index marker).
//! - Paths longer than [`SchemaLimits::max_path_len`] are cut and suffixed
//!   with `...`; children are still derived from the full path.

use serde::{Deserialize, Serialize};

pub mod analyzer;
pub mod catalog;
pub mod summary;

pub use analyzer::SchemaAnalyzer;
pub use catalog::{analyze_snapshot, apply_to_catalog, merge_tag, DriftReport, TypeChange};
pub use summary::render_drift_summary;

/// Marker appended to truncated paths and samples
pub const TRUNCATION_MARKER: &str = "...";

/// Storage limits for tag paths and sample values, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaLimits {
    pub max_path_len: usize,
    pub max_sample_len: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self {
            max_path_len: 255,
            max_sample_len: 100,
        }
    }
}

/// Cut `text` to at most `max` characters, ending in [`TRUNCATION_MARKER`]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_long_text_cut_to_limit() {
        let cut = truncate("abcdefghij", 8);
        assert_eq!(cut, "abcde...");
        assert_eq!(cut.chars().count(), 8);
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let cut = truncate("ääääää", 5);
        assert_eq!(cut, "ää...");
    }

    #[test]
    fn test_limits_deserialize_with_defaults() {
        let limits: SchemaLimits = serde_json::from_str(r#"{"max_path_len": 40}"#).unwrap();
        assert_eq!(limits.max_path_len, 40);
        assert_eq!(limits.max_sample_len, 100);
    }
}
