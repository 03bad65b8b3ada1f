//! Merge of in-run observations into a persisted tag catalog.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use super::{SchemaAnalyzer, SchemaLimits};
use crate::adapter::TagCatalog;
use crate::errors::ExError;
use crate::model::{DataType, Tag};
use crate::{log_op_end, log_op_error, log_op_start};

const OP: &str = "analyze_schema";

/// A known path whose observed type moved to another non-null type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeChange {
    pub path: String,
    pub from: DataType,
    pub to: DataType,
}

/// Outcome of merging one run's observations into the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Distinct paths seen in this run
    pub paths_observed: u64,
    /// Paths absent from the catalog before this run, sorted
    pub new_paths: Vec<String>,
    /// Known paths that received an incremental update
    pub updated_paths: u64,
    pub type_changes: Vec<TypeChange>,
    /// Tag writes that failed
    pub errors: u64,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        !self.new_paths.is_empty() || !self.type_changes.is_empty()
    }
}

/// Combine a persisted tag with the run's observation of the same path
///
/// `first_seen_at` is kept; type and sample are refreshed only by a non-null
/// observation.
pub fn merge_tag(existing: &Tag, observed: &Tag, now: DateTime<Utc>) -> Tag {
    let mut merged = existing.clone();
    merged.occurrence_count += observed.occurrence_count;
    merged.last_seen_at = now;
    if !observed.data_type.is_null() {
        merged.data_type = observed.data_type;
        merged.sample_value = observed.sample_value.clone();
    }
    merged
}

/// Write an analyzer's tags into `catalog` and report the drift
///
/// # Errors
///
/// Returns an error only if the catalog cannot be read. Individual tag write
/// failures are counted in [`DriftReport::errors`].
pub fn apply_to_catalog<C: TagCatalog + ?Sized>(
    catalog: &mut C,
    collection: &str,
    analyzer: SchemaAnalyzer,
    now: DateTime<Utc>,
) -> Result<DriftReport, ExError> {
    let started = Instant::now();
    log_op_start!(OP, collection = collection);

    let known = match catalog.tag_catalog(collection) {
        Ok(known) => known,
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

    let mut report = DriftReport::default();
    for (path, observed) in analyzer.into_tags() {
        report.paths_observed += 1;

        let (tag, is_new) = match known.get(&path) {
            Some(existing) => {
                let merged = merge_tag(existing, &observed, now);
                if !existing.data_type.is_null()
                    && !merged.data_type.is_null()
                    && existing.data_type != merged.data_type
                {
                    report.type_changes.push(TypeChange {
                        path: path.clone(),
                        from: existing.data_type,
                        to: merged.data_type,
                    });
                }
                (merged, false)
            }
            None => (observed, true),
        };

        match catalog.upsert_tag(collection, &tag) {
            Ok(()) if is_new => {
                tracing::info!(
                    op = OP,
                    collection = collection,
                    tag_path = path.as_str(),
                    data_type = tag.data_type.as_str(),
                    "new field detected"
                );
                report.new_paths.push(path);
            }
            Ok(()) => report.updated_paths += 1,
            Err(e) => {
                report.errors += 1;
                tracing::warn!(
                    op = OP,
                    collection = collection,
                    tag_path = path.as_str(),
                    err_code = e.code(),
                    "tag write failed: {}",
                    e
                );
            }
        }
    }

    log_op_end!(
        OP,
        duration_ms = started.elapsed().as_millis() as u64,
        collection = collection,
        paths_observed = report.paths_observed,
        new_paths = report.new_paths.len(),
        type_changes = report.type_changes.len(),
        errors = report.errors
    );

    Ok(report)
}

/// Analyze a whole snapshot and merge it into the catalog in one step
///
/// # Errors
///
/// See [`apply_to_catalog`].
pub fn analyze_snapshot<C: TagCatalog + ?Sized>(
    catalog: &mut C,
    collection: &str,
    records: &[Value],
    limits: &SchemaLimits,
    now: DateTime<Utc>,
) -> Result<DriftReport, ExError> {
    let mut analyzer = SchemaAnalyzer::new(*limits);
    for record in records {
        analyzer.observe(record, now);
    }
    apply_to_catalog(catalog, collection, analyzer, now)
}
