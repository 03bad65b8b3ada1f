//! Collection sync orchestration.
//!
//! ## Pipeline (in order):
//! 1. Resolve the collection from configuration
//! 2. Fetch the snapshot from the source
//! 3. Empty-snapshot guard (hard stop, no writes)
//! 4. Reconcile records (per-record failures are counted, not fatal)
//! 5. Analyze schema drift against the tag catalog
//! 6. Derive the run status from the error ratio
//! 7. Append the sync log entry (skipped in dry run)
//!
//! A run that aborts in steps 1-4 is still recorded in the sync log with
//! status `ERROR` before the error is returned.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use dynsync_core::adapter::DryRun;
use dynsync_core::drift::{analyze_snapshot, DriftReport};
use dynsync_core::errors::{ExError, SyncError};
use dynsync_core::reconcile::{reconcile, ReconcileOutcome, RunStatus, SyncSummary};
use dynsync_core::{log_op_end, log_op_error, log_op_start};
use dynsync_core_types::RunId;
use dynsync_store::errors::Result;
use dynsync_store::repo::sync_log::{self, SyncLogEntry};
use dynsync_store::SqliteStore;
use rusqlite::Connection;
use std::time::Instant;

use crate::config::{AppConfig, CollectionSpec};
use crate::source::SnapshotSource;

const OP: &str = "sync_collection";

/// Options for a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Classify and analyze without writing records, tags or the sync log.
    pub dry_run: bool,
    /// Accept an empty snapshot even if the collection does not allow it.
    pub allow_empty: bool,
}

/// Result of a completed (not aborted) sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub run_id: RunId,
    pub collection: String,
    pub status: RunStatus,
    pub outcome: ReconcileOutcome,
    pub drift: DriftReport,
    pub dry_run: bool,
    pub execution_time_ms: u64,
    /// Sync log row id (`None` in dry run)
    pub log_id: Option<i64>,
}

impl SyncReport {
    pub fn summary(&self) -> &SyncSummary {
        &self.outcome.summary
    }
}

/// Run one collection end to end.
///
/// `now` is stamped on every record, tag and log row written by the run.
///
/// # Errors
///
/// Returns an error when the collection is unknown, the snapshot cannot be
/// read or decoded, the snapshot is empty and not allowed to be, or the
/// persisted state cannot be read. Per-record failures do not abort the run;
/// they are reflected in the returned status.
pub fn sync_collection(
    conn: &Connection,
    config: &AppConfig,
    collection: &str,
    source: &dyn SnapshotSource,
    options: &SyncOptions,
    now: DateTime<Utc>,
) -> Result<SyncReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    log_op_start!(
        OP,
        collection = collection,
        run_id = run_id.as_str(),
        dry_run = options.dry_run
    );

    match run(conn, config, collection, source, options, now) {
        Ok((outcome, drift)) => {
            let mut status =
                RunStatus::from_summary(&outcome.summary, config.thresholds.fail_error_ratio);
            if drift.errors > 0 && status == RunStatus::Success {
                status = RunStatus::Warning;
            }
            let execution_time_ms = start.elapsed().as_millis() as u64;

            let log_id = if options.dry_run {
                None
            } else {
                let entry = SyncLogEntry {
                    id: None,
                    run_id: run_id.clone(),
                    collection: collection.to_string(),
                    status,
                    summary: outcome.summary,
                    new_tag_count: drift.new_paths.len() as u64,
                    message: run_message(&outcome, &drift),
                    execution_time_ms,
                    synced_at: now,
                };
                Some(sync_log::append(conn, &entry).map_err(|e| e.with_run_id(run_id.clone()))?)
            };

            let s = &outcome.summary;
            log_op_end!(
                OP,
                duration_ms = execution_time_ms,
                collection = collection,
                run_id = run_id.as_str(),
                status = status.as_str(),
                total_processed = s.total_processed,
                new = s.new,
                updated = s.updated,
                unchanged = s.unchanged,
                deleted = s.deleted,
                errors = s.errors,
                new_tags = drift.new_paths.len()
            );

            Ok(SyncReport {
                run_id,
                collection: collection.to_string(),
                status,
                outcome,
                drift,
                dry_run: options.dry_run,
                execution_time_ms,
                log_id,
            })
        }
        Err(e) => {
            let e = e.with_run_id(run_id.clone());
            let execution_time_ms = start.elapsed().as_millis() as u64;
            if !options.dry_run {
                record_abort(conn, &run_id, collection, &e, execution_time_ms, now);
            }
            log_op_error!(
                OP,
                e.clone(),
                duration_ms = execution_time_ms,
                collection = collection,
                run_id = run_id.as_str()
            );
            Err(e)
        }
    }
}

fn run(
    conn: &Connection,
    config: &AppConfig,
    collection: &str,
    source: &dyn SnapshotSource,
    options: &SyncOptions,
    now: DateTime<Utc>,
) -> Result<(ReconcileOutcome, DriftReport)> {
    let spec = config.collection(collection)?;
    let records = source.fetch(spec)?;
    guard_empty(spec, &records, options)?;

    let mut store = SqliteStore::new(conn);
    let (outcome, drift) = if options.dry_run {
        let mut dry = DryRun::new(&store);
        let outcome = reconcile(&mut dry, collection, &spec.key, &records, now)?;
        let drift = analyze(&mut dry, config, collection, &records, now);
        (outcome, drift)
    } else {
        let outcome = reconcile(&mut store, collection, &spec.key, &records, now)?;
        let drift = analyze(&mut store, config, collection, &records, now);
        (outcome, drift)
    };
    Ok((outcome, drift))
}

fn guard_empty(
    spec: &CollectionSpec,
    records: &[serde_json::Value],
    options: &SyncOptions,
) -> Result<()> {
    if records.is_empty() && !spec.allow_empty_snapshot && !options.allow_empty {
        return Err(ExError::from(SyncError::EmptySnapshot {
            collection: spec.name.clone(),
        })
        .with_op(OP));
    }
    Ok(())
}

/// Schema analysis never aborts a run whose records were already reconciled
fn analyze<C: dynsync_core::adapter::TagCatalog + ?Sized>(
    catalog: &mut C,
    config: &AppConfig,
    collection: &str,
    records: &[serde_json::Value],
    now: DateTime<Utc>,
) -> DriftReport {
    match analyze_snapshot(catalog, collection, records, &config.schema, now) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(
                op = OP,
                collection = collection,
                err_code = e.code(),
                "schema analysis failed: {}",
                e
            );
            DriftReport {
                errors: 1,
                ..DriftReport::default()
            }
        }
    }
}

/// Human-readable summary stored with the log row
fn run_message(outcome: &ReconcileOutcome, drift: &DriftReport) -> Option<String> {
    let s = &outcome.summary;
    let mut parts = Vec::new();
    if s.errors > 0 {
        let first = outcome
            .failures()
            .next()
            .map(|e| format!("; first: {}", e))
            .unwrap_or_default();
        parts.push(format!(
            "{} of {} records failed{}",
            s.errors, s.total_processed, first
        ));
    }
    if !drift.new_paths.is_empty() {
        parts.push(format!("new fields: {}", drift.new_paths.join(", ")));
    }
    if drift.errors > 0 {
        parts.push(format!("{} tag writes failed", drift.errors));
    }
    (!parts.is_empty()).then(|| parts.join(" | "))
}

fn record_abort(
    conn: &Connection,
    run_id: &RunId,
    collection: &str,
    err: &ExError,
    execution_time_ms: u64,
    now: DateTime<Utc>,
) {
    let entry = SyncLogEntry {
        id: None,
        run_id: run_id.clone(),
        collection: collection.to_string(),
        status: RunStatus::Error,
        summary: SyncSummary::default(),
        new_tag_count: 0,
        message: Some(err.to_string()),
        execution_time_ms,
        synced_at: now,
    };
    if let Err(log_err) = sync_log::append(conn, &entry) {
        tracing::warn!(
            op = OP,
            collection = collection,
            err_code = log_err.code(),
            "could not record aborted run: {}",
            log_err
        );
    }
}
