//! Sync command
//!
//! Usage: dynsync sync --collection <NAME> --input <FILE> [--dry-run] [--allow-empty]

use chrono::Utc;
use clap::Args;
use dynsync_core::drift::render_drift_summary;
use dynsync_core::reconcile::RunStatus;
use dynsync_engine::{sync_collection, JsonFileSource, SyncOptions, SyncReport};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Configured collection name
    #[arg(long)]
    pub collection: String,

    /// Snapshot file: a JSON array or an OData `{"value": [...]}` response
    #[arg(long)]
    pub input: PathBuf,

    /// Classify and analyze without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Accept an empty snapshot (tombstones every record)
    #[arg(long)]
    pub allow_empty: bool,
}

pub fn execute(args: SyncArgs, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (config, conn) = super::open(config)?;
    let options = SyncOptions {
        dry_run: args.dry_run,
        allow_empty: args.allow_empty,
    };

    let report = sync_collection(
        &conn,
        &config,
        &args.collection,
        &JsonFileSource::new(&args.input),
        &options,
        Utc::now(),
    )?;

    print!("{}", render_report(&report));

    if report.status == RunStatus::Error {
        return Err(format!(
            "{} of {} records failed",
            report.summary().errors,
            report.summary().total_processed
        )
        .into());
    }
    Ok(())
}

fn render_report(report: &SyncReport) -> String {
    let s = report.summary();
    let mut out = format!(
        "{}{} '{}' [{}] in {} ms\n",
        if report.dry_run { "(dry run) " } else { "" },
        report.status,
        report.collection,
        report.run_id,
        report.execution_time_ms
    );
    out.push_str(&format!(
        "  processed: {}, new: {}, updated: {}, unchanged: {}, deleted: {}, resurrected: {}, errors: {}\n",
        s.total_processed, s.new, s.updated, s.unchanged, s.deleted, s.resurrected, s.errors
    ));
    for failure in report.outcome.failures() {
        out.push_str(&format!("  ! {}\n", failure));
    }
    out.push_str(&render_drift_summary(&report.collection, &report.drift));
    out
}
