//! History command
//!
//! Usage: dynsync history [--collection <NAME>] [--limit <N>]

use clap::Args;
use dynsync_engine::sync_history;
use dynsync_store::repo::SyncLogQuery;
use std::path::Path;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Restrict to one collection
    #[arg(long)]
    pub collection: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn execute(args: HistoryArgs, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, conn) = super::open(config)?;
    let entries = sync_history(
        &conn,
        &SyncLogQuery {
            collection: args.collection,
            limit: args.limit,
        },
    )?;

    if entries.is_empty() {
        println!("No sync runs recorded");
        return Ok(());
    }
    for entry in &entries {
        let s = &entry.summary;
        println!(
            "{}\t{}\t{}\tprocessed {} new {} updated {} unchanged {} deleted {} errors {}\t{} ms",
            entry.synced_at.to_rfc3339(),
            entry.collection,
            entry.status,
            s.total_processed,
            s.new,
            s.updated,
            s.unchanged,
            s.deleted,
            s.errors,
            entry.execution_time_ms
        );
        if let Some(message) = &entry.message {
            println!("\t{}", message);
        }
    }
    Ok(())
}
