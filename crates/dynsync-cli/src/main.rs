//! dynsync CLI
//!
//! Command-line interface for incremental collection sync

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "dynsync")]
#[command(about = "dynsync - Incremental snapshot sync with schema drift tracking", long_about = None)]
struct Cli {
    /// Config file (default: ./dynsync.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile a collection against a snapshot file
    Sync(commands::sync::SyncArgs),
    /// List the schema tags of a collection
    Tags(commands::tags::TagsArgs),
    /// Show recent sync runs
    History(commands::history::HistoryArgs),
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Sync(args) => commands::sync::execute(args, config),
        Commands::Tags(args) => commands::tags::execute(args, config),
        Commands::History(args) => commands::history::execute(args, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
