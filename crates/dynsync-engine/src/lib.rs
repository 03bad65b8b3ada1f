//! dynsync engine - orchestration layer
//!
//! Coordinates one collection run end to end: read the snapshot, guard
//! against empty snapshots, reconcile records, analyze schema drift, derive
//! the run status and append the sync log entry.

pub mod commands;
pub mod config;
pub mod source;

pub use commands::query::{list_tags, sync_history};
pub use commands::sync::{sync_collection, SyncOptions, SyncReport};
pub use config::{AppConfig, CollectionSpec};
pub use source::{JsonFileSource, SnapshotSource, StaticSource};
