//! dynsync store - SQLite persistence adapter
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - `SqliteStore`, implementing the record and tag-catalog adapter traits
//! - The sync log: one row per collection run

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::{SqliteStore, SyncLogEntry};
