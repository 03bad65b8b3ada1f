//! Command orchestration layer.
//!
//! Coordinates the core reconciliation and drift logic with the SQLite
//! store. `sync` writes; `query` only reads.

pub mod query;
pub mod sync;
