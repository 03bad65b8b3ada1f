//! dynsync core - incremental snapshot reconciliation
//!
//! This crate holds everything that does not touch a database or the network:
//! - Identity extraction (single field or parent + line composite keys)
//! - Content fingerprints over the canonical record payload
//! - The reconciliation engine (new / updated / unchanged / deleted)
//! - The schema drift analyzer and tag catalog merge
//! - Persistence adapter traits, an in-memory adapter and a dry-run wrapper
//! - The error and logging facilities shared by the other crates

pub mod adapter;
pub mod drift;
pub mod errors;
pub mod fingerprint;
pub mod identity;
pub mod logging_facility;
pub mod model;
pub mod reconcile;

// Re-export commonly used types
pub use adapter::{AdapterResult, DryRun, MemoryStore, RecordStore, TagCatalog};
pub use drift::{analyze_snapshot, DriftReport, SchemaAnalyzer, SchemaLimits};
pub use errors::{ExError, ExErrorKind, Result, SyncError};
pub use identity::{identity, KeySpec, UNKNOWN_IDENTITY};
pub use model::{DataType, SnapshotRecord, StoredRecord, Tag};
pub use reconcile::{
    reconcile, Classification, ClassifiedRecord, ReconcileOutcome, RunStatus, SyncSummary,
};
