//! Incremental reconciliation engine.
//!
//! Diffs an incoming snapshot of one collection against the persisted
//! fingerprints and drives the persistence adapter accordingly.
//!
//! ## Entry point
//!
//! ```
//! use chrono::Utc;
//! use dynsync_core::adapter::MemoryStore;
//! use dynsync_core::identity::KeySpec;
//! use dynsync_core::reconcile::reconcile;
//! use serde_json::json;
//!
//! let mut store = MemoryStore::new();
//! let incoming = vec![json!({"id": "X1", "v": 1})];
//! let outcome = reconcile(&mut store, "articles", &KeySpec::single("id"), &incoming, Utc::now())?;
//! assert_eq!(outcome.summary.new, 1);
//! # Ok::<(), dynsync_core::errors::ExError>(())
//! ```
//!
//! ## Guarantees
//!
//! - **Idempotence**: reconciling the same snapshot twice classifies every
//!   record as unchanged on the second run and deletes nothing.
//! - **Soft delete only**: identities missing from the snapshot are
//!   tombstoned, never removed; a reappearing identity is revived and is
//!   never classified as new.
//! - **Partial-failure isolation**: a failing record is counted in `errors`
//!   and the run continues.

pub mod engine;
pub mod model;
pub mod status;

pub use engine::reconcile;
pub use model::{Classification, ClassifiedRecord, ReconcileOutcome, RecordResult, SyncSummary};
pub use status::{RunStatus, DEFAULT_FAIL_ERROR_RATIO};
