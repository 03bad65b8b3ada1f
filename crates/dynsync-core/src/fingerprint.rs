//! Content fingerprints for snapshot records.
//!
//! A fingerprint is the SHA-256 digest of a record's canonical payload,
//! hex encoded. The reconciliation engine compares fingerprints instead of
//! payloads, so equal payloads must always produce equal digests.
//!
//! ## Canonical form
//!
//! The canonical payload is the compact JSON text of the record with the
//! field order it arrived in (`serde_json` is built with `preserve_order`).
//! Two runs that receive byte-identical upstream output therefore produce the
//! same fingerprints; a reordering of fields upstream counts as a change.

use crate::errors::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize a record into its canonical payload text.
///
/// ## Errors
///
/// Returns `SyncError::Serialization` if JSON serialization fails.
pub fn canonical_payload(record: &Value) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

/// Compute the fingerprint of a canonical payload.
///
/// ## Returns
///
/// Hex-encoded SHA256 digest (64 characters)
///
/// ## Example
///
/// ```
/// use dynsync_core::fingerprint::fingerprint;
///
/// let digest = fingerprint(r#"{"id":"X1","v":1}"#);
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, fingerprint(r#"{"id":"X1","v":1}"#));
/// ```
pub fn fingerprint(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint a decoded record directly.
///
/// ## Errors
///
/// Returns `SyncError::Serialization` if JSON serialization fails.
pub fn fingerprint_value(record: &Value) -> Result<String> {
    canonical_payload(record).map(|payload| fingerprint(&payload))
}
