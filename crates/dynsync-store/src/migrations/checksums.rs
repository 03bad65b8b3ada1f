//! Checksum validation for migrations
//!
//! A migration's checksum is recorded when it is applied; a later run whose
//! embedded SQL hashes differently is refused.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
