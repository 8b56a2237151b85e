//! # Content Digest
//!
//! The stable content hash recorded in every index entry as `hash_sha256`.
//!
//! ## Invariant
//!
//! The digest is computed over the exact bytes of a record file. Two files
//! with identical bytes always produce the same digest, regardless of their
//! names or locations. The digest detects changes between registry runs; it
//! is not an authentication mechanism.

use sha2::{Digest, Sha256};

/// Compute the 64-character lowercase hex SHA-256 of raw bytes.
///
/// This is the form stored in index entries.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
