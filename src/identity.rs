//! Stable intersection identifiers.

use sha2::{Digest, Sha256};

/// Default number of hex characters kept from the digest.
pub const DEFAULT_ID_LENGTH: usize = 16;

/// Derive an intersection identifier from its display name.
///
/// SHA-256 over the UTF-8 bytes of `name`, lowercase hex, truncated to
/// `length` characters (at most 64).
pub fn hash_intersection_name(name: &str, length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(length.min(digest.len()));
    digest
}

/// [`hash_intersection_name`] with the default length.
pub fn intersection_id(name: &str) -> String {
    hash_intersection_name(name, DEFAULT_ID_LENGTH)
}
