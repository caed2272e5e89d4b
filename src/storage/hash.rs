//! Content hashing for change detection.
//!
//! The serialized JSON of a value is hashed with SHA256, giving a cheap
//! fingerprint of the cached issue set.

use crate::error::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA256 of the JSON serialization of `value`, as lowercase hex.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// True when there is no stored hash or it differs from `current_hash`.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}
