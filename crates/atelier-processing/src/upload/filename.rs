//! Content-addressed attachment names.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

const NAME_LENGTH: usize = 32;

/// Derive a stored filename from `hash(size + base name + time)`, lower-cased,
/// with `extension` appended.
///
/// `original_name` is reduced to its base name first, so client-side path
/// components never reach the store.
pub fn candidate_name(size: u64, original_name: &str, at: DateTime<Utc>, extension: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(original_name);

    let mut hasher = Sha256::new();
    hasher.update(size.to_string().as_bytes());
    hasher.update(base.as_bytes());
    hasher.update(
        at.timestamp_nanos_opt()
            .unwrap_or_else(|| at.timestamp_micros())
            .to_string()
            .as_bytes(),
    );
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}.{}",
        &digest[..NAME_LENGTH],
        extension.to_lowercase()
    )
}

/// Random name used once the content-addressed candidates are exhausted
pub fn fallback_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), extension.to_lowercase())
}
