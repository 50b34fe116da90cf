//! Shared key generation for storage backends.
//!
//! Original keys are date-partitioned: `{yyyy}/{mm}/{dd}/{uuid}_{filename}`.
//! Variant keys nest under the original's date partition by prefixing the
//! final path component with `variants/{variant}/`.

use chrono::Utc;
use uuid::Uuid;

/// Sanitize a client-supplied filename for use inside a storage key.
///
/// Strips any directory components, rejects traversal sequences, and reduces
/// the character set to alphanumerics plus `.`, `-`, `_`.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let path = std::path::Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Generate a storage key for a new original object.
///
/// Keys are partitioned by upload date and made unique with a fresh UUID:
/// `{yyyy}/{mm}/{dd}/{uuid}_{filename}`. Concurrent uploads of the same
/// filename therefore never collide.
pub fn generate_storage_key(filename: &str) -> String {
    let now = Utc::now();
    format!(
        "{}/{}_{}",
        now.format("%Y/%m/%d"),
        Uuid::new_v4(),
        sanitize_filename(filename)
    )
}

/// Derive the storage key for a named variant of an original key.
///
/// The final path component is prefixed with `variants/{variant}/`, keeping
/// variants next to their original. A key with no slash falls back to
/// `variants/{variant}/{key}`. Derivation is deterministic, so reprocessing
/// overwrites earlier variant objects instead of leaking new ones.
pub fn variant_storage_key(original_key: &str, variant: &str) -> String {
    match original_key.rsplit_once('/') {
        Some((prefix, last)) => format!("{}/variants/{}/{}", prefix, variant, last),
        None => format!("variants/{}/{}", variant, original_key),
    }
}
