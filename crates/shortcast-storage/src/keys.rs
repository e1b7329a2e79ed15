//! Object key generation.
//!
//! Key format: `{folder}/{unix_seconds}_{suffix}_{filename}` where `suffix` is
//! eight random hex characters, so two uploads of the same filename in the
//! same second still get distinct keys.

use chrono::{DateTime, Utc};
use shortcast_models::{MediaFolder, ObjectKey};
use uuid::Uuid;

/// Length of the random disambiguator.
const SUFFIX_LEN: usize = 8;

/// Generate a new object key for an upload.
pub fn generate_object_key(folder: MediaFolder, filename: &str, now: DateTime<Utc>) -> ObjectKey {
    let suffix = Uuid::new_v4().simple().to_string();
    ObjectKey::from_string(format!(
        "{}/{}_{}_{}",
        folder.as_str(),
        now.timestamp(),
        &suffix[..SUFFIX_LEN],
        sanitize_filename(filename)
    ))
}

/// Make a client filename safe to embed as the last key segment.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
