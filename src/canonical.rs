//! Canonical serialization of stored artifacts
//!
//! The canonical form is the compact JSON encoding of a value with every
//! object's keys sorted and the volatile fields in [`VOLATILE_FIELDS`]
//! removed. Change detection and content digests both use it, so the list
//! of ignored fields is defined once, here.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Field paths that differ run-to-run for otherwise identical data
pub const VOLATILE_FIELDS: &[&[&str]] = &[&["metadata", "exportDate"]];

/// Produce the canonical value: volatile fields stripped, keys sorted
pub fn canonical_value(value: &Value) -> Value {
    let mut stripped = value.clone();
    for path in VOLATILE_FIELDS {
        remove_path(&mut stripped, path);
    }
    sort_keys(&stripped)
}

/// Canonical string encoding, suitable for equality comparison
pub fn canonical_string(value: &Value) -> String {
    canonical_value(value).to_string()
}

/// SHA-256 hex digest of the canonical string
pub fn content_digest(value: &Value) -> String {
    let digest = Sha256::digest(canonical_string(value).as_bytes());
    format!("{digest:x}")
}

/// Recursively rebuild objects with their keys in sorted order
///
/// Array element order is preserved.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, child) in entries {
                sorted.insert(key.clone(), sort_keys(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn remove_path(value: &mut Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = value;
    for key in parents {
        match current.get_mut(*key) {
            Some(child) => current = child,
            None => return,
        }
    }

    if let Value::Object(map) = current {
        map.remove(*last);
    }
}
