//! Redundant-write detection
//!
//! A freshly fetched artifact is only written when its canonical form
//! differs from the artifact already on disk. The comparison is pure; the
//! caller reads the existing file and passes `None` when it is missing or
//! cannot be parsed.

use crate::canonical::canonical_string;
use serde_json::Value;

/// Outcome of comparing a candidate artifact against the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// Nothing usable is stored yet
    New,
    /// Stored artifact differs
    Changed,
    /// Stored artifact is identical apart from volatile fields
    Unchanged,
}

impl ChangeStatus {
    /// Whether the candidate should be written
    pub fn needs_write(&self) -> bool {
        !matches!(self, ChangeStatus::Unchanged)
    }
}

/// Classify a candidate against the stored artifact
pub fn detect(existing: Option<&Value>, candidate: &Value) -> ChangeStatus {
    match existing {
        None => ChangeStatus::New,
        Some(existing) if canonical_string(existing) == canonical_string(candidate) => {
            ChangeStatus::Unchanged
        }
        Some(_) => ChangeStatus::Changed,
    }
}

/// Whether a candidate differs from the stored artifact
pub fn has_changed(existing: Option<&Value>, candidate: &Value) -> bool {
    detect(existing, candidate).needs_write()
}
