//! On-disk artifact format
//!
//! ```json
//! {
//!   "retcode": 0,
//!   "message": "OK",
//!   "data": { ... },
//!   "metadata": {
//!     "exportDate": "2025-08-01T09:30:00.000Z",
//!     "uid": "1300000000",
//!     "type": "deadly_assault",
//!     "automated": true
//!   }
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::CanonicalModeRecord;
use crate::payload::RawModePayload;
use crate::season::{resolve_season_id, resolve_season_window, SeasonWindow};
use crate::Mode;

/// Provenance of a stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// When the data was fetched (ISO-8601, UTC)
    pub export_date: String,
    /// Player UID
    pub uid: String,
    /// Mode of the artifact
    #[serde(rename = "type")]
    pub mode: Mode,
    /// Whether a scheduled run produced the artifact
    pub automated: bool,
}

/// A canonical record wrapped with metadata, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// API result code
    #[serde(default)]
    pub retcode: i64,
    /// API message
    #[serde(default)]
    pub message: String,
    /// Normalized data
    pub data: Map<String, Value>,
    /// Provenance
    pub metadata: Metadata,
}

/// Format an export timestamp the way artifacts store it
pub fn format_export_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl StoredArtifact {
    /// Wrap a record with metadata
    pub fn new(
        record: CanonicalModeRecord,
        uid: &str,
        automated: bool,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            retcode: record.retcode,
            message: record.message,
            data: record.data,
            metadata: Metadata {
                export_date: format_export_date(exported_at),
                uid: uid.to_string(),
                mode: record.mode,
                automated,
            },
        }
    }

    /// Mode recorded in the metadata
    pub fn mode(&self) -> Mode {
        self.metadata.mode
    }

    /// JSON value of the artifact, as compared and written
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Re-classify the stored data as a payload of its mode
    pub fn to_payload(&self) -> RawModePayload {
        RawModePayload::from_parts(
            self.mode(),
            self.retcode,
            self.message.clone(),
            self.data.clone(),
        )
    }

    /// Season identifier of the stored data
    pub fn season_id(&self) -> Option<String> {
        resolve_season_id(&self.to_payload())
    }

    /// Season window of the stored data
    pub fn season_window(&self) -> SeasonWindow {
        resolve_season_window(&self.to_payload())
    }
}
