//! Run states and per-mode outcomes

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::fetcher::FetcherError;
use crate::normalize::CanonicalModeRecord;
use crate::season::SeasonWindow;
use crate::store::{PersistStatus, StoreError};
use crate::Mode;

/// Lifecycle of a collection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run in progress
    #[default]
    Idle,
    /// Establishing a session
    Authenticating,
    /// Per-mode fetch, normalize and persist in progress
    Collecting,
    /// Reporting the outcome
    Notifying,
}

/// Step of a single mode's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeStage {
    /// Waiting on the API
    Fetching,
    /// Converting to the canonical record
    Normalizing,
    /// Comparing with the stored artifact
    DetectingChanges,
    /// Writing files
    Persisting,
}

/// Why a mode produced no record
#[derive(Debug, thiserror::Error)]
pub enum ModeError {
    /// The API call failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetcherError),

    /// The season file could not be written
    #[error("persist failed: {0}")]
    Persist(#[from] StoreError),
}

impl ModeError {
    /// Whether the failure was API throttling
    pub fn is_rate_limit(&self) -> bool {
        match self {
            ModeError::Fetch(e) => e.is_rate_limit(),
            ModeError::Persist(_) => false,
        }
    }
}

/// A mode that was fetched and persisted
#[derive(Debug, Clone)]
pub struct CollectedMode {
    /// Canonical record
    pub record: CanonicalModeRecord,
    /// Resolved season identifier
    pub season_id: Option<String>,
    /// Resolved season window
    pub window: SeasonWindow,
    /// Season file outcome
    pub archive: PersistStatus,
    /// Latest mirror path, if the mirror write succeeded
    pub mirror: Option<PathBuf>,
}

/// Outcome of one mode in a run
#[derive(Debug)]
pub enum ModeOutcome {
    /// Record fetched and persisted
    Collected(CollectedMode),
    /// Mode failed; the run continued without it
    Failed(ModeError),
}

impl ModeOutcome {
    /// Canonical record, if the mode succeeded
    pub fn record(&self) -> Option<&CanonicalModeRecord> {
        match self {
            ModeOutcome::Collected(collected) => Some(&collected.record),
            ModeOutcome::Failed(_) => None,
        }
    }

    /// Whether the mode succeeded
    pub fn is_collected(&self) -> bool {
        matches!(self, ModeOutcome::Collected(_))
    }
}

/// Result of a run whose authentication succeeded
#[derive(Debug)]
pub struct RunReport {
    /// Player UID
    pub uid: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    outcomes: BTreeMap<Mode, ModeOutcome>,
}

impl RunReport {
    /// Assemble a report from per-mode outcomes, in any completion order
    pub fn new(
        uid: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcomes: impl IntoIterator<Item = (Mode, ModeOutcome)>,
    ) -> Self {
        Self {
            uid: uid.into(),
            started_at,
            finished_at,
            outcomes: outcomes.into_iter().collect(),
        }
    }

    /// Outcome of one mode, if it was planned
    pub fn outcome(&self, mode: Mode) -> Option<&ModeOutcome> {
        self.outcomes.get(&mode)
    }

    /// All outcomes in mode order
    pub fn outcomes(&self) -> impl Iterator<Item = (Mode, &ModeOutcome)> {
        self.outcomes.iter().map(|(mode, outcome)| (*mode, outcome))
    }

    /// Canonical record of a mode; `None` when it failed or was not planned
    pub fn record(&self, mode: Mode) -> Option<&CanonicalModeRecord> {
        self.outcome(mode).and_then(ModeOutcome::record)
    }

    /// Modes that produced a record
    pub fn succeeded_modes(&self) -> Vec<Mode> {
        self.outcomes()
            .filter(|(_, outcome)| outcome.is_collected())
            .map(|(mode, _)| mode)
            .collect()
    }

    /// Modes that failed
    pub fn failed_modes(&self) -> Vec<Mode> {
        self.outcomes()
            .filter(|(_, outcome)| !outcome.is_collected())
            .map(|(mode, _)| mode)
            .collect()
    }

    /// Whether any mode was throttled
    pub fn rate_limited(&self) -> bool {
        self.outcomes().any(|(_, outcome)| match outcome {
            ModeOutcome::Failed(e) => e.is_rate_limit(),
            ModeOutcome::Collected(_) => false,
        })
    }

    /// Per-mode data keyed by type name, `null` for failed modes
    pub fn results(&self) -> Value {
        let results: Map<String, Value> = self
            .outcomes()
            .map(|(mode, outcome)| {
                let data = outcome
                    .record()
                    .map(|record| Value::Object(record.data.clone()))
                    .unwrap_or(Value::Null);
                (mode.type_name().to_string(), data)
            })
            .collect();
        Value::Object(results)
    }

    /// Machine-readable summary without the record data
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            uid: self.uid.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            modes: self
                .outcomes()
                .map(|(mode, outcome)| ModeSummary::from_outcome(mode, outcome))
                .collect(),
        }
    }
}

/// Serializable run summary
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Player UID
    pub uid: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Per-mode lines
    pub modes: Vec<ModeSummary>,
}

/// Serializable outcome of one mode
#[derive(Debug, Clone, Serialize)]
pub struct ModeSummary {
    /// Mode
    pub mode: Mode,
    /// `written`, `unchanged` or `failed`
    pub status: &'static str,
    /// Season identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_id: Option<String>,
    /// Season file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Content digest of a written file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModeSummary {
    fn from_outcome(mode: Mode, outcome: &ModeOutcome) -> Self {
        let mut summary = Self {
            mode,
            status: "failed",
            season_id: None,
            path: None,
            digest: None,
            error: None,
        };

        match outcome {
            ModeOutcome::Collected(collected) => {
                summary.season_id = collected.season_id.clone();
                summary.path = Some(collected.archive.path().to_path_buf());
                match &collected.archive {
                    PersistStatus::Written { digest, .. } => {
                        summary.status = "written";
                        summary.digest = Some(digest.clone());
                    }
                    PersistStatus::Unchanged { .. } => summary.status = "unchanged",
                }
            }
            ModeOutcome::Failed(e) => summary.error = Some(e.to_string()),
        }
        summary
    }
}
