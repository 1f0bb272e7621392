//! # ZZZ Records Archiver Library
//!
//! Periodically fetches a player's end-game battle records from the HoYoLAB
//! game-record API, normalizes the heterogeneous response schemas into one
//! stable shape and archives them as one JSON file per season.
//!
//! ## Features
//!
//! - **Three modes**: Deadly Assault, Shiyu Defense (legacy and v2 schemas) and Void Front
//! - **Season-addressed storage**: one file per mode and season, plus a per-player "latest" mirror
//! - **Idempotent writes**: content comparison that ignores the export timestamp
//! - **Partial failure tolerance**: one mode failing never aborts the others
//! - **Legacy migration**: old `month-week` file names are renamed to the windowed scheme
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use zzz_records_archiver::collector::{Collector, CollectorConfig};
//! use zzz_records_archiver::notify::LogNotifier;
//! use zzz_records_archiver::session::CookieFileAuthenticator;
//! use zzz_records_archiver::store::ArtifactStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let collector = Collector::new(
//!     ArtifactStore::new("./data"),
//!     Arc::new(CookieFileAuthenticator::new(".session/cookies.json")),
//!     Arc::new(LogNotifier),
//!     CollectorConfig::default(),
//! );
//!
//! let report = collector.run("1300000000").await?;
//! println!("{} mode(s) collected", report.succeeded_modes().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`time_codec`] - API time values to canonical `YYYY-MM-DD` dates
//! - [`season`] - Season identifiers, season windows and file names
//! - [`payload`] - Raw responses, classified once at ingestion
//! - [`normalize`] - Shiyu v2 to legacy schema conversion
//! - [`canonical`] / [`change`] - Stable serialization and redundant-write detection
//! - [`schedule`] - Per-mode reset cadence
//! - [`fetcher`] / [`session`] - HTTP client and credentials
//! - [`store`] - File-system artifact store
//! - [`notify`] - Run notifications
//! - [`collector`] - The acquisition run itself

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical serialization and content digests
pub mod canonical;

/// Redundant-write detection
pub mod change;

/// CLI command implementations
pub mod cli;

/// Acquisition run orchestration
pub mod collector;

/// Game-record API clients
pub mod fetcher;

/// Shiyu Defense schema normalization
pub mod normalize;

/// Run notifications
pub mod notify;

/// Raw per-mode API payloads
pub mod payload;

/// Per-mode reset schedules
pub mod schedule;

/// Season identifiers, windows and file names
pub mod season;

/// Session credentials and authentication
pub mod session;

/// File-system artifact store
pub mod store;

/// API time value conversion
pub mod time_codec;

// Re-export commonly used types
pub use normalize::{normalize, CanonicalModeRecord};
pub use payload::RawModePayload;
pub use season::SeasonWindow;

/// Competitive game mode tracked by the archiver
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Mode {
    /// Deadly Assault (boss score attack, fixed 14-day cycle)
    #[serde(rename = "deadly_assault")]
    DeadlyAssault,
    /// Shiyu Defense / Hadal Blacksite (floor challenge, legacy and v2 schemas)
    #[serde(rename = "shiyu_defense")]
    ShiyuDefense,
    /// Void Front (no fixed cycle)
    #[serde(rename = "void_front")]
    VoidFront,
}

impl Mode {
    /// All modes, in fetch order
    pub const ALL: [Mode; 3] = [Mode::DeadlyAssault, Mode::ShiyuDefense, Mode::VoidFront];

    /// Name used for per-mode directories and file name prefixes
    pub fn file_stem(&self) -> &'static str {
        match self {
            Mode::DeadlyAssault => "deadly-assault",
            Mode::ShiyuDefense => "shiyu-defense",
            Mode::VoidFront => "void-front",
        }
    }

    /// Name stored in `metadata.type` and used for latest mirror file names
    pub fn type_name(&self) -> &'static str {
        match self {
            Mode::DeadlyAssault => "deadly_assault",
            Mode::ShiyuDefense => "shiyu_defense",
            Mode::VoidFront => "void_front",
        }
    }

    /// Short key accepted on the command line
    pub fn short_name(&self) -> &'static str {
        match self {
            Mode::DeadlyAssault => "deadly",
            Mode::ShiyuDefense => "shiyu",
            Mode::VoidFront => "voidfront",
        }
    }

    /// Whether the payload carries a season window usable for deduplication
    ///
    /// Void Front has no fixed cycle, so its archive file is rewritten on
    /// every successful fetch.
    pub fn has_season_window(&self) -> bool {
        !matches!(self, Mode::VoidFront)
    }

    /// Resolve a mode from its file stem (`deadly-assault`, ...)
    pub fn from_file_stem(stem: &str) -> Option<Mode> {
        Mode::ALL.into_iter().find(|m| m.file_stem() == stem)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.file_stem())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deadly" | "deadly-assault" | "deadly_assault" => Ok(Mode::DeadlyAssault),
            "shiyu" | "shiyu-defense" | "shiyu_defense" | "hadal" => Ok(Mode::ShiyuDefense),
            "voidfront" | "void-front" | "void_front" => Ok(Mode::VoidFront),
            _ => Err(format!(
                "Invalid mode: {s}. Valid options: deadly, shiyu, voidfront"
            )),
        }
    }
}
