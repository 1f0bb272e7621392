//! Acquisition run orchestration
//!
//! A run moves through `Idle → Authenticating → Collecting → Notifying →
//! Idle`. Inside `Collecting`, every planned mode runs its own
//! fetch → normalize → detect changes → persist pipeline:
//!
//! 1. **Authentication** failure aborts the run and is the only run-level
//!    error ([`CollectError::Auth`])
//! 2. **Mode failures** (fetch or write) are recorded in the [`RunReport`]
//!    and never stop the other modes
//! 3. **Notifications** are best-effort and cannot change the outcome
//!
//! # Quick Start
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
//!     CollectorConfig::default().with_parallel(false),
//! );
//!
//! let report = collector.run("1300000000").await?;
//! for mode in report.failed_modes() {
//!     eprintln!("{mode} failed");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod report;

pub use crate::store::PersistStatus;
pub use config::CollectorConfig;
pub use executor::Collector;
pub use report::{
    CollectedMode, ModeError, ModeOutcome, ModeStage, ModeSummary, RunReport, RunState, RunSummary,
};

use crate::session::AuthError;

/// Run-level errors
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// No valid session could be established
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The configuration plans no modes
    #[error("no modes selected")]
    NoModes,
}
