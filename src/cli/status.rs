//! Status command implementation

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::{print_json, selected_modes, Cli, CliError, OutputFormat};
use crate::schedule::ResetSchedule;
use crate::store::ArtifactStore;
use crate::Mode;

/// Status command arguments
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Player UID; also shows the latest mirror of this player
    #[arg(long, env = "ZZZ_UID")]
    pub uid: Option<String>,

    /// Modes to show (comma-separated; default: all)
    #[arg(long, value_delimiter = ',')]
    pub modes: Vec<Mode>,
}

/// Reset cycle position of a mode
#[derive(Debug, Clone, Serialize)]
pub struct CycleStatus {
    /// Days since the last reset
    pub days_since_reset: i64,
    /// Days until the next reset
    pub days_until_reset: i64,
    /// Date of the next reset
    pub next_reset: NaiveDate,
}

/// Latest stored artifact of a mode
#[derive(Debug, Clone, Serialize)]
pub struct StoredStatus {
    /// Artifact file
    pub path: PathBuf,
    /// Export timestamp
    pub export_date: String,
    /// Season identifier
    pub season_id: Option<String>,
}

/// Status line of one mode
#[derive(Debug, Clone, Serialize)]
pub struct ModeStatus {
    /// Mode
    pub mode: Mode,
    /// Cycle position; absent for modes without a fixed cycle
    pub cycle: Option<CycleStatus>,
    /// Newest season file
    pub latest: Option<StoredStatus>,
    /// Export date of the player's latest mirror
    pub mirror_export_date: Option<String>,
}

/// Collect the status of `modes` at `now`
pub fn mode_statuses(
    store: &ArtifactStore,
    modes: &[Mode],
    uid: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Vec<ModeStatus>, CliError> {
    let mut statuses = Vec::with_capacity(modes.len());

    for &mode in modes {
        let cycle = ResetSchedule::for_mode(mode).map(|schedule| CycleStatus {
            days_since_reset: schedule.days_since_reset(now),
            days_until_reset: schedule.days_until_reset(now),
            next_reset: schedule.next_reset(now),
        });

        let latest = store
            .read_latest_entry(mode)?
            .map(|(path, artifact)| StoredStatus {
                path,
                season_id: artifact.season_id(),
                export_date: artifact.metadata.export_date,
            });

        let mirror_export_date = match uid {
            Some(uid) => store
                .read_latest_mirror(mode, uid)?
                .map(|mirror| mirror.metadata.export_date),
            None => None,
        };

        statuses.push(ModeStatus {
            mode,
            cycle,
            latest,
            mirror_export_date,
        });
    }

    Ok(statuses)
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let store = ArtifactStore::new(&cli.data_dir);
        let statuses = mode_statuses(
            &store,
            &selected_modes(&self.modes),
            self.uid.as_deref(),
            Utc::now(),
        )?;

        match cli.output_format {
            OutputFormat::Json => print_json(&statuses),
            OutputFormat::Human => {
                output_human(&statuses);
                Ok(())
            }
        }
    }
}

fn output_human(statuses: &[ModeStatus]) {
    for status in statuses {
        println!("{}", status.mode);

        match &status.cycle {
            Some(cycle) => println!(
                "  reset: {} day(s) ago, next in {} day(s) on {}",
                cycle.days_since_reset, cycle.days_until_reset, cycle.next_reset
            ),
            None => println!("  reset: no fixed cycle"),
        }

        match &status.latest {
            Some(latest) => println!(
                "  latest: {} (season {}, exported {})",
                latest.path.display(),
                latest.season_id.as_deref().unwrap_or("unknown"),
                latest.export_date
            ),
            None => println!("  latest: none"),
        }

        if let Some(export_date) = &status.mirror_export_date {
            println!("  mirror: exported {export_date}");
        }
    }
}
