//! Migrate command implementation

use clap::Args;

use super::{print_json, selected_modes, Cli, CliError, OutputFormat};
use crate::store::{migrate_legacy_files, ArtifactStore, MigrationReport, RunLock, SkipReason};
use crate::Mode;

/// Migrate command arguments
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Modes to migrate (comma-separated; default: all)
    #[arg(long, value_delimiter = ',')]
    pub modes: Vec<Mode>,

    /// Only report what would be renamed
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let store = ArtifactStore::new(&cli.data_dir);
        let mut lock = RunLock::open(store.root())?;
        let _guard = lock.try_acquire()?;

        let report = migrate_legacy_files(&store, &selected_modes(&self.modes), self.dry_run)?;

        match cli.output_format {
            OutputFormat::Json => print_json(&report),
            OutputFormat::Human => {
                output_human(&report);
                Ok(())
            }
        }
    }
}

fn output_human(report: &MigrationReport) {
    if report.is_empty() {
        println!("No legacy files found.");
        return;
    }

    let verb = if report.dry_run { "Would rename" } else { "Renamed" };
    println!("{verb} {} file(s), skipped {}", report.renamed.len(), report.skipped.len());

    for renamed in &report.renamed {
        println!("  {} -> {}", renamed.from.display(), renamed.to.display());
    }
    for skipped in &report.skipped {
        let reason = match &skipped.reason {
            SkipReason::Unreadable(e) => format!("unreadable ({e})"),
            SkipReason::WindowUndecidable => "season window undecidable".to_string(),
            SkipReason::TargetExists(target) => format!("target exists ({})", target.display()),
        };
        println!("  skipped {}: {reason}", skipped.path.display());
    }
}
