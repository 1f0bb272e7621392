//! CLI command implementations

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

pub mod collect;
pub mod error;
pub mod migrate;
pub mod status;

pub use collect::CollectArgs;
pub use error::CliError;
pub use migrate::MigrateArgs;
pub use status::StatusArgs;

use crate::Mode;

/// ZZZ battle records archiver CLI
#[derive(Parser, Debug)]
#[command(name = "zzz-records-archiver")]
#[command(
    about = "Archive Zenless Zone Zero end-game battle records from HoYoLAB",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Data root directory
    #[arg(long, global = true, env = "ZZZ_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every mode and archive changed records
    Collect(CollectArgs),

    /// Rename legacy month-week files to the windowed scheme
    Migrate(MigrateArgs),

    /// Show reset cycle positions and the latest stored records
    Status(StatusArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Selected modes, or every mode when none were given
pub(crate) fn selected_modes(modes: &[Mode]) -> Vec<Mode> {
    if modes.is_empty() {
        Mode::ALL.to_vec()
    } else {
        modes.to_vec()
    }
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| CliError::Serialization(e.to_string()))?;
    println!("{text}");
    Ok(())
}
