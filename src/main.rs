//! Main entry point for the zzz-records-archiver CLI

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use zzz_records_archiver::cli::{Cli, Commands};

/// Exit code used when the run is interrupted by Ctrl+C
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("zzz_records_archiver=info"));

    // Logs go to stderr so JSON command output stays clean
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn execute(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Collect(args) => args.execute(cli).await?,
        Commands::Migrate(args) => args.execute(cli).await?,
        Commands::Status(args) => args.execute(cli).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // Writes are atomic, so dropping the run mid-way leaves no partial files
    let result = tokio::select! {
        result = execute(&cli) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl+C received, aborting run");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
