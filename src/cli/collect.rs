//! Collect command implementation

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{print_json, selected_modes, Cli, CliError, OutputFormat};
use crate::collector::{Collector, CollectorConfig, ModeOutcome, RunReport};
use crate::fetcher::shared_resources::global_http_client;
use crate::notify::{
    LogNotifier, NotificationSink, Notifier, WebhookNotifier, DEFAULT_NOTIFY_TIMEOUT,
};
use crate::session::CookieFileAuthenticator;
use crate::store::{ArtifactStore, FileNaming, PersistStatus, RunLock};
use crate::Mode;

/// Collect command arguments
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Player UID
    #[arg(long, env = "ZZZ_UID")]
    pub uid: String,

    /// Cookie file written by the login tool
    #[arg(long, env = "ZZZ_COOKIE_FILE", default_value = ".session/cookies.json")]
    pub cookie_file: PathBuf,

    /// Cookie header string; takes precedence over the cookie file
    #[arg(long, env = "HOYOLAB_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Webhook URL for run notifications
    #[arg(long, env = "ZZZ_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Override the game-record API root
    #[arg(long, env = "ZZZ_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Modes to collect (comma-separated: deadly, shiyu, voidfront; default: all)
    #[arg(long, value_delimiter = ',')]
    pub modes: Vec<Mode>,

    /// Fetch modes one after another instead of concurrently
    #[arg(long, default_value_t = false)]
    pub sequential: bool,

    /// Season file naming: season-id or window
    #[arg(long, default_value = "season-id")]
    pub naming: FileNaming,

    /// Mark artifacts as manually collected
    #[arg(long, default_value_t = false)]
    pub manual: bool,
}

impl CollectArgs {
    /// Execute the collect command
    ///
    /// Failures other than authentication (which the run reports itself)
    /// get a best-effort run-failed notification before being returned.
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let notifier = self.build_notifier()?;

        let result = self.run(cli, notifier.clone()).await;
        if let Err(e) = &result {
            if !e.is_auth_failure() {
                NotificationSink::new(notifier, DEFAULT_NOTIFY_TIMEOUT)
                    .run_failed(&e.to_string(), &self.uid)
                    .await;
            }
        }
        result
    }

    fn build_notifier(&self) -> Result<Arc<dyn Notifier>, CliError> {
        Ok(match &self.webhook_url {
            Some(url) if !url.trim().is_empty() => {
                Arc::new(WebhookNotifier::new(global_http_client()?, url.trim()))
            }
            _ => Arc::new(LogNotifier),
        })
    }

    fn authenticator(&self) -> CookieFileAuthenticator {
        let authenticator =
            CookieFileAuthenticator::new(&self.cookie_file).with_cookie(self.cookie.clone());
        match &self.api_base_url {
            Some(url) => authenticator.with_base_url(url.as_str()),
            None => authenticator,
        }
    }

    fn config(&self) -> CollectorConfig {
        CollectorConfig::default()
            .with_modes(selected_modes(&self.modes))
            .with_parallel(!self.sequential)
            .with_naming(self.naming)
            .with_automated(!self.manual)
    }

    async fn run(&self, cli: &Cli, notifier: Arc<dyn Notifier>) -> Result<(), CliError> {
        let store = ArtifactStore::new(&cli.data_dir);
        let mut lock = RunLock::open(store.root())?;
        let _guard = lock.try_acquire()?;

        info!(data_dir = %cli.data_dir.display(), uid = %self.uid, "Collect command started");

        let collector =
            Collector::new(store, Arc::new(self.authenticator()), notifier, self.config());
        let report = collector.run(&self.uid).await?;

        match cli.output_format {
            OutputFormat::Json => print_json(&report.summary()),
            OutputFormat::Human => {
                output_human(&report);
                Ok(())
            }
        }
    }
}

fn output_human(report: &RunReport) {
    println!(
        "\nCollection for UID {} finished: {} collected, {} failed",
        report.uid,
        report.succeeded_modes().len(),
        report.failed_modes().len()
    );

    for (mode, outcome) in report.outcomes() {
        match outcome {
            ModeOutcome::Collected(collected) => {
                let season = collected.season_id.as_deref().unwrap_or("unknown");
                match &collected.archive {
                    PersistStatus::Written { path, .. } => {
                        println!("  {mode:<16} season {season:<8} saved      {}", path.display())
                    }
                    PersistStatus::Unchanged { path } => {
                        println!("  {mode:<16} season {season:<8} unchanged  {}", path.display())
                    }
                }
            }
            ModeOutcome::Failed(e) => println!("  {mode:<16} failed: {e}"),
        }
    }
}
