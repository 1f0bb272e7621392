//! Collection run executor

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::config::CollectorConfig;
use super::report::{CollectedMode, ModeError, ModeOutcome, ModeStage, RunReport, RunState};
use super::CollectError;
use crate::fetcher::{FetcherError, RecordApi};
use crate::normalize::normalize;
use crate::notify::{NotificationSink, Notifier};
use crate::schedule::FetchScheduler;
use crate::season::{resolve_season_id, resolve_season_window};
use crate::session::Authenticator;
use crate::store::{ArtifactStore, PersistStatus, StoredArtifact};
use crate::Mode;

/// Drives one collection run: authenticate, then fetch, normalize and
/// persist every planned mode independently
pub struct Collector {
    store: ArtifactStore,
    authenticator: Arc<dyn Authenticator>,
    notifications: NotificationSink,
    scheduler: FetchScheduler,
    config: CollectorConfig,
    state: watch::Sender<RunState>,
}

impl Collector {
    /// Create a collector
    pub fn new(
        store: ArtifactStore,
        authenticator: Arc<dyn Authenticator>,
        notifier: Arc<dyn Notifier>,
        config: CollectorConfig,
    ) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            store,
            authenticator,
            notifications: NotificationSink::new(notifier, config.notify_timeout),
            scheduler: FetchScheduler::new(config.fetch_policy),
            config,
            state,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Observe run state transitions
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    fn transition(&self, next: RunState) {
        let previous = self.state.send_replace(next);
        debug!(from = ?previous, to = ?next, "Run state transition");
    }

    /// Run a collection for `uid` now
    pub async fn run(&self, uid: &str) -> Result<RunReport, CollectError> {
        self.run_at(uid, Utc::now()).await
    }

    /// Run a collection for `uid`, stamping artifacts with `now`
    ///
    /// # Errors
    /// Returns [`CollectError::Auth`] if no session could be established;
    /// individual mode failures are recorded in the report instead.
    pub async fn run_at(&self, uid: &str, now: DateTime<Utc>) -> Result<RunReport, CollectError> {
        if self.config.modes.is_empty() {
            return Err(CollectError::NoModes);
        }

        let modes: Vec<Mode> = self
            .config
            .modes
            .iter()
            .copied()
            .filter(|mode| self.scheduler.should_fetch(*mode, now))
            .collect();

        info!(
            uid = %uid,
            modes = modes.len(),
            parallel = self.config.parallel,
            "Starting collection run"
        );
        self.notifications.run_started(uid, &modes).await;

        self.transition(RunState::Authenticating);
        let api = match self.authenticate(uid).await {
            Ok(api) => api,
            Err(e) => {
                error!(uid = %uid, error = %e, "Authentication failed, aborting run");
                self.notifications.auth_failure(&e.to_string(), uid).await;
                self.transition(RunState::Idle);
                return Err(e);
            }
        };

        self.transition(RunState::Collecting);
        let outcomes: Vec<(Mode, ModeOutcome)> = if self.config.parallel {
            join_all(modes.iter().map(|mode| {
                let api = &*api;
                async move { (*mode, self.collect_mode(api, *mode, uid, now).await) }
            }))
            .await
        } else {
            let mut outcomes = Vec::with_capacity(modes.len());
            for mode in &modes {
                outcomes.push((*mode, self.collect_mode(&*api, *mode, uid, now).await));
            }
            outcomes
        };

        self.transition(RunState::Notifying);
        let report = RunReport::new(uid, now, Utc::now(), outcomes);
        self.report_failures(&report, uid).await;

        info!(
            uid = %uid,
            succeeded = report.succeeded_modes().len(),
            failed = report.failed_modes().len(),
            "Collection run finished"
        );
        self.notifications.success(&report, uid, &modes).await;

        self.transition(RunState::Idle);
        Ok(report)
    }

    async fn authenticate(&self, uid: &str) -> Result<Arc<dyn RecordApi>, CollectError> {
        let session = self.authenticator.ensure_valid_session(uid).await?;
        Ok(self.authenticator.build_api_client(session, uid)?)
    }

    /// One notification per failed fetch, one rate-limit notice per run
    async fn report_failures(&self, report: &RunReport, uid: &str) {
        let mut rate_limited = false;
        for (mode, outcome) in report.outcomes() {
            match outcome {
                ModeOutcome::Failed(ModeError::Fetch(e)) if e.is_rate_limit() => {
                    rate_limited = true
                }
                ModeOutcome::Failed(ModeError::Fetch(e)) => {
                    self.notifications.api_failure(e, uid, mode).await;
                }
                ModeOutcome::Failed(ModeError::Persist(_)) | ModeOutcome::Collected(_) => {}
            }
        }

        if rate_limited {
            self.notifications.rate_limited(uid).await;
        }
    }

    /// Fetch, normalize and persist one mode; failures stay local
    async fn collect_mode(
        &self,
        api: &dyn RecordApi,
        mode: Mode,
        uid: &str,
        now: DateTime<Utc>,
    ) -> ModeOutcome {
        match self.try_collect_mode(api, mode, uid, now).await {
            Ok(collected) => ModeOutcome::Collected(collected),
            Err(e) => {
                if e.is_rate_limit() {
                    warn!(mode = %mode, error = %e, "Mode rate limited");
                } else {
                    warn!(mode = %mode, error = %e, "Mode failed");
                }
                ModeOutcome::Failed(e)
            }
        }
    }

    async fn try_collect_mode(
        &self,
        api: &dyn RecordApi,
        mode: Mode,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<CollectedMode, ModeError> {
        stage(mode, ModeStage::Fetching);
        let payload = api.fetch_mode(mode, uid).await?;
        if payload.mode() != mode {
            return Err(FetcherError::InvalidResponse(format!(
                "requested {mode} but received a {} payload",
                payload.mode()
            ))
            .into());
        }

        let season_id = resolve_season_id(&payload);
        let window = resolve_season_window(&payload);
        debug!(mode = %mode, season_id = ?season_id, window = ?window, "Season resolved");

        stage(mode, ModeStage::Normalizing);
        let record = normalize(payload);
        let artifact = StoredArtifact::new(record.clone(), uid, self.config.automated, now);
        let file_name = self.config.naming.file_name(mode, season_id.as_deref(), &window);

        // modes without a season cycle always overwrite their season file
        let archive = if mode.has_season_window() {
            stage(mode, ModeStage::DetectingChanges);
            self.store.write_if_changed(mode, &artifact, &file_name)
        } else {
            self.store.write(mode, &artifact, &file_name)
        };

        stage(mode, ModeStage::Persisting);
        let mirror = match self.store.write_latest_mirror(mode, &artifact) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(mode = %mode, error = %e, "Failed to write latest mirror");
                None
            }
        };

        let archive = archive?;
        match &archive {
            PersistStatus::Written { path, .. } => {
                info!(mode = %mode, path = %path.display(), "Saved season file")
            }
            PersistStatus::Unchanged { path } => {
                info!(mode = %mode, path = %path.display(), "Season file already up to date")
            }
        }

        Ok(CollectedMode {
            record,
            season_id,
            window,
            archive,
            mirror,
        })
    }
}

fn stage(mode: Mode, stage: ModeStage) {
    debug!(mode = %mode, stage = ?stage, "Mode stage");
}
