//! Run notifications
//!
//! The collector reports lifecycle events through a [`Notifier`]. Delivery
//! is best-effort: [`NotificationSink`] bounds every call with a timeout and
//! turns failures into log lines, so a broken notification channel can never
//! change the outcome of a run.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::collector::RunReport;
use crate::fetcher::FetcherError;
use crate::Mode;

pub mod webhook;

pub use webhook::WebhookNotifier;

/// Default bound on a single notification call
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Notification delivery errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Request could not be sent
    #[error("notification request failed: {0}")]
    Http(String),

    /// Endpoint rejected the notification
    #[error("notification endpoint returned {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },
}

/// Receiver of run lifecycle events
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A run is about to fetch `modes`
    async fn notify_run_started(&self, uid: &str, modes: &[Mode]) -> Result<(), NotifyError>;

    /// Authentication succeeded and every planned mode was attempted
    async fn notify_success(
        &self,
        report: &RunReport,
        uid: &str,
        modes: &[Mode],
    ) -> Result<(), NotifyError>;

    /// No valid session could be obtained; the run is aborted
    async fn notify_auth_failure(&self, error: &str, uid: &str) -> Result<(), NotifyError>;

    /// One mode failed to fetch
    async fn notify_api_failure(
        &self,
        error: &FetcherError,
        uid: &str,
        mode: Mode,
    ) -> Result<(), NotifyError>;

    /// The API throttled this player's requests
    async fn notify_rate_limited(&self, uid: &str) -> Result<(), NotifyError>;

    /// The run aborted for a reason other than authentication
    async fn notify_run_failed(&self, _error: &str, _uid: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier that only writes log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_run_started(&self, uid: &str, modes: &[Mode]) -> Result<(), NotifyError> {
        info!(uid = %uid, modes = %mode_list(modes), "Collection run started");
        Ok(())
    }

    async fn notify_success(
        &self,
        report: &RunReport,
        uid: &str,
        modes: &[Mode],
    ) -> Result<(), NotifyError> {
        info!(
            uid = %uid,
            planned = modes.len(),
            succeeded = report.succeeded_modes().len(),
            failed = report.failed_modes().len(),
            "Collection run finished"
        );
        Ok(())
    }

    async fn notify_auth_failure(&self, error: &str, uid: &str) -> Result<(), NotifyError> {
        error!(uid = %uid, error = %error, "Authentication failed");
        Ok(())
    }

    async fn notify_api_failure(
        &self,
        error: &FetcherError,
        uid: &str,
        mode: Mode,
    ) -> Result<(), NotifyError> {
        warn!(uid = %uid, mode = %mode, error = %error, "Mode fetch failed");
        Ok(())
    }

    async fn notify_rate_limited(&self, uid: &str) -> Result<(), NotifyError> {
        warn!(uid = %uid, "Rate limited by the API; wait before the next run");
        Ok(())
    }

    async fn notify_run_failed(&self, error: &str, uid: &str) -> Result<(), NotifyError> {
        error!(uid = %uid, error = %error, "Collection run failed");
        Ok(())
    }
}

/// Comma-separated file stems of the given modes
pub(crate) fn mode_list(modes: &[Mode]) -> String {
    modes
        .iter()
        .map(Mode::file_stem)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fire-and-forget front for a [`Notifier`]
#[derive(Clone)]
pub struct NotificationSink {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationSink {
    /// Wrap a notifier with a per-call timeout
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    async fn deliver<F>(&self, event: &'static str, call: F)
    where
        F: Future<Output = Result<(), NotifyError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(())) => debug!(event, "Notification delivered"),
            Ok(Err(e)) => warn!(event, error = %e, "Notification failed"),
            Err(_) => warn!(
                event,
                timeout_secs = self.timeout.as_secs_f64(),
                "Notification timed out"
            ),
        }
    }

    /// Report the start of a run
    pub async fn run_started(&self, uid: &str, modes: &[Mode]) {
        self.deliver("run_started", self.notifier.notify_run_started(uid, modes))
            .await;
    }

    /// Report a finished run
    pub async fn success(&self, report: &RunReport, uid: &str, modes: &[Mode]) {
        self.deliver("success", self.notifier.notify_success(report, uid, modes))
            .await;
    }

    /// Report an authentication failure
    pub async fn auth_failure(&self, error: &str, uid: &str) {
        self.deliver("auth_failure", self.notifier.notify_auth_failure(error, uid))
            .await;
    }

    /// Report a failed mode fetch
    pub async fn api_failure(&self, error: &FetcherError, uid: &str, mode: Mode) {
        self.deliver("api_failure", self.notifier.notify_api_failure(error, uid, mode))
            .await;
    }

    /// Report throttling
    pub async fn rate_limited(&self, uid: &str) {
        self.deliver("rate_limited", self.notifier.notify_rate_limited(uid))
            .await;
    }

    /// Report an aborted run
    pub async fn run_failed(&self, error: &str, uid: &str) {
        self.deliver("run_failed", self.notifier.notify_run_failed(error, uid))
            .await;
    }
}
