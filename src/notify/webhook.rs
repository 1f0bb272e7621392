//! Chat webhook notifier
//!
//! Posts `{"content": "<text>"}` to the configured URL, the payload shape
//! accepted by Discord-style incoming webhooks.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{mode_list, Notifier, NotifyError};
use crate::collector::{ModeOutcome, PersistStatus, RunReport};
use crate::fetcher::FetcherError;
use crate::Mode;

const ERROR_BODY_LIMIT: usize = 200;

/// Notifier that posts plain-text messages to a webhook
pub struct WebhookNotifier {
    client: Arc<Client>,
    url: String,
}

impl WebhookNotifier {
    /// Create a notifier posting to `url` through the shared client
    pub fn new(client: Arc<Client>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn post(&self, content: String) -> Result<(), NotifyError> {
        debug!(chars = content.len(), "Posting webhook notification");

        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        })
    }
}

/// One line per planned mode describing what happened to it
pub fn success_message(report: &RunReport, uid: &str, modes: &[Mode]) -> String {
    let mut lines = vec![format!(
        "ZZZ records for UID {uid}: {}/{} mode(s) collected",
        report.succeeded_modes().len(),
        modes.len()
    )];

    for mode in modes {
        let line = match report.outcome(*mode) {
            Some(ModeOutcome::Collected(collected)) => match &collected.archive {
                PersistStatus::Written { path, .. } => {
                    format!("- {mode}: saved {}", file_name(path))
                }
                PersistStatus::Unchanged { path } => {
                    format!("- {mode}: unchanged ({})", file_name(path))
                }
            },
            Some(ModeOutcome::Failed(error)) => format!("- {mode}: failed ({error})"),
            None => format!("- {mode}: not attempted"),
        };
        lines.push(line);
    }

    lines.join("\n")
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_run_started(&self, uid: &str, modes: &[Mode]) -> Result<(), NotifyError> {
        self.post(format!(
            "ZZZ records: collecting {} for UID {uid}",
            mode_list(modes)
        ))
        .await
    }

    async fn notify_success(
        &self,
        report: &RunReport,
        uid: &str,
        modes: &[Mode],
    ) -> Result<(), NotifyError> {
        self.post(success_message(report, uid, modes)).await
    }

    async fn notify_auth_failure(&self, error: &str, uid: &str) -> Result<(), NotifyError> {
        self.post(format!(
            "ZZZ records: authentication failed for UID {uid}: {error}. \
             Refresh the session cookies."
        ))
        .await
    }

    async fn notify_api_failure(
        &self,
        error: &FetcherError,
        uid: &str,
        mode: Mode,
    ) -> Result<(), NotifyError> {
        self.post(format!("ZZZ records: {mode} fetch failed for UID {uid}: {error}"))
            .await
    }

    async fn notify_rate_limited(&self, uid: &str) -> Result<(), NotifyError> {
        self.post(format!(
            "ZZZ records: rate limited for UID {uid}. Wait before the next run; no re-login needed."
        ))
        .await
    }

    async fn notify_run_failed(&self, error: &str, uid: &str) -> Result<(), NotifyError> {
        self.post(format!("ZZZ records: run failed for UID {uid}: {error}"))
            .await
    }
}
