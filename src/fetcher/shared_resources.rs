//! Shared HTTP client for all API clients
//!
//! Every per-mode request of a run goes through one connection pool. The
//! client carries explicit timeouts so a hanging mode cannot stall the run
//! forever.

use once_cell::sync::OnceCell;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::{FetcherError, FetcherResult};

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for the entire request
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request
const USER_AGENT: &str = concat!("zzz-records-archiver/", env!("CARGO_PKG_VERSION"));

static GLOBAL_HTTP_CLIENT: OnceCell<Arc<Client>> = OnceCell::new();

/// Get the global HTTP client, building it on first use
///
/// # Errors
/// Returns [`FetcherError::NetworkError`] if the TLS backend cannot be
/// initialized.
pub fn global_http_client() -> FetcherResult<Arc<Client>> {
    GLOBAL_HTTP_CLIENT
        .get_or_try_init(|| {
            Client::builder()
                .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
                .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
                .user_agent(USER_AGENT)
                .build()
                .map(Arc::new)
                .map_err(|e| {
                    FetcherError::NetworkError(format!("failed to build HTTP client: {e}"))
                })
        })
        .cloned()
}
