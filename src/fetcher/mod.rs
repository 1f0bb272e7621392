//! Record fetcher implementations

use crate::payload::RawModePayload;
use crate::Mode;
use async_trait::async_trait;

pub mod hoyolab;
pub mod region;
pub mod shared_resources;

pub use hoyolab::HoyolabClient;
pub use region::Region;

/// API result code for "visits too frequently"
pub const RETCODE_RATE_LIMITED: i64 = 10101;

/// API result codes for a missing or expired login
pub const RETCODES_NOT_LOGGED_IN: [i64; 2] = [-100, 10001];

/// Message fragments that identify a rate-limit response
const RATE_LIMIT_MARKERS: [&str; 3] = ["too many requests", "rate limit", "visits too frequently"];

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// API error response
    #[error("API error {retcode}: {message}")]
    ApiError {
        /// API result code
        retcode: i64,
        /// API message
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Session rejected by the API
    #[error("not logged in: {0}")]
    NotLoggedIn(String),

    /// UID with no known server region
    #[error("invalid uid: {0}")]
    InvalidUid(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetcherError {
    /// Whether this error belongs to the rate-limit class
    ///
    /// Besides the dedicated variant, any error whose message carries a
    /// rate-limit marker counts, since some gateways report throttling as a
    /// generic failure.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            FetcherError::RateLimited(_) => true,
            other => is_rate_limit_message(&other.to_string()),
        }
    }
}

/// Map a non-zero API result code to its error class
pub fn classify_api_error(retcode: i64, message: &str) -> FetcherError {
    if retcode == RETCODE_RATE_LIMITED || is_rate_limit_message(message) {
        FetcherError::RateLimited(message.to_string())
    } else if RETCODES_NOT_LOGGED_IN.contains(&retcode) {
        FetcherError::NotLoggedIn(message.to_string())
    } else {
        FetcherError::ApiError {
            retcode,
            message: message.to_string(),
        }
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Per-mode record source
///
/// One implementation talks to HoYoLAB; tests substitute in-memory fakes.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Fetch the current record of one mode for a player
    ///
    /// # Errors
    /// Returns [`FetcherError`] on transport, HTTP or API failure. A response
    /// with a non-zero result code is an error, never a payload.
    async fn fetch_mode(&self, mode: Mode, uid: &str) -> FetcherResult<RawModePayload>;
}
