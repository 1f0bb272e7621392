//! CLI error types and conversions

use crate::collector::CollectError;
use crate::fetcher::FetcherError;
use crate::store::StoreError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Collection run error
    #[error("{0}")]
    Collect(#[from] CollectError),

    /// Store error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Output could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CliError {
    /// Whether the failure was an authentication failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CliError::Collect(CollectError::Auth(_)))
    }
}
