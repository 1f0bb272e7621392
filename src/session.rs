//! Session credentials and the authentication boundary
//!
//! Obtaining cookies (the interactive browser login) happens outside this
//! crate. The collector only sees an [`Authenticator`] that hands back a
//! [`Session`] and builds a [`RecordApi`] around it; the session is passed
//! explicitly into the API client rather than living in global state.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::fetcher::hoyolab::{HoyolabClient, DEFAULT_BASE_URL};
use crate::fetcher::shared_resources::global_http_client;
use crate::fetcher::{FetcherError, RecordApi};

/// Cookie names that carry the login token, newest first
const TOKEN_COOKIES: [&str; 2] = ["ltoken_v2", "ltoken"];
/// Cookie names that carry the account id, newest first
const ACCOUNT_COOKIES: [&str; 2] = ["ltuid_v2", "ltuid"];

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No cookie source is available
    #[error("no session cookies found at {0}")]
    MissingCookies(PathBuf),

    /// Cookie file could not be read
    #[error("failed to read cookie file {path}: {source}")]
    Io {
        /// Cookie file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Cookies exist but do not form a usable session
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// API client could not be constructed
    #[error("failed to build API client: {0}")]
    Client(#[from] FetcherError),
}

/// Opaque credential bundle for the game-record API
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
}

impl Session {
    /// Wrap a `name=value; name=value` cookie header
    pub fn from_cookie_header(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into().trim().to_string(),
        }
    }

    /// Build a session from browser-exported cookie JSON
    ///
    /// Accepts a plain cookie string, an array of `{name, value}` objects,
    /// or an object holding either under `cookie` or `cookies`.
    pub fn from_cookie_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(cookie) => Some(Self::from_cookie_header(cookie.as_str())),
            Value::Array(items) => {
                let pairs: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        let name = item.get("name")?.as_str()?;
                        let value = item.get("value")?.as_str()?;
                        Some(format!("{name}={value}"))
                    })
                    .collect();
                (!pairs.is_empty()).then(|| Self::from_cookie_header(pairs.join("; ")))
            }
            Value::Object(map) => map
                .get("cookie")
                .or_else(|| map.get("cookies"))
                .and_then(Self::from_cookie_json),
            _ => None,
        }
    }

    /// Raw `Cookie` header value
    pub fn cookie_header(&self) -> &str {
        &self.cookie
    }

    /// Look up a single cookie by name
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookie.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }

    fn first_present(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.cookie(name).filter(|value| !value.is_empty()))
    }

    /// Whether the session carries both a login token and an account id
    pub fn is_valid(&self) -> bool {
        self.first_present(&TOKEN_COOKIES).is_some()
            && self.first_present(&ACCOUNT_COOKIES).is_some()
    }

    /// Account id from the cookie, if present
    pub fn account_id(&self) -> Option<&str> {
        self.first_present(&ACCOUNT_COOKIES)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .cookie
            .split(';')
            .filter_map(|pair| pair.trim().split_once('=').map(|(key, _)| key))
            .collect();
        f.debug_struct("Session").field("cookies", &names).finish()
    }
}

/// Source of sessions and API clients for a run
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Establish a usable session for the player
    ///
    /// # Errors
    /// Returns [`AuthError`] if no valid session can be obtained. The run
    /// treats this as fatal and does not retry.
    async fn ensure_valid_session(&self, uid: &str) -> Result<Session, AuthError>;

    /// Build the per-mode API client around an established session
    fn build_api_client(
        &self,
        session: Session,
        uid: &str,
    ) -> Result<Arc<dyn RecordApi>, AuthError>;
}

/// Authenticator backed by a cookie file written by the login tool
///
/// A cookie string given directly (for example from `HOYOLAB_COOKIE`) takes
/// precedence over the file.
#[derive(Debug, Clone)]
pub struct CookieFileAuthenticator {
    cookie_file: PathBuf,
    cookie_override: Option<String>,
    base_url: String,
}

impl CookieFileAuthenticator {
    /// Read cookies from `cookie_file`
    pub fn new(cookie_file: impl Into<PathBuf>) -> Self {
        Self {
            cookie_file: cookie_file.into(),
            cookie_override: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Use this cookie string instead of the file, when non-empty
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie_override = cookie.filter(|c| !c.trim().is_empty());
        self
    }

    /// Point the API client at a different root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cookie file location
    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }

    async fn load_session(&self) -> Result<Session, AuthError> {
        if let Some(cookie) = &self.cookie_override {
            debug!("Using session cookie from environment");
            return Ok(Session::from_cookie_header(cookie.as_str()));
        }

        let contents = match tokio::fs::read_to_string(&self.cookie_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::MissingCookies(self.cookie_file.clone()));
            }
            Err(source) => {
                return Err(AuthError::Io {
                    path: self.cookie_file.clone(),
                    source,
                });
            }
        };

        let session = match serde_json::from_str::<Value>(&contents) {
            Ok(json) => Session::from_cookie_json(&json).ok_or_else(|| {
                AuthError::InvalidSession(format!(
                    "{} holds JSON without a cookie string or cookie list",
                    self.cookie_file.display()
                ))
            })?,
            Err(_) => Session::from_cookie_header(contents),
        };

        debug!(path = %self.cookie_file.display(), "Loaded session cookie file");
        Ok(session)
    }
}

#[async_trait]
impl Authenticator for CookieFileAuthenticator {
    async fn ensure_valid_session(&self, uid: &str) -> Result<Session, AuthError> {
        let session = self.load_session().await?;
        if !session.is_valid() {
            return Err(AuthError::InvalidSession(
                "cookie lacks ltoken/ltuid; log in again".to_string(),
            ));
        }

        info!(uid = %uid, account = ?session.account_id(), "Session established");
        Ok(session)
    }

    fn build_api_client(
        &self,
        session: Session,
        _uid: &str,
    ) -> Result<Arc<dyn RecordApi>, AuthError> {
        let client = global_http_client()?;
        Ok(Arc::new(HoyolabClient::new(client, self.base_url.as_str(), session)))
    }
}
