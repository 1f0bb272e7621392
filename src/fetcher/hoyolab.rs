//! HoYoLAB battle-record HTTP client
//!
//! One GET per mode, authenticated by the session cookie. There is no retry
//! loop: a failed mode is reported and picked up again by the next scheduled
//! run.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, ORIGIN, REFERER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::region::Region;
use super::{classify_api_error, FetcherError, FetcherResult, RecordApi};
use crate::payload::RawModePayload;
use crate::session::Session;
use crate::Mode;

/// Default API root for the ZZZ game-record endpoints
pub const DEFAULT_BASE_URL: &str =
    "https://sg-public-api.hoyolab.com/event/game_record_zzz/api/zzz";

const ACT_ORIGIN: &str = "https://act.hoyolab.com";
const RPC_LANGUAGE: &str = "en-us";
const RPC_CLIENT_TYPE: &str = "5";

/// Maximum number of response body characters kept in an error message
const ERROR_BODY_LIMIT: usize = 256;

/// HTTP client for the HoYoLAB game-record API
pub struct HoyolabClient {
    client: Arc<Client>,
    base_url: String,
    session: Session,
}

impl HoyolabClient {
    /// Create new API client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `base_url` - API root without trailing slash
    /// * `session` - Credentials sent with every request
    pub fn new(client: Arc<Client>, base_url: impl Into<String>, session: Session) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a mode's endpoint, without query parameters
    pub fn endpoint_url(&self, mode: Mode) -> String {
        format!("{}/{}", self.base_url, endpoint_path(mode))
    }

    /// Query parameters for one mode and player
    pub fn query_params(mode: Mode, uid: &str, region: Region) -> Vec<(&'static str, String)> {
        let mut params = vec![("uid", uid.to_string()), ("region", region.server().to_string())];
        match mode {
            Mode::DeadlyAssault | Mode::ShiyuDefense => {
                params.push(("schedule_type", "1".to_string()))
            }
            Mode::VoidFront => {}
        }
        params
    }

    fn headers(&self) -> FetcherResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let cookie = HeaderValue::from_str(self.session.cookie_header())
            .map_err(|e| {
                FetcherError::InvalidResponse(format!("cookie is not a valid header value: {e}"))
            })?;
        headers.insert(COOKIE, cookie);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_static(ACT_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static("https://act.hoyolab.com/"));
        headers.insert("x-rpc-language", HeaderValue::from_static(RPC_LANGUAGE));
        headers.insert("x-rpc-lang", HeaderValue::from_static(RPC_LANGUAGE));
        headers.insert("x-rpc-client_type", HeaderValue::from_static(RPC_CLIENT_TYPE));
        Ok(headers)
    }

    /// Execute the GET request for one mode and decode the JSON body
    async fn get(&self, mode: Mode, uid: &str) -> FetcherResult<Value> {
        let region = Region::from_uid(uid)?;
        let url = self.endpoint_url(mode);
        let params = Self::query_params(mode, uid, region);

        debug!(mode = %mode, url = %url, region = %region, "Requesting battle record");

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetcherError::NetworkError(format!("request timed out: {e}"))
                } else {
                    FetcherError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(mode = %mode, "Rate limit response (429)");
            return Err(FetcherError::RateLimited(format!("HTTP {status}")));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(FetcherError::HttpError(format!("status {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetcherError::ParseError(format!("failed to deserialize response: {e}")))
    }
}

fn endpoint_path(mode: Mode) -> &'static str {
    match mode {
        Mode::DeadlyAssault => "mem_detail",
        Mode::ShiyuDefense => "hadal_info_v2",
        Mode::VoidFront => "void_front_battle_detail",
    }
}

/// Split a decoded body into an error or a classified payload
pub fn interpret_response(mode: Mode, body: Value) -> FetcherResult<RawModePayload> {
    let retcode = body.get("retcode").and_then(Value::as_i64).unwrap_or(0);
    if retcode != 0 {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(classify_api_error(retcode, message));
    }

    RawModePayload::from_response(mode, body)
        .map_err(|e| FetcherError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl RecordApi for HoyolabClient {
    async fn fetch_mode(&self, mode: Mode, uid: &str) -> FetcherResult<RawModePayload> {
        let body = self.get(mode, uid).await?;
        interpret_response(mode, body)
    }
}
