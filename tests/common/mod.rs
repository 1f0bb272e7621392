//! Shared fixtures and in-memory fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zzz_records_archiver::collector::RunReport;
use zzz_records_archiver::fetcher::hoyolab::interpret_response;
use zzz_records_archiver::fetcher::{FetcherError, FetcherResult, RecordApi};
use zzz_records_archiver::notify::{Notifier, NotifyError};
use zzz_records_archiver::session::{AuthError, Authenticator, Session};
use zzz_records_archiver::{Mode, RawModePayload};

pub const UID: &str = "1300000000";

pub fn deadly_assault_body(zone_id: i64, score: i64) -> Value {
    json!({
        "retcode": 0,
        "message": "OK",
        "data": {
            "zone_id": zone_id,
            "total_score": score,
            "start_time": {
                "year": 2025, "month": 7, "day": 31, "hour": 4, "minute": 0, "second": 0
            },
            "end_time": {
                "year": 2025, "month": 8, "day": 14, "hour": 3, "minute": 59, "second": 59
            },
            "list": [{"score": score, "star": 3}]
        }
    })
}

pub fn shiyu_legacy_body(schedule_id: i64) -> Value {
    json!({
        "retcode": 0,
        "message": "OK",
        "data": {
            "schedule_id": schedule_id,
            "begin_time": "1754006400",
            "end_time": "1755215999",
            "max_layer": 5,
            "all_floor_detail": [{"layer_index": 5, "rating": "S"}]
        }
    })
}

pub fn shiyu_v2_body() -> Value {
    json!({
        "retcode": 0,
        "message": "OK",
        "data": {
            "hadal_ver": "v2",
            "hadal_info_v2": {
                "zone_id": 61001,
                "hadal_begin_time": {
                    "year": 2025, "month": 8, "day": 1, "hour": 4, "minute": 0, "second": 0
                },
                "hadal_end_time": {
                    "year": 2025, "month": 8, "day": 15, "hour": 3, "minute": 59, "second": 59
                },
                "brief": {"rating": "S", "battle_time": 312, "score": 48000},
                "fourth_layer_detail": {
                    "rating": "S",
                    "buffer": {"title": "Overheat"},
                    "layer_challenge_info_list": [
                        {
                            "layer_id": 401,
                            "avatar_list": [{"id": 1191}],
                            "buddy": {"id": 53001},
                            "battle_time": 150
                        }
                    ]
                },
                "fitfh_layer_detail": {
                    "rating": "A",
                    "layer_challenge_info_list": [
                        {"layer_id": 501, "avatar_list": [{"id": 1221}], "battle_time": 162},
                        {"layer_id": 502, "avatar_list": [{"id": 1241}], "battle_time": 170}
                    ]
                }
            }
        }
    })
}

pub fn void_front_body(void_front_id: i64) -> Value {
    json!({
        "retcode": 0,
        "message": "OK",
        "data": {
            "void_front_battle_abstract_info_brief": {
                "void_front_id": void_front_id,
                "total_score": 9000
            },
            "boss_challenge_record": []
        }
    })
}

pub fn error_body(retcode: i64, message: &str) -> Value {
    json!({"retcode": retcode, "message": message, "data": null})
}

/// Record source answering from canned response bodies
#[derive(Default)]
pub struct FakeApi {
    bodies: Mutex<HashMap<Mode, Value>>,
    calls: Mutex<Vec<Mode>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, mode: Mode, body: Value) -> Self {
        self.set(mode, body);
        self
    }

    pub fn set(&self, mode: Mode, body: Value) {
        self.bodies.lock().unwrap().insert(mode, body);
    }

    pub fn calls(&self) -> Vec<Mode> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordApi for FakeApi {
    async fn fetch_mode(&self, mode: Mode, _uid: &str) -> FetcherResult<RawModePayload> {
        self.calls.lock().unwrap().push(mode);
        let body = self.bodies.lock().unwrap().get(&mode).cloned();
        match body {
            Some(body) => interpret_response(mode, body),
            None => Err(FetcherError::NetworkError(format!("no canned body for {mode}"))),
        }
    }
}

/// Authenticator handing out a shared [`FakeApi`]
pub struct FakeAuthenticator {
    api: Arc<FakeApi>,
    reject: bool,
}

impl FakeAuthenticator {
    pub fn new(api: Arc<FakeApi>) -> Self {
        Self { api, reject: false }
    }

    pub fn rejecting(api: Arc<FakeApi>) -> Self {
        Self { api, reject: true }
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn ensure_valid_session(&self, _uid: &str) -> Result<Session, AuthError> {
        if self.reject {
            return Err(AuthError::InvalidSession("session expired".to_string()));
        }
        Ok(Session::from_cookie_header("ltoken_v2=token; ltuid_v2=42"))
    }

    fn build_api_client(
        &self,
        _session: Session,
        _uid: &str,
    ) -> Result<Arc<dyn RecordApi>, AuthError> {
        Ok(self.api.clone() as Arc<dyn RecordApi>)
    }
}

/// Notification received by a [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(Vec<Mode>),
    Success { succeeded: Vec<Mode>, failed: Vec<Mode> },
    AuthFailure(String),
    ApiFailure(Mode, String),
    RateLimited,
    RunFailed(String),
}

/// Notifier that records every call
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_run_started(&self, _uid: &str, modes: &[Mode]) -> Result<(), NotifyError> {
        self.push(Event::Started(modes.to_vec()))
    }

    async fn notify_success(
        &self,
        report: &RunReport,
        _uid: &str,
        _modes: &[Mode],
    ) -> Result<(), NotifyError> {
        self.push(Event::Success {
            succeeded: report.succeeded_modes(),
            failed: report.failed_modes(),
        })
    }

    async fn notify_auth_failure(&self, error: &str, _uid: &str) -> Result<(), NotifyError> {
        self.push(Event::AuthFailure(error.to_string()))
    }

    async fn notify_api_failure(
        &self,
        error: &FetcherError,
        _uid: &str,
        mode: Mode,
    ) -> Result<(), NotifyError> {
        self.push(Event::ApiFailure(mode, error.to_string()))
    }

    async fn notify_rate_limited(&self, _uid: &str) -> Result<(), NotifyError> {
        self.push(Event::RateLimited)
    }

    async fn notify_run_failed(&self, error: &str, _uid: &str) -> Result<(), NotifyError> {
        self.push(Event::RunFailed(error.to_string()))
    }
}

/// Canned HTTP server on a loopback port
///
/// Serves `connections` requests, one per connection, answering each with
/// `respond(request_target)`. The join handle yields the raw request heads.
pub fn serve_http(
    connections: usize,
    respond: fn(&str) -> (u16, String),
) -> (String, std::thread::JoinHandle<Vec<String>>) {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/api/zzz", listener.local_addr().unwrap());

    let handle = std::thread::spawn(move || {
        let mut requests = Vec::new();
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let head = String::from_utf8_lossy(&head).to_string();
            let target = head.split_whitespace().nth(1).unwrap_or_default().to_string();

            let (status, body) = respond(&target);
            let response = format!(
                "HTTP/1.1 {status} Canned\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            requests.push(head);
        }
        requests
    });

    (base_url, handle)
}

/// Answer every mode endpoint with a successful canned body
pub fn respond_all_modes(target: &str) -> (u16, String) {
    let body = if target.contains("/mem_detail") {
        deadly_assault_body(1001, 30000)
    } else if target.contains("/hadal_info_v2") {
        shiyu_legacy_body(62)
    } else if target.contains("/void_front_battle_detail") {
        void_front_body(7)
    } else {
        return (404, "{}".to_string());
    };
    (200, body.to_string())
}
