//! Integration tests for the HoYoLAB client against a loopback server

use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use zzz_records_archiver::fetcher::{FetcherError, HoyolabClient, RecordApi};
use zzz_records_archiver::payload::ShiyuData;
use zzz_records_archiver::session::Session;
use zzz_records_archiver::{Mode, RawModePayload};

use crate::common::{error_body, respond_all_modes, serve_http, UID};

fn client(base_url: &str) -> HoyolabClient {
    HoyolabClient::new(
        Arc::new(Client::new()),
        base_url,
        Session::from_cookie_header("ltoken_v2=token; ltuid_v2=42"),
    )
}

#[tokio::test]
async fn test_fetch_sends_region_and_cookie() {
    let (base_url, server) = serve_http(1, respond_all_modes);

    let payload = client(&base_url).fetch_mode(Mode::DeadlyAssault, UID).await.unwrap();
    assert_eq!(payload.mode(), Mode::DeadlyAssault);
    assert_eq!(payload.data().get("zone_id"), Some(&json!(1001)));

    let requests = server.join().unwrap();
    let head = requests[0].to_lowercase();
    assert!(head.starts_with("get /api/zzz/mem_detail?"));
    assert!(head.contains("uid=1300000000"));
    assert!(head.contains("region=prod_gf_jp"));
    assert!(head.contains("schedule_type=1"));
    assert!(head.contains("cookie: ltoken_v2=token; ltuid_v2=42"));
    assert!(head.contains("x-rpc-client_type: 5"));
}

#[tokio::test]
async fn test_void_front_has_no_schedule_type() {
    let (base_url, server) = serve_http(1, respond_all_modes);

    let payload = client(&base_url).fetch_mode(Mode::VoidFront, UID).await.unwrap();
    assert!(matches!(payload, RawModePayload::VoidFront(_)));

    let requests = server.join().unwrap();
    let head = requests[0].to_lowercase();
    assert!(head.starts_with("get /api/zzz/void_front_battle_detail?"));
    assert!(!head.contains("schedule_type"));
}

#[tokio::test]
async fn test_shiyu_body_is_classified_on_ingestion() {
    let (base_url, server) = serve_http(1, respond_all_modes);

    let payload = client(&base_url).fetch_mode(Mode::ShiyuDefense, UID).await.unwrap();
    let RawModePayload::ShiyuDefense(envelope) = payload else {
        panic!("expected a shiyu payload");
    };
    assert!(matches!(envelope.data, ShiyuData::V1(_)));
    server.join().unwrap();
}

#[tokio::test]
async fn test_http_429_is_rate_limited() {
    let (base_url, server) = serve_http(1, |_| (429, "{}".to_string()));

    let err = client(&base_url).fetch_mode(Mode::DeadlyAssault, UID).await.unwrap_err();
    assert!(matches!(err, FetcherError::RateLimited(_)));
    assert!(err.is_rate_limit());
    server.join().unwrap();
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let (base_url, server) = serve_http(1, |_| (502, "bad gateway".to_string()));

    let err = client(&base_url).fetch_mode(Mode::DeadlyAssault, UID).await.unwrap_err();
    match err {
        FetcherError::HttpError(msg) => {
            assert!(msg.contains("502"));
            assert!(msg.contains("bad gateway"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    server.join().unwrap();
}

#[tokio::test]
async fn test_api_retcodes_are_classified() {
    let (base_url, server) = serve_http(2, |target| {
        if target.contains("/mem_detail") {
            (200, error_body(10001, "Please login").to_string())
        } else {
            (200, error_body(10101, "Visits too frequently").to_string())
        }
    });
    let client = client(&base_url);

    let err = client.fetch_mode(Mode::DeadlyAssault, UID).await.unwrap_err();
    assert!(matches!(err, FetcherError::NotLoggedIn(_)));

    let err = client.fetch_mode(Mode::VoidFront, UID).await.unwrap_err();
    assert!(matches!(err, FetcherError::RateLimited(_)));

    server.join().unwrap();
}

#[tokio::test]
async fn test_non_json_body_is_a_parse_error() {
    let (base_url, server) = serve_http(1, |_| (200, "<html>maintenance</html>".to_string()));

    let err = client(&base_url).fetch_mode(Mode::DeadlyAssault, UID).await.unwrap_err();
    assert!(matches!(err, FetcherError::ParseError(_)));
    server.join().unwrap();
}
