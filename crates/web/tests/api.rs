//! Router-level tests over the full API surface. The schedule is empty,
//! so journeys resolve to the walking fallback and nothing touches the
//! network through the scripted fetcher.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use gtfs::schedule::Schedule;
use kv::MemoryStore;
use model::{ApiMode, AuState, JourneyConfig, Location};
use tower::ServiceExt as _;
use transit::{FeedFetcher, FetchError};
use weather::WeatherClient;
use web::{router, ServerConfig, WebState};

struct OfflineFetcher;

#[async_trait]
impl FeedFetcher for OfflineFetcher {
    async fn fetch(
        &self,
        _url: &str,
        _header_name: &str,
        _header_value: &str,
    ) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Retryable("offline".to_owned()))
    }
}

fn empty_schedule() -> Arc<Schedule> {
    Arc::new(Schedule::from_tables(
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        None,
        Vec::new(),
    ))
}

fn app() -> Router {
    let state = WebState::with_parts(
        empty_schedule(),
        Arc::new(OfflineFetcher),
        Arc::new(MemoryStore::new()),
        Arc::new(WeatherClient::disabled()),
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_owned(),
            refresh_seconds: 60,
            admin_password: None,
            schedule_path: "./does-not-exist".into(),
        },
    );
    router(state)
}

fn token() -> String {
    JourneyConfig {
        home: Location::new("1 Test Pl, Carlton VIC 3053", -37.8, 144.96),
        work: Location::new("200 Work St, Melbourne VIC 3000", -37.81, 144.95),
        cafe: None,
        arrival_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        coffee_enabled: false,
        api_mode: ApiMode::Cached,
        state: AuState::Vic,
        transit_api_key: None,
        places_api_key: None,
        extensions: BTreeMap::new(),
    }
    .encode_token()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, body, content_type)
}

async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_answers_without_dependencies() {
    let app = app();
    let (status, body, _) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn status_reports_caches_and_version() {
    let app = app();
    let (status, body, _) = get(&app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["refreshSeconds"], 60);
    assert!(json["version"].is_string());
    assert_eq!(json["scheduleStops"], 0);
}

#[tokio::test]
async fn bad_token_is_rejected_without_detail() {
    let app = app();
    let (status, body, _) =
        get(&app, "/api/zones?device=trmnl-og&token=!!!garbage!!!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "error": "bad_token" }));
}

#[tokio::test]
async fn bad_device_is_rejected() {
    let app = app();
    let uri = format!("/api/zones?device=toaster&token={}", token());
    let (status, _, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zones_list_and_change_flags() {
    let app = app();
    let uri = format!("/api/zones?device=trmnl-og&token={}", token());
    let (status, body, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let zones: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let zones = zones.as_array().unwrap();
    assert!(!zones.is_empty());
    // a fresh client holds no hashes, so everything changed
    assert!(zones.iter().all(|zone| zone["changed"] == true));

    // replaying the reported hashes marks zones unchanged
    let since = zones
        .iter()
        .map(|zone| {
            format!(
                "{}:{}",
                zone["id"].as_str().unwrap(),
                zone["hash"].as_str().unwrap()
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    let uri = format!(
        "/api/zones?device=trmnl-og&token={}&since={}",
        token(),
        since
    );
    let (status, body, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let replayed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    // clock-bearing zones may tick over between the two calls; the
    // journey zones must read unchanged
    for id in ["legs", "header.location"] {
        let zone = replayed
            .as_array()
            .unwrap()
            .iter()
            .find(|zone| zone["id"] == id)
            .unwrap();
        assert_eq!(zone["changed"], false, "zone {id}");
    }
}

#[tokio::test]
async fn zone_bytes_with_conditional_refetch() {
    let app = app();
    // a zone whose pixels do not depend on the minute hand
    let uri = format!("/api/zone/header.location?device=trmnl-og&token={}", token());
    let response = app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let etag = response
        .headers()
        .get(header::ETAG)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert_eq!(content_type, "image/bmp");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[0..2], b"BM");

    // the same hash answers 304 with no body
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::IF_NONE_MATCH, &etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn unknown_zone_is_404() {
    let app = app();
    let uri = format!("/api/zone/nonsense?device=trmnl-og&token={}", token());
    let (status, _, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn screen_is_always_png() {
    let app = app();
    let uri = format!("/api/screen?device=trmnl-og&token={}", token());
    let (status, body, content_type) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(&body[1..4], b"PNG");
}

#[tokio::test]
async fn livedash_uses_the_native_format() {
    let app = app();
    let uri = format!("/api/livedash?device=trmnl-og&token={}", token());
    let (status, body, content_type) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/bmp"));
    assert_eq!(&body[0..2], b"BM");

    let uri = format!("/api/livedash?device=kindle-pw5&token={}", token());
    let (_, body, content_type) = get(&app, &uri).await;
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(&body[1..4], b"PNG");
}

#[tokio::test]
async fn pairing_full_flow() {
    let app = app();

    // device claims its code
    let (status, json) = post_json(
        &app,
        "/api/pair/A7X9K2",
        serde_json::json!({ "deviceId": "d1", "deviceKind": "trmnl-og" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "created");

    // polls wait until the wizard finishes
    let (_, body, _) = get(&app, "/api/pair/A7X9K2").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "waiting");

    // wizard hands over the webhook
    let (status, json) = post_json(
        &app,
        "/api/pair/A7X9K2",
        serde_json::json!({ "webhookUrl": "https://x.example/api/zones?token=abc" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "paired");

    // the device sees the webhook exactly once
    let (_, body, _) = get(&app, "/api/pair/A7X9K2").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "paired");
    assert_eq!(json["webhookUrl"], "https://x.example/api/zones?token=abc");

    let (_, body, _) = get(&app, "/api/pair/A7X9K2").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "expired");
}

#[tokio::test]
async fn pairing_conflicts_on_foreign_codes() {
    let app = app();
    let (status, _) = post_json(
        &app,
        "/api/pair/ZZZZZZ",
        serde_json::json!({ "deviceId": "d1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(
        &app,
        "/api/pair/ZZZZZZ",
        serde_json::json!({ "deviceId": "d2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "code_in_use");
}

#[tokio::test]
async fn geocode_is_guarded_and_served_from_the_cache() {
    let store = Arc::new(MemoryStore::new());
    let cached = Location::new("Cached Pl, Carlton VIC 3053", -37.8, 144.97);
    use kv::KvStore as _;
    store
        .put(
            "geocode:cached pl",
            serde_json::to_vec(&cached).unwrap(),
            None,
        )
        .await
        .unwrap();
    let state = WebState::with_parts(
        empty_schedule(),
        Arc::new(OfflineFetcher),
        store,
        Arc::new(WeatherClient::disabled()),
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_owned(),
            refresh_seconds: 60,
            admin_password: Some("hunter2".to_owned()),
            schedule_path: "./does-not-exist".into(),
        },
    );
    let app = router(state);

    // wrong password is rejected
    let (status, _, _) = get(&app, "/api/geocode?q=Cached%20Pl").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // the cached address resolves without any upstream call
    let (status, body, _) =
        get(&app, "/api/geocode?q=Cached%20Pl&password=hunter2").await;
    assert_eq!(status, StatusCode::OK);
    let location: Location = serde_json::from_slice(&body).unwrap();
    assert_eq!(location, cached);
}

#[tokio::test]
async fn fallback_journey_renders_with_disruption_badges() {
    // an empty stop graph cannot plan transit, so the dashboard shows the
    // walking fallback with the timetable badge, never an error
    let app = app();
    let uri = format!("/api/screen?device=web-preview&token={}", token());
    let (status, body, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.is_empty());
}
