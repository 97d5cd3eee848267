use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use jumprun_core::{
    Notification, NotificationKind, NotificationPort, ReplaySource, TelemetrySnapshot,
    TelemetrySource,
};

use crate::{api, config::Config, state::AppState};

type Sent = Arc<Mutex<Vec<Notification>>>;

fn setup_app_with(
    source: Option<Arc<dyn TelemetrySource>>,
) -> (axum::Router, Arc<AppState>, Sent) {
    let mut config = Config::from_env();
    config.default_dropzone = "mile_hi".to_string();
    config.stop_timeout_secs = 5;

    let sent: Sent = Arc::new(Mutex::new(Vec::new()));
    let sink = sent.clone();
    let notifier: Arc<dyn NotificationPort> =
        Arc::new(move |notification: Notification| sink.lock().unwrap().push(notification));

    let state = Arc::new(AppState::new(config, source, Some(notifier)));
    let app = api::routes().with_state(state.clone());
    (app, state, sent)
}

fn setup_app() -> (axum::Router, Arc<AppState>, Sent) {
    let snapshot = TelemetrySnapshot::default()
        .with_altitude(9000.0)
        .with_ground_speed(120.0);
    let source: Arc<dyn TelemetrySource> = Arc::new(ReplaySource::new(vec![Some(snapshot); 1000]));
    setup_app_with(Some(source))
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn info_texts(sent: &Sent) -> Vec<String> {
    sent.lock()
        .unwrap()
        .iter()
        .filter(|n| n.kind == NotificationKind::Info)
        .map(|n| n.text.clone())
        .collect()
}

/// Slack commands run in a spawned task; give it time to finish.
async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn slack_message(text: &str) -> Value {
    json!({
        "type": "event_callback",
        "event": {"type": "message", "text": text}
    })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn slack_url_verification_echoes_challenge() {
    let (app, _state, _sent) = setup_app();

    let res = app
        .oneshot(json_request(
            "POST",
            "/slack/events",
            json!({"type": "url_verification", "challenge": "abc123"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"abc123");
}

#[tokio::test]
async fn start_status_and_stop_over_rest() {
    let (app, _state, _sent) = setup_app();

    let start = app
        .clone()
        .oneshot(json_request("POST", "/v1/trackers", json!({"plane": "king_air"})))
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::CREATED);
    let body = read_json(start).await;
    assert_eq!(body["hex"], "ACBC30");
    assert_eq!(body["outcome"], "started");

    let again = app
        .clone()
        .oneshot(json_request("POST", "/v1/trackers", json!({"hex": "acbc30"})))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(read_json(again).await["outcome"], "already_active");

    let status = app
        .clone()
        .oneshot(empty_request("GET", "/v1/trackers/acbc30"))
        .await
        .unwrap();
    assert_eq!(status.status(), StatusCode::OK);
    let body = read_json(status).await;
    assert_eq!(body["state"], "active");
    assert_eq!(body["dropzone"], "mile_hi");

    let stop = app
        .clone()
        .oneshot(empty_request("DELETE", "/v1/trackers/ACBC30"))
        .await
        .unwrap();
    assert_eq!(stop.status(), StatusCode::OK);
    assert_eq!(read_json(stop).await["outcome"], "stopped");

    let list = app.oneshot(empty_request("GET", "/v1/trackers")).await.unwrap();
    assert_eq!(read_json(list).await, json!([]));
}

#[tokio::test]
async fn rest_start_and_stop_post_notices() {
    let (app, _state, sent) = setup_app();

    let start = app
        .clone()
        .oneshot(json_request("POST", "/v1/trackers", json!({"plane": "king_air"})))
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::CREATED);

    let again = app
        .clone()
        .oneshot(json_request("POST", "/v1/trackers", json!({"plane": "king_air"})))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);

    let stop = app
        .clone()
        .oneshot(empty_request("DELETE", "/v1/trackers/ACBC30"))
        .await
        .unwrap();
    assert_eq!(read_json(stop).await["outcome"], "stopped");

    // Stopping again is a no-op and stays quiet.
    app.oneshot(empty_request("DELETE", "/v1/trackers/ACBC30"))
        .await
        .unwrap();

    assert_eq!(
        info_texts(&sent),
        vec![
            "✅ Started tracking Mile-Hi Skydiving King Air (ACBC30) at Mile-Hi Skydiving, Longmont"
                .to_string(),
            "🛑 Stopped tracking ACBC30".to_string(),
        ]
    );
    let sent = sent.lock().unwrap();
    assert_eq!(sent[0].aircraft, "Mile-Hi Skydiving King Air (ACBC30)");
}

#[tokio::test]
async fn start_without_api_key_is_unavailable() {
    let (app, state, _sent) = setup_app_with(None);

    let res = app
        .oneshot(json_request("POST", "/v1/trackers", json!({"plane": "twin_otter"})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json(res).await;
    assert_eq!(body["error"], "RAPIDAPI_KEY is not configured");
    assert!(state.list().is_empty());
}

#[tokio::test]
async fn bad_hex_is_rejected_and_unknown_hex_is_inactive() {
    let (app, _state, _sent) = setup_app();

    let bad = app
        .clone()
        .oneshot(empty_request("GET", "/v1/trackers/nothex"))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .clone()
        .oneshot(empty_request("GET", "/v1/trackers/ABCDEF"))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::OK);
    let body = read_json(unknown).await;
    assert_eq!(body["state"], "inactive");
    assert_eq!(body["phase"], Value::Null);

    let stop = app
        .oneshot(empty_request("DELETE", "/v1/trackers/ABCDEF"))
        .await
        .unwrap();
    assert_eq!(read_json(stop).await["outcome"], "not_tracking");
}

#[tokio::test]
async fn slack_start_message_starts_and_replies_once() {
    let (app, state, sent) = setup_app();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/slack/events",
            slack_message("start plane=twin_otter dz=mile_hi"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    wait_until(|| state.registry().active_count() == 1).await;
    assert_eq!(state.registry().active_count(), 1);

    let replies = info_texts(&sent);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("✅ Started tracking Mile-Hi Skydiving Twin Otter"));

    // Our own bot replies echo back as events and must be ignored.
    let echo = app
        .oneshot(json_request(
            "POST",
            "/slack/events",
            json!({
                "type": "event_callback",
                "event": {"type": "message", "text": "stop", "bot_id": "B01"}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(echo.status(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(state.registry().active_count(), 1);

    state.clear().await;
}

#[tokio::test]
async fn slack_stop_is_announced_once() {
    let (app, state, sent) = setup_app();
    state
        .start(&crate::state::StartRequest {
            plane: Some("king_air".to_string()),
            ..Default::default()
        })
        .unwrap();

    app.oneshot(json_request(
        "POST",
        "/slack/events",
        slack_message("stop plane=king_air"),
    ))
    .await
    .unwrap();
    wait_until(|| info_texts(&sent).len() >= 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let notices = info_texts(&sent);
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[1], "🛑 Stopped tracking ACBC30");
    assert_eq!(state.registry().active_count(), 0);
}

#[tokio::test]
async fn slack_redelivery_is_ignored() {
    let (app, state, sent) = setup_app();

    let mut request = json_request(
        "POST",
        "/slack/events",
        slack_message("start plane=king_air"),
    );
    request
        .headers_mut()
        .insert("x-slack-retry-num", "1".parse().unwrap());
    let res = app.oneshot(request).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(state.list().is_empty());
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn slack_invalid_plane_replies_with_error() {
    let (app, state, sent) = setup_app();

    app.oneshot(json_request(
        "POST",
        "/slack/events",
        json!({"event": {"type": "message", "text": "start plane=cessna"}}),
    ))
    .await
    .unwrap();
    wait_until(|| !sent.lock().unwrap().is_empty()).await;

    assert!(state.list().is_empty());
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "❌ Invalid plane \"cessna\"");
}
