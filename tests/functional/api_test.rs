//! Functional tests for the HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use virtual_atelier::api::routes::create_router;
use virtual_atelier::config::Settings;
use virtual_atelier::AppState;

use crate::support::{embedded_images, ScriptedBackend};

fn app_with(backend: ScriptedBackend) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Settings::default(), Arc::new(backend)));
    (create_router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn wait_until_idle(state: &AppState) {
    for _ in 0..200 {
        if !state.sequencer.is_active() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run did not finish in time");
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app_with(ScriptedBackend::new());

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["run_active"], false);
}

#[tokio::test]
async fn test_list_jobs_in_order() {
    let (app, _) = app_with(ScriptedBackend::new());

    let (status, body) = send(&app, get("/api/jobs")).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|job| job["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["Frontal", "Profile", "Low Angle", "High Angle", "Details"]
    );
}

#[tokio::test]
async fn test_single_generation() {
    let (app, _) = app_with(ScriptedBackend::new());

    let (status, body) = send(
        &app,
        post_json(
            "/api/generate",
            json!({ "prompt": "full frontal view", "images": embedded_images(2) }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generatedImage"], "data:image/png;base64,IMG0");
}

#[tokio::test]
async fn test_single_generation_failure() {
    let (app, _) = app_with(ScriptedBackend::new().failing_on(&[0]));

    let (status, body) = send(
        &app,
        post_json("/api/generate", json!({ "prompt": "p", "images": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["message"], "scripted failure 0");
}

#[tokio::test]
async fn test_start_run_without_images() {
    let (app, state) = app_with(ScriptedBackend::new());

    let (status, body) = send(&app, post_json("/api/runs", json!({ "referenceImages": [] }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert!(state.sequencer.store().snapshot().is_none());
}

#[tokio::test]
async fn test_current_run_before_any_run() {
    let (app, _) = app_with(ScriptedBackend::new());

    let (status, body) = send(&app, get("/api/runs/current")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "no_run");
}

#[tokio::test]
async fn test_full_run_lifecycle() {
    let (app, state) = app_with(ScriptedBackend::new().failing_on(&[2]));

    let mut images = embedded_images(2);
    images.push("garbage".to_string());
    let (status, body) = send(&app, post_json("/api/runs", json!({ "referenceImages": images }))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["droppedImages"], 1);
    assert_eq!(body["jobs"].as_array().unwrap().len(), 5);
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    wait_until_idle(&state).await;

    let (status, body) = send(&app, get("/api/runs/current")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session_id.as_str());
    assert_eq!(body["progressPercent"], 100);
    assert_eq!(body["statusMessage"], "Finished");
    assert_eq!(body["isActive"], false);
    assert_eq!(body["droppedImages"], 1);
    assert!(body.get("referenceImages").is_none());

    let results = body["results"].as_object().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results["frontal"]["state"], "succeeded");
    assert_eq!(results["frontal"]["image"], "data:image/png;base64,IMG0");
    assert_eq!(results["low-angle"]["state"], "failed");
    assert_eq!(results["low-angle"]["errorMessage"], "scripted failure 2");
}

#[tokio::test]
async fn test_cancel_without_active_run() {
    let (app, _) = app_with(ScriptedBackend::new());

    let (status, body) = send(&app, post_json("/api/runs/current/cancel", json!({}))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "no_active_run");
}
