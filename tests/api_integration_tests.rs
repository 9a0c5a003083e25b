//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use session_store::backend::MemoryEngine;
use session_store::providers::ManualClock;
use session_store::{api::create_router, AppState, SessionConfig, StoreFactory};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let factory = StoreFactory::new(SessionConfig::default(), Arc::new(MemoryEngine::new()))
        .with_clock(clock.clone());
    (create_router(AppState::new(factory)), clock)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "10.0.0.1")
        .header("user-agent", "integration-test")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_session(app: &Router, fields: &str) -> String {
    let (status, json) = send(
        app,
        json_request("POST", "/sessions", &format!(r#"{{"fields":{}}}"#, fields)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["session_id"].as_str().unwrap().to_string()
}

// == Session Endpoints ==

#[tokio::test]
async fn test_create_and_get_session() {
    let (app, _) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;

    let (status, json) = send(&app, get(&format!("/sessions/{}", id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_id"], id.as_str());
    assert_eq!(json["fields"]["UserLogin"], "root");
    assert_eq!(json["fields"]["UserRemoteAddr"], "10.0.0.1");
    assert_eq!(json["fields"]["UserRemoteUserAgent"], "integration-test");
    assert_eq!(json["fields"]["UserSessionStart"], 1_700_000_000);
}

#[tokio::test]
async fn test_list_sessions() {
    let (app, _) = create_test_app();
    let a = create_session(&app, r#"{"UserID":1,"UserLogin":"a"}"#).await;
    let b = create_session(&app, r#"{"UserID":2,"UserLogin":"b"}"#).await;

    let (status, json) = send(&app, get("/sessions")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json["session_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&a.as_str()));
    assert!(ids.contains(&b.as_str()));
}

#[tokio::test]
async fn test_patch_writes_back_update() {
    let (app, _) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;

    let (status, json) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/sessions/{}", id),
            r#"{"field":"Foo","value":"Bar"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["written"], true);

    let (_, json) = send(&app, get(&format!("/sessions/{}", id))).await;
    assert_eq!(json["fields"]["Foo"], "Bar");
}

#[tokio::test]
async fn test_patch_missing_session_not_written() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        &app,
        json_request("PATCH", "/sessions/ghost", r#"{"field":"Foo","value":"Bar"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["written"], false);

    let (status, _) = send(&app, get("/sessions/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session_twice() {
    let (app, _) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;
    let uri = format!("/sessions/{}", id);

    for _ in 0..2 {
        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_all_sessions() {
    let (app, _) = create_test_app();
    create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/sessions")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, get("/sessions")).await;
    assert!(json["session_ids"].as_array().unwrap().is_empty());
}

// == Validation Endpoint ==

#[tokio::test]
async fn test_validate_valid_session() {
    let (app, _) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;

    let (status, json) = send(
        &app,
        get(&format!("/sessions/{}/validate?remote_addr=10.0.0.1", id)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], true);
    assert!(json.get("reason").is_none());
}

#[tokio::test]
async fn test_validate_origin_mismatch_removes_session() {
    let (app, _) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;

    let (_, json) = send(
        &app,
        get(&format!("/sessions/{}/validate?remote_addr=10.0.0.2", id)),
    )
    .await;

    assert_eq!(json["valid"], false);
    assert_eq!(json["reason"], "origin-mismatch");
    assert_eq!(json["message"], "Session invalid. Remote address has changed.");

    let (status, _) = send(&app, get(&format!("/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validate_expired_session() {
    let (app, clock) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;
    clock.advance(SessionConfig::default().max_session_time as i64 + 1);

    let (_, json) = send(
        &app,
        get(&format!("/sessions/{}/validate?remote_addr=10.0.0.1", id)),
    )
    .await;

    assert_eq!(json["valid"], false);
    assert_eq!(json["reason"], "expired");
}

// == Report Endpoints ==

#[tokio::test]
async fn test_active_report_excludes_internal_sessions() {
    let (app, _) = create_test_app();
    create_session(&app, r#"{"UserID":1,"UserLogin":"root","UserType":"User"}"#).await;
    create_session(&app, r#"{"UserID":2,"UserLogin":"jane","UserType":"User"}"#).await;
    create_session(
        &app,
        r#"{"UserID":1,"UserLogin":"root","UserType":"User","SessionSource":"GenericInterface"}"#,
    )
    .await;

    let (status, json) = send(&app, get("/reports/active?user_type=User")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["per_user"]["root"], 1);
    assert_eq!(json["per_user"]["jane"], 1);
}

#[tokio::test]
async fn test_expired_report() {
    let (app, clock) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;
    clock.advance(SessionConfig::default().max_session_time as i64 + 1);

    let (status, json) = send(&app, get("/reports/expired")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["expired"][0], id.as_str());
    assert!(json["idle"].as_array().unwrap().is_empty());
}

// == Stats and Health ==

#[tokio::test]
async fn test_stats_accumulate_across_requests() {
    let (app, _) = create_test_app();
    let id = create_session(&app, r#"{"UserID":1,"UserLogin":"root"}"#).await;
    send(&app, get(&format!("/sessions/{}", id))).await;

    let (status, json) = send(&app, get("/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["backend_reads"], 1);
    assert_eq!(json["decode_failures"], 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_invalid_json_returns_error() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(json_request("POST", "/sessions", "not valid json"))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
