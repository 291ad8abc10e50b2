use super::*;
use crate::backend::test_helpers::{
    FakeEngine, FetchPlan, create_test_backend, quick_success, sample_info,
};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;


/// Router over a fake-engine backend; the tempdir must be kept alive
async fn create_test_app(
    plan: FetchPlan,
) -> (Router, MediaBackend, Arc<FakeEngine>, tempfile::TempDir) {
    let (backend, engine, temp_dir) = create_test_backend(plan).await;
    let app = create_router(backend.clone(), Arc::new(ApiConfig::default()));
    (app, backend, engine, temp_dir)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Send a request and parse the JSON answer
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body).expect("Response should be valid JSON");
    (status, value)
}

/// POST /api/extract for the sample URL, returning the session id
async fn extract_session(app: &Router) -> String {
    let (status, body) = send(
        app,
        post_json("/api/extract", json!({"url": "https://media.example.com/watch?v=1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "extract failed: {body}");
    body["video"]["session_id"].as_str().unwrap().to_string()
}

/// Poll GET /api/status until the job leaves preparing/downloading
async fn poll_until_settled(app: &Router, download_id: &str) -> (StatusCode, Value) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (status, body) = send(app, get(&format!("/api/status/{download_id}"))).await;
        let running = matches!(body["status"].as_str(), Some("preparing" | "downloading"));
        if !running {
            return (status, body);
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "download {download_id} never settled: {body}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
