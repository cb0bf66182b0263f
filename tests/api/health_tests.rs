//! Health Check Endpoint Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_liveness_probe() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app.server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_dependencies() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app.server.get("/health/ready").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_ne!(body["status"], "unhealthy");
    assert!(body["checks"]["database"]["latency_ms"].is_u64());
    assert!(body["checks"]["redis"]["status"].is_string());
}

#[tokio::test]
async fn test_security_headers_present() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app.server.get("/health").await;

    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
}

#[tokio::test]
async fn test_metrics_exposition() {
    let Some(app) = TestApp::spawn().await else { return };

    // Generate at least one recorded request first
    app.server.get("/health").await;
    let response = app.server.get("/metrics").await;

    response.assert_status(StatusCode::OK);
    assert!(response.text().contains("http_requests_total"));
}
