//! Integration tests for the health, readiness and metrics endpoints.

use reqwest::StatusCode;
use serde_json::Value;
use session_test_utils::{test_config, test_config_without_signing, TestGrantServer};

// ============================================================================
// Liveness
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config_without_signing()).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

// ============================================================================
// Readiness
// ============================================================================

#[tokio::test]
async fn test_ready_when_signing_configured() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    Ok(())
}

#[tokio::test]
async fn test_not_ready_without_signing() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config_without_signing()).await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["signing"], "unconfigured");
    Ok(())
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint_is_exposed() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
