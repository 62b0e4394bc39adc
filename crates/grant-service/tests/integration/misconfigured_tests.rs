//! Integration tests for a service started without signing credentials.

use reqwest::StatusCode;
use serde_json::Value;
use session_test_utils::{test_config_without_signing, TestGrantServer};

/// Without signing credentials the endpoint answers with a stable error and
/// never a token.
#[tokio::test]
async fn test_token_without_signing_is_server_misconfigured() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestGrantServer::spawn(test_config_without_signing()).await?;

    // Act
    let response = reqwest::get(server.token_url()).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await?;
    assert_eq!(
        body,
        serde_json::json!({
            "error": "Server misconfigured",
            "code": "SERVER_MISCONFIGURED",
        })
    );
    assert!(body.get("token").is_none());

    Ok(())
}

/// Parameters do not change the outcome when the service cannot sign.
#[tokio::test]
async fn test_misconfigured_ignores_parameters() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config_without_signing()).await?;

    let oversized_room = "r".repeat(200);
    for query in [
        "roomName=room-1&participantName=erin".to_string(),
        "interviewType=pairing".to_string(),
        format!("roomName={oversized_room}"),
    ] {
        let response = reqwest::get(format!("{}?{query}", server.token_url())).await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{query}");
        let body: Value = response.json().await?;
        assert_eq!(body["code"], "SERVER_MISCONFIGURED", "{query}");
    }
    Ok(())
}

#[tokio::test]
async fn test_misconfigured_error_does_not_name_variables() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config_without_signing()).await?;

    let text = reqwest::get(server.token_url()).await?.text().await?;

    assert!(!text.contains("SIGNING"));
    assert!(!text.contains("SECRET"));
    Ok(())
}
