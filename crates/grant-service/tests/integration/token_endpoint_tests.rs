//! Integration tests for `GET /api/token`.

use common::types::InterviewType;
use reqwest::StatusCode;
use serde_json::Value;
use session_test_utils::{test_config, GrantAssertions, TestGrantServer, TEST_TRANSPORT_URL};

async fn get_json(url: &str) -> Result<(StatusCode, Value), anyhow::Error> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

/// A request without parameters gets generated names and a usable grant.
#[tokio::test]
async fn test_token_without_parameters_generates_room() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestGrantServer::spawn(test_config()).await?;

    // Act
    let (status, body) = get_json(&server.token_url()).await?;

    // Assert
    assert_eq!(status, StatusCode::OK);

    let room = body["roomName"].as_str().unwrap();
    let participant = body["participantName"].as_str().unwrap();
    assert!(room.starts_with("interview-"), "room was {room}");
    assert!(participant.starts_with("candidate-"));
    assert_eq!(body["url"], TEST_TRANSPORT_URL);

    body["token"]
        .as_str()
        .unwrap()
        .assert_valid_grant()
        .assert_for_room(room)
        .assert_for_subject(participant)
        .assert_interview_permissions()
        .assert_interview_type(InterviewType::Behavioral)
        .assert_expires_in(3600);

    Ok(())
}

#[tokio::test]
async fn test_token_echoes_supplied_parameters() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let (status, body) = get_json(&format!(
        "{}?roomName=room-7&participantName=dana&interviewType=system_design",
        server.token_url()
    ))
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roomName"], "room-7");
    assert_eq!(body["participantName"], "dana");

    body["token"]
        .as_str()
        .unwrap()
        .assert_for_room("room-7")
        .assert_for_subject("dana")
        .assert_interview_type(InterviewType::SystemDesign);

    Ok(())
}

#[tokio::test]
async fn test_token_expires_at_matches_grant() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let (_, body) = get_json(&server.token_url()).await?;
    let claims = common::grant::peek_grant(body["token"].as_str().unwrap())?;

    assert_eq!(body["expiresAt"].as_i64(), Some(claims.exp));
    Ok(())
}

#[tokio::test]
async fn test_each_request_gets_a_distinct_room() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let (_, first) = get_json(&server.token_url()).await?;
    let (_, second) = get_json(&server.token_url()).await?;

    assert_ne!(first["roomName"], second["roomName"]);
    assert_ne!(first["participantName"], second["participantName"]);
    assert_ne!(first["token"], second["token"]);
    Ok(())
}

#[tokio::test]
async fn test_unknown_interview_type_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let (status, body) = get_json(&format!("{}?interviewType=trivia", server.token_url())).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(body["error"], "Unsupported interview type");
    assert!(body.get("token").is_none());
    Ok(())
}

#[tokio::test]
async fn test_wildcard_room_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let (status, body) = get_json(&format!("{}?roomName=%2A", server.token_url())).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    Ok(())
}

#[tokio::test]
async fn test_cross_origin_requests_are_allowed() -> Result<(), anyhow::Error> {
    let server = TestGrantServer::spawn(test_config()).await?;

    let response = reqwest::Client::new()
        .get(server.token_url())
        .header("Origin", "https://app.example.com")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    Ok(())
}
