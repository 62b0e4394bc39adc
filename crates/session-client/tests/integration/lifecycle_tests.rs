//! Connect, end and teardown scenarios.

use crate::harness::{collect_states, config, spawn_default, spawn_with};
use common::types::InterviewType;
use session_client::grant_source::SessionRequest;
use session_client::{ConnectionState, SessionError};
use session_test_utils::{
    GrantAssertions, HandshakeMode, MockGrantSource, MockMicrophone, MockTransport,
    TEST_TRANSPORT_URL,
};

#[tokio::test]
async fn test_connect_passes_through_connecting() {
    let scenario = spawn_default();
    let mut events = scenario.handle.subscribe();

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let states = collect_states(&mut events, ConnectionState::Connected).await;

    assert_eq!(
        states,
        vec![
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::Connected
        ]
    );
}

#[tokio::test]
async fn test_connected_snapshot_reflects_grant() {
    let scenario = spawn_default();

    scenario
        .handle
        .start(
            SessionRequest::default()
                .with_room("interview-abc")
                .with_participant("frank")
                .with_interview_type(InterviewType::Technical),
        )
        .await
        .unwrap();
    let snapshot = scenario.wait_for_state(ConnectionState::Connected).await;

    assert_eq!(snapshot.room_id.as_deref(), Some("interview-abc"));
    assert_eq!(snapshot.subject_identity.as_deref(), Some("frank"));
    assert_eq!(snapshot.interview_type, Some(InterviewType::Technical));
    assert!(snapshot.started_at.is_some());
    assert!(snapshot.mic_enabled);
    assert!(scenario.mic.is_held());
    assert!(scenario.mic.is_enabled());
}

/// The grant is used for exactly one handshake, against the address it came
/// with.
#[tokio::test]
async fn test_single_handshake_per_grant() {
    let scenario = spawn_default();
    scenario.connect().await;

    let calls = scenario.transport.connect_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, TEST_TRANSPORT_URL);
    calls[0].token.assert_valid_grant();
    assert_eq!(scenario.source.fetch_count(), 1);
}

#[tokio::test]
async fn test_rejected_handshake_fails_and_releases_microphone() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        MockTransport::rejecting("grant refused"),
        MockMicrophone::new(),
    );
    let mut events = scenario.handle.subscribe();

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let states = collect_states(&mut events, ConnectionState::Failed).await;
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(
        states,
        vec![
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::Failed
        ]
    );
    assert_eq!(
        snapshot.error,
        Some(SessionError::HandshakeRejected("grant refused".to_string()))
    );
    assert_eq!(scenario.mic.acquire_count(), 1);
    assert_eq!(scenario.mic.release_count(), 1);
    assert!(!scenario.mic.is_held());
    assert_eq!(snapshot.elapsed_seconds, 0);
}

#[tokio::test]
async fn test_link_under_another_identity_is_rejected() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        MockTransport::new().with_admitted_identity("someone-else"),
        MockMicrophone::new(),
    );

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(snapshot.state, ConnectionState::Failed);
    assert!(matches!(
        snapshot.error,
        Some(SessionError::HandshakeRejected(_))
    ));
    assert_eq!(scenario.transport.disconnect_count(), 1);
    assert!(!scenario.transport.has_link());
    assert!(!scenario.mic.is_held());
    assert!(!scenario.mic.is_enabled());
}

#[tokio::test]
async fn test_unreachable_transport_is_transport_failure() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        MockTransport::new().with_mode(HandshakeMode::Unavailable("dns".to_string())),
        MockMicrophone::new(),
    );

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(
        snapshot.error,
        Some(SessionError::TransportFailed("dns".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_handshake_timeout() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        MockTransport::hanging(),
        MockMicrophone::new(),
    );

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(snapshot.state, ConnectionState::Failed);
    assert_eq!(snapshot.error, Some(SessionError::HandshakeTimeout));
    assert!(!scenario.mic.is_held());
    assert_eq!(scenario.transport.disconnect_count(), 1);
}

#[tokio::test]
async fn test_grant_fetch_failure_never_connects() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::failing(SessionError::Misconfigured),
        MockTransport::new(),
        MockMicrophone::new(),
    );
    let mut events = scenario.handle.subscribe();

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let states = collect_states(&mut events, ConnectionState::Failed).await;

    assert_eq!(states, vec![ConnectionState::Idle, ConnectionState::Failed]);
    assert_eq!(scenario.transport.connect_count(), 0);
    assert_eq!(scenario.mic.acquire_count(), 0);
}

#[tokio::test]
async fn test_expired_grant_is_not_used() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::expiring_in(-30),
        MockTransport::new(),
        MockMicrophone::new(),
    );

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(snapshot.error, Some(SessionError::GrantExpired));
    assert_eq!(scenario.transport.connect_count(), 0);
}

#[tokio::test]
async fn test_denied_microphone_fails_before_handshake() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        MockTransport::new(),
        MockMicrophone::denied("permission denied"),
    );

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(
        snapshot.error,
        Some(SessionError::MicrophoneUnavailable(
            "permission denied".to_string()
        ))
    );
    assert_eq!(scenario.transport.connect_count(), 0);
}

#[tokio::test]
async fn test_start_while_attempt_in_flight_is_rejected() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::hanging(),
        MockTransport::new(),
        MockMicrophone::new(),
    );

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    let second = scenario.handle.start(SessionRequest::default()).await;

    assert_eq!(
        second,
        Err(SessionError::InvalidTransition {
            from: ConnectionState::Idle,
            to: ConnectionState::Connecting,
        })
    );
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_end_releases_everything() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.handle.end().await.unwrap();
    let snapshot = scenario.handle.snapshot();

    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert!(snapshot.error.is_none());
    assert!(!snapshot.mic_enabled);
    assert_eq!(scenario.mic.release_count(), 1);
    assert!(!scenario.mic.is_held());
    assert_eq!(scenario.transport.disconnect_count(), 1);
    assert!(!scenario.transport.has_link());
}

#[tokio::test]
async fn test_end_twice_is_invalid() {
    let scenario = spawn_default();
    scenario.connect().await;
    scenario.handle.end().await.unwrap();

    assert!(matches!(
        scenario.handle.end().await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert_eq!(scenario.mic.release_count(), 1);
}

/// Navigating away tears the session down exactly like ending it.
#[tokio::test]
async fn test_cancel_releases_everything_and_stops() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.handle.cancel();
    scenario.task.await.unwrap();

    assert_eq!(scenario.mic.release_count(), 1);
    assert!(!scenario.mic.is_held());
    assert_eq!(scenario.transport.disconnect_count(), 1);
}

#[tokio::test]
async fn test_dropping_handles_tears_down() {
    let scenario = spawn_default();
    scenario.connect().await;

    let mic = scenario.mic.clone();
    let task = scenario.task;
    drop(scenario.handle);
    task.await.unwrap();

    assert_eq!(mic.release_count(), 1);
    assert!(!mic.is_held());
}

#[tokio::test]
async fn test_end_while_connecting_disconnects() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        MockTransport::hanging(),
        MockMicrophone::new(),
    );

    scenario.handle.start(SessionRequest::default()).await.unwrap();
    scenario.wait_for_state(ConnectionState::Connecting).await;
    scenario.handle.end().await.unwrap();

    assert_eq!(
        scenario.handle.snapshot().state,
        ConnectionState::Disconnected
    );
    assert_eq!(scenario.mic.release_count(), 1);
}

/// A terminal session is replaced by a fresh one on the next start.
#[tokio::test]
async fn test_restart_after_failure() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        MockTransport::rejecting("busy"),
        MockMicrophone::new(),
    );
    scenario.handle.start(SessionRequest::default()).await.unwrap();
    scenario.wait_for_terminal().await;

    scenario.transport.set_mode(HandshakeMode::Accept);
    let snapshot = scenario.connect().await;

    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert_eq!(scenario.transport.connect_count(), 2);
    assert_eq!(scenario.source.fetch_count(), 2);
}
