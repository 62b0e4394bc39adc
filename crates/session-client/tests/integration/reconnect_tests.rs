//! Interruption, resumption and remote close scenarios.

use crate::harness::{collect_states, config, spawn_default, spawn_with};
use session_client::state::LinkHealth;
use session_client::transport::TransportEvent;
use session_client::{ConnectionState, SessionError};
use session_test_utils::{MockGrantSource, MockMicrophone, MockTransport};

#[tokio::test(start_paused = true)]
async fn test_interruption_then_resume() {
    let scenario = spawn_default();
    scenario.connect().await;
    let mut events = scenario.handle.subscribe();

    assert!(scenario.transport.emit(TransportEvent::Interrupted));
    let degraded = scenario.wait_for_state(ConnectionState::Reconnecting).await;
    assert_eq!(degraded.display.link_health, LinkHealth::Degraded);
    assert!(degraded.error.is_none());

    assert!(scenario.transport.emit(TransportEvent::Resumed));
    let live = scenario.wait_for_state(ConnectionState::Connected).await;
    assert_eq!(live.display.link_health, LinkHealth::Live);

    let states = collect_states(&mut events, ConnectionState::Connected).await;
    assert_eq!(
        states,
        vec![
            ConnectionState::Connected,
            ConnectionState::Reconnecting,
            ConnectionState::Connected
        ]
    );
    // Resuming does not fetch a new grant or reopen the link.
    assert_eq!(scenario.transport.connect_count(), 1);
    assert_eq!(scenario.source.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_window_elapses() {
    let scenario = spawn_default();
    scenario.connect().await;

    let started = tokio::time::Instant::now();
    scenario.transport.emit(TransportEvent::Interrupted);
    scenario.wait_for_state(ConnectionState::Reconnecting).await;
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(snapshot.state, ConnectionState::Failed);
    assert_eq!(snapshot.error, Some(SessionError::ReconnectTimeout));
    assert!(started.elapsed() >= config().reconnect_timeout);
    assert!(!scenario.mic.is_held());
    assert_eq!(scenario.transport.disconnect_count(), 1);
}

/// A grant that runs out before the reconnect window ends fails the
/// session as expired.
#[tokio::test(start_paused = true)]
async fn test_grant_expires_while_reconnecting() {
    let scenario = spawn_with(
        &config(),
        MockGrantSource::expiring_in(5),
        MockTransport::new(),
        MockMicrophone::new(),
    );
    scenario.connect().await;

    let started = tokio::time::Instant::now();
    scenario.transport.emit(TransportEvent::Interrupted);
    scenario.wait_for_state(ConnectionState::Reconnecting).await;
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(snapshot.error, Some(SessionError::GrantExpired));
    assert!(started.elapsed() < config().reconnect_timeout);
}

#[tokio::test]
async fn test_remote_close_while_connected_disconnects() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.transport.emit(TransportEvent::Closed {
        reason: "room closed".to_string(),
    });
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert!(snapshot.error.is_none());
    assert_eq!(scenario.mic.release_count(), 1);
}

#[tokio::test]
async fn test_stream_end_while_reconnecting_fails() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.transport.emit(TransportEvent::Interrupted);
    scenario.wait_for_state(ConnectionState::Reconnecting).await;
    scenario.transport.drop_link();
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(snapshot.state, ConnectionState::Failed);
    assert!(matches!(
        snapshot.error,
        Some(SessionError::TransportFailed(_))
    ));
}

#[tokio::test]
async fn test_fatal_transport_error_fails() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.transport.emit(TransportEvent::Fatal {
        reason: "media server crashed".to_string(),
    });
    let snapshot = scenario.wait_for_terminal().await;

    assert_eq!(
        snapshot.error,
        Some(SessionError::TransportFailed(
            "media server crashed".to_string()
        ))
    );
    assert_eq!(snapshot.display.link_health, LinkHealth::Lost);
}

#[tokio::test]
async fn test_resume_without_interruption_is_ignored() {
    let scenario = spawn_default();
    scenario.connect().await;
    let mut events = scenario.handle.subscribe();

    scenario.transport.emit(TransportEvent::Resumed);
    scenario.handle.end().await.unwrap();

    let states = collect_states(&mut events, ConnectionState::Disconnected).await;
    assert_eq!(
        states,
        vec![ConnectionState::Connected, ConnectionState::Disconnected]
    );
}
