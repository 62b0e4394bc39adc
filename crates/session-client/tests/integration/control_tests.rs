//! User control scenarios.

use crate::harness::spawn_default;
use session_client::control::ControlSurface;
use session_client::presence::Speaker;
use session_client::transport::TransportEvent;
use session_client::{ConnectionState, SessionError};

#[tokio::test]
async fn test_toggle_microphone() {
    let scenario = spawn_default();
    scenario.connect().await;
    let controls = ControlSurface::new(scenario.handle.clone());
    assert!(controls.mic_enabled());

    assert!(!controls.toggle_microphone().await.unwrap());
    assert!(!scenario.mic.is_enabled());
    assert!(!controls.mic_enabled());

    assert!(controls.toggle_microphone().await.unwrap());
    assert!(scenario.mic.is_enabled());
    assert!(scenario.mic.is_held());
}

#[tokio::test]
async fn test_toggle_before_connecting_is_unavailable() {
    let scenario = spawn_default();
    let controls = ControlSurface::new(scenario.handle.clone());

    assert!(matches!(
        controls.toggle_microphone().await,
        Err(SessionError::MicrophoneUnavailable(_))
    ));
    assert_eq!(scenario.mic.acquire_count(), 0);
}

/// A muted user is never shown as speaking.
#[tokio::test]
async fn test_muted_user_is_not_speaking() {
    let scenario = spawn_default();
    let connected = scenario.connect().await;
    let local = connected.subject_identity.unwrap();
    let controls = ControlSurface::new(scenario.handle.clone());

    controls.toggle_microphone().await.unwrap();
    scenario.transport.emit(TransportEvent::AudioActivity {
        identity: local,
        active: true,
    });
    scenario.transport.emit(TransportEvent::ParticipantJoined {
        identity: "agent-1".to_string(),
        role: None,
    });
    let snapshot = scenario
        .handle
        .wait_for(|s| s.agent_identity.is_some())
        .await
        .unwrap();

    assert_eq!(snapshot.display.speaker, Speaker::Idle);
}

#[tokio::test]
async fn test_end_session_and_leave() {
    let scenario = spawn_default();
    scenario.connect().await;
    let controls = ControlSurface::new(scenario.handle.clone());

    controls.end_session().await.unwrap();
    assert_eq!(
        scenario.handle.snapshot().state,
        ConnectionState::Disconnected
    );
    assert_eq!(scenario.mic.release_count(), 1);

    controls.leave();
    scenario.task.await.unwrap();
    // Already released; leaving does not release again.
    assert_eq!(scenario.mic.release_count(), 1);
}
