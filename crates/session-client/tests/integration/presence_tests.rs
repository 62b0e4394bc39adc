//! Participant and speaking-indicator scenarios.

use crate::harness::{config, spawn_default, spawn_with};
use common::types::ParticipantRole;
use session_client::presence::Speaker;
use session_client::transport::TransportEvent;
use session_client::ConnectionState;
use session_test_utils::{MockGrantSource, MockMicrophone, MockTransport};

fn joined(identity: &str, role: Option<ParticipantRole>) -> TransportEvent {
    TransportEvent::ParticipantJoined {
        identity: identity.to_string(),
        role,
    }
}

fn activity(identity: &str, active: bool) -> TransportEvent {
    TransportEvent::AudioActivity {
        identity: identity.to_string(),
        active,
    }
}

#[tokio::test]
async fn test_role_tagged_agent_is_preferred() {
    let transport = MockTransport::new()
        .with_initial_event(joined("observer", None))
        .with_initial_event(joined("coach", Some(ParticipantRole::Agent)));
    let scenario = spawn_with(
        &config(),
        MockGrantSource::new(),
        transport,
        MockMicrophone::new(),
    );
    scenario.connect().await;

    let snapshot = scenario
        .handle
        .wait_for(|s| s.participants.len() == 3)
        .await
        .unwrap();

    assert_eq!(snapshot.agent_identity.as_deref(), Some("coach"));
}

#[tokio::test]
async fn test_first_remote_participant_is_agent_without_roles() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.transport.emit(joined("agent-1", None));
    scenario.transport.emit(joined("late-joiner", None));
    let snapshot = scenario
        .handle
        .wait_for(|s| s.participants.len() == 3)
        .await
        .unwrap();

    assert_eq!(snapshot.agent_identity.as_deref(), Some("agent-1"));
}

#[tokio::test]
async fn test_speaking_indicator_follows_activity() {
    let scenario = spawn_default();
    let connected = scenario.connect().await;
    let local = connected.subject_identity.unwrap();

    scenario.transport.emit(joined("agent-1", Some(ParticipantRole::Agent)));
    scenario.transport.emit(activity(&local, true));
    let snapshot = scenario
        .handle
        .wait_for(|s| s.display.speaker == Speaker::UserSpeaking)
        .await
        .unwrap();
    assert_eq!(snapshot.state, ConnectionState::Connected);

    // Agent activity wins over the user.
    scenario.transport.emit(activity("agent-1", true));
    scenario
        .handle
        .wait_for(|s| s.display.speaker == Speaker::AgentSpeaking)
        .await
        .unwrap();

    scenario.transport.emit(activity("agent-1", false));
    scenario.transport.emit(activity(&local, false));
    scenario
        .handle
        .wait_for(|s| s.display.speaker == Speaker::Idle)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_agent_leaving_reselects() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.transport.emit(joined("agent-1", None));
    scenario.transport.emit(joined("agent-2", None));
    scenario
        .handle
        .wait_for(|s| s.participants.len() == 3)
        .await
        .unwrap();

    scenario.transport.emit(TransportEvent::ParticipantLeft {
        identity: "agent-1".to_string(),
    });
    let snapshot = scenario
        .handle
        .wait_for(|s| s.participants.len() == 2)
        .await
        .unwrap();

    assert_eq!(snapshot.agent_identity.as_deref(), Some("agent-2"));
}

#[tokio::test]
async fn test_speaking_cleared_on_interruption() {
    let scenario = spawn_default();
    scenario.connect().await;

    scenario.transport.emit(activity("agent-1", true));
    scenario
        .handle
        .wait_for(|s| s.display.speaker == Speaker::AgentSpeaking)
        .await
        .unwrap();

    scenario.transport.emit(TransportEvent::Interrupted);
    let snapshot = scenario
        .wait_for_state(ConnectionState::Reconnecting)
        .await;

    assert_eq!(snapshot.display.speaker, Speaker::Idle);
    assert!(snapshot.participants.iter().all(|p| !p.is_speaking));
}
