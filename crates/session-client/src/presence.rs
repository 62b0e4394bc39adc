//! Speaker and link health derivation.
//!
//! [`PresenceTracker`] consumes participant and audio-activity events plus
//! connection state changes, and recomputes the [`DisplaySignal`] on every
//! input. No batching or smoothing is applied.
//!
//! Agent selection: the first participant announced with the `agent` role
//! tag; failing that, the first non-local participant observed.

use crate::state::{ConnectionState, LinkHealth};
use common::types::ParticipantRole;
use serde::Serialize;

/// Who the UI should show as speaking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    AgentSpeaking,
    UserSpeaking,
    #[default]
    Idle,
}

/// Derived, ephemeral UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplaySignal {
    pub speaker: Speaker,
    pub link_health: LinkHealth,
}

impl Default for DisplaySignal {
    fn default() -> Self {
        Self {
            speaker: Speaker::Idle,
            link_health: ConnectionState::Idle.link_health(),
        }
    }
}

/// Per-participant projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub identity: String,
    pub is_local: bool,
    pub is_speaking: bool,
    /// Meaningful for the local participant only.
    pub mic_enabled: bool,
    #[serde(skip)]
    role: Option<ParticipantRole>,
}

#[derive(Debug, Default)]
pub struct PresenceTracker {
    state: Option<ConnectionState>,
    /// Participants in the order first observed.
    participants: Vec<ParticipantView>,
}

impl PresenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the local participant.
    pub fn set_local(&mut self, identity: &str) -> DisplaySignal {
        match self.find_mut(identity) {
            Some(view) => view.is_local = true,
            None => self.participants.push(ParticipantView {
                identity: identity.to_string(),
                is_local: true,
                is_speaking: false,
                mic_enabled: false,
                role: Some(ParticipantRole::Candidate),
            }),
        }
        self.signal()
    }

    /// A remote participant joined, optionally announcing its role.
    pub fn participant_joined(
        &mut self,
        identity: &str,
        role: Option<ParticipantRole>,
    ) -> DisplaySignal {
        match self.find_mut(identity) {
            Some(view) => {
                if role.is_some() {
                    view.role = role;
                }
            }
            None => self.participants.push(ParticipantView {
                identity: identity.to_string(),
                is_local: false,
                is_speaking: false,
                mic_enabled: false,
                role,
            }),
        }
        self.signal()
    }

    /// A remote participant left. The agent is re-selected if it was them.
    pub fn participant_left(&mut self, identity: &str) -> DisplaySignal {
        self.participants
            .retain(|p| p.is_local || p.identity != identity);
        self.signal()
    }

    /// Apply an audio-activity event.
    ///
    /// Ignored outside `Connected`. Activity from an identity not seen yet
    /// counts as that participant being observed.
    pub fn audio_activity(&mut self, identity: &str, active: bool) -> DisplaySignal {
        if self.state != Some(ConnectionState::Connected) {
            return self.signal();
        }

        if self.find_mut(identity).is_none() {
            self.participant_joined(identity, None);
        }
        if let Some(view) = self.find_mut(identity) {
            // A muted local microphone cannot be speaking.
            view.is_speaking = active && (!view.is_local || view.mic_enabled);
        }
        self.signal()
    }

    /// Record the local microphone state.
    pub fn set_local_mic(&mut self, enabled: bool) -> DisplaySignal {
        for view in self.participants.iter_mut().filter(|p| p.is_local) {
            view.mic_enabled = enabled;
            if !enabled {
                view.is_speaking = false;
            }
        }
        self.signal()
    }

    /// Follow a connection state change. Leaving `Connected` clears every
    /// speaking flag.
    pub fn on_state(&mut self, state: ConnectionState) -> DisplaySignal {
        self.state = Some(state);
        if state != ConnectionState::Connected {
            for view in &mut self.participants {
                view.is_speaking = false;
            }
        }
        self.signal()
    }

    /// The participant currently treated as the agent.
    #[must_use]
    pub fn agent(&self) -> Option<&ParticipantView> {
        let remote = || self.participants.iter().filter(|p| !p.is_local);
        remote()
            .find(|p| p.role == Some(ParticipantRole::Agent))
            .or_else(|| remote().next())
    }

    #[must_use]
    pub fn local(&self) -> Option<&ParticipantView> {
        self.participants.iter().find(|p| p.is_local)
    }

    #[must_use]
    pub fn participants(&self) -> &[ParticipantView] {
        &self.participants
    }

    /// Current display signal. Agent activity wins ties.
    #[must_use]
    pub fn signal(&self) -> DisplaySignal {
        let state = self.state.unwrap_or(ConnectionState::Idle);

        let speaker = if state != ConnectionState::Connected {
            Speaker::Idle
        } else if self.agent().is_some_and(|a| a.is_speaking) {
            Speaker::AgentSpeaking
        } else if self.local().is_some_and(|l| l.is_speaking) {
            Speaker::UserSpeaking
        } else {
            Speaker::Idle
        };

        DisplaySignal {
            speaker,
            link_health: state.link_health(),
        }
    }

    fn find_mut(&mut self, identity: &str) -> Option<&mut ParticipantView> {
        self.participants.iter_mut().find(|p| p.identity == identity)
    }
}
