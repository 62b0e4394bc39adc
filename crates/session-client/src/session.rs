//! Session aggregate.
//!
//! One `Session` per interview attempt. It is owned by the connector actor
//! and only changes through [`Session::transition`], which enforces the
//! legal transitions of [`ConnectionState`].

use crate::clock::format_elapsed;
use crate::errors::SessionError;
use crate::presence::{DisplaySignal, ParticipantView};
use crate::state::ConnectionState;
use chrono::{DateTime, Utc};
use common::grant::GrantClaims;
use common::types::InterviewType;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug)]
pub struct Session {
    grant: Option<GrantClaims>,
    state: ConnectionState,
    started_at: Option<DateTime<Utc>>,
    error: Option<SessionError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            grant: None,
            state: ConnectionState::Idle,
            started_at: None,
            error: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.grant.as_ref().map(|g| g.room.name.as_str())
    }

    #[must_use]
    pub fn subject_identity(&self) -> Option<&str> {
        self.grant.as_ref().map(|g| g.sub.as_str())
    }

    #[must_use]
    pub fn interview_type(&self) -> Option<InterviewType> {
        self.grant.as_ref().map(|g| g.metadata.interview_type)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// The error that ended the session, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Adopt the identity, room and category carried by the grant.
    pub fn bind_grant(&mut self, claims: GrantClaims) {
        self.grant = Some(claims);
    }

    /// Whether the bound grant has expired at `now`. `false` when unbound.
    #[must_use]
    pub fn grant_expired_at(&self, now: i64) -> bool {
        self.grant.as_ref().is_some_and(|g| g.is_expired_at(now))
    }

    /// Validity left on the bound grant at `now`. `None` when unbound.
    #[must_use]
    pub fn grant_remaining_at(&self, now: i64) -> Option<Duration> {
        self.grant.as_ref().map(|g| g.remaining_at(now))
    }

    /// Move to `to`. Returns the previous state.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the move is not legal; state is unchanged.
    pub fn transition(&mut self, to: ConnectionState) -> Result<ConnectionState, SessionError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(SessionError::InvalidTransition { from, to });
        }
        if to == ConnectionState::Connecting && self.grant.is_none() {
            return Err(SessionError::InvalidTransition { from, to });
        }

        self.state = to;
        if to == ConnectionState::Connected && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        Ok(from)
    }

    /// Move to `Failed`, recording the cause.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when already terminal.
    pub fn fail(&mut self, error: SessionError) -> Result<ConnectionState, SessionError> {
        let from = self.transition(ConnectionState::Failed)?;
        self.error = Some(error);
        Ok(from)
    }
}

/// Point-in-time view of the session published to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    pub room_id: Option<String>,
    pub subject_identity: Option<String>,
    pub interview_type: Option<InterviewType>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub display: DisplaySignal,
    pub mic_enabled: bool,
    pub agent_identity: Option<String>,
    pub participants: Vec<ParticipantView>,
    #[serde(skip)]
    pub error: Option<SessionError>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: ConnectionState::Idle,
            room_id: None,
            subject_identity: None,
            interview_type: None,
            started_at: None,
            elapsed_seconds: 0,
            display: DisplaySignal::default(),
            mic_enabled: false,
            agent_identity: None,
            participants: Vec::new(),
            error: None,
        }
    }
}

impl SessionSnapshot {
    /// Elapsed connected time as `m:ss`.
    #[must_use]
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }
}

/// Notification broadcast by the connector.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
        error: Option<SessionError>,
    },
    DisplayChanged(DisplaySignal),
    Tick {
        elapsed_seconds: u64,
    },
}
