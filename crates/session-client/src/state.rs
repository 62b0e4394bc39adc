//! Connection state machine.
//!
//! ```text
//! Idle -> Connecting -> Connected <-> Reconnecting
//!   |         |             |              |
//!   +---------+-------------+--------------+--> Disconnected | Failed
//! ```
//!
//! `Disconnected` and `Failed` are terminal for a session. A new attempt
//! starts a new session from `Idle`.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No attempt started, or grant retrieval in flight.
    Idle,
    /// Grant obtained, transport handshake in progress.
    Connecting,
    /// Handshake acknowledged; audio flowing.
    Connected,
    /// Transient transport loss.
    Reconnecting,
    /// Ended by the user or by teardown.
    Disconnected,
    /// Ended by an error.
    Failed,
}

/// Link health shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkHealth {
    Connecting,
    Live,
    Degraded,
    Lost,
}

impl ConnectionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        }
    }

    /// No transition leaves a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::Failed
        )
    }

    /// Whether a transport link may exist in this state.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Reconnecting
        )
    }

    /// Legal transitions.
    ///
    /// `Idle -> Failed` covers grant retrieval failure, since `Connecting`
    /// may only be entered with a grant in hand. `Connected -> Connecting`
    /// is never legal.
    #[must_use]
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::{Connected, Connecting, Disconnected, Failed, Idle, Reconnecting};

        matches!(
            (self, next),
            (Idle, Connecting | Failed | Disconnected)
                | (Connecting, Connected | Failed | Disconnected)
                | (Connected, Reconnecting | Failed | Disconnected)
                | (Reconnecting, Connected | Failed | Disconnected)
        )
    }

    /// Projection onto the user-facing link health.
    #[must_use]
    pub fn link_health(self) -> LinkHealth {
        match self {
            ConnectionState::Idle | ConnectionState::Connecting => LinkHealth::Connecting,
            ConnectionState::Connected => LinkHealth::Live,
            ConnectionState::Reconnecting => LinkHealth::Degraded,
            ConnectionState::Disconnected | ConnectionState::Failed => LinkHealth::Lost,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
