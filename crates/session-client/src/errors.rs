//! Session error taxonomy.
//!
//! Every error carries a stable `error_code()` and a `client_message()` safe
//! to show the user. Errors are `Clone` because the terminal error is kept in
//! session snapshots and broadcast to subscribers.

use crate::state::ConnectionState;
use crate::transport::{ConnectError, MicrophoneError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The credential endpoint cannot sign grants.
    #[error("Credential endpoint is misconfigured")]
    Misconfigured,

    /// Network failure or non-success response from the credential endpoint.
    /// `status` is `None` when no response was received.
    #[error("Credential fetch failed (status {status:?}): {message}")]
    CredentialFetchFailed {
        status: Option<u16>,
        message: String,
    },

    /// The transport refused the grant.
    #[error("Handshake rejected: {0}")]
    HandshakeRejected(String),

    #[error("Handshake timed out")]
    HandshakeTimeout,

    /// Transient loss while connected. Handled by `Reconnecting`.
    #[error("Transport interrupted")]
    TransportInterrupted,

    #[error("Grant expired")]
    GrantExpired,

    #[error("Reconnect window elapsed")]
    ReconnectTimeout,

    /// Non-recoverable transport error.
    #[error("Transport failed: {0}")]
    TransportFailed(String),

    #[error("Microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// The connector task is gone.
    #[error("Session connector is not running")]
    ChannelClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Stable, machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Misconfigured => "SERVER_MISCONFIGURED",
            SessionError::CredentialFetchFailed { .. } => "CREDENTIAL_FETCH_FAILED",
            SessionError::HandshakeRejected(_) => "HANDSHAKE_REJECTED",
            SessionError::HandshakeTimeout => "HANDSHAKE_TIMEOUT",
            SessionError::TransportInterrupted => "TRANSPORT_INTERRUPTED",
            SessionError::GrantExpired => "GRANT_EXPIRED",
            SessionError::ReconnectTimeout => "RECONNECT_TIMEOUT",
            SessionError::TransportFailed(_) => "TRANSPORT_FAILED",
            SessionError::MicrophoneUnavailable(_) => "MICROPHONE_UNAVAILABLE",
            SessionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SessionError::ChannelClosed => "CHANNEL_CLOSED",
            SessionError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message suitable for display.
    ///
    /// Credential fetch failures surface the raw status and diagnostic text
    /// so the user can tell "server down" from "network unreachable".
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            SessionError::Misconfigured => {
                "The interview server is not configured to start sessions".to_string()
            }
            SessionError::CredentialFetchFailed {
                status: Some(status),
                message,
            } => format!("Could not get session credentials (HTTP {status}): {message}"),
            SessionError::CredentialFetchFailed {
                status: None,
                message,
            } => format!("Could not reach the interview server: {message}"),
            SessionError::HandshakeRejected(_) => {
                "The session server rejected the connection".to_string()
            }
            SessionError::HandshakeTimeout => "Connecting took too long".to_string(),
            SessionError::TransportInterrupted => "Connection interrupted".to_string(),
            SessionError::GrantExpired => "Your session credentials expired".to_string(),
            SessionError::ReconnectTimeout => "Could not restore the connection".to_string(),
            SessionError::TransportFailed(_) => "The connection was lost".to_string(),
            SessionError::MicrophoneUnavailable(_) => "Microphone is unavailable".to_string(),
            SessionError::InvalidTransition { .. }
            | SessionError::ChannelClosed
            | SessionError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<ConnectError> for SessionError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Rejected(reason) => SessionError::HandshakeRejected(reason),
            ConnectError::Unavailable(reason) => SessionError::TransportFailed(reason),
        }
    }
}

impl From<MicrophoneError> for SessionError {
    fn from(err: MicrophoneError) -> Self {
        SessionError::MicrophoneUnavailable(err.0)
    }
}
