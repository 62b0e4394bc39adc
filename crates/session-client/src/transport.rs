//! Real-time transport and microphone seams.
//!
//! The media transport and the capture device are external collaborators.
//! The connector talks to them only through [`Transport`] and
//! [`MicrophoneCapture`], which tests replace with mocks.

use async_trait::async_trait;
use common::types::ParticipantRole;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Event emitted by an open transport link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A remote participant joined. `role` comes from their grant metadata
    /// when the transport exposes it.
    ParticipantJoined {
        identity: String,
        role: Option<ParticipantRole>,
    },
    ParticipantLeft {
        identity: String,
    },
    /// Voice activity detection result for one participant.
    AudioActivity {
        identity: String,
        active: bool,
    },
    /// Link lost without explicit termination.
    Interrupted,
    /// Link restored after `Interrupted`.
    Resumed,
    /// Remote side closed the session.
    Closed {
        reason: String,
    },
    /// Non-recoverable transport error.
    Fatal {
        reason: String,
    },
}

/// An established transport connection.
pub struct TransportLink {
    /// Identity the transport admitted us as. The connector fails the
    /// handshake unless it matches the grant subject.
    pub local_identity: String,

    /// Events for this link. Closed when the link goes away.
    pub events: mpsc::Receiver<TransportEvent>,
}

impl fmt::Debug for TransportLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportLink")
            .field("local_identity", &self.local_identity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The transport refused the grant (invalid, expired, bad signature).
    #[error("Grant rejected: {0}")]
    Rejected(String),

    /// The transport could not be reached or failed mid-handshake.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Real-time audio transport.
///
/// `connect` is called at most once per grant.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session with `token` against `url`. Resolves on handshake
    /// acknowledgment or rejection.
    async fn connect(&self, url: &str, token: &str) -> Result<TransportLink, ConnectError>;

    /// Close the current link, if any.
    async fn disconnect(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Microphone error: {0}")]
pub struct MicrophoneError(pub String);

/// Local audio capture device.
///
/// Methods are synchronous so release can run from `Drop`.
pub trait MicrophoneCapture: Send + Sync {
    fn acquire(&self) -> Result<(), MicrophoneError>;
    fn set_enabled(&self, enabled: bool) -> Result<(), MicrophoneError>;
    fn release(&self);
}

/// Owns an acquired microphone and releases it exactly once, either through
/// [`MicrophoneGuard::release`] or on drop.
pub struct MicrophoneGuard {
    capture: Arc<dyn MicrophoneCapture>,
    enabled: bool,
    released: bool,
}

impl MicrophoneGuard {
    /// Acquire the device. Capture starts disabled.
    pub fn acquire(capture: Arc<dyn MicrophoneCapture>) -> Result<Self, MicrophoneError> {
        capture.acquire()?;
        Ok(Self {
            capture,
            enabled: false,
            released: false,
        })
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), MicrophoneError> {
        self.capture.set_enabled(enabled)?;
        self.enabled = enabled;
        Ok(())
    }

    /// Release the device now.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.enabled = false;
            self.capture.release();
            tracing::debug!(target: "session.microphone", "Microphone released");
        }
    }
}

impl Drop for MicrophoneGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for MicrophoneGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrophoneGuard")
            .field("enabled", &self.enabled)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
