//! User controls.
//!
//! A thin facade over [`SessionHandle`]. It holds no session state; the
//! microphone state it toggles is read from the latest snapshot.

use crate::actors::SessionHandle;
use crate::errors::SessionError;

#[derive(Clone, Debug)]
pub struct ControlSurface {
    handle: SessionHandle,
}

impl ControlSurface {
    #[must_use]
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn mic_enabled(&self) -> bool {
        self.handle.snapshot().mic_enabled
    }

    /// Flip microphone capture. Returns the new state.
    ///
    /// # Errors
    ///
    /// `MicrophoneUnavailable` when there is no live session.
    pub async fn toggle_microphone(&self) -> Result<bool, SessionError> {
        let enabled = !self.mic_enabled();
        self.handle.set_microphone_enabled(enabled).await?;
        Ok(enabled)
    }

    /// End the interview.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the session already ended.
    pub async fn end_session(&self) -> Result<(), SessionError> {
        self.handle.end().await
    }

    /// Leave the page: tear everything down and stop the connector.
    pub fn leave(&self) {
        self.handle.cancel();
    }
}
