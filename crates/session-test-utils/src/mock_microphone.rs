//! Microphone capture mock that tracks acquisition and release.

use session_client::transport::{MicrophoneCapture, MicrophoneError};
use std::sync::{Arc, Mutex};

/// Mock microphone. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockMicrophone {
    inner: Arc<Mutex<MockMicrophoneInner>>,
}

#[derive(Debug, Default)]
struct MockMicrophoneInner {
    deny: Option<String>,
    held: bool,
    enabled: bool,
    acquire_count: u32,
    release_count: u32,
}

impl MockMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that refuses access, as on a denied permission prompt.
    #[must_use]
    pub fn denied(reason: &str) -> Self {
        let mic = Self::new();
        mic.inner.lock().unwrap().deny = Some(reason.to_string());
        mic
    }

    pub fn is_held(&self) -> bool {
        self.inner.lock().unwrap().held
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().unwrap().enabled
    }

    pub fn acquire_count(&self) -> u32 {
        self.inner.lock().unwrap().acquire_count
    }

    pub fn release_count(&self) -> u32 {
        self.inner.lock().unwrap().release_count
    }
}

impl MicrophoneCapture for MockMicrophone {
    fn acquire(&self) -> Result<(), MicrophoneError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = &inner.deny {
            return Err(MicrophoneError(reason.clone()));
        }
        inner.acquire_count += 1;
        inner.held = true;
        Ok(())
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), MicrophoneError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.held {
            return Err(MicrophoneError("device not acquired".to_string()));
        }
        inner.enabled = enabled;
        Ok(())
    }

    fn release(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.release_count += 1;
        inner.held = false;
        inner.enabled = false;
    }
}
