//! Scriptable real-time transport for session tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use session_test_utils::MockTransport;
//!
//! let transport = MockTransport::new();
//! // ... spawn a connector with Arc::new(transport.clone()) ...
//! transport.emit(TransportEvent::Interrupted);
//! assert_eq!(transport.connect_count(), 1);
//! ```

use async_trait::async_trait;
use common::grant::peek_grant;
use session_client::transport::{ConnectError, Transport, TransportEvent, TransportLink};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Event buffer of a mock link.
const LINK_EVENT_BUFFER: usize = 64;

/// How the mock answers `connect`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HandshakeMode {
    /// Open a link.
    #[default]
    Accept,
    /// Refuse the grant.
    Reject(String),
    /// Report the endpoint unreachable.
    Unavailable(String),
    /// Never answer.
    Hang,
}

/// A recorded `connect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectCall {
    pub url: String,
    pub token: String,
}

/// Mock transport. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    mode: HandshakeMode,
    /// Events queued on the link as soon as it opens.
    initial_events: Vec<TransportEvent>,
    /// Identity reported on the link instead of the grant subject.
    admitted_identity: Option<String>,
    connect_calls: Vec<ConnectCall>,
    disconnect_count: u32,
    link: Option<mpsc::Sender<TransportEvent>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rejecting(reason: &str) -> Self {
        Self::new().with_mode(HandshakeMode::Reject(reason.to_string()))
    }

    #[must_use]
    pub fn hanging() -> Self {
        Self::new().with_mode(HandshakeMode::Hang)
    }

    #[must_use]
    pub fn with_mode(self, mode: HandshakeMode) -> Self {
        self.set_mode(mode);
        self
    }

    /// Change how later `connect` calls are answered.
    pub fn set_mode(&self, mode: HandshakeMode) {
        self.inner.lock().unwrap().mode = mode;
    }

    /// Queue an event delivered right after the link opens.
    #[must_use]
    pub fn with_initial_event(self, event: TransportEvent) -> Self {
        self.inner.lock().unwrap().initial_events.push(event);
        self
    }

    /// Admit every link as `identity`, whatever the grant names.
    #[must_use]
    pub fn with_admitted_identity(self, identity: &str) -> Self {
        self.inner.lock().unwrap().admitted_identity = Some(identity.to_string());
        self
    }

    /// Push an event onto the open link. Returns `false` without a link.
    pub fn emit(&self, event: TransportEvent) -> bool {
        let sender = self.inner.lock().unwrap().link.clone();
        sender.is_some_and(|tx| tx.try_send(event).is_ok())
    }

    /// Drop the link sender, ending the event stream.
    pub fn drop_link(&self) {
        self.inner.lock().unwrap().link = None;
    }

    pub fn has_link(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .link
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    pub fn connect_calls(&self) -> Vec<ConnectCall> {
        self.inner.lock().unwrap().connect_calls.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.inner.lock().unwrap().connect_calls.len()
    }

    pub fn disconnect_count(&self) -> u32 {
        self.inner.lock().unwrap().disconnect_count
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, url: &str, token: &str) -> Result<TransportLink, ConnectError> {
        let mode = {
            let mut inner = self.inner.lock().unwrap();
            inner.connect_calls.push(ConnectCall {
                url: url.to_string(),
                token: token.to_string(),
            });
            inner.mode.clone()
        };

        match mode {
            HandshakeMode::Accept => {}
            HandshakeMode::Reject(reason) => return Err(ConnectError::Rejected(reason)),
            HandshakeMode::Unavailable(reason) => return Err(ConnectError::Unavailable(reason)),
            HandshakeMode::Hang => std::future::pending::<()>().await,
        }

        let subject = peek_grant(token)
            .map(|claims| claims.sub)
            .map_err(|e| ConnectError::Rejected(e.to_string()))?;

        let (tx, rx) = mpsc::channel(LINK_EVENT_BUFFER);
        let mut inner = self.inner.lock().unwrap();
        let local_identity = inner.admitted_identity.clone().unwrap_or(subject);
        for event in inner.initial_events.drain(..) {
            let _ = tx.try_send(event);
        }
        inner.link = Some(tx);

        Ok(TransportLink {
            local_identity,
            events: rx,
        })
    }

    async fn disconnect(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.disconnect_count += 1;
        inner.link = None;
    }
}
