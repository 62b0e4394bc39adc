//! `SessionConnector` - owns one client's interview session.
//!
//! The connector:
//! - Fetches a grant, then opens exactly one transport connection with it
//! - Drives the [`Session`] state machine from transport outcomes and events
//! - Feeds the [`PresenceTracker`] and [`SessionClock`]
//! - Publishes a [`SessionSnapshot`] (watch) and [`SessionEvent`]s (broadcast)
//!
//! # Serialization
//!
//! Grant retrieval, the handshake, transport events, the one-second tick and
//! user commands all resume on the actor task through a single `select!`
//! loop. At most one grant fetch or handshake is in flight at a time.
//!
//! # Teardown
//!
//! Every exit path (user end, navigation/cancel, error, handle drop) stops
//! the tick timer, drops the event subscription and releases the microphone
//! in one step before the state change is published. Dropping the actor
//! releases the microphone through [`MicrophoneGuard`]'s `Drop`.

use super::messages::{ConnectorMessage, Reply};
use crate::config::ClientConfig;
use crate::errors::SessionError;
use crate::grant_source::{FetchedGrant, GrantSource, SessionRequest};
use crate::presence::{DisplaySignal, PresenceTracker};
use crate::session::{Session, SessionEvent, SessionSnapshot};
use crate::clock::SessionClock;
use crate::state::ConnectionState;
use crate::transport::{MicrophoneCapture, MicrophoneGuard, Transport, TransportEvent, TransportLink};

use common::grant::peek_grant;
use common::secret::ExposeSecret;
use futures::future::BoxFuture;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Mailbox capacity.
const CONNECTOR_CHANNEL_BUFFER: usize = 32;

/// Broadcast capacity for session events. Slow subscribers lag.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Session clock resolution.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a `SessionConnector`.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<ConnectorMessage>,
    cancel_token: CancellationToken,
    snapshot: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Request a grant and connect.
    ///
    /// Returns once the request is accepted; progress is observable through
    /// [`Self::watch`] and [`Self::subscribe`]. From a terminal state this
    /// discards the old session and starts a new one.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if an attempt is already in progress.
    pub async fn start(&self, request: SessionRequest) -> Result<(), SessionError> {
        self.request(|respond_to| ConnectorMessage::Start {
            request,
            respond_to,
        })
        .await
    }

    /// Enable or disable microphone capture.
    ///
    /// # Errors
    ///
    /// `MicrophoneUnavailable` outside `Connected`/`Reconnecting` or when the
    /// device refuses.
    pub async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.request(|respond_to| ConnectorMessage::SetMicrophone {
            enabled,
            respond_to,
        })
        .await
    }

    /// End the session (`-> Disconnected`).
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the session is already terminal.
    pub async fn end(&self) -> Result<(), SessionError> {
        self.request(|respond_to| ConnectorMessage::End { respond_to })
            .await
    }

    /// Tear down as on navigation away. The actor releases everything and
    /// exits.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to session events from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Wait until a snapshot satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// `ChannelClosed` if the connector exits first.
    pub async fn wait_for<F>(&self, predicate: F) -> Result<SessionSnapshot, SessionError>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::ChannelClosed)?
            .clone();
        Ok(snapshot)
    }

    async fn request(
        &self,
        build: impl FnOnce(Reply) -> ConnectorMessage,
    ) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| SessionError::ChannelClosed)?;

        rx.await.map_err(|_| SessionError::ChannelClosed)?
    }
}

/// Result of the one suspension point that may be in flight.
enum PendingOutcome {
    Fetched(Result<FetchedGrant, SessionError>),
    Handshake(Result<TransportLink, SessionError>),
}

/// The `SessionConnector` implementation.
pub struct SessionConnector {
    grant_source: Arc<dyn GrantSource>,
    transport: Arc<dyn Transport>,
    microphone: Arc<dyn MicrophoneCapture>,
    handshake_timeout: Option<Duration>,
    reconnect_timeout: Duration,

    receiver: mpsc::Receiver<ConnectorMessage>,
    cancel_token: CancellationToken,

    session: Session,
    presence: PresenceTracker,
    clock: SessionClock,
    last_display: DisplaySignal,

    /// Grant fetch or handshake in flight.
    pending: Option<BoxFuture<'static, PendingOutcome>>,
    /// Events of the open transport link.
    events: Option<mpsc::Receiver<TransportEvent>>,
    /// Armed only while the clock runs.
    ticker: Option<Interval>,
    /// Armed only while `Reconnecting`, with the error to fail with.
    reconnect_deadline: Option<(Pin<Box<Sleep>>, SessionError)>,
    mic: Option<MicrophoneGuard>,
    /// Whether the transport may hold a link that needs `disconnect`.
    linked: bool,

    snapshot_tx: watch::Sender<SessionSnapshot>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionConnector {
    /// Spawn a connector.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        config: &ClientConfig,
        grant_source: Arc<dyn GrantSource>,
        transport: Arc<dyn Transport>,
        microphone: Arc<dyn MicrophoneCapture>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(CONNECTOR_CHANNEL_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel_token = CancellationToken::new();

        let actor = Self {
            grant_source,
            transport,
            microphone,
            handshake_timeout: config.handshake_timeout,
            reconnect_timeout: config.reconnect_timeout,
            receiver,
            cancel_token: cancel_token.clone(),
            session: Session::new(),
            presence: PresenceTracker::new(),
            clock: SessionClock::new(),
            last_display: DisplaySignal::default(),
            pending: None,
            events: None,
            ticker: None,
            reconnect_deadline: None,
            mic: None,
            linked: false,
            snapshot_tx,
            events_tx: events_tx.clone(),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SessionHandle {
            sender,
            cancel_token,
            snapshot: snapshot_rx,
            events: events_tx,
        };

        (handle, task_handle)
    }

    /// Run the actor loop.
    #[instrument(skip_all, name = "session.connector")]
    async fn run(mut self) {
        debug!(target: "session.connector", "SessionConnector started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(
                        target: "session.connector",
                        "SessionConnector received cancellation signal"
                    );
                    self.shutdown().await;
                    break;
                }

                msg = self.receiver.recv() => {
                    if let Some(message) = msg {
                        self.handle_message(message).await;
                    } else {
                        debug!(
                            target: "session.connector",
                            "SessionConnector channel closed, exiting"
                        );
                        self.shutdown().await;
                        break;
                    }
                }

                outcome = poll_pending(&mut self.pending) => {
                    self.pending = None;
                    match outcome {
                        PendingOutcome::Fetched(result) => self.handle_fetched(result).await,
                        PendingOutcome::Handshake(result) => self.handle_handshake(result).await,
                    }
                }

                event = recv_event(&mut self.events) => {
                    self.handle_transport_event(event).await;
                }

                () = tick(&mut self.ticker) => {
                    self.handle_tick();
                }

                () = deadline(&mut self.reconnect_deadline) => {
                    if let Some((_, error)) = self.reconnect_deadline.take() {
                        self.fail(error).await;
                    }
                }
            }
        }

        info!(
            target: "session.connector",
            state = %self.session.state(),
            elapsed_seconds = self.clock.elapsed_seconds_at(Instant::now()),
            "SessionConnector stopped"
        );
    }

    async fn handle_message(&mut self, message: ConnectorMessage) {
        match message {
            ConnectorMessage::Start {
                request,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_start(request));
            }

            ConnectorMessage::SetMicrophone {
                enabled,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_set_microphone(enabled));
            }

            ConnectorMessage::End { respond_to } => {
                let result = self.disconnect("ended by user").await;
                let _ = respond_to.send(result);
            }
        }
    }

    fn handle_start(&mut self, request: SessionRequest) -> Result<(), SessionError> {
        if self.session.state().is_terminal() {
            self.reset();
        }

        let state = self.session.state();
        if state != ConnectionState::Idle || self.pending.is_some() {
            return Err(SessionError::InvalidTransition {
                from: state,
                to: ConnectionState::Connecting,
            });
        }

        info!(
            target: "session.connector",
            interview_type = ?request.interview_type,
            "Requesting session grant"
        );

        let source = Arc::clone(&self.grant_source);
        self.pending = Some(Box::pin(async move {
            PendingOutcome::Fetched(source.fetch(&request).await)
        }));
        Ok(())
    }

    /// Grant retrieval finished while `Idle`.
    async fn handle_fetched(&mut self, result: Result<FetchedGrant, SessionError>) {
        let grant = match result {
            Ok(grant) => grant,
            Err(e) => {
                warn!(
                    target: "session.connector",
                    code = e.error_code(),
                    error = %e,
                    "Grant retrieval failed"
                );
                self.fail(e).await;
                return;
            }
        };

        let claims = match peek_grant(grant.token.expose_secret()) {
            Ok(claims) => claims,
            Err(e) => {
                self.fail(SessionError::CredentialFetchFailed {
                    status: None,
                    message: format!("Unreadable grant: {e}"),
                })
                .await;
                return;
            }
        };
        if claims.is_expired_at(chrono::Utc::now().timestamp()) {
            self.fail(SessionError::GrantExpired).await;
            return;
        }

        self.presence.set_local(&claims.sub);
        let room = claims.room.name.clone();
        self.session.bind_grant(claims);
        if !self.transition(ConnectionState::Connecting) {
            return;
        }

        match MicrophoneGuard::acquire(Arc::clone(&self.microphone)) {
            Ok(guard) => self.mic = Some(guard),
            Err(e) => {
                self.fail(e.into()).await;
                return;
            }
        }

        debug!(
            target: "session.connector",
            room = %room,
            "Starting transport handshake"
        );

        // The grant is moved into the handshake and used for this one
        // connection only.
        let transport = Arc::clone(&self.transport);
        let limit = self.handshake_timeout;
        let FetchedGrant { token, url, .. } = grant;
        self.linked = true;
        self.pending = Some(Box::pin(async move {
            let connect = async {
                transport
                    .connect(&url, token.expose_secret())
                    .await
                    .map_err(SessionError::from)
            };
            let result = match limit {
                Some(limit) => tokio::time::timeout(limit, connect)
                    .await
                    .unwrap_or(Err(SessionError::HandshakeTimeout)),
                None => connect.await,
            };
            PendingOutcome::Handshake(result)
        }));
    }

    /// Handshake finished while `Connecting`.
    async fn handle_handshake(&mut self, result: Result<TransportLink, SessionError>) {
        let link = match result {
            Ok(link) => link,
            Err(e) => {
                warn!(
                    target: "session.connector",
                    code = e.error_code(),
                    error = %e,
                    "Transport handshake failed"
                );
                self.fail(e).await;
                return;
            }
        };

        if self.session.subject_identity() != Some(link.local_identity.as_str()) {
            warn!(
                target: "session.connector",
                "Transport admitted a different identity than the grant names"
            );
            self.fail(SessionError::HandshakeRejected(
                "admitted under a different identity".to_string(),
            ))
            .await;
            return;
        }

        self.events = Some(link.events);

        if let Some(mic) = self.mic.as_mut() {
            if let Err(e) = mic.set_enabled(true) {
                self.fail(e.into()).await;
                return;
            }
        }
        self.presence.set_local_mic(true);

        self.transition(ConnectionState::Connected);
    }

    fn handle_set_microphone(&mut self, enabled: bool) -> Result<(), SessionError> {
        let live = self.session.state().is_live();
        let Some(mic) = self.mic.as_mut().filter(|_| live) else {
            return Err(SessionError::MicrophoneUnavailable(
                "no active session".to_string(),
            ));
        };

        mic.set_enabled(enabled)?;
        info!(target: "session.connector", enabled, "Microphone toggled");

        let display = self.presence.set_local_mic(enabled);
        self.display_changed(display);
        Ok(())
    }

    async fn handle_transport_event(&mut self, event: Option<TransportEvent>) {
        let Some(event) = event else {
            self.events = None;
            self.link_closed("transport event stream ended").await;
            return;
        };

        match event {
            TransportEvent::ParticipantJoined { identity, role } => {
                let display = self.presence.participant_joined(&identity, role);
                debug!(
                    target: "session.connector",
                    role = ?role,
                    "Participant joined"
                );
                self.display_changed(display);
            }
            TransportEvent::ParticipantLeft { identity } => {
                let display = self.presence.participant_left(&identity);
                self.display_changed(display);
            }
            TransportEvent::AudioActivity { identity, active } => {
                let display = self.presence.audio_activity(&identity, active);
                self.display_changed(display);
            }
            TransportEvent::Interrupted => self.handle_interrupted(),
            TransportEvent::Resumed => self.handle_resumed().await,
            TransportEvent::Closed { reason } => self.link_closed(&reason).await,
            TransportEvent::Fatal { reason } => {
                if self.session.state().is_live() {
                    self.fail(SessionError::TransportFailed(reason)).await;
                }
            }
        }
    }

    fn handle_interrupted(&mut self) {
        if self.session.state() != ConnectionState::Connected {
            return;
        }

        info!(
            target: "session.connector",
            "Transport interrupted, waiting for it to resume"
        );
        if !self.transition(ConnectionState::Reconnecting) {
            return;
        }

        // Whichever runs out first: the reconnect window or the grant.
        let grant_remaining = self
            .session
            .grant_remaining_at(chrono::Utc::now().timestamp());

        let (limit, error) = match grant_remaining {
            Some(remaining) if remaining < self.reconnect_timeout => {
                (remaining, SessionError::GrantExpired)
            }
            _ => (self.reconnect_timeout, SessionError::ReconnectTimeout),
        };
        self.reconnect_deadline = Some((Box::pin(tokio::time::sleep(limit)), error));
    }

    async fn handle_resumed(&mut self) {
        if self.session.state() != ConnectionState::Reconnecting {
            return;
        }

        self.reconnect_deadline = None;
        if self
            .session
            .grant_expired_at(chrono::Utc::now().timestamp())
        {
            self.fail(SessionError::GrantExpired).await;
            return;
        }

        info!(target: "session.connector", "Transport resumed");
        self.transition(ConnectionState::Connected);
    }

    /// Remote close: a clean end while connected, a failure while
    /// reconnecting.
    async fn link_closed(&mut self, reason: &str) {
        match self.session.state() {
            ConnectionState::Connected => {
                let _ = self.disconnect(reason).await;
            }
            ConnectionState::Reconnecting => {
                self.fail(SessionError::TransportFailed(reason.to_string()))
                    .await;
            }
            _ => {}
        }
    }

    fn handle_tick(&mut self) {
        if let Some(elapsed_seconds) = self.clock.tick(Instant::now()) {
            let _ = self.events_tx.send(SessionEvent::Tick { elapsed_seconds });
            self.publish();
        }
    }

    /// Move to `Disconnected`, releasing everything.
    async fn disconnect(&mut self, reason: &str) -> Result<(), SessionError> {
        let from = self.session.state();
        if !from.can_transition_to(ConnectionState::Disconnected) {
            return Err(SessionError::InvalidTransition {
                from,
                to: ConnectionState::Disconnected,
            });
        }

        let had_link = self.release_resources();
        self.session.transition(ConnectionState::Disconnected)?;
        info!(
            target: "session.connector",
            from = %from,
            reason = %reason,
            "Session disconnected"
        );
        self.after_transition(from, ConnectionState::Disconnected, None);

        if had_link {
            self.transport.disconnect().await;
        }
        Ok(())
    }

    /// Move to `Failed`, releasing everything.
    async fn fail(&mut self, error: SessionError) {
        let from = self.session.state();
        if from.is_terminal() {
            return;
        }

        let had_link = self.release_resources();
        match self.session.fail(error.clone()) {
            Ok(from) => {
                warn!(
                    target: "session.connector",
                    from = %from,
                    code = error.error_code(),
                    "Session failed"
                );
                self.after_transition(from, ConnectionState::Failed, Some(error));
            }
            Err(e) => {
                warn!(target: "session.connector", error = %e, "Could not record failure");
            }
        }

        if had_link {
            self.transport.disconnect().await;
        }
    }

    /// Navigation away or handle drop.
    async fn shutdown(&mut self) {
        if !self.session.state().is_terminal() {
            let _ = self.disconnect("session torn down").await;
        }
    }

    /// Stop the timer, drop the event subscription and release the
    /// microphone as one step. Returns whether a transport link may be open.
    fn release_resources(&mut self) -> bool {
        self.ticker = None;
        self.reconnect_deadline = None;
        self.pending = None;
        self.events = None;
        if let Some(mic) = self.mic.take() {
            mic.release();
        }
        self.presence.set_local_mic(false);
        std::mem::take(&mut self.linked)
    }

    /// Apply a legal transition. Returns `false` if it was rejected.
    fn transition(&mut self, to: ConnectionState) -> bool {
        match self.session.transition(to) {
            Ok(from) => {
                self.after_transition(from, to, None);
                true
            }
            Err(e) => {
                warn!(target: "session.connector", error = %e, "Rejected state transition");
                false
            }
        }
    }

    fn after_transition(
        &mut self,
        from: ConnectionState,
        to: ConnectionState,
        error: Option<SessionError>,
    ) {
        // The interval only paces events; the count comes from instants.
        let now = Instant::now();
        self.ticker = self
            .clock
            .on_state(to, now)
            .then(|| new_ticker(self.clock.until_next_second(now)));
        let display = self.presence.on_state(to);

        debug!(
            target: "session.connector",
            from = %from,
            to = %to,
            "Session state changed"
        );

        let _ = self
            .events_tx
            .send(SessionEvent::StateChanged { from, to, error });
        self.display_changed(display);
    }

    /// Publish a snapshot, and a display event if the signal changed.
    fn display_changed(&mut self, display: DisplaySignal) {
        if display != self.last_display {
            self.last_display = display;
            let _ = self.events_tx.send(SessionEvent::DisplayChanged(display));
        }
        self.publish();
    }

    /// Replace the session with a new one. Only called from a terminal
    /// state, where everything is already released.
    fn reset(&mut self) {
        self.session = Session::new();
        self.presence = PresenceTracker::new();
        self.clock = SessionClock::new();
        self.last_display = DisplaySignal::default();
        self.publish();
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            state: self.session.state(),
            room_id: self.session.room_id().map(str::to_string),
            subject_identity: self.session.subject_identity().map(str::to_string),
            interview_type: self.session.interview_type(),
            started_at: self.session.started_at(),
            elapsed_seconds: self.clock.elapsed_seconds_at(Instant::now()),
            display: self.presence.signal(),
            mic_enabled: self.mic.as_ref().is_some_and(MicrophoneGuard::is_enabled),
            agent_identity: self.presence.agent().map(|a| a.identity.clone()),
            participants: self.presence.participants().to_vec(),
            error: self.session.error().cloned(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}

/// Ticks on whole seconds of connected time. A stalled actor skips ticks
/// but never loses time, since the clock reads instants.
fn new_ticker(first: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + first, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

// Select helpers: resolve with the slot's value, or never when empty.

async fn poll_pending(pending: &mut Option<BoxFuture<'static, PendingOutcome>>) -> PendingOutcome {
    match pending {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn recv_event(events: &mut Option<mpsc::Receiver<TransportEvent>>) -> Option<TransportEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn deadline(slot: &mut Option<(Pin<Box<Sleep>>, SessionError)>) {
    match slot {
        Some((sleep, _)) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
