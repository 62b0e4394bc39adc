//! Session Client Library
//!
//! Drives one interview session from grant retrieval to teardown.
//!
//! # Architecture
//!
//! A single [`actors::SessionConnector`] task owns the [`session::Session`]
//! aggregate and serializes every mutation: user commands, grant retrieval,
//! the transport handshake, transport events and the one-second clock tick
//! all resume through the same `select!` loop. Callers interact through the
//! cloneable [`actors::SessionHandle`] or the [`control::ControlSurface`].
//!
//! ```text
//! GrantSource -> SessionConnector -> Transport
//!                     |-> PresenceTracker (display signal)
//!                     |-> SessionClock (elapsed seconds)
//! ```
//!
//! # Modules
//!
//! - `actors` - The connector actor and its handle
//! - `clock` - Elapsed connected time
//! - `config` - Client configuration from environment
//! - `control` - Microphone toggle and session termination facade
//! - `errors` - Session error taxonomy
//! - `grant_source` - Credential endpoint client
//! - `presence` - Speaker and link health derivation
//! - `session` - Session aggregate and snapshots
//! - `state` - Connection state machine
//! - `transport` - Real-time transport and microphone seams

pub mod actors;
pub mod clock;
pub mod config;
pub mod control;
pub mod errors;
pub mod grant_source;
pub mod presence;
pub mod session;
pub mod state;
pub mod transport;

pub use actors::{SessionConnector, SessionHandle};
pub use errors::SessionError;
pub use state::ConnectionState;
