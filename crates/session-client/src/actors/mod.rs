//! Actor layer.
//!
//! One [`SessionConnector`] task per client. All session mutation happens
//! on that task; [`SessionHandle`] is the only way in.

mod connector;
mod messages;

pub use connector::{SessionConnector, SessionHandle};
