//! Mailbox messages for the connector actor.

use crate::errors::SessionError;
use crate::grant_source::SessionRequest;
use tokio::sync::oneshot;

pub(crate) type Reply = oneshot::Sender<Result<(), SessionError>>;

#[derive(Debug)]
pub(crate) enum ConnectorMessage {
    /// Fetch a grant and connect. From a terminal state this starts a new
    /// session.
    Start {
        request: SessionRequest,
        respond_to: Reply,
    },

    /// Enable or disable local microphone capture.
    SetMicrophone { enabled: bool, respond_to: Reply },

    /// End the session by user request.
    End { respond_to: Reply },
}
