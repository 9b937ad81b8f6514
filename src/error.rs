use thiserror::Error;

use crate::CallId;

/// Domain errors surfaced by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// No transcript slot / session exists for this call
    #[error("unknown call: {0}")]
    UnknownCall(CallId),

    /// The session has reached its terminal state
    #[error("session {0} is closed")]
    SessionClosed(CallId),
}
