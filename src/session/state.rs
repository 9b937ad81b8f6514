use serde::Serialize;
use std::fmt;

/// Lifecycle of a recognition session's upstream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Opening the first upstream connection
    Connecting,
    /// Connection open, audio is forwarded
    Streaming,
    /// Old connection closing, new one opening
    Restarting,
    /// Terminal
    Closed,
}

impl SessionState {
    /// Whether a transition from `self` to `next` is allowed
    ///
    /// `Closed` is terminal and can only be re-entered, never left.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            (Closed, Closed) => true,
            (Closed, _) => false,
            (_, Closed) => true,
            (Connecting, Streaming) => true,
            (Streaming, Restarting) => true,
            (Restarting, Streaming) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Streaming => "streaming",
            SessionState::Restarting => "restarting",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
