use crate::CallId;

/// A block of caller audio tagged with the call it belongs to
///
/// Transient: forwarded upstream and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub call_id: CallId,
    /// Raw audio bytes in the configured recognition encoding
    pub payload: Vec<u8>,
}

impl AudioFrame {
    pub fn new(call_id: impl Into<CallId>, payload: Vec<u8>) -> Self {
        Self {
            call_id: call_id.into(),
            payload,
        }
    }
}
