use std::sync::Arc;

use crate::engine::RecognitionConfig;
use crate::CallId;

/// Configuration for a recognition session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Caller-chosen call identifier (e.g., "call-1")
    pub call_id: CallId,

    /// Recognition settings, shared process-wide and reused on every restart
    pub recognition: Arc<RecognitionConfig>,
}

impl SessionConfig {
    pub fn new(call_id: impl Into<CallId>, recognition: Arc<RecognitionConfig>) -> Self {
        Self {
            call_id: call_id.into(),
            recognition,
        }
    }
}
