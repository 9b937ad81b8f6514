use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::SessionState;

/// Statistics about a recognition session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub call_id: String,

    /// Current connection state
    pub state: SessionState,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Seconds since creation
    pub duration_secs: f64,

    /// Chunks written upstream
    pub chunks_forwarded: u64,

    pub bytes_forwarded: u64,

    /// Chunks discarded because no connection was live or the write failed
    pub chunks_dropped: u64,

    pub interim_results: u64,

    pub final_results: u64,

    /// Upstream connections re-established after an utterance ended
    pub restarts: u64,

    /// Error events reported by the engine
    pub engine_errors: u64,
}
