use std::num::NonZeroUsize;

use crate::session::SessionRegistry;

/// Shared application state for HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    /// Active recognition sessions (call_id → session)
    pub registry: SessionRegistry,

    /// Maximum bytes per upstream write
    pub chunk_size: NonZeroUsize,
}

impl AppState {
    pub fn new(registry: SessionRegistry, chunk_size: NonZeroUsize) -> Self {
        Self {
            registry,
            chunk_size,
        }
    }
}
