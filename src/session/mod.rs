//! Recognition session management
//!
//! This module provides:
//! - `RecognitionSession`: one call's restartable upstream connection and
//!   the listener that maps engine events onto its state machine
//! - `SessionRegistry`: the shared call id → session map
//! - Session state and statistics

mod config;
mod registry;
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use registry::SessionRegistry;
pub use session::RecognitionSession;
pub use state::SessionState;
pub use stats::SessionStats;
