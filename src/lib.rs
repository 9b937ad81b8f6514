pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod nats;
pub mod session;
pub mod transcript;

/// Caller-chosen identifier scoping one logical transcription session
pub type CallId = String;

pub use audio::AudioFrame;
pub use config::Config;
pub use engine::{EngineEvent, MockEngine, RecognitionConfig, RecognitionEngine};
pub use error::RelayError;
pub use http::{create_router, AppState};
pub use nats::NatsEngine;
pub use session::{RecognitionSession, SessionRegistry, SessionState, SessionStats};
pub use transcript::{TranscriptSlot, TranscriptSlots};
