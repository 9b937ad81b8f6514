//! Upstream streaming recognition engine
//!
//! The engine is a black box reached through [`RecognitionEngine`]: each
//! [`open`](RecognitionEngine::open) yields one bidirectional connection made
//! of an [`AudioSink`] for audio and a channel of [`EngineEvent`]s.
//!
//! Implementations:
//! - [`NatsEngine`](crate::nats::NatsEngine): production engine over NATS
//! - [`MockEngine`]: in-memory engine for tests and dry runs

mod config;
mod events;
pub mod mock;

pub use config::{AudioEncoding, RecognitionConfig, SpeechContext};
pub use events::EngineEvent;
pub use mock::MockEngine;

use anyhow::Result;
use tokio::sync::mpsc;

/// Write half of an upstream connection
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    /// Send one audio chunk upstream
    async fn write(&mut self, chunk: &[u8]) -> Result<()>;

    /// Close the connection; no writes are accepted afterwards
    async fn close(&mut self) -> Result<()>;
}

/// An open upstream connection
pub struct EngineStream {
    pub sink: Box<dyn AudioSink>,

    /// Engine events; the channel ends when the engine closes the connection
    pub events: mpsc::Receiver<EngineEvent>,
}

/// Streaming recognition engine
#[async_trait::async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Open a new connection for `call_id` configured with `config`
    async fn open(&self, call_id: &str, config: &RecognitionConfig) -> Result<EngineStream>;

    /// Engine name for logging
    fn name(&self) -> &str;
}
