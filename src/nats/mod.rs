pub mod client;
pub mod messages;

pub use client::NatsEngine;
pub use messages::{AudioChunkMessage, RecognitionResultMessage, StreamOpenMessage};
