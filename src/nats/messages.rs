use serde::{Deserialize, Serialize};

use crate::engine::{EngineEvent, RecognitionConfig};

/// Request to open a recognition stream, published to `<prefix>.open`
#[derive(Debug, Serialize, Deserialize)]
pub struct StreamOpenMessage {
    pub stream_id: String,
    pub call_id: String,
    pub config: RecognitionConfig,
    pub timestamp: String, // RFC3339 timestamp
}

/// Audio chunk published to `<prefix>.<stream_id>.audio`
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioChunkMessage {
    pub stream_id: String,
    pub sequence: u64,
    pub pcm: String, // Base64-encoded audio bytes
    #[serde(rename = "final")]
    pub final_chunk: bool,
}

/// Result received on `<prefix>.<stream_id>.result`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionResultMessage {
    Interim {
        text: String,
        #[serde(default)]
        confidence: Option<f32>,
    },
    Final {
        text: String,
        #[serde(default)]
        confidence: Option<f32>,
    },
    EndOfUtterance,
    Error {
        message: String,
    },
}

impl From<RecognitionResultMessage> for EngineEvent {
    fn from(msg: RecognitionResultMessage) -> Self {
        match msg {
            RecognitionResultMessage::Interim { text, confidence } => EngineEvent::Interim {
                transcript: text,
                confidence,
            },
            RecognitionResultMessage::Final { text, confidence } => EngineEvent::Final {
                transcript: text,
                confidence,
            },
            RecognitionResultMessage::EndOfUtterance => EngineEvent::EndOfUtterance,
            RecognitionResultMessage::Error { message } => EngineEvent::Error(message),
        }
    }
}
