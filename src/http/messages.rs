use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::audio::AudioFrame;

// ============================================================================
// Control requests / acknowledgements
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamRequest {
    pub call_id: String,

    /// Free-form caller note, echoed in the acknowledgement
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStreamResponse {
    pub message: String,
}

/// Acknowledgement for EndStream / RestartStream
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamAck {
    pub call_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// SendStream frames
// ============================================================================

/// Inbound SendStream frame
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBuffers {
    pub call_id: String,
    pub buffers: String, // Base64-encoded audio bytes
}

impl StreamBuffers {
    /// Parse a JSON text frame into an audio frame
    pub fn decode(text: &str) -> Result<AudioFrame> {
        let buffers: StreamBuffers =
            serde_json::from_str(text).context("Invalid SendStream frame")?;

        let payload = base64::engine::general_purpose::STANDARD
            .decode(&buffers.buffers)
            .context("Invalid base64 in buffers")?;

        Ok(AudioFrame::new(buffers.call_id, payload))
    }
}

/// Outbound SendStream frame carrying a final transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMessage {
    pub call_id: String,
    pub message: String,
}
