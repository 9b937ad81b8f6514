use anyhow::{bail, Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::{AudioChunkMessage, RecognitionResultMessage, StreamOpenMessage};
use crate::engine::{AudioSink, EngineStream, RecognitionConfig, RecognitionEngine};

const EVENT_BUFFER: usize = 64;

/// Recognition engine reached over NATS
///
/// Each connection is a stream with its own id. Audio is published to
/// `<prefix>.<id>.audio` and results arrive on `<prefix>.<id>.result`.
pub struct NatsEngine {
    client: Client,
    subject_prefix: String,
}

impl NatsEngine {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject_prefix: impl Into<String>) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.into(),
        })
    }

    fn open_subject(&self) -> String {
        format!("{}.open", self.subject_prefix)
    }

    fn stream_subject(&self, stream_id: &str, leaf: &str) -> String {
        format!("{}.{}.{}", self.subject_prefix, stream_id, leaf)
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for NatsEngine {
    async fn open(&self, call_id: &str, config: &RecognitionConfig) -> Result<EngineStream> {
        let stream_id = uuid::Uuid::new_v4().to_string();

        // Subscribe before announcing the stream so no result is missed
        let result_subject = self.stream_subject(&stream_id, "result");
        let mut subscriber = self
            .client
            .subscribe(result_subject.clone())
            .await
            .context("Failed to subscribe to recognition results")?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let listener_stream_id = stream_id.clone();
        let listener = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<RecognitionResultMessage>(&msg.payload) {
                    Ok(result) => {
                        if events_tx.send(result.into()).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Failed to parse result message on stream {}: {}",
                            listener_stream_id, e
                        );
                    }
                }
            }
            debug!("Result listener for stream {} stopped", listener_stream_id);
        });

        let open = StreamOpenMessage {
            stream_id: stream_id.clone(),
            call_id: call_id.to_string(),
            config: config.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let payload = serde_json::to_vec(&open)?;

        if let Err(e) = self.client.publish(self.open_subject(), payload.into()).await {
            listener.abort();
            return Err(e).context("Failed to publish stream open request");
        }

        info!(
            "Opened recognition stream {} for {} (results on {})",
            stream_id, call_id, result_subject
        );

        let sink = NatsAudioSink {
            client: self.client.clone(),
            audio_subject: self.stream_subject(&stream_id, "audio"),
            stream_id,
            sequence: 0,
            listener: Some(listener),
        };

        Ok(EngineStream {
            sink: Box::new(sink),
            events: events_rx,
        })
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Write half of a NATS recognition stream
struct NatsAudioSink {
    client: Client,
    audio_subject: String,
    stream_id: String,
    sequence: u64,
    /// Result subscription task; `None` once closed
    listener: Option<JoinHandle<()>>,
}

impl NatsAudioSink {
    async fn publish_chunk(&mut self, pcm_bytes: &[u8], is_final: bool) -> Result<()> {
        let message = AudioChunkMessage {
            stream_id: self.stream_id.clone(),
            sequence: self.sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            final_chunk: is_final,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(self.audio_subject.clone(), payload.into())
            .await
            .context("Failed to publish audio chunk")?;

        debug!(
            "Published audio chunk to {} (seq={}, bytes={}, final={})",
            self.audio_subject,
            self.sequence,
            pcm_bytes.len(),
            is_final
        );

        self.sequence += 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AudioSink for NatsAudioSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        if self.listener.is_none() {
            bail!("recognition stream {} is closed", self.stream_id);
        }

        self.publish_chunk(chunk, false).await
    }

    async fn close(&mut self) -> Result<()> {
        let Some(listener) = self.listener.take() else {
            return Ok(());
        };

        // Dropping the subscription unsubscribes from results
        listener.abort();

        info!("Closing recognition stream {}", self.stream_id);
        self.publish_chunk(&[], true).await
    }
}

impl Drop for NatsAudioSink {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            warn!("Recognition stream {} dropped without close", self.stream_id);
            listener.abort();
        }
    }
}
