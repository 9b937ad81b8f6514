use super::messages::{StreamBuffers, StreamMessage};
use super::state::AppState;
use crate::audio::{self, AudioFrame};
use crate::session::SessionRegistry;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use std::num::NonZeroUsize;
use tracing::{debug, info, warn};

/// GET /streams/send
/// SendStream: duplex channel of audio frames in, final transcripts out
pub async fn send_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_send_stream(socket, state))
}

async fn handle_send_stream(mut socket: WebSocket, state: AppState) {
    info!("SendStream channel opened");

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("SendStream receive error: {}", e);
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            Message::Binary(data) => {
                warn!("Ignoring {}-byte binary frame; expected JSON text", data.len());
                continue;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let frame = match StreamBuffers::decode(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping malformed SendStream frame: {:#}", e);
                continue;
            }
        };

        let Some(reply) = relay_frame(&state.registry, state.chunk_size, frame).await else {
            continue;
        };

        let payload = match serde_json::to_string(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode transcript for {}: {}", reply.call_id, e);
                continue;
            }
        };

        info!("Delivering transcript to {}: {}", reply.call_id, reply.message);

        if socket.send(Message::Text(payload)).await.is_err() {
            warn!("SendStream client went away before transcript delivery");
            break;
        }
    }

    info!("SendStream channel closed");
}

/// Forward one inbound frame and collect any finished transcript for its call
///
/// Frames for unknown calls are dropped silently. After forwarding, the call's
/// transcript slot is drained; a waiting final transcript becomes the reply.
pub async fn relay_frame(
    registry: &SessionRegistry,
    chunk_size: NonZeroUsize,
    frame: AudioFrame,
) -> Option<StreamMessage> {
    debug!("Received {} bytes for {}", frame.payload.len(), frame.call_id);

    match registry.get(&frame.call_id).await {
        Some(session) => {
            let chunks = audio::split(&frame.payload, chunk_size);
            if let Err(e) = session.forward(&chunks).await {
                debug!("Dropping frame: {}", e);
            }
        }
        None => debug!("No session for {}, dropping frame", frame.call_id),
    }

    match registry.slots().drain_if_final(&frame.call_id).await {
        Ok(Some(transcript)) => Some(StreamMessage {
            call_id: frame.call_id,
            message: transcript,
        }),
        Ok(None) | Err(_) => None,
    }
}
