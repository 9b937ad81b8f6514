// SendStream over a real WebSocket
//
// The router is served on an ephemeral port and driven by a WebSocket client,
// so these cover the socket loop itself: frame decoding, skipping bad frames,
// transcript replies on the same socket, and shutdown on close.

use anyhow::Result;
use base64::Engine;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use stt_relay::{
    create_router, AppState, EngineEvent, MockEngine, RecognitionConfig, SessionRegistry,
    SessionState,
};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(1600) {
    Some(size) => size,
    None => unreachable!(),
};

const WAIT: Duration = Duration::from_secs(2);

async fn serve(registry: SessionRegistry) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(AppState::new(registry, CHUNK_SIZE));

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    Ok(addr)
}

fn audio_frame(call_id: &str, payload: &[u8]) -> Message {
    let frame = json!({
        "callId": call_id,
        "buffers": base64::engine::general_purpose::STANDARD.encode(payload),
    });
    Message::Text(frame.to_string())
}

#[tokio::test]
async fn test_send_stream_over_websocket() -> Result<()> {
    let engine = MockEngine::new();
    let registry = SessionRegistry::new(Arc::new(engine.clone()), RecognitionConfig::default());
    let session = registry.create("call-1").await?;
    let addr = serve(registry.clone()).await?;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/streams/send", addr)).await?;

    // Bad frames are skipped without closing the socket
    ws.send(Message::Text("not json".to_string())).await?;
    ws.send(Message::Text(
        json!({ "callId": "call-1", "buffers": "%%%" }).to_string(),
    ))
    .await?;
    ws.send(Message::Binary(vec![1, 2, 3])).await?;
    ws.send(audio_frame("call-1", &[7u8; 4000])).await?;

    let first = engine.connection(0).await.unwrap();
    let forwarded = tokio::time::timeout(WAIT, async {
        while first.chunk_sizes().await.len() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(forwarded.is_ok());
    assert_eq!(first.chunk_sizes().await, vec![1600, 1600, 800]);

    // A final transcript comes back on the same socket after the next frame
    first.emit(EngineEvent::final_result("hello over the wire")).await;
    assert!(engine.wait_for_connections(2, WAIT).await);
    let mut state = session.subscribe_state();
    state.wait_for(|s| *s == SessionState::Streaming).await?;

    ws.send(audio_frame("call-1", &[1u8; 320])).await?;

    let reply = tokio::time::timeout(WAIT, ws.next()).await?;
    let text = match reply {
        Some(Ok(Message::Text(text))) => text,
        other => anyhow::bail!("expected a transcript frame, got {:?}", other),
    };
    let message: Value = serde_json::from_str(&text)?;
    assert_eq!(message["callId"], "call-1");
    assert_eq!(message["message"], "hello over the wire");

    assert_eq!(engine.connection(1).await.unwrap().chunk_sizes().await, vec![320]);

    // Closing the client ends the server loop, which completes the handshake
    ws.send(Message::Close(None)).await?;
    let closed = tokio::time::timeout(WAIT, async {
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    // The session outlives the socket
    assert!(registry.get("call-1").await.is_some());

    Ok(())
}

#[tokio::test]
async fn test_frames_for_unknown_call_get_no_reply() -> Result<()> {
    let engine = MockEngine::new();
    let registry = SessionRegistry::new(Arc::new(engine.clone()), RecognitionConfig::default());
    registry.create("call-1").await?;
    let addr = serve(registry).await?;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/streams/send", addr)).await?;

    ws.send(audio_frame("ghost", &[0u8; 100])).await?;
    ws.send(audio_frame("call-1", &[0u8; 100])).await?;

    let connection = engine.connection(0).await.unwrap();
    let forwarded = tokio::time::timeout(WAIT, async {
        while connection.chunks().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(forwarded.is_ok());
    assert_eq!(connection.chunk_sizes().await, vec![100]);

    // Nothing is waiting for either call, so no frame arrives
    assert!(tokio::time::timeout(Duration::from_millis(100), ws.next())
        .await
        .is_err());

    Ok(())
}
