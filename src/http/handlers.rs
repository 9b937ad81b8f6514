use super::messages::{CreateStreamRequest, CreateStreamResponse, ErrorResponse, StreamAck};
use super::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

/// POST /streams
/// CreateStream: start a recognition session for a call
pub async fn create_stream(
    State(state): State<AppState>,
    Json(req): Json<CreateStreamRequest>,
) -> impl IntoResponse {
    info!("CreateStream for {}: {:?}", req.call_id, req.message);

    if let Err(e) = state.registry.create(&req.call_id).await {
        error!("Failed to create stream {}: {:#}", req.call_id, e);
        return (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: format!("Failed to create stream {}: {:#}", req.call_id, e),
            }),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(CreateStreamResponse {
            message: format!(
                "createStream: {} requests to create, \"{}\"",
                req.call_id, req.message
            ),
        }),
    )
        .into_response()
}

/// POST /streams/:call_id/end
/// EndStream: close the call's session; unknown calls are acknowledged too
pub async fn end_stream(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    if !state.registry.end(&call_id).await {
        info!("EndStream for unknown call {}", call_id);
    }

    Json(StreamAck {
        message: format!("STT stream {} was ended successfully", call_id),
        call_id,
    })
}

/// POST /streams/:call_id/restart
/// RestartStream: replace the call's session with a fresh one
///
/// Unknown calls are acknowledged. If the engine refuses the new connection
/// the reply is 502 and the running session is kept.
pub async fn restart_stream(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.restart(&call_id).await {
        Ok(true) => {}
        Ok(false) => info!("RestartStream for unknown call {}", call_id),
        Err(e) => {
            error!("Failed to restart stream {}: {:#}", call_id, e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("Failed to restart stream {}: {:#}", call_id, e),
                }),
            )
                .into_response();
        }
    }

    (
        StatusCode::OK,
        Json(StreamAck {
            message: format!("STT stream {} was restarted successfully", call_id),
            call_id,
        }),
    )
        .into_response()
}

/// GET /streams/:call_id/status
/// Get statistics for a call's session
pub async fn get_stream_status(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&call_id).await {
        Some(session) => (StatusCode::OK, Json(session.stats())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Stream {} not found", call_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
