use super::handlers;
use super::state::AppState;
use super::stream;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/streams", post(handlers::create_stream))
        .route("/streams/:call_id/end", post(handlers::end_stream))
        .route("/streams/:call_id/restart", post(handlers::restart_stream))
        // Audio in, transcripts out
        .route("/streams/send", get(stream::send_stream))
        // Session queries
        .route("/streams/:call_id/status", get(handlers::get_stream_status))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
