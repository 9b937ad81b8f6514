//! RPC surface for callers
//!
//! - POST /streams - CreateStream
//! - GET /streams/send - SendStream (WebSocket, JSON text frames)
//! - POST /streams/:call_id/end - EndStream
//! - POST /streams/:call_id/restart - RestartStream
//! - GET /streams/:call_id/status - Query session statistics
//! - GET /health - Health check

mod handlers;
pub mod messages;
mod routes;
mod state;
mod stream;

pub use messages::{CreateStreamRequest, StreamAck, StreamBuffers, StreamMessage};
pub use routes::create_router;
pub use state::AppState;
pub use stream::relay_frame;
