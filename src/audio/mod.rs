pub mod chunk;
pub mod frame;

pub use chunk::{split, DEFAULT_CHUNK_SIZE};
pub use frame::AudioFrame;
