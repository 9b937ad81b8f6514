//! Per-call storage for finalized transcripts awaiting delivery

mod slot;

pub use slot::{TranscriptSlot, TranscriptSlots};
