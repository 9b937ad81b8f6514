use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::RelayError;
use crate::CallId;

/// The most recent finalized transcript for one call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptSlot {
    pub is_final: bool,
    pub transcript: String,
}

/// Shared single-slot transcript store, one slot per active call
///
/// A new final transcript overwrites an undelivered one: there is no queue,
/// so back-to-back finals between two drains keep only the last.
#[derive(Debug, Clone, Default)]
pub struct TranscriptSlots {
    slots: Arc<Mutex<HashMap<CallId, TranscriptSlot>>>,
}

impl TranscriptSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the slot for a call, or clear it if it already exists
    pub async fn reset(&self, call_id: &str) {
        let mut slots = self.slots.lock().await;
        slots.insert(call_id.to_string(), TranscriptSlot::default());
    }

    /// Store a final transcript, replacing whatever was there
    pub async fn set_final(&self, call_id: &str, transcript: String) -> Result<(), RelayError> {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .get_mut(call_id)
            .ok_or_else(|| RelayError::UnknownCall(call_id.to_string()))?;

        if slot.is_final {
            debug!(
                "Overwriting undelivered transcript for {}: {:?}",
                call_id, slot.transcript
            );
        }

        slot.is_final = true;
        slot.transcript = transcript;
        Ok(())
    }

    /// Take the final transcript if one is waiting, leaving the slot empty
    ///
    /// Returns `Ok(None)` and leaves the slot untouched when nothing is final.
    pub async fn drain_if_final(&self, call_id: &str) -> Result<Option<String>, RelayError> {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .get_mut(call_id)
            .ok_or_else(|| RelayError::UnknownCall(call_id.to_string()))?;

        if !slot.is_final {
            return Ok(None);
        }

        Ok(Some(std::mem::take(slot).transcript))
    }

    /// Snapshot of a call's slot
    pub async fn get(&self, call_id: &str) -> Option<TranscriptSlot> {
        let slots = self.slots.lock().await;
        slots.get(call_id).cloned()
    }

    pub async fn remove(&self, call_id: &str) -> Option<TranscriptSlot> {
        let mut slots = self.slots.lock().await;
        slots.remove(call_id)
    }

    pub async fn contains(&self, call_id: &str) -> bool {
        let slots = self.slots.lock().await;
        slots.contains_key(call_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_without_final_returns_nothing() {
        let slots = TranscriptSlots::new();
        slots.reset("call-1").await;

        assert_eq!(slots.drain_if_final("call-1").await, Ok(None));
        assert_eq!(slots.get("call-1").await, Some(TranscriptSlot::default()));
    }

    #[tokio::test]
    async fn test_final_is_drained_exactly_once() {
        let slots = TranscriptSlots::new();
        slots.reset("call-1").await;

        slots.set_final("call-1", "hello world".to_string()).await.unwrap();

        assert_eq!(
            slots.drain_if_final("call-1").await,
            Ok(Some("hello world".to_string()))
        );
        assert_eq!(slots.drain_if_final("call-1").await, Ok(None));

        let slot = slots.get("call-1").await.unwrap();
        assert!(!slot.is_final);
        assert!(slot.transcript.is_empty());
    }

    #[tokio::test]
    async fn test_last_final_wins() {
        let slots = TranscriptSlots::new();
        slots.reset("call-1").await;

        slots.set_final("call-1", "first".to_string()).await.unwrap();
        slots.set_final("call-1", "second".to_string()).await.unwrap();

        assert_eq!(
            slots.drain_if_final("call-1").await,
            Ok(Some("second".to_string()))
        );
        assert_eq!(slots.drain_if_final("call-1").await, Ok(None));
    }

    #[tokio::test]
    async fn test_unknown_call_is_an_error() {
        let slots = TranscriptSlots::new();

        assert_eq!(
            slots.set_final("ghost", "text".to_string()).await,
            Err(RelayError::UnknownCall("ghost".to_string()))
        );
        assert_eq!(
            slots.drain_if_final("ghost").await,
            Err(RelayError::UnknownCall("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_calls_are_isolated() {
        let slots = TranscriptSlots::new();
        slots.reset("call-1").await;
        slots.reset("call-2").await;

        slots.set_final("call-1", "one".to_string()).await.unwrap();

        assert_eq!(slots.drain_if_final("call-2").await, Ok(None));
        assert_eq!(slots.drain_if_final("call-1").await, Ok(Some("one".to_string())));
    }

    #[tokio::test]
    async fn test_remove_and_reset() {
        let slots = TranscriptSlots::new();
        slots.reset("call-1").await;
        slots.set_final("call-1", "pending".to_string()).await.unwrap();

        slots.reset("call-1").await;
        assert_eq!(slots.drain_if_final("call-1").await, Ok(None));

        assert!(slots.remove("call-1").await.is_some());
        assert!(!slots.contains("call-1").await);
    }
}
