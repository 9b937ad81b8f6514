use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::config::SessionConfig;
use super::session::RecognitionSession;
use crate::engine::{RecognitionConfig, RecognitionEngine};
use crate::transcript::TranscriptSlots;
use crate::CallId;

/// Active recognition sessions keyed by call id
///
/// Cloning yields another handle to the same map. Every mutation is visible
/// to subsequent `get` calls from any handle.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<CallId, Arc<RecognitionSession>>>>,
    slots: TranscriptSlots,
    engine: Arc<dyn RecognitionEngine>,
    recognition: Arc<RecognitionConfig>,
}

impl SessionRegistry {
    pub fn new(engine: Arc<dyn RecognitionEngine>, recognition: RecognitionConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            slots: TranscriptSlots::new(),
            engine,
            recognition: Arc::new(recognition),
        }
    }

    /// Transcript slots shared with every session
    pub fn slots(&self) -> &TranscriptSlots {
        &self.slots
    }

    async fn start_session(&self, call_id: &str) -> Result<Arc<RecognitionSession>> {
        let config = SessionConfig::new(call_id, Arc::clone(&self.recognition));
        let session =
            RecognitionSession::start(config, Arc::clone(&self.engine), self.slots.clone()).await?;
        Ok(Arc::new(session))
    }

    /// Start a session for `call_id` and reset its transcript slot
    ///
    /// An existing session for the same call is replaced without error, and
    /// its upstream connection is closed. When the engine cannot be reached
    /// nothing changes: an existing session and its slot are left as they were.
    pub async fn create(&self, call_id: &str) -> Result<Arc<RecognitionSession>> {
        let session = self.start_session(call_id).await?;

        // Session and slot change together under the map lock, so a
        // concurrent `end` is ordered entirely before or after this insert.
        // Lock order is always sessions, then slots.
        let replaced = {
            let mut sessions = self.sessions.write().await;
            let replaced = sessions.insert(call_id.to_string(), Arc::clone(&session));
            self.slots.reset(call_id).await;
            replaced
        };

        if let Some(old) = replaced {
            info!("Replacing existing session for {}", call_id);
            old.close().await;
        }

        Ok(session)
    }

    pub async fn get(&self, call_id: &str) -> Option<Arc<RecognitionSession>> {
        let sessions = self.sessions.read().await;
        sessions.get(call_id).cloned()
    }

    pub async fn contains(&self, call_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(call_id)
    }

    /// Swap in a brand-new session for `call_id`, then close the old one
    ///
    /// The transcript slot, including any undelivered final, is kept.
    /// Returns `Ok(false)` when no session exists for the call.
    pub async fn restart(&self, call_id: &str) -> Result<bool> {
        if !self.contains(call_id).await {
            return Ok(false);
        }

        let session = self.start_session(call_id).await?;

        let replaced = {
            let mut sessions = self.sessions.write().await;
            // Ended while the new connection was opening: don't resurrect it
            if !sessions.contains_key(call_id) {
                None
            } else {
                sessions.insert(call_id.to_string(), Arc::clone(&session))
            }
        };

        match replaced {
            Some(old) => {
                old.close().await;
                info!("Restarted session for {}", call_id);
                Ok(true)
            }
            None => {
                session.close().await;
                Ok(false)
            }
        }
    }

    /// Close and forget the session and transcript slot for `call_id`
    ///
    /// Returns false (and does nothing) when no session exists.
    pub async fn end(&self, call_id: &str) -> bool {
        let session = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.remove(call_id);
            self.slots.remove(call_id).await;
            session
        };

        match session {
            Some(session) => {
                session.close().await;
                info!("Ended session for {}", call_id);
                true
            }
            None => false,
        }
    }

    /// Close every session (process shutdown)
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<RecognitionSession>> = {
            let mut sessions = self.sessions.write().await;
            let mut drained = Vec::with_capacity(sessions.len());
            for (call_id, session) in sessions.drain() {
                self.slots.remove(&call_id).await;
                drained.push(session);
            }
            drained
        };

        info!("Closing {} active session(s)", sessions.len());

        for session in sessions {
            session.close().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn call_ids(&self) -> Vec<CallId> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<CallId> = sessions.keys().cloned().collect();
        ids.sort();
        ids
    }
}
