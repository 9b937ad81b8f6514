use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::state::SessionState;
use super::stats::SessionStats;
use crate::engine::{AudioSink, EngineEvent, RecognitionConfig, RecognitionEngine};
use crate::error::RelayError;
use crate::transcript::TranscriptSlots;
use crate::CallId;

#[derive(Default)]
struct Counters {
    chunks_forwarded: AtomicU64,
    bytes_forwarded: AtomicU64,
    chunks_dropped: AtomicU64,
    interim_results: AtomicU64,
    final_results: AtomicU64,
    restarts: AtomicU64,
    engine_errors: AtomicU64,
}

/// State shared between the session handle and its event listener task
struct Shared {
    call_id: CallId,
    recognition: Arc<RecognitionConfig>,
    engine: Arc<dyn RecognitionEngine>,
    slots: TranscriptSlots,
    state: watch::Sender<SessionState>,

    /// Live upstream connection; `None` once closed or after a failed reopen.
    /// Held across a whole frame by forwarders and across close+open by restarts.
    sink: Mutex<Option<Box<dyn AudioSink>>>,

    counters: Counters,
    started_at: DateTime<Utc>,
}

/// One call's restartable connection to the recognition engine
///
/// A listener task consumes engine events: final results are stored in the
/// call's transcript slot, and a final result, an end-of-utterance signal or
/// the engine closing the connection replaces the upstream connection with a
/// fresh one opened from the same configuration.
pub struct RecognitionSession {
    shared: Arc<Shared>,

    /// Handle for the engine event listener task
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RecognitionSession {
    /// Open the first upstream connection and start listening for events
    pub async fn start(
        config: SessionConfig,
        engine: Arc<dyn RecognitionEngine>,
        slots: TranscriptSlots,
    ) -> Result<Self> {
        info!(
            "Creating recognition session: {} (engine={})",
            config.call_id,
            engine.name()
        );

        let (state, _) = watch::channel(SessionState::Connecting);

        let stream = engine
            .open(&config.call_id, &config.recognition)
            .await
            .with_context(|| format!("Failed to open upstream connection for {}", config.call_id))?;

        let shared = Arc::new(Shared {
            call_id: config.call_id,
            recognition: config.recognition,
            engine,
            slots,
            state,
            sink: Mutex::new(Some(stream.sink)),
            counters: Counters::default(),
            started_at: Utc::now(),
        });

        shared.transition(SessionState::Streaming);

        let listener = tokio::spawn(run_listener(Arc::clone(&shared), stream.events));

        info!("Recognition session {} streaming", shared.call_id);

        Ok(Self {
            shared,
            listener: Mutex::new(Some(listener)),
        })
    }

    pub fn call_id(&self) -> &str {
        &self.shared.call_id
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Watch connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Write a frame's chunks upstream, in order and without interleaving
    ///
    /// Waits while a restart is in progress. Returns the number of chunks
    /// written, or `SessionClosed` (with every chunk counted as dropped) when
    /// there is no live connection.
    pub async fn forward(&self, chunks: &[&[u8]]) -> Result<usize, RelayError> {
        let counters = &self.shared.counters;
        let mut guard = self.shared.sink.lock().await;

        let Some(sink) = guard.as_mut() else {
            counters
                .chunks_dropped
                .fetch_add(chunks.len() as u64, Ordering::Relaxed);
            return Err(RelayError::SessionClosed(self.shared.call_id.clone()));
        };

        let mut written = 0;
        for chunk in chunks {
            match sink.write(chunk).await {
                Ok(()) => {
                    written += 1;
                    counters.chunks_forwarded.fetch_add(1, Ordering::Relaxed);
                    counters
                        .bytes_forwarded
                        .fetch_add(chunk.len() as u64, Ordering::Relaxed);
                }
                Err(e) => {
                    counters.chunks_dropped.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to forward audio for {}: {:#}", self.shared.call_id, e);
                }
            }
        }

        Ok(written)
    }

    /// Close the upstream connection and stop the listener. Idempotent.
    ///
    /// A reconnect in flight finishes first: it sees the Closed state once
    /// its open returns and closes the connection it opened.
    pub async fn close(&self) {
        let first_close = self.shared.transition(SessionState::Closed);

        {
            let mut guard = self.shared.sink.lock().await;
            if let Some(mut sink) = guard.take() {
                if let Err(e) = sink.close().await {
                    warn!(
                        "Failed to close upstream connection for {}: {:#}",
                        self.shared.call_id, e
                    );
                }
            }
        }

        let listener = self.listener.lock().await.take();
        if let Some(task) = listener {
            task.abort();
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Listener task for {} panicked: {}", self.shared.call_id, e);
                }
            }
        }

        if first_close {
            info!("Recognition session {} closed", self.shared.call_id);
        }
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let counters = &self.shared.counters;
        let duration = Utc::now().signed_duration_since(self.shared.started_at);

        SessionStats {
            call_id: self.shared.call_id.clone(),
            state: self.state(),
            started_at: self.shared.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_forwarded: counters.chunks_forwarded.load(Ordering::Relaxed),
            bytes_forwarded: counters.bytes_forwarded.load(Ordering::Relaxed),
            chunks_dropped: counters.chunks_dropped.load(Ordering::Relaxed),
            interim_results: counters.interim_results.load(Ordering::Relaxed),
            final_results: counters.final_results.load(Ordering::Relaxed),
            restarts: counters.restarts.load(Ordering::Relaxed),
            engine_errors: counters.engine_errors.load(Ordering::Relaxed),
        }
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        if let Some(task) = self.listener.get_mut().take() {
            task.abort();
        }
    }
}

impl Shared {
    /// Move to `next` if allowed; returns whether the state changed
    fn transition(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if *state != next && state.can_transition_to(next) {
                debug!("Session {}: {} -> {}", self.call_id, state, next);
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Replace the upstream connection with a freshly opened one
    ///
    /// Returns the new connection's events, or `None` if the session was
    /// closed meanwhile.
    async fn reconnect(&self) -> Result<Option<mpsc::Receiver<EngineEvent>>> {
        let mut guard = self.sink.lock().await;

        if !self.transition(SessionState::Restarting) {
            return Ok(None);
        }

        if let Some(mut old) = guard.take() {
            if let Err(e) = old.close().await {
                warn!("Failed to close upstream connection for {}: {:#}", self.call_id, e);
            }
        }

        let mut stream = self
            .engine
            .open(&self.call_id, &self.recognition)
            .await
            .with_context(|| format!("Failed to reopen upstream connection for {}", self.call_id))?;

        if !self.transition(SessionState::Streaming) {
            if let Err(e) = stream.sink.close().await {
                warn!("Failed to close upstream connection for {}: {:#}", self.call_id, e);
            }
            return Ok(None);
        }

        *guard = Some(stream.sink);
        self.counters.restarts.fetch_add(1, Ordering::Relaxed);
        info!("Restarted upstream connection for {}", self.call_id);

        Ok(Some(stream.events))
    }
}

/// Map engine events onto session transitions until the session closes
async fn run_listener(shared: Arc<Shared>, mut events: mpsc::Receiver<EngineEvent>) {
    debug!("Event listener for {} started", shared.call_id);

    loop {
        let restart = match events.recv().await {
            Some(event) => {
                let restart = event.ends_utterance();
                handle_event(&shared, event).await;
                restart
            }
            None => {
                info!("Upstream closed connection for {}", shared.call_id);
                true
            }
        };

        if !restart {
            continue;
        }

        match shared.reconnect().await {
            Ok(Some(next)) => events = next,
            Ok(None) => break,
            Err(e) => {
                error!("{:#}; session {} is now closed", e, shared.call_id);
                shared.transition(SessionState::Closed);
                break;
            }
        }
    }

    debug!("Event listener for {} stopped", shared.call_id);
}

/// Count, log and store a single engine event
async fn handle_event(shared: &Shared, event: EngineEvent) {
    match event {
        EngineEvent::Interim { transcript, .. } => {
            shared.counters.interim_results.fetch_add(1, Ordering::Relaxed);
            debug!("Interim result for {}: {}", shared.call_id, transcript);
        }
        EngineEvent::Final { transcript, confidence } => {
            shared.counters.final_results.fetch_add(1, Ordering::Relaxed);
            info!(
                "Final result for {}: {} (confidence={:?})",
                shared.call_id, transcript, confidence
            );
            if let Err(e) = shared.slots.set_final(&shared.call_id, transcript).await {
                warn!("Dropping final transcript: {}", e);
            }
        }
        EngineEvent::EndOfUtterance => {
            debug!("End of utterance for {}", shared.call_id);
        }
        EngineEvent::Error(message) => {
            // Not a transition: the caller decides whether to restart or end
            shared.counters.engine_errors.fetch_add(1, Ordering::Relaxed);
            error!("Engine error for {}: {}", shared.call_id, message);
        }
    }
}
