//! In-memory recognition engine
//!
//! Records every connection it opens (configuration, written chunks, close
//! state) and lets the owner inject [`EngineEvent`]s into a connection. Used
//! by the test suite and by `engine.kind = "mock"` dry runs.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use super::{AudioSink, EngineEvent, EngineStream, RecognitionConfig, RecognitionEngine};

const EVENT_BUFFER: usize = 64;

#[derive(Default)]
struct MockState {
    connections: Vec<Arc<MockConnection>>,
    failing_opens: usize,
    open_delay: Option<Duration>,
}

/// Engine whose connections are driven by the caller
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `open` fail
    pub async fn fail_next_opens(&self, count: usize) {
        self.state.lock().await.failing_opens = count;
    }

    /// Make every later call to `open` take `delay` before it completes
    pub async fn set_open_delay(&self, delay: Duration) {
        self.state.lock().await.open_delay = Some(delay);
    }

    /// Number of connections opened so far (open or closed)
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// Connection by open order, starting at 0
    pub async fn connection(&self, index: usize) -> Option<Arc<MockConnection>> {
        self.state.lock().await.connections.get(index).cloned()
    }

    /// Most recently opened connection
    pub async fn latest(&self) -> Option<Arc<MockConnection>> {
        self.state.lock().await.connections.last().cloned()
    }

    /// Wait until at least `count` connections have been opened
    pub async fn wait_for_connections(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while self.connection_count().await < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for MockEngine {
    async fn open(&self, call_id: &str, config: &RecognitionConfig) -> Result<EngineStream> {
        let delay = self.state.lock().await.open_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;

        if state.failing_opens > 0 {
            state.failing_opens -= 1;
            bail!("mock engine refused connection");
        }

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let connection = Arc::new(MockConnection {
            index: state.connections.len(),
            call_id: call_id.to_string(),
            config: config.clone(),
            chunks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            events: Mutex::new(Some(events_tx)),
        });

        debug!("Mock connection {} opened for {}", connection.index, call_id);
        state.connections.push(Arc::clone(&connection));

        Ok(EngineStream {
            sink: Box::new(MockSink { connection }),
            events: events_rx,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// One connection opened by [`MockEngine`]
pub struct MockConnection {
    index: usize,
    call_id: String,
    config: RecognitionConfig,
    chunks: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
    events: Mutex<Option<mpsc::Sender<EngineEvent>>>,
}

impl MockConnection {
    /// Call the connection was opened for
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Configuration the connection was opened with
    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Chunks written so far, in write order
    pub async fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks.lock().await.clone()
    }

    pub async fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks.lock().await.iter().map(Vec::len).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Deliver an event as if the engine produced it
    ///
    /// Returns false when the connection is already closed.
    pub async fn emit(&self, event: EngineEvent) -> bool {
        let events = self.events.lock().await;
        match events.as_ref() {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Close the connection from the engine side
    pub async fn hang_up(&self) {
        self.events.lock().await.take();
    }
}

struct MockSink {
    connection: Arc<MockConnection>,
}

#[async_trait::async_trait]
impl AudioSink for MockSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        if self.connection.is_closed() {
            bail!("write on closed mock connection {}", self.connection.index);
        }

        self.connection.chunks.lock().await.push(chunk.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.connection.closed.store(true, Ordering::SeqCst);
        self.connection.hang_up().await;
        debug!("Mock connection {} closed", self.connection.index);
        Ok(())
    }
}
