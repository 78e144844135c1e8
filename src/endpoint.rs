//! Shared endpoint behavior.
//!
//! [`Endpoint`] is the caller surface implemented by both role variants.
//! [`EndpointCore`] holds the state they share: the bounded line queues,
//! the session handle, and the connection flag. The queues are the only
//! mutable state crossing between the caller and the background task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EndpointConfig;
use crate::error::{EndpointError, EndpointResult};
use crate::stats::{ConnectionStats, StatsSnapshot};

/// Consumer half of the outbound queue, lent to each session's pump.
pub(crate) type SharedReceiver = Arc<Mutex<mpsc::Receiver<String>>>;

/// Caller surface shared by both endpoint roles.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Start a background session, first stopping any session already
    /// running. Safe to call repeatedly; calling while started restarts.
    ///
    /// Failures inside the session (bind, connect, socket errors) are
    /// logged and contained there; they never surface here.
    async fn start(&self);

    /// Cancel the running session and wait until its cleanup has
    /// completed. No-op when no session is active.
    async fn stop(&self);

    /// Queue a line for transmission. Waits only while the outbound queue
    /// is full; returns once enqueued. Delivery is not guaranteed.
    async fn send(&self, line: String) -> EndpointResult<()>;

    /// Dequeue the oldest received line, or `None` when nothing is
    /// buffered. Never waits.
    fn receive(&self) -> Option<String>;

    /// Whether a peer connection is currently open.
    fn is_connected(&self) -> bool;

    /// Snapshot of the endpoint's traffic counters.
    fn stats(&self) -> StatsSnapshot;
}

/// Handle to one running background session.
struct Session {
    /// Cancellation signal observed by the session task.
    token: CancellationToken,
    /// The session task itself.
    handle: JoinHandle<()>,
}

impl Session {
    /// Cancel the session and wait for its task to finish cleanup.
    async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Session task panicked");
        }
    }
}

/// State shared by both endpoint roles.
pub(crate) struct EndpointCore {
    /// Endpoint configuration.
    pub(crate) config: EndpointConfig,
    /// Producer half of the outbound queue (caller side).
    outbound_tx: mpsc::Sender<String>,
    /// Consumer half of the outbound queue. Persists across sessions, so
    /// lines queued while disconnected are delivered on the next
    /// connection.
    pub(crate) outbound_rx: SharedReceiver,
    /// Producer half of the inbound queue, cloned into each session.
    pub(crate) inbound_tx: mpsc::Sender<String>,
    /// Consumer half of the inbound queue (caller side).
    inbound_rx: StdMutex<mpsc::Receiver<String>>,
    /// True while a peer connection is open. Written only by the pump.
    pub(crate) connected: Arc<AtomicBool>,
    /// Traffic counters. Written only by the pump.
    pub(crate) stats: Arc<ConnectionStats>,
    /// The at-most-one live session.
    session: Mutex<Option<Session>>,
}

impl EndpointCore {
    pub(crate) fn new(config: EndpointConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.queue_capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.queue_capacity);

        Self {
            config,
            outbound_tx,
            outbound_rx: Arc::new(Mutex::new(outbound_rx)),
            inbound_tx,
            inbound_rx: StdMutex::new(inbound_rx),
            connected: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(ConnectionStats::default()),
            session: Mutex::new(None),
        }
    }

    /// Stop any running session, then install the task built by `spawn`
    /// as the new one.
    ///
    /// The session lock is held across cancel, join and spawn, so exactly
    /// zero or one session task is live at any time.
    pub(crate) async fn replace_session<F>(&self, spawn: F)
    where
        F: FnOnce(CancellationToken) -> JoinHandle<()>,
    {
        let mut session = self.session.lock().await;
        if let Some(prev) = session.take() {
            prev.shutdown().await;
        }

        let token = CancellationToken::new();
        let handle = spawn(token.clone());
        *session = Some(Session { token, handle });
    }

    /// Cancel the running session (if any) and wait for its cleanup.
    pub(crate) async fn stop(&self) {
        let mut session = self.session.lock().await;
        if let Some(prev) = session.take() {
            prev.shutdown().await;
        }
    }

    /// Enqueue a line for the pump, waiting while the queue is full.
    pub(crate) async fn send(&self, line: String) -> EndpointResult<()> {
        self.outbound_tx
            .send(line)
            .await
            .map_err(|_| EndpointError::ChannelClosed("outbound queue"))
    }

    /// Dequeue the oldest received line without waiting.
    pub(crate) fn receive(&self) -> Option<String> {
        self.inbound_rx.lock().ok()?.try_recv().ok()
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
