//! Server endpoint: listen and serve one peer at a time.

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::EndpointConfig;
use crate::connection::run_connection;
use crate::endpoint::{Endpoint, EndpointCore, SharedReceiver};
use crate::error::EndpointResult;
use crate::stats::{ConnectionStats, StatsSnapshot};

/// Listening endpoint serving one peer connection at a time.
///
/// Lifecycle: Idle → `start()` → Listening → accept → Serving one peer →
/// pump exits → Listening → … ; `stop()` from any state → Idle. A second
/// connection attempt waits in the accept backlog, unserved, while one
/// peer is active.
pub struct ServerEndpoint {
    core: EndpointCore,
    /// Bound listener address, published by the listener task.
    bound_addr: Arc<StdMutex<Option<SocketAddr>>>,
}

impl ServerEndpoint {
    /// Create a server endpoint. Call [`Endpoint::start`] to begin
    /// listening.
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            core: EndpointCore::new(config),
            bound_addr: Arc::new(StdMutex::new(None)),
        }
    }

    /// The address the listener is bound to, once listening.
    ///
    /// With a port-0 config this reports the OS-assigned port. `None`
    /// while stopped or before the bind completes.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.lock().ok()?
    }
}

#[async_trait]
impl Endpoint for ServerEndpoint {
    async fn start(&self) {
        let config = self.core.config.clone();
        let outbound = self.core.outbound_rx.clone();
        let inbound = self.core.inbound_tx.clone();
        let connected = self.core.connected.clone();
        let stats = self.core.stats.clone();
        let bound_addr = self.bound_addr.clone();

        self.core
            .replace_session(move |token| {
                tokio::spawn(run_listener(
                    config, outbound, inbound, connected, stats, bound_addr, token,
                ))
            })
            .await;
    }

    async fn stop(&self) {
        self.core.stop().await;
    }

    async fn send(&self, line: String) -> EndpointResult<()> {
        self.core.send(line).await
    }

    fn receive(&self) -> Option<String> {
        self.core.receive()
    }

    fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    fn stats(&self) -> StatsSnapshot {
        self.core.stats()
    }
}

/// Listener task: bind, then accept and serve peers until cancelled.
async fn run_listener(
    config: EndpointConfig,
    outbound: SharedReceiver,
    inbound: mpsc::Sender<String>,
    connected: Arc<AtomicBool>,
    stats: Arc<ConnectionStats>,
    bound_addr: Arc<StdMutex<Option<SocketAddr>>>,
    token: CancellationToken,
) {
    let listener = match bind_listener(config.addr) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.addr, error = %e, "Failed to bind listener");
            return;
        }
    };

    match listener.local_addr() {
        Ok(addr) => {
            tracing::info!(addr = %addr, "Listening");
            if let Ok(mut slot) = bound_addr.lock() {
                *slot = Some(addr);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to read bound address"),
    }

    while !token.is_cancelled() {
        let accepted = tokio::select! {
            _ = token.cancelled() => break,
            result = timeout(config.accept_timeout, listener.accept()) => result,
        };

        match accepted {
            // Accept timeout: nobody connected this cycle. Normal.
            Err(_) => continue,
            Ok(Ok((stream, peer))) => {
                tracing::info!(peer = %peer, "Accepted peer");
                // One peer is served to completion before accepting again.
                run_connection(
                    stream, peer, &config, &outbound, &inbound, &connected, &stats, &token,
                )
                .await;
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Accept failed");
                break;
            }
        }
    }

    // Teardown runs on every exit path: close the listening socket and
    // clear the published address.
    if let Ok(mut slot) = bound_addr.lock() {
        *slot = None;
    }
    drop(listener);
    tracing::info!(addr = %config.addr, "Listener closed");
}

/// Bind the listening socket with address reuse enabled.
fn bind_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1024)
}

// Accept-loop behavior requires live sockets and is covered in the
// acceptance tests.
