//! Client endpoint: one outbound connection per session.

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::EndpointConfig;
use crate::connection::run_connection;
use crate::endpoint::{Endpoint, EndpointCore, SharedReceiver};
use crate::error::{EndpointError, EndpointResult};
use crate::stats::{ConnectionStats, StatsSnapshot};

/// Connecting endpoint holding at most one outbound connection.
///
/// A connect timeout or failure ends the session without retry; call
/// [`Endpoint::start`] again to attempt a new connection.
pub struct ClientEndpoint {
    core: EndpointCore,
}

impl ClientEndpoint {
    /// Create a client endpoint. Call [`Endpoint::start`] to connect.
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            core: EndpointCore::new(config),
        }
    }
}

#[async_trait]
impl Endpoint for ClientEndpoint {
    async fn start(&self) {
        let config = self.core.config.clone();
        let outbound = self.core.outbound_rx.clone();
        let inbound = self.core.inbound_tx.clone();
        let connected = self.core.connected.clone();
        let stats = self.core.stats.clone();

        self.core
            .replace_session(move |token| {
                tokio::spawn(run_client(config, outbound, inbound, connected, stats, token))
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

/// Session task: connect with a timeout, then pump the single connection.
async fn run_client(
    config: EndpointConfig,
    outbound: SharedReceiver,
    inbound: mpsc::Sender<String>,
    connected: Arc<AtomicBool>,
    stats: Arc<ConnectionStats>,
    token: CancellationToken,
) {
    let stream = match connect(config.addr, config.connect_timeout).await {
        Ok(stream) => stream,
        // No retry: the session ends and the caller may start() again.
        Err(e) => {
            tracing::error!(addr = %config.addr, error = %e, "Connect failed");
            return;
        }
    };

    tracing::info!(addr = %config.addr, "Connected");
    run_connection(
        stream,
        config.addr,
        &config,
        &outbound,
        &inbound,
        &connected,
        &stats,
        &token,
    )
    .await;
}

/// Attempt one TCP connection bounded by `connect_timeout`.
async fn connect(addr: SocketAddr, connect_timeout: Duration) -> EndpointResult<TcpStream> {
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(EndpointError::Io(e)),
        Err(_) => Err(EndpointError::ConnectTimeout { addr }),
    }
}

// Connect behavior requires live sockets and is covered in the acceptance
// tests.
