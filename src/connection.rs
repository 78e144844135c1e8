//! The connection pump.
//!
//! One call to [`run_connection`] owns one live socket from open to close.
//! Each cycle drains the outbound queue, then attempts one bounded read,
//! until the peer disconnects, an I/O error occurs, or the session token is
//! cancelled. The cleanup after the loop always runs: cancellation is
//! cooperative (the task is never aborted), so teardown cannot be skipped
//! mid-iteration.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use crate::config::EndpointConfig;
use crate::error::{EndpointError, EndpointResult};
use crate::framing::LineCodec;
use crate::stats::ConnectionStats;

/// Why the pump loop ended.
enum PumpExit {
    /// The session was cancelled.
    Cancelled,
    /// The peer closed its side of the connection.
    PeerClosed,
}

/// Run the shared read/write loop over one open connection.
///
/// Returns once the connection is fully torn down. I/O failures are
/// contained here; callers observe them only through the connected flag.
pub(crate) async fn run_connection(
    stream: TcpStream,
    peer: SocketAddr,
    config: &EndpointConfig,
    outbound: &Mutex<mpsc::Receiver<String>>,
    inbound: &mpsc::Sender<String>,
    connected: &AtomicBool,
    stats: &ConnectionStats,
    token: &CancellationToken,
) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
    }

    let mut framed = Framed::new(stream, LineCodec::new(config.max_line_len));

    connected.store(true, Ordering::Release);
    tracing::info!(peer = %peer, "Connection open");

    match pump(&mut framed, peer, config, outbound, inbound, stats, token).await {
        Ok(PumpExit::Cancelled) => tracing::info!(peer = %peer, "Session cancelled"),
        Ok(PumpExit::PeerClosed) => tracing::info!(peer = %peer, "Peer closed connection"),
        Err(e) => tracing::error!(peer = %peer, error = %e, "Connection error"),
    }

    // Teardown runs on every exit path before the session handle resolves.
    connected.store(false, Ordering::Release);
    if let Err(e) = framed.get_mut().shutdown().await {
        tracing::debug!(peer = %peer, error = %e, "Socket already closed");
    }
    drop(framed);
    tracing::info!(peer = %peer, "Connection closed");
}

/// The pump loop proper. `Ok` is a normal exit; `Err` is a connection
/// failure to be logged by the caller.
async fn pump(
    framed: &mut Framed<TcpStream, LineCodec>,
    peer: SocketAddr,
    config: &EndpointConfig,
    outbound: &Mutex<mpsc::Receiver<String>>,
    inbound: &mpsc::Sender<String>,
    stats: &ConnectionStats,
    token: &CancellationToken,
) -> EndpointResult<PumpExit> {
    loop {
        // Give other tasks a slice each cycle; bounds busy-spin when the
        // read timeout is short.
        tokio::task::yield_now().await;

        // Drain pending sends. Each line is flushed individually to keep
        // latency low.
        {
            let mut queue = outbound.lock().await;
            while let Ok(line) = queue.try_recv() {
                let len = line.len() as u64;
                framed.send(line).await?;
                stats.record_send(len + 1);
                tracing::debug!(peer = %peer, bytes = len, "Sent line");
            }
        }

        if token.is_cancelled() {
            return Ok(PumpExit::Cancelled);
        }

        // One bounded read. Elapsing just means no data this cycle.
        match timeout(config.read_timeout, framed.next()).await {
            Err(_) => continue,
            Ok(None) => return Ok(PumpExit::PeerClosed),
            Ok(Some(Ok(line))) => {
                let len = line.len() as u64;
                // Enqueue with backpressure, raced against cancellation so
                // a full inbound queue can never wedge shutdown.
                tokio::select! {
                    _ = token.cancelled() => return Ok(PumpExit::Cancelled),
                    sent = inbound.send(line) => {
                        if sent.is_err() {
                            return Err(EndpointError::ChannelClosed("inbound queue"));
                        }
                    }
                }
                stats.record_recv(len + 1);
                tracing::debug!(peer = %peer, bytes = len, "Received line");
            }
            Ok(Some(Err(e))) => return Err(e),
        }
    }
}
