//! Single-connection, line-oriented TCP endpoints.
//!
//! This crate provides a TCP endpoint abstraction operating in either
//! server (listen-and-accept) or client (connect) role, exposing a queued,
//! cancellable, restartable send/receive surface while a background task
//! performs the socket I/O. The message unit is a UTF-8 text line
//! terminated by `\n`; there is no other framing. At most one peer
//! connection is active at a time.
//!
//! # Architecture
//!
//! ```text
//! Caller (e.g. a UI task)
//! ├── send()        → bounded outbound queue ──┐
//! ├── receive()     ← bounded inbound queue ───┤
//! ├── is_connected()                           │
//! └── start()/stop()                           ▼
//!     Session task (at most one per endpoint)
//!     ├── server: bind → accept (bounded) → pump, one peer at a time
//!     ├── client: connect (bounded) → pump
//!     └── pump: drain outbound → bounded read → enqueue inbound
//! ```
//!
//! Cross-thread state is limited to the two queues, the connected flag and
//! the traffic counters; the socket never leaves the session task.
//! `stop()` (and the implicit stop inside `start()`) cancels the session
//! cooperatively and waits for its cleanup to finish.
//!
//! # Usage
//!
//! ```ignore
//! use linewire::{ClientEndpoint, Endpoint, EndpointConfig};
//!
//! let config = EndpointConfig::new("127.0.0.1:8000".parse()?);
//! let endpoint = ClientEndpoint::new(config);
//!
//! endpoint.start().await;
//! endpoint.send("HelloWorld".to_string()).await?;
//! while let Some(line) = endpoint.receive() {
//!     println!("{line}");
//! }
//! endpoint.stop().await;
//! ```

pub mod config;
pub mod error;

pub mod client;
mod connection;
pub mod endpoint;
pub mod framing;
pub mod server;
pub mod stats;

// Re-export main types
pub use client::ClientEndpoint;
pub use config::{EndpointConfig, QUEUE_CAPACITY};
pub use endpoint::Endpoint;
pub use error::{EndpointError, EndpointResult};
pub use framing::LineCodec;
pub use server::ServerEndpoint;
pub use stats::{ConnectionStats, StatsSnapshot};
