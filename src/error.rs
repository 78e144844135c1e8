//! Endpoint error types.

use std::io;
use std::net::SocketAddr;
use std::str::Utf8Error;
use thiserror::Error;

/// Endpoint-specific errors.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Outbound connection attempt exceeded the configured timeout.
    #[error("Connect timeout to {addr}")]
    ConnectTimeout { addr: SocketAddr },

    /// A wire line exceeded the maximum allowed length.
    #[error("Line too long: {len} bytes (max: {max})")]
    LineTooLong { len: usize, max: usize },

    /// Received bytes that are not valid UTF-8.
    #[error("Invalid UTF-8 on the wire: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    /// A queue handle was dropped.
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),
}

/// Result type for endpoint operations.
pub type EndpointResult<T> = Result<T, EndpointError>;
