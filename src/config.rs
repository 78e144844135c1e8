//! Endpoint configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Capacity of the outbound and inbound line queues.
pub const QUEUE_CAPACITY: usize = 16;

/// Default timeout for establishing an outbound connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default timeout for one accept attempt on the listening socket.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default timeout for one read attempt on an open connection.
///
/// Short on purpose: the pump drains the outbound queue and observes
/// cancellation between read attempts, so this bounds both send latency
/// and shutdown latency. Applies identically to both roles.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Default maximum length of a single wire line in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Configuration for a server or client endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Address the server binds, or the client connects to.
    pub addr: SocketAddr,

    /// Capacity of each line queue.
    pub queue_capacity: usize,

    /// Timeout for establishing an outbound connection (client role).
    pub connect_timeout: Duration,

    /// Timeout for one accept attempt (server role).
    pub accept_timeout: Duration,

    /// Timeout for one read attempt on an open connection (both roles).
    pub read_timeout: Duration,

    /// Maximum length of a single wire line in bytes, excluding the
    /// terminator.
    pub max_line_len: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:0".parse().unwrap(),
            queue_capacity: QUEUE_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl EndpointConfig {
    /// Create a new configuration for the specified address.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Default::default()
        }
    }

    /// Set the capacity of the outbound and inbound queues.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the accept timeout.
    pub fn with_accept_timeout(mut self, timeout: Duration) -> Self {
        self.accept_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the maximum wire line length.
    pub fn with_max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }
}
