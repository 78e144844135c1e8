//! Endpoint traffic counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative traffic counters for an endpoint.
///
/// Written only by the pump task; readable from any thread. Counters span
/// the endpoint's lifetime, not a single connection.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Number of lines written to the wire.
    lines_sent: AtomicU64,
    /// Number of lines read off the wire.
    lines_recv: AtomicU64,
    /// Number of bytes written to the wire, terminators included.
    bytes_sent: AtomicU64,
    /// Number of bytes read off the wire, terminators included.
    bytes_recv: AtomicU64,
}

impl ConnectionStats {
    /// Record that a line was written to the wire.
    pub(crate) fn record_send(&self, bytes: u64) {
        self.lines_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record that a line was read off the wire.
    pub(crate) fn record_recv(&self, bytes: u64) {
        self.lines_recv.fetch_add(1, Ordering::Relaxed);
        self.bytes_recv.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_sent: self.lines_sent.load(Ordering::Relaxed),
            lines_recv: self.lines_recv.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_recv: self.bytes_recv.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of endpoint traffic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Number of lines written to the wire.
    pub lines_sent: u64,
    /// Number of lines read off the wire.
    pub lines_recv: u64,
    /// Number of bytes written to the wire, terminators included.
    pub bytes_sent: u64,
    /// Number of bytes read off the wire, terminators included.
    pub bytes_recv: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = ConnectionStats::default();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());

        stats.record_send(11);
        stats.record_send(5);
        stats.record_recv(7);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.lines_sent, 2);
        assert_eq!(snapshot.bytes_sent, 16);
        assert_eq!(snapshot.lines_recv, 1);
        assert_eq!(snapshot.bytes_recv, 7);
    }
}
