//! Observability and Metrics
//!
//! Atomic counters for connection traffic: one [`ConnectionStats`] per
//! connection and a process-wide [`Metrics`] instance for lifecycle events.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;

use crate::error::DisconnectReason;

/// Traffic counters for a single connection
#[derive(Debug, Default)]
pub struct ConnectionStats {
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
    heartbeats_sent: AtomicU64,
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
    heartbeats_received: AtomicU64,
    /// Frames queued but not yet flushed to the transport
    pending_writes: AtomicUsize,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame entered the outbound queue
    pub(crate) fn frame_queued(&self) {
        self.pending_writes.fetch_add(1, Ordering::AcqRel);
    }

    /// A queued frame will never be written
    pub(crate) fn frame_dropped(&self) {
        self.pending_writes.fetch_sub(1, Ordering::AcqRel);
    }

    /// Frames left in the queue or an unfinished batch at teardown
    pub(crate) fn frames_dropped(&self, frames: usize) {
        if frames > 0 {
            self.pending_writes.fetch_sub(frames, Ordering::AcqRel);
        }
    }

    /// A batch of frames reached the transport
    pub(crate) fn frames_flushed(&self, frames: u64, heartbeats: u64, payload_bytes: u64) {
        self.frames_sent.fetch_add(frames, Ordering::Relaxed);
        self.heartbeats_sent.fetch_add(heartbeats, Ordering::Relaxed);
        self.bytes_sent.fetch_add(payload_bytes, Ordering::Relaxed);
        self.pending_writes
            .fetch_sub(frames as usize, Ordering::AcqRel);
    }

    pub(crate) fn message_received(&self, payload_bytes: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(payload_bytes, Ordering::Relaxed);
    }

    pub(crate) fn heartbeat_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.heartbeats_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn pending_writes(&self) -> usize {
        self.pending_writes.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ConnectionStatsSnapshot {
        ConnectionStatsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            heartbeats_received: self.heartbeats_received.load(Ordering::Relaxed),
            pending_writes: self.pending_writes(),
        }
    }
}

/// Point-in-time copy of [`ConnectionStats`].
///
/// Frame counts include heartbeats; byte counts are payload bytes only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStatsSnapshot {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub heartbeats_sent: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub heartbeats_received: u64,
    pub pending_writes: usize,
}

/// Global metrics collector for connection lifecycle events
#[derive(Debug)]
pub struct Metrics {
    /// Total connections created
    pub connections_total: AtomicU64,
    /// Connections created and not yet torn down
    pub connections_active: AtomicU64,
    /// Connections torn down by a local close
    pub closed_locally: AtomicU64,
    /// Connections lost to a transport failure or end of stream
    pub transport_disconnects: AtomicU64,
    /// Connections dropped for breaking the framing rules
    pub protocol_disconnects: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            closed_locally: AtomicU64::new(0),
            transport_disconnects: AtomicU64::new(0),
            protocol_disconnects: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a new connection
    pub fn connection_created(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closed by its owner
    pub fn connection_closed(&self) {
        self.closed_locally.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a connection lost to a terminal condition
    pub fn connection_lost(&self, reason: &DisconnectReason) {
        if reason.is_protocol_violation() {
            self.protocol_disconnects.fetch_add(1, Ordering::Relaxed);
        } else {
            self.transport_disconnects.fetch_add(1, Ordering::Relaxed);
        }
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a connection dropped by its owner without ever being closed
    pub fn connection_abandoned(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            closed_locally: self.closed_locally.load(Ordering::Relaxed),
            transport_disconnects: self.transport_disconnects.load(Ordering::Relaxed),
            protocol_disconnects: self.protocol_disconnects.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_total = snapshot.connections_total,
            connections_active = snapshot.connections_active,
            closed_locally = snapshot.closed_locally,
            transport_disconnects = snapshot.transport_disconnects,
            protocol_disconnects = snapshot.protocol_disconnects,
            uptime_seconds = snapshot.uptime_seconds,
            "Connection metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub closed_locally: u64,
    pub transport_disconnects: u64,
    pub protocol_disconnects: u64,
    pub uptime_seconds: u64,
}

/// Global metrics instance
static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}
