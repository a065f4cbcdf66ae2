//! # Connection
//!
//! A persistent duplex connection over one [`Transport`].
//!
//! Each started connection runs three tasks on the ambient tokio runtime:
//! - the read loop, decoding frames and handing payloads to the listener
//! - the writer, draining the outbound queue one batch at a time
//! - the heartbeat, queueing an empty frame every `heartbeat_interval`
//!
//! Every task holds an `Arc<Connection>`, so the connection outlives whatever it
//! has in flight. Teardown goes through one atomic flag: whichever of
//! [`Connection::close`] or the first failure claims it wins, and everything
//! after it becomes a no-op.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::ConnectionConfig;
use crate::core::codec::FrameCodec;
use crate::core::frame::Frame;
use crate::error::{ConnectionError, DisconnectReason, Result};
use crate::protocol::heartbeat;
use crate::service::listener::ConnectionListener;
use crate::service::writer;
use crate::transport::{self, Transport};
use crate::utils::metrics::{global_metrics, ConnectionStats, ConnectionStatsSnapshot};

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Transport halves and queue receiver, parked here until `start()` hands them
/// to the tasks.
struct Parked {
    reader: BoxedReader,
    writer: BoxedWriter,
    outbound: mpsc::UnboundedReceiver<Frame>,
}

pub struct Connection {
    id: ConnectionId,
    peer: String,
    listener: Arc<dyn ConnectionListener>,
    config: ConnectionConfig,
    max_message_size: usize,
    outbound: mpsc::UnboundedSender<Frame>,
    parked: Mutex<Option<Parked>>,
    /// Held across each listener delivery and while a failure claims `closed`
    delivery: Mutex<()>,
    started: AtomicBool,
    closed: AtomicBool,
    shutdown: CancellationToken,
    stats: ConnectionStats,
}

impl Connection {
    /// Bind `listener` to `transport` and apply the configured socket tuning.
    ///
    /// No I/O happens until [`Connection::start`]. Packets sent before that are
    /// queued and go out once the writer runs.
    pub fn create<T: Transport>(
        listener: Arc<dyn ConnectionListener>,
        transport: T,
        config: ConnectionConfig,
    ) -> Arc<Self> {
        let id = ConnectionId::next();
        let peer = transport.describe();

        transport::apply_socket_options(&transport, &config.socket, id);

        let (reader, writer) = tokio::io::split(transport);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let max_message_size = FrameCodec::new(config.max_message_size).max_message_size();

        global_metrics().connection_created();
        debug!(conn_id = %id, peer = %peer, "Connection created");

        Arc::new(Self {
            id,
            peer,
            listener,
            config,
            max_message_size,
            outbound: outbound_tx,
            parked: Mutex::new(Some(Parked {
                reader: Box::new(reader),
                writer: Box::new(writer),
                outbound: outbound_rx,
            })),
            delivery: Mutex::new(()),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            stats: ConnectionStats::new(),
        })
    }

    /// Begin the heartbeat schedule and the read loop.
    ///
    /// Must be called once, from within a tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let handle =
            Handle::try_current().map_err(|e| ConnectionError::NoRuntime(e.to_string()))?;

        let parked = {
            let mut slot = self.parked.lock().map_err(|_| ConnectionError::LockPoisoned)?;
            if self.is_started() {
                return Err(ConnectionError::AlreadyStarted);
            }
            // closed before it was ever started
            let parked = slot.take().ok_or(ConnectionError::ConnectionClosed)?;
            self.started.store(true, Ordering::Release);
            parked
        };

        handle.spawn(heartbeat::run(Arc::clone(self), self.config.heartbeat_interval));
        handle.spawn(writer::run(Arc::clone(self), parked.writer, parked.outbound));
        handle.spawn(Arc::clone(self).read_loop(parked.reader));

        info!(conn_id = %self.id, peer = %self.peer, "Connection started");
        Ok(())
    }

    /// Queue `payload` for delivery.
    ///
    /// Never blocks and never waits for the peer; the queue is unbounded. An empty
    /// payload goes out as a bare length prefix, which the peer treats as a
    /// heartbeat.
    pub fn send_packet(&self, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        if payload.len() > self.max_message_size {
            return Err(ConnectionError::OversizedFrame {
                size: payload.len(),
                max: self.max_message_size,
            });
        }
        self.enqueue(Frame::from(payload))
    }

    /// Cancel the heartbeat and close the transport.
    ///
    /// Idempotent and non-blocking. Operations still in flight wind down on
    /// their own and report nothing.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shutdown.cancel();
        // an unstarted connection still holds its transport and queue
        let parked = match self.parked.lock() {
            Ok(mut parked) => parked.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut parked) = parked {
            parked.outbound.close();
            let mut dropped = 0;
            while parked.outbound.try_recv().is_ok() {
                dropped += 1;
            }
            self.stats.frames_dropped(dropped);
        }

        global_metrics().connection_closed();
        info!(conn_id = %self.id, pending = self.stats.pending_writes(), "Connection closed");
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Peer description reported by the transport
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// True once the connection was closed or failed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Frames queued but not yet flushed to the transport.
    ///
    /// Frames still queued at teardown are discarded and stop counting once the
    /// writer has exited.
    pub fn pending_writes(&self) -> usize {
        self.stats.pending_writes()
    }

    pub fn stats(&self) -> ConnectionStatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn connection_stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub(crate) fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    pub(crate) fn enqueue(&self, frame: Frame) -> Result<()> {
        if self.is_closed() {
            return Err(ConnectionError::ConnectionClosed);
        }

        self.stats.frame_queued();
        self.outbound.send(frame).map_err(|_| {
            self.stats.frame_dropped();
            ConnectionError::ConnectionClosed
        })
    }

    /// Report the first terminal condition; later ones are swallowed.
    ///
    /// The flag is claimed under the delivery lock, so a payload handed to the
    /// listener is never reported after the disconnect.
    pub(crate) fn fail(self: &Arc<Self>, reason: DisconnectReason) {
        let claimed = {
            let _delivery = self.delivery.lock().unwrap_or_else(|p| p.into_inner());
            !self.closed.swap(true, Ordering::AcqRel)
        };
        if !claimed {
            trace!(conn_id = %self.id, reason = %reason, "Already closing, failure suppressed");
            return;
        }

        self.shutdown.cancel();
        global_metrics().connection_lost(&reason);

        if reason.is_protocol_violation() {
            warn!(
                conn_id = %self.id,
                peer = %self.peer,
                reason = %reason,
                "Protocol violation, disconnecting"
            );
        } else {
            info!(conn_id = %self.id, peer = %self.peer, reason = %reason, "Connection lost");
        }

        self.listener.on_disconnected(self, &reason);
    }

    /// Hand one payload to the listener unless the connection already closed.
    fn deliver(self: &Arc<Self>, payload: Bytes) -> bool {
        let _delivery = self.delivery.lock().unwrap_or_else(|p| p.into_inner());
        if self.is_closed() {
            return false;
        }
        trace!(bytes = payload.len(), "Packet received");
        self.listener.on_packet_received(self, payload);
        true
    }

    #[instrument(name = "read_loop", skip_all, fields(conn_id = %self.id))]
    async fn read_loop(self: Arc<Self>, reader: BoxedReader) {
        let mut frames = FramedRead::new(reader, FrameCodec::new(self.max_message_size));

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = frames.next() => next,
            };

            match next {
                Some(Ok(Frame::Heartbeat)) => {
                    self.stats.heartbeat_received();
                    trace!("Heartbeat received");
                }
                Some(Ok(Frame::Message(payload))) => {
                    self.stats.message_received(payload.len() as u64);
                    if !self.deliver(payload) {
                        break;
                    }
                }
                Some(Err(e)) => {
                    self.fail(e.into());
                    break;
                }
                None => {
                    self.fail(DisconnectReason::EndOfStream);
                    break;
                }
            }
        }

        debug!("Read loop finished");
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("started", &self.is_started())
            .field("closed", &self.is_closed())
            .field("pending_writes", &self.pending_writes())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if !*self.closed.get_mut() {
            global_metrics().connection_abandoned();
        }
        trace!(conn_id = %self.id, "Connection released");
    }
}
