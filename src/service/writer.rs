//! Dedicated writer task for a connection.
//!
//! The outbound queue is an mpsc channel with exactly one consumer: this task,
//! which also owns the transport's write half. Senders never touch the socket,
//! so there is never more than one write in flight, and frames leave in queue
//! order.
//!
//! ```text
//! send_packet ─┐
//! heartbeat  ──┴─► mpsc::UnboundedSender<Frame> ─► writer task ─► write half
//! ```
//!
//! Frames already waiting in the queue are fed into the sink together and
//! flushed once, so a burst of small packets costs one syscall instead of many.

use std::sync::Arc;

use futures::SinkExt;
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;
use tracing::{debug, instrument, trace};

use crate::core::codec::FrameCodec;
use crate::core::frame::Frame;
use crate::error::Result;
use crate::service::connection::{BoxedWriter, Connection};
use crate::utils::metrics::ConnectionStats;

/// Maximum frames fed before a flush
const MAX_BATCH_SIZE: usize = 64;

type FrameSink = FramedWrite<BoxedWriter, FrameCodec>;

#[instrument(name = "writer", skip_all, fields(conn_id = %conn.id()))]
pub(crate) async fn run(
    conn: Arc<Connection>,
    writer: BoxedWriter,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
) {
    let mut sink = FramedWrite::new(writer, FrameCodec::new(conn.max_message_size()));
    let shutdown = conn.shutdown_token().clone();
    // frames taken off the queue but not yet flushed
    let mut unflushed = 0usize;

    loop {
        let first = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            frame = outbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        unflushed = 1;

        // a peer that stopped reading must not keep close() from taking effect
        let stats = conn.connection_stats();
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = write_batch(&mut sink, &mut outbound, first, &mut unflushed, stats) => result,
        };

        if let Err(e) = result {
            conn.fail(e.into());
            break;
        }
    }

    // nothing queued from here on will be written
    outbound.close();
    while outbound.try_recv().is_ok() {
        unflushed += 1;
    }
    conn.connection_stats().frames_dropped(unflushed);

    debug!(dropped = unflushed, "Writer finished");
}

/// Feed `first` plus whatever is already queued, then flush.
async fn write_batch(
    sink: &mut FrameSink,
    outbound: &mut mpsc::UnboundedReceiver<Frame>,
    first: Frame,
    unflushed: &mut usize,
    stats: &ConnectionStats,
) -> Result<()> {
    let mut frames = 0u64;
    let mut heartbeats = 0u64;
    let mut bytes = 0u64;
    let mut next = Some(first);

    while let Some(frame) = next.take() {
        frames += 1;
        if frame.is_heartbeat() {
            heartbeats += 1;
        }
        bytes += frame.payload_len() as u64;

        sink.feed(frame).await?;

        if frames as usize >= MAX_BATCH_SIZE {
            break;
        }
        next = outbound.try_recv().ok();
        if next.is_some() {
            *unflushed += 1;
        }
    }

    sink.flush().await?;
    stats.frames_flushed(frames, heartbeats, bytes);
    *unflushed = 0;
    trace!(frames, heartbeats, bytes, "Batch written");
    Ok(())
}
