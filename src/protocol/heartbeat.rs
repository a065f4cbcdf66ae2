//! Outbound keep-alive.
//!
//! Every `interval` a zero-length frame is queued through the ordinary write
//! path, so heartbeats are ordered with payloads and never interleave with them.
//! This is purely outbound: inbound silence is not timed out here.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, trace};

use crate::core::frame::Frame;
use crate::service::connection::Connection;

/// Run until the connection closes. A zero interval disables heartbeats.
#[instrument(
    name = "heartbeat",
    skip_all,
    fields(conn_id = %conn.id(), interval_ms = interval.as_millis() as u64)
)]
pub(crate) async fn run(conn: Arc<Connection>, interval: Duration) {
    if interval.is_zero() {
        debug!("Heartbeat disabled");
        return;
    }

    let shutdown = conn.shutdown_token().clone();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        if conn.is_closed() {
            break;
        }
        if conn.enqueue(Frame::Heartbeat).is_err() {
            break;
        }
        trace!("Heartbeat queued");
    }
}
