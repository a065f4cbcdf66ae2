use std::sync::Arc;

use bytes::Bytes;

use crate::error::DisconnectReason;
use crate::service::connection::Connection;

/// Receives everything a [`Connection`] has to report.
///
/// Callbacks run on the runtime's worker threads, from the connection's reader
/// and writer tasks, so they should return quickly. Calling back into the
/// connection (`send_packet`, `close`) from inside a callback is fine.
pub trait ConnectionListener: Send + Sync + 'static {
    /// A complete, non-empty payload arrived. Heartbeats never reach this.
    fn on_packet_received(&self, connection: &Arc<Connection>, payload: Bytes);

    /// The connection hit its first terminal condition. Called at most once.
    fn on_disconnected(&self, connection: &Arc<Connection>, reason: &DisconnectReason);
}
