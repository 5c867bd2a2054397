//! Outbound send buffering and flushing.

use std::sync::Arc;

use super::state::ConnectionState;
use super::Connection;

/// The single internal send primitive. Hands to the transport if `Ready`;
/// on transport exception, or while not `Ready`, appends to the buffer.
pub(crate) async fn send_plain(conn: &Arc<Connection>, frame: String) {
    let transport = {
        let core = conn.core.lock();
        if core.state == ConnectionState::Ready {
            core.transport.clone()
        } else {
            None
        }
    };

    let Some(transport) = transport else {
        conn.core.lock().send_buffer.push(frame);
        return;
    };

    if let Err(e) = transport.send(&frame).await {
        tracing::warn!(error = %e, "send failed while ready, re-buffering frame");
        conn.core.lock().send_buffer.push(frame);
    }
}

/// Flush the send buffer on transition into `Ready`. Bulk-capable
/// transports get one `send_bulk` call; on failure the original buffer is
/// restored, with anything appended during the flush left at its tail (see
/// the design notes on the bulk-flush restore race — no interleaving is
/// attempted).
pub(crate) async fn flush(conn: &Arc<Connection>) {
    let (transport, frames, bulk) = {
        let mut core = conn.core.lock();
        let Some(transport) = core.transport.clone() else {
            return;
        };
        if core.send_buffer.is_empty() {
            return;
        }
        if transport.can_send_bulk() {
            let frames = std::mem::take(&mut core.send_buffer);
            (transport, frames, true)
        } else {
            let frames = core.send_buffer.clone();
            core.send_buffer.clear();
            (transport, frames, false)
        }
    };

    if !bulk {
        for frame in frames {
            send_plain(conn, frame).await;
        }
        return;
    }

    if let Err(e) = transport.send_bulk(&frames).await {
        tracing::warn!(error = %e, "bulk flush failed, restoring send buffer");
        let mut core = conn.core.lock();
        let mut restored = frames;
        restored.extend(std::mem::take(&mut core.send_buffer));
        core.send_buffer = restored;
    }
}
