//! User-triggered reconnect. The core never reconnects
//! automatically on transport loss — this is a deliberate platform-
//! delegation choice; see the design notes.

use std::sync::Arc;
use std::time::Duration;

use super::connect_worker::connect_transport;
use super::send::send_plain;
use super::state::ConnectionState;
use super::Connection;

/// Invalidate the current transport, move to `Interrupted`, and schedule a
/// new reconnect attempt. A no-op once `Invalid`.
pub(crate) async fn reconnect(conn: &Arc<Connection>) {
    let moved = {
        let mut core = conn.core.lock();
        if core.state.is_terminal() {
            return;
        }
        if let Some(transport) = core.transport.take() {
            transport.invalidate();
        }
        core.state = ConnectionState::Interrupted;
        if let Some(handle) = core.reconnect_task.take() {
            handle.abort();
        }
        true
    };

    if moved {
        conn.fan_out_state(ConnectionState::Interrupted).await;
        schedule_reconnect(conn);
    }
}

fn schedule_reconnect(conn: &Arc<Connection>) {
    let delay = Duration::from_millis(conn.config.reconnect_delay_ms);
    let task_conn = Arc::clone(conn);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        run_reconnect_attempt(task_conn).await;
    });
    conn.core.lock().reconnect_task = Some(handle);
}

async fn run_reconnect_attempt(conn: Arc<Connection>) {
    if conn.core.lock().state.is_terminal() {
        return;
    }
    conn.set_state(ConnectionState::Connecting).await;

    if let Err(e) = connect_transport(&conn).await {
        conn.fail(e).await;
        return;
    }

    let should_queue_keepalive = {
        let mut core = conn.core.lock();
        if core.keepalive_queued {
            false
        } else {
            core.keepalive_queued = true;
            true
        }
    };
    if should_queue_keepalive {
        send_plain(&conn, "2::".to_string()).await;
    }
}
