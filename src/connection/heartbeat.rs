//! Heartbeat watchdog: the timeout that fires after a window of inbound
//! silence, and its reset on every inbound frame.

use std::sync::Arc;
use std::time::Duration;

use super::Connection;
use crate::error::SocketIoError;

/// (Re)schedule the watchdog. Cancels whatever was previously scheduled.
/// A no-op before the handshake has populated the timeouts.
pub(crate) fn reset_heartbeat_timer(conn: &Arc<Connection>) {
    let (duration, generation) = {
        let mut core = conn.core.lock();
        if core.state.is_terminal() {
            return;
        }
        if let Some(handle) = core.heartbeat_task.take() {
            handle.abort();
        }
        let duration = Duration::from_millis(core.closing_timeout_ms + core.heartbeat_timeout_ms);
        (duration, core.generation)
    };

    if duration.is_zero() {
        return;
    }

    let task_conn = Arc::clone(conn);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        fire_watchdog(task_conn, generation).await;
    });

    conn.core.lock().heartbeat_task = Some(handle);
}

async fn fire_watchdog(conn: Arc<Connection>, generation: u64) {
    let within_ms = {
        let core = conn.core.lock();
        if core.generation != generation || core.state.is_terminal() {
            return;
        }
        core.closing_timeout_ms + core.heartbeat_timeout_ms
    };

    conn.fail(SocketIoError::HeartbeatTimeout { within_ms }).await;
}

#[cfg(test)]
mod tests {
    use super::super::test_support::new_test_connection;
    use super::*;
    use crate::connection::state::ConnectionState;

    #[tokio::test]
    async fn watchdog_is_a_no_op_before_timeouts_are_known() {
        let conn = new_test_connection();
        reset_heartbeat_timer(&conn);
        assert!(conn.core.lock().heartbeat_task.is_none());
    }

    #[tokio::test]
    async fn watchdog_fires_after_the_configured_silence_window() {
        let conn = new_test_connection();
        {
            let mut core = conn.core.lock();
            core.heartbeat_timeout_ms = 1;
            core.closing_timeout_ms = 1;
            core.state = ConnectionState::Ready;
        }

        reset_heartbeat_timer(&conn);
        assert!(conn.core.lock().heartbeat_task.is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(conn.state(), ConnectionState::Invalid);
    }

    #[tokio::test]
    async fn a_stale_watchdog_generation_is_ignored() {
        let conn = new_test_connection();
        {
            let mut core = conn.core.lock();
            core.heartbeat_timeout_ms = 5;
            core.closing_timeout_ms = 5;
            core.state = ConnectionState::Ready;
        }
        reset_heartbeat_timer(&conn);

        // Bump the generation as `cleanup` would on a fresh, unrelated
        // transition — the in-flight watchdog should see it's stale and
        // no-op instead of invalidating a connection that has moved on.
        conn.core.lock().generation += 1;
        conn.core.lock().state = ConnectionState::Ready;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(conn.state(), ConnectionState::Ready);
    }
}
