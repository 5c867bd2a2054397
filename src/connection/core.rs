//! The mutable core guarded by a connection's monitor.
//!
//! A single lock guards all of a connection's mutable state: the
//! lifecycle state, send buffer, namespace table, ack table, and the
//! current transport handle.

use std::collections::HashMap;
use std::sync::Arc;

use sio_proto::Transport;
use tokio::task::JoinHandle;

use crate::ack::AckTable;
use crate::connection::state::ConnectionState;
use crate::error::SocketIoError;
use crate::socket::NamespaceSocket;

pub(crate) struct ConnectionCore {
    pub state: ConnectionState,
    pub session_id: Option<String>,
    pub heartbeat_timeout_ms: u64,
    pub closing_timeout_ms: u64,
    pub transports_supported: Vec<String>,
    pub transport: Option<Arc<dyn Transport>>,
    pub send_buffer: Vec<String>,
    pub namespaces: HashMap<String, Arc<NamespaceSocket>>,
    pub acks: AckTable,
    /// The socket that triggered this connection's creation, used to
    /// short-circuit the server's missing initial `CONNECT` reply for the
    /// default namespace (see `dispatch::handle_connect`).
    pub first_socket: Option<Arc<NamespaceSocket>>,
    pub keepalive_queued: bool,
    pub last_error: Option<Arc<SocketIoError>>,
    pub heartbeat_task: Option<JoinHandle<()>>,
    pub reconnect_task: Option<JoinHandle<()>>,
    /// Incremented on every `Invalid` transition; scheduled task bodies
    /// check it on wake and no-op if it has moved on, so an aborted task
    /// racing its own abort can't act on stale state.
    pub generation: u64,
}

impl ConnectionCore {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Init,
            session_id: None,
            heartbeat_timeout_ms: 0,
            closing_timeout_ms: 0,
            transports_supported: Vec::new(),
            transport: None,
            send_buffer: Vec::new(),
            namespaces: HashMap::new(),
            acks: AckTable::new(),
            first_socket: None,
            keepalive_queued: false,
            last_error: None,
            heartbeat_task: None,
            reconnect_task: None,
            generation: 0,
        }
    }

    /// Abort and clear any scheduled heartbeat/reconnect tasks.
    pub fn abort_tasks(&mut self) {
        if let Some(handle) = self.heartbeat_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.reconnect_task.take() {
            handle.abort();
        }
    }
}
