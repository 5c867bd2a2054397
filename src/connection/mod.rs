//! The connection state machine: one per (origin, live handshake) tuple,
//! owning a transport, a send buffer, a namespace table and an ack table
//! behind a single monitor.
//!
//! A small struct holding immutable identity plus a lock-guarded mutable
//! core, with the actual behavior spread across sibling modules
//! (`handshake`, `connect_worker`, `heartbeat`, `send`, `reconnect`,
//! `dispatch`, `upcalls`) rather than one giant `impl` block.

mod core;
mod connect_worker;
mod dispatch;
mod handshake;
mod heartbeat;
mod reconnect;
mod send;
mod state;
mod upcalls;

pub use state::ConnectionState;
pub(crate) use upcalls::ConnectionHandle;

use std::sync::Arc;

use http::HeaderMap;
use parking_lot::Mutex;
use sio_proto::Message;
use tokio::sync::RwLock;
use url::Url;

use crate::ack::AckTable;
use crate::config::ClientConfig;
use crate::error::SocketIoError;
use crate::json::JsonCodec;
use crate::socket::NamespaceSocket;
use core::ConnectionCore;

/// One Socket.IO connection: a handshake, a transport, and the namespaces
/// multiplexed over it.
///
/// Always held behind an `Arc`; background tasks (connect-worker, heartbeat,
/// reconnect) and the transport's upcall handle each hold their own clone or
/// `Weak`, so nothing about this type assumes a single owner.
pub struct Connection {
    pub(crate) origin: Url,
    pub(crate) origin_str: String,
    pub(crate) config: ClientConfig,
    pub(crate) headers: Arc<RwLock<HeaderMap>>,
    pub(crate) codec: Arc<dyn JsonCodec>,
    pub(crate) core: Mutex<ConnectionCore>,
}

impl Connection {
    /// Construct a connection and kick off its connect-worker task. Does
    /// not register any namespace socket — callers (the registry) do that
    /// immediately after, which is what populates the "first socket" slot.
    pub(crate) fn spawn(
        origin: Url,
        config: ClientConfig,
        codec: Arc<dyn JsonCodec>,
    ) -> Arc<Self> {
        let origin_str = origin.to_string();
        let headers = Arc::new(RwLock::new(config.default_headers.clone()));
        let conn = Arc::new(Self {
            origin,
            origin_str,
            config,
            headers,
            codec,
            core: Mutex::new(ConnectionCore::new()),
        });

        let worker_conn = Arc::clone(&conn);
        tokio::spawn(async move {
            connect_worker::run_connect_worker(worker_conn).await;
        });

        conn
    }

    /// Register the socket that triggered this connection's creation (the
    /// registry calls this exactly once, immediately after [`Connection::spawn`]).
    /// It becomes the "first socket" used to short-circuit the server's
    /// missing initial `CONNECT` reply for the default namespace —
    /// unlike [`Connection::try_register`], it never transmits an explicit
    /// `CONNECT` frame itself; that is decided once the server's own `1::`
    /// arrives (see `dispatch::handle_connect`).
    pub(crate) async fn force_register(self: &Arc<Self>, socket: Arc<NamespaceSocket>) {
        let mut core = self.core.lock();
        core.namespaces.insert(socket.namespace().to_string(), Arc::clone(&socket));
        core.first_socket = Some(socket);
    }

    /// Register a namespace socket on an already-existing connection.
    /// Refuses — returning `false` — if the namespace is already
    /// taken; the registry then spawns a fresh connection for it instead.
    /// On success, transmits an explicit `CONNECT` frame for the namespace
    /// (buffered if not yet `Ready`).
    pub(crate) async fn try_register(self: &Arc<Self>, socket: Arc<NamespaceSocket>) -> bool {
        let namespace = socket.namespace().to_string();
        {
            let mut core = self.core.lock();
            if core.namespaces.contains_key(&namespace) {
                return false;
            }
            core.namespaces.insert(namespace.clone(), socket);
        }
        send::send_plain(self, format!("1::{namespace}")).await;
        true
    }

    /// Unregister a namespace socket: emit `0::<namespace>`, fire
    /// its `onDisconnect`, and — once the namespace table empties, the
    /// non-empty-namespace-table invariant — clean the connection up
    /// and remove it from the registry.
    pub(crate) async fn unregister(self: &Arc<Self>, namespace: &str) {
        let removed = {
            let mut core = self.core.lock();
            core.namespaces.remove(namespace)
        };
        let Some(socket) = removed else {
            return;
        };

        send::send_plain(self, format!("0::{namespace}")).await;
        socket.callbacks().on_disconnect().await;

        let now_empty = self.core.lock().namespaces.is_empty();
        if now_empty {
            self.cleanup().await;
        }
    }

    /// Send a plain-text `Message` frame, optionally requesting an ack.
    pub(crate) async fn send_message(
        self: &Arc<Self>,
        namespace: &str,
        text: String,
        ack: Option<crate::ack::AckCallback>,
    ) {
        let frame = self.build_frame(sio_proto::MessageType::Message, namespace, text, ack);
        send::send_plain(self, frame.to_string()).await;
    }

    /// Send a `JsonMessage` frame, optionally requesting an ack.
    pub(crate) async fn send_json(
        self: &Arc<Self>,
        namespace: &str,
        value: serde_json::Value,
        ack: Option<crate::ack::AckCallback>,
    ) {
        let data = self.codec.encode_value(&value);
        let frame = self.build_frame(sio_proto::MessageType::JsonMessage, namespace, data, ack);
        send::send_plain(self, frame.to_string()).await;
    }

    /// Send a named `Event` frame, optionally requesting an ack.
    pub(crate) async fn emit(
        self: &Arc<Self>,
        namespace: &str,
        name: &str,
        args: Vec<serde_json::Value>,
        ack: Option<crate::ack::AckCallback>,
    ) {
        let payload = serde_json::json!({ "name": name, "args": args });
        let data = self.codec.encode_value(&payload);
        let frame = self.build_frame(sio_proto::MessageType::Event, namespace, data, ack);
        send::send_plain(self, frame.to_string()).await;
    }

    /// The connection's current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.core.lock().state
    }

    /// The session id the handshake assigned, once it has completed.
    pub fn session_id(&self) -> Option<String> {
        self.core.lock().session_id.clone()
    }

    fn build_frame(
        &self,
        message_type: sio_proto::MessageType,
        namespace: &str,
        data: String,
        ack: Option<crate::ack::AckCallback>,
    ) -> Message {
        let id = match ack {
            Some(callback) => {
                let id = self.core.lock().acks.allocate(callback);
                format!("{id}+")
            }
            None => String::new(),
        };
        Message {
            message_type,
            id,
            endpoint: namespace.to_string(),
            data,
        }
    }

    /// User-triggered reconnect. Public entry point wrapping the
    /// `reconnect` module's logic.
    pub async fn reconnect(self: &Arc<Self>) {
        reconnect::reconnect(self).await;
    }

    pub(crate) async fn dispatch(self: &Arc<Self>, message: Message) {
        dispatch::dispatch_message(self, message).await;
    }

    pub(crate) async fn on_transport_connected(self: &Arc<Self>) {
        {
            let mut core = self.core.lock();
            if core.state.is_terminal() {
                return;
            }
            core.state = ConnectionState::Ready;
            if let Some(handle) = core.reconnect_task.take() {
                handle.abort();
            }
            core.keepalive_queued = false;
        }
        heartbeat::reset_heartbeat_timer(self);
        send::flush(self).await;
        self.fan_out_state(ConnectionState::Ready).await;
    }

    pub(crate) async fn on_transport_lost(self: &Arc<Self>, cause: Option<SocketIoError>) {
        let moved = {
            let mut core = self.core.lock();
            if core.state.is_terminal() {
                false
            } else {
                if let Some(ref e) = cause {
                    core.last_error = Some(Arc::new(clone_error(e)));
                }
                core.state = ConnectionState::Interrupted;
                true
            }
        };
        if !moved {
            return;
        }
        if let Some(e) = cause {
            self.fan_out_error(Arc::new(e)).await;
        }
        self.fan_out_state(ConnectionState::Interrupted).await;
    }

    /// A namespace callback raised an error. Callback exceptions never
    /// propagate to the caller that triggered dispatch; they are caught
    /// and fanned out as a connection-level fault instead, not a state
    /// transition.
    pub(crate) async fn raise_callback_exception(self: &Arc<Self>, error: SocketIoError) {
        tracing::warn!(error = %error, "namespace callback raised");
        self.fan_out_error(Arc::new(error)).await;
    }

    /// A fatal, unrecoverable error (handshake/transport-selection failure,
    /// heartbeat timeout): record it, fan it out, and clean the connection
    /// up.
    pub(crate) async fn fail(self: &Arc<Self>, error: SocketIoError) {
        tracing::warn!(error = %error, "connection failed");
        self.core.lock().last_error = Some(Arc::new(clone_error(&error)));
        self.fan_out_error(Arc::new(error)).await;
        self.cleanup().await;
    }

    pub(crate) async fn notify_session_id(self: &Arc<Self>, session_id: String) {
        let targets: Vec<Arc<NamespaceSocket>> = self.core.lock().namespaces.values().cloned().collect();
        for target in targets {
            target.callbacks().on_session_id(session_id.clone()).await;
        }
    }

    pub(crate) async fn set_state(self: &Arc<Self>, state: ConnectionState) {
        let changed = {
            let mut core = self.core.lock();
            if core.state.is_terminal() {
                false
            } else {
                core.state = state;
                true
            }
        };
        if changed {
            self.fan_out_state(state).await;
        }
    }

    async fn fan_out_state(self: &Arc<Self>, state: ConnectionState) {
        let targets: Vec<Arc<NamespaceSocket>> = self.core.lock().namespaces.values().cloned().collect();
        for target in targets {
            target.callbacks().on_state(state).await;
        }
    }

    async fn fan_out_error(self: &Arc<Self>, error: Arc<SocketIoError>) {
        let targets: Vec<Arc<NamespaceSocket>> = self.core.lock().namespaces.values().cloned().collect();
        for target in targets {
            target.callbacks().on_error(Arc::clone(&error)).await;
        }
    }

    /// Idempotent teardown: → `Invalid`, disconnect the transport,
    /// abort scheduled tasks, clear the namespace table, remove from the
    /// registry.
    pub(crate) async fn cleanup(self: &Arc<Self>) {
        let transport = {
            let mut core = self.core.lock();
            if core.state.is_terminal() {
                return;
            }
            core.state = ConnectionState::Invalid;
            core.generation += 1;
            core.abort_tasks();
            core.namespaces.clear();
            core.transport.take()
        };
        if let Some(transport) = transport {
            transport.disconnect().await;
        }
        crate::registry::ConnectionRegistry::global().remove(&self.origin_str, self);
    }
}

/// `SocketIoError` doesn't implement `Clone` (its `DecodeError` source
/// doesn't round-trip cleanly through `thiserror`'s `#[from]`), so faults
/// that need to be both stored and fanned out are re-described by message
/// rather than cloned structurally.
fn clone_error(error: &SocketIoError) -> SocketIoError {
    SocketIoError::CallbackException(error.to_string())
}

/// Test-only helpers shared across this module tree's `#[cfg(test)]`
/// blocks: a way to build a [`Connection`] without going through
/// [`Connection::spawn`] (which kicks off a real, networked connect-worker
/// task), and a recording [`sio_proto::Transport`] double for exercising
/// send buffering and bulk-flush behavior.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::json::SerdeJsonCodec;
    use async_trait::async_trait;
    use sio_proto::{DecodeError, Transport};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// A connection in `Init` state, registered with nobody, with no
    /// background connect-worker running.
    pub fn new_test_connection() -> Arc<Connection> {
        Arc::new(Connection {
            origin: Url::parse("http://test.invalid/").unwrap(),
            origin_str: "http://test.invalid/".to_string(),
            config: ClientConfig::default(),
            headers: Arc::new(RwLock::new(HeaderMap::new())),
            codec: Arc::new(SerdeJsonCodec),
            core: Mutex::new(ConnectionCore::new()),
        })
    }

    pub async fn register_test_socket(
        conn: &Arc<Connection>,
        namespace: &str,
        callbacks: Arc<dyn crate::socket::SocketCallbacks>,
    ) -> Arc<NamespaceSocket> {
        let socket = Arc::new(NamespaceSocket::new(
            namespace,
            callbacks,
            Arc::clone(&conn.headers),
        ));
        let is_first = conn.core.lock().namespaces.is_empty();
        if is_first {
            conn.force_register(Arc::clone(&socket)).await;
        } else {
            assert!(conn.try_register(Arc::clone(&socket)).await);
        }
        socket
    }

    /// A [`Transport`] double that records everything sent to it and can be
    /// told to fail its next `send`/`send_bulk` call exactly once.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<String>>,
        pub bulk_calls: AtomicUsize,
        pub fail_next_bulk: AtomicBool,
        pub fail_next_send: AtomicBool,
        pub bulk_capable: bool,
    }

    impl RecordingTransport {
        pub fn bulk_capable() -> Self {
            Self {
                bulk_capable: true,
                ..Default::default()
            }
        }

        pub fn sent_frames(&self) -> Vec<String> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn connect(&self) -> Result<(), DecodeError> {
            Ok(())
        }

        async fn disconnect(&self) {}

        fn invalidate(&self) {}

        async fn send(&self, payload: &str) -> Result<(), DecodeError> {
            if self.fail_next_send.swap(false, Ordering::SeqCst) {
                return Err(DecodeError::TransportFailure("send failed".into()));
            }
            self.sent.lock().push(payload.to_string());
            Ok(())
        }

        async fn send_bulk(&self, payloads: &[String]) -> Result<(), DecodeError> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_next_bulk.swap(false, Ordering::SeqCst) {
                return Err(DecodeError::TransportFailure("bulk send failed".into()));
            }
            self.sent.lock().extend(payloads.iter().cloned());
            Ok(())
        }

        fn can_send_bulk(&self) -> bool {
            self.bulk_capable
        }
    }
}
