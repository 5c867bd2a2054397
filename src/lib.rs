//! # sio-client
//!
//! A client-side implementation of the Socket.IO 0.9-era protocol: a
//! multiplexed, bidirectional, message-oriented session layered over an
//! interchangeable transport (WebSocket or XHR long-poll).
//!
//! The hard part lives in [`connection::Connection`] — the state machine
//! that performs the out-of-band handshake, negotiates and owns a
//! transport, multiplexes namespace sockets over it, frames and parses the
//! wire protocol, runs the heartbeat/reconnect regime, and buffers
//! outbound traffic across transport outages. [`SioSocket`] is the thin
//! facade a host application actually touches: one namespace, registered
//! against a (possibly shared) connection resolved through the process-wide
//! [`ConnectionRegistry`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use sio_client::{ClientConfig, SioSocket, SocketCallbacks};
//!
//! struct Handler;
//!
//! #[async_trait]
//! impl SocketCallbacks for Handler {
//!     async fn on_connect(&self) {
//!         println!("connected");
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let socket = SioSocket::connect(
//!     "http://localhost:3000".parse()?,
//!     "/chat",
//!     ClientConfig::default(),
//!     Arc::new(Handler),
//! )
//! .await;
//! socket.emit("hello", vec![serde_json::json!("world")]).await;
//! # Ok(())
//! # }
//! ```

pub mod ack;
pub mod config;
pub mod connection;
pub mod error;
pub mod json;
pub mod registry;
pub mod socket;
pub mod tls;
pub mod transports;

use std::sync::Arc;

use serde_json::Value;
use url::Url;

pub use ack::AckReply;
pub use config::{ClientConfig, ClientConfigFile};
pub use connection::ConnectionState;
pub use error::{ConfigError, SocketIoError};
pub use json::{JsonCodec, SerdeJsonCodec};
pub use registry::ConnectionRegistry;
pub use socket::SocketCallbacks;

use connection::Connection;

/// A handle to one namespace multiplexed over a (possibly shared)
/// connection.
///
/// This is the crate's main entry point: constructing one resolves or
/// creates the underlying [`Connection`] via the process-wide
/// [`ConnectionRegistry`], registers `callbacks` against the requested
/// namespace, and returns a handle whose `send`/`emit`/`reconnect`/
/// `disconnect` methods proxy straight onto that connection.
pub struct SioSocket {
    connection: Arc<Connection>,
    namespace: String,
}

impl SioSocket {
    /// Resolve or create a connection for `origin` and register `callbacks`
    /// under `namespace` (the empty string denotes the default namespace).
    ///
    /// Returns as soon as the socket is registered — the handshake and
    /// transport connect happen on a background connect-worker task;
    /// failures surface through `callbacks.on_error` and
    /// `callbacks.on_state`, not through this call.
    pub async fn connect(
        origin: Url,
        namespace: impl Into<String>,
        config: ClientConfig,
        callbacks: Arc<dyn SocketCallbacks>,
    ) -> Self {
        Self::connect_with(
            ConnectionRegistry::global(),
            origin,
            namespace,
            config,
            Arc::new(SerdeJsonCodec),
            callbacks,
        )
        .await
    }

    /// As [`SioSocket::connect`], but against an explicit registry and
    /// JSON codec rather than the process-wide defaults. Useful for tests
    /// and for host applications that want isolated registries.
    pub async fn connect_with(
        registry: &ConnectionRegistry,
        origin: Url,
        namespace: impl Into<String>,
        config: ClientConfig,
        codec: Arc<dyn JsonCodec>,
        callbacks: Arc<dyn SocketCallbacks>,
    ) -> Self {
        let namespace = namespace.into();
        let connection = registry
            .register(origin, namespace.clone(), config, codec, callbacks)
            .await;
        Self {
            connection,
            namespace,
        }
    }

    /// The namespace this socket is registered under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The underlying connection's current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// The session id the handshake assigned, once available.
    pub fn session_id(&self) -> Option<String> {
        self.connection.session_id()
    }

    /// Send a plain-text `Message` frame.
    pub async fn send(&self, text: impl Into<String>) {
        self.connection
            .send_message(&self.namespace, text.into(), None)
            .await;
    }

    /// Send a plain-text `Message` frame, requesting a server ack.
    pub async fn send_with_ack(
        &self,
        text: impl Into<String>,
        ack: impl FnOnce(Vec<Value>) + Send + 'static,
    ) {
        self.connection
            .send_message(&self.namespace, text.into(), Some(Box::new(ack)))
            .await;
    }

    /// Send a `JsonMessage` frame.
    pub async fn send_json(&self, value: Value) {
        self.connection.send_json(&self.namespace, value, None).await;
    }

    /// Send a `JsonMessage` frame, requesting a server ack.
    pub async fn send_json_with_ack(
        &self,
        value: Value,
        ack: impl FnOnce(Vec<Value>) + Send + 'static,
    ) {
        self.connection
            .send_json(&self.namespace, value, Some(Box::new(ack)))
            .await;
    }

    /// Emit a named `Event` frame with positional arguments.
    pub async fn emit(&self, name: &str, args: Vec<Value>) {
        self.connection.emit(&self.namespace, name, args, None).await;
    }

    /// Emit a named `Event` frame, requesting a server ack.
    pub async fn emit_with_ack(
        &self,
        name: &str,
        args: Vec<Value>,
        ack: impl FnOnce(Vec<Value>) + Send + 'static,
    ) {
        self.connection
            .emit(&self.namespace, name, args, Some(Box::new(ack)))
            .await;
    }

    /// User-triggered reconnect. The core never reconnects
    /// automatically on transport loss; callers should invoke this in
    /// response to an external signal (a platform network-change event).
    pub async fn reconnect(&self) {
        self.connection.reconnect().await;
    }

    /// Unregister this namespace from its connection: emits the
    /// disconnect frame, fires this socket's own `onDisconnect`, and — if
    /// it was the last namespace on the connection — tears the whole
    /// connection down.
    pub async fn disconnect(&self) {
        self.connection.unregister(&self.namespace).await;
    }
}
