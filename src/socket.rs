//! The user-facing namespace socket and its callback contract.
//!
//! `SocketCallbacks` is the seam applications implement: this crate never
//! assumes a particular event-loop or UI framework on the other end of a
//! callback. The connection itself implements the same trait to act as the
//! aggregating callback for endpoint-empty inbound messages (see
//! [`crate::connection::Connection`]'s dispatch), rather than subclassing a
//! namespace socket.

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::ack::AckReply;
use crate::connection::ConnectionState;
use crate::error::SocketIoError;

/// The callback contract a namespace socket's owner implements.
///
/// Every method has a no-op default so an implementation only needs to
/// override what it cares about. The message/event variants are fallible:
/// a returned `Err` is caught by the connection and raised as a fault,
/// never propagated to the caller that triggered dispatch.
#[async_trait]
pub trait SocketCallbacks: Send + Sync {
    async fn on_connect(&self) {}

    async fn on_disconnect(&self) {}

    async fn on_message(&self, _text: String, _ack: Option<AckReply>) -> Result<(), SocketIoError> {
        Ok(())
    }

    async fn on_json_message(
        &self,
        _value: Value,
        _ack: Option<AckReply>,
    ) -> Result<(), SocketIoError> {
        Ok(())
    }

    async fn on_event(
        &self,
        _name: String,
        _ack: Option<AckReply>,
        _args: Vec<Value>,
    ) -> Result<(), SocketIoError> {
        Ok(())
    }

    async fn on_error(&self, _error: Arc<SocketIoError>) {}

    async fn on_session_id(&self, _session_id: String) {}

    async fn on_state(&self, _state: ConnectionState) {}
}

/// One namespace multiplexed over a connection's transport.
///
/// The empty namespace string denotes the default namespace.
pub struct NamespaceSocket {
    namespace: String,
    callbacks: Arc<dyn SocketCallbacks>,
    headers: Arc<RwLock<HeaderMap>>,
}

impl NamespaceSocket {
    pub fn new(
        namespace: impl Into<String>,
        callbacks: Arc<dyn SocketCallbacks>,
        headers: Arc<RwLock<HeaderMap>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            callbacks,
            headers,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn callbacks(&self) -> &Arc<dyn SocketCallbacks> {
        &self.callbacks
    }

    pub fn headers(&self) -> &Arc<RwLock<HeaderMap>> {
        &self.headers
    }
}
