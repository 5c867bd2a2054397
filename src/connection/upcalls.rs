//! The two halves of the upcall seam: a non-owning handle
//! transports call into, and the connection's own aggregating callback
//! implementation used for endpoint-empty dispatch.
//!
//! A transport holds the connection behind `Arc<dyn Transport>` on the
//! connection side, so the reverse reference here is deliberately a
//! [`std::sync::Weak`] rather than an owning `Arc` — a literal "transport
//! holds an Arc to the connection, connection holds an Arc to the
//! transport" pair would be a reference cycle neither side ever drops. Each
//! upcall upgrades the weak reference and is a no-op if the connection is
//! already gone.

use std::sync::Weak;

use async_trait::async_trait;
use sio_proto::{ConnectionUpcalls, DecodeError, Message};

use super::Connection;

#[derive(Clone)]
pub struct ConnectionHandle {
    connection: Weak<Connection>,
}

impl ConnectionHandle {
    pub fn new(connection: Weak<Connection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ConnectionUpcalls for ConnectionHandle {
    async fn transport_connected(&self) {
        let Some(conn) = self.connection.upgrade() else {
            return;
        };
        conn.on_transport_connected().await;
    }

    async fn transport_data(&self, raw: &str) {
        let Some(conn) = self.connection.upgrade() else {
            return;
        };
        let payloads = match sio_proto::framed::unwrap(raw) {
            Ok(payloads) => payloads,
            Err(e) => {
                tracing::warn!(error = %e, "failed to unwrap framed-datagram envelope");
                conn.fail(e.into()).await;
                return;
            }
        };
        for payload in payloads {
            match payload.parse::<Message>() {
                Ok(message) => conn.dispatch(message).await,
                Err(e) => {
                    tracing::warn!(error = %e, payload = %payload, "failed to decode frame");
                    conn.fail(e.into()).await;
                    return;
                }
            }
        }
    }

    async fn transport_message(&self, message: Message) {
        let Some(conn) = self.connection.upgrade() else {
            return;
        };
        conn.dispatch(message).await;
    }

    async fn transport_disconnected(&self) {
        let Some(conn) = self.connection.upgrade() else {
            return;
        };
        conn.on_transport_lost(None).await;
    }

    async fn transport_error(&self, error: DecodeError) {
        let Some(conn) = self.connection.upgrade() else {
            return;
        };
        conn.on_transport_lost(Some(error.into())).await;
    }
}
