//! The contract between a connection and the transport carrying it.
//!
//! A [`Transport`] is a thin, swappable carrier (WebSocket, XHR long-poll,
//! ...); all protocol state — handshake, heartbeat, dispatch — lives above
//! this layer. [`ConnectionUpcalls`] is the mirror image: the callbacks a
//! transport invokes on its owning connection when something happens on the
//! wire. The two traits are deliberately non-generic over each other (no
//! `Transport<C: ConnectionUpcalls>`) so a transport can hold its upcall
//! target as a `Weak`/`Arc`-erased trait object instead of an owning
//! reference — the connection owns its transport, not the other way round.

use async_trait::async_trait;

use crate::error::DecodeError;
use crate::message::Message;

/// Carries frames for one connection over a concrete wire mechanism.
///
/// Implementations are not required to be internally synchronized beyond
/// what's needed to satisfy `Send + Sync`; callers are expected to serialize
/// access the way the connection's monitor does.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the underlying carrier (WebSocket upgrade, first long-poll GET,
    /// ...). Idempotent only in the sense that calling it on an already
    /// connected transport is a logic error the implementation may reject.
    async fn connect(&self) -> Result<(), DecodeError>;

    /// Tear down the carrier without signaling an error upstream; used for
    /// planned disconnects.
    async fn disconnect(&self);

    /// Mark the transport permanently unusable after an unrecoverable I/O
    /// fault. Distinct from `disconnect` so upcalls can tell a clean close
    /// from a faulted one.
    fn invalidate(&self);

    /// Send a single already-encoded frame.
    async fn send(&self, payload: &str) -> Result<(), DecodeError>;

    /// Send a batch of already-encoded frames as one unit where the carrier
    /// supports it. The default forwards to [`Transport::send`] once per
    /// payload; a transport whose wire format batches natively (long-poll's
    /// framed-datagram wrapper) should override this.
    async fn send_bulk(&self, payloads: &[String]) -> Result<(), DecodeError> {
        for payload in payloads {
            self.send(payload).await?;
        }
        Ok(())
    }

    /// Whether this transport has a native bulk-send path. Connections use
    /// this to decide whether outbound buffering is worth doing at all.
    fn can_send_bulk(&self) -> bool {
        false
    }
}

/// Callbacks a [`Transport`] invokes on its owning connection.
///
/// These map directly onto the wire events a transport can observe: the
/// carrier coming up, raw bytes/text arriving (before frame decoding), a
/// decoded frame arriving, the carrier going down, and a carrier-level
/// fault. A transport that decodes frames itself calls `transport_message`;
/// one that only moves bytes calls `transport_data` and leaves decoding to
/// the connection.
#[async_trait]
pub trait ConnectionUpcalls: Send + Sync {
    /// The transport finished connecting and is ready to carry frames.
    async fn transport_connected(&self);

    /// Raw, not-yet-framed data arrived (a long-poll response body before
    /// the framed-datagram wrapper has been split).
    async fn transport_data(&self, raw: &str);

    /// One decoded frame arrived.
    async fn transport_message(&self, message: Message);

    /// The transport closed, whether cleanly or not.
    async fn transport_disconnected(&self);

    /// The transport hit an unrecoverable fault and has invalidated itself.
    async fn transport_error(&self, error: DecodeError);
}
