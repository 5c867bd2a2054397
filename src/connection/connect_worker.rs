//! The one-shot connect-worker task: drives `Init` → `Handshake` →
//! `Connecting` → `Ready` with a cold-path handshake followed by a
//! hot-path transport connect.

use std::sync::Arc;

use crate::connection::handshake::perform_handshake;
use crate::connection::state::ConnectionState;
use crate::connection::upcalls::ConnectionHandle;
use crate::error::SocketIoError;
use crate::transports::websocket::WebSocketTransport;
use crate::transports::xhr::XhrTransport;

use super::Connection;

pub(crate) async fn run_connect_worker(conn: Arc<Connection>) {
    conn.set_state(ConnectionState::Handshake).await;

    let headers = conn.headers.read().await.clone();
    let handshake = match perform_handshake(
        &conn.origin,
        &headers,
        conn.config.handshake_timeout_ms,
        conn.config.tls_config.clone(),
    )
    .await
    {
        Ok(info) => info,
        Err(e) => {
            conn.fail(e).await;
            return;
        }
    };

    {
        let mut core = conn.core.lock();
        core.session_id = Some(handshake.session_id.clone());
        core.heartbeat_timeout_ms = handshake.heartbeat_timeout_ms;
        core.closing_timeout_ms = handshake.closing_timeout_ms;
        core.transports_supported = handshake.transports.clone();
    }

    {
        let mut headers_mut = conn.headers.write().await;
        if let Ok(value) = http::HeaderValue::from_str(&handshake.session_id) {
            headers_mut.insert("sessionId", value);
        } else {
            tracing::warn!(session_id = %handshake.session_id, "session id is not a valid header value");
        }
    }
    conn.notify_session_id(handshake.session_id.clone()).await;

    conn.set_state(ConnectionState::Connecting).await;

    if let Err(e) = connect_transport(&conn).await {
        conn.fail(e).await;
    }
}

pub(crate) async fn connect_transport(conn: &Arc<Connection>) -> Result<(), SocketIoError> {
    let supported = conn.core.lock().transports_supported.clone();
    let handle = ConnectionHandle::new(Arc::downgrade(conn));

    let tls_config = conn.config.tls_config.clone();
    let transport: Arc<dyn sio_proto::Transport> = if supported.iter().any(|t| t == "websocket") {
        Arc::new(WebSocketTransport::new(conn.origin.clone(), handle, tls_config))
    } else if supported.iter().any(|t| t == "xhr-polling") {
        Arc::new(XhrTransport::new(
            conn.origin.clone(),
            handle,
            conn.headers.clone(),
            tls_config,
        ))
    } else {
        return Err(SocketIoError::NoCommonTransport {
            origin: conn.origin_str.clone(),
        });
    };

    transport
        .connect()
        .await
        .map_err(|e| SocketIoError::TransportIo(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;

    conn.core.lock().transport = Some(transport);
    Ok(())
}
