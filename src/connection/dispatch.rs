//! Inbound message dispatch: route a decoded `Message` to the right
//! namespace callback by endpoint, then act on it by type.

use std::sync::Arc;

use serde_json::Value;
use sio_proto::{Message, MessageType};

use super::heartbeat::reset_heartbeat_timer;
use super::send::send_plain;
use super::Connection;
use crate::ack::{split_inbound_ack, AckReply, RemoteAck};
use crate::error::SocketIoError;
use crate::socket::NamespaceSocket;

/// Empty endpoint means the connection's own aggregating callback, which
/// fans out to every registered namespace; otherwise the single socket
/// registered under that namespace, if any.
fn targets_for_endpoint(conn: &Connection, endpoint: &str) -> Vec<Arc<NamespaceSocket>> {
    let core = conn.core.lock();
    if endpoint.is_empty() {
        core.namespaces.values().cloned().collect()
    } else {
        core.namespaces.get(endpoint).cloned().into_iter().collect()
    }
}

/// Like [`targets_for_endpoint`], but a non-empty endpoint with no
/// registered socket is a connection fault, not a log-and-drop: the server
/// sent data for a namespace this client never joined (or already left).
/// Returns `None` after raising the fault; the caller should stop
/// processing this frame.
async fn targets_for_endpoint_or_fault(
    conn: &Arc<Connection>,
    endpoint: &str,
) -> Option<Vec<Arc<NamespaceSocket>>> {
    let targets = targets_for_endpoint(conn, endpoint);
    if targets.is_empty() && !endpoint.is_empty() {
        conn.fail(SocketIoError::UnregisteredNamespace {
            endpoint: endpoint.to_string(),
        })
        .await;
        return None;
    }
    Some(targets)
}

/// Wrap a [`RemoteAck`] in an [`AckReply`] that, on first send, frames and
/// buffers the ack through this connection.
fn build_ack_reply(conn: &Arc<Connection>, remote: RemoteAck) -> AckReply {
    let conn = Arc::clone(conn);
    AckReply::new(move |args| {
        let frame = remote.frame(&args, conn.codec.as_ref());
        let task_conn = Arc::clone(&conn);
        tokio::spawn(async move {
            send_plain(&task_conn, frame.to_string()).await;
        });
    })
}

pub(crate) async fn dispatch_message(conn: &Arc<Connection>, message: Message) {
    reset_heartbeat_timer(conn);

    match message.message_type {
        MessageType::Disconnect => handle_disconnect(conn, message).await,
        MessageType::Connect => handle_connect(conn, message).await,
        MessageType::Heartbeat => send_plain(conn, "2::".to_string()).await,
        MessageType::Message => handle_message(conn, message).await,
        MessageType::JsonMessage => handle_json_message(conn, message).await,
        MessageType::Event => handle_event(conn, message).await,
        MessageType::Ack => handle_ack(conn, message).await,
        MessageType::Error => handle_error(conn, message).await,
        MessageType::Noop => {}
    }
}

async fn handle_disconnect(conn: &Arc<Connection>, message: Message) {
    let targets = targets_for_endpoint(conn, &message.endpoint);
    if targets.is_empty() {
        tracing::warn!(endpoint = %message.endpoint, "disconnect for unregistered namespace");
    }
    for target in &targets {
        target.callbacks().on_disconnect().await;
    }
    if message.data == "+0" {
        conn.cleanup().await;
    }
}

async fn handle_connect(conn: &Arc<Connection>, message: Message) {
    let first_socket = conn.core.lock().first_socket.take();

    if let Some(first) = first_socket {
        let is_default = first.namespace().is_empty();
        if first.namespace() == message.endpoint || (is_default && message.endpoint.is_empty()) {
            first.callbacks().on_connect().await;
            return;
        }
        // The first socket lives on a non-default namespace; the server's
        // implicit default-namespace ack doesn't cover it, so the client
        // must ask explicitly and wait for this reply.
        send_plain(conn, format!("1::{}", first.namespace())).await;
        conn.core
            .lock()
            .namespaces
            .insert(first.namespace().to_string(), first);
        return;
    }

    let targets = targets_for_endpoint(conn, &message.endpoint);
    if targets.is_empty() {
        tracing::warn!(endpoint = %message.endpoint, "connect ack for unregistered namespace");
    }
    for target in &targets {
        target.callbacks().on_connect().await;
    }
}

async fn handle_message(conn: &Arc<Connection>, message: Message) {
    let ack = RemoteAck::from_message(&message).map(|ra| build_ack_reply(conn, ra));
    let Some(targets) = targets_for_endpoint_or_fault(conn, &message.endpoint).await else {
        return;
    };
    for target in &targets {
        if let Err(e) = target
            .callbacks()
            .on_message(message.data.clone(), ack.clone())
            .await
        {
            conn.raise_callback_exception(e).await;
        }
    }
}

async fn handle_json_message(conn: &Arc<Connection>, message: Message) {
    let ack = RemoteAck::from_message(&message).map(|ra| build_ack_reply(conn, ra));
    let Some(targets) = targets_for_endpoint_or_fault(conn, &message.endpoint).await else {
        return;
    };
    let value = if message.data == "null" {
        Value::Null
    } else {
        match conn.codec.decode_value(&message.data) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "malformed json message payload, discarding");
                return;
            }
        }
    };
    for target in &targets {
        if let Err(e) = target
            .callbacks()
            .on_json_message(value.clone(), ack.clone())
            .await
        {
            conn.raise_callback_exception(e).await;
        }
    }
}

async fn handle_event(conn: &Arc<Connection>, message: Message) {
    let ack = RemoteAck::from_message(&message).map(|ra| build_ack_reply(conn, ra));
    let Some(targets) = targets_for_endpoint_or_fault(conn, &message.endpoint).await else {
        return;
    };

    let parsed = match conn.codec.decode_value(&message.data) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::warn!(data = %message.data, "malformed event payload, discarding");
            return;
        }
    };
    let Some(Value::String(name)) = parsed.get("name").cloned() else {
        tracing::warn!(data = %message.data, "event payload missing name, discarding");
        return;
    };
    let args = match parsed.get("args") {
        Some(Value::Array(items)) => items.clone(),
        Some(_) | None => Vec::new(),
    };

    for target in &targets {
        if let Err(e) = target
            .callbacks()
            .on_event(name.clone(), ack.clone(), args.clone())
            .await
        {
            conn.raise_callback_exception(e).await;
        }
    }
}

async fn handle_ack(conn: &Arc<Connection>, message: Message) {
    let (id_str, json_part) = split_inbound_ack(&message.data);
    let id: u32 = match id_str.parse() {
        Ok(n) => n,
        Err(_) => {
            tracing::warn!(data = %message.data, "malformed ack id, discarding");
            return;
        }
    };

    if json_part.is_empty() {
        send_plain(conn, format!("6:::{id}")).await;
        return;
    }

    let args = match conn.codec.decode_value(json_part) {
        Ok(Value::Array(items)) => items,
        Ok(other) => vec![other],
        Err(e) => {
            tracing::warn!(error = %e, "malformed ack payload, discarding");
            return;
        }
    };

    let callback = conn.core.lock().acks.take(id);
    match callback {
        Some(cb) => cb(args),
        None => tracing::warn!(id, "unknown ack id, discarding"),
    }
}

async fn handle_error(conn: &Arc<Connection>, message: Message) {
    let targets = targets_for_endpoint(conn, &message.endpoint);
    let fault = Arc::new(SocketIoError::CallbackException(message.data.clone()));
    for target in &targets {
        target.callbacks().on_error(Arc::clone(&fault)).await;
    }
    if message.data.ends_with("+0") {
        conn.cleanup().await;
    }
}
