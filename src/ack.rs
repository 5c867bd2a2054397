//! Acknowledgement bookkeeping: client-issued ack callbacks and the handles
//! constructed for inbound messages that request a reply.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use sio_proto::{Message, MessageType};

use crate::json::JsonCodec;

/// A locally stored callback invoked when the server's `Ack` frame for the
/// id it's keyed under arrives.
pub type AckCallback = Box<dyn FnOnce(Vec<Value>) + Send>;

/// The connection's table of outstanding client-issued ack requests.
///
/// Ids are monotonically increasing within a connection's lifetime,
/// starting at 1.
#[derive(Default)]
pub struct AckTable {
    next_id: u32,
    callbacks: HashMap<u32, AckCallback>,
}

impl AckTable {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            callbacks: HashMap::new(),
        }
    }

    /// Allocate the next id and store `callback` under it; returns the id to
    /// embed (as `"{id}+"`) in the outgoing message.
    pub fn allocate(&mut self, callback: AckCallback) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.insert(id, callback);
        id
    }

    /// Take and return the callback registered for `id`, if any.
    pub fn take(&mut self, id: u32) -> Option<AckCallback> {
        self.callbacks.remove(&id)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// A handle for replying to an inbound message/event that requested an ack.
///
/// Wraps whatever the connection needs to emit the reply frame (the
/// [`RemoteAck`] plus a send sink) behind a single `FnOnce`, so `socket.rs`
/// can hand it to user callbacks without depending on connection internals.
///
/// Cloneable so the same handle can be handed to every namespace callback
/// when an inbound message's endpoint is empty (the aggregating fan-out);
/// only the first clone to call [`send`](AckReply::send) actually fires
/// the closure, the rest are no-ops.
#[derive(Clone)]
pub struct AckReply(Arc<Mutex<Option<Box<dyn FnOnce(Vec<Value>) + Send>>>>);

impl AckReply {
    pub fn new(f: impl FnOnce(Vec<Value>) + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Some(Box::new(f)))))
    }

    /// Send the reply with the given positional args.
    pub fn send(&self, args: Vec<Value>) {
        if let Some(f) = self.0.lock().take() {
            f(args);
        }
    }
}

impl std::fmt::Debug for AckReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AckReply(..)")
    }
}

/// Split an inbound `Ack` frame's `data` field on its first `+` into
/// `(id, json_array)`. `json_array` is empty when the server sent a bare id
/// with no payload half.
pub fn split_inbound_ack(data: &str) -> (&str, &str) {
    match data.split_once('+') {
        Some((id, rest)) => (id, rest),
        None => (data, ""),
    }
}

/// A reply handle constructed for an inbound message carrying a non-empty
/// id. Invoking it emits an `Ack` frame back to the server.
pub struct RemoteAck {
    endpoint: String,
    id: String,
}

impl RemoteAck {
    /// Build a handle from the inbound message's endpoint and id,
    /// normalizing the id to end with `+` if the server omitted it.
    pub fn from_message(message: &Message) -> Option<Self> {
        if message.id.is_empty() {
            return None;
        }
        let id = if message.id.ends_with('+') {
            message.id.clone()
        } else {
            format!("{}+", message.id)
        };
        Some(Self {
            endpoint: message.endpoint.clone(),
            id,
        })
    }

    /// Build the `6::<endpoint>:<id>+<jsonArgs>` frame for the given
    /// positional args. The ack id lives in the frame's `data` field
    /// (`"<id>+<jsonArgs>"`), not its envelope id — the envelope id is
    /// always empty for `Ack` frames.
    pub fn frame(&self, args: &[Value], codec: &dyn JsonCodec) -> Message {
        let args_json = codec.encode_value(&Value::Array(args.to_vec()));
        Message {
            message_type: MessageType::Ack,
            id: String::new(),
            endpoint: self.endpoint.clone(),
            data: format!("{}{}", self.id, args_json),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::SerdeJsonCodec;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut table = AckTable::new();
        let a = table.allocate(Box::new(|_| {}));
        let b = table.allocate(Box::new(|_| {}));
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn take_fires_the_stored_callback_once() {
        let mut table = AckTable::new();
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        let id = table.allocate(Box::new(move |args| {
            assert_eq!(args, vec![json!(42)]);
            fired2.store(true, Ordering::SeqCst);
        }));

        let callback = table.take(id).unwrap();
        callback(vec![json!(42)]);
        assert!(fired.load(Ordering::SeqCst));
        assert!(table.is_empty());
    }

    #[test]
    fn unknown_id_take_returns_none() {
        let mut table = AckTable::new();
        assert!(table.take(99).is_none());
    }

    #[test]
    fn remote_ack_normalizes_missing_plus() {
        let msg = Message {
            message_type: MessageType::Event,
            id: "42".to_string(),
            endpoint: "/chat".to_string(),
            data: String::new(),
        };
        let ack = RemoteAck::from_message(&msg).unwrap();
        let frame = ack.frame(&[json!(true)], &SerdeJsonCodec);
        assert_eq!(frame.to_string(), "6::/chat:42+[true]");
    }

    #[test]
    fn absent_id_yields_no_ack_handle() {
        let msg = Message::new(MessageType::Event, "/chat");
        assert!(RemoteAck::from_message(&msg).is_none());
    }

    #[test]
    fn splits_inbound_ack_data_on_first_plus() {
        assert_eq!(split_inbound_ack("1+[42]"), ("1", "[42]"));
        assert_eq!(split_inbound_ack("1"), ("1", ""));
    }
}
