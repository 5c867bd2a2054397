/// The eight-plus-one Socket.IO 0.9 message type codes.
///
/// Serializes to and parses from a single ASCII digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// `0` — disconnect a namespace.
    Disconnect,
    /// `1` — connect to (or acknowledge connection to) a namespace.
    Connect,
    /// `2` — heartbeat (`2::`).
    Heartbeat,
    /// `3` — plain-text message.
    Message,
    /// `4` — JSON-encoded message.
    JsonMessage,
    /// `5` — named event with positional JSON arguments.
    Event,
    /// `6` — acknowledgement of a prior message/event.
    Ack,
    /// `7` — error, optionally carrying a disconnect advisory (`+0` suffix).
    Error,
    /// `8` — no-op, used to close long-poll requests without data.
    Noop,
}

impl MessageType {
    /// The single ASCII digit this type serializes to.
    pub fn as_digit(self) -> u8 {
        match self {
            MessageType::Disconnect => b'0',
            MessageType::Connect => b'1',
            MessageType::Heartbeat => b'2',
            MessageType::Message => b'3',
            MessageType::JsonMessage => b'4',
            MessageType::Event => b'5',
            MessageType::Ack => b'6',
            MessageType::Error => b'7',
            MessageType::Noop => b'8',
        }
    }

    /// Parse a single ASCII digit into its message type, if valid.
    pub fn from_digit(c: u8) -> Option<MessageType> {
        match c {
            b'0' => Some(MessageType::Disconnect),
            b'1' => Some(MessageType::Connect),
            b'2' => Some(MessageType::Heartbeat),
            b'3' => Some(MessageType::Message),
            b'4' => Some(MessageType::JsonMessage),
            b'5' => Some(MessageType::Event),
            b'6' => Some(MessageType::Ack),
            b'7' => Some(MessageType::Error),
            b'8' => Some(MessageType::Noop),
            _ => None,
        }
    }
}

/// One decoded (or to-be-encoded) Socket.IO 0.9 frame.
///
/// `id` carries the raw id text exactly as it appears on the wire: empty when
/// absent, `"42"` when present without an ack request, `"42+"` when the
/// sender is requesting a server/client-side ack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The frame's message type.
    pub message_type: MessageType,
    /// The raw id field (empty, `"N"`, or `"N+"`).
    pub id: String,
    /// The namespace this frame targets (empty string = default namespace).
    pub endpoint: String,
    /// The remainder of the frame, unescaped and un-interpreted.
    pub data: String,
}

impl Message {
    /// Build a frame with no id and no data (e.g. the bare heartbeat `2::`).
    pub fn new(message_type: MessageType, endpoint: impl Into<String>) -> Self {
        Message {
            message_type,
            id: String::new(),
            endpoint: endpoint.into(),
            data: String::new(),
        }
    }

    /// Build a frame carrying a data payload but no id.
    pub fn with_data(
        message_type: MessageType,
        endpoint: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Message {
            message_type,
            id: String::new(),
            endpoint: endpoint.into(),
            data: data.into(),
        }
    }

    /// Whether the id field requests a server/client-sent ack (trailing `+`).
    pub fn wants_ack(&self) -> bool {
        self.id.ends_with('+')
    }

    /// The numeric portion of the id field, if any was present.
    pub fn ack_id(&self) -> Option<u32> {
        let digits = self.id.trim_end_matches('+');
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    }
}
