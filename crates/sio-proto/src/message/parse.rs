use crate::error::DecodeError;

use super::types::{Message, MessageType};

impl std::str::FromStr for Message {
    type Err = DecodeError;

    /// Parse one `type:id:endpoint:data` frame.
    ///
    /// Splits on `:` at most three times — the `data` field is the
    /// remainder of the frame verbatim and may itself contain `:`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(DecodeError::EmptyFrame);
        }

        let mut parts = raw.splitn(4, ':');

        let type_field = parts.next().ok_or(DecodeError::EmptyFrame)?;
        if type_field.len() != 1 {
            return Err(DecodeError::InvalidType(type_field.to_string()));
        }
        let message_type = MessageType::from_digit(type_field.as_bytes()[0])
            .ok_or_else(|| DecodeError::InvalidType(type_field.to_string()))?;

        let id = parts.next().unwrap_or("").to_string();
        let endpoint = parts.next().unwrap_or("").to_string();
        let data = parts.next().unwrap_or("").to_string();

        Ok(Message {
            message_type,
            id,
            endpoint,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;

    #[test]
    fn parses_bare_heartbeat() {
        let msg: Message = "2::".parse().unwrap();
        assert_eq!(msg.message_type, MessageType::Heartbeat);
        assert_eq!(msg.id, "");
        assert_eq!(msg.endpoint, "");
        assert_eq!(msg.data, "");
    }

    #[test]
    fn parses_event_with_ack_request_and_namespace() {
        let msg: Message = r#"5:42+:/chat:{"name":"ping","args":[1,"x"]}"#
            .parse()
            .unwrap();
        assert_eq!(msg.message_type, MessageType::Event);
        assert_eq!(msg.id, "42+");
        assert_eq!(msg.endpoint, "/chat");
        assert_eq!(msg.data, r#"{"name":"ping","args":[1,"x"]}"#);
        assert!(msg.wants_ack());
        assert_eq!(msg.ack_id(), Some(42));
    }

    #[test]
    fn data_field_may_contain_colons() {
        let msg: Message = "3:::hello:world:time".parse().unwrap();
        assert_eq!(msg.data, "hello:world:time");
    }

    #[test]
    fn rejects_empty_frame() {
        assert_eq!("".parse::<Message>(), Err(DecodeError::EmptyFrame));
    }

    #[test]
    fn rejects_bad_type_digit() {
        assert!(matches!(
            "9:::x".parse::<Message>(),
            Err(DecodeError::InvalidType(_))
        ));
        assert!(matches!(
            "ab:::x".parse::<Message>(),
            Err(DecodeError::InvalidType(_))
        ));
    }

    #[test]
    fn disconnect_advisory_roundtrips() {
        let msg: Message = "7:::msg+0".parse().unwrap();
        assert_eq!(msg.message_type, MessageType::Error);
        assert_eq!(msg.data, "msg+0");
    }
}
