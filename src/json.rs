//! Pluggable JSON interpretation for `JsonMessage`, `Event` and `Ack`
//! payloads.
//!
//! The wire codec (`sio_proto::Message`) never interprets `data` as JSON —
//! it's an opaque string there. This module is the seam a host application
//! can swap to use a different JSON backend; the crate ships
//! [`SerdeJsonCodec`] as the default.

use serde_json::Value;

/// Encodes/decodes the JSON payloads carried inside Socket.IO frames.
pub trait JsonCodec: Send + Sync {
    /// Serialize a value to its string form for embedding in a frame.
    fn encode_value(&self, value: &Value) -> String;

    /// Parse a frame's data field as JSON.
    fn decode_value(&self, data: &str) -> Result<Value, serde_json::Error>;
}

/// Default [`JsonCodec`] backed by `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn encode_value(&self, value: &Value) -> String {
        value.to_string()
    }

    fn decode_value(&self, data: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_a_value() {
        let codec = SerdeJsonCodec;
        let value = json!({"name": "ping", "args": [1, "x"]});
        let encoded = codec.encode_value(&value);
        let decoded = codec.decode_value(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn literal_null_decodes_to_null_value() {
        let codec = SerdeJsonCodec;
        assert_eq!(codec.decode_value("null").unwrap(), Value::Null);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let codec = SerdeJsonCodec;
        assert!(codec.decode_value("{not json").is_err());
    }
}
