//! Unified error handling for `sio-client`.
//!
//! Mirrors the layered-enum-plus-`error_code()` idiom of an IRC daemon's
//! handler errors, scaled to a client's fault surface: handshake, transport,
//! decode and callback failures.

use sio_proto::DecodeError;
use thiserror::Error;

/// The library's public fault type.
///
/// Every variant is delivered to each registered namespace's `on_error` and
/// is followed by cleanup — the connection becomes permanently `Invalid`.
#[derive(Debug, Error)]
pub enum SocketIoError {
    #[error("handshake with {origin} failed: {reason}")]
    HandshakeFailed { origin: String, reason: String },

    #[error("server at {origin} supports no transport this client implements")]
    NoCommonTransport { origin: String },

    #[error("transport I/O error: {0}")]
    TransportIo(#[source] std::io::Error),

    #[error("malformed frame from server: {0}")]
    MalformedFrame(#[from] DecodeError),

    #[error("namespace callback raised: {0}")]
    CallbackException(String),

    #[error("no heartbeat within lifetime ({within_ms}ms of silence)")]
    HeartbeatTimeout { within_ms: u64 },

    #[error("message for endpoint {endpoint:?} has no registered namespace socket")]
    UnregisteredNamespace { endpoint: String },
}

impl SocketIoError {
    /// A static code string suitable for metrics labeling or log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::HandshakeFailed { .. } => "handshake_failed",
            Self::NoCommonTransport { .. } => "no_common_transport",
            Self::TransportIo(_) => "transport_io",
            Self::MalformedFrame(_) => "malformed_frame",
            Self::CallbackException(_) => "callback_exception",
            Self::HeartbeatTimeout { .. } => "heartbeat_timeout",
            Self::UnregisteredNamespace { .. } => "unregistered_namespace",
        }
    }
}

/// Failures loading an optional [`crate::config::ClientConfigFile`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
