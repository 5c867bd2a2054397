//! Decode errors for the frame grammar and the framed-datagram wrapper.

use thiserror::Error;

/// Errors raised while decoding a frame or a framed-wrapper envelope.
///
/// These are always fatal to the connection that received them: a malformed
/// frame means the client and server have desynchronized, and there is no
/// well-defined way to resynchronize mid-stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame was empty (no `type` field at all).
    #[error("empty frame")]
    EmptyFrame,

    /// The leading `type` field was not a single ASCII digit 0-8.
    #[error("invalid message type digit: {0:?}")]
    InvalidType(String),

    /// The wrapper's declared payload length didn't match the characters
    /// actually present before the next `U+FFFD` (or end of input).
    #[error("framed-wrapper length mismatch: declared {declared}, found {found}")]
    LengthMismatch {
        /// The length the wrapper claimed.
        declared: usize,
        /// The length actually available.
        found: usize,
    },

    /// The wrapper's length field wasn't a valid decimal integer.
    #[error("framed-wrapper length field is not a valid integer: {0:?}")]
    InvalidLength(String),

    /// The wrapper was truncated (missing a closing sentinel or payload).
    #[error("truncated framed-wrapper envelope")]
    TruncatedWrapper,

    /// A concrete `Transport` implementation's carrier failed (socket
    /// connect, TLS handshake, HTTP request, ...). Not a frame-grammar
    /// fault, but `Transport::connect`/`send` share this error type so a
    /// connection can treat any transport failure uniformly.
    #[error("transport failure: {0}")]
    TransportFailure(String),
}
