//! # sio-proto
//!
//! Wire format, framing and transport contract for the Socket.IO 0.9 client
//! protocol.
//!
//! ## Features
//!
//! - [`Message`]/[`MessageType`]: the `type:id:endpoint:data` frame grammar
//! - [`framed`]: the `U+FFFD`-delimited wrapper used by transports that can't
//!   preserve message boundaries (long-poll)
//! - [`transport`]: the `Transport`/`ConnectionUpcalls` trait contract the
//!   core connection state machine drives concrete transports through
//!
//! This crate performs no JSON interpretation of its own — `JsonMessage`,
//! `Event` and `Ack` payloads are carried as opaque strings. Higher-level
//! interpretation of those payloads lives in the `sio-client` crate, which
//! depends on this one the way a daemon depends on its protocol library.

pub mod error;
pub mod framed;
pub mod message;
#[cfg(feature = "tokio")]
pub mod transport;

pub use error::DecodeError;
pub use message::{Message, MessageType};
#[cfg(feature = "tokio")]
pub use transport::{ConnectionUpcalls, Transport};
