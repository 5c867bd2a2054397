//! The two concrete transports this client ships: WebSocket and XHR
//! long-poll. Both implement `sio_proto::Transport` and drive the
//! connection purely through the upcall handle — neither holds an
//! owning reference back to the `Connection`.

pub mod websocket;
pub mod xhr;
