//! Socket.IO 0.9 frame grammar: `type:id:endpoint:data`.

mod parse;
mod serialize;
mod types;

pub use types::{Message, MessageType};
