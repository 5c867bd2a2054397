//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse, matching how the
//! rest of this crate's `#[serde(default = "...")]` fields are sourced.

/// Handshake connect/read timeout in milliseconds.
pub fn default_handshake_timeout_ms() -> u64 {
    10_000
}

/// Delay before a scheduled reconnect attempt fires.
pub fn default_reconnect_delay_ms() -> u64 {
    1_000
}
