//! Configuration type definitions.

use std::sync::Arc;

use http::HeaderMap;
use serde::Deserialize;

use super::defaults::{default_handshake_timeout_ms, default_reconnect_delay_ms};

/// Runtime configuration for a connection.
///
/// Constructed directly by a host application, or sourced from an optional
/// [`ClientConfigFile`] via [`ClientConfigFile::into_config`]. Not itself
/// `Deserialize` — the TLS override has no TOML representation — so the
/// file form is a distinct, smaller struct that feeds into this one.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connect/read timeout for the handshake request.
    pub handshake_timeout_ms: u64,
    /// Delay before a scheduled reconnect attempt fires.
    pub reconnect_delay_ms: u64,
    /// Headers attached to every handshake and transport request.
    pub default_headers: HeaderMap,
    /// TLS client configuration override; falls back to the process-wide
    /// slot in [`crate::tls`] when absent.
    pub tls_config: Option<Arc<rustls::ClientConfig>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: default_handshake_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            default_headers: HeaderMap::new(),
            tls_config: None,
        }
    }
}

/// TOML-deserializable subset of [`ClientConfig`] a host application can
/// load from disk instead of constructing in code.
///
/// Headers and the TLS override have no TOML representation here; a host
/// that needs them attaches them after loading.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfigFile {
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for ClientConfigFile {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: default_handshake_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl ClientConfigFile {
    /// Merge the file's values into a fresh [`ClientConfig`], leaving
    /// headers and TLS override at their defaults.
    pub fn into_config(self) -> ClientConfig {
        ClientConfig {
            handshake_timeout_ms: self.handshake_timeout_ms,
            reconnect_delay_ms: self.reconnect_delay_ms,
            ..ClientConfig::default()
        }
    }
}
