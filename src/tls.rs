//! Process-wide TLS configuration slot.
//!
//! Read-only once set, consumed by both the handshake's HTTPS request and
//! the WebSocket transport's `wss://` upgrade. Falls back to
//! `rustls-native-certs`-sourced roots when nothing has been set explicitly.

use std::sync::{Arc, OnceLock};

use rustls::{ClientConfig, RootCertStore};

static CLIENT_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// Install a TLS client configuration for the process. Has no effect if
/// called after the slot has already been read or set.
pub fn set_client_config(config: Arc<ClientConfig>) {
    let _ = CLIENT_CONFIG.set(config);
}

/// The process-wide TLS client configuration, initializing it from the
/// platform's native root certificate store on first access if nothing was
/// set via [`set_client_config`].
pub fn client_config() -> Arc<ClientConfig> {
    CLIENT_CONFIG
        .get_or_init(|| Arc::new(native_roots_config()))
        .clone()
}

fn native_roots_config() -> ClientConfig {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            tracing::warn!("failed to add native root cert: {}", e);
        }
    }
    for e in &certs.errors {
        tracing::warn!("error loading native certs: {}", e);
    }

    ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}
