//! The cold-path handshake: one HTTP GET, run on the connect-worker task
//! before the rest of the connect sequence switches to the hot-path
//! transport loop.

use http::HeaderMap;
use url::Url;

use crate::error::SocketIoError;

/// The parsed handshake response.
#[derive(Debug, Clone)]
pub struct HandshakeInfo {
    pub session_id: String,
    pub heartbeat_timeout_ms: u64,
    pub closing_timeout_ms: u64,
    pub transports: Vec<String>,
}

/// `GET {origin}/socket.io/1/` with `headers`, honoring `timeout_ms` for
/// both connect and read. Parses line 1 of the body as
/// `sessionId:heartbeatSeconds:closeSeconds:transport1,transport2,...`.
pub async fn perform_handshake(
    origin: &Url,
    headers: &HeaderMap,
    timeout_ms: u64,
    tls_config: Option<std::sync::Arc<rustls::ClientConfig>>,
) -> Result<HandshakeInfo, SocketIoError> {
    let url = origin
        .join("socket.io/1/")
        .map_err(|e| SocketIoError::HandshakeFailed {
            origin: origin.to_string(),
            reason: format!("invalid handshake URL: {e}"),
        })?;

    let timeout = std::time::Duration::from_millis(timeout_ms);
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if matches!(origin.scheme(), "https" | "wss") {
        let tls_config = tls_config.unwrap_or_else(crate::tls::client_config);
        builder = builder.use_preconfigured_tls((*tls_config).clone());
    }
    let client = builder
        .build()
        .map_err(|e| SocketIoError::HandshakeFailed {
            origin: origin.to_string(),
            reason: format!("failed to build HTTP client: {e}"),
        })?;

    let response = client
        .get(url)
        .headers(headers.clone())
        .send()
        .await
        .map_err(|e| SocketIoError::HandshakeFailed {
            origin: origin.to_string(),
            reason: format!("request failed: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(SocketIoError::HandshakeFailed {
            origin: origin.to_string(),
            reason: format!("non-2xx status {}", response.status()),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| SocketIoError::HandshakeFailed {
            origin: origin.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

    let line = body.lines().next().unwrap_or("");
    parse_handshake_line(line).ok_or_else(|| SocketIoError::HandshakeFailed {
        origin: origin.to_string(),
        reason: format!("malformed handshake line: {line:?}"),
    })
}

fn parse_handshake_line(line: &str) -> Option<HandshakeInfo> {
    let mut parts = line.splitn(4, ':');
    let session_id = parts.next()?.to_string();
    let heartbeat_seconds: u64 = parts.next()?.parse().ok()?;
    let closing_seconds: u64 = parts.next()?.parse().ok()?;
    let transports = parts
        .next()?
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    if session_id.is_empty() {
        return None;
    }

    Some(HandshakeInfo {
        session_id,
        heartbeat_timeout_ms: heartbeat_seconds * 1_000,
        closing_timeout_ms: closing_seconds * 1_000,
        transports,
    })
}
