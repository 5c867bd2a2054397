//! XHR long-poll transport.
//!
//! Long-poll cannot preserve message boundaries across a single
//! request/response pair carrying more than one frame, so this is the
//! transport that actually exercises the framed-datagram wrapper
//! (`sio_proto::framed`) via `send_bulk`/`can_send_bulk`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use url::Url;

use sio_proto::{ConnectionUpcalls, DecodeError, Transport};

use crate::connection::ConnectionHandle;

pub struct XhrTransport {
    origin: Url,
    upcalls: ConnectionHandle,
    headers: Arc<RwLock<HeaderMap>>,
    client: reqwest::Client,
    task: Mutex<Option<JoinHandle<()>>>,
    invalidated: AtomicBool,
}

impl XhrTransport {
    pub fn new(
        origin: Url,
        upcalls: ConnectionHandle,
        headers: Arc<RwLock<HeaderMap>>,
        tls_config: Option<Arc<rustls::ClientConfig>>,
    ) -> Self {
        let mut builder = reqwest::Client::builder();
        if matches!(origin.scheme(), "https" | "wss") {
            let tls_config = tls_config.unwrap_or_else(crate::tls::client_config);
            builder = builder.use_preconfigured_tls((*tls_config).clone());
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            origin,
            upcalls,
            headers,
            client,
            task: Mutex::new(None),
            invalidated: AtomicBool::new(false),
        }
    }

    /// `{origin}/socket.io/1/xhr-polling/{sessionId}`, reading the session
    /// id the handshake injected into the shared headers.
    async fn polling_url(&self) -> Result<Url, DecodeError> {
        let sid = {
            let headers = self.headers.read().await;
            headers
                .get("sessionId")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        let sid = sid.ok_or_else(|| {
            DecodeError::TransportFailure("no session id; handshake has not completed".into())
        })?;

        self.origin
            .join(&format!("socket.io/1/xhr-polling/{sid}"))
            .map_err(|e| DecodeError::TransportFailure(e.to_string()))
    }
}

#[async_trait]
impl Transport for XhrTransport {
    async fn connect(&self) -> Result<(), DecodeError> {
        // Confirm the session id is already available before committing to
        // the polling loop; the loop itself re-resolves the URL every
        // iteration in case headers change underneath it.
        self.polling_url().await?;

        self.upcalls.transport_connected().await;

        let upcalls = self.upcalls.clone();
        let client = self.client.clone();
        let headers = self.headers.clone();
        let origin = self.origin.clone();
        let task = tokio::spawn(poll_loop(origin, client, headers, upcalls));
        *self.task.lock() = Some(task);
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    async fn send(&self, payload: &str) -> Result<(), DecodeError> {
        if self.invalidated.load(Ordering::SeqCst) {
            return Err(DecodeError::TransportFailure("xhr transport invalidated".into()));
        }
        let url = self.polling_url().await?;
        let headers = self.headers.read().await.clone();
        self.client
            .post(url)
            .headers(headers)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| DecodeError::TransportFailure(e.to_string()))?;
        Ok(())
    }

    async fn send_bulk(&self, payloads: &[String]) -> Result<(), DecodeError> {
        if payloads.is_empty() {
            return Ok(());
        }
        if self.invalidated.load(Ordering::SeqCst) {
            return Err(DecodeError::TransportFailure("xhr transport invalidated".into()));
        }
        let body = sio_proto::framed::wrap(payloads.iter().map(String::as_str));
        let url = self.polling_url().await?;
        let headers = self.headers.read().await.clone();
        self.client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| DecodeError::TransportFailure(e.to_string()))?;
        Ok(())
    }

    fn can_send_bulk(&self) -> bool {
        true
    }
}

/// The long-poll read loop: one outstanding `GET` at a time, each response
/// body handed to `transport_data` (which unwraps the framed envelope if
/// present). A request/status/body failure reports `transport_error` and
/// ends the loop; losing the session id from the shared headers (set to
/// `None` during teardown) or failing to build the poll URL ends it
/// cleanly via `transport_disconnected` instead. Either way the caller
/// (`Connection`) is responsible for deciding whether to reconnect.
async fn poll_loop(
    origin: Url,
    client: reqwest::Client,
    headers: Arc<RwLock<HeaderMap>>,
    upcalls: ConnectionHandle,
) {
    loop {
        let sid = {
            let headers = headers.read().await;
            headers
                .get("sessionId")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        let Some(sid) = sid else {
            break;
        };
        let Ok(url) = origin.join(&format!("socket.io/1/xhr-polling/{sid}")) else {
            break;
        };

        let request_headers = headers.read().await.clone();
        let response = match client.get(url).headers(request_headers).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "xhr long-poll request failed");
                upcalls
                    .transport_error(DecodeError::TransportFailure(e.to_string()))
                    .await;
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%status, "xhr long-poll non-2xx response");
            upcalls
                .transport_error(DecodeError::TransportFailure(format!(
                    "non-2xx status {status}"
                )))
                .await;
            return;
        }

        match response.text().await {
            Ok(body) if body.is_empty() => continue,
            Ok(body) => upcalls.transport_data(&body).await,
            Err(e) => {
                tracing::warn!(error = %e, "xhr long-poll failed to read body");
                upcalls
                    .transport_error(DecodeError::TransportFailure(e.to_string()))
                    .await;
                return;
            }
        }
    }
    upcalls.transport_disconnected().await;
}
