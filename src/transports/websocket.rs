//! WebSocket transport.
//!
//! Grounded on the andupetcu-androidremote agent's connection loop
//! (`other_examples/27b9b266_...-connection.rs`): a reader task and an
//! outbound `mpsc` channel feeding a writer task, joined at `connect()` and
//! torn down together on either side closing. WebSocket frames already
//! preserve message boundaries, so each outbound frame is sent as its own
//! text message and `can_send_bulk` stays at the trait's default `false`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use url::Url;

use sio_proto::{ConnectionUpcalls, DecodeError, Transport};

use crate::connection::ConnectionHandle;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct WebSocketTransport {
    url: Url,
    upcalls: ConnectionHandle,
    tls_config: Option<std::sync::Arc<rustls::ClientConfig>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    invalidated: AtomicBool,
}

impl WebSocketTransport {
    pub fn new(
        origin: Url,
        upcalls: ConnectionHandle,
        tls_config: Option<std::sync::Arc<rustls::ClientConfig>>,
    ) -> Self {
        Self {
            url: websocket_url(&origin),
            upcalls,
            tls_config,
            outbound: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            invalidated: AtomicBool::new(false),
        }
    }
}

/// `http(s)://host/path` -> `ws(s)://host/path/socket.io/1/websocket`.
fn websocket_url(origin: &Url) -> Url {
    let mut url = origin.clone();
    let _ = url.set_scheme(if origin.scheme() == "https" { "wss" } else { "ws" });
    let mut url = url
        .join("socket.io/1/websocket")
        .unwrap_or(url);
    url.set_query(None);
    url
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<(), DecodeError> {
        let connector = if self.url.scheme() == "wss" {
            let config = self
                .tls_config
                .clone()
                .unwrap_or_else(crate::tls::client_config);
            Some(Connector::Rustls(config))
        } else {
            None
        };

        let (stream, _response) =
            tokio_tungstenite::connect_async_tls_with_config(self.url.as_str(), None, false, connector)
                .await
                .map_err(|e| transport_decode_error(&e))?;

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        *self.outbound.lock() = Some(tx);

        let (sink, source) = stream.split();
        let reader = tokio::spawn(run_reader(source, self.upcalls.clone()));
        let writer = tokio::spawn(run_writer(sink, rx));
        *self.tasks.lock() = vec![reader, writer];

        self.upcalls.transport_connected().await;
        Ok(())
    }

    async fn disconnect(&self) {
        self.outbound.lock().take();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
        self.outbound.lock().take();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    async fn send(&self, payload: &str) -> Result<(), DecodeError> {
        if self.invalidated.load(Ordering::SeqCst) {
            return Err(DecodeError::TransportFailure("websocket invalidated".into()));
        }
        let sender = self.outbound.lock().clone();
        match sender {
            Some(sender) => sender
                .send(payload.to_string())
                .map_err(|_| DecodeError::TransportFailure("websocket writer task is gone".into())),
            None => Err(DecodeError::TransportFailure("websocket is not connected".into())),
        }
    }
}

async fn run_reader(
    mut source: futures_util::stream::SplitStream<WsStream>,
    upcalls: ConnectionHandle,
) {
    while let Some(frame) = source.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => upcalls.transport_data(&text).await,
            Ok(WsMessage::Binary(bytes)) => {
                if let Ok(text) = String::from_utf8(bytes) {
                    upcalls.transport_data(&text).await;
                }
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "websocket read error");
                upcalls
                    .transport_error(DecodeError::TransportFailure(e.to_string()))
                    .await;
                return;
            }
        }
    }
    upcalls.transport_disconnected().await;
}

async fn run_writer(
    mut sink: futures_util::stream::SplitSink<WsStream, WsMessage>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(payload) = rx.recv().await {
        if sink.send(WsMessage::Text(payload.into())).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}

fn transport_decode_error(e: &tokio_tungstenite::tungstenite::Error) -> DecodeError {
    tracing::warn!(error = %e, "websocket connect failed");
    DecodeError::TransportFailure(e.to_string())
}
