//! A thin binary exercising the public API end to end: connect to a
//! Socket.IO 0.9 server's default namespace, print lifecycle events, and
//! echo back any event it receives.
//!
//! Resolves arguments, initializes tracing, runs, and surfaces failures
//! through `anyhow::Result`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sio_client::{ClientConfig, ConnectionState, SioSocket, SocketCallbacks, SocketIoError};
use tracing::info;

struct EchoHandler;

#[async_trait]
impl SocketCallbacks for EchoHandler {
    async fn on_connect(&self) {
        info!("connected");
    }

    async fn on_disconnect(&self) {
        info!("disconnected");
    }

    async fn on_state(&self, state: ConnectionState) {
        info!(?state, "connection state changed");
    }

    async fn on_error(&self, error: Arc<SocketIoError>) {
        tracing::error!(error = %error, code = error.error_code(), "connection fault");
    }

    async fn on_event(
        &self,
        name: String,
        ack: Option<sio_client::AckReply>,
        args: Vec<Value>,
    ) -> Result<(), SocketIoError> {
        info!(name = %name, ?args, "event received");
        if let Some(ack) = ack {
            ack.send(args);
        }
        Ok(())
    }
}

fn origin_from_args() -> anyhow::Result<url::Url> {
    let raw = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:3000".to_string());
    url::Url::parse(&raw).map_err(|e| anyhow::anyhow!("invalid origin {raw:?}: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let origin = origin_from_args()?;
    info!(%origin, "connecting");

    let handler = Arc::new(EchoHandler);
    let socket = SioSocket::connect(origin, "", ClientConfig::default(), handler).await;

    socket.emit("hello", vec![serde_json::json!("world")]).await;

    tokio::signal::ctrl_c().await?;
    socket.disconnect().await;
    Ok(())
}
