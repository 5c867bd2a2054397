//! Integration tests for the connection lifecycle: handshake, session id
//! assignment, inbound dispatch and teardown, driven over a real loopback
//! TCP socket against `common::FakeServer`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{wait_until, FakeServer};
use parking_lot::Mutex;
use sio_client::{
    AckReply, ClientConfig, ConnectionRegistry, ConnectionState, SerdeJsonCodec, SioSocket,
    SocketCallbacks, SocketIoError,
};

#[derive(Default)]
struct Recorder {
    connected: Mutex<bool>,
    messages: Mutex<Vec<String>>,
    states: Mutex<Vec<ConnectionState>>,
}

#[async_trait]
impl SocketCallbacks for Recorder {
    async fn on_connect(&self) {
        *self.connected.lock() = true;
    }

    async fn on_message(&self, text: String, _ack: Option<AckReply>) -> Result<(), SocketIoError> {
        self.messages.lock().push(text);
        Ok(())
    }

    async fn on_state(&self, state: ConnectionState) {
        self.states.lock().push(state);
    }
}

#[tokio::test]
async fn handshake_connects_and_assigns_a_session_id() {
    let server = FakeServer::spawn("sess-1:60:60:xhr-polling").await;
    // Real 0.9 servers send the default namespace's connect ack as soon as
    // the transport opens; queue it before the client starts polling.
    server.push_frame("1::");

    let registry = ConnectionRegistry::new();
    let recorder = Arc::new(Recorder::default());

    let socket = SioSocket::connect_with(
        &registry,
        server.origin(),
        "",
        ClientConfig::default(),
        Arc::new(SerdeJsonCodec),
        recorder.clone(),
    )
    .await;

    wait_until(Duration::from_secs(5), || socket.state() == ConnectionState::Ready).await;
    wait_until(Duration::from_secs(5), || *recorder.connected.lock()).await;

    assert_eq!(socket.session_id().as_deref(), Some("sess-1"));
    assert!(recorder.states.lock().contains(&ConnectionState::Ready));
}

#[tokio::test]
async fn an_inbound_message_reaches_the_namespace_callback() {
    let server = FakeServer::spawn("sess-2:60:60:xhr-polling").await;
    server.push_frame("1::");

    let registry = ConnectionRegistry::new();
    let recorder = Arc::new(Recorder::default());

    let socket = SioSocket::connect_with(
        &registry,
        server.origin(),
        "",
        ClientConfig::default(),
        Arc::new(SerdeJsonCodec),
        recorder.clone(),
    )
    .await;
    wait_until(Duration::from_secs(5), || socket.state() == ConnectionState::Ready).await;

    server.push_frame("3:::hello from server");
    wait_until(Duration::from_secs(5), || !recorder.messages.lock().is_empty()).await;

    assert_eq!(
        recorder.messages.lock().clone(),
        vec!["hello from server".to_string()]
    );
}

#[tokio::test]
async fn disconnect_tears_down_the_last_namespace_and_invalidates() {
    let server = FakeServer::spawn("sess-3:60:60:xhr-polling").await;
    server.push_frame("1::");

    let registry = ConnectionRegistry::new();
    let recorder = Arc::new(Recorder::default());

    let socket = SioSocket::connect_with(
        &registry,
        server.origin(),
        "",
        ClientConfig::default(),
        Arc::new(SerdeJsonCodec),
        recorder.clone(),
    )
    .await;
    wait_until(Duration::from_secs(5), || socket.state() == ConnectionState::Ready).await;

    socket.disconnect().await;
    wait_until(Duration::from_secs(5), || socket.state() == ConnectionState::Invalid).await;

    // A second disconnect on an already-torn-down socket must not panic or hang.
    socket.disconnect().await;
}
