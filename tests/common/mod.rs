//! Integration test infrastructure: a minimal Socket.IO 0.9 handshake +
//! XHR long-poll server, good enough to drive the client through a real
//! handshake and frame exchange over a loopback TCP socket.
//!
//! Advertises only `xhr-polling` (never `websocket`) so the test server
//! doesn't need to speak the WebSocket upgrade handshake.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use url::Url;

pub struct FakeServer {
    addr: std::net::SocketAddr,
    received: Arc<SyncMutex<Vec<String>>>,
    outbound_tx: mpsc::UnboundedSender<String>,
    _accept_task: JoinHandle<()>,
}

impl FakeServer {
    /// Spawn a server on a random loopback port whose handshake response is
    /// `handshake_line` (e.g. `"sid1:60:60:xhr-polling"`).
    pub async fn spawn(handshake_line: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let received = Arc::new(SyncMutex::new(Vec::new()));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let outbound_rx = Arc::new(AsyncMutex::new(outbound_rx));
        let handshake_line = handshake_line.into();

        let accept_received = received.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                tokio::spawn(handle_connection(
                    stream,
                    handshake_line.clone(),
                    accept_received.clone(),
                    outbound_rx.clone(),
                ));
            }
        });

        Self {
            addr,
            received,
            outbound_tx,
            _accept_task: accept_task,
        }
    }

    pub fn origin(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("valid origin")
    }

    /// Queue a frame to be returned on the next idle long-poll GET.
    pub fn push_frame(&self, frame: impl Into<String>) {
        let _ = self.outbound_tx.send(frame.into());
    }

    /// Every request body the server has received so far (event/ack/connect
    /// frames the client POSTed). Synchronous so it composes with
    /// [`wait_until`]'s plain `FnMut() -> bool` predicate.
    pub fn received_bodies_sync(&self) -> Vec<String> {
        self.received.lock().clone()
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    handshake_line: String,
    received: Arc<SyncMutex<Vec<String>>>,
    outbound_rx: Arc<AsyncMutex<mpsc::UnboundedReceiver<String>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 2048];

    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
    };

    let header_text = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut request_line = header_text.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("GET").to_string();
    let path = request_line.next().unwrap_or("/").to_string();

    let content_length: usize = header_text
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim().eq_ignore_ascii_case("content-length").then(|| value.trim().to_string())
        })
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        body.extend_from_slice(&chunk[..n]);
    }
    let body_text = String::from_utf8_lossy(&body).into_owned();

    // `/socket.io/1/` (trailing slash, no session id yet) is the handshake;
    // `/socket.io/1/xhr-polling/<sid>` is the long-poll endpoint.
    if path == "/socket.io/1/" && method == "GET" {
        write_ok(&mut stream, &handshake_line).await;
        return;
    }

    if path.contains("/xhr-polling/") {
        match method.as_str() {
            "POST" => {
                received.lock().push(body_text);
                write_ok(&mut stream, "").await;
            }
            "GET" => {
                let mut rx = outbound_rx.lock().await;
                match tokio::time::timeout(Duration::from_millis(150), rx.recv()).await {
                    Ok(Some(frame)) => write_ok(&mut stream, &frame).await,
                    _ => write_ok(&mut stream, "").await,
                }
            }
            _ => write_status(&mut stream, 405).await,
        }
        return;
    }

    write_status(&mut stream, 404).await;
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn write_ok(stream: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
}

async fn write_status(stream: &mut TcpStream, code: u16) {
    let response = format!("HTTP/1.1 {code} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    let _ = stream.write_all(response.as_bytes()).await;
}

/// Poll `predicate` until it's true or `timeout` elapses; panics on timeout.
pub async fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !predicate() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
