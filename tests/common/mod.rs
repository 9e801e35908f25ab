//! In-process mock of the dashboard backend.
//!
//! Serves the prepare-session route, the data and order WebSocket routes,
//! and an enveloped `/api/orders` list on an ephemeral port. Every accepted
//! socket is handed to the test as a [`MockSocket`] so the test can see the
//! control messages the client sent and push frames back.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// How the prepare-session route answers.
#[derive(Debug, Clone, Copy)]
pub enum PrepareMode {
    /// `200 {"status":"success"}`
    Ok,
    /// `503 {"detail":"upstream login required"}`
    HttpError,
    /// `200 {"status":"error","message":"no broker session"}`
    EnvelopeError,
}

/// Command sent to a server-side socket.
#[derive(Debug)]
pub enum Cmd {
    Send(String),
    SendBinary(Vec<u8>),
    Close,
    /// Drop the connection without a close frame.
    Drop,
}

/// Test-side handle to one accepted WebSocket.
pub struct MockSocket {
    cmd: mpsc::UnboundedSender<Cmd>,
    received: mpsc::UnboundedReceiver<String>,
}

impl MockSocket {
    /// Push a text frame to the client.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.cmd.send(Cmd::Send(frame.into()));
    }

    /// Push a binary frame to the client.
    pub fn push_binary(&self, frame: impl Into<Vec<u8>>) {
        let _ = self.cmd.send(Cmd::SendBinary(frame.into()));
    }

    /// Push `{ "type": tag, "data": data }`.
    pub fn push_event(&self, tag: &str, data: Value) {
        self.push(json!({ "type": tag, "data": data }).to_string());
    }

    /// Close the socket from the server side.
    pub fn close(&self) {
        let _ = self.cmd.send(Cmd::Close);
    }

    /// Tear the connection down with no closing handshake.
    pub fn drop_connection(&self) {
        let _ = self.cmd.send(Cmd::Drop);
    }

    /// Next text frame the client sent, parsed as JSON. `None` once the
    /// socket is gone.
    pub async fn next_json(&mut self) -> Option<Value> {
        let raw = within(self.received.recv()).await?;
        Some(serde_json::from_str(&raw).expect("client sent invalid JSON"))
    }
}

#[derive(Clone)]
struct Backend {
    mode: PrepareMode,
    sockets: mpsc::UnboundedSender<MockSocket>,
    prepare_calls: Arc<AtomicUsize>,
    orders: Arc<std::sync::Mutex<Value>>,
}

/// A running mock backend.
pub struct MockBackend {
    pub base_url: String,
    sockets: mpsc::UnboundedReceiver<MockSocket>,
    prepare_calls: Arc<AtomicUsize>,
    orders: Arc<std::sync::Mutex<Value>>,
}

impl MockBackend {
    pub async fn start(mode: PrepareMode) -> Self {
        init_tracing();

        let (sockets_tx, sockets) = mpsc::unbounded_channel();
        let prepare_calls = Arc::new(AtomicUsize::new(0));
        let orders = Arc::new(std::sync::Mutex::new(json!([])));
        let backend = Backend {
            mode,
            sockets: sockets_tx,
            prepare_calls: prepare_calls.clone(),
            orders: orders.clone(),
        };

        let app = Router::new()
            .route("/api/websocket/connect", post(prepare))
            .route("/api/orders", get(list_orders))
            .route("/ws/data", get(upgrade))
            .route("/ws/orders", get(upgrade))
            .with_state(backend);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            sockets,
            prepare_calls,
            orders,
        }
    }

    /// `ws://` form of the base URL.
    pub fn ws_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.replacen("http://", "ws://", 1))
    }

    /// Wait for the next socket the client opens.
    pub async fn accept(&mut self) -> MockSocket {
        within(self.sockets.recv())
            .await
            .expect("client never opened a socket")
    }

    pub fn prepare_calls(&self) -> usize {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    /// Replace the `data` served by `GET /api/orders`.
    pub fn set_orders(&self, orders: Value) {
        *self.orders.lock().unwrap() = orders;
    }
}

async fn prepare(State(b): State<Backend>) -> Response {
    b.prepare_calls.fetch_add(1, Ordering::SeqCst);
    match b.mode {
        PrepareMode::Ok => Json(json!({"status": "success", "data": {"session": "s-1"}})).into_response(),
        PrepareMode::HttpError => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"detail": "upstream login required"})),
        )
            .into_response(),
        PrepareMode::EnvelopeError => {
            Json(json!({"status": "error", "message": "no broker session"})).into_response()
        }
    }
}

async fn list_orders(State(b): State<Backend>) -> Json<Value> {
    let orders = b.orders.lock().unwrap().clone();
    Json(json!({"status": "success", "data": orders}))
}

async fn upgrade(ws: WebSocketUpgrade, State(b): State<Backend>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, b))
}

async fn serve_socket(socket: WebSocket, b: Backend) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
    let (recv_tx, recv_rx) = mpsc::unbounded_channel();
    let _ = b.sockets.send(MockSocket {
        cmd: cmd_tx,
        received: recv_rx,
    });

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Cmd::Send(text)) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Cmd::SendBinary(data)) => {
                    if sink.send(Message::Binary(data.into())).await.is_err() {
                        break;
                    }
                }
                Some(Cmd::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                Some(Cmd::Drop) => break,
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = recv_tx.send(text.as_str().to_owned());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Fail the test instead of hanging forever.
pub async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out waiting on mock backend")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
