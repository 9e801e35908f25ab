//! Live streaming session: HTTP bootstrap, one data socket, subscriptions.
//!
//! # Architecture
//!
//! ```text
//!        connect()                     start()
//!   ┌───────────────┐   POST   ┌──────────────────────┐
//!   │  LiveSession  │ ───────▶ │ prepare-session (REST)│
//!   │ (state, subs) │          └──────────────────────┘
//!   └──┬─────────┬──┘
//!      │ writer  │ reader task (one per start)
//!      ▼         ▼
//!   control   frames ──▶ Reconciler (Arc<Mutex>) ──▶ broadcast<Applied>
//!   messages
//! ```
//!
//! The session owns at most one socket. Calling [`LiveSession::start`] while
//! streaming closes the previous socket first. Every frame is applied to the
//! reconciler under its lock, in delivery order.
//!
//! There is no reconnect: a server close or transport error returns the
//! session to [`ConnectionState::Connected`] with the reason recorded, and
//! the caller decides whether to `start()` again.
//!
//! # Quick Start
//!
//! ```no_run
//! use livedesk::types::DataType;
//! use livedesk::ws::session::LiveSessionBuilder;
//!
//! # #[tokio::main]
//! # async fn main() -> livedesk::error::Result<()> {
//! let mut session = LiveSessionBuilder::new()
//!     .base_url("http://127.0.0.1:8001")
//!     .event_cap(50)
//!     .build()?;
//!
//! session.add("NSE:SBIN-EQ", DataType::SymbolUpdate).await?; // queued
//! session.connect().await?;
//! session.start(&[]).await?;
//!
//! let mut updates = session.subscribe_updates();
//! while let Ok(applied) = updates.recv().await {
//!     let rec = session.reconciler();
//!     let rec = rec.lock().await;
//!     println!("{applied:?} -> {} symbols", rec.symbols().len());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::api::session::PrepareSessionRequest;
use crate::client::BackendClient;
use crate::config::SessionConfig;
use crate::error::{LiveDeskError, Result};
use crate::live::{Applied, Reconciler};
use crate::types::{Action, ConnectionState, ControlMessage, DataType, Subscription};
use crate::ws::subscriptions::SubscriptionSet;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WriterHalf = SplitSink<WsStream, Message>;
type ReaderHalf = SplitStream<WsStream>;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Snapshot of a session's lifecycle, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Current state.
    pub state: ConnectionState,
    /// Human-readable reason for the last transition, if any (handshake
    /// failure, server close, transport error).
    pub detail: Option<String>,
    /// When the session entered `state`.
    pub since: DateTime<Utc>,
}

impl SessionStatus {
    fn new(state: ConnectionState, detail: Option<String>) -> Self {
        Self {
            state,
            detail,
            since: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`LiveSession`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use livedesk::ws::session::LiveSessionBuilder;
///
/// let session = LiveSessionBuilder::new()
///     .base_url("http://10.0.0.2:8001")
///     .data_path("/ws/market")
///     .build()
///     .expect("valid config");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LiveSessionBuilder {
    config: SessionConfig,
    prepare_request: PrepareSessionRequest,
    reconciler: Option<Arc<Mutex<Reconciler>>>,
}

impl LiveSessionBuilder {
    /// Start from [`SessionConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration (e.g. [`SessionConfig::from_env`]).
    pub fn from_config(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the HTTP base URL. Default: `http://127.0.0.1:8001`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set an explicit WebSocket base URL. Default: derived from the HTTP base.
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.config.ws_url = Some(url.into());
        self
    }

    /// Set the prepare-session path. Default: `/api/websocket/connect`.
    pub fn prepare_path(mut self, path: impl Into<String>) -> Self {
        self.config.prepare_path = path.into();
        self
    }

    /// Set the data stream path. Default: `/ws/data`.
    pub fn data_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_path = path.into();
        self
    }

    /// Set the per-stream event cap. Default: 50.
    pub fn event_cap(mut self, cap: usize) -> Self {
        self.config.event_cap = cap.max(1);
        self
    }

    /// Set the broadcast capacity for applied updates. Default: 1,024.
    pub fn update_channel_capacity(mut self, cap: usize) -> Self {
        self.config.update_channel_capacity = cap.max(1);
        self
    }

    /// Body sent with the prepare-session request.
    pub fn prepare_request(mut self, req: PrepareSessionRequest) -> Self {
        self.prepare_request = req;
        self
    }

    /// Share an existing reconciler (e.g. with a [`Poller`](crate::poll::Poller))
    /// instead of creating a fresh one. `event_cap` is ignored in that case.
    pub fn reconciler(mut self, reconciler: Arc<Mutex<Reconciler>>) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    /// Build the [`LiveSession`].
    pub fn build(self) -> Result<LiveSession> {
        LiveSession::new(self.config, self.prepare_request, self.reconciler)
    }
}

// ---------------------------------------------------------------------------
// LiveSession
// ---------------------------------------------------------------------------

/// One streaming session against the dashboard backend.
///
/// Use [`LiveSessionBuilder`] for construction.
pub struct LiveSession {
    client: BackendClient,
    config: SessionConfig,
    data_url: Url,
    prepare_request: PrepareSessionRequest,
    status: Arc<watch::Sender<SessionStatus>>,
    subscriptions: SubscriptionSet,
    /// The write half of the socket, shared with the reader task.
    writer: Arc<Mutex<Option<WriterHalf>>>,
    reader: Option<JoinHandle<()>>,
    /// Bumped on every socket teardown so a superseded reader cannot touch
    /// the state of the current socket.
    generation: Arc<AtomicU64>,
    reconciler: Arc<Mutex<Reconciler>>,
    updates_tx: broadcast::Sender<Applied>,
}

impl LiveSession {
    fn new(
        config: SessionConfig,
        prepare_request: PrepareSessionRequest,
        reconciler: Option<Arc<Mutex<Reconciler>>>,
    ) -> Result<Self> {
        let client = BackendClient::with_base_url(config.base_url.clone())?;
        let data_url = config.data_stream_url()?;
        let reconciler = reconciler
            .unwrap_or_else(|| Arc::new(Mutex::new(Reconciler::new(config.event_cap))));
        let (status, _) = watch::channel(SessionStatus::new(ConnectionState::Disconnected, None));
        let (updates_tx, _) = broadcast::channel(config.update_channel_capacity);

        Ok(Self {
            client,
            config,
            data_url,
            prepare_request,
            status: Arc::new(status),
            subscriptions: SubscriptionSet::new(),
            writer: Arc::new(Mutex::new(None)),
            reader: None,
            generation: Arc::new(AtomicU64::new(0)),
            reconciler,
            updates_tx,
        })
    }

    // -----------------------------------------------------------------------
    // Connection bootstrap
    // -----------------------------------------------------------------------

    /// Prepare the server-side session over HTTP.
    ///
    /// On success the session is `Connected`. On failure it is `Error`, the
    /// reason is available from [`last_error`](Self::last_error), and the
    /// error is returned. There is no retry.
    pub async fn connect(&mut self) -> Result<ConnectionState> {
        let state = self.state();
        if matches!(state, ConnectionState::Connecting | ConnectionState::Streaming) {
            return Err(LiveDeskError::InvalidState {
                operation: "connect",
                state,
            });
        }

        self.set_status(ConnectionState::Connecting, None);
        tracing::debug!(base_url = %self.client.base_url(), "Preparing streaming session");

        match self
            .client
            .prepare_session_at(&self.config.prepare_path, &self.prepare_request)
            .await
        {
            Ok(()) => {
                self.set_status(ConnectionState::Connected, None);
                tracing::info!(base_url = %self.client.base_url(), "Session prepared");
                Ok(ConnectionState::Connected)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to prepare session");
                self.set_status(ConnectionState::Error, Some(e.to_string()));
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Streaming
    // -----------------------------------------------------------------------

    /// Open the data socket and subscribe to every tracked subscription.
    ///
    /// `subscriptions` are merged into the tracked set first. If a socket is
    /// already open it is closed before the new one is opened.
    pub async fn start(&mut self, subscriptions: &[Subscription]) -> Result<()> {
        let state = self.state();
        if !state.is_connected() {
            return Err(LiveDeskError::InvalidState {
                operation: "start",
                state,
            });
        }

        for sub in subscriptions {
            self.subscriptions.extend(sub);
        }

        if state == ConnectionState::Streaming {
            tracing::info!("Restarting stream, closing previous socket");
        }
        self.close_socket().await;

        let generation = self.generation.load(Ordering::SeqCst);

        let (ws, _resp) = match connect_async(self.data_url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(url = %self.data_url, error = %e, "Failed to open data socket");
                self.set_status(ConnectionState::Connected, Some(e.to_string()));
                return Err(e.into());
            }
        };
        let (mut write, read) = ws.split();

        if let Err(e) = self.send_subscriptions(&mut write).await {
            tracing::error!(error = %e, "Failed to send subscriptions");
            let _ = write.close().await;
            self.set_status(ConnectionState::Connected, Some(e.to_string()));
            return Err(e);
        }

        *self.writer.lock().await = Some(write);
        // Streaming must be published before the reader can observe a close.
        self.set_status(ConnectionState::Streaming, None);

        let task = tokio::spawn(read_loop(
            generation,
            read,
            self.writer.clone(),
            self.generation.clone(),
            self.status.clone(),
            self.reconciler.clone(),
            self.updates_tx.clone(),
        ));
        self.reader = Some(task);

        tracing::info!(
            url = %self.data_url,
            subscriptions = self.subscriptions.len(),
            "Streaming started"
        );
        Ok(())
    }

    /// Close the data socket. Always succeeds; a socket that is already
    /// gone is not an error.
    pub async fn stop(&mut self) -> Result<()> {
        self.close_socket().await;
        if self.state() == ConnectionState::Streaming {
            self.set_status(ConnectionState::Connected, None);
        }
        tracing::info!("Streaming stopped");
        Ok(())
    }

    /// Stop streaming, forget every subscription, and return to
    /// `Disconnected`. Reconciled data is kept.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.close_socket().await;
        self.subscriptions.clear();
        self.set_status(ConnectionState::Disconnected, None);
        tracing::info!("Session disconnected");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subscription management
    // -----------------------------------------------------------------------

    /// Track `symbol` on `data_type`.
    ///
    /// While streaming, a subscribe message is sent immediately; otherwise
    /// the pair is queued for the next [`start`](Self::start). Returns
    /// `false` if the pair was already tracked (nothing is sent).
    ///
    /// If the live send fails the pair stays tracked, so the next `start`
    /// picks it up, and the send error is returned.
    pub async fn add(&mut self, symbol: impl Into<String>, data_type: DataType) -> Result<bool> {
        let symbol = symbol.into();
        if !self.subscriptions.add(symbol.clone(), data_type) {
            return Ok(false);
        }

        if self.state() == ConnectionState::Streaming {
            let msg = ControlMessage::new(Action::Subscribe, data_type, [symbol.as_str()]);
            self.send_control(&msg).await?;
            tracing::debug!(%symbol, %data_type, "Subscribed");
        } else {
            tracing::debug!(%symbol, %data_type, "Subscription queued");
        }
        Ok(true)
    }

    /// Stop tracking `symbol` on `data_type`.
    ///
    /// While streaming, an unsubscribe message is sent. A data type left
    /// with no symbols is dropped. Returns `false` if the pair was not
    /// tracked (nothing is sent).
    pub async fn remove(&mut self, symbol: &str, data_type: DataType) -> Result<bool> {
        if !self.subscriptions.remove(symbol, data_type) {
            return Ok(false);
        }

        if self.state() == ConnectionState::Streaming {
            let msg = ControlMessage::new(Action::Unsubscribe, data_type, [symbol]);
            self.send_control(&msg).await?;
            tracing::debug!(%symbol, %data_type, "Unsubscribed");
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Current status snapshot.
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Reason recorded with the last transition, if any.
    pub fn last_error(&self) -> Option<String> {
        self.status.borrow().detail.clone()
    }

    /// A receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// A receiver for every frame that reached a collection.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<Applied> {
        self.updates_tx.subscribe()
    }

    /// The shared reconciler fed by this session.
    pub fn reconciler(&self) -> Arc<Mutex<Reconciler>> {
        self.reconciler.clone()
    }

    /// Tracked subscriptions.
    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    /// The REST client used for the handshake.
    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn set_status(&self, state: ConnectionState, detail: Option<String>) {
        let previous = self.status.send_replace(SessionStatus::new(state, detail));
        if previous.state != state {
            tracing::debug!(from = %previous.state, to = %state, "Session state changed");
        }
    }

    /// One subscribe message per tracked data type.
    async fn send_subscriptions(&self, write: &mut WriterHalf) -> Result<()> {
        for sub in self.subscriptions.subscriptions() {
            let json = serde_json::to_string(&sub.subscribe_message())?;
            write.send(Message::Text(json.into())).await?;
            tracing::debug!(
                data_type = %sub.data_type,
                count = sub.symbols.len(),
                "Sent subscribe"
            );
        }
        Ok(())
    }

    async fn send_control(&self, msg: &ControlMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(w) => {
                w.send(Message::Text(json.into())).await?;
                Ok(())
            }
            None => Err(LiveDeskError::InvalidState {
                operation: "send",
                state: self.state(),
            }),
        }
    }

    /// Invalidate the current reader, send a close frame, and abort the
    /// reader task.
    async fn close_socket(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut guard = self.writer.lock().await;
        if let Some(mut w) = guard.take() {
            if let Err(e) = w.send(Message::Close(None)).await {
                tracing::debug!(error = %e, "Close frame not delivered");
            }
        }
        drop(guard);

        if let Some(task) = self.reader.take() {
            task.abort();
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if let Some(task) = self.reader.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Reader task
// ---------------------------------------------------------------------------

/// Apply frames until the socket ends, then hand the session back to
/// `Connected` unless a newer socket has taken over.
async fn read_loop(
    generation: u64,
    mut read: ReaderHalf,
    writer: Arc<Mutex<Option<WriterHalf>>>,
    current: Arc<AtomicU64>,
    status: Arc<watch::Sender<SessionStatus>>,
    reconciler: Arc<Mutex<Reconciler>>,
    updates_tx: broadcast::Sender<Applied>,
) {
    let reason = loop {
        match read.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => apply_frame(&text, &reconciler, &updates_tx).await,
                Message::Binary(data) => match std::str::from_utf8(&data) {
                    Ok(text) => apply_frame(text, &reconciler, &updates_tx).await,
                    Err(e) => {
                        tracing::warn!(error = %e, len = data.len(), "Dropping non-UTF-8 binary frame");
                    }
                },
                Message::Ping(_) | Message::Pong(_) => {
                    // Ping/pong handled automatically by tungstenite
                }
                Message::Close(frame) => {
                    tracing::info!(?frame, "Data socket closed by server");
                    break match frame {
                        Some(f) if !f.reason.is_empty() => {
                            format!("closed by server: {} ({})", f.reason, f.code)
                        }
                        _ => "closed by server".to_owned(),
                    };
                }
                _ => {}
            },
            Some(Err(e)) => {
                tracing::error!(error = %e, "Data socket error");
                break e.to_string();
            }
            None => {
                tracing::info!("Data socket stream ended");
                break "stream ended".to_owned();
            }
        }
    };

    let mut guard = writer.lock().await;
    if current.load(Ordering::SeqCst) != generation {
        return;
    }
    *guard = None;
    drop(guard);

    status.send_if_modified(|s| {
        if current.load(Ordering::SeqCst) == generation && s.state == ConnectionState::Streaming {
            *s = SessionStatus::new(ConnectionState::Connected, Some(reason));
            true
        } else {
            false
        }
    });
}

async fn apply_frame(
    text: &str,
    reconciler: &Mutex<Reconciler>,
    updates_tx: &broadcast::Sender<Applied>,
) {
    let applied = reconciler.lock().await.on_message(text);
    if let Some(applied) = applied {
        // No receivers is fine.
        let _ = updates_tx.send(applied);
    }
}
