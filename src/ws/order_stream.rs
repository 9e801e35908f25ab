//! Order-event WebSocket client.
//!
//! A separate endpoint that streams account events (`OnOrders`, `OnTrades`,
//! `OnPositions`, `OnGeneral`). Unlike the data stream it is subscribed once,
//! at connect time, with `{ "action": "subscribe", "event_types": [...] }`.
//!
//! # Example
//!
//! ```no_run
//! use livedesk::types::DataType;
//! use livedesk::ws::order_stream::OrderEventStream;
//! use futures_util::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> livedesk::error::Result<()> {
//! let mut stream = OrderEventStream::connect(
//!     "ws://127.0.0.1:8001/ws/orders",
//!     &[DataType::OnOrders, DataType::OnTrades],
//! )
//! .await?;
//!
//! while let Some(msg) = stream.next().await {
//!     match msg {
//!         Ok(event) => println!("{} → {}", event.tag, event.data),
//!         Err(e) => eprintln!("Error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::SessionConfig;
use crate::error::{LiveDeskError, Result};
use crate::live::Reconciler;
use crate::live::reconciler::log_preview;
use crate::types::{Action, DataType, EventSubscribeMessage, InboundMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A streaming connection for receiving account events.
///
/// Implements [`Stream<Item = Result<InboundMessage>>`] so you can use it
/// with `StreamExt::next()` and other stream combinators. Malformed frames
/// are logged and skipped; only transport errors surface as `Err`.
pub struct OrderEventStream {
    read: SplitStream<WsStream>,
    write: SplitSink<WsStream, Message>,
}

impl OrderEventStream {
    /// Connect to `url` and subscribe to `event_types`.
    ///
    /// Every entry must be an event category; market-data types are
    /// rejected before any connection is made.
    pub async fn connect(url: &str, event_types: &[DataType]) -> Result<Self> {
        if event_types.is_empty() {
            return Err(LiveDeskError::InvalidArgument(
                "at least one event type is required".into(),
            ));
        }
        if let Some(dt) = event_types.iter().find(|dt| dt.is_market_data()) {
            return Err(LiveDeskError::InvalidArgument(format!(
                "{dt} is not an event type"
            )));
        }

        let (ws, _resp) = connect_async(url).await?;
        let (mut write, read) = ws.split();

        let sub = EventSubscribeMessage {
            action: Action::Subscribe,
            event_types: event_types.to_vec(),
        };
        let sub_json = serde_json::to_string(&sub)?;
        write.send(Message::Text(sub_json.into())).await?;

        tracing::info!(%url, count = event_types.len(), "Connected to order-event WebSocket");

        Ok(Self { read, write })
    }

    /// Connect to the order-event endpoint described by `config`.
    pub async fn connect_with(config: &SessionConfig, event_types: &[DataType]) -> Result<Self> {
        let url = config.order_stream_url()?;
        Self::connect(url.as_str(), event_types).await
    }

    /// Feed every event into `reconciler` until the server closes the
    /// stream. Returns the transport error that ended it, if any.
    pub async fn run_into(mut self, reconciler: Arc<Mutex<Reconciler>>) -> Result<()> {
        while let Some(msg) = self.next().await {
            let msg = msg?;
            reconciler.lock().await.apply(msg);
        }
        Ok(())
    }

    /// Close the WebSocket connection gracefully.
    pub async fn close(mut self) -> Result<()> {
        self.write.send(Message::Close(None)).await?;
        tracing::info!("Order-event WebSocket closed");
        Ok(())
    }
}

impl Stream for OrderEventStream {
    type Item = Result<InboundMessage>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.read.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(msg))) => match msg {
                    Message::Text(text) => match parse_event(&text) {
                        Some(event) => return Poll::Ready(Some(Ok(event))),
                        None => continue,
                    },
                    Message::Binary(data) => match std::str::from_utf8(&data) {
                        Ok(text) => match parse_event(text) {
                            Some(event) => return Poll::Ready(Some(Ok(event))),
                            None => continue,
                        },
                        Err(e) => {
                            tracing::warn!(error = %e, len = data.len(), "Dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Message::Ping(_) | Message::Pong(_) => {
                        // Ping/pong handled automatically by tungstenite
                        continue;
                    }
                    Message::Close(_) => {
                        tracing::info!("Order-event WebSocket closed by server");
                        return Poll::Ready(None);
                    }
                    _ => continue,
                },
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(LiveDeskError::WebSocket(e))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn parse_event(text: &str) -> Option<InboundMessage> {
    match serde_json::from_str::<InboundMessage>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(
                error = %e,
                len = text.len(),
                preview = log_preview(text),
                "Failed to parse order event"
            );
            None
        }
    }
}
