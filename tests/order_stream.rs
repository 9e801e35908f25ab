//! Order-event stream tests against the mock backend.

mod common;

use std::sync::Arc;

use common::{MockBackend, PrepareMode, within};
use futures_util::StreamExt;
use livedesk::error::LiveDeskError;
use livedesk::live::Reconciler;
use livedesk::types::{DataType, MessageKind};
use livedesk::ws::order_stream::OrderEventStream;
use serde_json::json;
use tokio::sync::Mutex;

#[tokio::test]
async fn test_subscribes_with_event_types() {
    let mut backend = MockBackend::start(PrepareMode::Ok).await;
    let url = backend.ws_url("/ws/orders");

    let mut stream = OrderEventStream::connect(&url, &[DataType::OnOrders, DataType::OnTrades])
        .await
        .unwrap();
    let mut socket = backend.accept().await;

    assert_eq!(
        socket.next_json().await.unwrap(),
        json!({"action": "subscribe", "event_types": ["OnOrders", "OnTrades"]})
    );

    socket.push("{broken");
    socket.push_event("OnTrades", json!({"trade_id": 7, "qty": 10}));

    // The malformed frame is skipped, not surfaced.
    let event = within(stream.next()).await.unwrap().unwrap();
    assert_eq!(event.kind(), MessageKind::Data(DataType::OnTrades));
    assert_eq!(event.data["qty"], 10);

    stream.close().await.unwrap();
    assert!(socket.next_json().await.is_none());
}

#[tokio::test]
async fn test_binary_frames_are_decoded() {
    let mut backend = MockBackend::start(PrepareMode::Ok).await;
    let url = backend.ws_url("/ws/orders");

    let mut stream = OrderEventStream::connect(&url, &[DataType::OnGeneral])
        .await
        .unwrap();
    let mut socket = backend.accept().await;
    socket.next_json().await.unwrap();

    socket.push_binary(vec![0xff, 0xfe, 0x00]);
    socket.push_binary(
        json!({"type": "OnGeneral", "data": {"message": "market open"}})
            .to_string()
            .into_bytes(),
    );

    // Invalid UTF-8 is skipped; the JSON payload comes through.
    let event = within(stream.next()).await.unwrap().unwrap();
    assert_eq!(event.kind(), MessageKind::Data(DataType::OnGeneral));
    assert_eq!(event.data["message"], "market open");
}

#[tokio::test]
async fn test_run_into_reconciler() {
    let mut backend = MockBackend::start(PrepareMode::Ok).await;
    let url = backend.ws_url("/ws/orders");

    let stream = OrderEventStream::connect(&url, &[DataType::OnOrders, DataType::OnPositions])
        .await
        .unwrap();
    let mut socket = backend.accept().await;
    socket.next_json().await.unwrap();

    let reconciler = Arc::new(Mutex::new(Reconciler::new(10)));
    let task = tokio::spawn(stream.run_into(reconciler.clone()));

    socket.push_event("OnOrders", json!({"order_id": "A", "status": "PENDING"}));
    socket.push_event("OnPositions", json!({"symbol": "NSE:SBIN-EQ", "qty": 5}));
    socket.push_event("OnOrders", json!({"order_id": "A", "status": "COMPLETE"}));
    socket.close();

    within(task).await.unwrap().unwrap();

    let rec = reconciler.lock().await;
    assert_eq!(rec.orders().len(), 1);
    assert_eq!(rec.orders().get("A").unwrap()["status"], "COMPLETE");
    assert_eq!(rec.positions().get("NSE:SBIN-EQ").unwrap()["qty"], 5);
    assert_eq!(rec.counters().total(), 3);
}

#[tokio::test]
async fn test_rejects_market_data_types() {
    let backend = MockBackend::start(PrepareMode::Ok).await;
    let url = backend.ws_url("/ws/orders");

    let err = OrderEventStream::connect(&url, &[DataType::OnOrders, DataType::DepthUpdate])
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LiveDeskError::InvalidArgument(_)));

    let err = OrderEventStream::connect(&url, &[]).await.err().unwrap();
    assert!(matches!(err, LiveDeskError::InvalidArgument(_)));
}
