//! REST poller tests against the mock backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, PrepareMode, within};
use livedesk::client::BackendClient;
use livedesk::live::Reconciler;
use livedesk::poll::Poller;
use livedesk::types::DataType;
use serde_json::json;
use tokio::sync::Mutex;

/// Poll the reconciler until `check` holds.
async fn eventually(reconciler: &Mutex<Reconciler>, check: impl Fn(&Reconciler) -> bool) {
    within(async {
        loop {
            if check(&*reconciler.lock().await) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}

#[tokio::test]
async fn test_poller_applies_snapshots() {
    let backend = MockBackend::start(PrepareMode::Ok).await;
    backend.set_orders(json!([
        {"order_id": "A", "status": "PENDING"},
        {"order_id": "B", "status": "PENDING"},
    ]));

    let client = BackendClient::with_base_url(&backend.base_url).unwrap();
    let reconciler = Arc::new(Mutex::new(Reconciler::new(10)));
    let poller = Poller::spawn(
        client,
        "/api/orders",
        DataType::OnOrders,
        Duration::from_millis(250),
        reconciler.clone(),
    );
    assert!(poller.is_running());

    eventually(&reconciler, |r| r.orders().len() == 2).await;

    // A later poll overwrites by key; nothing is duplicated.
    backend.set_orders(json!([{"order_id": "A", "status": "COMPLETE"}]));
    eventually(&reconciler, |r| {
        r.orders().get("A").is_some_and(|o| o["status"] == "COMPLETE")
    })
    .await;

    {
        let rec = reconciler.lock().await;
        assert_eq!(rec.orders().len(), 2);
        // Snapshots are not frames.
        assert_eq!(rec.counters().total(), 0);
    }

    poller.stop();
}

#[tokio::test]
async fn test_poller_survives_failures() {
    let backend = MockBackend::start(PrepareMode::Ok).await;
    let client = BackendClient::with_base_url(&backend.base_url).unwrap();
    let reconciler = Arc::new(Mutex::new(Reconciler::default()));

    // Unknown route: every poll fails with 404 and the task keeps going.
    let poller = Poller::spawn(
        client,
        "/api/missing",
        DataType::OnTrades,
        Duration::from_millis(10),
        reconciler.clone(),
    );
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(poller.is_running());
    assert!(reconciler.lock().await.trades().is_empty());
    assert_eq!(poller.path(), "/api/missing");
    // Requested 10 ms, clamped to the floor.
    assert_eq!(poller.interval(), Duration::from_millis(250));
}

#[tokio::test]
async fn test_default_interval() {
    let backend = MockBackend::start(PrepareMode::Ok).await;
    backend.set_orders(json!([{"order_id": "A", "status": "OPEN"}]));
    let client = BackendClient::with_base_url(&backend.base_url).unwrap();
    let reconciler = Arc::new(Mutex::new(Reconciler::default()));

    let poller = Poller::spawn_default(client, "/api/orders", DataType::OnOrders, reconciler.clone());
    assert_eq!(poller.interval(), Duration::from_secs(2));
    assert_eq!(poller.data_type(), DataType::OnOrders);

    // First fetch is immediate.
    eventually(&reconciler, |r| r.orders().get("A").is_some()).await;
}
