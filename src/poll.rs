//! Interval-based REST re-fetch into a live reconciler.
//!
//! Dashboards typically poll a REST endpoint every few seconds *alongside*
//! a live socket. Both write into the same [`Reconciler`] and there is no
//! precedence between them: whichever lands last wins, so a slow poll can
//! overwrite a newer socket value. A failed poll is logged and the next
//! tick tries again.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use livedesk::client::BackendClient;
//! use livedesk::live::Reconciler;
//! use livedesk::poll::Poller;
//! use livedesk::types::DataType;
//! use tokio::sync::Mutex;
//!
//! # #[tokio::main]
//! # async fn main() -> livedesk::error::Result<()> {
//! let reconciler = Arc::new(Mutex::new(Reconciler::default()));
//! let poller = Poller::spawn(
//!     BackendClient::new()?,
//!     "/api/orders",
//!     DataType::OnOrders,
//!     Duration::from_secs(2),
//!     reconciler.clone(),
//! );
//! // ... later
//! poller.stop();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::BackendClient;
use crate::constants::polling::{DEFAULT_INTERVAL_MS, MIN_INTERVAL_MS};
use crate::live::Reconciler;
use crate::types::DataType;

/// A background task re-fetching one endpoint on a fixed interval.
///
/// Dropping the poller stops it.
#[derive(Debug)]
pub struct Poller {
    path: String,
    data_type: DataType,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn a poller fetching `path` every `interval` (at least 250 ms) and
    /// applying each record as `data_type`. The first fetch happens
    /// immediately.
    pub fn spawn(
        client: BackendClient,
        path: impl Into<String>,
        data_type: DataType,
        interval: Duration,
        reconciler: Arc<Mutex<Reconciler>>,
    ) -> Self {
        let path = path.into();
        let interval = interval.max(Duration::from_millis(MIN_INTERVAL_MS));

        let task = tokio::spawn(poll_loop(
            client,
            path.clone(),
            data_type,
            interval,
            reconciler,
        ));

        tracing::info!(%path, %data_type, interval_ms = interval.as_millis() as u64, "Poller started");

        Self {
            path,
            data_type,
            interval,
            task: Some(task),
        }
    }

    /// [`spawn`](Self::spawn) with the default two-second interval.
    pub fn spawn_default(
        client: BackendClient,
        path: impl Into<String>,
        data_type: DataType,
        reconciler: Arc<Mutex<Reconciler>>,
    ) -> Self {
        Self::spawn(
            client,
            path,
            data_type,
            Duration::from_millis(DEFAULT_INTERVAL_MS),
            reconciler,
        )
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Effective interval, after clamping.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the background task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop polling. An in-flight request is abandoned, not awaited.
    pub fn stop(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!(path = %self.path, "Poller stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn poll_loop(
    client: BackendClient,
    path: String,
    data_type: DataType,
    interval: Duration,
    reconciler: Arc<Mutex<Reconciler>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match client.fetch_records(&path).await {
            Ok(records) => {
                let fetched = records.len();
                let applied = reconciler.lock().await.apply_snapshot(data_type, records);
                tracing::debug!(%path, fetched, applied, "Poll applied");
            }
            Err(e) => {
                tracing::warn!(%path, error = %e, "Poll failed");
            }
        }
    }
}
