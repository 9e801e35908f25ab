//! Constants for the dashboard backend.
//!
//! Contains default URLs, endpoint paths, and reconciliation limits. These
//! are used internally by [`BackendClient`](crate::client::BackendClient)
//! and [`LiveSession`](crate::ws::session::LiveSession), but are also
//! exported so callers can build their own configuration.

// ---------------------------------------------------------------------------
// Base URLs
// ---------------------------------------------------------------------------

/// Default base URL of the dashboard backend.
pub const API_BASE_URL: &str = "http://127.0.0.1:8001";

// ---------------------------------------------------------------------------
// REST paths
// ---------------------------------------------------------------------------

/// Prepares a server-side streaming session (`POST`).
pub const PREPARE_SESSION_PATH: &str = "/api/websocket/connect";

// ---------------------------------------------------------------------------
// WebSocket paths
// ---------------------------------------------------------------------------

/// Streaming endpoint for symbol/depth/index data and account events.
pub const WS_DATA_PATH: &str = "/ws/data";

/// Streaming endpoint for the order-event variant (`event_types` subscribe).
pub const WS_ORDER_PATH: &str = "/ws/orders";

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The `status` value of a successful REST envelope.
pub const STATUS_SUCCESS: &str = "success";

// ---------------------------------------------------------------------------
// Reconciliation limits
// ---------------------------------------------------------------------------

/// Live-collection limits.
pub mod limits {
    /// Maximum entries kept per event stream (orders, trades, positions, general).
    pub const EVENT_HISTORY_CAP: usize = 50;
    /// Broadcast capacity for applied-update notifications.
    pub const UPDATE_CHANNEL_CAPACITY: usize = 1024;
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// REST polling defaults.
pub mod polling {
    /// Default re-fetch interval in milliseconds.
    pub const DEFAULT_INTERVAL_MS: u64 = 2_000;
    /// Shortest interval accepted by the poller.
    pub const MIN_INTERVAL_MS: u64 = 250;
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Environment variable names read by [`SessionConfig::from_env`](crate::config::SessionConfig::from_env).
pub mod env {
    /// Overrides the HTTP base URL.
    pub const BASE_URL: &str = "LIVEDESK_BASE_URL";
    /// Overrides the WebSocket base URL (otherwise derived from the HTTP base).
    pub const WS_URL: &str = "LIVEDESK_WS_URL";
    /// Overrides the per-stream event cap.
    pub const EVENT_CAP: &str = "LIVEDESK_EVENT_CAP";
}
