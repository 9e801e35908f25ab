//! Session configuration.
//!
//! [`SessionConfig`] is a plain struct with sensible defaults; build one
//! directly, through [`LiveSessionBuilder`](crate::ws::session::LiveSessionBuilder),
//! or from the environment with [`SessionConfig::from_env`].

use url::Url;

use crate::constants::limits::{EVENT_HISTORY_CAP, UPDATE_CHANNEL_CAPACITY};
use crate::constants::{API_BASE_URL, PREPARE_SESSION_PATH, WS_DATA_PATH, WS_ORDER_PATH, env};
use crate::error::{LiveDeskError, Result};

/// Configuration for a [`LiveSession`](crate::ws::session::LiveSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HTTP base URL of the backend.
    pub base_url: String,
    /// WebSocket base URL. Derived from `base_url` when `None`.
    pub ws_url: Option<String>,
    /// Path of the prepare-session endpoint.
    pub prepare_path: String,
    /// Path of the data stream.
    pub data_path: String,
    /// Path of the order-event stream.
    pub order_path: String,
    /// Maximum entries kept per event stream.
    pub event_cap: usize,
    /// Broadcast capacity for applied-update notifications.
    pub update_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_owned(),
            ws_url: None,
            prepare_path: PREPARE_SESSION_PATH.to_owned(),
            data_path: WS_DATA_PATH.to_owned(),
            order_path: WS_ORDER_PATH.to_owned(),
            event_cap: EVENT_HISTORY_CAP,
            update_channel_capacity: UPDATE_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `LIVEDESK_BASE_URL`, `LIVEDESK_WS_URL`, and
    /// `LIVEDESK_EVENT_CAP` where set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(base) = lookup(env::BASE_URL).filter(|s| !s.is_empty()) {
            config.base_url = base;
        }
        if let Some(ws) = lookup(env::WS_URL).filter(|s| !s.is_empty()) {
            config.ws_url = Some(ws);
        }
        if let Some(cap) = lookup(env::EVENT_CAP).filter(|s| !s.is_empty()) {
            config.event_cap = cap.parse().map_err(|_| {
                LiveDeskError::InvalidArgument(format!("{}={cap} is not a number", env::EVENT_CAP))
            })?;
        }
        Ok(config)
    }

    /// The WebSocket base: `ws_url` if set, otherwise `base_url` with its
    /// scheme swapped (`http→ws`, `https→wss`).
    pub fn ws_base(&self) -> Result<Url> {
        if let Some(ref ws) = self.ws_url {
            return Ok(Url::parse(ws)?);
        }
        let mut url = Url::parse(&self.base_url)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(LiveDeskError::InvalidArgument(format!(
                    "cannot derive a WebSocket URL from scheme {other}"
                )));
            }
        };
        url.set_scheme(scheme).map_err(|()| {
            LiveDeskError::InvalidArgument(format!("cannot switch {} to {scheme}", self.base_url))
        })?;
        Ok(url)
    }

    /// Full URL of the data stream.
    pub fn data_stream_url(&self) -> Result<Url> {
        self.stream_url(&self.data_path)
    }

    /// Full URL of the order-event stream.
    pub fn order_stream_url(&self) -> Result<Url> {
        self.stream_url(&self.order_path)
    }

    /// Append `path` to the WebSocket base, keeping any path prefix the base
    /// carries, the same way REST paths are appended to `base_url`.
    fn stream_url(&self, path: &str) -> Result<Url> {
        let mut url = self.ws_base()?;
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        Ok(url)
    }
}
