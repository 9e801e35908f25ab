//! Shared enum types that map directly to backend string values.
//!
//! Variant names match the `type` / `data_type` tags on the wire, so serde's
//! default unit-variant representation is used as-is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LiveDeskError;

// ---------------------------------------------------------------------------
// Data Type
// ---------------------------------------------------------------------------

/// Stream category carried in control messages (`data_type`) and in inbound
/// frames (`type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Latest price for one symbol.
    SymbolUpdate,
    /// Order-book depth for one symbol.
    DepthUpdate,
    /// Latest index value for one symbol.
    IndexUpdate,
    /// Order lifecycle events.
    OnOrders,
    /// Trade executions.
    OnTrades,
    /// Position changes.
    OnPositions,
    /// General notices.
    OnGeneral,
}

impl DataType {
    /// Every data type, in wire-declaration order.
    pub const ALL: [DataType; 7] = [
        DataType::SymbolUpdate,
        DataType::DepthUpdate,
        DataType::IndexUpdate,
        DataType::OnOrders,
        DataType::OnTrades,
        DataType::OnPositions,
        DataType::OnGeneral,
    ];

    /// The wire tag for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SymbolUpdate => "SymbolUpdate",
            Self::DepthUpdate => "DepthUpdate",
            Self::IndexUpdate => "IndexUpdate",
            Self::OnOrders => "OnOrders",
            Self::OnTrades => "OnTrades",
            Self::OnPositions => "OnPositions",
            Self::OnGeneral => "OnGeneral",
        }
    }

    /// Whether records of this type are kept as one latest value per symbol
    /// (as opposed to a bounded event list).
    pub fn is_market_data(self) -> bool {
        matches!(
            self,
            Self::SymbolUpdate | Self::DepthUpdate | Self::IndexUpdate
        )
    }

    /// Whether this type belongs to the account event streams.
    pub fn is_event(self) -> bool {
        !self.is_market_data()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = LiveDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| LiveDeskError::InvalidArgument(format!("unknown data type: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Control action
// ---------------------------------------------------------------------------

/// Action of an outbound control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Subscribe,
    Unsubscribe,
}

// ---------------------------------------------------------------------------
// Connection State
// ---------------------------------------------------------------------------

/// Lifecycle of a [`LiveSession`](crate::ws::session::LiveSession).
///
/// ```text
/// Disconnected ──connect()──▶ Connecting ──ok──▶ Connected ──start()──▶ Streaming
///       ▲                         │                  ▲                      │
///       │                        err                 └──stop()/close/error──┘
///       │                         ▼
///       └──────disconnect()──── Error ──connect()──▶ Connecting
/// ```
///
/// There is no automatic reconnect: every failure is terminal until the
/// caller re-enters the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session prepared.
    #[default]
    Disconnected,
    /// Prepare-session request in flight.
    Connecting,
    /// HTTP handshake succeeded; no socket open.
    Connected,
    /// Socket open and subscribed.
    Streaming,
    /// The last handshake failed. See `last_error()` for the reason.
    Error,
}

impl ConnectionState {
    /// Whether the session has a successful handshake behind it.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::Streaming)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Streaming => "streaming",
            Self::Error => "in error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_round_trips_through_wire_tag() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().unwrap(), dt);
            assert_eq!(
                serde_json::to_string(&dt).unwrap(),
                format!("\"{}\"", dt.as_str())
            );
        }
        assert!("subscription".parse::<DataType>().is_err());
    }

    #[test]
    fn market_data_split() {
        let market: Vec<_> = DataType::ALL.into_iter().filter(|d| d.is_market_data()).collect();
        assert_eq!(
            market,
            vec![DataType::SymbolUpdate, DataType::DepthUpdate, DataType::IndexUpdate]
        );
        assert!(DataType::OnGeneral.is_event());
    }

    #[test]
    fn action_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Action::Unsubscribe).unwrap(), "\"unsubscribe\"");
    }
}
