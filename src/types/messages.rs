//! WebSocket wire types — outbound control messages and inbound frames.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::enums::{Action, DataType};

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A set of symbols tracked for one [`DataType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Symbols tracked for this data type (e.g. `"NSE:SBIN-EQ"`).
    pub symbols: BTreeSet<String>,
    /// The stream the symbols are subscribed on.
    pub data_type: DataType,
}

impl Subscription {
    /// Create a subscription from any iterable of symbols.
    pub fn new<I, S>(data_type: DataType, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            data_type,
        }
    }

    /// The subscribe control message for this subscription.
    pub fn subscribe_message(&self) -> ControlMessage {
        ControlMessage::new(Action::Subscribe, self.data_type, self.symbols.iter().cloned())
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// `{ "action": "subscribe"|"unsubscribe", "symbols": [...], "data_type": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub action: Action,
    pub symbols: Vec<String>,
    pub data_type: DataType,
}

impl ControlMessage {
    /// Build a control message for the given symbols.
    pub fn new<I, S>(action: Action, data_type: DataType, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action,
            symbols: symbols.into_iter().map(Into::into).collect(),
            data_type,
        }
    }
}

/// `{ "action": "subscribe", "event_types": [...] }` — order-stream variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscribeMessage {
    pub action: Action,
    pub event_types: Vec<DataType>,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Raw inbound frame: `{ "type": "...", "data": {...} }`.
///
/// `type` is kept as a string so unknown tags survive parsing; use
/// [`InboundMessage::kind`] to classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Classification of an inbound frame's `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// One of the seven stream categories.
    Data(DataType),
    /// Server acknowledgement of a subscribe/unsubscribe.
    Subscription,
    /// Anything else.
    Unknown,
}

impl InboundMessage {
    /// Build a frame for the given data type.
    pub fn new(data_type: DataType, data: serde_json::Value) -> Self {
        Self {
            tag: data_type.as_str().to_owned(),
            data,
        }
    }

    /// Classify the frame by its `type` tag.
    pub fn kind(&self) -> MessageKind {
        match self.tag.as_str() {
            "subscription" => MessageKind::Subscription,
            tag => tag
                .parse::<DataType>()
                .map(MessageKind::Data)
                .unwrap_or(MessageKind::Unknown),
        }
    }
}
