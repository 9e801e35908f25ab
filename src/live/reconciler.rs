//! Message reconciler.
//!
//! Merges inbound `{ "type", "data" }` frames into the client-side live
//! state:
//!
//! | `type` | Collection | Key |
//! |---|---|---|
//! | `OnOrders` | [`BoundedLog`] | `order_id` (falls back to `id`) |
//! | `OnTrades` | [`BoundedLog`] | `trade_id` (falls back to `id`) |
//! | `OnPositions` | [`BoundedLog`] | `position_id` (falls back to `symbol`) |
//! | `OnGeneral` | [`BoundedLog`] | none, every notice is kept |
//! | `SymbolUpdate` / `DepthUpdate` / `IndexUpdate` | [`LatestMap`] | `symbol` |
//!
//! Malformed frames are logged and dropped. They never reach the caller as
//! an error and never mutate any collection.
//!
//! # Example
//!
//! ```
//! use livedesk::live::Reconciler;
//!
//! let mut rec = Reconciler::default();
//! rec.on_message(r#"{"type":"OnOrders","data":{"order_id":"A","status":"PENDING"}}"#);
//! rec.on_message(r#"{"type":"OnOrders","data":{"order_id":"A","status":"COMPLETE"}}"#);
//! rec.on_message("not json");
//!
//! assert_eq!(rec.orders().len(), 1);
//! assert_eq!(rec.orders().get("A").unwrap()["status"], "COMPLETE");
//! assert_eq!(rec.counters().dropped(), 1);
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::constants::limits::EVENT_HISTORY_CAP;
use crate::live::collection::{BoundedLog, LatestMap, Upsert};
use crate::types::{DataType, InboundMessage, MessageKind};

// ---------------------------------------------------------------------------
// Key extraction
// ---------------------------------------------------------------------------

/// First present field among `fields`, as a string. Numeric ids are
/// stringified so `42` and `"42"` collapse onto the same key.
fn field_key(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| match value.get(*f)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn order_key(v: &Value) -> Option<String> {
    field_key(v, &["order_id", "id"])
}

fn trade_key(v: &Value) -> Option<String> {
    field_key(v, &["trade_id", "id"])
}

fn position_key(v: &Value) -> Option<String> {
    field_key(v, &["position_id", "symbol"])
}

fn no_key(_: &Value) -> Option<String> {
    None
}

/// Longest prefix of a dropped frame that is written to the log.
const LOG_PREVIEW_CHARS: usize = 200;

/// `raw` cut to at most [`LOG_PREVIEW_CHARS`] characters.
pub(crate) fn log_preview(raw: &str) -> &str {
    match raw.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((end, _)) => &raw[..end],
        None => raw,
    }
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Per-category message counters, for display only.
///
/// Scoped to one [`Reconciler`]; nothing is persisted or shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCounters {
    per_type: BTreeMap<DataType, u64>,
    acks: u64,
    dropped: u64,
}

impl MessageCounters {
    /// Frames applied for `data_type`.
    pub fn get(&self, data_type: DataType) -> u64 {
        self.per_type.get(&data_type).copied().unwrap_or(0)
    }

    /// Subscription acknowledgements received.
    pub fn acks(&self) -> u64 {
        self.acks
    }

    /// Frames dropped as malformed, unknown, or unkeyable.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Frames applied across every data type.
    pub fn total(&self) -> u64 {
        self.per_type.values().sum()
    }

    /// `(data type, count)` pairs for every type seen so far.
    pub fn iter(&self) -> impl Iterator<Item = (DataType, u64)> + '_ {
        self.per_type.iter().map(|(dt, n)| (*dt, *n))
    }
}

// ---------------------------------------------------------------------------
// Applied
// ---------------------------------------------------------------------------

/// Describes a frame that reached a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Stream the frame belonged to.
    pub data_type: DataType,
    /// Key the record was stored under (`None` for unkeyed notices).
    pub key: Option<String>,
    /// What happened to the collection.
    pub outcome: Upsert,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Owns every live collection fed by one streaming session.
#[derive(Debug, Clone)]
pub struct Reconciler {
    orders: BoundedLog<Value>,
    trades: BoundedLog<Value>,
    positions: BoundedLog<Value>,
    general: BoundedLog<Value>,
    symbols: LatestMap<Value>,
    depth: LatestMap<Value>,
    indices: LatestMap<Value>,
    counters: MessageCounters,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(EVENT_HISTORY_CAP)
    }
}

impl Reconciler {
    /// Create a reconciler whose event streams keep at most `event_cap`
    /// entries each.
    pub fn new(event_cap: usize) -> Self {
        Self {
            orders: BoundedLog::new(event_cap, order_key),
            trades: BoundedLog::new(event_cap, trade_key),
            positions: BoundedLog::new(event_cap, position_key),
            general: BoundedLog::new(event_cap, no_key),
            symbols: LatestMap::default(),
            depth: LatestMap::default(),
            indices: LatestMap::default(),
            counters: MessageCounters::default(),
        }
    }

    /// Parse and apply one raw text frame.
    ///
    /// Returns what was applied, or `None` if the frame was an ack or was
    /// dropped. Never fails: malformed input is logged at `warn`.
    pub fn on_message(&mut self, raw: &str) -> Option<Applied> {
        match serde_json::from_str::<InboundMessage>(raw) {
            Ok(msg) => self.apply(msg),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    len = raw.len(),
                    preview = log_preview(raw),
                    "Dropping malformed frame"
                );
                self.counters.dropped += 1;
                None
            }
        }
    }

    /// Apply an already-parsed frame and bump its counter.
    pub fn apply(&mut self, msg: InboundMessage) -> Option<Applied> {
        match msg.kind() {
            MessageKind::Data(data_type) => {
                let applied = self.apply_record(data_type, msg.data);
                match applied {
                    Some(_) => *self.counters.per_type.entry(data_type).or_default() += 1,
                    None => self.counters.dropped += 1,
                }
                applied
            }
            MessageKind::Subscription => {
                tracing::debug!(data = %msg.data, "Subscription acknowledged");
                self.counters.acks += 1;
                None
            }
            MessageKind::Unknown => {
                tracing::debug!(tag = %msg.tag, "Ignoring frame with unknown type");
                self.counters.dropped += 1;
                None
            }
        }
    }

    /// Apply a batch of REST-fetched records for `data_type`.
    ///
    /// Goes through the same merge rules as socket frames but leaves the
    /// counters alone. Whichever of poll and socket lands last wins.
    pub fn apply_snapshot<I>(&mut self, data_type: DataType, records: I) -> usize
    where
        I: IntoIterator<Item = Value>,
    {
        records
            .into_iter()
            .filter_map(|r| self.apply_record(data_type, r))
            .count()
    }

    fn apply_record(&mut self, data_type: DataType, data: Value) -> Option<Applied> {
        if !data.is_object() {
            tracing::warn!(%data_type, %data, "Dropping frame whose data is not an object");
            return None;
        }

        match data_type {
            DataType::SymbolUpdate | DataType::DepthUpdate | DataType::IndexUpdate => {
                let Some(symbol) = field_key(&data, &["symbol"]) else {
                    tracing::warn!(%data_type, "Dropping market-data frame without a symbol");
                    return None;
                };
                let map = match data_type {
                    DataType::SymbolUpdate => &mut self.symbols,
                    DataType::DepthUpdate => &mut self.depth,
                    _ => &mut self.indices,
                };
                let outcome = map.replace(symbol.clone(), data);
                Some(Applied {
                    data_type,
                    key: Some(symbol),
                    outcome,
                })
            }
            DataType::OnOrders | DataType::OnTrades | DataType::OnPositions | DataType::OnGeneral => {
                let log = match data_type {
                    DataType::OnOrders => &mut self.orders,
                    DataType::OnTrades => &mut self.trades,
                    DataType::OnPositions => &mut self.positions,
                    _ => &mut self.general,
                };
                let key = log.key_for(&data);
                let outcome = log.upsert(data);
                Some(Applied {
                    data_type,
                    key,
                    outcome,
                })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn orders(&self) -> &BoundedLog<Value> {
        &self.orders
    }

    pub fn trades(&self) -> &BoundedLog<Value> {
        &self.trades
    }

    pub fn positions(&self) -> &BoundedLog<Value> {
        &self.positions
    }

    pub fn general(&self) -> &BoundedLog<Value> {
        &self.general
    }

    pub fn symbols(&self) -> &LatestMap<Value> {
        &self.symbols
    }

    pub fn depth(&self) -> &LatestMap<Value> {
        &self.depth
    }

    pub fn indices(&self) -> &LatestMap<Value> {
        &self.indices
    }

    /// The event log backing `data_type`, if it is an event stream.
    pub fn events(&self, data_type: DataType) -> Option<&BoundedLog<Value>> {
        match data_type {
            DataType::OnOrders => Some(&self.orders),
            DataType::OnTrades => Some(&self.trades),
            DataType::OnPositions => Some(&self.positions),
            DataType::OnGeneral => Some(&self.general),
            _ => None,
        }
    }

    /// The latest-value map backing `data_type`, if it is a market-data stream.
    pub fn latest(&self, data_type: DataType) -> Option<&LatestMap<Value>> {
        match data_type {
            DataType::SymbolUpdate => Some(&self.symbols),
            DataType::DepthUpdate => Some(&self.depth),
            DataType::IndexUpdate => Some(&self.indices),
            _ => None,
        }
    }

    pub fn counters(&self) -> &MessageCounters {
        &self.counters
    }

    /// Drop every record and reset the counters.
    pub fn clear(&mut self) {
        self.orders.clear();
        self.trades.clear();
        self.positions.clear();
        self.general.clear();
        self.symbols.clear();
        self.depth.clear();
        self.indices.clear();
        self.counters = MessageCounters::default();
    }
}
