//! Local subscription bookkeeping.
//!
//! Tracks which symbols are wanted on which [`DataType`]. Pairs are unique;
//! a data type whose last symbol is removed disappears entirely. The set
//! itself never touches the wire, the session decides whether a change
//! must also be sent as a control message.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{DataType, Subscription};

/// Unique `(symbol, data_type)` pairs, grouped by data type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    by_type: BTreeMap<DataType, BTreeSet<String>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `symbol` on `data_type`. Returns `false` if it already was.
    pub fn add(&mut self, symbol: impl Into<String>, data_type: DataType) -> bool {
        self.by_type.entry(data_type).or_default().insert(symbol.into())
    }

    /// Stop tracking `symbol` on `data_type`, pruning the data type if it
    /// has no symbols left. Returns `false` if the pair was not tracked.
    pub fn remove(&mut self, symbol: &str, data_type: DataType) -> bool {
        let Some(symbols) = self.by_type.get_mut(&data_type) else {
            return false;
        };
        let removed = symbols.remove(symbol);
        if symbols.is_empty() {
            self.by_type.remove(&data_type);
        }
        removed
    }

    /// Merge every symbol of `sub` into the set.
    pub fn extend(&mut self, sub: &Subscription) {
        if sub.symbols.is_empty() {
            return;
        }
        self.by_type
            .entry(sub.data_type)
            .or_default()
            .extend(sub.symbols.iter().cloned());
    }

    pub fn contains(&self, symbol: &str, data_type: DataType) -> bool {
        self.by_type
            .get(&data_type)
            .is_some_and(|s| s.contains(symbol))
    }

    /// Symbols tracked for `data_type`.
    pub fn symbols(&self, data_type: DataType) -> Option<&BTreeSet<String>> {
        self.by_type.get(&data_type)
    }

    /// One [`Subscription`] per tracked data type, in data-type order.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.by_type
            .iter()
            .map(|(dt, symbols)| Subscription {
                symbols: symbols.clone(),
                data_type: *dt,
            })
            .collect()
    }

    /// Tracked data types.
    pub fn data_types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.by_type.keys().copied()
    }

    /// Number of `(symbol, data_type)` pairs.
    pub fn len(&self) -> usize {
        self.by_type.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_type.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_leaves_nothing() {
        let mut set = SubscriptionSet::new();
        assert!(set.add("NSE:SBIN-EQ", DataType::SymbolUpdate));
        assert!(set.remove("NSE:SBIN-EQ", DataType::SymbolUpdate));
        assert!(set.is_empty());
        assert!(set.symbols(DataType::SymbolUpdate).is_none());
        assert!(set.subscriptions().is_empty());
    }

    #[test]
    fn pairs_are_unique() {
        let mut set = SubscriptionSet::new();
        assert!(set.add("A", DataType::DepthUpdate));
        assert!(!set.add("A", DataType::DepthUpdate));
        assert!(set.add("A", DataType::SymbolUpdate));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn removing_one_symbol_keeps_the_rest() {
        let mut set = SubscriptionSet::new();
        set.add("A", DataType::SymbolUpdate);
        set.add("B", DataType::SymbolUpdate);
        set.remove("A", DataType::SymbolUpdate);
        assert!(set.contains("B", DataType::SymbolUpdate));
        assert!(!set.remove("A", DataType::SymbolUpdate));
        assert!(!set.remove("A", DataType::IndexUpdate));
        assert_eq!(set.data_types().collect::<Vec<_>>(), vec![DataType::SymbolUpdate]);
    }

    #[test]
    fn subscriptions_group_by_type() {
        let mut set = SubscriptionSet::new();
        set.extend(&Subscription::new(DataType::IndexUpdate, ["NIFTY", "BANKNIFTY"]));
        set.extend(&Subscription::new(DataType::SymbolUpdate, ["SBIN"]));
        set.extend(&Subscription::new(DataType::DepthUpdate, Vec::<String>::new()));

        let subs = set.subscriptions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].data_type, DataType::SymbolUpdate);
        assert_eq!(subs[1].symbols.len(), 2);
    }
}
