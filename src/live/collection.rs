//! Generic live collections.
//!
//! Two shapes cover every stream the backend pushes:
//!
//! - [`BoundedLog`] — newest-first list capped at `N` entries, deduplicated
//!   by an extracted key. A matching key is overwritten **in place** (it
//!   keeps its position); an unmatched entry goes to the front and the list
//!   is truncated from the back, so eviction always drops the
//!   oldest-*inserted* entry, never the oldest-*updated* one.
//! - [`LatestMap`] — one point-in-time value per key, no cap.

use std::collections::{BTreeMap, VecDeque};

/// Extracts the dedupe key from a value. `None` means the value is never
/// merged with another one.
pub type KeyFn<V> = fn(&V) -> Option<String>;

/// What an upsert did to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new entry was added. `evicted` counts entries pushed out by the cap.
    Inserted { evicted: usize },
    /// An existing log entry at `index` was overwritten.
    Updated { index: usize },
    /// An existing map value was overwritten.
    Replaced,
    /// The incoming value equals the stored one.
    Unchanged,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    key: Option<String>,
    value: V,
}

// ---------------------------------------------------------------------------
// BoundedLog
// ---------------------------------------------------------------------------

/// Newest-first, key-deduplicated list with a hard cap.
#[derive(Debug, Clone)]
pub struct BoundedLog<V> {
    entries: VecDeque<Entry<V>>,
    key_of: KeyFn<V>,
    cap: usize,
}

impl<V> BoundedLog<V> {
    /// Create an empty log. A `cap` of zero is raised to one.
    pub fn new(cap: usize, key_of: KeyFn<V>) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap),
            key_of,
            cap,
        }
    }

    /// Merge `value` into the log.
    pub fn upsert(&mut self, value: V) -> Upsert {
        let key = (self.key_of)(&value);

        if let Some(ref k) = key {
            if let Some(index) = self
                .entries
                .iter()
                .position(|e| e.key.as_deref() == Some(k.as_str()))
            {
                self.entries[index].value = value;
                return Upsert::Updated { index };
            }
        }

        self.entries.push_front(Entry { key, value });
        let evicted = self.entries.len().saturating_sub(self.cap);
        self.entries.truncate(self.cap);
        Upsert::Inserted { evicted }
    }

    /// The key `value` would be stored under.
    pub fn key_for(&self, value: &V) -> Option<String> {
        (self.key_of)(value)
    }

    /// Look up an entry by key.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|e| e.key.as_deref() == Some(key))
            .map(|e| &e.value)
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|e| &e.value)
    }

    /// Iterate `(key, value)` pairs newest-first.
    pub fn iter_keyed(&self) -> impl Iterator<Item = (Option<&str>, &V)> {
        self.entries.iter().map(|e| (e.key.as_deref(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<V: Clone> BoundedLog<V> {
    /// Owned copy of the entries, newest-first.
    pub fn to_vec(&self) -> Vec<V> {
        self.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// LatestMap
// ---------------------------------------------------------------------------

/// One latest value per key. Iterates in key order.
#[derive(Debug, Clone)]
pub struct LatestMap<V> {
    records: BTreeMap<String, V>,
}

impl<V> Default for LatestMap<V> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<V: PartialEq> LatestMap<V> {
    /// Overwrite the value stored at `key`.
    pub fn replace(&mut self, key: impl Into<String>, value: V) -> Upsert {
        use std::collections::btree_map::Entry as MapEntry;

        match self.records.entry(key.into()) {
            MapEntry::Vacant(slot) => {
                slot.insert(value);
                Upsert::Inserted { evicted: 0 }
            }
            MapEntry::Occupied(mut slot) => {
                if *slot.get() == value {
                    Upsert::Unchanged
                } else {
                    slot.insert(value);
                    Upsert::Replaced
                }
            }
        }
    }
}

impl<V> LatestMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.records.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        id: Option<&'static str>,
        status: &'static str,
    }

    fn order_id(o: &Order) -> Option<String> {
        o.id.map(str::to_owned)
    }

    fn order(id: &'static str, status: &'static str) -> Order {
        Order {
            id: Some(id),
            status,
        }
    }

    #[test]
    fn update_keeps_position_and_insert_goes_to_front() {
        let mut log = BoundedLog::new(50, order_id);
        assert_eq!(log.upsert(order("A", "PENDING")), Upsert::Inserted { evicted: 0 });
        assert_eq!(log.upsert(order("A", "COMPLETE")), Upsert::Updated { index: 0 });
        assert_eq!(log.upsert(order("B", "PENDING")), Upsert::Inserted { evicted: 0 });

        assert_eq!(log.to_vec(), vec![order("B", "PENDING"), order("A", "COMPLETE")]);
    }

    #[test]
    fn cap_evicts_oldest_inserted_not_oldest_updated() {
        let mut log = BoundedLog::new(3, order_id);
        log.upsert(order("A", "1"));
        log.upsert(order("B", "1"));
        log.upsert(order("C", "1"));
        // A is the oldest insert even though it was just touched.
        log.upsert(order("A", "2"));
        assert_eq!(log.upsert(order("D", "1")), Upsert::Inserted { evicted: 1 });

        let ids: Vec<_> = log.iter().map(|o| o.id.unwrap()).collect();
        assert_eq!(ids, vec!["D", "C", "B"]);
        assert!(log.get("A").is_none());
    }

    #[test]
    fn keyless_entries_never_merge() {
        let mut log = BoundedLog::new(10, order_id);
        let notice = Order {
            id: None,
            status: "market open",
        };
        log.upsert(notice.clone());
        log.upsert(notice);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        let mut log = BoundedLog::new(0, order_id);
        log.upsert(order("A", "x"));
        log.upsert(order("B", "x"));
        assert_eq!(log.cap(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.get("B").unwrap().status, "x");
    }

    #[test]
    fn latest_map_reports_unchanged_values() {
        let mut map = LatestMap::default();
        assert_eq!(map.replace("SBIN", 100), Upsert::Inserted { evicted: 0 });
        assert_eq!(map.replace("SBIN", 100), Upsert::Unchanged);
        assert_eq!(map.replace("SBIN", 101), Upsert::Replaced);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("SBIN"), Some(&101));
    }
}
