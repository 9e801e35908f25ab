//! Client-side live state.
//!
//! [`collection`] holds the two generic containers (a capped, key-deduped
//! event log and a latest-value-per-key map); [`reconciler`] routes inbound
//! frames into them.

pub mod collection;
pub mod reconciler;

pub use collection::{BoundedLog, KeyFn, LatestMap, Upsert};
pub use reconciler::{Applied, MessageCounters, Reconciler};
