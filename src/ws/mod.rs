//! WebSocket modules for live data.
//!
//! ## [`session`] — Data stream session
//!
//! Prepares the server-side session over HTTP, opens one socket to the data
//! stream, and manages `{ action, symbols, data_type }` subscriptions for
//! symbol, depth, and index updates as well as account events. Every frame
//! is merged into a shared [`Reconciler`](crate::live::Reconciler).
//!
//! ## [`order_stream`] — Order-event stream
//!
//! A second endpoint subscribed once with `{ action, event_types }`.
//! Implements [`futures_util::Stream`].
//!
//! ## [`subscriptions`] — Local subscription set
//!
//! Pure bookkeeping of `(symbol, data_type)` pairs shared by both.
//!
//! Neither stream reconnects on its own: every failure is surfaced and left
//! for the caller to act on.

pub mod order_stream;
pub mod session;
pub mod subscriptions;
