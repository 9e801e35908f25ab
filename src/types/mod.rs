//! Request, response, and wire types shared across the crate.
//!
//! ## Organization
//!
//! - [`enums`] — Data types, control actions, connection states
//! - [`envelope`] — The `{ status, data }` REST wrapper
//! - [`messages`] — WebSocket control messages, inbound frames, subscriptions
//!
//! Everything is re-exported at the module root.

pub mod enums;
pub mod envelope;
pub mod messages;

pub use enums::*;
pub use envelope::*;
pub use messages::*;
