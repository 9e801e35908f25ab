//! REST endpoint implementations.
//!
//! Each sub-module adds `async` methods to
//! [`BackendClient`](crate::client::BackendClient) via `impl` blocks.
//!
//! | Module | Description |
//! |---|---|
//! | [`session`] | Prepare a server-side streaming session |
//! | [`snapshot`] | Fetch enveloped record lists for polling |

pub mod session;
pub mod snapshot;
