//! # livedesk
//!
//! A live-data subscription and reconciliation client for trading dashboard
//! backends.
//!
//! The client prepares a server-side streaming session over HTTP, opens a
//! WebSocket, manages `(symbol, data_type)` subscriptions, and merges
//! tagged JSON frames into bounded, keyed collections that a view can
//! render directly.
//!
//! ## Quick Start
//!
//! ```no_run
//! use livedesk::types::{DataType, Subscription};
//! use livedesk::ws::session::LiveSessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> livedesk::error::Result<()> {
//!     let mut session = LiveSessionBuilder::new().build()?;
//!     session.connect().await?;
//!     session
//!         .start(&[Subscription::new(DataType::SymbolUpdate, ["NSE:SBIN-EQ"])])
//!         .await?;
//!
//!     let rec = session.reconciler();
//!     println!("{:?}", rec.lock().await.symbols().get("NSE:SBIN-EQ"));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod live;
pub mod poll;
pub mod types;
pub mod ws;

/// Re-export the main client types at crate root for convenience.
pub use client::BackendClient;
pub use ws::session::{LiveSession, LiveSessionBuilder};
/// Re-export the error type and Result alias.
pub use error::{LiveDeskError, Result};
