//! Binary to connect to a dashboard backend, subscribe to a few symbols,
//! and print the reconciled live state for inspection.
//!
//! # Usage
//!
//! ```sh
//! export LIVEDESK_BASE_URL="http://127.0.0.1:8001"   # optional
//! cargo run --bin live_check --features cli -- NSE:SBIN-EQ NSE:NIFTY50-INDEX
//! ```

use std::env;
use std::time::Duration;

use livedesk::config::SessionConfig;
use livedesk::types::{ConnectionState, DataType, Subscription};
use livedesk::ws::session::LiveSessionBuilder;
use tokio::time;

const LISTEN_SECS: u64 = 10;

#[tokio::main]
async fn main() -> livedesk::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut symbols: Vec<String> = env::args().skip(1).collect();
    if symbols.is_empty() {
        symbols.push("NSE:SBIN-EQ".to_owned());
    }

    let config = SessionConfig::from_env()?;
    println!("Preparing session at {}…", config.base_url);
    let mut session = LiveSessionBuilder::from_config(config).build()?;
    let mut status = session.watch_status();

    if let Err(e) = session.connect().await {
        eprintln!("Handshake failed: {e}");
        return Err(e);
    }

    let subs = [
        Subscription::new(DataType::SymbolUpdate, symbols.iter().cloned()),
        Subscription::new(DataType::DepthUpdate, symbols.iter().cloned()),
    ];
    println!("Subscribing to {} symbol(s)…", symbols.len());
    session.start(&subs).await?;

    println!("Listening for {LISTEN_SECS} seconds…\n");
    let mut updates = session.subscribe_updates();
    let deadline = time::sleep(Duration::from_secs(LISTEN_SECS));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                println!("\n{LISTEN_SECS} seconds elapsed, stopping…");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = status.borrow_and_update().clone();
                println!("[status] {} {}", s.state, s.detail.unwrap_or_default());
                if s.state != ConnectionState::Streaming {
                    break;
                }
            }
            update = updates.recv() => {
                match update {
                    Ok(applied) => println!("{applied:?}"),
                    Err(e) => eprintln!("Update channel: {e}"),
                }
            }
        }
    }

    {
        let rec = session.reconciler();
        let rec = rec.lock().await;
        println!("\nLatest symbol values:");
        for (symbol, value) in rec.symbols().iter() {
            println!("  {symbol}: {value}");
        }
        println!("Counters:");
        for (data_type, n) in rec.counters().iter() {
            println!("  {data_type}: {n}");
        }
        println!("  dropped: {}", rec.counters().dropped());
    }

    session.disconnect().await?;
    println!("Done.");

    Ok(())
}
