//! Live fill and order monitoring for Hyperliquid addresses.
//!
//! # Overview
//!
//! Hyperwatch subscribes to the exchange's user-event streams (fills and
//! order updates) for a configured set of addresses, normalizes both event
//! families into one canonical [`Trade`](domain::Trade) record, and fans
//! each record out to a SQLite store and optional notification sinks (a
//! user callback, a Telegram chat) while tolerating transient connection
//! loss to the upstream WebSocket.
//!
//! The crate follows a ports-and-adapters layout:
//!
//! - [`domain`] - value types: trades, addresses, subscription state
//! - [`port`] - trait seams: the upstream stream, storage, notifiers
//! - [`adapter`] - the Hyperliquid WebSocket, SQLite, and Telegram bindings
//! - [`app`] - the normalizer, dispatcher, and monitor lifecycle
//!
//! # Usage
//!
//! ```ignore
//! let config = MonitorConfig::from_env();
//! let stream = HyperliquidStream::new(config.network);
//! let store = SqliteTradeStore::open(Path::new("trades.db"))?;
//! let monitor = Monitor::new(&config, stream, Some(Box::new(store)), vec![
//!     Box::new(LogNotifier),
//! ])?;
//! let handle = monitor.handle();
//! tokio::spawn(async move { handle_signals(handle).await });
//! monitor.run().await?;
//! ```

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use app::{Monitor, MonitorHandle};
pub use config::{MonitorConfig, Network};
pub use domain::{Address, OrderAction, Side, Trade, TradeKind};
pub use error::{Error, Result};
