//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the extension points of the monitor: the upstream exchange
//! stream, the storage sink, and the notification sinks. Adapters implement
//! them to integrate with the real exchange, SQLite, and Telegram.

pub mod exchange;
pub mod notifier;
pub mod store;

pub use exchange::{RawEvent, StreamEvent, UserEventStream};
pub use notifier::{CallbackNotifier, LogNotifier, Notifier, NullNotifier, TradeCallback};
pub use store::TradeStore;
