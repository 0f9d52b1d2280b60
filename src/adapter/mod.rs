//! Adapters binding the ports to real collaborators: the Hyperliquid
//! WebSocket, SQLite persistence, and Telegram delivery.

pub mod hyperliquid;
pub mod sqlite;
#[cfg(feature = "telegram")]
pub mod telegram;
