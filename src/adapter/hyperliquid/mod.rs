//! Hyperliquid exchange adapter: WebSocket stream and wire messages.

pub mod messages;
pub mod stream;

pub use stream::HyperliquidStream;
