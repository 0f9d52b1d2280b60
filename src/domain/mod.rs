//! Domain value types. Depend on nothing outside `error`.

pub mod address;
pub mod subscription;
pub mod trade;

pub use address::Address;
pub use subscription::{EventFamily, Subscription, SubscriptionState};
pub use trade::{OrderAction, Side, Trade, TradeKind};
