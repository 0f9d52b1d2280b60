//! Application layer: normalization, subscription management, dispatch,
//! and the monitor lifecycle.

pub mod dispatch;
pub mod monitor;
pub mod normalizer;
pub mod subscriptions;

pub use dispatch::Dispatcher;
pub use monitor::{Monitor, MonitorHandle};
pub use subscriptions::{AddressDiff, SubscriptionSet};
