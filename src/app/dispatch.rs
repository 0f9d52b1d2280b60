//! Per-event dispatch.
//!
//! One [`Dispatcher`] per monitor instance: it normalizes each raw event
//! and fans the resulting trades out to the storage sink and the
//! notification sinks, with independent failure isolation. The monitor loop
//! calls [`Dispatcher::dispatch`] serially, which is what guarantees the
//! pipeline's total delivery order.

use std::collections::HashSet;

use tracing::{debug, error, warn};

use super::normalizer;
use crate::domain::{OrderAction, Trade, TradeKind};
use crate::port::{Notifier, RawEvent, TradeStore};

/// Natural key of a trade, used to suppress duplicate deliveries after a
/// reconnect replays events. Mirrors the storage UNIQUE indexes.
#[derive(Debug, PartialEq, Eq, Hash)]
enum EventKey {
    Fill {
        address: String,
        tx_hash: String,
    },
    Order {
        address: String,
        order_id: u64,
        action: OrderAction,
        timestamp_ms: i64,
    },
}

impl EventKey {
    fn of(trade: &Trade) -> Self {
        let address = trade.address().as_str().to_string();
        match trade.kind() {
            TradeKind::Fill { tx_hash, .. } => Self::Fill {
                address,
                tx_hash: tx_hash.clone(),
            },
            TradeKind::Order { action, order_id } => Self::Order {
                address,
                order_id: *order_id,
                action: *action,
                timestamp_ms: trade.timestamp().timestamp_millis(),
            },
        }
    }
}

/// Normalizes raw events and delivers trades to the configured sinks.
pub struct Dispatcher {
    store: Option<Box<dyn TradeStore>>,
    notifiers: Vec<Box<dyn Notifier>>,
    silent: bool,
    seen: HashSet<EventKey>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        store: Option<Box<dyn TradeStore>>,
        notifiers: Vec<Box<dyn Notifier>>,
        silent: bool,
    ) -> Self {
        Self {
            store,
            notifiers,
            silent,
            seen: HashSet::new(),
        }
    }

    /// Whether a storage sink is configured.
    #[must_use]
    pub const fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Process one raw event to completion.
    ///
    /// A malformed payload is logged and dropped. Each produced trade is
    /// delivered to the store first, then to every notifier; a failing sink
    /// is logged and never prevents the other sinks (or later events) from
    /// being served.
    pub fn dispatch(&mut self, event: &RawEvent) {
        let trades = match normalizer::normalize(event) {
            Ok(trades) => trades,
            Err(e) => {
                warn!(
                    address = %event.address,
                    family = %event.family,
                    error = %e,
                    "Dropping malformed event"
                );
                return;
            }
        };

        for trade in trades {
            if !self.seen.insert(EventKey::of(&trade)) {
                debug!(
                    address = %trade.address(),
                    kind = trade.kind().label(),
                    "Skipping duplicate event"
                );
                continue;
            }
            self.deliver(&trade);
        }
    }

    fn deliver(&self, trade: &Trade) {
        if let Some(store) = &self.store {
            if let Err(e) = store.record(trade) {
                error!(
                    address = %trade.address(),
                    kind = trade.kind().label(),
                    error = %e,
                    "Storage sink failed"
                );
            }
        }

        if self.silent {
            return;
        }

        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(trade) {
                error!(
                    sink = notifier.name(),
                    address = %trade.address(),
                    error = %e,
                    "Notification sink failed"
                );
            }
        }
    }
}
