//! Canonical trade records.
//!
//! Every upstream event the pipeline accepts is normalized into a [`Trade`]:
//! a timestamped, per-address record of either an executed fill or an order
//! lifecycle event. The type-conditional fields live in [`TradeKind`], so a
//! fill carrying an order id (or an order event carrying a transaction hash)
//! is unrepresentable rather than merely invalid.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::address::Address;
use crate::error::EventError;

/// Side of a trade or resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Canonical uppercase label, used for storage and display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle action of an order event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    Placed,
    Cancelled,
}

impl OrderAction {
    /// Canonical lowercase label, used as the `action` storage column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-conditional payload of a [`Trade`].
#[derive(Debug, Clone, PartialEq)]
pub enum TradeKind {
    /// An executed trade affecting a position.
    Fill {
        /// Position-change descriptor as reported upstream ("Open Long",
        /// "Close Short", ...). Opaque presentation data.
        direction: Option<String>,
        /// Transaction hash of the fill.
        tx_hash: String,
        /// Fee paid, denominated in `fee_token`.
        fee: Decimal,
        /// Token the fee was paid in.
        fee_token: String,
        /// Position size before this fill.
        start_position: Decimal,
        /// Realized PnL; `None` when the fill did not close a position.
        closed_pnl: Option<Decimal>,
    },
    /// A placement or cancellation of a resting order. No execution implied.
    Order {
        action: OrderAction,
        order_id: u64,
    },
}

impl TradeKind {
    /// Short label for logging and notification titles.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fill { .. } => "FILL",
            Self::Order {
                action: OrderAction::Placed,
                ..
            } => "ORDER_PLACED",
            Self::Order {
                action: OrderAction::Cancelled,
                ..
            } => "ORDER_CANCELLED",
        }
    }
}

/// A normalized trading event for one monitored address.
///
/// Immutable after construction: produced once by the normalizer, then
/// read-only for every downstream sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    timestamp: DateTime<Utc>,
    address: Address,
    coin: String,
    side: Side,
    size: Decimal,
    price: Decimal,
    kind: TradeKind,
}

impl Trade {
    /// Create a new trade, enforcing strictly positive size and price.
    pub fn new(
        timestamp: DateTime<Utc>,
        address: Address,
        coin: impl Into<String>,
        side: Side,
        size: Decimal,
        price: Decimal,
        kind: TradeKind,
    ) -> Result<Self, EventError> {
        if size <= Decimal::ZERO {
            return Err(EventError::Field {
                field: "size",
                reason: format!("must be strictly positive, got {size}"),
            });
        }
        if price <= Decimal::ZERO {
            return Err(EventError::Field {
                field: "price",
                reason: format!("must be strictly positive, got {price}"),
            });
        }

        Ok(Self {
            timestamp,
            address,
            coin: coin.into(),
            side,
            size,
            price,
            kind,
        })
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    #[must_use]
    pub fn coin(&self) -> &str {
        &self.coin
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.size
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn kind(&self) -> &TradeKind {
        &self.kind
    }

    /// Whether this record is an executed fill.
    #[must_use]
    pub const fn is_fill(&self) -> bool {
        matches!(self.kind, TradeKind::Fill { .. })
    }

    /// Transaction hash, present only for fills.
    #[must_use]
    pub fn tx_hash(&self) -> Option<&str> {
        match &self.kind {
            TradeKind::Fill { tx_hash, .. } => Some(tx_hash),
            TradeKind::Order { .. } => None,
        }
    }

    /// Order id, present only for order events.
    #[must_use]
    pub const fn order_id(&self) -> Option<u64> {
        match self.kind {
            TradeKind::Order { order_id, .. } => Some(order_id),
            TradeKind::Fill { .. } => None,
        }
    }

    /// Estimated USD notional (size x price).
    #[must_use]
    pub fn usd_value(&self) -> Decimal {
        self.size * self.price
    }
}
