//! Storage sink port.

use crate::domain::Trade;
use crate::error::StorageError;

/// Append-only, idempotent persistence for normalized trades.
///
/// Implementations must treat redelivery of the same upstream event as a
/// no-op: fills are keyed by (address, tx_hash), order events by
/// (address, order_id, action, timestamp). Writes are expected to be local
/// and fast; the dispatch loop calls `record` inline.
pub trait TradeStore: Send + Sync {
    /// Persist one trade. Recording an already-stored trade succeeds
    /// without creating a duplicate row.
    fn record(&self, trade: &Trade) -> Result<(), StorageError>;
}
