//! SQLite trade store implementation.

use std::path::Path;

use diesel::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::model::{NewFillRow, NewOrderEventRow};
use super::schema::{fills, order_events};
use super::{create_pool, run_migrations, DbPool};
use crate::domain::{OrderAction, Trade, TradeKind};
use crate::error::StorageError;
use crate::port::TradeStore;

/// SQLite-backed trade store.
///
/// Inserts use `INSERT OR IGNORE` against the natural-key UNIQUE indexes,
/// so redelivery of the same upstream event is a no-op.
pub struct SqliteTradeStore {
    pool: DbPool,
}

impl SqliteTradeStore {
    /// Open (or create) a database at the given path, creating parent
    /// directories and the schema as needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::from_url(&path.display().to_string(), 5)
    }

    /// Open an in-memory database. Intended for tests.
    pub fn in_memory() -> Result<Self, StorageError> {
        // A second pooled connection would see a different empty database,
        // so the in-memory pool is capped at one connection.
        Self::from_url(":memory:", 1)
    }

    fn from_url(database_url: &str, max_size: u32) -> Result<Self, StorageError> {
        let pool = create_pool(database_url, max_size)?;
        run_migrations(&pool)?;
        Ok(Self { pool })
    }

    /// Access the underlying pool (used by queries and tests).
    #[must_use]
    pub const fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[allow(clippy::too_many_arguments)]
    fn record_fill(
        &self,
        trade: &Trade,
        direction: &Option<String>,
        tx_hash: &str,
        fee: Decimal,
        fee_token: &str,
        start_position: Decimal,
        closed_pnl: Option<Decimal>,
    ) -> Result<(), StorageError> {
        let row = NewFillRow {
            timestamp: trade.timestamp().to_rfc3339(),
            address: trade.address().as_str().to_string(),
            coin: trade.coin().to_string(),
            side: trade.side().as_str().to_string(),
            size: to_f64("size", trade.size())?,
            price: to_f64("price", trade.price())?,
            direction: direction.clone(),
            tx_hash: tx_hash.to_string(),
            fee: to_f64("fee", fee)?,
            fee_token: fee_token.to_string(),
            start_position: to_f64("start_position", start_position)?,
            closed_pnl: closed_pnl.map(|p| to_f64("closed_pnl", p)).transpose()?,
        };

        let mut conn = self
            .pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        diesel::insert_or_ignore_into(fills::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    fn record_order(
        &self,
        trade: &Trade,
        action: OrderAction,
        order_id: u64,
    ) -> Result<(), StorageError> {
        let row = NewOrderEventRow {
            timestamp: trade.timestamp().to_rfc3339(),
            address: trade.address().as_str().to_string(),
            coin: trade.coin().to_string(),
            action: action.as_str().to_string(),
            side: trade.side().as_str().to_string(),
            size: to_f64("size", trade.size())?,
            price: to_f64("price", trade.price())?,
            order_id: i64::try_from(order_id)
                .map_err(|_| StorageError::Database(format!("order id {order_id} overflows")))?,
        };

        let mut conn = self
            .pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        diesel::insert_or_ignore_into(order_events::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }
}

impl TradeStore for SqliteTradeStore {
    fn record(&self, trade: &Trade) -> Result<(), StorageError> {
        match trade.kind() {
            TradeKind::Fill {
                direction,
                tx_hash,
                fee,
                fee_token,
                start_position,
                closed_pnl,
            } => self.record_fill(
                trade,
                direction,
                tx_hash,
                *fee,
                fee_token,
                *start_position,
                *closed_pnl,
            ),
            TradeKind::Order { action, order_id } => self.record_order(trade, *action, *order_id),
        }
    }
}

fn to_f64(field: &'static str, value: Decimal) -> Result<f64, StorageError> {
    value
        .to_f64()
        .ok_or_else(|| StorageError::Database(format!("{field} {value} is not representable")))
}
