//! Database row types for Diesel.

use diesel::prelude::*;

use super::schema::{fills, order_events};

/// Insertable row for the `fills` table.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = fills)]
pub struct NewFillRow {
    pub timestamp: String,
    pub address: String,
    pub coin: String,
    pub side: String,
    pub size: f64,
    pub price: f64,
    pub direction: Option<String>,
    pub tx_hash: String,
    pub fee: f64,
    pub fee_token: String,
    pub start_position: f64,
    pub closed_pnl: Option<f64>,
}

/// Queryable row for the `fills` table.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = fills)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FillRow {
    pub id: Option<i32>,
    pub timestamp: String,
    pub address: String,
    pub coin: String,
    pub side: String,
    pub size: f64,
    pub price: f64,
    pub direction: Option<String>,
    pub tx_hash: String,
    pub fee: f64,
    pub fee_token: String,
    pub start_position: f64,
    pub closed_pnl: Option<f64>,
    pub created_at: String,
}

/// Insertable row for the `order_events` table.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = order_events)]
pub struct NewOrderEventRow {
    pub timestamp: String,
    pub address: String,
    pub coin: String,
    pub action: String,
    pub side: String,
    pub size: f64,
    pub price: f64,
    pub order_id: i64,
}

/// Queryable row for the `order_events` table.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = order_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderEventRow {
    pub id: Option<i32>,
    pub timestamp: String,
    pub address: String,
    pub coin: String,
    pub action: String,
    pub side: String,
    pub size: f64,
    pub price: f64,
    pub order_id: i64,
    pub created_at: String,
}
