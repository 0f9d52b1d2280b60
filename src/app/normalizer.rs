//! Event normalization.
//!
//! Pure translation of raw upstream payloads into canonical [`Trade`]
//! records. No state, no I/O: a payload either yields trades or fails with
//! an [`EventError`] the dispatcher logs and drops.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{Address, EventFamily, OrderAction, Side, Trade, TradeKind};
use crate::error::EventError;
use crate::port::RawEvent;

/// Fill element as reported on the `userFills` channel.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FillPayload {
    time: i64,
    coin: String,
    side: String,
    sz: String,
    px: String,
    #[serde(default)]
    dir: Option<String>,
    hash: String,
    fee: String,
    fee_token: String,
    start_position: String,
    #[serde(default)]
    closed_pnl: Option<String>,
}

/// Order update element as reported on the `orderUpdates` channel.
///
/// Exactly one of `placed`/`canceled` is present; the key selects the
/// action.
#[derive(Debug, Deserialize)]
struct OrderUpdatePayload {
    time: i64,
    coin: String,
    #[serde(default)]
    placed: Option<OrderDetails>,
    #[serde(default)]
    canceled: Option<OrderDetails>,
}

#[derive(Debug, Deserialize)]
struct OrderDetails {
    oid: u64,
    side: String,
    sz: String,
    px: String,
}

/// Translate one raw upstream event into zero or more trades.
///
/// The payload is a batch (both upstream channels deliver arrays); each
/// element yields exactly one trade. Any malformed element fails the whole
/// batch: partial trust in a corrupt frame is worse than dropping it.
pub fn normalize(event: &RawEvent) -> Result<Vec<Trade>, EventError> {
    match event.family {
        EventFamily::Fills => normalize_fills(&event.address, &event.payload),
        EventFamily::OrderUpdates => normalize_order_updates(&event.address, &event.payload),
    }
}

fn normalize_fills(
    address: &Address,
    payload: &serde_json::Value,
) -> Result<Vec<Trade>, EventError> {
    let fills: Vec<FillPayload> =
        serde_json::from_value(payload.clone()).map_err(|e| EventError::Shape {
            family: "fills",
            reason: e.to_string(),
        })?;

    fills
        .into_iter()
        .map(|fill| fill_trade(address, fill))
        .collect()
}

fn fill_trade(address: &Address, fill: FillPayload) -> Result<Trade, EventError> {
    let closed_pnl = match fill.closed_pnl.as_deref() {
        None => None,
        Some(raw) => {
            let pnl = parse_decimal("closedPnl", raw)?;
            // Zero means the fill did not close a position.
            (!pnl.is_zero()).then_some(pnl)
        }
    };

    Trade::new(
        parse_timestamp(fill.time)?,
        address.clone(),
        fill.coin,
        parse_side(&fill.side)?,
        parse_decimal("sz", &fill.sz)?,
        parse_decimal("px", &fill.px)?,
        TradeKind::Fill {
            direction: fill.dir,
            tx_hash: fill.hash,
            fee: parse_decimal("fee", &fill.fee)?,
            fee_token: fill.fee_token,
            start_position: parse_decimal("startPosition", &fill.start_position)?,
            closed_pnl,
        },
    )
}

fn normalize_order_updates(
    address: &Address,
    payload: &serde_json::Value,
) -> Result<Vec<Trade>, EventError> {
    let updates: Vec<OrderUpdatePayload> =
        serde_json::from_value(payload.clone()).map_err(|e| EventError::Shape {
            family: "order updates",
            reason: e.to_string(),
        })?;

    updates
        .into_iter()
        .map(|update| order_trade(address, update))
        .collect()
}

fn order_trade(address: &Address, update: OrderUpdatePayload) -> Result<Trade, EventError> {
    let (action, details) = match (update.placed, update.canceled) {
        (Some(details), None) => (OrderAction::Placed, details),
        (None, Some(details)) => (OrderAction::Cancelled, details),
        _ => return Err(EventError::MissingOrderAction),
    };

    Trade::new(
        parse_timestamp(update.time)?,
        address.clone(),
        update.coin,
        parse_side(&details.side)?,
        parse_decimal("sz", &details.sz)?,
        parse_decimal("px", &details.px)?,
        TradeKind::Order {
            action,
            order_id: details.oid,
        },
    )
}

fn parse_timestamp(millis: i64) -> Result<DateTime<Utc>, EventError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(EventError::Timestamp(millis))
}

fn parse_side(raw: &str) -> Result<Side, EventError> {
    match raw {
        "A" => Ok(Side::Buy),
        "B" => Ok(Side::Sell),
        other => Err(EventError::Field {
            field: "side",
            reason: format!("expected \"A\" or \"B\", got \"{other}\""),
        }),
    }
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, EventError> {
    raw.parse::<Decimal>().map_err(|e| EventError::Field {
        field,
        reason: e.to_string(),
    })
}
