//! Hyperliquid WebSocket message types.

use serde::{Deserialize, Serialize};

use crate::domain::{Address, EventFamily};

/// Wire channel name for an event family.
#[must_use]
pub const fn channel_for(family: EventFamily) -> &'static str {
    match family {
        EventFamily::Fills => "userFills",
        EventFamily::OrderUpdates => "orderUpdates",
    }
}

/// Event family for a wire channel name, if recognized.
#[must_use]
pub fn family_for_channel(channel: &str) -> Option<EventFamily> {
    match channel {
        "userFills" => Some(EventFamily::Fills),
        "orderUpdates" => Some(EventFamily::OrderUpdates),
        _ => None,
    }
}

/// Subscription parameters as the exchange expects them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionParams {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: String,
}

/// Subscribe/unsubscribe request sent to the exchange.
#[derive(Debug, Serialize)]
pub struct SubscribeRequest {
    pub method: &'static str,
    pub subscription: SubscriptionParams,
}

impl SubscribeRequest {
    #[must_use]
    pub fn subscribe(address: &Address, family: EventFamily) -> Self {
        Self {
            method: "subscribe",
            subscription: SubscriptionParams {
                kind: channel_for(family).to_string(),
                user: address.as_str().to_string(),
            },
        }
    }

    #[must_use]
    pub fn unsubscribe(address: &Address, family: EventFamily) -> Self {
        Self {
            method: "unsubscribe",
            subscription: SubscriptionParams {
                kind: channel_for(family).to_string(),
                user: address.as_str().to_string(),
            },
        }
    }
}

/// Messages received from the exchange WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "channel", content = "data")]
pub enum WsMessage {
    #[serde(rename = "subscriptionResponse")]
    SubscriptionResponse(SubscriptionResponseData),

    #[serde(rename = "userFills")]
    UserFills(UserFillsData),

    #[serde(rename = "orderUpdates")]
    OrderUpdates(OrderUpdatesData),

    #[serde(other)]
    Unknown,
}

/// Acknowledgment payload echoing the original request.
#[derive(Debug, Deserialize)]
pub struct SubscriptionResponseData {
    pub method: String,
    pub subscription: SubscriptionParams,
}

/// One batch of fills for a subscribed user.
///
/// The `fills` array is kept as raw JSON; element-level decoding belongs to
/// the normalizer so a malformed element is dropped, not the whole frame.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFillsData {
    pub user: String,
    #[serde(default)]
    pub is_snapshot: bool,
    pub fills: serde_json::Value,
}

/// One batch of order updates for a subscribed user.
#[derive(Debug, Deserialize)]
pub struct OrderUpdatesData {
    pub user: String,
    pub updates: serde_json::Value,
}
