//! Upstream exchange port.
//!
//! The monitor only requires a stream of per-address events plus
//! connection-state signals; everything about the wire protocol lives
//! behind this trait. The production implementation is
//! [`crate::adapter::hyperliquid::HyperliquidStream`].

use async_trait::async_trait;

use crate::domain::{Address, EventFamily};
use crate::error::TransportError;

/// One raw upstream event, already decoded from the wire but not yet
/// normalized. `payload` holds the family-specific batch (an array of fill
/// or order-update objects) exactly as the upstream reported it.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub address: Address,
    pub family: EventFamily,
    pub payload: serde_json::Value,
}

/// Signals delivered by the upstream stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A batch of raw events for one (address, family) subscription.
    Payload(RawEvent),
    /// Upstream acknowledged a subscription request.
    SubscriptionAck {
        address: Address,
        family: EventFamily,
    },
    /// Connection state changed. `address: None` means the whole transport
    /// dropped; `Some` scopes the signal to a single address's streams.
    Disconnected {
        address: Option<Address>,
        reason: String,
    },
}

/// Long-lived stream of user events from the exchange.
///
/// Implementations own the connection; the monitor drives `connect`,
/// `subscribe`, and `next_event` from a single task. A `None` from
/// `next_event` means the stream ended and the caller should reconnect.
#[async_trait]
pub trait UserEventStream: Send {
    /// Establish (or re-establish) the underlying connection.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Request events for one (address, family) pair.
    async fn subscribe(
        &mut self,
        address: &Address,
        family: EventFamily,
    ) -> Result<(), TransportError>;

    /// Stop receiving events for one (address, family) pair.
    async fn unsubscribe(
        &mut self,
        address: &Address,
        family: EventFamily,
    ) -> Result<(), TransportError>;

    /// Wait for the next stream event. `None` means the stream ended.
    async fn next_event(&mut self) -> Option<StreamEvent>;
}
