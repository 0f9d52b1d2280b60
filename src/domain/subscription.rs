//! Subscription liveness tracking.
//!
//! One [`Subscription`] exists per monitored (address, event family) pair.
//! The state machine is deliberately small: `Closed` is terminal and is never
//! re-entered, and no transition ever drops an address.

use std::fmt;

use super::address::Address;

/// Upstream event family a subscription covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    /// Executed trades (`userFills` channel).
    Fills,
    /// Order placements and cancellations (`orderUpdates` channel).
    OrderUpdates,
}

impl EventFamily {
    /// Both families, in subscription order.
    pub const ALL: [Self; 2] = [Self::Fills, Self::OrderUpdates];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fills => "fills",
            Self::OrderUpdates => "order-updates",
        }
    }
}

impl fmt::Display for EventFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness state of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Opened, waiting for the first upstream acknowledgment.
    Pending,
    /// Acknowledged and delivering events.
    Active,
    /// Transport reported a disconnect; resubscription will be attempted
    /// with the same parameters.
    Disconnected,
    /// Explicitly stopped. Terminal.
    Closed,
}

/// One logical (address, family) stream handle into the upstream collaborator.
#[derive(Debug, Clone)]
pub struct Subscription {
    address: Address,
    family: EventFamily,
    state: SubscriptionState,
}

impl Subscription {
    /// Create a subscription in the `Pending` state.
    #[must_use]
    pub const fn new(address: Address, family: EventFamily) -> Self {
        Self {
            address,
            family,
            state: SubscriptionState::Pending,
        }
    }

    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    #[must_use]
    pub const fn family(&self) -> EventFamily {
        self.family
    }

    #[must_use]
    pub const fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Upstream acknowledged the subscription: `Pending`/`Disconnected`
    /// become `Active`. `Closed` stays closed.
    pub fn acknowledge(&mut self) {
        match self.state {
            SubscriptionState::Pending | SubscriptionState::Disconnected => {
                self.state = SubscriptionState::Active;
            }
            SubscriptionState::Active | SubscriptionState::Closed => {}
        }
    }

    /// Transport-level disconnect signal. `Closed` stays closed.
    pub fn disconnect(&mut self) {
        if self.state != SubscriptionState::Closed {
            self.state = SubscriptionState::Disconnected;
        }
    }

    /// Explicit stop. Terminal.
    pub fn close(&mut self) {
        self.state = SubscriptionState::Closed;
    }
}
