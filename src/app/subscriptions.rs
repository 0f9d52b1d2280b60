//! Subscription set management.
//!
//! Owns one [`Subscription`] per monitored (address, family) pair and
//! applies liveness transitions driven by the monitor loop. The set never
//! silently drops an address: only an explicit stop or an address-list
//! change closes subscriptions.

use tracing::{debug, info};

use crate::domain::{Address, EventFamily, Subscription, SubscriptionState};

/// Result of reconciling the monitored address list.
#[derive(Debug, Default)]
pub struct AddressDiff {
    /// Addresses newly added (their subscriptions are now `Pending`).
    pub added: Vec<Address>,
    /// Addresses removed (their subscriptions moved to `Closed`).
    pub removed: Vec<Address>,
}

/// The set of live subscriptions for one monitor instance.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subs: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create a set with one pending subscription per (address, family).
    #[must_use]
    pub fn new(addresses: &[Address]) -> Self {
        let subs = addresses
            .iter()
            .flat_map(|address| {
                EventFamily::ALL
                    .iter()
                    .map(|family| Subscription::new(address.clone(), *family))
            })
            .collect();
        Self { subs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subs.iter()
    }

    /// Distinct monitored addresses, in subscription order.
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = Vec::new();
        for sub in &self.subs {
            if !addresses.contains(sub.address()) {
                addresses.push(sub.address().clone());
            }
        }
        addresses
    }

    /// State of one subscription, if it exists.
    #[must_use]
    pub fn state_of(&self, address: &Address, family: EventFamily) -> Option<SubscriptionState> {
        self.subs
            .iter()
            .find(|s| s.address() == address && s.family() == family)
            .map(Subscription::state)
    }

    /// Upstream acknowledged one subscription.
    pub fn acknowledge(&mut self, address: &Address, family: EventFamily) {
        for sub in &mut self.subs {
            if sub.address() == address && sub.family() == family {
                sub.acknowledge();
                debug!(address = %address, family = %family, "Subscription active");
            }
        }
    }

    /// Mark subscriptions disconnected: all of them, or only one address's.
    pub fn disconnect(&mut self, scope: Option<&Address>) {
        for sub in &mut self.subs {
            if scope.is_none() || scope == Some(sub.address()) {
                sub.disconnect();
            }
        }
    }

    /// Subscriptions awaiting resubscription.
    #[must_use]
    pub fn disconnected(&self) -> Vec<(Address, EventFamily)> {
        self.subs
            .iter()
            .filter(|s| s.state() == SubscriptionState::Disconnected)
            .map(|s| (s.address().clone(), s.family()))
            .collect()
    }

    /// Subscriptions that still need an upstream request after a fresh
    /// connection (everything not closed).
    #[must_use]
    pub fn open(&self) -> Vec<(Address, EventFamily)> {
        self.subs
            .iter()
            .filter(|s| s.state() != SubscriptionState::Closed)
            .map(|s| (s.address().clone(), s.family()))
            .collect()
    }

    /// Reconcile the monitored address list while running.
    ///
    /// Removed addresses go straight to `Closed` and leave the set; new
    /// addresses enter as `Pending`. Unchanged subscriptions keep their
    /// state.
    pub fn set_addresses(&mut self, addresses: &[Address]) -> AddressDiff {
        let mut diff = AddressDiff::default();

        for sub in &mut self.subs {
            if !addresses.contains(sub.address()) {
                sub.close();
                if !diff.removed.contains(sub.address()) {
                    diff.removed.push(sub.address().clone());
                }
            }
        }
        self.subs
            .retain(|s| s.state() != SubscriptionState::Closed);

        let existing = self.addresses();
        for address in addresses {
            if !existing.contains(address) {
                for family in EventFamily::ALL {
                    self.subs.push(Subscription::new(address.clone(), family));
                }
                diff.added.push(address.clone());
            }
        }

        if !diff.added.is_empty() || !diff.removed.is_empty() {
            info!(
                added = diff.added.len(),
                removed = diff.removed.len(),
                "Address list reconciled"
            );
        }
        diff
    }

    /// Terminal transition for every subscription.
    pub fn close_all(&mut self) {
        for sub in &mut self.subs {
            sub.close();
        }
    }
}
