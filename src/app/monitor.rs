//! Monitor lifecycle and the dispatch loop.
//!
//! [`Monitor`] is the owned context for one monitoring instance: it holds
//! the upstream stream, the subscription set, and the dispatcher, and is
//! driven by a single task inside [`Monitor::run`]. There is no ambient
//! singleton; everything the loop touches is owned here.
//!
//! `run` consumes the monitor, so a second start of the same instance is
//! rejected at compile time. Stopping is done through a [`MonitorHandle`],
//! which may be used from any task; the loop observes the stop command at
//! the next iteration boundary, lets in-flight sink calls finish, closes
//! every subscription, and drops the storage handle on return.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use super::dispatch::Dispatcher;
use super::subscriptions::SubscriptionSet;
use crate::config::{MonitorConfig, ReconnectConfig};
use crate::domain::{Address, EventFamily};
use crate::error::{ConfigError, Result, TransportError};
use crate::port::{Notifier, StreamEvent, TradeStore, UserEventStream};

/// Control messages for a running monitor.
#[derive(Debug)]
enum Command {
    Stop,
    SetAddresses(Vec<Address>),
}

/// Clonable control handle for a running monitor.
///
/// Safe to use from any task. Commands sent after the monitor stopped are
/// silently ignored.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl MonitorHandle {
    /// Ask the monitor to stop after the event currently being processed.
    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }

    /// Replace the monitored address list while running. Removed addresses
    /// are closed immediately; new addresses are subscribed.
    pub fn set_addresses(&self, addresses: Vec<Address>) {
        let _ = self.tx.send(Command::SetAddresses(addresses));
    }
}

/// Exponential backoff state for reconnection attempts.
struct Backoff {
    config: ReconnectConfig,
    current_ms: u64,
}

impl Backoff {
    fn new(config: ReconnectConfig) -> Self {
        let current_ms = config.initial_delay_ms;
        Self { config, current_ms }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_millis(self.current_ms);
        let next = (self.current_ms as f64 * self.config.backoff_multiplier) as u64;
        self.current_ms = next.min(self.config.max_delay_ms);
        delay
    }
}

/// The monitor: lifecycle controller plus the serialized dispatch loop.
pub struct Monitor<S: UserEventStream> {
    stream: S,
    dispatcher: Dispatcher,
    subscriptions: SubscriptionSet,
    reconnect: ReconnectConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    handle_tx: mpsc::UnboundedSender<Command>,
}

impl<S: UserEventStream> Monitor<S> {
    /// Build a monitor, validating the configuration before any I/O.
    ///
    /// Fails with [`ConfigError`] if the address list is empty or malformed,
    /// or if silent mode is requested without a storage sink.
    pub fn new(
        config: &MonitorConfig,
        stream: S,
        store: Option<Box<dyn TradeStore>>,
        notifiers: Vec<Box<dyn Notifier>>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let dispatcher = Dispatcher::new(store, notifiers, config.silent);
        if config.silent && !dispatcher.has_store() {
            return Err(ConfigError::SilentWithoutStorage);
        }

        let (handle_tx, commands) = mpsc::unbounded_channel();

        Ok(Self {
            stream,
            dispatcher,
            subscriptions: SubscriptionSet::new(&config.addresses),
            reconnect: config.reconnect.clone(),
            commands,
            handle_tx,
        })
    }

    /// Control handle for this monitor.
    #[must_use]
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            tx: self.handle_tx.clone(),
        }
    }

    /// Run the monitor until stopped.
    ///
    /// Connects, opens every subscription, then serializes event handling:
    /// one raw event is fully processed (normalized and delivered to every
    /// sink) before the next one is read. Stop commands take priority over
    /// pending stream events.
    pub async fn run(mut self) -> Result<()> {
        info!(
            addresses = self.subscriptions.addresses().len(),
            subscriptions = self.subscriptions.len(),
            "Monitor starting"
        );

        if !self.establish().await {
            self.shutdown();
            return Ok(());
        }

        loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => match cmd {
                    None | Some(Command::Stop) => break,
                    Some(Command::SetAddresses(addresses)) => {
                        self.reconcile(addresses).await;
                    }
                },

                event = self.stream.next_event() => match event {
                    Some(StreamEvent::Payload(raw)) => self.dispatcher.dispatch(&raw),
                    Some(StreamEvent::SubscriptionAck { address, family }) => {
                        self.subscriptions.acknowledge(&address, family);
                    }
                    Some(StreamEvent::Disconnected { address: Some(address), reason }) => {
                        warn!(address = %address, reason = %reason, "Subscription disconnected");
                        self.subscriptions.disconnect(Some(&address));
                        self.resubscribe_disconnected().await;
                    }
                    Some(StreamEvent::Disconnected { address: None, reason }) => {
                        warn!(reason = %reason, "Transport disconnected");
                        self.subscriptions.disconnect(None);
                        if !self.establish().await {
                            self.shutdown();
                            return Ok(());
                        }
                    }
                    None => {
                        warn!("Event stream ended");
                        self.subscriptions.disconnect(None);
                        if !self.establish().await {
                            self.shutdown();
                            return Ok(());
                        }
                    }
                },
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Connect and open every non-closed subscription, retrying with
    /// exponential backoff until connected or stopped. Returns false when a
    /// stop command arrived while reconnecting.
    async fn establish(&mut self) -> bool {
        let mut backoff = Backoff::new(self.reconnect.clone());

        loop {
            match self.try_establish().await {
                Ok(()) => return true,
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Connection attempt failed, retrying"
                    );

                    tokio::select! {
                        biased;

                        cmd = self.commands.recv() => match cmd {
                            None | Some(Command::Stop) => return false,
                            Some(Command::SetAddresses(addresses)) => {
                                // Offline: reconcile state only, subscriptions
                                // are requested on the next successful connect.
                                self.subscriptions.set_addresses(&addresses);
                            }
                        },

                        () = sleep(delay) => {}
                    }
                }
            }
        }
    }

    async fn try_establish(&mut self) -> std::result::Result<(), TransportError> {
        self.stream.connect().await?;
        for (address, family) in self.subscriptions.open() {
            self.stream.subscribe(&address, family).await?;
        }
        Ok(())
    }

    async fn resubscribe_disconnected(&mut self) {
        for (address, family) in self.subscriptions.disconnected() {
            if let Err(e) = self.stream.subscribe(&address, family).await {
                warn!(
                    address = %address,
                    family = %family,
                    error = %e,
                    "Resubscription failed"
                );
            }
        }
    }

    async fn reconcile(&mut self, addresses: Vec<Address>) {
        let diff = self.subscriptions.set_addresses(&addresses);

        for address in &diff.removed {
            for family in EventFamily::ALL {
                if let Err(e) = self.stream.unsubscribe(address, family).await {
                    warn!(address = %address, family = %family, error = %e, "Unsubscribe failed");
                }
            }
        }
        for address in &diff.added {
            for family in EventFamily::ALL {
                if let Err(e) = self.stream.subscribe(address, family).await {
                    warn!(address = %address, family = %family, error = %e, "Subscribe failed");
                }
            }
        }
    }

    fn shutdown(&mut self) {
        self.subscriptions.close_all();
        info!("Monitor stopped");
        // The storage handle is owned by the dispatcher and closes when the
        // monitor is dropped.
    }
}
