//! Notification sink port.
//!
//! Every downstream consumer of trades other than storage sits behind
//! [`Notifier`]: the generic user callback, the structured-log printer, and
//! the Telegram forwarder are all variants of the same capability. Failures
//! are returned, logged by the dispatcher, and never stop the pipeline.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::info;

use crate::domain::{Trade, TradeKind};
use crate::error::NotifyError;

/// A downstream consumer of normalized trades.
///
/// `notify` is called from the dispatch loop and should return quickly;
/// sinks doing network I/O are expected to enqueue to a background worker.
pub trait Notifier: Send + Sync {
    /// Handle one trade.
    fn notify(&self, trade: &Trade) -> Result<(), NotifyError>;

    /// Sink name, used in failure logs.
    fn name(&self) -> &'static str;
}

/// User-supplied callback function invoked for each trade.
pub type TradeCallback = Box<dyn Fn(&Trade) + Send + Sync>;

/// Notifier wrapping a user-supplied callback.
///
/// A panic inside the callback is caught and surfaced as a
/// [`NotifyError::CallbackPanicked`] so a misbehaving callback can never
/// take the dispatch loop down.
pub struct CallbackNotifier {
    callback: TradeCallback,
}

impl CallbackNotifier {
    pub fn new(callback: impl Fn(&Trade) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl Notifier for CallbackNotifier {
    fn notify(&self, trade: &Trade) -> Result<(), NotifyError> {
        catch_unwind(AssertUnwindSafe(|| (self.callback)(trade))).map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            NotifyError::CallbackPanicked(message)
        })
    }

    fn name(&self) -> &'static str {
        "callback"
    }
}

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _trade: &Trade) -> Result<(), NotifyError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// A logging notifier that prints trades via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, trade: &Trade) -> Result<(), NotifyError> {
        match trade.kind() {
            TradeKind::Fill {
                direction,
                tx_hash,
                closed_pnl,
                ..
            } => {
                info!(
                    address = %trade.address(),
                    coin = %trade.coin(),
                    side = %trade.side(),
                    size = %trade.size(),
                    price = %trade.price(),
                    direction = direction.as_deref().unwrap_or("-"),
                    tx_hash = %tx_hash,
                    closed_pnl = ?closed_pnl,
                    "Fill"
                );
            }
            TradeKind::Order { action, order_id } => {
                info!(
                    address = %trade.address(),
                    coin = %trade.coin(),
                    side = %trade.side(),
                    size = %trade.size(),
                    price = %trade.price(),
                    action = %action,
                    order_id = order_id,
                    "Order update"
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
