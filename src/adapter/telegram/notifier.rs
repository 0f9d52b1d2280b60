//! Telegram notification sink.
//!
//! Implements [`Notifier`] by queueing trades to a spawned background
//! worker, so the dispatch loop only ever pays a channel send. Message
//! delivery failures are logged by the worker; a closed worker surfaces as
//! [`NotifyError::ChannelClosed`] at the sink boundary.
//!
//! Requires the `telegram` feature to be enabled.

use rust_decimal::Decimal;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::format::format_trade_message;
use crate::domain::Trade;
use crate::error::NotifyError;
use crate::port::Notifier;

/// Configuration for the Telegram notifier.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token obtained from BotFather.
    pub bot_token: String,
    /// Target chat ID for notifications.
    pub chat_id: i64,
    /// Forward every event type; when false only fills are sent.
    pub send_all_events: bool,
    /// USD notional at or above which a trade gets the large-trade alert
    /// prefix. `None` disables escalation.
    pub large_trade_threshold: Option<Decimal>,
}

impl TelegramConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`, plus optionally
    /// `TELEGRAM_SEND_ALL_EVENTS`, `ENABLE_LARGE_TRADE_ALERTS`, and
    /// `LARGE_TRADE_THRESHOLD` (default 10000). Returns `None` if required
    /// variables are missing or invalid.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .and_then(|s| s.parse().ok())?;

        let alerts_enabled = std::env::var("ENABLE_LARGE_TRADE_ALERTS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let large_trade_threshold = if alerts_enabled {
            Some(
                std::env::var("LARGE_TRADE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| Decimal::from(10_000)),
            )
        } else {
            None
        };

        Some(Self {
            bot_token,
            chat_id,
            send_all_events: std::env::var("TELEGRAM_SEND_ALL_EVENTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            large_trade_threshold,
        })
    }
}

/// Telegram notifier that forwards trades to a chat.
pub struct TelegramNotifier {
    /// Channel sender for queuing outbound trades.
    sender: mpsc::UnboundedSender<Trade>,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier and spawn the background worker.
    #[must_use]
    pub fn new(config: TelegramConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(telegram_worker(config, receiver));
        Self { sender }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, trade: &Trade) -> Result<(), NotifyError> {
        self.sender
            .send(trade.clone())
            .map_err(|_| NotifyError::ChannelClosed)
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

/// Background worker that sends Telegram messages.
async fn telegram_worker(config: TelegramConfig, mut receiver: mpsc::UnboundedReceiver<Trade>) {
    let bot = Bot::new(&config.bot_token);
    let chat_id = ChatId(config.chat_id);

    info!(chat_id = config.chat_id, "Telegram notifier started");

    while let Some(trade) = receiver.recv().await {
        let Some(text) = format_trade_message(&trade, &config) else {
            continue;
        };

        if let Err(e) = bot
            .send_message(chat_id, &text)
            .parse_mode(ParseMode::MarkdownV2)
            .await
        {
            error!(error = %e, "Failed to send Telegram message");
        }
    }

    warn!("Telegram notifier worker shutting down");
}
