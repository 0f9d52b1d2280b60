//! Message formatting for Telegram notifications.

use super::notifier::TelegramConfig;
use crate::domain::{Side, Trade, TradeKind};

/// Format a trade into a Telegram message, or None if the policy filter
/// skips it (non-fill events when `send_all_events` is off).
#[must_use]
pub fn format_trade_message(trade: &Trade, config: &TelegramConfig) -> Option<String> {
    if !config.send_all_events && !trade.is_fill() {
        return None;
    }

    let usd_value = trade.usd_value();
    let side_emoji = match trade.side() {
        Side::Buy => "🟢",
        Side::Sell => "🔴",
    };

    let mut msg = String::new();

    // Escalation is additive: the alert line is prepended, normal delivery
    // is never suppressed.
    if let Some(threshold) = config.large_trade_threshold {
        if trade.is_fill() && usd_value >= threshold {
            msg.push_str(&format!(
                "🚨 *Large trade detected: `${usd_value:.2}`*\n\n"
            ));
        }
    }

    msg.push_str(&format!(
        "{} *{}: {} {}*\n\
        \n\
        👤 `{}`\n\
        📏 Size: `{:.4}`\n\
        💲 Price: `${:.2}`\n\
        💵 Value: `${:.2}`",
        side_emoji,
        escape_markdown(trade.kind().label()),
        escape_markdown(trade.coin()),
        trade.side(),
        escape_markdown(trade.address().as_str()),
        trade.size(),
        trade.price(),
        usd_value,
    ));

    match trade.kind() {
        TradeKind::Fill {
            direction,
            tx_hash,
            fee,
            fee_token,
            closed_pnl,
            ..
        } => {
            msg.push_str(&format!(
                "\n🧾 Fee: `{:.6} {}`",
                fee,
                escape_markdown(fee_token)
            ));
            if let Some(pnl) = closed_pnl {
                msg.push_str(&format!("\n💰 Closed PnL: `${pnl:.2}`"));
            }
            if let Some(dir) = direction {
                msg.push_str(&format!("\n↕️ {}", escape_markdown(dir)));
            }
            msg.push_str(&format!(
                "\n🔗 [View](https://hyperliquid.xyz/transactions/{})",
                escape_markdown(tx_hash)
            ));
        }
        TradeKind::Order { order_id, .. } => {
            msg.push_str(&format!("\n🆔 Order: `{order_id}`"));
        }
    }

    Some(msg)
}

/// Escape special characters for Telegram `MarkdownV2`.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}
