use std::path::PathBuf;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use hyperwatch::adapter::hyperliquid::HyperliquidStream;
use hyperwatch::adapter::sqlite::SqliteTradeStore;
#[cfg(feature = "telegram")]
use hyperwatch::adapter::telegram::{TelegramConfig, TelegramNotifier};
use hyperwatch::config::{init_logging, MonitorConfig, Network};
use hyperwatch::domain::Address;
use hyperwatch::port::{LogNotifier, Notifier, TradeStore};
use hyperwatch::Monitor;

/// Live fill and order monitoring for Hyperliquid addresses.
#[derive(Debug, Parser)]
#[command(name = "hyperwatch", version, about)]
struct Cli {
    /// Address to monitor (repeatable). Overrides MONITORED_ADDRESSES.
    #[arg(long = "address", value_name = "ADDRESS")]
    addresses: Vec<String>,

    /// SQLite database path. Overrides DB_PATH.
    #[arg(long, value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Record to storage only; suppress all notification sinks.
    #[arg(long)]
    silent: bool,

    /// Connect to the testnet endpoints.
    #[arg(long)]
    testnet: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = MonitorConfig::from_env();
    if !cli.addresses.is_empty() {
        config.addresses = cli.addresses.iter().map(|s| Address::from(s.as_str())).collect();
    }
    if let Some(db_path) = cli.db_path {
        config.db_path = Some(db_path);
    }
    config.silent |= cli.silent;
    if cli.testnet {
        config.network = Network::Testnet;
    }

    init_logging();
    info!(
        addresses = config.addresses.len(),
        network = config.network.as_str(),
        db = config.db_path.is_some(),
        silent = config.silent,
        "hyperwatch starting"
    );

    let store: Option<Box<dyn TradeStore>> = match &config.db_path {
        Some(path) => match SqliteTradeStore::open(path) {
            Ok(store) => Some(Box::new(store)),
            Err(e) => {
                eprintln!("Failed to open database {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => None,
    };

    let monitor = match Monitor::new(
        &config,
        HyperliquidStream::new(config.network),
        store,
        build_notifiers(),
    ) {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let handle = monitor.handle();
    let mut task = tokio::spawn(monitor.run());

    tokio::select! {
        result = &mut task => {
            if let Err(e) = flatten(result) {
                error!(error = %e, "Fatal error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            handle.stop();
            if let Err(e) = flatten(task.await) {
                error!(error = %e, "Error during shutdown");
                std::process::exit(1);
            }
        }
    }

    info!("hyperwatch stopped");
}

fn build_notifiers() -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];

    #[cfg(feature = "telegram")]
    if let Some(telegram) = TelegramConfig::from_env() {
        info!(chat_id = telegram.chat_id, "Telegram notifications enabled");
        notifiers.push(Box::new(TelegramNotifier::new(telegram)));
    }

    notifiers
}

fn flatten(
    result: std::result::Result<hyperwatch::Result<()>, tokio::task::JoinError>,
) -> hyperwatch::Result<()> {
    match result {
        Ok(inner) => inner,
        Err(e) => {
            error!(error = %e, "Monitor task panicked");
            std::process::exit(1);
        }
    }
}
