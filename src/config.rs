//! Monitor configuration.
//!
//! Configuration is environment-driven (with `.env` support via dotenvy at
//! the binary boundary) and validated before any I/O happens. Only
//! [`ConfigError`] is allowed to terminate the process, and only from here.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::domain::Address;
use crate::error::ConfigError;

/// Network the exchange endpoints belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Websocket endpoint for this network.
    #[must_use]
    pub const fn ws_url(self) -> &'static str {
        match self {
            Self::Mainnet => "wss://api.hyperliquid.xyz/ws",
            Self::Testnet => "wss://api.hyperliquid-testnet.xyz/ws",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "MAINNET",
            Self::Testnet => "TESTNET",
        }
    }
}

/// Reconnection backoff parameters.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay_ms: u64,
    /// Upper bound on the backoff delay.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 120_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Top-level monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Addresses to monitor. Required, non-empty.
    pub addresses: Vec<Address>,
    /// SQLite database path. `None` disables persistence.
    pub db_path: Option<PathBuf>,
    /// Suppress notification sinks; record to storage only.
    pub silent: bool,
    /// Which exchange network to connect to.
    pub network: Network,
    /// Reconnection backoff parameters.
    pub reconnect: ReconnectConfig,
}

impl MonitorConfig {
    /// Build a configuration from environment variables.
    ///
    /// Reads `MONITORED_ADDRESSES` (comma-separated), `DB_PATH`,
    /// `SILENT_MODE`, and `TESTNET_MODE`. The result is not yet validated;
    /// call [`MonitorConfig::validate`] (or let `Monitor::new` do it).
    #[must_use]
    pub fn from_env() -> Self {
        let addresses = std::env::var("MONITORED_ADDRESSES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Address::from)
            .collect();

        let network = if env_flag("TESTNET_MODE") {
            Network::Testnet
        } else {
            Network::Mainnet
        };

        Self {
            addresses,
            db_path: std::env::var("DB_PATH").ok().map(PathBuf::from),
            silent: env_flag("SILENT_MODE"),
            network,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Validate the configuration.
    ///
    /// Checks that the address list is non-empty and well-formed, and that
    /// silent mode is not requested without a storage path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addresses.is_empty() {
            return Err(ConfigError::MissingField {
                field: "addresses",
            });
        }

        for address in &self.addresses {
            if let Err(reason) = check_address(address) {
                return Err(ConfigError::InvalidValue {
                    field: "addresses",
                    reason,
                });
            }
        }

        if self.silent && self.db_path.is_none() {
            return Err(ConfigError::SilentWithoutStorage);
        }

        Ok(())
    }
}

/// Parse a boolean environment flag ("true"/"1" enable).
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn check_address(address: &Address) -> Result<(), String> {
    let s = address.as_str();
    let Some(hex) = s.strip_prefix("0x") else {
        return Err(format!("`{s}` is not 0x-prefixed"));
    };
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("`{s}` is not a hex address"));
    }
    Ok(())
}

/// Initialize tracing with an env-filter (`RUST_LOG`, default `info`).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
