//! Application configuration.

use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CTOKEN environment variable not set")]
    MissingToken,

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Runtime configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot token.
    pub telegram_token: String,
    /// Etherscan v2 key; EVM monitoring is disabled without it.
    pub etherscan_api_key: Option<String>,
    /// Solscan key; Solana monitoring is disabled without it.
    pub solscan_api_key: Option<String>,
    /// Path to the SQLite wallet registry.
    pub db_path: String,
    /// Pause between poll cycles.
    pub poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let telegram_token = get("CTOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let poll_seconds = match get("POLL_SECONDS") {
            None => 10,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("POLL_SECONDS", raw))?,
        };

        Ok(Self {
            telegram_token,
            etherscan_api_key: get("ETHERSCAN_API_KEY").filter(|k| !k.is_empty()),
            solscan_api_key: get("SOLSCAN_API_KEY").filter(|k| !k.is_empty()),
            db_path: get("DB_PATH").unwrap_or_else(|| "wallets.db".to_string()),
            poll_interval: Duration::from_secs(poll_seconds),
        })
    }

    /// Connection string for sqlx.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db_path)
    }
}
