//! Configuration module for bondwatch-server.
//!
//! Handles loading configuration from the TOML file, CLI arguments
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    ChainSettings, MonitorSettings, RuntimeConfig, ServerSettings, StorageSettings,
    TelegramSettings, WalletSettings,
};
use bondwatch_sdk::address::Address;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("{BOT_TOKEN_ENV} environment variable not set")]
    MissingBotToken,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate and convert into a [`RuntimeConfig`]
    pub fn load(&self) -> Result<RuntimeConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_from_str(&config_content)
    }

    pub fn load_from_str(&self, config_content: &str) -> Result<RuntimeConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        build_runtime_config(file_config)
    }
}

fn build_runtime_config(config: FileConfig) -> Result<RuntimeConfig, ConfigError> {
    let monitor = &config.monitor;
    if monitor.window_size == 0 {
        return Err(validation("monitor.window_size must be at least 1"));
    }
    if monitor.swap_wait_max_attempts == 0 {
        return Err(validation("monitor.swap_wait_max_attempts must be at least 1"));
    }
    if monitor.check_interval_secs == 0 {
        return Err(validation("monitor.check_interval_secs must be at least 1"));
    }

    let api_url = Url::parse(&config.chain.api_url)
        .map_err(|e| validation(format!("chain.api_url {:?}: {e}", config.chain.api_url)))?;
    Address::from_bech32(&config.chain.registry_contract).map_err(|e| {
        validation(format!(
            "chain.registry_contract {:?}: {e}",
            config.chain.registry_contract
        ))
    })?;
    if config.wallet.default_token.trim().is_empty() {
        return Err(validation("wallet.default_token must not be empty"));
    }

    Ok(RuntimeConfig {
        telegram: TelegramSettings {
            chat_id: config.telegram.chat_id,
            authorized_chat_id: config
                .telegram
                .authorized_chat_id
                .unwrap_or(config.telegram.chat_id),
        },
        chain: ChainSettings {
            api_url,
            chain_id: config.chain.chain_id,
            explorer_url: config.chain.explorer_url,
            registry_contract: config.chain.registry_contract,
            registry_function: config.chain.registry_function,
        },
        wallet: WalletSettings {
            pem_file: config.wallet.pem_file,
            default_token: config.wallet.default_token,
            gas_limit: config.wallet.gas_limit,
            gas_price: config.wallet.gas_price,
        },
        monitor: MonitorSettings {
            check_interval: Duration::from_secs(config.monitor.check_interval_secs),
            window_size: config.monitor.window_size,
            swap_wait_max_attempts: config.monitor.swap_wait_max_attempts,
            swap_wait_interval: Duration::from_secs(config.monitor.swap_wait_interval_secs),
        },
        storage: StorageSettings {
            addresses_file: config.storage.addresses_file,
            keyword_file: config.storage.keyword_file,
        },
        server: ServerSettings {
            listen: config.server.listen,
        },
    })
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Get the bot token from the environment.
pub fn get_bot_token() -> Result<String, ConfigError> {
    bot_token_from(std::env::var(BOT_TOKEN_ENV).ok())
}

fn bot_token_from(value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(ConfigError::MissingBotToken)
}
