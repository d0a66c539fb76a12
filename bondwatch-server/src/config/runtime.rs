//! Validated runtime configuration.
//!
//! Built from a [`FileConfig`](super::file::FileConfig) by the
//! [`ConfigLoader`](super::ConfigLoader); every value here has been checked.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub telegram: TelegramSettings,
    pub chain: ChainSettings,
    pub wallet: WalletSettings,
    pub monitor: MonitorSettings,
    pub storage: StorageSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramSettings {
    pub chat_id: i64,
    pub authorized_chat_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSettings {
    pub api_url: Url,
    pub chain_id: String,
    pub explorer_url: String,
    pub registry_contract: String,
    pub registry_function: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSettings {
    pub pem_file: PathBuf,
    pub default_token: String,
    pub gas_limit: u64,
    pub gas_price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub check_interval: Duration,
    pub window_size: usize,
    pub swap_wait_max_attempts: u32,
    pub swap_wait_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub addresses_file: PathBuf,
    pub keyword_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub listen: SocketAddr,
}
