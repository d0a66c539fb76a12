//! TOML file configuration structures.
//!
//! These structs directly map to the `bondwatch-config.toml` file format.
//! Every section except `[telegram]` and `[wallet]` may be omitted.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Telegram section. The bot token is read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Chat receiving the alerts.
    pub chat_id: i64,
    /// The only chat allowed to change the keyword. Defaults to `chat_id`.
    #[serde(default)]
    pub authorized_chat_id: Option<i64>,
}

/// MultiversX network section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub api_url: String,
    pub chain_id: String,
    pub explorer_url: String,
    /// Bech32 address of the registry contract.
    pub registry_contract: String,
    /// View returning every bonding pair.
    pub registry_function: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.multiversx.com".to_string(),
            chain_id: "1".to_string(),
            explorer_url: "https://explorer.multiversx.com".to_string(),
            registry_contract: "erd1qqqqqqqqqqqqqpgqg0sshhkwaxz8fxu47z4svrmp48mzydjlptzsdhxjpd"
                .to_string(),
            registry_function: "getAllBondingMetadata".to_string(),
        }
    }
}

/// Purchase wallet section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// MultiversX PEM file holding the signing key.
    pub pem_file: PathBuf,
    /// Token spent on purchases.
    #[serde(default = "default_token")]
    pub default_token: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
}

fn default_token() -> String {
    "ONE-f9954f".to_string()
}

fn default_gas_limit() -> u64 {
    100_000_000
}

fn default_gas_price() -> u64 {
    1_000_000_000
}

/// Detection and swap-wait timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub check_interval_secs: u64,
    /// Number of most recent registry entries compared per cycle.
    pub window_size: usize,
    pub swap_wait_max_attempts: u32,
    pub swap_wait_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            window_size: 3,
            swap_wait_max_attempts: 60,
            swap_wait_interval_secs: 30,
        }
    }
}

/// Local state files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub addresses_file: PathBuf,
    pub keyword_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            addresses_file: PathBuf::from("./data/addresses.json"),
            keyword_file: PathBuf::from("./data/keyword.json"),
        }
    }
}

/// Health endpoint section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "127.0.0.1:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}
