use serde::Deserialize;
use std::fs;
use crate::error::ConfigError;
use crate::models::address::checked_opt;
use crate::models::Address;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub yields: YieldsConfig,
    #[serde(default)]
    pub escrow: EscrowConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct YieldsConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_chain")]
    pub chain: String,
    #[serde(default = "default_projects")]
    pub projects: Vec<String>,
    #[serde(default = "default_target_symbol")]
    pub target_symbol: String,
    #[serde(default = "default_fresh_secs")]
    pub fresh_secs: u64,
    #[serde(default = "default_retain_secs")]
    pub retain_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EscrowConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default, deserialize_with = "checked_opt")]
    pub escrow_address: Option<Address>,
    #[serde(default, deserialize_with = "checked_opt")]
    pub usdc_address: Option<Address>,
    #[serde(default, deserialize_with = "checked_opt")]
    pub vault_address: Option<Address>,
    #[serde(default = "default_max_offers")]
    pub max_offers: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// Substitute the fictional seed offers when no live offer exists
    #[serde(default)]
    pub demo_offers: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,
}

fn default_endpoint() -> String { "https://yields.llama.fi/pools".to_string() }
fn default_chain() -> String { "Etherlink".to_string() }
fn default_projects() -> Vec<String> {
    vec!["superlend".to_string(), "gearbox".to_string(), "hanji".to_string()]
}
fn default_target_symbol() -> String { "USDC".to_string() }
fn default_fresh_secs() -> u64 { 5 * 60 }
fn default_retain_secs() -> u64 { 10 * 60 }
fn default_timeout_secs() -> u64 { 10 }
fn default_rpc_url() -> String { "https://node.mainnet.etherlink.com".to_string() }
fn default_max_offers() -> u64 { 20 }
fn default_concurrency() -> usize { 8 }
fn default_refresh_interval() -> u64 { 30 }
fn default_enabled() -> bool { true }
fn default_data_dir() -> String { "./data".to_string() }
fn default_max_recipients() -> usize { 10 }

impl Default for YieldsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            chain: default_chain(),
            projects: default_projects(),
            target_symbol: default_target_symbol(),
            fresh_secs: default_fresh_secs(),
            retain_secs: default_retain_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            escrow_address: None,
            usdc_address: None,
            vault_address: None,
            max_offers: default_max_offers(),
            concurrency: default_concurrency(),
            refresh_interval: default_refresh_interval(),
            demo_offers: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: default_data_dir(),
            max_recipients: default_max_recipients(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
