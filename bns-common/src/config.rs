//! Configuration for transaction construction
//!
//! Settings are stored in TOML and cover the target network, the payload
//! magic bytes, dust policy, the fallback fee rate and logging. Every value
//! is validated before it reaches an encoder.
//!
//! ```toml
//! [network]
//! name = "testnet"
//! magic_bytes = "id"
//!
//! [transactions]
//! dust_minimum = 5500
//! default_fee_rate = 10
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::{config_error, BnsResult};
use crate::logging::LogConfig;
use crate::types::{NetworkKind, DEFAULT_MAGIC_BYTES, DUST_MINIMUM};
use crate::validation::parse_address;
use anyhow::{anyhow, Context, Result};
use bitcoin::address::Payload;
use bitcoin::hashes::Hash;
use bitcoin::{Address, Network, PubkeyHash};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TxConfig {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub transactions: TransactionConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Chain and wire-format settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// mainnet, testnet or regtest
    #[serde(default = "default_network")]
    pub name: String,

    /// Two ASCII characters that open every payload
    #[serde(default = "default_magic_bytes")]
    pub magic_bytes: String,

    /// Burn address override; the all-zero P2PKH address is used otherwise
    #[serde(default)]
    pub burn_address: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network(),
            magic_bytes: default_magic_bytes(),
            burn_address: None,
        }
    }
}

/// Funding policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Value of dust-valued outputs and the floor for spend outputs
    #[serde(default = "default_dust_minimum")]
    pub dust_minimum: u64,

    /// Fee rate in sat/byte used when no backend quote is available
    #[serde(default = "default_fee_rate")]
    pub default_fee_rate: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            dust_minimum: default_dust_minimum(),
            default_fee_rate: default_fee_rate(),
        }
    }
}

impl TxConfig {
    /// Default configuration for a network
    pub fn for_network(network: NetworkKind) -> Self {
        let mut config = TxConfig::default();
        config.network.name = network.to_string();
        config
    }

    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: TxConfig = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> BnsResult<()> {
        let network = self.bitcoin_network()?;

        self.magic_bytes()?;

        if self.transactions.dust_minimum == 0 {
            return Err(config_error("dust_minimum must be greater than 0"));
        }

        if self.transactions.default_fee_rate == 0 {
            return Err(config_error("default_fee_rate must be greater than 0"));
        }

        if let Some(address) = &self.network.burn_address {
            parse_address(address, network)
                .map_err(|e| config_error(format!("Invalid burn_address: {}", e)))?;
        }

        Ok(())
    }

    /// The configured network
    pub fn network_kind(&self) -> BnsResult<NetworkKind> {
        self.network
            .name
            .parse::<NetworkKind>()
            .map_err(|_| config_error(format!("Invalid network type: {}", self.network.name)))
    }

    /// The configured network as a `bitcoin` network
    pub fn bitcoin_network(&self) -> BnsResult<Network> {
        Ok(self.network_kind()?.to_bitcoin())
    }

    /// The payload magic bytes
    pub fn magic_bytes(&self) -> BnsResult<[u8; 2]> {
        let magic = self.network.magic_bytes.as_bytes();
        if magic.len() != 2 || !magic.is_ascii() {
            return Err(config_error(format!(
                "magic_bytes must be exactly two ASCII characters, got '{}'",
                self.network.magic_bytes
            )));
        }
        Ok([magic[0], magic[1]])
    }

    /// Address that receives burned prices
    pub fn burn_address(&self) -> BnsResult<Address> {
        let network = self.bitcoin_network()?;
        match &self.network.burn_address {
            Some(address) => parse_address(address, network),
            None => Ok(default_burn_address(network)),
        }
    }

    pub fn dust_minimum(&self) -> u64 {
        self.transactions.dust_minimum
    }
}

/// The all-zero P2PKH address of a network
pub fn default_burn_address(network: Network) -> Address {
    Address::new(network, Payload::PubkeyHash(PubkeyHash::all_zeros()))
}

// Default value functions

fn default_network() -> String {
    NetworkKind::Mainnet.to_string()
}

fn default_magic_bytes() -> String {
    DEFAULT_MAGIC_BYTES.to_string()
}

fn default_dust_minimum() -> u64 {
    DUST_MINIMUM
}

fn default_fee_rate() -> u64 {
    10
}
