//! Configuration for the ledger

use crate::crypto::KeyPair;
use crate::identity::IdentityRegistry;
use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Persisted chain location
    pub chain_file: PathBuf,

    /// Load `chain_file` at startup if it exists
    pub load_on_start: bool,

    /// Write `chain_file` on graceful shutdown
    pub save_on_shutdown: bool,

    /// Actor mailbox capacity (backpressure bound)
    pub mailbox_capacity: usize,

    /// Automatic mining
    pub auto_mine: AutoMineConfig,

    /// Genesis funding and recognised identities
    pub genesis: GenesisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "coin-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            chain_file: PathBuf::from("./data/blockchain.json"),
            load_on_start: true,
            save_on_shutdown: true,
            mailbox_capacity: 1000,
            auto_mine: AutoMineConfig::default(),
            genesis: GenesisConfig::default(),
        }
    }
}

/// Automatic mining configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoMineConfig {
    /// Mine on a timer instead of only on request
    pub enabled: bool,

    /// Timer period (milliseconds)
    pub interval_ms: u64,
}

impl Default for AutoMineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 10_000,
        }
    }
}

/// Explicit genesis allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    /// Human-readable label
    pub label: String,

    /// Hex public key
    pub public_key: String,

    /// Issued amount
    pub amount: u64,
}

/// Genesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Allocations to externally provisioned keys
    pub allocations: Vec<Allocation>,

    /// Development accounts with keys derived from their label
    pub dev_accounts: Vec<String>,

    /// Amount issued to each development account
    pub dev_allocation: u64,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            allocations: Vec::new(),
            dev_accounts: ["Alice", "Bob", "Charlie", "Dave", "Eve", "Frank"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            dev_allocation: 100,
        }
    }
}

impl GenesisConfig {
    /// Registry of every configured identity plus the genesis issuance list
    pub fn resolve(&self) -> crate::Result<(IdentityRegistry, Vec<(Identity, u64)>)> {
        let mut registry = IdentityRegistry::new();
        let mut issuance = Vec::new();

        for allocation in &self.allocations {
            let identity = Identity::from_hex(&allocation.public_key).map_err(|e| {
                crate::Error::Config(format!("Allocation '{}': {}", allocation.label, e))
            })?;
            registry.register(allocation.label.clone(), identity)?;
            if allocation.amount > 0 {
                issuance.push((identity, allocation.amount));
            }
        }

        for label in &self.dev_accounts {
            let identity = KeyPair::development(label).identity();
            registry.register(label.clone(), identity)?;
            if self.dev_allocation > 0 {
                issuance.push((identity, self.dev_allocation));
            }
        }

        Ok((registry, issuance))
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("COIN_LEDGER_CHAIN_FILE") {
            config.chain_file = PathBuf::from(path);
        }

        if let Ok(capacity) = std::env::var("COIN_LEDGER_MAILBOX_CAPACITY") {
            config.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid COIN_LEDGER_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        if let Ok(interval) = std::env::var("COIN_LEDGER_AUTO_MINE_MS") {
            config.auto_mine.interval_ms = interval.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid COIN_LEDGER_AUTO_MINE_MS: {}", e))
            })?;
            config.auto_mine.enabled = config.auto_mine.interval_ms > 0;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the actor cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be positive".to_string(),
            ));
        }
        if self.auto_mine.enabled && self.auto_mine.interval_ms == 0 {
            return Err(crate::Error::Config(
                "auto_mine.interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "coin-ledger");
        assert_eq!(config.genesis.dev_accounts.len(), 6);
        assert_eq!(config.genesis.dev_allocation, 100);
        assert!(!config.auto_mine.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_default_genesis() {
        let (registry, issuance) = GenesisConfig::default().resolve().unwrap();
        assert_eq!(registry.len(), 6);
        assert_eq!(issuance.len(), 6);
        assert!(issuance.iter().all(|(_, amount)| *amount == 100));
        assert_eq!(
            registry.lookup("Alice"),
            Some(KeyPair::development("Alice").identity())
        );
    }

    #[test]
    fn test_parse_toml_with_explicit_allocation() {
        let key = KeyPair::from_seed(&[5u8; 32]).identity();
        let toml = format!(
            r#"
            chain_file = "/tmp/chain.json"

            [auto_mine]
            enabled = true
            interval_ms = 500

            [genesis]
            dev_accounts = []

            [[genesis.allocations]]
            label = "treasury"
            public_key = "{}"
            amount = 1000
            "#,
            key.to_hex()
        );

        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.chain_file, PathBuf::from("/tmp/chain.json"));
        assert!(config.auto_mine.enabled);
        assert_eq!(config.mailbox_capacity, 1000);

        let (registry, issuance) = config.genesis.resolve().unwrap();
        assert_eq!(registry.lookup("treasury"), Some(key));
        assert_eq!(issuance, vec![(key, 1000)]);
    }

    #[test]
    fn test_resolve_rejects_bad_key() {
        let genesis = GenesisConfig {
            allocations: vec![Allocation {
                label: "broken".to_string(),
                public_key: "not-hex".to_string(),
                amount: 1,
            }],
            dev_accounts: vec![],
            dev_allocation: 0,
        };
        assert!(matches!(genesis.resolve(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.mailbox_capacity = 0;
        assert!(config.validate().is_err());
    }
}
