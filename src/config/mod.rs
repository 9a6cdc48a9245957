//! Configuration
//!
//! Layered settings: built-in defaults, then a TOML file, then `IDREG__*`
//! environment variables.

pub mod facade;
pub mod xdg;

use crate::error::ApiError;
use crate::ledger::StaticBalances;
use crate::logging::LoggingConfig;
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub use facade::ConfigLoader;

/// Top-level registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    /// Static balance table, keyed by `0x` address
    pub balances: HashMap<String, u64>,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the sled database; None means the XDG data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => xdg::default_store_path(),
        }
    }
}

impl RegistryConfig {
    /// Parse the balance table into a balance collaborator
    pub fn balance_oracle(&self) -> Result<StaticBalances, ApiError> {
        let mut balances: HashMap<Address, Amount> = HashMap::new();
        for (address, amount) in &self.balances {
            let parsed: Address = address.parse().map_err(|e| {
                ApiError::ConfigError(format!("Invalid balance address '{}': {}", address, e))
            })?;
            balances.insert(parsed, Amount::from(*amount));
        }
        Ok(StaticBalances::from_map(balances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BalanceOracle;

    #[test]
    fn test_explicit_store_path_wins() {
        let storage = StorageConfig {
            path: Some(PathBuf::from("/tmp/registry.sled")),
        };
        assert_eq!(
            storage.resolve_path().unwrap(),
            PathBuf::from("/tmp/registry.sled")
        );
    }

    #[test]
    fn test_default_store_path_is_under_app_dir() {
        let path = StorageConfig::default().resolve_path().unwrap();
        assert!(path.ends_with("identity-registry/registry.sled"));
    }

    #[test]
    fn test_balance_oracle_from_table() {
        let mut config = RegistryConfig::default();
        config.balances.insert(
            "0x00000000000000000000000000000000000000aa".to_string(),
            77,
        );
        let oracle = config.balance_oracle().unwrap();
        assert_eq!(oracle.balance_of(&Address::from_low_u8(0xaa)), 77);
        assert_eq!(oracle.balance_of(&Address::from_low_u8(0xbb)), 0);

        config.balances.insert("0x12".to_string(), 1);
        assert!(config.balance_oracle().is_err());
    }
}
