//! Configuration types for the wallet engine

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FEE_SATS_PER_KB, DUST_SATS};
use crate::{Error, Network, Result};

/// Chronik indexer connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronikConfig {
    /// Indexer URLs, tried in order by the client implementation
    pub urls: Vec<String>,

    /// Timeout applied to every indexer request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ChronikConfig {
    fn default() -> Self {
        Self {
            urls: vec!["https://chronik.e.cash".to_string()],
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Indexer settings
    #[serde(default)]
    pub chronik: ChronikConfig,

    /// Network (mainnet or testnet)
    pub network: Network,

    /// Value of the dust outputs that carry tokens
    #[serde(default = "default_dust_sats")]
    pub dust_sats: u64,

    /// Fee rate for sats-only spends, in sats per 1000 bytes
    #[serde(default = "default_fee_per_kb")]
    pub fee_per_kb: u64,
}

fn default_dust_sats() -> u64 {
    DUST_SATS
}

fn default_fee_per_kb() -> u64 {
    DEFAULT_FEE_SATS_PER_KB
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chronik: ChronikConfig::default(),
            network: Network::Mainnet,
            dust_sats: default_dust_sats(),
            fee_per_kb: default_fee_per_kb(),
        }
    }
}

impl WalletConfig {
    /// Reject settings the wallet cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chronik.urls.is_empty() {
            return Err(Error::Config("at least one chronik url is required".into()));
        }
        if self.chronik.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".into()));
        }
        if self.fee_per_kb == 0 {
            return Err(Error::Config("fee_per_kb must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WalletConfig::default();
        assert_eq!(config.chronik.urls, vec!["https://chronik.e.cash"]);
        assert_eq!(config.chronik.request_timeout_secs, 30);
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.dust_sats, 546);
    }

    #[test]
    fn test_config_serialization() {
        let config = WalletConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: WalletConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chronik.urls, config.chronik.urls);
        assert_eq!(parsed.network, config.network);
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let parsed: WalletConfig = serde_json::from_str(r#"{"network":"testnet"}"#).unwrap();
        assert_eq!(parsed.network, Network::Testnet);
        assert_eq!(parsed.dust_sats, 546);
        assert_eq!(parsed.fee_per_kb, 1000);
        assert_eq!(parsed.chronik.request_timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_unusable_config() {
        assert!(WalletConfig::default().validate().is_ok());

        let mut config = WalletConfig::default();
        config.chronik.urls.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = WalletConfig::default();
        config.chronik.request_timeout_secs = 0;
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Configuration error: request_timeout_secs must be positive"
        );

        let config = WalletConfig {
            fee_per_kb: 0,
            ..WalletConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
