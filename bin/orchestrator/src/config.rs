//! Orchestrator runtime configuration.

use crate::PassPolicy;
use ::config::NetworkRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Which curated network set to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkChoice {
    Mainnet,
    Sepolia,
}

/// Top-level orchestrator configuration, loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Curated network set to use
    pub network: NetworkChoice,

    /// Per-chain RPC endpoint overrides, keyed by decimal chain ID
    #[serde(default)]
    pub rpc_urls: HashMap<String, String>,

    /// JSON file of pending transfers, as exported by the indexing service
    pub transfers_file: PathBuf,

    /// Only prove withdrawals initiated at most this long ago
    #[serde(default = "default_prove_window")]
    pub prove_window_secs: u64,

    /// OP-Stack proof maturity delay before finalization
    #[serde(default = "default_challenge_period")]
    pub challenge_period_secs: u64,

    /// Settlement delay for non-OP origins before claiming
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    /// Seconds between passes in the long-running binary
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Port for the Prometheus exporter; disabled when unset
    pub metrics_port: Option<u16>,

    /// Build and validate every payload but submit nothing
    #[serde(default)]
    pub dry_run: bool,
}

const fn default_prove_window() -> u64 {
    14 * 24 * 60 * 60
}

const fn default_challenge_period() -> u64 {
    7 * 24 * 60 * 60
}

const fn default_settle_delay() -> u64 {
    7 * 24 * 60 * 60
}

const fn default_interval() -> u64 {
    300
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// The curated registry with this config's RPC overrides applied.
    pub fn registry(&self) -> eyre::Result<NetworkRegistry> {
        let mut registry = match self.network {
            NetworkChoice::Mainnet => NetworkRegistry::mainnet(),
            NetworkChoice::Sepolia => NetworkRegistry::sepolia(),
        };
        for (chain_id, url) in &self.rpc_urls {
            let chain_id: u64 = chain_id
                .parse()
                .map_err(|_| eyre::eyre!("invalid chain id in rpc_urls: {chain_id}"))?;
            registry = registry.with_rpc_url(chain_id, url.clone());
        }
        Ok(registry)
    }

    pub const fn policy(&self) -> PassPolicy {
        PassPolicy {
            prove_window_secs: self.prove_window_secs,
            challenge_period_secs: self.challenge_period_secs,
            settle_delay_secs: self.settle_delay_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            network = "sepolia"
            transfers_file = "transfers.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.network, NetworkChoice::Sepolia);
        assert_eq!(config.challenge_period_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.interval_secs, 300);
        assert!(!config.dry_run);
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_rpc_overrides_apply_to_registry() {
        let config: Config = toml::from_str(
            r#"
            network = "mainnet"
            transfers_file = "transfers.json"

            [rpc_urls]
            10 = "http://localhost:9545"
            "#,
        )
        .unwrap();

        let registry = config.registry().unwrap();
        assert_eq!(registry.get(10).unwrap().rpc_url(), "http://localhost:9545");
        assert_eq!(
            registry.get(8453).unwrap().rpc_url(),
            "https://mainnet.base.org"
        );
    }
}
