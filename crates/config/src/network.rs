//! Per-chain network registry.
//!
//! Every chain the relayer talks to is described by a [`Network`] entry: its
//! declared bridge family ([`Stack`]), the bridge contract addresses that
//! family needs, and how to reach an RPC endpoint. The registry is an
//! immutable value passed explicitly into the chain adapter factory; there is
//! no process-wide mutable state.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bridge family classification of an origin network.
///
/// This tag is the dispatch key for proof building and claiming; an
/// unrecognized stack is a configuration error for that transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    /// OP-Stack rollup (dispute-game withdrawal proofs)
    Op,
    /// Arbitrum / Orbit rollup (outbox Merkle proofs)
    Arb,
    /// Circle CCTP (attestation-based USDC transfer)
    Cctp,
    /// zkSync era (finalized through the zkSync bridge hub)
    Zksync,
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Op => "op",
            Self::Arb => "arb",
            Self::Cctp => "cctp",
            Self::Zksync => "zksync",
        };
        f.write_str(s)
    }
}

/// OP-Stack bridge contract addresses (on the destination/L1 chain).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OpBridge {
    /// OptimismPortal2 contract
    pub portal: Address,
    /// DisputeGameFactory contract
    pub dispute_game_factory: Address,
}

/// Arbitrum bridge contract addresses (on the destination/L1 chain).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArbBridge {
    /// Rollup contract tracking confirmed assertions
    pub rollup: Address,
    /// Outbox contract executing L2→L1 messages
    pub outbox: Address,
    /// Whether the rollup runs the Bold protocol (`AssertionCreated` events)
    /// instead of the classic one (`NodeCreated` events)
    pub bold: bool,
}

/// A single chain entry in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    /// Chain ID
    pub chain_id: u64,
    /// Human-readable name used in logs
    pub name: String,
    /// Declared bridge family of this network
    pub stack: Stack,
    /// Explicit RPC endpoint; takes precedence over the default gateway
    pub rpc_url: Option<String>,
    /// Default public RPC gateway
    pub default_rpc_url: String,
    /// OP-Stack bridge addresses (present when `stack == Op`)
    pub op: Option<OpBridge>,
    /// Arbitrum bridge addresses (present when `stack == Arb`)
    pub arb: Option<ArbBridge>,
    /// Whether this is a test network (selects the sandbox attestation API)
    pub testnet: bool,
}

impl Network {
    /// Resolve the RPC endpoint: explicit URL if configured, else the default
    /// public gateway for this chain.
    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(&self.default_rpc_url)
    }
}

/// Immutable set of known networks.
///
/// Constructed once (curated sets or custom entries) and passed by reference
/// wherever chain lookup is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRegistry {
    networks: Vec<Network>,
}

impl NetworkRegistry {
    /// Build a registry from explicit entries.
    pub fn new(networks: Vec<Network>) -> Self {
        Self { networks }
    }

    /// Curated mainnet origins: Ethereum, OP Mainnet, Base, Arbitrum One,
    /// zkSync Era.
    pub fn mainnet() -> Self {
        Self::new(vec![
            // L1 has no native withdrawal bridge toward the pool; USDC
            // transfers from it ride CCTP.
            Network {
                chain_id: 1,
                name: "ethereum".into(),
                stack: Stack::Cctp,
                rpc_url: None,
                default_rpc_url: "https://ethereum-rpc.publicnode.com".into(),
                op: None,
                arb: None,
                testnet: false,
            },
            Network {
                chain_id: 10,
                name: "op-mainnet".into(),
                stack: Stack::Op,
                rpc_url: None,
                default_rpc_url: "https://mainnet.optimism.io".into(),
                op: Some(OpBridge {
                    portal: address!("0xbEb5Fc579115071764c7423A4f12eDde41f106Ed"),
                    dispute_game_factory: address!("0xe5965Ab5962eDc7477C8520243A95517CD252fA9"),
                }),
                arb: None,
                testnet: false,
            },
            Network {
                chain_id: 8453,
                name: "base".into(),
                stack: Stack::Op,
                rpc_url: None,
                default_rpc_url: "https://mainnet.base.org".into(),
                op: Some(OpBridge {
                    portal: address!("0x49048044D57e1C92A77f79988d21Fa8fAF74E97e"),
                    dispute_game_factory: address!("0x43edB88C4B80fDD2AdFF2412A7BebF9dF42cB40e"),
                }),
                arb: None,
                testnet: false,
            },
            Network {
                chain_id: 42161,
                name: "arbitrum-one".into(),
                stack: Stack::Arb,
                rpc_url: None,
                default_rpc_url: "https://arb1.arbitrum.io/rpc".into(),
                op: None,
                arb: Some(ArbBridge {
                    rollup: address!("0x5eF0D09d1E6204141B4d37530808eD19f60FBa35"),
                    outbox: address!("0x0B9857ae2D4A3DBe74ffE1d7DF045bb7F96E4840"),
                    bold: false,
                }),
                testnet: false,
            },
            Network {
                chain_id: 324,
                name: "zksync-era".into(),
                stack: Stack::Zksync,
                rpc_url: None,
                default_rpc_url: "https://mainnet.era.zksync.io".into(),
                op: None,
                arb: None,
                testnet: false,
            },
        ])
    }

    /// Curated Sepolia origins.
    pub fn sepolia() -> Self {
        Self::new(vec![
            Network {
                chain_id: 11155111,
                name: "sepolia".into(),
                stack: Stack::Cctp,
                rpc_url: None,
                default_rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".into(),
                op: None,
                arb: None,
                testnet: true,
            },
            Network {
                chain_id: 11155420,
                name: "op-sepolia".into(),
                stack: Stack::Op,
                rpc_url: None,
                default_rpc_url: "https://sepolia.optimism.io".into(),
                op: Some(OpBridge {
                    portal: address!("0x16Fc5058F25648194471939df75CF27A2fdC48BC"),
                    dispute_game_factory: address!("0x05F9613aDB30026FFd634f38e5C4dFd30a197Fa1"),
                }),
                arb: None,
                testnet: true,
            },
            Network {
                chain_id: 84532,
                name: "base-sepolia".into(),
                stack: Stack::Op,
                rpc_url: None,
                default_rpc_url: "https://sepolia.base.org".into(),
                op: Some(OpBridge {
                    portal: address!("0x49f53e41452C74589E85cA1677426Ba426459e85"),
                    dispute_game_factory: address!("0xd6E6dBf4F7EA0ac412fD8b65ED297e64BB7a06E1"),
                }),
                arb: None,
                testnet: true,
            },
            Network {
                chain_id: 421614,
                name: "arbitrum-sepolia".into(),
                stack: Stack::Arb,
                rpc_url: None,
                default_rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".into(),
                op: None,
                arb: Some(ArbBridge {
                    rollup: address!("0x042B2E6C5E99d4c521bd49beeD5E99651D9B0Cf4"),
                    outbox: address!("0x65f07C7D521164a4d5DaC6eB8Fac8DA067A3B78F"),
                    bold: true,
                }),
                testnet: true,
            },
            Network {
                chain_id: 300,
                name: "zksync-sepolia".into(),
                stack: Stack::Zksync,
                rpc_url: None,
                default_rpc_url: "https://sepolia.era.zksync.dev".into(),
                op: None,
                arb: None,
                testnet: true,
            },
        ])
    }

    /// Look up a network by chain ID.
    pub fn get(&self, chain_id: u64) -> Option<&Network> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    /// All registered networks.
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Return a copy with an explicit RPC endpoint for one chain.
    ///
    /// Unknown chain IDs are ignored; the caller can check with [`Self::get`].
    pub fn with_rpc_url(mut self, chain_id: u64, url: impl Into<String>) -> Self {
        if let Some(network) = self.networks.iter_mut().find(|n| n.chain_id == chain_id) {
            network.rpc_url = Some(url.into());
        }
        self
    }

    /// Add or replace a network entry.
    pub fn with_network(mut self, network: Network) -> Self {
        self.networks.retain(|n| n.chain_id != network.chain_id);
        self.networks.push(network);
        self
    }
}

/// Base URL of Circle's attestation service.
///
/// Test networks use the sandbox endpoint, everything else production.
pub const fn attestation_base_url(testnet: bool) -> &'static str {
    if testnet {
        "https://iris-api-sandbox.circle.com"
    } else {
        "https://iris-api.circle.com"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_registry() {
        let registry = NetworkRegistry::mainnet();

        let op = registry.get(10).unwrap();
        assert_eq!(op.stack, Stack::Op);
        assert!(op.op.is_some());
        assert!(op.arb.is_none());

        let arb = registry.get(42161).unwrap();
        assert_eq!(arb.stack, Stack::Arb);
        assert!(!arb.arb.unwrap().bold);
    }

    #[test]
    fn test_l1_origins_use_cctp() {
        let l1 = NetworkRegistry::mainnet().get(1).unwrap().clone();
        assert_eq!(l1.stack, Stack::Cctp);
        assert!(!l1.testnet);

        let sepolia = NetworkRegistry::sepolia().get(11155111).unwrap().clone();
        assert_eq!(sepolia.stack, Stack::Cctp);
        assert!(sepolia.testnet);
    }

    #[test]
    fn test_sepolia_uses_bold_rollup() {
        let registry = NetworkRegistry::sepolia();
        let arb = registry.get(421614).unwrap();
        assert!(arb.arb.unwrap().bold);
        assert!(arb.testnet);
    }

    #[test]
    fn test_rpc_resolution_prefers_explicit_url() {
        let registry = NetworkRegistry::mainnet().with_rpc_url(10, "http://localhost:8545");
        let op = registry.get(10).unwrap();
        assert_eq!(op.rpc_url(), "http://localhost:8545");

        let base = registry.get(8453).unwrap();
        assert_eq!(base.rpc_url(), "https://mainnet.base.org");
    }

    #[test]
    fn test_unknown_chain_is_none() {
        assert!(NetworkRegistry::mainnet().get(999999).is_none());
    }

    #[test]
    fn test_attestation_endpoints() {
        assert!(attestation_base_url(true).contains("sandbox"));
        assert!(!attestation_base_url(false).contains("sandbox"));
    }

    #[test]
    fn test_stack_display_matches_serde_tag() {
        for stack in [Stack::Op, Stack::Arb, Stack::Cctp, Stack::Zksync] {
            let json = serde_json::to_string(&stack).unwrap();
            assert_eq!(json, format!("\"{stack}\""));
        }
    }
}
