//! Configuration types for the bridge relayer.
//!
//! This crate provides:
//! - The immutable per-chain network registry (bridge family, contract addresses)
//! - RPC endpoint resolution (explicit override, else a default public gateway)
//! - Circle attestation API endpoints

pub mod network;

pub use network::{
    attestation_base_url, ArbBridge, Network, NetworkRegistry, OpBridge, Stack,
};
