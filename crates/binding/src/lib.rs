//! Contract bindings for all external contracts.
//!
//! This crate consolidates all Solidity contract interfaces used across the project:
//! - OP Stack contracts (OptimismPortal2, L2ToL1MessagePasser, DisputeGameFactory)
//! - Arbitrum contracts (ArbSys, Outbox, Rollup, NodeInterface)
//! - Circle CCTP contracts (MessageTransmitter)
//! - The destination lending pool (RelayPool)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod arbitrum;
pub mod cctp;
pub mod opstack;
pub mod pool;
