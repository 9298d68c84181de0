//! Transfer data model and the durable status store interface.
//!
//! The status store is the single source of truth for where each transfer is
//! in its lifecycle. The orchestrator only writes to it after a destination
//! transaction has confirmed, so a crash between steps is always safe: the
//! next pass re-reads the store and retries whatever is still pending.

pub mod memory;

pub use memory::MemoryStatusStore;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Native bridge status of a transfer.
///
/// Transitions are monotonic: `Initiated → Proven → Finalized` on the
/// OP-Stack path, `Initiated → Finalized` everywhere else. Nothing ever moves
/// a transfer backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BridgeStatus {
    Initiated,
    Proven,
    Finalized,
}

impl BridgeStatus {
    /// Whether moving from `self` to `next` goes forward in the lifecycle.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initiated, Self::Proven)
                | (Self::Initiated, Self::Finalized)
                | (Self::Proven, Self::Finalized)
        )
    }
}

/// Unique identity of a transfer, assigned by the origin bridge contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferKey {
    pub origin_chain_id: u64,
    pub origin_bridge: Address,
    pub nonce: U256,
}

impl std::fmt::Display for TransferKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.origin_chain_id, self.origin_bridge, self.nonce
        )
    }
}

/// One cross-chain transfer, as recorded by the indexing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeTransaction {
    pub origin_chain_id: u64,
    pub origin_bridge: Address,
    pub nonce: U256,
    pub destination_chain_id: u64,
    pub destination_pool: Address,
    pub origin_sender: Address,
    pub destination_recipient: Address,
    pub asset: Address,
    pub amount: U256,
    /// Unix timestamp of the origin-chain initiation
    pub origin_timestamp: u64,
    pub origin_tx_hash: TxHash,
    pub status: BridgeStatus,
    /// OP-Stack proving transaction, set when status reaches `Proven`
    pub proof_tx_hash: Option<TxHash>,
    /// Destination claim transaction, set when status reaches `Finalized`
    pub finalized_tx_hash: Option<TxHash>,
    /// Instant-loan emission on the destination pool, if any
    pub loan_emitted_tx_hash: Option<TxHash>,
}

impl BridgeTransaction {
    pub const fn key(&self) -> TransferKey {
        TransferKey {
            origin_chain_id: self.origin_chain_id,
            origin_bridge: self.origin_bridge,
            nonce: self.nonce,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be reached; fatal for the current pass.
    #[error("status store unavailable: {0}")]
    Unavailable(String),

    /// The transfer is not in the store.
    #[error("unknown transfer {0}")]
    UnknownTransfer(TransferKey),

    /// The requested update would move the transfer backwards.
    #[error("invalid status transition {from:?} -> {to:?} for {key}")]
    InvalidTransition {
        key: TransferKey,
        from: BridgeStatus,
        to: BridgeStatus,
    },
}

/// Durable record of transfer status.
///
/// Implementations must only be updated after on-chain confirmation, never
/// optimistically, and must reject backwards transitions.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// All transfers in `status` whose `origin_timestamp` falls inside the
    /// given bounds (both inclusive, either side optional).
    async fn by_status(
        &self,
        status: BridgeStatus,
        initiated_after: Option<u64>,
        initiated_before: Option<u64>,
    ) -> Result<Vec<BridgeTransaction>, StoreError>;

    /// Record a successful proving transaction; `Initiated → Proven`.
    async fn mark_proven(&self, key: TransferKey, proof_tx: TxHash) -> Result<(), StoreError>;

    /// Record a successful claim transaction; `Initiated|Proven → Finalized`.
    async fn mark_finalized(&self, key: TransferKey, claim_tx: TxHash) -> Result<(), StoreError>;
}
