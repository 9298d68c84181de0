//! In-memory status store.
//!
//! Backs the integration tests and the file-fed operational mode of the
//! binaries. Enforces the same monotonic-transition rules a durable
//! implementation must uphold.

use crate::{BridgeStatus, BridgeTransaction, StatusStore, StoreError, TransferKey};
use alloy_primitives::TxHash;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    transfers: Mutex<HashMap<TransferKey, BridgeTransaction>>,
}

impl MemoryStatusStore {
    pub fn new(transfers: Vec<BridgeTransaction>) -> Self {
        let map = transfers.into_iter().map(|tx| (tx.key(), tx)).collect();
        Self {
            transfers: Mutex::new(map),
        }
    }

    /// Load transfers from a JSON array, as exported by the indexing service.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.as_ref().display())))?;
        let transfers: Vec<BridgeTransaction> = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Unavailable(format!("parse transfers: {e}")))?;
        Ok(Self::new(transfers))
    }

    /// Snapshot of every transfer, sorted by key for stable output.
    pub fn snapshot(&self) -> Vec<BridgeTransaction> {
        let transfers = self.transfers.lock().expect("store mutex poisoned");
        let mut all: Vec<_> = transfers.values().cloned().collect();
        all.sort_by_key(|tx| (tx.origin_chain_id, tx.origin_bridge, tx.nonce));
        all
    }

    /// Write the current state back out as JSON.
    pub fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| StoreError::Unavailable(format!("serialize transfers: {e}")))?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.as_ref().display())))
    }

    pub fn get(&self, key: TransferKey) -> Option<BridgeTransaction> {
        self.transfers
            .lock()
            .expect("store mutex poisoned")
            .get(&key)
            .cloned()
    }

    fn advance(
        &self,
        key: TransferKey,
        to: BridgeStatus,
        update: impl FnOnce(&mut BridgeTransaction),
    ) -> Result<(), StoreError> {
        let mut transfers = self.transfers.lock().expect("store mutex poisoned");
        let tx = transfers
            .get_mut(&key)
            .ok_or(StoreError::UnknownTransfer(key))?;

        if !tx.status.can_advance_to(to) {
            return Err(StoreError::InvalidTransition {
                key,
                from: tx.status,
                to,
            });
        }

        tx.status = to;
        update(tx);
        Ok(())
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn by_status(
        &self,
        status: BridgeStatus,
        initiated_after: Option<u64>,
        initiated_before: Option<u64>,
    ) -> Result<Vec<BridgeTransaction>, StoreError> {
        let transfers = self.transfers.lock().expect("store mutex poisoned");
        let mut matching: Vec<_> = transfers
            .values()
            .filter(|tx| tx.status == status)
            .filter(|tx| initiated_after.is_none_or(|t| tx.origin_timestamp >= t))
            .filter(|tx| initiated_before.is_none_or(|t| tx.origin_timestamp <= t))
            .cloned()
            .collect();

        // Within an (origin chain, bridge) pair nonces are processed in
        // increasing order where possible.
        matching.sort_by_key(|tx| (tx.origin_chain_id, tx.origin_bridge, tx.nonce));
        Ok(matching)
    }

    async fn mark_proven(&self, key: TransferKey, proof_tx: TxHash) -> Result<(), StoreError> {
        self.advance(key, BridgeStatus::Proven, |tx| {
            tx.proof_tx_hash = Some(proof_tx);
        })
    }

    async fn mark_finalized(&self, key: TransferKey, claim_tx: TxHash) -> Result<(), StoreError> {
        self.advance(key, BridgeStatus::Finalized, |tx| {
            tx.finalized_tx_hash = Some(claim_tx);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, U256};

    fn transfer(nonce: u64, status: BridgeStatus, timestamp: u64) -> BridgeTransaction {
        BridgeTransaction {
            origin_chain_id: 10,
            origin_bridge: Address::repeat_byte(0xbb),
            nonce: U256::from(nonce),
            destination_chain_id: 1,
            destination_pool: Address::repeat_byte(0xcc),
            origin_sender: Address::repeat_byte(0x01),
            destination_recipient: Address::repeat_byte(0x02),
            asset: Address::ZERO,
            amount: U256::from(1_000_000u64),
            origin_timestamp: timestamp,
            origin_tx_hash: B256::repeat_byte(0xee),
            status,
            proof_tx_hash: None,
            finalized_tx_hash: None,
            loan_emitted_tx_hash: None,
        }
    }

    #[tokio::test]
    async fn test_by_status_filters_and_orders() {
        let store = MemoryStatusStore::new(vec![
            transfer(3, BridgeStatus::Initiated, 100),
            transfer(1, BridgeStatus::Initiated, 200),
            transfer(2, BridgeStatus::Proven, 150),
        ]);

        let initiated = store
            .by_status(BridgeStatus::Initiated, None, None)
            .await
            .unwrap();
        assert_eq!(initiated.len(), 2);
        assert_eq!(initiated[0].nonce, U256::from(1));
        assert_eq!(initiated[1].nonce, U256::from(3));

        let recent = store
            .by_status(BridgeStatus::Initiated, Some(150), None)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].nonce, U256::from(1));

        let old = store
            .by_status(BridgeStatus::Initiated, None, Some(150))
            .await
            .unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].nonce, U256::from(3));
    }

    #[tokio::test]
    async fn test_transitions_are_monotonic() {
        let store = MemoryStatusStore::new(vec![transfer(1, BridgeStatus::Initiated, 100)]);
        let key = store.snapshot()[0].key();

        store.mark_proven(key, B256::repeat_byte(0x01)).await.unwrap();
        store
            .mark_finalized(key, B256::repeat_byte(0x02))
            .await
            .unwrap();

        let tx = store.get(key).unwrap();
        assert_eq!(tx.status, BridgeStatus::Finalized);
        assert_eq!(tx.proof_tx_hash, Some(B256::repeat_byte(0x01)));
        assert_eq!(tx.finalized_tx_hash, Some(B256::repeat_byte(0x02)));

        // No path leads backwards from Finalized.
        let err = store
            .mark_proven(key, B256::repeat_byte(0x03))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(store.get(key).unwrap().status, BridgeStatus::Finalized);
    }

    #[tokio::test]
    async fn test_initiated_can_finalize_directly() {
        // Arbitrum/CCTP/zkSync skip the Proven stage entirely.
        let store = MemoryStatusStore::new(vec![transfer(1, BridgeStatus::Initiated, 100)]);
        let key = store.snapshot()[0].key();

        store
            .mark_finalized(key, B256::repeat_byte(0x07))
            .await
            .unwrap();
        assert_eq!(store.get(key).unwrap().status, BridgeStatus::Finalized);
    }

    #[tokio::test]
    async fn test_unknown_transfer() {
        let store = MemoryStatusStore::default();
        let key = TransferKey {
            origin_chain_id: 10,
            origin_bridge: Address::ZERO,
            nonce: U256::ZERO,
        };
        let err = store.mark_proven(key, B256::ZERO).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTransfer(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let original = vec![
            transfer(1, BridgeStatus::Initiated, 100),
            transfer(2, BridgeStatus::Proven, 200),
        ];
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Vec<BridgeTransaction> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].status, BridgeStatus::Proven);
    }
}
