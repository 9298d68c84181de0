//! zkSync bridge-hub claims.
//!
//! The zkSync proxy bridge performs its own finality checks on-chain, so the
//! claim payload is nothing more than the ABI-encoded origin transaction hash.

use alloy_primitives::{Bytes, TxHash};
use alloy_sol_types::SolValue;

/// Claim input for the zkSync bridge family.
#[derive(Debug, Clone, Copy)]
pub struct ZksyncProof {
    pub origin_tx: TxHash,
}

impl ZksyncProof {
    /// ABI-encode the origin transaction hash as a single `bytes32`.
    pub fn encode_claim_params(&self) -> Bytes {
        Bytes::from(self.origin_tx.abi_encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn test_claim_params_are_the_padded_tx_hash() {
        let hash = B256::repeat_byte(0x5a);
        let params = ZksyncProof { origin_tx: hash }.encode_claim_params();

        assert_eq!(params.len(), 32);
        assert_eq!(params.as_ref(), hash.as_slice());
    }
}
