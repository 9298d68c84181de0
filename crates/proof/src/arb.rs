//! Arbitrum / Orbit outbox proofs.
//!
//! The L2→L1 message is located through the origin transaction's `L2ToL1Tx`
//! event, checked against the destination Outbox's spent bitmap, anchored to
//! the latest L1-confirmed rollup assertion, and finally proven with the
//! NodeInterface precompile's `constructOutboxProof`.

use crate::ProofError;
use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter, Log};
use alloy_sol_types::{SolEvent, SolValue};
use binding::arbitrum::{
    IArbSys, INodeInterface, IOutbox, IRollupBold, IRollupCore, ARB_SYS_ADDRESS,
    NODE_INTERFACE_ADDRESS,
};
use events::find_event;
use tracing::debug;

/// The `L2ToL1Tx` event fields a proof needs.
///
/// `position` is the outbox leaf index exactly as emitted; it is passed
/// through to the proof and claim encodings unmodified, never recomputed.
#[derive(Debug, Clone)]
pub struct L2ToL1Message {
    pub caller: Address,
    pub destination: Address,
    pub position: U256,
    pub arb_block_num: U256,
    pub eth_block_num: U256,
    pub timestamp: U256,
    pub callvalue: U256,
    pub data: Bytes,
}

/// Complete outbox proof bundle for the destination `claim` call.
#[derive(Debug, Clone)]
pub struct ArbOutboxProof {
    pub proof: Vec<B256>,
    pub leaf: U256,
    pub caller: Address,
    pub destination: Address,
    pub arb_block_num: U256,
    pub eth_block_num: U256,
    pub timestamp: U256,
    pub callvalue: U256,
    pub data: Bytes,
}

impl ArbOutboxProof {
    /// ABI-encode the bundle the way the destination `claim` expects:
    /// `(bytes32[] proof, uint256 leaf, address caller, address destination,
    ///   uint256 arbBlockNum, uint256 ethBlockNum, uint256 timestamp,
    ///   uint256 callvalue, bytes data)`.
    pub fn encode_claim_params(&self) -> Bytes {
        let encoded = (
            self.proof.as_slice(),
            &self.leaf,
            &self.caller,
            &self.destination,
            &self.arb_block_num,
            &self.eth_block_num,
            &self.timestamp,
            &self.callvalue,
            &self.data,
        )
            .abi_encode_sequence();

        Bytes::from(encoded)
    }
}

/// Decode `L2ToL1Tx` from a receipt's logs.
pub fn message_from_logs(logs: &[Log]) -> Result<L2ToL1Message, ProofError> {
    let decoded = find_event::<IArbSys::L2ToL1Tx>(logs, Some(ARB_SYS_ADDRESS))?;
    let event = decoded.event;

    Ok(L2ToL1Message {
        caller: event.caller,
        destination: event.destination,
        position: event.position,
        arb_block_num: event.arbBlockNum,
        eth_block_num: event.ethBlockNum,
        timestamp: event.timestamp,
        callvalue: event.callvalue,
        data: event.data,
    })
}

/// Fail with [`ProofError::AlreadySpent`] if the destination Outbox has
/// already executed this leaf.
pub async fn ensure_unspent<P>(
    destination: &P,
    outbox: Address,
    leaf: U256,
) -> Result<(), ProofError>
where
    P: Provider + Clone,
{
    let outbox = IOutbox::new(outbox, destination);
    let spent = outbox.isSpent(leaf).call().await?;
    check_unspent(leaf, spent)
}

/// Classify the Outbox spent bit for a leaf.
pub const fn check_unspent(leaf: U256, spent: bool) -> Result<(), ProofError> {
    if spent {
        return Err(ProofError::AlreadySpent(leaf));
    }
    Ok(())
}

/// Recover the L2 block hash committed by the latest L1-confirmed assertion.
///
/// The after-state lives in the assertion-creation event, which differs by
/// rollup variant: Bold rollups emit `AssertionCreated`, classic ones
/// `NodeCreated`.
pub async fn confirmed_l2_block_hash<P>(
    destination: &P,
    bridge: &config::ArbBridge,
) -> Result<B256, ProofError>
where
    P: Provider + Clone,
{
    if bridge.bold {
        let rollup = IRollupBold::new(bridge.rollup, destination);
        let assertion_hash = rollup.latestConfirmed().call().await?;

        let filter = Filter::new()
            .address(bridge.rollup)
            .event_signature(IRollupBold::AssertionCreated::SIGNATURE_HASH)
            .topic1(assertion_hash)
            .from_block(BlockNumberOrTag::Earliest);
        let logs = destination.get_logs(&filter).await.map_err(ProofError::rpc)?;
        let log = logs.first().ok_or_else(|| {
            ProofError::Malformed(format!("no AssertionCreated event for {assertion_hash}"))
        })?;

        let event = IRollupBold::AssertionCreated::decode_log_data(&log.inner.data)
            .map_err(|e| ProofError::Malformed(format!("AssertionCreated: {e}")))?;

        Ok(event.assertion.afterState.globalState.bytes32Vals[0])
    } else {
        let rollup = IRollupCore::new(bridge.rollup, destination);
        let node_num = rollup.latestConfirmed().call().await?;

        let filter = Filter::new()
            .address(bridge.rollup)
            .event_signature(IRollupCore::NodeCreated::SIGNATURE_HASH)
            .topic1(B256::from(U256::from(node_num)))
            .from_block(BlockNumberOrTag::Earliest);
        let logs = destination.get_logs(&filter).await.map_err(ProofError::rpc)?;
        let log = logs.first().ok_or_else(|| {
            ProofError::Malformed(format!("no NodeCreated event for node {node_num}"))
        })?;

        let event = IRollupCore::NodeCreated::decode_log_data(&log.inner.data)
            .map_err(|e| ProofError::Malformed(format!("NodeCreated: {e}")))?;

        Ok(event.assertion.afterState.globalState.bytes32Vals[0])
    }
}

/// Build the full outbox proof for an L2→L1 message.
pub async fn build_outbox_proof<Po, Pd>(
    origin: &Po,
    destination: &Pd,
    bridge: &config::ArbBridge,
    tx_hash: TxHash,
) -> Result<ArbOutboxProof, ProofError>
where
    Po: Provider + Clone,
    Pd: Provider + Clone,
{
    // 1. Locate the message in the origin transaction
    let receipt = origin
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(ProofError::rpc)?
        .ok_or_else(|| ProofError::rpc(format!("receipt {tx_hash} not available")))?;
    let message = message_from_logs(events::receipt_logs(&receipt))?;

    // 2. Bail out before any further work if the leaf was already claimed
    ensure_unspent(destination, bridge.outbox, message.position).await?;

    // 3. Anchor to the latest confirmed assertion's L2 block
    let l2_block_hash = confirmed_l2_block_hash(destination, bridge).await?;

    // 4. The typed block response strips Arbitrum's `sendCount`; fetch raw
    let block = client::raw_block_by_hash(origin, l2_block_hash).await?;
    let send_count = client::raw_block_quantity(&block, "sendCount")?;

    let leaf: u64 = message
        .position
        .try_into()
        .map_err(|_| ProofError::Malformed(format!("leaf {} out of range", message.position)))?;
    if leaf >= send_count {
        // Message exists but is past the confirmed assertion; try again once
        // a newer assertion confirms.
        return Err(ProofError::LeafNotConfirmed { leaf, send_count });
    }

    debug!(leaf, send_count, %l2_block_hash, "Constructing outbox proof");

    // 5. Merkle proof from the NodeInterface precompile
    let node_interface = INodeInterface::new(NODE_INTERFACE_ADDRESS, origin);
    let outbox_proof = node_interface
        .constructOutboxProof(send_count, leaf)
        .call()
        .await?;

    Ok(ArbOutboxProof {
        proof: outbox_proof.proof,
        leaf: message.position,
        caller: message.caller,
        destination: message.destination,
        arb_block_num: message.arb_block_num,
        eth_block_num: message.eth_block_num,
        timestamp: message.timestamp,
        callvalue: message.callvalue,
        data: message.data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_consensus::{Receipt, ReceiptEnvelope, ReceiptWithBloom};
    use alloy_primitives::address;
    use alloy_provider::{mock::Asserter, ProviderBuilder};
    use alloy_rpc_types_eth::TransactionReceipt;

    fn receipt_with(logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            inner: ReceiptEnvelope::Eip1559(ReceiptWithBloom {
                receipt: Receipt {
                    status: true.into(),
                    cumulative_gas_used: 21_000,
                    logs,
                },
                logs_bloom: Default::default(),
            }),
            transaction_hash: TxHash::repeat_byte(0x11),
            transaction_index: Some(0),
            block_hash: Some(B256::repeat_byte(0x22)),
            block_number: Some(1),
            gas_used: 21_000,
            effective_gas_price: 0,
            blob_gas_used: None,
            blob_gas_price: None,
            from: Address::ZERO,
            to: None,
            contract_address: None,
        }
    }

    fn l2_to_l1_log(position: u64) -> Log {
        let event = IArbSys::L2ToL1Tx {
            caller: address!("0x1111111111111111111111111111111111111111"),
            destination: address!("0x2222222222222222222222222222222222222222"),
            hash: U256::from(0xabcdu64),
            position: U256::from(position),
            arbBlockNum: U256::from(1000),
            ethBlockNum: U256::from(2000),
            timestamp: U256::from(1_700_000_000u64),
            callvalue: U256::from(5),
            data: Bytes::from(vec![0x01, 0x02, 0x03]),
        };
        Log {
            inner: alloy_primitives::Log {
                address: ARB_SYS_ADDRESS,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_message_from_logs_passes_position_through() {
        let message = message_from_logs(&[l2_to_l1_log(42)]).unwrap();
        assert_eq!(message.position, U256::from(42));
        assert_eq!(message.arb_block_num, U256::from(1000));
        assert_eq!(message.callvalue, U256::from(5));
    }

    #[test]
    fn test_message_from_logs_requires_arb_sys_emitter() {
        let mut log = l2_to_l1_log(42);
        log.inner.address = address!("0x9999999999999999999999999999999999999999");
        let err = message_from_logs(&[log]).unwrap_err();
        assert!(matches!(
            err,
            ProofError::Event(events::EventError::NotFound(_))
        ));
    }

    #[test]
    fn test_spent_leaf_is_rejected() {
        let err = check_unspent(U256::from(42), true).unwrap_err();
        assert!(matches!(err, ProofError::AlreadySpent(leaf) if leaf == U256::from(42)));
        assert_eq!(err.class(), crate::FailureClass::Permanent);
    }

    #[test]
    fn test_unspent_leaf_is_accepted() {
        check_unspent(U256::from(42), false).unwrap();
    }

    #[tokio::test]
    async fn test_spent_leaf_stops_proof_construction() {
        let origin_asserter = Asserter::new();
        let origin = ProviderBuilder::new().connect_mocked_client(origin_asserter.clone());
        let destination_asserter = Asserter::new();
        let destination =
            ProviderBuilder::new().connect_mocked_client(destination_asserter.clone());

        origin_asserter.push_success(&receipt_with(vec![l2_to_l1_log(42)]));
        // Only the spent lookup is scripted: a rollup or block query after it
        // would hit the empty queue and fail the match below.
        destination_asserter.push_success(&Bytes::from(true.abi_encode()));

        let bridge = config::ArbBridge {
            rollup: Address::repeat_byte(0x0a),
            outbox: Address::repeat_byte(0x0b),
            bold: true,
        };

        let err = build_outbox_proof(&origin, &destination, &bridge, TxHash::repeat_byte(0x11))
            .await
            .unwrap_err();
        assert!(matches!(err, ProofError::AlreadySpent(leaf) if leaf == U256::from(42)));
    }

    #[test]
    fn test_encode_claim_params_round_trips() {
        let bundle = ArbOutboxProof {
            proof: vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
            leaf: U256::from(42),
            caller: address!("0x1111111111111111111111111111111111111111"),
            destination: address!("0x2222222222222222222222222222222222222222"),
            arb_block_num: U256::from(1000),
            eth_block_num: U256::from(2000),
            timestamp: U256::from(1_700_000_000u64),
            callvalue: U256::ZERO,
            data: Bytes::from(vec![0xde, 0xad]),
        };

        let encoded = bundle.encode_claim_params();
        let (proof, leaf, caller, destination, _, _, _, _, data) = <(
            Vec<B256>,
            U256,
            Address,
            Address,
            U256,
            U256,
            U256,
            U256,
            Bytes,
        )>::abi_decode_sequence(&encoded)
        .unwrap();

        assert_eq!(proof, bundle.proof);
        assert_eq!(leaf, U256::from(42));
        assert_eq!(caller, bundle.caller);
        assert_eq!(destination, bundle.destination);
        assert_eq!(data, bundle.data);
    }
}
