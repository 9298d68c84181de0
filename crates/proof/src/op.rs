//! OP-Stack withdrawal proofs (two-phase).
//!
//! Phase A (*prove*) runs once a dispute game covering the withdrawal's L2
//! block exists on the destination chain: it builds the output-root proof and
//! the Merkle-Patricia storage proof that `proveWithdrawalTransaction`
//! expects. Phase B (*claim*) runs after the challenge period and only needs
//! the withdrawal transaction tuple re-encoded for the pool's `claim`.

use crate::{rlp_patch::patch_proof, ProofError};
use alloy_primitives::{keccak256, Bytes, TxHash, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{BlockNumberOrTag, Log};
use alloy_sol_types::SolValue;
use binding::opstack::{
    IDisputeGameFactory, IDisputeGameFactory::GameSearchResult, IL2ToL1MessagePasser,
    IOptimismPortal2, OutputRootProof, WithdrawalTransaction, MESSAGE_PASSER_ADDRESS,
    OUTPUT_VERSION_V0,
};
use events::find_event;
use tracing::debug;

/// How many recent games to scan when looking for one covering a withdrawal.
/// Games are created roughly hourly, so this reaches back over a month.
const GAME_LOOKBACK: u64 = 1000;

/// A withdrawal decoded from the origin transaction's `MessagePassed` event.
#[derive(Debug, Clone)]
pub struct OpWithdrawal {
    pub transaction: WithdrawalTransaction,
    pub withdrawal_hash: B256,
    /// L2 block in which the withdrawal was initiated
    pub l2_block: u64,
}

/// Everything `proveWithdrawalTransaction` needs.
#[derive(Debug, Clone)]
pub struct OpProveParams {
    pub dispute_game_index: U256,
    pub output_root_proof: OutputRootProof,
    pub transaction: WithdrawalTransaction,
    pub withdrawal_proof: Vec<Bytes>,
}

/// Fetch the origin receipt and decode the withdrawal out of it.
pub async fn fetch_withdrawal<P>(origin: &P, tx_hash: TxHash) -> Result<OpWithdrawal, ProofError>
where
    P: Provider + Clone,
{
    let receipt = origin
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(ProofError::rpc)?
        .ok_or_else(|| ProofError::rpc(format!("receipt {tx_hash} not available")))?;

    withdrawal_from_logs(events::receipt_logs(&receipt))
}

/// Decode `MessagePassed` from a receipt's logs and verify its hash.
pub fn withdrawal_from_logs(logs: &[Log]) -> Result<OpWithdrawal, ProofError> {
    let decoded = find_event::<IL2ToL1MessagePasser::MessagePassed>(
        logs,
        Some(MESSAGE_PASSER_ADDRESS),
    )?;
    let event = decoded.event;

    let transaction = WithdrawalTransaction {
        nonce: event.nonce,
        sender: event.sender,
        target: event.target,
        value: event.value,
        gasLimit: event.gasLimit,
        data: event.data,
    };

    let computed = compute_withdrawal_hash(&transaction);
    if computed != event.withdrawalHash {
        return Err(ProofError::WithdrawalHashMismatch {
            event: event.withdrawalHash,
            computed,
        });
    }

    let l2_block = decoded
        .block_number
        .ok_or_else(|| ProofError::Malformed("MessagePassed log missing block number".into()))?;

    Ok(OpWithdrawal {
        transaction,
        withdrawal_hash: event.withdrawalHash,
        l2_block,
    })
}

/// Phase A: build the full withdrawal proof against a dispute game covering
/// the withdrawal's block.
///
/// Fails with [`ProofError::NoGameFound`] while no qualifying game exists;
/// that is the dispute-game delay window and resolves on a later pass.
pub async fn build_withdrawal_proof<Po, Pd>(
    origin: &Po,
    destination: &Pd,
    bridge: &config::OpBridge,
    withdrawal: &OpWithdrawal,
) -> Result<OpProveParams, ProofError>
where
    Po: Provider + Clone,
    Pd: Provider + Clone,
{
    // 1. Find a dispute game covering the withdrawal block
    let portal = IOptimismPortal2::new(bridge.portal, destination);
    let game_type = portal.respectedGameType().call().await?;

    let factory = IDisputeGameFactory::new(bridge.dispute_game_factory, destination);
    let game_count = factory.gameCount().call().await?;
    if game_count == U256::ZERO {
        return Err(ProofError::NoGameFound(withdrawal.l2_block));
    }

    let start = game_count - U256::from(1);
    let games = factory
        .findLatestGames(game_type, start, U256::from(GAME_LOOKBACK))
        .call()
        .await?;

    let (dispute_game_index, game_l2_block) = select_game(&games, withdrawal.l2_block)?;

    debug!(
        game_index = %dispute_game_index,
        game_l2_block,
        withdrawal_block = withdrawal.l2_block,
        "Found dispute game covering withdrawal"
    );

    // 2. Header of the game's L2 block: the output root proof must match the
    //    state the game committed to, not the withdrawal's own block.
    let block = origin
        .get_block_by_number(BlockNumberOrTag::Number(game_l2_block))
        .await
        .map_err(ProofError::rpc)?
        .ok_or_else(|| ProofError::rpc(format!("block {game_l2_block} not available")))?;

    // 3. Storage proof for the sent-messages slot at the game's block
    let slot = compute_storage_slot(withdrawal.withdrawal_hash);
    let proof_result = origin
        .get_proof(MESSAGE_PASSER_ADDRESS, vec![slot])
        .block_id(BlockNumberOrTag::Number(game_l2_block).into())
        .await
        .map_err(ProofError::rpc)?;

    let storage_proof = proof_result
        .storage_proof
        .first()
        .ok_or_else(|| ProofError::Malformed("eth_getProof returned no storage proof".into()))?
        .proof
        .clone();

    // 4. Repair the final branch-embedded leaf if present. The trie key is
    //    the hashed storage slot (secure trie).
    let withdrawal_proof = patch_proof(storage_proof, keccak256(slot));

    debug!(
        proof_nodes = withdrawal_proof.len(),
        "Built withdrawal storage proof"
    );

    Ok(OpProveParams {
        dispute_game_index,
        output_root_proof: make_output_root_proof(
            block.header.state_root,
            proof_result.storage_hash,
            block.header.hash,
        ),
        transaction: withdrawal.transaction.clone(),
        withdrawal_proof,
    })
}

/// Pick a game whose claimed L2 block covers the withdrawal.
///
/// `games` comes from `findLatestGames` in descending creation order. The
/// claimed block is decoded from each game's extra data (a single abi-encoded
/// uint256); undecodable entries are skipped. Of the games that cover the
/// withdrawal we keep the oldest, which has had the longest time to resolve.
pub fn select_game(
    games: &[GameSearchResult],
    withdrawal_block: u64,
) -> Result<(U256, u64), ProofError> {
    let mut selected = None;

    for game in games {
        let Some(claimed_block) = claimed_l2_block(&game.extraData) else {
            continue;
        };
        if claimed_block >= withdrawal_block {
            selected = Some((game.index, claimed_block));
        } else {
            // Descending order: nothing older can cover the withdrawal.
            break;
        }
    }

    selected.ok_or(ProofError::NoGameFound(withdrawal_block))
}

/// Decode the claimed L2 block number from a game's extra data.
fn claimed_l2_block(extra_data: &Bytes) -> Option<u64> {
    if extra_data.len() < 32 {
        return None;
    }
    U256::from_be_slice(&extra_data[..32]).try_into().ok()
}

/// Assemble the v0 output root preimage.
pub fn make_output_root_proof(
    state_root: B256,
    message_passer_storage_root: B256,
    latest_block_hash: B256,
) -> OutputRootProof {
    OutputRootProof {
        version: OUTPUT_VERSION_V0,
        stateRoot: state_root,
        messagePasserStorageRoot: message_passer_storage_root,
        latestBlockhash: latest_block_hash,
    }
}

/// Compute the storage slot for a withdrawal hash in the message passer.
///
/// The layout is `mapping(bytes32 => bool) public sentMessages` at slot 0, so
/// the slot is `keccak256(withdrawalHash ++ bytes32(0))`.
pub fn compute_storage_slot(withdrawal_hash: B256) -> B256 {
    let mut data = [0u8; 64];
    data[0..32].copy_from_slice(withdrawal_hash.as_slice());
    keccak256(data)
}

/// Compute the withdrawal hash the same way Solidity's `Hashing.hashWithdrawal`
/// does: `keccak256(abi.encode(nonce, sender, target, value, gasLimit, data))`.
pub fn compute_withdrawal_hash(tx: &WithdrawalTransaction) -> B256 {
    let encoded = (
        &tx.nonce,
        &tx.sender,
        &tx.target,
        &tx.value,
        &tx.gasLimit,
        &tx.data,
    )
        .abi_encode_sequence();

    keccak256(encoded)
}

/// Phase B: the claim payload for the destination pool.
///
/// `claim` re-verifies against the portal, so the payload is just the
/// withdrawal transaction tuple.
pub fn encode_claim_params(tx: &WithdrawalTransaction) -> Bytes {
    let encoded = (
        &tx.nonce,
        &tx.sender,
        &tx.target,
        &tx.value,
        &tx.gasLimit,
        &tx.data,
    )
        .abi_encode_sequence();

    Bytes::from(encoded)
}

/// Refuse to claim before the withdrawal's challenge period has elapsed.
pub const fn ensure_challenge_period(
    origin_timestamp: u64,
    challenge_period_secs: u64,
    now: u64,
) -> Result<(), ProofError> {
    let matures_at = origin_timestamp.saturating_add(challenge_period_secs);
    if now < matures_at {
        return Err(ProofError::ChallengePeriodActive {
            remaining_secs: matures_at - now,
        });
    }
    Ok(())
}
