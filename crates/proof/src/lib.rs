//! Proof construction for every supported bridge family.
//!
//! Each builder consumes an origin-chain transaction hash and produces the
//! family-specific proof bundle plus the encoded bytes the destination
//! contract's `claim` (or the portal's `proveWithdrawalTransaction`) expects:
//!
//! - [`arb`]: Arbitrum/Orbit outbox Merkle proof
//! - [`op`]: OP-Stack dispute-game withdrawal proof (two-phase)
//! - [`cctp`]: Circle attestation polling
//! - [`zksync`]: pass-through claim for the zkSync bridge hub
//!
//! Bundles are built fresh per attempt and are valid only for the exact
//! `(origin tx, origin chain, destination chain)` they were built for; nothing
//! here is cached.

pub mod arb;
pub mod cctp;
pub mod op;
pub mod rlp_patch;
pub mod zksync;

use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

/// Family-tagged proof bundle.
#[derive(Debug, Clone)]
pub enum ProofBundle {
    Arbitrum(arb::ArbOutboxProof),
    OpStack(op::OpProveParams),
    Cctp(cctp::CctpProof),
    Zksync(zksync::ZksyncProof),
}

/// How a failure should be handled by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retry on a later pass; the world just hasn't caught up yet.
    Transient,
    /// Do not retry automatically; log with the transfer identity and skip.
    Permanent,
}

#[derive(Error, Debug)]
pub enum ProofError {
    // ── Permanent per transaction ────────────────────────────────────────
    /// The expected bridge event was not emitted by the origin transaction.
    #[error(transparent)]
    Event(#[from] events::EventError),

    /// The Arbitrum outbox reports the leaf as already executed.
    #[error("outbox leaf {0} already spent")]
    AlreadySpent(U256),

    /// The event's withdrawal hash does not match the recomputed one.
    #[error("withdrawal hash mismatch: event {event}, computed {computed}")]
    WithdrawalHashMismatch { event: B256, computed: B256 },

    /// The origin chain has no usable bridge configuration.
    #[error("no {stack} bridge configured for chain {chain_id}")]
    MissingBridgeConfig { chain_id: u64, stack: &'static str },

    /// The origin network is not in the registry or carries an unusable tag.
    #[error("unrecognized bridge stack for chain {0}")]
    UnknownStack(u64),

    /// The destination pool has not authorized this origin.
    #[error("origin {origin_chain_id}/{origin_bridge} not authorized by pool")]
    UnauthorizedOrigin {
        origin_chain_id: u64,
        origin_bridge: Address,
    },

    /// A response or payload could not be interpreted.
    #[error("malformed data: {0}")]
    Malformed(String),

    // ── Transient ────────────────────────────────────────────────────────
    /// No dispute game covering the withdrawal's L2 block exists yet.
    #[error("no dispute game covering L2 block {0} yet")]
    NoGameFound(u64),

    /// The withdrawal's challenge period has not elapsed.
    #[error("challenge period not elapsed, {remaining_secs}s remaining")]
    ChallengePeriodActive { remaining_secs: u64 },

    /// The message is not yet part of a confirmed rollup assertion.
    #[error("outbox leaf {leaf} not confirmed yet (send count {send_count})")]
    LeafNotConfirmed { leaf: u64, send_count: u64 },

    /// Circle has not finished attesting the message.
    #[error("attestation still pending for message {0}")]
    AttestationPending(B256),

    /// RPC or HTTP transport failure; safe to retry on a later pass.
    #[error("rpc failure: {0}")]
    Rpc(String),
}

impl ProofError {
    /// Wrap any displayable transport error as a transient RPC failure.
    pub fn rpc(e: impl std::fmt::Display) -> Self {
        Self::Rpc(e.to_string())
    }

    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Event(_)
            | Self::AlreadySpent(_)
            | Self::WithdrawalHashMismatch { .. }
            | Self::MissingBridgeConfig { .. }
            | Self::UnknownStack(_)
            | Self::UnauthorizedOrigin { .. }
            | Self::Malformed(_) => FailureClass::Permanent,

            Self::NoGameFound(_)
            | Self::ChallengePeriodActive { .. }
            | Self::LeafNotConfirmed { .. }
            | Self::AttestationPending(_)
            | Self::Rpc(_) => FailureClass::Transient,
        }
    }
}

impl From<alloy_contract::Error> for ProofError {
    fn from(e: alloy_contract::Error) -> Self {
        Self::Rpc(e.to_string())
    }
}

impl From<client::RpcError> for ProofError {
    fn from(e: client::RpcError) -> Self {
        match e {
            client::RpcError::Malformed(m) => Self::Malformed(m),
            other => Self::Rpc(other.to_string()),
        }
    }
}

impl ProofBundle {
    /// The ABI-encoded `claimParams` bytes for the destination pool's `claim`.
    ///
    /// The OP-Stack variant carries prove-phase parameters instead; its claim
    /// payload is derived from the withdrawal transaction alone (see
    /// [`op::encode_claim_params`]).
    pub fn claim_params(&self) -> Bytes {
        match self {
            Self::Arbitrum(p) => p.encode_claim_params(),
            Self::OpStack(p) => op::encode_claim_params(&p.transaction),
            Self::Cctp(p) => p.encode_claim_params(),
            Self::Zksync(p) => p.encode_claim_params(),
        }
    }
}
