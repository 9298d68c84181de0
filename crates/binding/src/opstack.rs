//! OP Stack contract bindings.
//!
//! Includes contracts for L2→L1 withdrawals:
//! - L2ToL1MessagePasser (L2 predeploy)
//! - OptimismPortal2 (L1 contract)
//! - DisputeGameFactory (L1 contract)

use alloy_primitives::{address, Address, B256};
use alloy_sol_types::sol;

/// L2ToL1MessagePasser predeploy address (same on all OP Stack chains).
pub const MESSAGE_PASSER_ADDRESS: Address = address!("0x4200000000000000000000000000000000000016");

/// Output root version byte for the v0 output root preimage.
pub const OUTPUT_VERSION_V0: B256 = B256::ZERO;

sol! {
    /// L2ToL1MessagePasser - L2 predeploy contract for initiating withdrawals
    #[sol(rpc)]
    #[derive(Debug)]
    interface IL2ToL1MessagePasser {
        /// Emitted when a withdrawal is initiated on L2
        event MessagePassed(
            uint256 indexed nonce,
            address indexed sender,
            address indexed target,
            uint256 value,
            uint256 gasLimit,
            bytes data,
            bytes32 withdrawalHash
        );

        /// Check if a withdrawal message has been sent
        function sentMessages(bytes32) external view returns (bool);
    }

    /// OptimismPortal2 - Main L1 contract for withdrawal proving and finalization
    #[sol(rpc)]
    interface IOptimismPortal2 {
        /// Emitted when a withdrawal is proven on L1
        event WithdrawalProven(
            bytes32 indexed withdrawalHash,
            address indexed from,
            address indexed to
        );

        /// Query if a withdrawal has been finalized
        function finalizedWithdrawals(bytes32 withdrawalHash)
            external view returns (bool);

        /// Get the proof maturity delay (usually 7 days = 604800 seconds)
        function proofMaturityDelaySeconds()
            external view returns (uint256);

        /// Get the respected game type for filtering dispute games
        function respectedGameType()
            external view returns (uint32);

        /// Prove a withdrawal transaction (requires merkle proof)
        function proveWithdrawalTransaction(
            WithdrawalTransaction calldata _tx,
            uint256 _disputeGameIndex,
            OutputRootProof calldata _outputRootProof,
            bytes[] calldata _withdrawalProof
        ) external;
    }

    /// DisputeGameFactory - Used to find dispute games for proof generation
    #[sol(rpc)]
    interface IDisputeGameFactory {
        /// Dispute game search result
        struct GameSearchResult {
            uint256 index;
            bytes32 metadata;
            uint256 timestamp;
            bytes32 rootClaim;
            bytes extraData;
        }

        /// Get the total number of dispute games created
        function gameCount() external view returns (uint256 gameCount_);

        /// Find latest games of a given type
        function findLatestGames(
            uint32 _gameType,
            uint256 _start,
            uint256 _n
        ) external view returns (GameSearchResult[] memory);
    }

    /// IFaultDisputeGame - Standard interface for fault dispute games
    #[sol(rpc)]
    interface IFaultDisputeGame {
        /// Get the L2 block number this game is disputing
        function l2BlockNumber() external view returns (uint256);

        /// Get the root claim (output root)
        function rootClaim() external view returns (bytes32);
    }

    /// Output root proof structure (used in proving withdrawals)
    #[derive(Debug, PartialEq, Eq)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 messagePasserStorageRoot;
        bytes32 latestBlockhash;
    }

    /// Withdrawal transaction structure (shared across contracts)
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }
}
