//! Arbitrum / Orbit contract bindings.
//!
//! Covers the L2→L1 message path:
//! - ArbSys (L2 precompile emitting `L2ToL1Tx`)
//! - NodeInterface (L2 precompile constructing outbox Merkle proofs)
//! - Outbox (L1 contract executing L2→L1 messages)
//! - RollupCore (L1 contract tracking confirmed assertions, classic and Bold)

use alloy_primitives::{address, Address};
use alloy_sol_types::sol;

/// ArbSys precompile address (same on all Arbitrum chains).
pub const ARB_SYS_ADDRESS: Address = address!("0x0000000000000000000000000000000000000064");

/// NodeInterface virtual contract address (same on all Arbitrum chains).
pub const NODE_INTERFACE_ADDRESS: Address = address!("0x00000000000000000000000000000000000000C8");

sol! {
    /// ArbSys - L2 precompile for L2→L1 messaging
    #[sol(rpc)]
    interface IArbSys {
        /// Emitted for every outgoing L2→L1 message
        event L2ToL1Tx(
            address caller,
            address indexed destination,
            uint256 indexed hash,
            uint256 indexed position,
            uint256 arbBlockNum,
            uint256 ethBlockNum,
            uint256 timestamp,
            uint256 callvalue,
            bytes data
        );
    }

    /// NodeInterface - L2 virtual contract for constructing outbox proofs
    #[sol(rpc)]
    interface INodeInterface {
        /// Construct the Merkle proof for the leaf at `leaf` in a send tree of `size` leaves
        function constructOutboxProof(uint64 size, uint64 leaf)
            external view returns (bytes32 send, bytes32 root, bytes32[] memory proof);
    }

    /// Outbox - L1 contract that executes L2→L1 messages
    #[sol(rpc)]
    interface IOutbox {
        /// Check whether the message at `index` has already been executed
        function isSpent(uint256 index) external view returns (bool);
    }

    /// Classic (pre-Bold) rollup contract
    #[sol(rpc)]
    interface IRollupCore {
        /// Machine global state committed by an assertion
        struct GlobalState {
            bytes32[2] bytes32Vals;
            uint64[2] u64Vals;
        }

        /// Execution state of the rollup machine before/after a node
        struct ExecutionState {
            GlobalState globalState;
            uint8 machineStatus;
        }

        /// Node assertion (before state, after state, block span)
        struct Assertion {
            ExecutionState beforeState;
            ExecutionState afterState;
            uint64 numBlocks;
        }

        /// Emitted when a new node is created on the rollup
        event NodeCreated(
            uint64 indexed nodeNum,
            bytes32 indexed parentNodeHash,
            bytes32 indexed nodeHash,
            bytes32 executionHash,
            Assertion assertion,
            bytes32 afterInboxBatchAcc,
            bytes32 wasmModuleRoot,
            uint256 inboxMaxCount
        );

        /// Latest node confirmed on L1
        function latestConfirmed() external view returns (uint64);
    }

    /// Bold rollup contract (Arbitrum One post-Bold, Sepolia)
    #[sol(rpc)]
    interface IRollupBold {
        /// Machine global state committed by an assertion
        struct GlobalState {
            bytes32[2] bytes32Vals;
            uint64[2] u64Vals;
        }

        /// Assertion state (Bold's replacement for ExecutionState)
        struct AssertionState {
            GlobalState globalState;
            uint8 machineStatus;
            bytes32 endHistoryRoot;
        }

        /// Per-assertion config snapshot
        struct ConfigData {
            bytes32 wasmModuleRoot;
            uint256 requiredStake;
            address challengeManager;
            uint64 confirmPeriodBlocks;
            uint64 nextInboxPosition;
        }

        /// State data about the parent assertion
        struct BeforeStateData {
            bytes32 prevPrevAssertionHash;
            bytes32 sequencerBatchAcc;
            ConfigData configData;
        }

        /// Inputs required to create an assertion
        struct AssertionInputs {
            BeforeStateData beforeStateData;
            AssertionState beforeState;
            AssertionState afterState;
        }

        /// Emitted when a new assertion is created on the rollup
        event AssertionCreated(
            bytes32 indexed assertionHash,
            bytes32 indexed parentAssertionHash,
            AssertionInputs assertion,
            bytes32 afterInboxBatchAcc,
            uint256 inboxMaxCount,
            bytes32 wasmModuleRoot,
            uint256 requiredStake,
            address challengeManager,
            uint64 confirmPeriodBlocks
        );

        /// Latest assertion confirmed on L1
        function latestConfirmed() external view returns (bytes32);
    }
}
