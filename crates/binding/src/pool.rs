//! Destination lending pool bindings.
//!
//! The pool's `claim` entry point verifies the family-specific proof bytes via
//! its configured proxy bridge and settles the transfer against any instant
//! loan it previously emitted.

use alloy_sol_types::sol;

sol! {
    /// RelayPool - destination chain lending pool
    #[sol(rpc)]
    interface IRelayPool {
        /// Per-origin authorization and debt accounting
        struct OriginSettings {
            uint256 maxDebt;
            uint256 outstandingDebt;
            address proxyBridge;
            uint8 bridgeFee;
            uint32 coolDown;
        }

        /// Emitted when the pool advances funds against a pending transfer
        event LoanEmitted(
            uint256 indexed nonce,
            address indexed recipient,
            address asset,
            uint256 amount,
            uint256 originChainId,
            address originBridge
        );

        /// Read authorization state for an origin (chain id, bridge contract)
        function authorizedOrigins(uint256 chainId, address bridge)
            external view returns (OriginSettings memory);

        /// Settle a transfer by verifying the family-specific proof bytes
        function claim(uint256 originChainId, address originBridge, bytes calldata claimParams)
            external returns (uint256 amount);
    }
}
