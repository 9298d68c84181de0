//! Circle CCTP contract bindings.
//!
//! Only the MessageTransmitter surface is needed: the `MessageSent` event on the
//! origin chain (matched by topic hash since the message body is opaque bytes)
//! and `receiveMessage` on the destination chain.

use alloy_sol_types::sol;

sol! {
    /// MessageTransmitter - CCTP message relay contract
    #[sol(rpc)]
    interface IMessageTransmitter {
        /// Emitted when a cross-chain message is dispatched (e.g. a USDC burn)
        event MessageSent(bytes message);

        /// Mint on the destination chain given the message and Circle's attestation
        function receiveMessage(bytes calldata message, bytes calldata attestation)
            external returns (bool success);
    }
}
