//! Event decoding over transaction receipts.
//!
//! Builders know exactly which event they expect in a receipt; this crate
//! gives them a typed lookup keyed on the event's topic hash, with an optional
//! emitter-address pre-filter. There is no dynamic union-of-ABIs discovery:
//! each builder injects the decoder for the one event it needs.

use alloy_primitives::Address;
use alloy_rpc_types_eth::{Log, TransactionReceipt};
use alloy_sol_types::SolEvent;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    /// The expected event was not emitted by the transaction.
    ///
    /// This is fatal for the proof attempt: the withdrawal the caller expected
    /// did not happen, so retrying will not help.
    #[error("event {0} not found in receipt")]
    NotFound(&'static str),

    /// A log matched the topic hash but its payload did not decode.
    #[error("event {0} failed to decode: {1}")]
    Malformed(&'static str, String),
}

/// A decoded event together with the log metadata callers need.
#[derive(Debug, Clone)]
pub struct Decoded<E> {
    pub event: E,
    pub emitter: Address,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
}

/// Borrow the logs out of a typed receipt envelope.
pub fn receipt_logs(receipt: &TransactionReceipt) -> &[Log] {
    receipt.inner.logs()
}

/// Find and decode the first occurrence of event `E` in `logs`.
///
/// Logs are matched by `E`'s topic hash; when `emitter` is given, logs from
/// other contracts are skipped first. Returns [`EventError::NotFound`] if no
/// log matches.
pub fn find_event<E: SolEvent>(
    logs: &[Log],
    emitter: Option<Address>,
) -> Result<Decoded<E>, EventError> {
    for log in logs {
        if let Some(address) = emitter {
            if log.inner.address != address {
                continue;
            }
        }

        if log.inner.data.topics().first() != Some(&E::SIGNATURE_HASH) {
            continue;
        }

        let event = E::decode_log_data(&log.inner.data)
            .map_err(|e| EventError::Malformed(E::SIGNATURE, e.to_string()))?;

        return Ok(Decoded {
            event,
            emitter: log.inner.address,
            block_number: log.block_number,
            log_index: log.log_index,
        });
    }

    Err(EventError::NotFound(E::SIGNATURE))
}
