//! Circle CCTP attestation proofs.
//!
//! The burn transaction emits `MessageSent(bytes)`; Circle's Iris service
//! attests the keccak hash of that message off-chain. A claim needs the raw
//! message bytes plus the signed attestation, fetched from
//! `GET {iris}/attestations/{messageHash}`.

use crate::ProofError;
use alloy_primitives::{keccak256, Bytes, TxHash, B256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolValue;
use binding::cctp::IMessageTransmitter;
use events::find_event;
use serde::Deserialize;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::debug;

/// Transport retry schedule for the attestation API. Applies only to request
/// failures; a well-formed "pending" response is surfaced immediately.
const ATTESTATION_RETRIES: usize = 3;
const ATTESTATION_BACKOFF_MS: u64 = 500;

/// Iris attestation response body.
#[derive(Debug, Deserialize)]
pub struct AttestationResponse {
    pub attestation: Option<String>,
    pub status: String,
}

/// Message bytes and attestation ready for the destination `receiveMessage`.
#[derive(Debug, Clone)]
pub struct CctpProof {
    pub message: Bytes,
    pub message_hash: B256,
    pub attestation: Bytes,
}

impl CctpProof {
    /// ABI-encode `(bytes message, bytes attestation)`.
    pub fn encode_claim_params(&self) -> Bytes {
        Bytes::from((&self.message, &self.attestation).abi_encode_sequence())
    }
}

/// Extract the `MessageSent` payload from a burn receipt's logs.
pub fn message_from_logs(logs: &[Log]) -> Result<Bytes, ProofError> {
    let decoded = find_event::<IMessageTransmitter::MessageSent>(logs, None)?;
    Ok(decoded.event.message)
}

/// Interpret an Iris response for `message`.
///
/// Any status other than `complete` means Circle has not signed yet and the
/// transfer should be retried on a later pass.
pub fn parse_attestation(
    response: AttestationResponse,
    message: Bytes,
) -> Result<CctpProof, ProofError> {
    let message_hash = keccak256(&message);

    if response.status != "complete" {
        return Err(ProofError::AttestationPending(message_hash));
    }

    let attestation = response
        .attestation
        .ok_or_else(|| ProofError::Malformed("complete attestation without signature".into()))?;
    let attestation = attestation
        .strip_prefix("0x")
        .unwrap_or(&attestation)
        .parse::<Bytes>()
        .map_err(|e| ProofError::Malformed(format!("attestation hex: {e}")))?;

    Ok(CctpProof {
        message,
        message_hash,
        attestation,
    })
}

/// Build a CCTP proof: locate the burn message, then fetch Circle's
/// attestation for its hash.
pub async fn build_attestation_proof<P>(
    origin: &P,
    http: &reqwest::Client,
    base_url: &str,
    tx_hash: TxHash,
) -> Result<CctpProof, ProofError>
where
    P: Provider + Clone,
{
    let receipt = origin
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(ProofError::rpc)?
        .ok_or_else(|| ProofError::rpc(format!("receipt {tx_hash} not available")))?;
    let message = message_from_logs(events::receipt_logs(&receipt))?;
    let message_hash = keccak256(&message);

    let url = format!("{base_url}/attestations/{message_hash}");
    debug!(%message_hash, %url, "Fetching attestation");

    let strategy = ExponentialBackoff::from_millis(ATTESTATION_BACKOFF_MS)
        .take(ATTESTATION_RETRIES);
    let response: AttestationResponse = Retry::spawn(strategy, || async {
        http.get(&url)
            .send()
            .await
            .map_err(ProofError::rpc)?
            .error_for_status()
            .map_err(ProofError::rpc)?
            .json()
            .await
            .map_err(ProofError::rpc)
    })
    .await?;

    parse_attestation(response, message)
}
