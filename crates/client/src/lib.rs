//! Chain adapter: RPC providers keyed by network registry entries.
//!
//! One provider per chain, constructed from the immutable [`config::Network`]
//! entry (explicit RPC URL if configured, else the default public gateway).
//! Network failures surface as a typed [`RpcError`] so callers can distinguish
//! "not found" from "transient" from "malformed".

use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Bytes, B256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use config::Network;
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;

/// A function that signs a transaction request and returns signed bytes.
///
/// This abstraction keeps key handling out of the proof and orchestration
/// code; the orchestrator holds one signer per destination chain.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

#[derive(Error, Debug)]
pub enum RpcError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The requested object does not exist on chain
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient transport or endpoint failure; safe to retry later
    #[error("Transient RPC failure: {0}")]
    Transient(String),

    /// The endpoint returned a response we could not interpret
    #[error("Malformed RPC response: {0}")]
    Malformed(String),
}

/// Create an RPC provider for a registry entry.
pub fn connect(network: &Network) -> Result<impl Provider + Clone, RpcError> {
    connect_url(network.rpc_url())
}

/// Create an RPC provider from an explicit endpoint URL.
pub fn connect_url(rpc_url: &str) -> Result<impl Provider + Clone, RpcError> {
    let url = rpc_url
        .parse()
        .map_err(|e| RpcError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Fetch a block by hash through raw JSON-RPC.
///
/// The typed block response drops chain-specific fields (Arbitrum's
/// `sendCount` among them), so proof builders that need them go through
/// `eth_getBlockByHash` directly and get the untyped JSON object back.
pub async fn raw_block_by_hash<P>(provider: &P, hash: B256) -> Result<serde_json::Value, RpcError>
where
    P: Provider,
{
    let block: Option<serde_json::Value> = provider
        .raw_request("eth_getBlockByHash".into(), (hash, false))
        .await
        .map_err(|e| RpcError::Transient(format!("{}", e)))?;

    block.ok_or_else(|| RpcError::NotFound(format!("block {hash}")))
}

/// Read a quantity field (`0x`-prefixed hex) from a raw block object.
pub fn raw_block_quantity(block: &serde_json::Value, field: &str) -> Result<u64, RpcError> {
    let value = block
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::Malformed(format!("block field {field} missing")))?;

    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Malformed(format!("block field {field}: {e}")))
}

/// Create a SignerFn from a local private key and provider.
///
/// The provider is used to fill transaction fields (nonce, gas, fees) before
/// signing locally with the private key.
pub fn local_signer_fn<P>(
    private_key: &str,
    chain_id: u64,
    provider: P,
) -> Result<SignerFn, RpcError>
where
    P: Provider + Clone + 'static,
{
    let signer: PrivateKeySigner = private_key
        .parse()
        .map_err(|e| RpcError::InvalidPrivateKey(format!("{}", e)))?;
    let from_address = signer.address();
    let wallet = EthereumWallet::from(signer);

    Ok(Arc::new(move |mut tx: TransactionRequest| {
        let wallet = wallet.clone();
        let provider = provider.clone();
        Box::pin(async move {
            if tx.from.is_none() {
                tx.from = Some(from_address);
            }
            if tx.chain_id.is_none() {
                tx.chain_id = Some(chain_id);
            }
            let filled_tx = fill_transaction(tx, &provider).await?;

            // Build and sign the typed transaction
            let tx_envelope: TxEnvelope = filled_tx
                .build(&wallet)
                .await
                .map_err(|e| eyre::eyre!("{}", e))?;

            // Encode to EIP-2718 bytes
            let mut encoded = Vec::new();
            tx_envelope.encode_2718(&mut encoded);
            Ok(Bytes::from(encoded))
        })
    }))
}

/// Fill missing transaction fields (nonce, fees, gas) using the provider.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
) -> eyre::Result<TransactionRequest>
where
    P: Provider,
{
    let from = tx
        .from
        .ok_or_else(|| eyre::eyre!("transaction request missing from address"))?;

    // Get nonce if not set
    if tx.nonce.is_none() {
        let nonce = provider.get_transaction_count(from).await?;
        tx.nonce = Some(nonce);
    }

    // Get fee parameters if not set (EIP-1559) - do this before gas estimation
    // since gas estimation may need fee info
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    // Estimate gas if not set
    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        // Add 20% buffer for safety
        tx.gas = Some(gas_estimate + gas_estimate / 5);
    }

    Ok(tx)
}
