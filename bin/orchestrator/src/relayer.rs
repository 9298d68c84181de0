//! On-chain relayer: builds proofs and submits prove/claim transactions.

use crate::Relayer;
use ::config::{attestation_base_url, ArbBridge, Network, NetworkRegistry, OpBridge, Stack};
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use binding::opstack::IOptimismPortal2;
use binding::pool::IRelayPool;
use proof::{arb, cctp, op, zksync, ProofError};
use std::time::{SystemTime, UNIX_EPOCH};
use store::BridgeTransaction;
use tracing::{debug, info};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Relayer backed by real RPC providers and a local signing key.
///
/// Providers are created per call from the immutable registry; the relayer
/// itself holds no connection state and is freely shareable across passes.
pub struct OnchainRelayer {
    registry: NetworkRegistry,
    private_key: String,
    http: reqwest::Client,
    dry_run: bool,
}

impl OnchainRelayer {
    /// A key that cannot sign is fatal for the whole run, so it is rejected
    /// here rather than surfacing per transfer.
    pub fn new(
        registry: NetworkRegistry,
        private_key: String,
        dry_run: bool,
    ) -> eyre::Result<Self> {
        private_key
            .parse::<PrivateKeySigner>()
            .map_err(|e| eyre::eyre!("invalid private key: {e}"))?;

        Ok(Self {
            registry,
            private_key,
            http: reqwest::Client::new(),
            dry_run,
        })
    }

    fn network(&self, chain_id: u64) -> Result<&Network, ProofError> {
        self.registry
            .get(chain_id)
            .ok_or(ProofError::UnknownStack(chain_id))
    }

    fn op_bridge(network: &Network) -> Result<&OpBridge, ProofError> {
        network.op.as_ref().ok_or(ProofError::MissingBridgeConfig {
            chain_id: network.chain_id,
            stack: "op",
        })
    }

    fn arb_bridge(network: &Network) -> Result<&ArbBridge, ProofError> {
        network.arb.as_ref().ok_or(ProofError::MissingBridgeConfig {
            chain_id: network.chain_id,
            stack: "arb",
        })
    }

    /// Sign and submit a transaction on `chain_id`, waiting for its receipt.
    async fn submit<P>(
        &self,
        provider: &P,
        chain_id: u64,
        request: TransactionRequest,
    ) -> Result<TxHash, ProofError>
    where
        P: Provider + Clone + 'static,
    {
        let signer = client::local_signer_fn(&self.private_key, chain_id, provider.clone())?;
        let raw = signer(request).await.map_err(ProofError::rpc)?;

        let receipt = provider
            .send_raw_transaction(&raw)
            .await
            .map_err(ProofError::rpc)?
            .get_receipt()
            .await
            .map_err(ProofError::rpc)?;

        if !receipt.status() {
            return Err(ProofError::rpc(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(receipt.transaction_hash)
    }

    /// Build the family-specific claim payload for one transfer.
    async fn claim_params(
        &self,
        origin: &Network,
        destination: &Network,
        tx: &BridgeTransaction,
    ) -> Result<Bytes, ProofError> {
        match origin.stack {
            Stack::Op => {
                let bridge = Self::op_bridge(origin)?;
                let origin_provider = client::connect(origin)?;
                let destination_provider = client::connect(destination)?;

                // The portal would revert anyway; check maturity before
                // spending gas on a premature claim.
                let portal = IOptimismPortal2::new(bridge.portal, &destination_provider);
                let maturity_delay: u64 = portal
                    .proofMaturityDelaySeconds()
                    .call()
                    .await?
                    .try_into()
                    .map_err(|_| ProofError::Malformed("proof maturity delay overflow".into()))?;
                op::ensure_challenge_period(tx.origin_timestamp, maturity_delay, unix_now())?;

                let withdrawal = op::fetch_withdrawal(&origin_provider, tx.origin_tx_hash).await?;
                Ok(op::encode_claim_params(&withdrawal.transaction))
            }
            Stack::Arb => {
                let bridge = Self::arb_bridge(origin)?;
                let origin_provider = client::connect(origin)?;
                let destination_provider = client::connect(destination)?;
                let bundle = arb::build_outbox_proof(
                    &origin_provider,
                    &destination_provider,
                    bridge,
                    tx.origin_tx_hash,
                )
                .await?;
                Ok(bundle.encode_claim_params())
            }
            Stack::Cctp => {
                let origin_provider = client::connect(origin)?;
                let bundle = cctp::build_attestation_proof(
                    &origin_provider,
                    &self.http,
                    attestation_base_url(origin.testnet),
                    tx.origin_tx_hash,
                )
                .await?;
                Ok(bundle.encode_claim_params())
            }
            Stack::Zksync => {
                let bundle = zksync::ZksyncProof {
                    origin_tx: tx.origin_tx_hash,
                };
                Ok(bundle.encode_claim_params())
            }
        }
    }
}

#[async_trait]
impl Relayer for OnchainRelayer {
    async fn prove(&self, tx: &BridgeTransaction) -> Result<TxHash, ProofError> {
        let origin = self.network(tx.origin_chain_id)?;
        let bridge = Self::op_bridge(origin)?;
        let destination = self.network(tx.destination_chain_id)?;

        let origin_provider = client::connect(origin)?;
        let destination_provider = client::connect(destination)?;

        let withdrawal = op::fetch_withdrawal(&origin_provider, tx.origin_tx_hash).await?;
        let params = op::build_withdrawal_proof(
            &origin_provider,
            &destination_provider,
            bridge,
            &withdrawal,
        )
        .await?;

        debug!(
            transfer = %tx.key(),
            withdrawal_hash = %withdrawal.withdrawal_hash,
            game_index = %params.dispute_game_index,
            "Built withdrawal proof"
        );

        if self.dry_run {
            info!(transfer = %tx.key(), "Dry run, skipping proveWithdrawalTransaction");
            return Ok(TxHash::ZERO);
        }

        let portal = IOptimismPortal2::new(bridge.portal, &destination_provider);
        let request = portal
            .proveWithdrawalTransaction(
                params.transaction,
                params.dispute_game_index,
                params.output_root_proof,
                params.withdrawal_proof,
            )
            .into_transaction_request();

        self.submit(&destination_provider, destination.chain_id, request)
            .await
    }

    async fn claim(&self, tx: &BridgeTransaction) -> Result<TxHash, ProofError> {
        let origin = self.network(tx.origin_chain_id)?;
        let destination = self.network(tx.destination_chain_id)?;
        let destination_provider = client::connect(destination)?;

        let params = self.claim_params(origin, destination, tx).await?;

        // The pool rejects unconfigured origins; check before spending gas.
        let pool = IRelayPool::new(tx.destination_pool, &destination_provider);
        let settings = pool
            .authorizedOrigins(U256::from(tx.origin_chain_id), tx.origin_bridge)
            .call()
            .await?;
        if settings.proxyBridge == Address::ZERO {
            return Err(ProofError::UnauthorizedOrigin {
                origin_chain_id: tx.origin_chain_id,
                origin_bridge: tx.origin_bridge,
            });
        }

        debug!(
            transfer = %tx.key(),
            pool = %tx.destination_pool,
            params_len = params.len(),
            "Built claim payload"
        );

        if self.dry_run {
            info!(transfer = %tx.key(), "Dry run, skipping claim");
            return Ok(TxHash::ZERO);
        }

        let request = pool
            .claim(U256::from(tx.origin_chain_id), tx.origin_bridge, params)
            .into_transaction_request();

        self.submit(&destination_provider, destination.chain_id, request)
            .await
    }
}
