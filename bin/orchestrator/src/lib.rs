//! Claim orchestration: periodic prove and claim passes over the status store.
//!
//! A pass reads pending transfers from the durable store, lets the relayer
//! drive each one as far forward as the origin bridge currently allows, and
//! records the new status only after the destination transaction confirmed.
//! Failures never abort a pass: transient ones are skipped for a later pass,
//! permanent ones are logged with the transfer identity and counted. Only a
//! store failure is fatal.

pub mod config;
pub mod metrics;
pub mod relayer;

pub use relayer::OnchainRelayer;

use alloy_primitives::TxHash;
use async_trait::async_trait;
// Leading `::` keeps the registry crate distinct from this crate's own
// `config` module.
use ::config::{NetworkRegistry, Stack};
use metrics::Metrics;
use proof::{FailureClass, ProofError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use store::{BridgeStatus, BridgeTransaction, StatusStore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Drives one transfer one step forward on chain.
///
/// Implementations return the confirmed destination transaction hash, or
/// [`TxHash::ZERO`] as the dry-run sentinel meaning the payload was built and
/// validated but deliberately not submitted. Passes count the sentinel as
/// skipped and leave the store untouched.
#[async_trait]
pub trait Relayer: Send + Sync {
    /// Submit the OP-Stack `proveWithdrawalTransaction` for a transfer.
    async fn prove(&self, tx: &BridgeTransaction) -> Result<TxHash, ProofError>;

    /// Build the claim payload and submit the destination pool's `claim`.
    async fn claim(&self, tx: &BridgeTransaction) -> Result<TxHash, ProofError>;
}

/// Timing rules for pass eligibility, all in seconds.
#[derive(Debug, Clone, Copy)]
pub struct PassPolicy {
    /// Only prove withdrawals initiated at most this long ago.
    pub prove_window_secs: u64,
    /// OP-Stack proof maturity delay before a proven withdrawal can finalize.
    pub challenge_period_secs: u64,
    /// Settlement delay for non-OP origins before a claim is attempted.
    pub settle_delay_secs: u64,
}

/// Outcome counts of one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub proved: usize,
    pub claimed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PassReport {
    fn absorb(&mut self, other: Self) {
        self.proved += other.proved;
        self.claimed += other.claimed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Copy)]
enum PassKind {
    Prove,
    Claim,
}

/// Prove every eligible OP-Stack withdrawal.
///
/// Eligible means `INITIATED`, declared `op` in the registry, and initiated
/// within the prove window. Other stacks never have a prove phase.
pub async fn run_prove_pass(
    store: Arc<dyn StatusStore>,
    relayer: Arc<dyn Relayer>,
    registry: &NetworkRegistry,
    policy: &PassPolicy,
    metrics: &Metrics,
) -> eyre::Result<PassReport> {
    let started = Instant::now();
    let cutoff = unix_now().saturating_sub(policy.prove_window_secs);

    let candidates = store
        .by_status(BridgeStatus::Initiated, Some(cutoff), None)
        .await?;

    let mut report = PassReport::default();
    let mut eligible = Vec::new();
    for tx in candidates {
        match registry.get(tx.origin_chain_id).map(|n| n.stack) {
            Some(Stack::Op) => eligible.push(tx),
            // Non-OP stacks finalize in one step; nothing to prove.
            Some(_) => {}
            None => {
                warn!(transfer = %tx.key(), chain_id = tx.origin_chain_id,
                    "Origin chain not in registry, cannot prove");
                report.failed += 1;
            }
        }
    }

    info!(eligible = eligible.len(), "Starting prove pass");
    report.absorb(run_groups(PassKind::Prove, eligible, store, relayer).await?);

    metrics.record_pass("prove", started.elapsed());
    metrics.record_report(&report);
    info!(?report, "Prove pass complete");
    Ok(report)
}

/// Claim every transfer whose waiting period has elapsed.
///
/// Two populations qualify: `PROVEN` OP-Stack withdrawals past the challenge
/// period, and `INITIATED` non-OP transfers past the settlement delay.
pub async fn run_claim_pass(
    store: Arc<dyn StatusStore>,
    relayer: Arc<dyn Relayer>,
    registry: &NetworkRegistry,
    policy: &PassPolicy,
    metrics: &Metrics,
) -> eyre::Result<PassReport> {
    let started = Instant::now();
    let now = unix_now();

    let proven = store
        .by_status(
            BridgeStatus::Proven,
            None,
            Some(now.saturating_sub(policy.challenge_period_secs)),
        )
        .await?;

    let initiated = store
        .by_status(
            BridgeStatus::Initiated,
            None,
            Some(now.saturating_sub(policy.settle_delay_secs)),
        )
        .await?;

    let mut report = PassReport::default();
    let mut eligible = proven;
    for tx in initiated {
        match registry.get(tx.origin_chain_id).map(|n| n.stack) {
            // OP withdrawals must go through the prove phase first.
            Some(Stack::Op) => {}
            Some(_) => eligible.push(tx),
            None => {
                warn!(transfer = %tx.key(), chain_id = tx.origin_chain_id,
                    "Origin chain not in registry, cannot claim");
                report.failed += 1;
            }
        }
    }

    info!(eligible = eligible.len(), "Starting claim pass");
    report.absorb(run_groups(PassKind::Claim, eligible, store, relayer).await?);

    metrics.record_pass("claim", started.elapsed());
    metrics.record_report(&report);
    info!(?report, "Claim pass complete");
    Ok(report)
}

/// Process transfers grouped by destination chain.
///
/// Groups run concurrently; within a group transfers run strictly in order so
/// a single submitter account never races its own nonces.
async fn run_groups(
    kind: PassKind,
    transfers: Vec<BridgeTransaction>,
    store: Arc<dyn StatusStore>,
    relayer: Arc<dyn Relayer>,
) -> eyre::Result<PassReport> {
    let mut groups: HashMap<u64, Vec<BridgeTransaction>> = HashMap::new();
    for tx in transfers {
        groups.entry(tx.destination_chain_id).or_default().push(tx);
    }

    let mut set = JoinSet::new();
    for (chain_id, group) in groups {
        let store = Arc::clone(&store);
        let relayer = Arc::clone(&relayer);
        set.spawn(async move {
            debug!(chain_id, transfers = group.len(), "Processing destination group");
            process_group(kind, group, store, relayer).await
        });
    }

    let mut report = PassReport::default();
    while let Some(joined) = set.join_next().await {
        report.absorb(joined??);
    }
    Ok(report)
}

async fn process_group(
    kind: PassKind,
    group: Vec<BridgeTransaction>,
    store: Arc<dyn StatusStore>,
    relayer: Arc<dyn Relayer>,
) -> Result<PassReport, store::StoreError> {
    let mut report = PassReport::default();

    for tx in &group {
        let key = tx.key();
        let result = match kind {
            PassKind::Prove => relayer.prove(tx).await,
            PassKind::Claim => relayer.claim(tx).await,
        };

        match result {
            Ok(hash) if hash == TxHash::ZERO => {
                info!(transfer = %key, "Dry run, transaction not submitted");
                report.skipped += 1;
            }
            Ok(hash) => match kind {
                PassKind::Prove => {
                    store.mark_proven(key, hash).await?;
                    info!(transfer = %key, %hash, "Withdrawal proven");
                    report.proved += 1;
                }
                PassKind::Claim => {
                    store.mark_finalized(key, hash).await?;
                    info!(transfer = %key, %hash, "Transfer claimed");
                    report.claimed += 1;
                }
            },
            Err(e) if e.class() == FailureClass::Transient => {
                debug!(transfer = %key, error = %e, "Not ready yet, will retry next pass");
                report.skipped += 1;
            }
            Err(e) => {
                warn!(transfer = %key, error = %e, "Permanent failure, manual review needed");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
