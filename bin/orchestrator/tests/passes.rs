//! Pass behavior against a programmable relayer and the in-memory store.

use alloy_primitives::{Address, TxHash, B256, U256};
use async_trait::async_trait;
use config::NetworkRegistry;
use orchestrator::{
    metrics::Metrics, run_claim_pass, run_prove_pass, PassPolicy, Relayer,
};
use proof::ProofError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use store::{BridgeStatus, BridgeTransaction, MemoryStatusStore, StatusStore, TransferKey};

const DAY: u64 = 24 * 60 * 60;

const PROVE_HASH: TxHash = B256::repeat_byte(0xaa);
const CLAIM_HASH: TxHash = B256::repeat_byte(0xbb);

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn policy() -> PassPolicy {
    PassPolicy {
        prove_window_secs: 14 * DAY,
        challenge_period_secs: 7 * DAY,
        settle_delay_secs: 7 * DAY,
    }
}

fn transfer(
    origin_chain_id: u64,
    nonce: u64,
    status: BridgeStatus,
    age_secs: u64,
) -> BridgeTransaction {
    BridgeTransaction {
        origin_chain_id,
        origin_bridge: Address::repeat_byte(0xbb),
        nonce: U256::from(nonce),
        destination_chain_id: 1,
        destination_pool: Address::repeat_byte(0xcc),
        origin_sender: Address::repeat_byte(0x01),
        destination_recipient: Address::repeat_byte(0x02),
        asset: Address::ZERO,
        amount: U256::from(1_000_000u64),
        origin_timestamp: now().saturating_sub(age_secs),
        origin_tx_hash: B256::repeat_byte(0xee),
        status,
        proof_tx_hash: None,
        finalized_tx_hash: None,
        loan_emitted_tx_hash: None,
    }
}

/// Per-transfer scripted behavior; anything not scripted succeeds.
#[derive(Clone, Copy)]
enum Outcome {
    DryRun,
    GameNotReady,
    MissingEvent,
}

#[derive(Default)]
struct MockRelayer {
    outcomes: Mutex<HashMap<TransferKey, Outcome>>,
    prove_calls: Mutex<Vec<TransferKey>>,
    claim_calls: Mutex<Vec<TransferKey>>,
}

impl MockRelayer {
    fn script(self, tx: &BridgeTransaction, outcome: Outcome) -> Self {
        self.outcomes.lock().unwrap().insert(tx.key(), outcome);
        self
    }

    fn result(&self, key: TransferKey, default_hash: TxHash) -> Result<TxHash, ProofError> {
        match self.outcomes.lock().unwrap().get(&key) {
            None => Ok(default_hash),
            Some(Outcome::DryRun) => Ok(TxHash::ZERO),
            Some(Outcome::GameNotReady) => Err(ProofError::NoGameFound(123)),
            Some(Outcome::MissingEvent) => {
                Err(ProofError::Event(events::EventError::NotFound("MessagePassed")))
            }
        }
    }

    fn proved(&self) -> Vec<TransferKey> {
        self.prove_calls.lock().unwrap().clone()
    }

    fn claimed(&self) -> Vec<TransferKey> {
        self.claim_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Relayer for MockRelayer {
    async fn prove(&self, tx: &BridgeTransaction) -> Result<TxHash, ProofError> {
        self.prove_calls.lock().unwrap().push(tx.key());
        self.result(tx.key(), PROVE_HASH)
    }

    async fn claim(&self, tx: &BridgeTransaction) -> Result<TxHash, ProofError> {
        self.claim_calls.lock().unwrap().push(tx.key());
        self.result(tx.key(), CLAIM_HASH)
    }
}

#[tokio::test]
async fn test_prove_pass_processes_every_eligible_withdrawal() {
    let transfers = vec![
        transfer(10, 1, BridgeStatus::Initiated, 8 * DAY),
        transfer(10, 2, BridgeStatus::Initiated, 8 * DAY),
    ];
    let keys: Vec<_> = transfers.iter().map(|t| t.key()).collect();

    let store = Arc::new(MemoryStatusStore::new(transfers));
    let relayer = Arc::new(MockRelayer::default());

    let report = run_prove_pass(
        store.clone() as Arc<dyn StatusStore>,
        relayer.clone(),
        &NetworkRegistry::mainnet(),
        &policy(),
        &Metrics::new(),
    )
    .await
    .unwrap();

    // Every item in the list is attempted, including the first.
    assert_eq!(report.proved, 2);
    assert_eq!(relayer.proved().len(), 2);
    for key in keys {
        let tx = store.get(key).unwrap();
        assert_eq!(tx.status, BridgeStatus::Proven);
        assert_eq!(tx.proof_tx_hash, Some(PROVE_HASH));
        assert_eq!(tx.finalized_tx_hash, None);
    }
}

#[tokio::test]
async fn test_prove_pass_separates_transient_from_permanent() {
    let ok = transfer(10, 1, BridgeStatus::Initiated, 8 * DAY);
    let not_ready = transfer(10, 2, BridgeStatus::Initiated, 8 * DAY);
    let broken = transfer(10, 3, BridgeStatus::Initiated, 8 * DAY);

    let relayer = MockRelayer::default()
        .script(&not_ready, Outcome::GameNotReady)
        .script(&broken, Outcome::MissingEvent);

    let store = Arc::new(MemoryStatusStore::new(vec![
        ok.clone(),
        not_ready.clone(),
        broken.clone(),
    ]));

    let report = run_prove_pass(
        store.clone() as Arc<dyn StatusStore>,
        Arc::new(relayer),
        &NetworkRegistry::mainnet(),
        &policy(),
        &Metrics::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.proved, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 1);

    assert_eq!(store.get(ok.key()).unwrap().status, BridgeStatus::Proven);
    // Neither failure mode touches the store.
    assert_eq!(
        store.get(not_ready.key()).unwrap().status,
        BridgeStatus::Initiated
    );
    assert_eq!(
        store.get(broken.key()).unwrap().status,
        BridgeStatus::Initiated
    );
}

#[tokio::test]
async fn test_prove_pass_selects_only_op_within_window() {
    let op_recent = transfer(10, 1, BridgeStatus::Initiated, 8 * DAY);
    let op_stale = transfer(10, 2, BridgeStatus::Initiated, 20 * DAY);
    let arb = transfer(42161, 3, BridgeStatus::Initiated, 8 * DAY);

    let store = Arc::new(MemoryStatusStore::new(vec![
        op_recent.clone(),
        op_stale.clone(),
        arb.clone(),
    ]));
    let relayer = Arc::new(MockRelayer::default());

    let report = run_prove_pass(
        store.clone() as Arc<dyn StatusStore>,
        relayer.clone(),
        &NetworkRegistry::mainnet(),
        &policy(),
        &Metrics::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.proved, 1);
    assert_eq!(relayer.proved(), vec![op_recent.key()]);
    assert_eq!(store.get(op_stale.key()).unwrap().status, BridgeStatus::Initiated);
    assert_eq!(store.get(arb.key()).unwrap().status, BridgeStatus::Initiated);
}

#[tokio::test]
async fn test_claim_pass_finalizes_matured_proven_withdrawals() {
    let matured = transfer(10, 1, BridgeStatus::Proven, 8 * DAY);
    let in_challenge = transfer(10, 2, BridgeStatus::Proven, DAY);

    let store = Arc::new(MemoryStatusStore::new(vec![
        matured.clone(),
        in_challenge.clone(),
    ]));
    let relayer = Arc::new(MockRelayer::default());

    let report = run_claim_pass(
        store.clone() as Arc<dyn StatusStore>,
        relayer.clone(),
        &NetworkRegistry::mainnet(),
        &policy(),
        &Metrics::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.claimed, 1);
    assert_eq!(relayer.claimed(), vec![matured.key()]);

    let finalized = store.get(matured.key()).unwrap();
    assert_eq!(finalized.status, BridgeStatus::Finalized);
    assert_eq!(finalized.finalized_tx_hash, Some(CLAIM_HASH));
    assert_eq!(
        store.get(in_challenge.key()).unwrap().status,
        BridgeStatus::Proven
    );
}

#[tokio::test]
async fn test_claim_pass_takes_non_op_straight_from_initiated() {
    let arb = transfer(42161, 1, BridgeStatus::Initiated, 8 * DAY);
    let zksync = transfer(324, 2, BridgeStatus::Initiated, 8 * DAY);
    let op = transfer(10, 3, BridgeStatus::Initiated, 8 * DAY);

    let store = Arc::new(MemoryStatusStore::new(vec![
        arb.clone(),
        zksync.clone(),
        op.clone(),
    ]));
    let relayer = Arc::new(MockRelayer::default());

    let report = run_claim_pass(
        store.clone() as Arc<dyn StatusStore>,
        relayer.clone(),
        &NetworkRegistry::mainnet(),
        &policy(),
        &Metrics::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.claimed, 2);
    assert_eq!(store.get(arb.key()).unwrap().status, BridgeStatus::Finalized);
    assert_eq!(store.get(zksync.key()).unwrap().status, BridgeStatus::Finalized);
    // An un-proven OP withdrawal never skips straight to a claim.
    assert_eq!(store.get(op.key()).unwrap().status, BridgeStatus::Initiated);
    assert!(!relayer.claimed().contains(&op.key()));
}

#[tokio::test]
async fn test_dry_run_sentinel_counts_as_skipped() {
    let tx = transfer(10, 1, BridgeStatus::Initiated, 8 * DAY);
    let relayer = MockRelayer::default().script(&tx, Outcome::DryRun);
    let store = Arc::new(MemoryStatusStore::new(vec![tx.clone()]));

    let report = run_prove_pass(
        store.clone() as Arc<dyn StatusStore>,
        Arc::new(relayer),
        &NetworkRegistry::mainnet(),
        &policy(),
        &Metrics::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.proved, 0);
    assert_eq!(report.skipped, 1);
    let after = store.get(tx.key()).unwrap();
    assert_eq!(after.status, BridgeStatus::Initiated);
    assert_eq!(after.proof_tx_hash, None);
}

#[tokio::test]
async fn test_unknown_origin_chain_fails_permanently() {
    let tx = transfer(999_999, 1, BridgeStatus::Initiated, 8 * DAY);
    let store = Arc::new(MemoryStatusStore::new(vec![tx.clone()]));
    let relayer = Arc::new(MockRelayer::default());

    let report = run_prove_pass(
        store.clone() as Arc<dyn StatusStore>,
        relayer.clone(),
        &NetworkRegistry::mainnet(),
        &policy(),
        &Metrics::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.failed, 1);
    assert!(relayer.proved().is_empty());
    assert_eq!(store.get(tx.key()).unwrap().status, BridgeStatus::Initiated);
}

#[tokio::test]
async fn test_op_withdrawal_full_lifecycle() {
    // A week-old OP Mainnet withdrawal: one prove pass moves it to PROVEN,
    // the following claim pass finalizes it against the destination pool.
    let tx = transfer(10, 7, BridgeStatus::Initiated, 8 * DAY);
    let key = tx.key();

    let store = Arc::new(MemoryStatusStore::new(vec![tx]));
    let relayer = Arc::new(MockRelayer::default());
    let registry = NetworkRegistry::mainnet();
    let metrics = Metrics::new();

    let prove_report = run_prove_pass(
        store.clone() as Arc<dyn StatusStore>,
        relayer.clone(),
        &registry,
        &policy(),
        &metrics,
    )
    .await
    .unwrap();
    assert_eq!(prove_report.proved, 1);

    let mid = store.get(key).unwrap();
    assert_eq!(mid.status, BridgeStatus::Proven);
    assert_eq!(mid.proof_tx_hash, Some(PROVE_HASH));
    assert_eq!(mid.finalized_tx_hash, None);

    let claim_report = run_claim_pass(
        store.clone() as Arc<dyn StatusStore>,
        relayer.clone(),
        &registry,
        &policy(),
        &metrics,
    )
    .await
    .unwrap();
    assert_eq!(claim_report.claimed, 1);

    let done = store.get(key).unwrap();
    assert_eq!(done.status, BridgeStatus::Finalized);
    assert_eq!(done.proof_tx_hash, Some(PROVE_HASH));
    assert_eq!(done.finalized_tx_hash, Some(CLAIM_HASH));
}
