//! Submission Tests - The session against a scripted network
//!
//! These tests verify:
//! 1. A confirmed payment publishes its stages and exactly one terminal result
//! 2. Parameter lookup failures never reach broadcast
//! 3. Polling stops on a pool error and after its attempt budget
//! 4. Rekeyed senders carry the signer as auth address
//! 5. Path edits after submit do not leak into the in-flight run
//! 6. Publishing after the receiver is dropped is a silent no-op

use arcwallet::{
    Address, FailureReason, NetworkClient, NetworkError, PathField, PaymentRequest, PendingStatus, PollPolicy,
    SessionConfig, Stage, SubmissionResult, TransactionParams, WalletError, WalletSession,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
    abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
    abandon abandon abandon art";

const ADDR_0_0_0: &str = "YJFMZQWOMELMIJRCIKY6FVOFQ2X53RBJHZL2FGHF6Q4UA7VQXRFFPISE2M";
const ADDR_0_0_1: &str = "LN26IPXXKPSNZL6OPLM7OCXKJ6TONYXBRM5SNGXCWRAFETZCTPFQ3HIT5A";

/// Network whose every answer is scripted up front.
#[derive(Default)]
struct ScriptedNetwork {
    unreachable: bool,
    reject_broadcast: bool,
    polls: Mutex<VecDeque<PendingStatus>>,
    poll_count: Mutex<u32>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
    balance: u64,
}

impl ScriptedNetwork {
    fn confirming_after(pending: usize, round: u64) -> Self {
        let mut polls: VecDeque<_> = std::iter::repeat(PendingStatus::pending()).take(pending).collect();
        polls.push_back(PendingStatus::confirmed(round));
        Self { polls: Mutex::new(polls), ..Default::default() }
    }

    fn polls(&self) -> u32 { *self.poll_count.lock().unwrap() }

    fn broadcasts(&self) -> Vec<Vec<u8>> { self.broadcasts.lock().unwrap().clone() }
}

#[async_trait]
impl NetworkClient for ScriptedNetwork {
    async fn fetch_parameters(&self) -> Result<TransactionParams, NetworkError> {
        if self.unreachable {
            return Err(NetworkError::Unreachable("connection refused".into()));
        }
        Ok(TransactionParams {
            fee_per_byte: 0,
            min_fee: 1000,
            first_valid: 100,
            last_valid: 1100,
            genesis_id: "testnet-v1.0".into(),
            genesis_hash: [0x48; 32],
        })
    }

    async fn broadcast(&self, signed: &[u8]) -> Result<String, NetworkError> {
        if self.reject_broadcast {
            return Err(NetworkError::Unsuccessful("below min balance".into()));
        }
        self.broadcasts.lock().unwrap().push(signed.to_vec());
        Ok("SCRIPTEDTXID".into())
    }

    async fn pending_status(&self, _tx_id: &str) -> Result<PendingStatus, NetworkError> {
        *self.poll_count.lock().unwrap() += 1;
        Ok(self.polls.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn balance(&self, _address: &Address) -> Result<u64, NetworkError> { Ok(self.balance) }
}

fn config(max_attempts: u32) -> SessionConfig {
    SessionConfig::new().with_poll(PollPolicy { max_attempts, interval: Duration::from_millis(1) })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool { haystack.windows(needle.len()).any(|w| w == needle) }

/// Test: two pending polls then a round confirms after exactly three polls
#[tokio::test]
async fn confirms_after_three_polls() {
    let net = Arc::new(ScriptedNetwork::confirming_after(2, 4242));
    let (session, mut events) = WalletSession::new(config(10), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();

    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1_000, b"test".to_vec())).unwrap();
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        assert_eq!(event.id, handle.id);
        let terminal = event.result.is_terminal();
        seen.push(event.result);
        if terminal {
            break;
        }
    }

    let expected_stages = [Stage::Building, Stage::Signing, Stage::Reconciling, Stage::Broadcasting, Stage::Polling];
    let stages: Vec<_> = seen
        .iter()
        .filter_map(|r| match r {
            SubmissionResult::Pending { stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages, expected_stages);
    assert_eq!(
        seen.last(),
        Some(&SubmissionResult::Confirmed { round: 4242, tx_id: "SCRIPTEDTXID".into() })
    );
    assert_eq!(net.polls(), 3);
    assert_eq!(handle.task.await.unwrap(), SubmissionResult::Confirmed { round: 4242, tx_id: "SCRIPTEDTXID".into() });

    // nothing else is published for this submission
    assert!(events.try_recv().is_none());
}

/// Test: unreachable parameter lookup fails without broadcasting
#[tokio::test]
async fn parameter_lookup_failure() {
    let net = Arc::new(ScriptedNetwork { unreachable: true, ..Default::default() });
    let (session, mut events) = WalletSession::new(config(3), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();

    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    let result = events.wait_for(handle.id).await.unwrap();
    assert!(matches!(result, SubmissionResult::Failed { reason: FailureReason::ParameterLookupError(_) }));
    assert!(net.broadcasts().is_empty());
    assert_eq!(net.polls(), 0);
}

/// Test: submitting without a seed fails with NoKeyMaterial
#[tokio::test]
async fn no_key_material() {
    let net = Arc::new(ScriptedNetwork::default());
    let (session, mut events) = WalletSession::new(config(3), net.clone());
    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    assert_eq!(
        events.wait_for(handle.id).await,
        Some(SubmissionResult::Failed { reason: FailureReason::NoKeyMaterial })
    );
    assert!(net.broadcasts().is_empty());
}

/// Test: rejected broadcast and pool errors are terminal
#[tokio::test]
async fn broadcast_and_pool_failures() {
    let net = Arc::new(ScriptedNetwork { reject_broadcast: true, ..Default::default() });
    let (session, mut events) = WalletSession::new(config(3), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();
    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    let result = events.wait_for(handle.id).await.unwrap();
    assert!(matches!(result, SubmissionResult::Failed { reason: FailureReason::BroadcastRejected(_) }));

    let net = Arc::new(ScriptedNetwork::default());
    net.polls.lock().unwrap().push_back(PendingStatus::rejected("transaction already in ledger"));
    let (session, mut events) = WalletSession::new(config(3), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();
    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    assert_eq!(
        events.wait_for(handle.id).await,
        Some(SubmissionResult::Failed { reason: FailureReason::PollError("transaction already in ledger".into()) })
    );
    assert_eq!(net.polls(), 1);
}

/// Test: a network that never confirms times out after the attempt budget
#[tokio::test]
async fn bounded_polling() {
    let net = Arc::new(ScriptedNetwork::default());
    let (session, mut events) = WalletSession::new(config(5), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();
    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    assert_eq!(
        events.wait_for(handle.id).await,
        Some(SubmissionResult::Failed { reason: FailureReason::ConfirmationTimeout(5) })
    );
    assert_eq!(net.polls(), 5);
}

/// Test: sending for a rekeyed account attaches the signer as auth address
#[tokio::test]
async fn rekeyed_sender_gets_auth_address() {
    let net = Arc::new(ScriptedNetwork::confirming_after(0, 7));
    let (session, mut events) = WalletSession::new(config(3), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();

    let rekeyed: Address = ADDR_0_0_1.parse().unwrap();
    let signer: Address = ADDR_0_0_0.parse().unwrap();
    let handle = session
        .submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new()).from_sender(rekeyed))
        .unwrap();
    assert!(matches!(events.wait_for(handle.id).await, Some(SubmissionResult::Confirmed { round: 7, .. })));

    let sent = &net.broadcasts()[0];
    let mut sgnr = vec![0xa4, b's', b'g', b'n', b'r', 0xc4, 32];
    sgnr.extend_from_slice(signer.as_bytes());
    assert!(sent.starts_with(&[0x83]));
    assert!(sent[1..].starts_with(&sgnr));
}

/// Test: the path is captured at submit time
#[tokio::test]
async fn snapshot_at_submit() {
    let net = Arc::new(ScriptedNetwork::confirming_after(0, 1));
    let (session, mut events) = WalletSession::new(config(3), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();

    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    // the spawned run has not been polled yet on this single-threaded runtime
    session.set_path_component(PathField::KeyIndex, "1").unwrap();
    assert_eq!(session.address().unwrap().to_string(), ADDR_0_0_1);

    events.wait_for(handle.id).await.unwrap();
    let sent = &net.broadcasts()[0];
    let captured: Address = ADDR_0_0_0.parse().unwrap();
    let mut snd = vec![0xa3, b's', b'n', b'd', 0xc4, 32];
    snd.extend_from_slice(captured.as_bytes());
    assert!(contains(sent, &snd));
}

/// Test: dropping the event receiver does not disturb in-flight runs
#[tokio::test]
async fn publish_after_receiver_dropped() {
    let net = Arc::new(ScriptedNetwork::confirming_after(1, 9));
    let (session, events) = WalletSession::new(config(3), net.clone());
    session.set_seed(TEST_MNEMONIC).unwrap();
    drop(events);

    let handle = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    let result = handle.task.await.unwrap();
    assert_eq!(result, SubmissionResult::Confirmed { round: 9, tx_id: "SCRIPTEDTXID".into() });
}

/// Test: submissions get distinct ids
#[tokio::test]
async fn submission_ids_increase() {
    let net = Arc::new(ScriptedNetwork::default());
    let (session, _events) = WalletSession::new(config(1), net);
    session.set_seed(TEST_MNEMONIC).unwrap();
    let a = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    let b = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).unwrap();
    assert!(b.id > a.id);
    a.task.await.unwrap();
    b.task.await.unwrap();
}

/// Test: balance needs a displayed address
#[tokio::test]
async fn balance_lookup() {
    let net = Arc::new(ScriptedNetwork { balance: 123_456, ..Default::default() });
    let (session, _events) = WalletSession::new(config(1), net);
    assert!(matches!(session.balance().await, Err(WalletError::NoKeyMaterial)));
    session.set_seed(TEST_MNEMONIC).unwrap();
    assert_eq!(session.balance().await.unwrap(), 123_456);
}

/// Test: submit outside a runtime is an error, not a panic
#[test]
fn submit_requires_runtime() {
    let (session, _events) = WalletSession::new(config(1), Arc::new(ScriptedNetwork::default()));
    let err = session.submit(PaymentRequest::new(ADDR_0_0_1, 1, Vec::new())).err();
    assert!(matches!(err, Some(WalletError::Runtime(_))));
}
