//! SubmissionPipeline - build, sign, reconcile, broadcast, poll.
//!
//! ```text
//! Building ─► Signing ─► Reconciling ─► Broadcasting ─► Polling ─► Confirmed
//!     │          │            │              │             │
//!     └──────────┴────────────┴──────────────┴─────────────┴────► Failed(reason)
//! ```
//!
//! One run works on one [`KeySnapshot`] taken when the user pressed submit.
//! Later edits to the foreground state never reach an in-flight run. Any
//! fault ends the run; nothing is retried.

use crate::core::{Address, AddressError};
use crate::tx::draft::TransactionDraft;
use crate::tx::envelope::SignedTransactionEnvelope;
use crate::tx::network::{NetworkClient, NetworkError, TransactionParams};
use crate::wallet::{derive_address, rekey_auth_address, KeySnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Building,
    Signing,
    Reconciling,
    Broadcasting,
    Polling,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Signing => "signing",
            Self::Reconciling => "reconciling",
            Self::Broadcasting => "broadcasting",
            Self::Polling => "polling",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("parameter lookup failed: {0}")]
    ParameterLookupError(String),
    #[error("no key material loaded")]
    NoKeyMaterial,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("encoding failed: {0}")]
    Encoding(String),
    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),
    #[error("poll failed: {0}")]
    PollError(String),
    #[error("not confirmed after {0} polls")]
    ConfirmationTimeout(u32),
}

impl From<crate::error::WalletError> for FailureReason {
    fn from(e: crate::error::WalletError) -> Self {
        use crate::error::WalletError;
        match e {
            WalletError::NoKeyMaterial => Self::NoKeyMaterial,
            WalletError::InvalidAddress(s) => Self::InvalidAddress(s),
            other => Self::Encoding(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionResult {
    Pending { stage: Stage },
    Confirmed { round: u64, tx_id: String },
    Failed { reason: FailureReason },
}

impl SubmissionResult {
    pub fn is_terminal(&self) -> bool { !matches!(self, Self::Pending { .. }) }
}

/// Confirmation polling budget. At least one poll is always made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self { Self { max_attempts: DEFAULT_MAX_ATTEMPTS, interval: DEFAULT_POLL_INTERVAL } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionConfig {
    pub poll: PollPolicy,
}

impl SubmissionConfig {
    pub fn with_max_attempts(mut self, n: u32) -> Self { self.poll.max_attempts = n.max(1); self }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll.interval = interval; self }

    /// Defaults overridden by `ARCWALLET_POLL_MAX_ATTEMPTS` and
    /// `ARCWALLET_POLL_INTERVAL_MS`. Unparseable values are ignored and an
    /// attempt count of 0 is raised to 1.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = std::env::var("ARCWALLET_POLL_MAX_ATTEMPTS").ok().and_then(|v| v.parse::<u32>().ok()) {
            config.poll.max_attempts = n.max(1);
        }
        if let Some(ms) = std::env::var("ARCWALLET_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()) {
            config.poll.interval = Duration::from_millis(ms);
        }
        config
    }
}

/// What the user asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Receiver in text form, parsed during Building.
    pub receiver: String,
    pub amount: u64,
    pub note: Vec<u8>,
    /// Account to send from when it differs from the signing key's own
    /// address (a rekeyed account). `None` sends from the derived address.
    pub sender: Option<Address>,
}

impl PaymentRequest {
    pub fn new(receiver: impl Into<String>, amount: u64, note: impl Into<Vec<u8>>) -> Self {
        Self { receiver: receiver.into(), amount, note: note.into(), sender: None }
    }

    pub fn from_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

/// Signed, encoded and ready to broadcast.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub envelope: SignedTransactionEnvelope,
    pub encoded: Vec<u8>,
    pub tx_id: String,
}

pub struct SubmissionPipeline {
    network: Arc<dyn NetworkClient>,
    config: SubmissionConfig,
}

impl SubmissionPipeline {
    pub fn new(network: Arc<dyn NetworkClient>, config: SubmissionConfig) -> Self { Self { network, config } }

    pub fn config(&self) -> &SubmissionConfig { &self.config }

    /// Run one submission to its terminal result. `on_stage` sees every
    /// stage as it is entered, in order.
    pub async fn run<F>(&self, snapshot: KeySnapshot, request: PaymentRequest, mut on_stage: F) -> SubmissionResult
    where
        F: FnMut(Stage) + Send,
    {
        match self.drive(snapshot, request, &mut on_stage).await {
            Ok((round, tx_id)) => {
                info!(%tx_id, round, "transaction confirmed");
                SubmissionResult::Confirmed { round, tx_id }
            }
            Err(reason) => {
                warn!(%reason, "submission failed");
                SubmissionResult::Failed { reason }
            }
        }
    }

    async fn drive<F>(&self, snapshot: KeySnapshot, request: PaymentRequest, on_stage: &mut F) -> Result<(u64, String), FailureReason>
    where
        F: FnMut(Stage) + Send,
    {
        let mut enter = |stage: Stage| {
            debug!(stage = stage.as_str(), "submission stage");
            on_stage(stage);
        };

        enter(Stage::Building);
        let params = self
            .network
            .fetch_parameters()
            .await
            .map_err(|e| FailureReason::ParameterLookupError(e.to_string()))?;
        let receiver: Address = request.receiver.parse().map_err(|e: AddressError| FailureReason::InvalidAddress(e.to_string()))?;
        let prepared = prepare(&snapshot, &request, receiver, &params, &mut enter)?;

        enter(Stage::Broadcasting);
        let tx_id = self.network.broadcast(&prepared.encoded).await.map_err(|e| FailureReason::BroadcastRejected(e.to_string()))?;
        if tx_id != prepared.tx_id {
            debug!(local = %prepared.tx_id, remote = %tx_id, "network reported a different tx id");
        }
        info!(%tx_id, "transaction broadcast");

        enter(Stage::Polling);
        let round = self.poll(&tx_id).await?;
        Ok((round, tx_id))
    }

    async fn poll(&self, tx_id: &str) -> Result<u64, FailureReason> {
        let PollPolicy { max_attempts, interval } = self.config.poll;
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let status = self.network.pending_status(tx_id).await.map_err(|e| match e {
                NetworkError::Unreachable(s) | NetworkError::Unsuccessful(s) => FailureReason::PollError(s),
            })?;
            if let Some(round) = status.round() {
                return Ok(round);
            }
            if let Some(err) = status.pool_error() {
                return Err(FailureReason::PollError(err.to_string()));
            }
            debug!(tx_id, attempt, "still pending");
            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(FailureReason::ConfirmationTimeout(max_attempts))
    }
}

/// Build, sign and reconcile without touching the network. Shared by the
/// pipeline and the CLI `sign` command. Runs inside the Building stage and
/// reports Signing and Reconciling through `enter`.
pub fn prepare(
    snapshot: &KeySnapshot,
    request: &PaymentRequest,
    receiver: Address,
    params: &TransactionParams,
    enter: &mut dyn FnMut(Stage),
) -> Result<PreparedTransaction, FailureReason> {
    let keys = snapshot.keys.as_deref().ok_or(FailureReason::NoKeyMaterial)?;
    let signer = derive_address(keys, &snapshot.path).map_err(|e| FailureReason::Encoding(e.to_string()))?;
    let sender = request.sender.unwrap_or(signer);

    // the fee has to cover the auth address if one will be attached
    let auth_addr = rekey_auth_address(&signer, &sender);
    let draft = TransactionDraft::payment(sender, receiver, request.amount, request.note.clone(), params)?
        .with_suggested_fee(params, auth_addr)?;

    enter(Stage::Signing);
    let message = draft.bytes_to_sign()?;
    let signature = keys.sign(&snapshot.path, &message).map_err(|e| FailureReason::Encoding(e.to_string()))?;

    enter(Stage::Reconciling);
    if let Some(auth) = auth_addr {
        debug!(%sender, %auth, "rekeyed sender, attaching auth address");
    }
    let envelope = SignedTransactionEnvelope::new(draft, signature, auth_addr);
    let encoded = envelope.encode()?;
    let tx_id = envelope.tx_id()?;
    Ok(PreparedTransaction { envelope, encoded, tx_id })
}
