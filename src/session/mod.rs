//! WalletSession - UI-facing facade
//!
//! Joins the two concurrency domains. Edits run synchronously against the
//! foreground [`WalletState`]. Each `submit` snapshots `(key, path)` and
//! spawns one pipeline run on the tokio runtime. Every run publishes its
//! stages and exactly one terminal result into [`SubmissionEvents`].
//!
//! ```text
//!   UI thread                          tokio worker
//!   ─────────                          ────────────
//!   set_seed / set_path_component
//!        │
//!   WalletState ── snapshot() ──► SubmissionPipeline::run
//!        │                               │
//!   subscribe_address              mpsc::UnboundedSender
//!                                        │
//!   SubmissionEvents ◄───────────────────┘  (send after drop = no-op)
//! ```

mod config;

pub use config::SessionConfig;

use crate::core::{Address, KeyContext, PathField};
use crate::error::{WalletError, WalletResult};
use crate::keys::KeyMaterial;
use crate::tx::{NetworkClient, PaymentRequest, SubmissionPipeline, SubmissionResult};
use crate::wallet::{FieldWriter, Recompute, WalletState};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One published update, tagged with the submission it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEvent {
    pub id: u64,
    pub result: SubmissionResult,
}

/// Receiving end of the submission stream. Dropping it tears down the UI
/// target; runs still in flight finish without publishing.
pub struct SubmissionEvents {
    rx: mpsc::UnboundedReceiver<SubmissionEvent>,
}

impl SubmissionEvents {
    pub async fn recv(&mut self) -> Option<SubmissionEvent> { self.rx.recv().await }

    pub fn try_recv(&mut self) -> Option<SubmissionEvent> { self.rx.try_recv().ok() }

    /// Wait for the terminal event of submission `id`, skipping others.
    pub async fn wait_for(&mut self, id: u64) -> Option<SubmissionResult> {
        while let Some(event) = self.rx.recv().await {
            if event.id == id && event.result.is_terminal() {
                return Some(event.result);
            }
        }
        None
    }
}

/// A spawned submission.
pub struct SubmissionHandle {
    pub id: u64,
    pub task: JoinHandle<SubmissionResult>,
}

fn publish(tx: &mpsc::UnboundedSender<SubmissionEvent>, id: u64, result: SubmissionResult) {
    if tx.send(SubmissionEvent { id, result }).is_err() {
        tracing::debug!(id, "submission receiver gone, result dropped");
    }
}

pub struct WalletSession {
    state: Rc<WalletState>,
    pipeline: Arc<SubmissionPipeline>,
    network: Arc<dyn NetworkClient>,
    events: mpsc::UnboundedSender<SubmissionEvent>,
    next_id: Cell<u64>,
}

impl WalletSession {
    pub fn new(config: SessionConfig, network: Arc<dyn NetworkClient>) -> (Self, SubmissionEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            state: Rc::new(WalletState::new(config.scheme, config.initial_path)),
            pipeline: Arc::new(SubmissionPipeline::new(network.clone(), config.submission)),
            network,
            events: tx,
            next_id: Cell::new(1),
        };
        (session, SubmissionEvents { rx })
    }

    /// Shared handle for views that need to call back into the state.
    pub fn state(&self) -> Rc<WalletState> { self.state.clone() }

    pub fn set_seed(&self, phrase: &str) -> WalletResult<Recompute> { self.state.set_seed(phrase) }

    pub fn set_key_material(&self, keys: Arc<dyn KeyMaterial>) -> WalletResult<Recompute> {
        self.state.set_key_material(keys)
    }

    pub fn set_path_component(&self, field: PathField, text: &str) -> WalletResult<Recompute> {
        self.state.set_path_component(field, text)
    }

    pub fn set_path_component_at(&self, field: PathField, text: &str, caret: usize) -> WalletResult<Recompute> {
        self.state.set_path_component_at(field, text, caret)
    }

    pub fn set_key_context(&self, context: KeyContext) -> WalletResult<Recompute> { self.state.set_key_context(context) }

    pub fn attach_writer(&self, writer: Box<dyn FieldWriter>) { self.state.attach_writer(writer) }

    pub fn subscribe_address(&self, observer: impl Fn(&Address) + 'static) { self.state.subscribe(Box::new(observer)) }

    pub fn address(&self) -> Option<Address> { self.state.address() }

    /// Start a payment from the current key and path. Must be called from
    /// inside a tokio runtime.
    pub fn submit(&self, request: PaymentRequest) -> WalletResult<SubmissionHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| WalletError::Runtime(e.to_string()))?;
        let id = self.next_id.replace(self.next_id.get() + 1);
        let snapshot = self.state.snapshot();
        tracing::info!(id, path = %snapshot.path, "submission started");

        let pipeline = self.pipeline.clone();
        let events = self.events.clone();
        let task = runtime.spawn(async move {
            let stage_events = events.clone();
            let result = pipeline
                .run(snapshot, request, move |stage| publish(&stage_events, id, SubmissionResult::Pending { stage }))
                .await;
            publish(&events, id, result.clone());
            result
        });
        Ok(SubmissionHandle { id, task })
    }

    /// Balance of the displayed address in microAlgos.
    pub async fn balance(&self) -> WalletResult<u64> {
        let address = self.state.address().ok_or(WalletError::NoKeyMaterial)?;
        Ok(self.network.balance(&address).await?)
    }
}
