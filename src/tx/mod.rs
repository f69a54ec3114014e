//! Transactions - Drafts, signed envelopes and the submission pipeline
//!
//! # Wire format
//!
//! | Item | Encoding |
//! |------|----------|
//! | Draft | msgpack map, sorted keys, empty values omitted |
//! | Signed message | `"TX" ‖ draft` |
//! | Transaction id | base32(sha512/256(signed message)), 52 chars |
//! | Envelope | msgpack `{sgnr?, sig, txn}` |
//!
//! The network itself is behind [`NetworkClient`]; this crate ships no
//! HTTP client.

pub mod draft;
pub mod envelope;
pub mod network;
pub mod pipeline;

pub use draft::TransactionDraft;
pub use envelope::SignedTransactionEnvelope;
pub use network::{NetworkClient, NetworkError, PendingStatus, TransactionParams};
pub use pipeline::{
    prepare, FailureReason, PaymentRequest, PollPolicy, PreparedTransaction, Stage, SubmissionConfig,
    SubmissionPipeline, SubmissionResult,
};
