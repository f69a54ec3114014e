//! Arcwallet: ARC-52 hierarchical wallet core for Algorand.
//!
//! One seed, many addresses. A 24-word phrase becomes a BIP32-Ed25519 root;
//! every `m/44'/283'/account'/change/index` path becomes an address; any of
//! those addresses can sign and submit a payment.
//!
//! # Architecture
//!
//! ```text
//! WalletSession (entry point)
//!   │
//!   ├── WalletState (foreground, single thread)
//!   │     ├── mnemonic → Seed → KeyMaterial (Bip32Ed25519)
//!   │     ├── account / change / index text → DerivationPath
//!   │     └── derive_address → Address observers
//!   │
//!   └── SubmissionPipeline (tokio task per submit)
//!         ├── Building → Signing → Reconciling → Broadcasting → Polling
//!         └── NetworkClient (params, broadcast, pending status, balance)
//! ```
//!
//! # Path contexts
//!
//! | Context | Coin type | Path |
//! |---------|-----------|------|
//! | Address | 283 | `m/44'/283'/account'/change/index` |
//! | Identity | 0 | `m/44'/0'/account'/change/index` |
//!
//! # Features
//!
//! - `native` - mnemonic generation (OS entropy), log subscriber, CLI
//!
//! # Usage
//!
//! ```ignore
//! use arcwallet::{PathField, PaymentRequest, SessionConfig, WalletSession};
//!
//! let (session, mut events) = WalletSession::new(SessionConfig::from_env(), network);
//! session.set_seed("abandon abandon ... art")?;
//! session.set_path_component(PathField::KeyIndex, "3")?;
//! println!("{}", session.address().unwrap());
//!
//! let handle = session.submit(PaymentRequest::new(receiver, 1_000_000, b"hi".to_vec()))?;
//! let result = events.wait_for(handle.id).await;
//! ```

// =============================================================================
// Shared modules
// =============================================================================
pub mod core;
pub mod error;
pub mod keys;
pub mod session;
pub mod tx;
pub mod wallet;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================
pub use crate::core::{Address, DerivationPath, KeyContext, PathField};
pub use error::{WalletError, WalletResult};
pub use keys::{Bip32Ed25519, DerivationScheme, KeyMaterial, PublicKey, Seed, Signature};
pub use session::{SessionConfig, SubmissionEvent, SubmissionEvents, SubmissionHandle, WalletSession};
pub use tx::{
    FailureReason, NetworkClient, NetworkError, PaymentRequest, PendingStatus, PollPolicy, Stage,
    SubmissionConfig, SubmissionResult, TransactionParams,
};
pub use wallet::{Recompute, WalletState};

#[cfg(feature = "native")]
pub use keys::generate_mnemonic;
