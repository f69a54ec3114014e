//! Wallet module - Foreground address state for an ARC-52 wallet
//!
//! Owns the seed-derived key handle, the three numeric path fields and the
//! displayed address. Everything here runs on one thread; background work
//! only ever sees a [`KeySnapshot`].
//!
//! # Architecture
//!
//! ```text
//! UI events (seed, account/change/index text, context)
//!     │
//!     ▼
//! WalletState ──guard──► normalize ──► DerivationPath
//!     │                                     │
//!     │                                     ▼
//!     │                            derive_address(KeyMaterial)
//!     │                                     │
//!     ├── FieldWriter ◄── normalized text   ▼
//!     └── observers   ◄────────────── Address (on change)
//! ```
//!
//! # Events
//!
//! | Event | Effect |
//! |-------|--------|
//! | `set_seed` | replace key material, recompute |
//! | `set_path_component` | normalize one field, recompute |
//! | `set_key_context` | switch coin type, recompute |
//! | `snapshot` | `(key, path)` pair for a submission |

mod deriver;
mod state;

pub use deriver::{derive_address, rekey_auth_address};
pub use state::{AddressObserver, FieldText, FieldWriter, KeySnapshot, Recompute, WalletState};
