//! Keys - Seed handling and the signing capability.
//!
//! Everything above this module sees key material only through the
//! [`KeyMaterial`] trait: derive a public key for a path, sign bytes at a
//! path. The seed never leaves the backend that owns it.
//!
//! # Backends
//!
//! | Backend | Scheme | Notes |
//! |---------|--------|-------|
//! | [`Bip32Ed25519`] | `Khovratovich` | classic BIP32-Ed25519, 32 tweak bits cleared |
//! | [`Bip32Ed25519`] | `Peikert` | 9 tweak bits cleared, deeper trees stay in range |

mod bip32_ed25519;
pub mod mnemonic;

pub use bip32_ed25519::{Bip32Ed25519, DerivationScheme};
pub use mnemonic::{MnemonicError, Seed};
#[cfg(feature = "native")]
pub use mnemonic::generate_mnemonic;

use crate::core::{Address, DerivationPath, PathError};
use std::fmt;

pub const SIGNATURE_LEN: usize = 64;

/// Errors from a key backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("derivation failed: {0}")]
    Derivation(String),
}

/// 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn to_address(&self) -> Address { Address::from_public_key(self.0) }
    pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "PublicKey({})", self.to_hex()) }
}

/// 64-byte Ed25519 signature `R || S`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] { &self.0 }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Signature({})", hex::encode(self.0)) }
}

/// Opaque signing capability bound to one seed.
///
/// Implementations are pure functions of `(seed, path)`, so a single handle
/// can be shared across threads and reused for any number of derivations.
pub trait KeyMaterial: Send + Sync {
    fn derive_public_key(&self, path: &DerivationPath) -> Result<PublicKey, KeyError>;
    fn sign(&self, path: &DerivationPath, message: &[u8]) -> Result<Signature, KeyError>;
}
