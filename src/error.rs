//! Crate-wide error taxonomy.
//!
//! Every variant is recoverable at the granularity of one address recompute
//! or one submission. Nothing here is meant to end a session.

use crate::core::{AddressError, PathError};
use crate::keys::{KeyError, MnemonicError};
use crate::tx::network::NetworkError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("invalid number format: {0:?}")]
    InvalidNumberFormat(String),
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),
    #[error("no key material loaded")]
    NoKeyMaterial,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("encoding failed: {0}")]
    Encoding(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("no async runtime: {0}")]
    Runtime(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl From<PathError> for WalletError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::InvalidNumberFormat(text) => WalletError::InvalidNumberFormat(text),
            other => WalletError::InvalidPath(other.to_string()),
        }
    }
}

impl From<MnemonicError> for WalletError {
    fn from(e: MnemonicError) -> Self { WalletError::InvalidMnemonic(e.to_string()) }
}

impl From<AddressError> for WalletError {
    fn from(e: AddressError) -> Self { WalletError::InvalidAddress(e.to_string()) }
}
