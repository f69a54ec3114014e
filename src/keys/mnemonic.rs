//! Mnemonic - BIP39 recovery phrases to seeds.
//!
//! Only 24-word phrases are accepted. Checksum validation and the PBKDF2
//! stretch belong to the `bip39` crate.

use bip39::Mnemonic;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Required phrase length.
pub const WORD_COUNT: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MnemonicError {
    #[error("expected {WORD_COUNT} words, got {0}")]
    WordCount(usize),
    #[error("invalid mnemonic: {0}")]
    Invalid(String),
    #[error("entropy: {0}")]
    Entropy(String),
}

/// 64-byte BIP39 seed. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    pub fn from_bytes(bytes: [u8; 64]) -> Self { Self(bytes) }
    pub fn as_bytes(&self) -> &[u8; 64] { &self.0 }

    /// Validate `phrase` and stretch it into a seed (empty passphrase).
    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        let m = parse(phrase)?;
        Ok(Self(m.to_seed("")))
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("Seed(..)") }
}

fn parse(phrase: &str) -> Result<Mnemonic, MnemonicError> {
    let words = phrase.split_whitespace().count();
    if words != WORD_COUNT {
        return Err(MnemonicError::WordCount(words));
    }
    Mnemonic::parse_normalized(phrase).map_err(|e| MnemonicError::Invalid(e.to_string()))
}

/// True for a 24-word phrase with a valid checksum.
pub fn validate(phrase: &str) -> bool { parse(phrase).is_ok() }

/// Fresh 24-word phrase from OS entropy.
#[cfg(feature = "native")]
pub fn generate_mnemonic() -> Result<String, MnemonicError> {
    use rand::RngCore;
    let mut entropy = [0u8; 32];
    rand::rngs::OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| MnemonicError::Entropy(e.to_string()))?;
    let m = Mnemonic::from_entropy(&entropy).map_err(|e| MnemonicError::Entropy(e.to_string()));
    entropy.zeroize();
    Ok(m?.to_string())
}
