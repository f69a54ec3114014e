//! Address - checksummed base32 form of an Ed25519 public key
//!
//! ```text
//! base32_nopad( pubkey[32] || sha512_256(pubkey)[28..32] )  → 58 chars
//! ```

use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;

pub const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
pub const ADDRESS_LEN: usize = 58;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must be {ADDRESS_LEN} characters, got {0}")]
    Length(usize),
    #[error("address is not valid base32: {0}")]
    Encoding(String),
    #[error("address checksum mismatch")]
    Checksum,
}

/// Public key of an account. Equality is byte equality of the key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address([u8; PUBLIC_KEY_LEN]);

impl Address {
    pub const fn from_public_key(bytes: [u8; PUBLIC_KEY_LEN]) -> Self { Self(bytes) }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] { &self.0 }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(self.0);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        out
    }

    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&self.checksum());
        BASE32_NOPAD.encode(&raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.encode()) }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Address({})", self.encode()) }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != ADDRESS_LEN {
            return Err(AddressError::Length(s.len()));
        }
        let raw = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| AddressError::Encoding(e.to_string()))?;
        if raw.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
            return Err(AddressError::Length(s.len()));
        }
        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(&raw[..PUBLIC_KEY_LEN]);
        let address = Address(key);
        if address.checksum()[..] != raw[PUBLIC_KEY_LEN..] {
            return Err(AddressError::Checksum);
        }
        Ok(address)
    }
}
