//! BIP32-Ed25519 - Hierarchical Ed25519 keys with non-hardened public derivation.
//!
//! Extended keys are `kL || kR || chain_code`. `kL` is used directly as the
//! Ed25519 scalar (no re-hashing), which is what makes child public keys
//! derivable from parent public keys.
//!
//! Root (ARC-52 style):
//! ```text
//! k  = SHA512(seed)                       retry with HMAC-SHA512(kL, kR) while kL[31] & 0x20
//! kL = clamp(k[..32])   kR = k[32..]      c = SHA256(0x01 || seed)
//! ```
//!
//! Child `i` (little-endian index):
//! ```text
//! hardened:  Z = HMAC(c, 0x00||kL||kR||i)   c' = HMAC(c, 0x01||kL||kR||i)[32..]
//! normal:    Z = HMAC(c, 0x02||A||i)        c' = HMAC(c, 0x03||A||i)[32..]
//! kL' = kL + 8·trunc(ZL)    kR' = kR + ZR mod 2^256
//! ```

use super::mnemonic::Seed;
use super::{KeyError, KeyMaterial, PublicKey, Signature, SIGNATURE_LEN};
use crate::core::path::HARDENED;
use crate::core::DerivationPath;
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha512 = Hmac<Sha512>;

/// How many high bits of the child tweak `ZL` are cleared before it is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivationScheme {
    /// Original BIP32-Ed25519: keep the low 224 bits.
    #[default]
    Khovratovich,
    /// Keep the low 247 bits.
    Peikert,
}

impl DerivationScheme {
    fn cleared_bits(&self) -> u32 {
        match self {
            DerivationScheme::Khovratovich => 32,
            DerivationScheme::Peikert => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DerivationScheme::Khovratovich => "khovratovich",
            DerivationScheme::Peikert => "peikert",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "khovratovich" | "v2" | "standard" => Some(DerivationScheme::Khovratovich),
            "peikert" => Some(DerivationScheme::Peikert),
            _ => None,
        }
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct ExtendedKey {
    kl: [u8; 32],
    kr: [u8; 32],
    chain_code: [u8; 32],
}

fn mac(key: &[u8]) -> Result<HmacSha512, KeyError> {
    HmacSha512::new_from_slice(key).map_err(|e| KeyError::Derivation(e.to_string()))
}

fn sha512(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Clear the top `bits` bits of a little-endian 256-bit value.
fn truncate(bytes: &mut [u8; 32], bits: u32) {
    let mut remaining = bits;
    for byte in bytes.iter_mut().rev() {
        if remaining == 0 {
            break;
        }
        if remaining >= 8 {
            *byte = 0;
            remaining -= 8;
        } else {
            *byte &= 0xff >> remaining;
            break;
        }
    }
}

/// `kl + 8 * zl` over 256-bit little-endian integers.
fn add_times_eight(kl: &[u8; 32], zl: &[u8; 32]) -> Result<[u8; 32], KeyError> {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    let mut spill = 0u8;
    for i in 0..32 {
        let shifted = (zl[i] << 3) | spill;
        spill = zl[i] >> 5;
        let sum = kl[i] as u16 + shifted as u16 + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    if carry != 0 || spill != 0 {
        return Err(KeyError::Derivation("child scalar overflows 256 bits".into()));
    }
    Ok(out)
}

/// `a + b mod 2^256`, little-endian.
fn add_wrapping(a: &[u8; 32], b: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    for i in 0..32 {
        let sum = a[i] as u16 + b[i] as u16 + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    out
}

impl ExtendedKey {
    fn from_seed(seed: &Seed) -> Result<Self, KeyError> {
        let mut k = sha512(&[seed.as_bytes()]);
        while k[31] & 0b0010_0000 != 0 {
            let mut m = mac(&k[..32])?;
            m.update(&k[32..]);
            k.copy_from_slice(&m.finalize().into_bytes());
        }

        let mut kl = [0u8; 32];
        let mut kr = [0u8; 32];
        kl.copy_from_slice(&k[..32]);
        kr.copy_from_slice(&k[32..]);
        k.zeroize();

        kl[0] &= 0b1111_1000;
        kl[31] &= 0b0111_1111;
        kl[31] |= 0b0100_0000;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&Sha256::new().chain_update([0x01u8]).chain_update(seed.as_bytes()).finalize());

        Ok(Self { kl, kr, chain_code })
    }

    fn public_key(&self) -> [u8; 32] {
        EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(self.kl)).compress().to_bytes()
    }

    fn child(&self, index: u32, scheme: DerivationScheme) -> Result<Self, KeyError> {
        let index_bytes = index.to_le_bytes();
        let mut z_mac = mac(&self.chain_code)?;
        let mut c_mac = mac(&self.chain_code)?;

        if index >= HARDENED {
            z_mac.update(&[0x00]);
            z_mac.update(&self.kl);
            z_mac.update(&self.kr);
            c_mac.update(&[0x01]);
            c_mac.update(&self.kl);
            c_mac.update(&self.kr);
        } else {
            let public = self.public_key();
            z_mac.update(&[0x02]);
            z_mac.update(&public);
            c_mac.update(&[0x03]);
            c_mac.update(&public);
        }
        z_mac.update(&index_bytes);
        c_mac.update(&index_bytes);

        let z = z_mac.finalize().into_bytes();
        let c = c_mac.finalize().into_bytes();

        let mut zl = [0u8; 32];
        zl.copy_from_slice(&z[..32]);
        truncate(&mut zl, scheme.cleared_bits());

        let kl = add_times_eight(&self.kl, &zl)?;
        let kr = add_wrapping(&self.kr, &z[32..]);
        zl.zeroize();

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&c[32..]);
        Ok(Self { kl, kr, chain_code })
    }

    /// Raw EdDSA over the extended key: the nonce comes from `kR`, not from a
    /// hash of a 32-byte secret.
    fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let public = self.public_key();
        let r = Scalar::from_bytes_mod_order_wide(&sha512(&[&self.kr, message]));
        let big_r = EdwardsPoint::mul_base(&r).compress().to_bytes();
        let h = Scalar::from_bytes_mod_order_wide(&sha512(&[&big_r, &public, message]));
        let s = r + h * Scalar::from_bytes_mod_order(self.kl);

        let mut sig = [0u8; SIGNATURE_LEN];
        sig[..32].copy_from_slice(&big_r);
        sig[32..].copy_from_slice(&s.to_bytes());
        sig
    }
}

/// BIP32-Ed25519 key tree rooted at one seed.
pub struct Bip32Ed25519 {
    root: ExtendedKey,
    scheme: DerivationScheme,
}

impl Bip32Ed25519 {
    pub fn from_seed(seed: &Seed) -> Result<Self, KeyError> {
        Self::with_scheme(seed, DerivationScheme::default())
    }

    pub fn with_scheme(seed: &Seed, scheme: DerivationScheme) -> Result<Self, KeyError> {
        Ok(Self { root: ExtendedKey::from_seed(seed)?, scheme })
    }

    pub fn scheme(&self) -> DerivationScheme { self.scheme }

    fn derive(&self, path: &DerivationPath) -> Result<ExtendedKey, KeyError> {
        let mut node = self.root.clone();
        for index in path.indices() {
            node = node.child(index, self.scheme)?;
        }
        Ok(node)
    }
}

impl KeyMaterial for Bip32Ed25519 {
    fn derive_public_key(&self, path: &DerivationPath) -> Result<PublicKey, KeyError> {
        Ok(PublicKey(self.derive(path)?.public_key()))
    }

    fn sign(&self, path: &DerivationPath, message: &[u8]) -> Result<Signature, KeyError> {
        Ok(Signature(self.derive(path)?.sign(message)))
    }
}

impl std::fmt::Debug for Bip32Ed25519 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bip32Ed25519").field("scheme", &self.scheme).finish_non_exhaustive()
    }
}
