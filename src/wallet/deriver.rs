//! Address derivation and the rekey comparison.

use crate::core::{Address, DerivationPath};
use crate::keys::{KeyError, KeyMaterial};

/// Public key at `path`, encoded as an address. Pure.
pub fn derive_address(keys: &dyn KeyMaterial, path: &DerivationPath) -> Result<Address, KeyError> {
    Ok(keys.derive_public_key(path)?.to_address())
}

/// Auth address an envelope must carry when `signer` is not the sender
/// itself, i.e. the sender account was rekeyed to the signer's key.
pub fn rekey_auth_address(signer: &Address, sender: &Address) -> Option<Address> {
    (signer != sender).then_some(*signer)
}
