//! SignedTransactionEnvelope - what actually goes on the wire.

use crate::core::Address;
use crate::error::{WalletError, WalletResult};
use crate::keys::{Signature, SIGNATURE_LEN};
use crate::tx::draft::{TransactionDraft, WireTxn};
use serde::Serialize;
use serde_bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransactionEnvelope {
    pub draft: TransactionDraft,
    pub signature: Signature,
    /// Set only when the signing key is not the sender's own key.
    pub auth_addr: Option<Address>,
}

#[derive(Serialize)]
struct WireSigned<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sgnr: Option<&'a Bytes>,
    sig: &'a Bytes,
    txn: WireTxn<'a>,
}

fn encode_parts(draft: &TransactionDraft, signature: &[u8; SIGNATURE_LEN], auth_addr: Option<&Address>) -> WalletResult<Vec<u8>> {
    let wire = WireSigned {
        sgnr: auth_addr.map(|a| Bytes::new(a.as_bytes())),
        sig: Bytes::new(signature),
        txn: draft.wire(),
    };
    rmp_serde::to_vec_named(&wire).map_err(|e| WalletError::Encoding(e.to_string()))
}

impl SignedTransactionEnvelope {
    pub fn new(draft: TransactionDraft, signature: Signature, auth_addr: Option<Address>) -> Self {
        Self { draft, signature, auth_addr }
    }

    /// Canonical msgpack `{sgnr?, sig, txn}`.
    pub fn encode(&self) -> WalletResult<Vec<u8>> {
        encode_parts(&self.draft, self.signature.as_bytes(), self.auth_addr.as_ref())
    }

    /// Encoded length of the envelope `draft` will become.
    pub fn estimate_size(draft: &TransactionDraft, auth_addr: Option<Address>) -> WalletResult<usize> {
        Ok(encode_parts(draft, &[0u8; SIGNATURE_LEN], auth_addr.as_ref())?.len())
    }

    pub fn tx_id(&self) -> WalletResult<String> { self.draft.tx_id() }

    pub fn is_rekeyed(&self) -> bool { self.auth_addr.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::draft::tests::params;

    fn draft() -> TransactionDraft {
        let a = Address::from_public_key([1u8; 32]);
        TransactionDraft::payment(a, Address::from_public_key([2u8; 32]), 10, b"hi".to_vec(), &params()).unwrap()
    }

    #[test]
    fn test_envelope_layout() {
        let env = SignedTransactionEnvelope::new(draft(), Signature([3u8; 64]), None);
        let enc = env.encode().unwrap();
        assert_eq!(enc[0], 0x82);
        assert_eq!(&enc[1..5], &[0xa3, b's', b'i', b'g']);
        assert_eq!(&enc[5..7], &[0xc4, 64]);
        assert_eq!(&enc[7..71], &[3u8; 64]);
        assert_eq!(&enc[71..75], &[0xa3, b't', b'x', b'n']);
        assert_eq!(&enc[75..], draft().encode().unwrap().as_slice());
    }

    #[test]
    fn test_auth_addr_sorts_first() {
        let signer = Address::from_public_key([9u8; 32]);
        let env = SignedTransactionEnvelope::new(draft(), Signature([0u8; 64]), Some(signer));
        let enc = env.encode().unwrap();
        assert_eq!(enc[0], 0x83);
        assert_eq!(&enc[1..6], &[0xa4, b's', b'g', b'n', b'r']);
        assert_eq!(&enc[6..8], &[0xc4, 32]);
        assert_eq!(&enc[8..40], signer.as_bytes());
        assert!(env.is_rekeyed());
    }

    #[test]
    fn test_estimate_matches_real_size() {
        let d = draft();
        let env = SignedTransactionEnvelope::new(d.clone(), Signature([0xffu8; 64]), None);
        assert_eq!(SignedTransactionEnvelope::estimate_size(&d, None).unwrap(), env.encode().unwrap().len());
        assert_eq!(env.tx_id().unwrap(), d.tx_id().unwrap());
    }
}
