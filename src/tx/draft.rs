//! TransactionDraft - an unsigned payment and its canonical encoding.
//!
//! Canonical form is a msgpack map with keys in ascending order and every
//! zero or empty value left out. The same bytes feed the signature, the
//! transaction id and the size estimate behind the fee.

use crate::core::Address;
use crate::error::{WalletError, WalletResult};
use crate::tx::envelope::SignedTransactionEnvelope;
use crate::tx::network::TransactionParams;
use data_encoding::BASE32_NOPAD;
use serde::Serialize;
use serde_bytes::Bytes;
use sha2::{Digest, Sha512_256};

/// Domain separator prepended before signing.
pub const TX_TAG: &[u8] = b"TX";
pub const MAX_NOTE_LEN: usize = 1024;
pub const PAYMENT_TYPE: &str = "pay";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub sender: Address,
    pub receiver: Address,
    /// microAlgos.
    pub amount: u64,
    pub note: Vec<u8>,
    pub first_valid: u64,
    pub last_valid: u64,
    pub fee: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

/// Field order here is the wire order.
#[derive(Serialize)]
pub(crate) struct WireTxn<'a> {
    #[serde(skip_serializing_if = "is_zero")]
    amt: u64,
    #[serde(skip_serializing_if = "is_zero")]
    fee: u64,
    #[serde(skip_serializing_if = "is_zero")]
    fv: u64,
    #[serde(rename = "gen", skip_serializing_if = "is_empty_str")]
    genesis_id: &'a str,
    gh: &'a Bytes,
    #[serde(skip_serializing_if = "is_zero")]
    lv: u64,
    #[serde(skip_serializing_if = "is_empty_bytes")]
    note: &'a Bytes,
    #[serde(skip_serializing_if = "is_zero_address")]
    rcv: &'a Bytes,
    #[serde(skip_serializing_if = "is_zero_address")]
    snd: &'a Bytes,
    #[serde(rename = "type")]
    kind: &'static str,
}

fn is_zero(v: &u64) -> bool { *v == 0 }
fn is_empty_str(s: &&str) -> bool { s.is_empty() }
fn is_empty_bytes(b: &&Bytes) -> bool { b.is_empty() }
fn is_zero_address(b: &&Bytes) -> bool { b.iter().all(|x| *x == 0) }

impl TransactionDraft {
    /// Payment from `sender` to `receiver` inside the window in `params`.
    /// The fee is left at zero; see [`TransactionDraft::with_suggested_fee`].
    pub fn payment(
        sender: Address,
        receiver: Address,
        amount: u64,
        note: Vec<u8>,
        params: &TransactionParams,
    ) -> WalletResult<Self> {
        if note.len() > MAX_NOTE_LEN {
            return Err(WalletError::Encoding(format!("note is {} bytes, max {}", note.len(), MAX_NOTE_LEN)));
        }
        Ok(Self {
            sender,
            receiver,
            amount,
            note,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            fee: 0,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
        })
    }

    /// Set the fee to `max(min_fee, fee_per_byte * size)`, where size is the
    /// signed envelope as it will be broadcast, signature zeroed.
    pub fn with_suggested_fee(mut self, params: &TransactionParams, auth_addr: Option<Address>) -> WalletResult<Self> {
        let size = SignedTransactionEnvelope::estimate_size(&self, auth_addr)? as u64;
        self.fee = params.fee_per_byte.saturating_mul(size).max(params.min_fee);
        Ok(self)
    }

    pub(crate) fn wire(&self) -> WireTxn<'_> {
        WireTxn {
            amt: self.amount,
            fee: self.fee,
            fv: self.first_valid,
            genesis_id: &self.genesis_id,
            gh: Bytes::new(&self.genesis_hash),
            lv: self.last_valid,
            note: Bytes::new(&self.note),
            rcv: Bytes::new(self.receiver.as_bytes()),
            snd: Bytes::new(self.sender.as_bytes()),
            kind: PAYMENT_TYPE,
        }
    }

    /// Canonical msgpack of the unsigned transaction.
    pub fn encode(&self) -> WalletResult<Vec<u8>> {
        rmp_serde::to_vec_named(&self.wire()).map_err(|e| WalletError::Encoding(e.to_string()))
    }

    /// `"TX" || encode()`, the exact message that gets signed.
    pub fn bytes_to_sign(&self) -> WalletResult<Vec<u8>> {
        let mut out = TX_TAG.to_vec();
        out.extend(self.encode()?);
        Ok(out)
    }

    pub fn tx_id(&self) -> WalletResult<String> {
        let digest = Sha512_256::digest(self.bytes_to_sign()?);
        Ok(BASE32_NOPAD.encode(&digest))
    }
}
