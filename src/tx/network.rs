//! Network collaborator contract.
//!
//! The pipeline only knows these four calls. Each one is a suspension point;
//! nothing else in a submission waits on I/O.

use crate::core::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("network unreachable: {0}")]
    Unreachable(String),
    #[error("unsuccessful response: {0}")]
    Unsuccessful(String),
}

/// Suggested parameters for a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    /// microAlgos per byte of the signed transaction.
    pub fee_per_byte: u64,
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

/// One answer to a pending-transaction query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStatus {
    pub confirmed_round: Option<u64>,
    /// Non-empty when the pool dropped the transaction.
    pub pool_error: Option<String>,
}

impl PendingStatus {
    pub fn pending() -> Self { Self::default() }

    pub fn confirmed(round: u64) -> Self { Self { confirmed_round: Some(round), pool_error: None } }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self { confirmed_round: None, pool_error: Some(reason.into()) }
    }

    /// Round the transaction landed in. Round 0 means still pending.
    pub fn round(&self) -> Option<u64> { self.confirmed_round.filter(|r| *r > 0) }

    pub fn pool_error(&self) -> Option<&str> { self.pool_error.as_deref().filter(|e| !e.is_empty()) }
}

#[async_trait]
pub trait NetworkClient: Send + Sync {
    async fn fetch_parameters(&self) -> Result<TransactionParams, NetworkError>;

    /// Submit an encoded signed transaction. Returns the transaction id the
    /// network assigned.
    async fn broadcast(&self, signed: &[u8]) -> Result<String, NetworkError>;

    async fn pending_status(&self, tx_id: &str) -> Result<PendingStatus, NetworkError>;

    /// Balance of `address` in microAlgos.
    async fn balance(&self, address: &Address) -> Result<u64, NetworkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_status_round() {
        assert_eq!(PendingStatus::pending().round(), None);
        assert_eq!(PendingStatus::confirmed(0).round(), None);
        assert_eq!(PendingStatus::confirmed(42).round(), Some(42));
    }

    #[test]
    fn test_empty_pool_error_is_not_an_error() {
        assert_eq!(PendingStatus::rejected("").pool_error(), None);
        assert_eq!(PendingStatus::rejected("overspend").pool_error(), Some("overspend"));
    }
}
