//! The common sender abstraction

use async_trait::async_trait;

use crate::error::Result;
use super::types::TransactionDetails;

/// Dispatches a transfer through one transport
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Hand the transaction to the transport; no retry on failure
    async fn send_transaction(&self, details: &TransactionDetails) -> Result<()>;
}
