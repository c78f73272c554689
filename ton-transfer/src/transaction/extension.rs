//! Sender backed by a browser extension's injected provider

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::encoding::cell_to_base64;
use crate::error::{Error, Result};
use crate::platform::InjectedProvider;
use super::sender::TransactionSender;
use super::types::TransactionDetails;

/// Provider method that asks the extension to sign and send a transfer
pub const SEND_TRANSACTION_METHOD: &str = "ton_sendTransaction";

/// Parameter object of a `ton_sendTransaction` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest {
    pub to: String,
    /// Decimal nanotons
    pub value: String,
    /// Message payload as a standard base64 BoC
    pub data: Option<String>,
    pub data_type: String,
    /// State init as a standard base64 BoC
    pub state_init: String,
}

impl ProviderRequest {
    /// Encode the transfer for the provider
    pub fn from_details(details: &TransactionDetails) -> Result<Self> {
        let state_init = cell_to_base64(&details.state_init.to_cell()?)?;
        let data = details
            .message
            .as_deref()
            .map(cell_to_base64)
            .transpose()?;

        Ok(Self {
            to: details.to.to_string(),
            value: details.value.to_string(),
            data,
            data_type: "boc".to_string(),
            state_init,
        })
    }

    /// Single-element parameter array
    pub fn to_params(&self) -> Result<Value> {
        serde_json::to_value([self])
            .map_err(|e| Error::Serialization(format!("Failed to encode provider request: {}", e)))
    }
}

/// Sends transfers through an injected provider
pub struct ExtensionTransactionSender {
    provider: Option<Arc<dyn InjectedProvider>>,
}

impl ExtensionTransactionSender {
    pub fn new(provider: Arc<dyn InjectedProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Sender for a host where no extension injected a provider
    pub fn without_provider() -> Self {
        Self { provider: None }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }
}

#[async_trait]
impl TransactionSender for ExtensionTransactionSender {
    async fn send_transaction(&self, details: &TransactionDetails) -> Result<()> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::ProviderUnavailable("No injected TON provider".to_string()))?;

        let request = ProviderRequest::from_details(details)?;
        debug!(state_init = %request.state_init, "Encoded state init");

        info!(to = %request.to, value = %request.value, "Sending transaction through extension");
        provider.send(SEND_TRANSACTION_METHOD, request.to_params()?).await
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use serde_json::json;

    use super::*;
    use crate::account::Address;
    use crate::boc::{Cell, CellBuilder};
    use crate::transaction::StateInit;

    fn details() -> TransactionDetails {
        let code = CellBuilder::new().store_uint(0xabcd, 16).unwrap().build_arc().unwrap();
        TransactionDetails::new(
            Address::new(0, [0x11; 32]),
            BigUint::from(1_500_000_000u64),
            StateInit::new(Some(code), None),
        )
    }

    #[test]
    fn test_request_fields() {
        let request = ProviderRequest::from_details(&details()).unwrap();
        assert_eq!(request.value, "1500000000");
        assert_eq!(request.data, None);
        assert_eq!(request.data_type, "boc");
        assert_eq!(request.to, Address::new(0, [0x11; 32]).to_string());
    }

    #[test]
    fn test_params_shape() {
        let details = details().with_message(Cell::empty());
        let params = ProviderRequest::from_details(&details).unwrap().to_params().unwrap();

        let entry = &params.as_array().unwrap()[0];
        assert_eq!(params.as_array().unwrap().len(), 1);
        assert_eq!(entry["dataType"], json!("boc"));
        assert!(entry["data"].is_string());
        assert!(entry["stateInit"].is_string());
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let sender = ExtensionTransactionSender::without_provider();
        assert!(!sender.has_provider());
        let error = sender.send_transaction(&details()).await.unwrap_err();
        assert!(matches!(error, Error::ProviderUnavailable(_)));
    }
}
