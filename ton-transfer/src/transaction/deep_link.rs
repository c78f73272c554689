//! Sender that hands the transfer to a wallet app through a deep link

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::account::FriendlyFormat;
use crate::encoding::cell_to_base64_url;
use crate::error::{Error, Result};
use crate::platform::LinkOpener;
use super::sender::TransactionSender;
use super::types::TransactionDetails;

/// Scheme used by TON wallet apps
pub const DEFAULT_DEEP_LINK_PREFIX: &str = "ton";

/// Build `<prefix>://transfer/<address>?amount=<nanotons>&init=<boc>`,
/// with `&bin=<boc>` when the transfer carries a message payload
pub fn build_link(prefix: &str, details: &TransactionDetails) -> Result<String> {
    let init = cell_to_base64_url(&details.state_init.to_cell()?)?;
    debug!(init = %init, "Encoded state init");

    let mut link = format!(
        "{}://transfer/{}?amount={}&init={}",
        prefix,
        details.to.to_friendly(FriendlyFormat::default()),
        details.value,
        init
    );
    if let Some(message) = &details.message {
        link.push_str("&bin=");
        link.push_str(&cell_to_base64_url(message)?);
    }
    Ok(link)
}

/// Opens a transfer deep link with the platform's link opener
pub struct DeepLinkTransactionSender {
    prefix: String,
    opener: Option<Arc<dyn LinkOpener>>,
}

impl DeepLinkTransactionSender {
    pub fn new(prefix: impl Into<String>, opener: Arc<dyn LinkOpener>) -> Self {
        Self {
            prefix: prefix.into(),
            opener: Some(opener),
        }
    }

    /// Sender on a host that cannot open links
    pub fn without_opener(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            opener: None,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The link this sender would open for `details`
    pub fn link(&self, details: &TransactionDetails) -> Result<String> {
        build_link(&self.prefix, details)
    }
}

#[async_trait]
impl TransactionSender for DeepLinkTransactionSender {
    async fn send_transaction(&self, details: &TransactionDetails) -> Result<()> {
        let opener = self
            .opener
            .as_ref()
            .ok_or_else(|| Error::LinkOpenerUnavailable("No link opener on this platform".to_string()))?;

        let link = self.link(details)?;
        info!(to = %details.to, value = %details.value, "Opening transfer deep link");
        opener.open(&link).await
    }
}
