//! Sender that signs with a locally held mnemonic and submits over RPC

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::account::{Address, WalletTransfer, WalletV3R1};
use crate::boc::to_boc;
use crate::crypto::mnemonic::mnemonic_to_key_pair;
use crate::crypto::keys::KeyPair;
use crate::error::Result;
use super::message::{InternalMessage, SendMode};
use super::provider::TonRpc;
use super::sender::TransactionSender;
use super::types::TransactionDetails;

/// Signs transfers from a v3r1 wallet and submits them to the network
pub struct MnemonicTransactionSender<C> {
    mnemonic: String,
    password: Option<String>,
    workchain: i32,
    client: Arc<C>,
}

impl<C: TonRpc> MnemonicTransactionSender<C> {
    /// Sender for the basechain wallet of `mnemonic`
    pub fn new(mnemonic: impl Into<String>, client: Arc<C>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            password: None,
            workchain: 0,
            client,
        }
    }

    pub fn with_workchain(mut self, workchain: i32) -> Self {
        self.workchain = workchain;
        self
    }

    /// Password protecting the mnemonic
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    fn key_pair(&self) -> Result<KeyPair> {
        mnemonic_to_key_pair(&self.mnemonic, self.password.as_deref())
    }

    /// The wallet controlled by the mnemonic
    pub fn wallet(&self) -> Result<WalletV3R1> {
        Ok(WalletV3R1::new(self.workchain, self.key_pair()?.public_key()))
    }

    /// Address of the wallet controlled by the mnemonic
    pub fn wallet_address(&self) -> Result<Address> {
        self.wallet()?.address()
    }
}

impl<C> fmt::Debug for MnemonicTransactionSender<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicTransactionSender")
            .field("mnemonic", &"[REDACTED]")
            .field("workchain", &self.workchain)
            .finish()
    }
}

#[async_trait]
impl<C: TonRpc> TransactionSender for MnemonicTransactionSender<C> {
    async fn send_transaction(&self, details: &TransactionDetails) -> Result<()> {
        let key_pair = self.key_pair()?;
        let wallet = WalletV3R1::new(self.workchain, key_pair.public_key());
        let wallet_address = wallet.address()?;

        let deployed = self.client.is_contract_deployed(&wallet_address).await?;
        let seqno = if deployed {
            self.client.get_seqno(&wallet_address).await?
        } else {
            0
        };
        debug!(wallet = %wallet_address, deployed, seqno, "Resolved wallet state");

        let order = InternalMessage {
            to: details.to,
            value: details.value.clone(),
            bounce: false,
            state_init: Some(details.state_init.to_cell()?.into()),
            body: details.message.clone(),
        };
        let transfer = WalletTransfer {
            seqno,
            send_mode: SendMode::PAY_GAS_SEPARATELY | SendMode::IGNORE_ERRORS,
            valid_until: WalletTransfer::default_valid_until(seqno, Utc::now().timestamp()),
            order,
        };

        let body = wallet.create_transfer(&key_pair, &transfer)?;
        let message = wallet.external_message(body, !deployed)?;
        let boc = to_boc(&message)?;

        info!(
            wallet = %wallet_address,
            to = %details.to,
            value = %details.value,
            seqno,
            "Submitting signed transfer"
        );
        self.client.send_boc(&boc).await
    }
}
