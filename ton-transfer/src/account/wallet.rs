//! Wallet v3r1 contract

use std::sync::Arc;

use crate::boc::{from_boc_single_root, ArcCell, Cell, CellBuilder};
use crate::crypto::keys::KeyPair;
use crate::error::{Error, Result};
use crate::transaction::{external_message, InternalMessage, SendMode, StateInit};
use super::address::Address;

/// Canonical wallet v3r1 code
const WALLET_V3R1_CODE: &str = "B5EE9C724101010100620000C0FF0020DD2082014C97BA9730ED44D0D70B1FE0A4F2608308D7\
                                1820D31FD31FD31FF82313BBF263ED44D0D31FD31FD3FFD15132BAF2A15144BAF2A204F9015410\
                                55F910F2A3F8009320D74A96D307D402FB00E8D101A4C8CB1FCB1FCBFFC9ED543FBE6EE0";

/// Base subwallet id; the workchain is added to it
pub const DEFAULT_WALLET_ID: u32 = 698_983_191;

/// Seconds a signed transfer stays valid
pub const DEFAULT_TRANSFER_TIMEOUT: u32 = 60;

/// Parse the wallet v3r1 code cell
pub fn wallet_v3r1_code() -> Result<ArcCell> {
    let bytes = hex::decode(WALLET_V3R1_CODE)
        .map_err(|e| Error::Boc(format!("Invalid wallet code: {}", e)))?;
    from_boc_single_root(&bytes)
}

/// One transfer order for the wallet to execute
#[derive(Debug, Clone)]
pub struct WalletTransfer {
    /// Current wallet seqno
    pub seqno: u32,
    pub send_mode: SendMode,
    /// Unix time after which the wallet rejects the message
    pub valid_until: u32,
    pub order: InternalMessage,
}

impl WalletTransfer {
    /// `valid_until` for a transfer created now: no expiry for the first
    /// transfer of an undeployed wallet, `now + timeout` afterwards
    pub fn default_valid_until(seqno: u32, now: i64) -> u32 {
        if seqno == 0 {
            u32::MAX
        } else {
            (now.max(0) as u64 + DEFAULT_TRANSFER_TIMEOUT as u64).min(u32::MAX as u64) as u32
        }
    }
}

/// A v3r1 wallet owned by one ed25519 public key
#[derive(Debug, Clone)]
pub struct WalletV3R1 {
    workchain: i32,
    public_key: [u8; 32],
    wallet_id: u32,
}

impl WalletV3R1 {
    /// Wallet with the default subwallet id for the workchain
    pub fn new(workchain: i32, public_key: [u8; 32]) -> Self {
        Self {
            workchain,
            public_key,
            wallet_id: DEFAULT_WALLET_ID.wrapping_add(workchain as u32),
        }
    }

    pub fn workchain(&self) -> i32 {
        self.workchain
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn wallet_id(&self) -> u32 {
        self.wallet_id
    }

    /// Initial data: `seqno:uint32 wallet_id:uint32 public_key:bits256`
    pub fn data_cell(&self) -> Result<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_uint(0, 32)?;
        builder.store_uint(self.wallet_id as u64, 32)?;
        builder.store_bytes(&self.public_key)?;
        builder.build()
    }

    /// Code and data deploying this wallet
    pub fn state_init(&self) -> Result<StateInit> {
        Ok(StateInit::new(
            Some(wallet_v3r1_code()?),
            Some(Arc::new(self.data_cell()?)),
        ))
    }

    /// Address derived from the state init
    pub fn address(&self) -> Result<Address> {
        self.state_init()?.address(self.workchain)
    }

    /// The unsigned part of a transfer
    pub fn signing_message(&self, transfer: &WalletTransfer) -> Result<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_uint(self.wallet_id as u64, 32)?;
        builder.store_uint(transfer.valid_until as u64, 32)?;
        builder.store_uint(transfer.seqno as u64, 32)?;
        builder.store_uint(transfer.send_mode.bits() as u64, 8)?;
        builder.store_reference(Arc::new(transfer.order.to_cell()?))?;
        builder.build()
    }

    /// Signature over the signing message hash, followed by the signing message
    pub fn create_transfer(&self, key_pair: &KeyPair, transfer: &WalletTransfer) -> Result<Cell> {
        if key_pair.public_key() != self.public_key {
            return Err(Error::Signing("Key pair does not control this wallet".to_string()));
        }

        let signing_message = self.signing_message(transfer)?;
        let signature = key_pair.sign(&signing_message.hash());

        let mut builder = CellBuilder::new();
        builder.store_bytes(&signature)?;
        builder.store_cell(&signing_message)?;
        builder.build()
    }

    /// Wrap a signed transfer into an external message, deploying the
    /// wallet along with it when it is not active yet
    pub fn external_message(&self, body: Cell, deploy: bool) -> Result<Cell> {
        let state_init = if deploy { Some(self.state_init()?) } else { None };
        external_message(&self.address()?, state_init.as_ref(), Arc::new(body))
    }
}
