//! Internal and external messages

use std::ops::BitOr;

use num_bigint::BigUint;

use crate::account::Address;
use crate::boc::{ArcCell, Cell, CellBuilder};
use crate::error::Result;
use super::types::StateInit;

/// Flags controlling how the wallet pays for and handles an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendMode(u8);

impl SendMode {
    pub const ORDINARY: SendMode = SendMode(0);
    pub const PAY_GAS_SEPARATELY: SendMode = SendMode(1);
    pub const IGNORE_ERRORS: SendMode = SendMode(2);
    pub const DESTROY_IF_ZERO: SendMode = SendMode(32);
    pub const CARRY_REMAINING_VALUE: SendMode = SendMode(64);
    pub const CARRY_ALL_BALANCE: SendMode = SendMode(128);

    /// Raw flag byte
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for SendMode {
    type Output = SendMode;

    fn bitor(self, rhs: SendMode) -> SendMode {
        SendMode(self.0 | rhs.0)
    }
}

/// An internal message carrying value, and optionally a state init and body
#[derive(Debug, Clone)]
pub struct InternalMessage {
    pub to: Address,
    pub value: BigUint,
    pub bounce: bool,
    pub state_init: Option<ArcCell>,
    pub body: Option<ArcCell>,
}

impl InternalMessage {
    /// Write `int_msg_info` followed by init and body
    pub fn write_to(&self, builder: &mut CellBuilder) -> Result<()> {
        // int_msg_info$0 ihr_disabled bounce bounced
        builder.store_bit(false)?;
        builder.store_bit(true)?;
        builder.store_bit(self.bounce)?;
        builder.store_bit(false)?;
        builder.store_address(None)?;
        builder.store_address(Some(&self.to))?;
        builder.store_coins(&self.value)?;
        // no extra currencies
        builder.store_bit(false)?;
        // ihr_fee, fwd_fee
        builder.store_coins(&BigUint::from(0u8))?;
        builder.store_coins(&BigUint::from(0u8))?;
        // created_lt, created_at
        builder.store_uint(0, 64)?;
        builder.store_uint(0, 32)?;

        store_init_and_body(builder, self.state_init.as_ref(), self.body.as_ref())
    }

    pub fn to_cell(&self) -> Result<Cell> {
        let mut builder = CellBuilder::new();
        self.write_to(&mut builder)?;
        builder.build()
    }
}

/// Build an inbound external message addressed to a wallet
pub fn external_message(to: &Address, state_init: Option<&StateInit>, body: ArcCell) -> Result<Cell> {
    let mut builder = CellBuilder::new();
    // ext_in_msg_info$10
    builder.store_uint(0b10, 2)?;
    builder.store_address(None)?;
    builder.store_address(Some(to))?;
    // import_fee
    builder.store_coins(&BigUint::from(0u8))?;

    let init: Option<ArcCell> = match state_init {
        Some(init) => Some(init.to_cell()?.into()),
        None => None,
    };
    store_init_and_body(&mut builder, init.as_ref(), Some(&body))?;
    builder.build()
}

/// `init:(Maybe (Either StateInit ^StateInit)) body:(Either X ^X)`, both as references
fn store_init_and_body(builder: &mut CellBuilder, init: Option<&ArcCell>, body: Option<&ArcCell>) -> Result<()> {
    match init {
        Some(init) => {
            builder.store_bit(true)?;
            builder.store_bit(true)?;
            builder.store_reference(init.clone())?;
        }
        None => {
            builder.store_bit(false)?;
        }
    }

    match body {
        Some(body) => {
            builder.store_bit(true)?;
            builder.store_reference(body.clone())?;
        }
        None => {
            builder.store_bit(false)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_send_mode_flags() {
        let mode = SendMode::PAY_GAS_SEPARATELY | SendMode::IGNORE_ERRORS;
        assert_eq!(mode.bits(), 3);
        assert_eq!(SendMode::default(), SendMode::ORDINARY);
    }

    #[test]
    fn test_internal_message_layout() {
        let to = Address::new(0, [0x42; 32]);
        let init = Arc::new(StateInit::default().to_cell().unwrap());
        let message = InternalMessage {
            to,
            value: BigUint::from(50_000_000u64),
            bounce: false,
            state_init: Some(init.clone()),
            body: None,
        };
        let cell = message.to_cell().unwrap();

        let mut slice = cell.begin_parse();
        assert!(!slice.load_bit().unwrap());
        assert!(slice.load_bit().unwrap());
        assert!(!slice.load_bit().unwrap());
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.load_address().unwrap(), None);
        assert_eq!(slice.load_address().unwrap(), Some(to));
        assert_eq!(slice.load_coins().unwrap(), BigUint::from(50_000_000u64));
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.load_coins().unwrap(), BigUint::from(0u8));
        assert_eq!(slice.load_coins().unwrap(), BigUint::from(0u8));
        assert_eq!(slice.load_uint(64).unwrap(), 0);
        assert_eq!(slice.load_uint(32).unwrap(), 0);
        // init present, as a reference
        assert!(slice.load_bit().unwrap());
        assert!(slice.load_bit().unwrap());
        assert_eq!(slice.load_reference().unwrap().hash(), init.hash());
        // empty inline body
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.remaining_bits(), 0);
    }

    #[test]
    fn test_external_message_without_init() {
        let wallet = Address::new(0, [0x01; 32]);
        let body = Arc::new(Cell::empty());
        let cell = external_message(&wallet, None, body.clone()).unwrap();

        let mut slice = cell.begin_parse();
        assert_eq!(slice.load_uint(2).unwrap(), 0b10);
        assert_eq!(slice.load_address().unwrap(), None);
        assert_eq!(slice.load_address().unwrap(), Some(wallet));
        assert_eq!(slice.load_coins().unwrap(), BigUint::from(0u8));
        assert!(!slice.load_bit().unwrap());
        assert!(slice.load_bit().unwrap());
        assert_eq!(slice.load_reference().unwrap().hash(), body.hash());
    }
}
