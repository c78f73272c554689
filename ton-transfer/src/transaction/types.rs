//! Common transaction types

use std::sync::Arc;

use num_bigint::BigUint;

use crate::account::Address;
use crate::boc::{ArcCell, Cell, CellBuilder, CellSlice};
use crate::error::{Error, Result};

/// Contract initialization payload: code and data cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateInit {
    /// Contract code
    pub code: Option<ArcCell>,
    /// Initial persistent data
    pub data: Option<ArcCell>,
}

impl StateInit {
    /// Create a state init
    pub fn new(code: Option<ArcCell>, data: Option<ArcCell>) -> Self {
        Self { code, data }
    }

    /// Write `split_depth special code data library` into a builder
    pub fn write_to(&self, builder: &mut CellBuilder) -> Result<()> {
        // split_depth, special
        builder.store_bit(false)?;
        builder.store_bit(false)?;
        store_maybe_ref(builder, self.code.as_ref())?;
        store_maybe_ref(builder, self.data.as_ref())?;
        // library
        builder.store_bit(false)?;
        Ok(())
    }

    /// Write the state init into a fresh cell
    pub fn to_cell(&self) -> Result<Cell> {
        let mut builder = CellBuilder::new();
        self.write_to(&mut builder)?;
        builder.build()
    }

    /// Read a state init; split depth, special and library must be absent
    pub fn read_from(slice: &mut CellSlice<'_>) -> Result<Self> {
        if slice.load_bit()? || slice.load_bit()? {
            return Err(Error::Cell(
                "state init with split depth or special flags is not supported".to_string(),
            ));
        }
        let code = load_maybe_ref(slice)?;
        let data = load_maybe_ref(slice)?;
        if slice.load_bit()? {
            return Err(Error::Cell(
                "state init with libraries is not supported".to_string(),
            ));
        }
        Ok(Self { code, data })
    }

    /// Parse a state init from a cell that holds nothing else
    pub fn from_cell(cell: &Cell) -> Result<Self> {
        let mut slice = cell.begin_parse();
        let init = Self::read_from(&mut slice)?;
        if slice.remaining_bits() != 0 || slice.remaining_refs() != 0 {
            return Err(Error::Cell(format!(
                "state init cell has {} trailing bits and {} trailing references",
                slice.remaining_bits(),
                slice.remaining_refs()
            )));
        }
        Ok(init)
    }

    /// Address of a contract deployed with this state init
    pub fn address(&self, workchain: i32) -> Result<Address> {
        Ok(Address::new(workchain, self.to_cell()?.hash()))
    }
}

fn store_maybe_ref(builder: &mut CellBuilder, cell: Option<&ArcCell>) -> Result<()> {
    match cell {
        Some(cell) => {
            builder.store_bit(true)?;
            builder.store_reference(cell.clone())?;
        }
        None => {
            builder.store_bit(false)?;
        }
    }
    Ok(())
}

fn load_maybe_ref(slice: &mut CellSlice<'_>) -> Result<Option<ArcCell>> {
    if slice.load_bit()? {
        Ok(Some(slice.load_reference()?.clone()))
    } else {
        Ok(None)
    }
}

/// What a sender needs to dispatch one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    /// Destination address
    pub to: Address,
    /// Amount in nanotons
    pub value: BigUint,
    /// Contract initialization payload
    pub state_init: StateInit,
    /// Optional message body
    pub message: Option<ArcCell>,
}

impl TransactionDetails {
    /// Create transaction details without a message body
    pub fn new(to: Address, value: impl Into<BigUint>, state_init: StateInit) -> Self {
        Self {
            to,
            value: value.into(),
            state_init,
            message: None,
        }
    }

    /// Attach a message body
    pub fn with_message(mut self, message: Cell) -> Self {
        self.message = Some(Arc::new(message));
        self
    }
}
