//! Cell builder

use std::sync::Arc;

use num_bigint::BigUint;

use crate::account::Address;
use crate::error::{Error, Result};
use super::cell::{ArcCell, Cell, MAX_CELL_BITS, MAX_CELL_REFS};

/// Largest byte length a `Coins` (VarUInteger 16) value can take
const MAX_COINS_BYTES: u64 = 15;

/// Incrementally writes bits and references into a new cell
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<ArcCell>,
}

impl CellBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Number of free data bits
    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    fn ensure_bits(&self, bits: usize) -> Result<()> {
        if bits > self.available_bits() {
            return Err(Error::Cell(format!(
                "cannot store {} bits, only {} available",
                bits,
                self.available_bits()
            )));
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Write a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Write an unsigned integer using exactly `bits` bits
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        if bits > 64 {
            return Err(Error::Cell(format!("store_uint supports at most 64 bits, got {}", bits)));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(Error::Cell(format!("value {} does not fit in {} bits", value, bits)));
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Write a signed integer in two's complement using exactly `bits` bits
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self> {
        if bits == 0 || bits > 64 {
            return Err(Error::Cell(format!("store_int supports 1 to 64 bits, got {}", bits)));
        }
        if bits < 64 {
            let limit = 1i64 << (bits - 1);
            if value < -limit || value >= limit {
                return Err(Error::Cell(format!("value {} does not fit in {} signed bits", value, bits)));
            }
        }
        self.ensure_bits(bits)?;
        let raw = value as u64;
        for i in (0..bits).rev() {
            self.push_bit((raw >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Write an arbitrary precision unsigned integer using exactly `bits` bits
    pub fn store_biguint(&mut self, value: &BigUint, bits: usize) -> Result<&mut Self> {
        if value.bits() > bits as u64 {
            return Err(Error::Cell(format!("value {} does not fit in {} bits", value, bits)));
        }
        self.ensure_bits(bits)?;
        for i in (0..bits as u64).rev() {
            self.push_bit(value.bit(i));
        }
        Ok(self)
    }

    /// Write whole bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.ensure_bits(bytes.len() * 8)?;
        for byte in bytes {
            for i in (0..8).rev() {
                self.push_bit((byte >> i) & 1 == 1);
            }
        }
        Ok(self)
    }

    /// Write a `Coins` amount (4-bit byte length, then the big-endian bytes)
    pub fn store_coins(&mut self, amount: &BigUint) -> Result<&mut Self> {
        let len = (amount.bits() + 7) / 8;
        if len > MAX_COINS_BYTES {
            return Err(Error::Cell(format!("amount {} exceeds the Coins range", amount)));
        }
        self.store_uint(len, 4)?;
        self.store_biguint(amount, (len * 8) as usize)
    }

    /// Write a `MsgAddress`: `addr_none` for `None`, `addr_std` otherwise
    pub fn store_address(&mut self, address: Option<&Address>) -> Result<&mut Self> {
        match address {
            None => self.store_uint(0, 2),
            Some(address) => {
                self.ensure_bits(2 + 1 + 8 + 256)?;
                self.store_uint(0b10, 2)?;
                // no anycast
                self.store_bit(false)?;
                self.store_int(address.workchain() as i64, 8)?;
                self.store_bytes(address.hash_part())
            }
        }
    }

    /// Add a child cell
    pub fn store_reference(&mut self, cell: ArcCell) -> Result<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(Error::Cell(format!("cannot store more than {} references", MAX_CELL_REFS)));
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Append the bits and references of another cell
    pub fn store_cell(&mut self, cell: &Cell) -> Result<&mut Self> {
        self.ensure_bits(cell.bit_len())?;
        if self.references.len() + cell.references().len() > MAX_CELL_REFS {
            return Err(Error::Cell("appended cell has too many references".to_string()));
        }
        for i in 0..cell.bit_len() {
            let byte = cell.data()[i / 8];
            self.push_bit(byte & (0x80 >> (i % 8)) != 0);
        }
        self.references.extend(cell.references().iter().cloned());
        Ok(self)
    }

    /// Finish the cell
    pub fn build(&self) -> Result<Cell> {
        Cell::new(self.data.clone(), self.bit_len, self.references.clone())
    }

    /// Finish the cell behind an `Arc`
    pub fn build_arc(&self) -> Result<ArcCell> {
        self.build().map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_uint_layout() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b101, 3).unwrap();
        builder.store_uint(0xff, 8).unwrap();
        let cell = builder.build().unwrap();

        assert_eq!(cell.bit_len(), 11);
        assert_eq!(cell.data(), &[0b1011_1111, 0b1110_0000]);
    }

    #[test]
    fn test_store_uint_overflow() {
        let mut builder = CellBuilder::new();
        assert!(builder.store_uint(8, 3).is_err());
        assert_eq!(builder.bit_len(), 0);
    }

    #[test]
    fn test_store_int_negative() {
        let mut builder = CellBuilder::new();
        builder.store_int(-1, 8).unwrap();
        assert_eq!(builder.build().unwrap().data(), &[0xff]);
        assert!(builder.store_int(128, 8).is_err());
    }

    #[test]
    fn test_store_coins() {
        let mut builder = CellBuilder::new();
        builder.store_coins(&BigUint::from(0u32)).unwrap();
        assert_eq!(builder.bit_len(), 4);

        let mut builder = CellBuilder::new();
        builder.store_coins(&BigUint::from(1_000_000_000u64)).unwrap();
        let cell = builder.build().unwrap();
        // 4 bytes: 0x3b9aca00
        assert_eq!(cell.bit_len(), 4 + 32);
        assert_eq!(cell.data(), &[0x43, 0xb9, 0xac, 0xa0, 0x00]);
    }

    #[test]
    fn test_store_coins_out_of_range() {
        let too_big = BigUint::from(1u8) << 120;
        assert!(CellBuilder::new().store_coins(&too_big).is_err());
    }

    #[test]
    fn test_bit_capacity() {
        let mut builder = CellBuilder::new();
        builder.store_bytes(&[0u8; 127]).unwrap();
        builder.store_uint(0, 7).unwrap();
        assert_eq!(builder.available_bits(), 0);
        assert!(builder.store_bit(true).is_err());
    }

    #[test]
    fn test_reference_capacity() {
        let mut builder = CellBuilder::new();
        let child = Arc::new(Cell::empty());
        for _ in 0..4 {
            builder.store_reference(child.clone()).unwrap();
        }
        assert!(builder.store_reference(child).is_err());
    }
}
