//! Cell reader

use num_bigint::BigUint;

use crate::account::Address;
use crate::error::{Error, Result};
use super::cell::{ArcCell, Cell};

/// Sequential reader over the bits and references of a cell
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub(crate) fn new(cell: &'a Cell) -> Self {
        Self { cell, bit_pos: 0, ref_pos: 0 }
    }

    /// Unread data bits
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    /// Unread references
    pub fn remaining_refs(&self) -> usize {
        self.cell.references().len() - self.ref_pos
    }

    fn ensure_bits(&self, bits: usize) -> Result<()> {
        if bits > self.remaining_bits() {
            return Err(Error::Cell(format!(
                "cell underflow: need {} bits, {} left",
                bits,
                self.remaining_bits()
            )));
        }
        Ok(())
    }

    fn next_bit(&mut self) -> bool {
        let byte = self.cell.data()[self.bit_pos / 8];
        let bit = byte & (0x80 >> (self.bit_pos % 8)) != 0;
        self.bit_pos += 1;
        bit
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        self.ensure_bits(1)?;
        Ok(self.next_bit())
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u64> {
        if bits > 64 {
            return Err(Error::Cell(format!("load_uint supports at most 64 bits, got {}", bits)));
        }
        self.ensure_bits(bits)?;
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | self.next_bit() as u64;
        }
        Ok(value)
    }

    pub fn load_int(&mut self, bits: usize) -> Result<i64> {
        if bits == 0 || bits > 64 {
            return Err(Error::Cell(format!("load_int supports 1 to 64 bits, got {}", bits)));
        }
        let raw = self.load_uint(bits)?;
        if bits == 64 {
            return Ok(raw as i64);
        }
        let shift = 64 - bits;
        Ok(((raw << shift) as i64) >> shift)
    }

    pub fn load_biguint(&mut self, bits: usize) -> Result<BigUint> {
        self.ensure_bits(bits)?;
        let mut value = BigUint::from(0u8);
        for _ in 0..bits {
            value <<= 1;
            if self.next_bit() {
                value |= BigUint::from(1u8);
            }
        }
        Ok(value)
    }

    pub fn load_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_bits(len * 8)?;
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            let mut byte = 0u8;
            for _ in 0..8 {
                byte = (byte << 1) | self.next_bit() as u8;
            }
            bytes.push(byte);
        }
        Ok(bytes)
    }

    /// Read a `Coins` amount
    pub fn load_coins(&mut self) -> Result<BigUint> {
        let len = self.load_uint(4)? as usize;
        self.load_biguint(len * 8)
    }

    /// Read a `MsgAddress`; `addr_none` yields `None`
    pub fn load_address(&mut self) -> Result<Option<Address>> {
        match self.load_uint(2)? {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(Error::Cell("anycast addresses are not supported".to_string()));
                }
                let workchain = self.load_int(8)? as i32;
                let hash = self.load_bytes(32)?;
                let mut hash_part = [0u8; 32];
                hash_part.copy_from_slice(&hash);
                Ok(Some(Address::new(workchain, hash_part)))
            }
            tag => Err(Error::Cell(format!("unsupported address tag {:#04b}", tag))),
        }
    }

    /// Take the next reference
    pub fn load_reference(&mut self) -> Result<&'a ArcCell> {
        let reference = self
            .cell
            .references()
            .get(self.ref_pos)
            .ok_or_else(|| Error::Cell("cell underflow: no references left".to_string()))?;
        self.ref_pos += 1;
        Ok(reference)
    }
}
