//! Ordinary TON cells

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use super::slice::CellSlice;

/// Maximum number of data bits in a cell
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references in a cell
pub const MAX_CELL_REFS: usize = 4;

/// Shared cell handle
pub type ArcCell = Arc<Cell>;

/// An ordinary (non-exotic, level 0) cell
#[derive(Clone)]
pub struct Cell {
    /// Data bytes, bits past `bit_len` are zero
    data: Vec<u8>,
    /// Number of meaningful bits in `data`
    bit_len: usize,
    /// Child cells
    references: Vec<ArcCell>,
    /// Representation hash
    hash: [u8; 32],
    /// Depth of the tree below this cell
    depth: u16,
}

impl Cell {
    /// Create a cell from raw data, checking the size limits
    pub fn new(mut data: Vec<u8>, bit_len: usize, references: Vec<ArcCell>) -> Result<Self> {
        if bit_len > MAX_CELL_BITS {
            return Err(Error::Cell(format!("{} bits exceed the cell limit of {}", bit_len, MAX_CELL_BITS)));
        }
        if references.len() > MAX_CELL_REFS {
            return Err(Error::Cell(format!("{} references exceed the cell limit of {}", references.len(), MAX_CELL_REFS)));
        }

        let byte_len = (bit_len + 7) / 8;
        if data.len() < byte_len {
            return Err(Error::Cell(format!("{} data bytes cannot hold {} bits", data.len(), bit_len)));
        }
        data.truncate(byte_len);
        if bit_len % 8 != 0 {
            let mask = 0xffu8 << (8 - bit_len % 8);
            data[byte_len - 1] &= mask;
        }

        let depth = references
            .iter()
            .map(|r| r.depth + 1)
            .max()
            .unwrap_or(0);

        let mut cell = Self {
            data,
            bit_len,
            references,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        Ok(cell)
    }

    /// An empty cell with no data and no references
    pub fn empty() -> Self {
        let mut cell = Self {
            data: Vec::new(),
            bit_len: 0,
            references: Vec::new(),
            hash: [0u8; 32],
            depth: 0,
        };
        cell.hash = cell.compute_hash();
        cell
    }

    /// Raw data bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of data bits
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Child cells
    pub fn references(&self) -> &[ArcCell] {
        &self.references
    }

    /// Representation hash
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Tree depth
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Start reading the cell
    pub fn begin_parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }

    /// First descriptor byte: reference count (ordinary cell, level 0)
    pub(crate) fn refs_descriptor(&self) -> u8 {
        self.references.len() as u8
    }

    /// Second descriptor byte: floor(bits / 8) + ceil(bits / 8)
    pub(crate) fn bits_descriptor(&self) -> u8 {
        (self.bit_len / 8 + (self.bit_len + 7) / 8) as u8
    }

    /// Data with the completion tag appended when the last byte is partial
    pub(crate) fn augmented_data(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        if self.bit_len % 8 != 0 {
            let last = data.len() - 1;
            data[last] |= 0x80 >> (self.bit_len % 8);
        }
        data
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([self.refs_descriptor(), self.bits_descriptor()]);
        hasher.update(self.augmented_data());
        for reference in &self.references {
            hasher.update(reference.depth.to_be_bytes());
        }
        for reference in &self.references {
            hasher.update(reference.hash);
        }
        hasher.finalize().into()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.references.len())
            .field("hash", &hex::encode(self.hash))
            .finish()
    }
}
