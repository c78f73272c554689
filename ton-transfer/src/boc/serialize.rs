//! Bag-of-cells serialization

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{Error, Result};
use super::cell::{ArcCell, Cell};

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;

/// Serialization options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BocOptions {
    /// Emit the cell offset index
    pub index: bool,
    /// Append a CRC32C checksum
    pub crc32c: bool,
}

impl Default for BocOptions {
    fn default() -> Self {
        Self { index: true, crc32c: true }
    }
}

/// Serialize a single-root tree with default options
pub fn to_boc(root: &Cell) -> Result<Vec<u8>> {
    to_boc_with_options(root, BocOptions::default())
}

/// Serialize a single-root tree
pub fn to_boc_with_options(root: &Cell, options: BocOptions) -> Result<Vec<u8>> {
    let cells = topological_order(root);
    let positions: HashMap<[u8; 32], usize> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.hash(), i))
        .collect();

    let size_bytes = bytes_needed(cells.len() as u64);

    let mut body = Vec::new();
    let mut offsets = Vec::with_capacity(cells.len());
    for cell in &cells {
        body.push(cell.refs_descriptor());
        body.push(cell.bits_descriptor());
        body.extend_from_slice(&cell.augmented_data());
        for reference in cell.references() {
            let position = positions[&reference.hash()];
            write_uint(&mut body, position as u64, size_bytes);
        }
        offsets.push(body.len() as u64);
    }

    let offset_bytes = bytes_needed(body.len() as u64);

    let mut flags = size_bytes as u8;
    if options.index {
        flags |= FLAG_HAS_INDEX;
    }
    if options.crc32c {
        flags |= FLAG_HAS_CRC32C;
    }

    let mut out = Vec::with_capacity(body.len() + 32);
    out.extend_from_slice(&BOC_MAGIC);
    out.push(flags);
    out.push(offset_bytes as u8);
    write_uint(&mut out, cells.len() as u64, size_bytes);
    // one root, no absent cells
    write_uint(&mut out, 1, size_bytes);
    write_uint(&mut out, 0, size_bytes);
    write_uint(&mut out, body.len() as u64, offset_bytes);
    write_uint(&mut out, 0, size_bytes);
    if options.index {
        for offset in offsets {
            write_uint(&mut out, offset, offset_bytes);
        }
    }
    out.extend_from_slice(&body);

    if options.crc32c {
        let checksum = crc32c(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
    }

    Ok(out)
}

/// Parse a BoC and return its roots
pub fn from_boc(bytes: &[u8]) -> Result<Vec<ArcCell>> {
    let mut reader = Reader::new(bytes);

    if reader.take(4)? != BOC_MAGIC {
        return Err(Error::Boc("unknown BoC magic".to_string()));
    }

    let flags = reader.byte()?;
    let has_index = flags & FLAG_HAS_INDEX != 0;
    let has_crc = flags & FLAG_HAS_CRC32C != 0;
    if flags & FLAG_HAS_CACHE_BITS != 0 {
        return Err(Error::Boc("cache bits are not supported".to_string()));
    }
    let size_bytes = (flags & 0x07) as usize;
    if size_bytes == 0 || size_bytes > 4 {
        return Err(Error::Boc(format!("invalid reference size {}", size_bytes)));
    }

    if has_crc {
        if bytes.len() < 4 {
            return Err(Error::Boc("BoC too short for checksum".to_string()));
        }
        let (content, tail) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        if crc32c(content) != expected {
            return Err(Error::Boc("CRC32C mismatch".to_string()));
        }
        reader = Reader { bytes: content, pos: reader.pos };
    }

    let offset_bytes = reader.byte()? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        return Err(Error::Boc(format!("invalid offset size {}", offset_bytes)));
    }
    let cell_count = reader.uint(size_bytes)? as usize;
    let root_count = reader.uint(size_bytes)? as usize;
    let absent = reader.uint(size_bytes)?;
    if absent != 0 {
        return Err(Error::Boc("absent cells are not supported".to_string()));
    }
    let total_size = reader.uint(offset_bytes)? as usize;

    // every cell takes at least its two descriptor bytes
    if cell_count > reader.remaining() / 2 {
        return Err(Error::Boc(format!("{} cells cannot fit in {} bytes", cell_count, reader.remaining())));
    }
    if root_count > cell_count {
        return Err(Error::Boc(format!("{} roots for {} cells", root_count, cell_count)));
    }
    if total_size > reader.remaining() {
        return Err(Error::Boc(format!("cell data of {} bytes exceeds the input", total_size)));
    }

    let mut root_indices = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        let index = reader.uint(size_bytes)? as usize;
        if index >= cell_count {
            return Err(Error::Boc(format!("root index {} out of range", index)));
        }
        root_indices.push(index);
    }

    if has_index {
        reader.take(cell_count * offset_bytes)?;
    }

    let mut cells_reader = Reader::new(reader.take(total_size)?);
    let mut raw_cells = Vec::with_capacity(cell_count);
    for index in 0..cell_count {
        raw_cells.push(read_raw_cell(&mut cells_reader, index, cell_count, size_bytes)?);
    }

    // children always have larger indices, so build back to front
    let mut built: Vec<Option<ArcCell>> = vec![None; cell_count];
    for index in (0..cell_count).rev() {
        let raw = &raw_cells[index];
        let references = raw
            .references
            .iter()
            .map(|&r| {
                built[r]
                    .clone()
                    .ok_or_else(|| Error::Boc(format!("cell {} references unbuilt cell {}", index, r)))
            })
            .collect::<Result<Vec<_>>>()?;
        let cell = Cell::new(raw.data.clone(), raw.bit_len, references)?;
        built[index] = Some(Arc::new(cell));
    }

    root_indices
        .into_iter()
        .map(|i| {
            built[i]
                .clone()
                .ok_or_else(|| Error::Boc(format!("root {} missing", i)))
        })
        .collect()
}

/// Parse a BoC that must contain exactly one root
pub fn from_boc_single_root(bytes: &[u8]) -> Result<ArcCell> {
    let mut roots = from_boc(bytes)?;
    if roots.len() != 1 {
        return Err(Error::Boc(format!("expected one root, found {}", roots.len())));
    }
    Ok(roots.remove(0))
}

/// CRC-32C (Castagnoli), reflected
pub fn crc32c(bytes: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in bytes {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0x82f6_3b78 } else { crc >> 1 };
        }
    }
    !crc
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<usize>,
}

fn read_raw_cell(reader: &mut Reader<'_>, index: usize, cell_count: usize, size_bytes: usize) -> Result<RawCell> {
    let d1 = reader.byte()?;
    let d2 = reader.byte()?;

    if d1 & 0x08 != 0 {
        return Err(Error::Boc(format!("cell {} is exotic", index)));
    }
    if d1 & 0xf0 != 0 {
        return Err(Error::Boc(format!("cell {} stores hashes or has a non-zero level", index)));
    }
    let ref_count = (d1 & 0x07) as usize;
    if ref_count > 4 {
        return Err(Error::Boc(format!("cell {} has {} references", index, ref_count)));
    }

    let data_len = (d2 as usize + 1) / 2;
    let mut data = reader.take(data_len)?.to_vec();
    let bit_len = if d2 % 2 == 0 {
        data_len * 8
    } else {
        let last = data[data_len - 1];
        if last == 0 {
            return Err(Error::Boc(format!("cell {} is missing its completion tag", index)));
        }
        let padding = last.trailing_zeros() as usize + 1;
        data[data_len - 1] &= !(1u8 << (padding - 1));
        data_len * 8 - padding
    };

    let mut references = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let reference = reader.uint(size_bytes)? as usize;
        if reference <= index || reference >= cell_count {
            return Err(Error::Boc(format!("cell {} has invalid reference {}", index, reference)));
        }
        references.push(reference);
    }

    Ok(RawCell { data, bit_len, references })
}

/// Parents before children, each distinct cell once
fn topological_order(root: &Cell) -> Vec<&Cell> {
    fn visit<'a>(cell: &'a Cell, seen: &mut HashSet<[u8; 32]>, post_order: &mut Vec<&'a Cell>) {
        if !seen.insert(cell.hash()) {
            return;
        }
        for reference in cell.references() {
            visit(reference, seen, post_order);
        }
        post_order.push(cell);
    }

    let mut seen = HashSet::new();
    let mut post_order = Vec::new();
    visit(root, &mut seen, &mut post_order);
    post_order.reverse();
    post_order
}

fn bytes_needed(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    ((bits + 7) / 8).max(1)
}

fn write_uint(out: &mut Vec<u8>, value: u64, bytes: usize) {
    for i in (0..bytes).rev() {
        out.push((value >> (i * 8)) as u8);
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| Error::Boc("unexpected end of BoC".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn uint(&mut self, len: usize) -> Result<u64> {
        Ok(self
            .take(len)?
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }
}
