//! Cells and bag-of-cells encoding
//!
//! Ordinary cells with their representation hashes, a builder and a reader
//! for the TL-B primitives a transfer needs, and the BoC wire format.

mod cell;
mod builder;
mod slice;
mod serialize;

pub use cell::*;
pub use builder::*;
pub use slice::*;
pub use serialize::*;
