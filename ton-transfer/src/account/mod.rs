//! Account functionality
//!
//! Addresses and the wallet contract that owns them.

mod address;
mod wallet;

pub use address::*;
pub use wallet::*;
