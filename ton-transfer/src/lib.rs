//! TON Transfer - dispatch TON transfers from a client application
//!
//! This library packages a destination, an amount and a contract state init
//! into a transfer and hands it to one of three transports: a browser
//! extension's injected provider, a locally held mnemonic that signs and
//! submits over RPC, or a deep link opened by the platform.

pub mod error;
pub mod boc;
pub mod crypto;
pub mod account;
pub mod transaction;
pub mod platform;
pub mod encoding;
pub mod config;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use account::Address;
pub use transaction::{TransactionDetails, TransactionSender};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
