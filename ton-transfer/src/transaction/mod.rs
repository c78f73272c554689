//! Transaction functionality
//!
//! Transfer details, the messages a wallet signs, the network provider and
//! the three ways of dispatching a transfer.

pub mod types;
mod message;
pub mod provider;
mod sender;
mod extension;
mod mnemonic;
mod deep_link;

pub use types::*;
pub use message::*;
pub use provider::*;
pub use sender::*;
pub use extension::*;
pub use mnemonic::*;
pub use deep_link::*;
