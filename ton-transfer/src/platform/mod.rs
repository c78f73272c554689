//! Host capabilities the senders hand transactions to
//!
//! An injected wallet provider (the browser extension side) and the
//! operating system's URL opener.

mod provider;
mod opener;

pub use provider::*;
pub use opener::*;
