//! Key derivation and management
//!
//! Ed25519 key pairs for TON wallets and the key-derivation primitives the
//! mnemonic scheme is built on.

mod derivation;

pub use derivation::*;
