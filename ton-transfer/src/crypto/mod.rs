//! Cryptographic primitives and operations
//!
//! This module provides TON mnemonic handling, key derivation and signing.

pub mod mnemonic;
pub mod keys;

pub use mnemonic::*;
pub use keys::*;
