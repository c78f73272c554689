//! Error types for the ton-transfer library

use thiserror::Error;

/// Custom error type for ton-transfer operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Mnemonic error: {0}")]
    Mnemonic(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Cell error: {0}")]
    Cell(String),

    #[error("BoC error: {0}")]
    Boc(String),

    #[error("Address error: {0}")]
    Address(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Link opener unavailable: {0}")]
    LinkOpenerUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ton-transfer operations
pub type Result<T> = std::result::Result<T, Error>;
