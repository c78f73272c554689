//! TON mnemonic phrase generation and handling
//!
//! TON mnemonics reuse the BIP-39 English word list but not its seed
//! derivation: the phrase is hashed into an entropy value with HMAC-SHA512
//! and the signing seed is stretched from it with PBKDF2.

use bip39::Language;
use rand::{rngs::OsRng, Rng};

use crate::error::{Error, Result};
use super::keys::{hmac_sha512, pbkdf2_sha512, KeyPair};

/// Number of words in a TON mnemonic
pub const MNEMONIC_WORD_COUNT: usize = 24;

const PBKDF_ITERATIONS: u32 = 100_000;
const BASIC_SEED_SALT: &[u8] = b"TON seed version";
const PASSWORD_SEED_SALT: &[u8] = b"TON fast seed version";
const DEFAULT_SEED_SALT: &[u8] = b"TON default seed";

/// Split a phrase into lowercase words
pub fn normalize_mnemonic(phrase: &str) -> Vec<String> {
    phrase
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}

/// Hash the words (and optional password) into the mnemonic entropy
pub fn mnemonic_to_entropy(words: &[String], password: Option<&str>) -> Result<[u8; 64]> {
    hmac_sha512(words.join(" ").as_bytes(), password.unwrap_or("").as_bytes())
}

fn is_basic_seed(entropy: &[u8]) -> Result<bool> {
    let seed = pbkdf2_sha512(entropy, BASIC_SEED_SALT, (PBKDF_ITERATIONS / 256).max(1), 64)?;
    Ok(seed[0] == 0)
}

fn is_password_seed(entropy: &[u8]) -> Result<bool> {
    let seed = pbkdf2_sha512(entropy, PASSWORD_SEED_SALT, 1, 64)?;
    Ok(seed[0] == 1)
}

/// Whether a phrase can only be used together with a password
pub fn is_password_needed(words: &[String]) -> Result<bool> {
    let entropy = mnemonic_to_entropy(words, None)?;
    Ok(is_password_seed(&entropy)? && !is_basic_seed(&entropy)?)
}

/// Validate a mnemonic phrase
pub fn validate_mnemonic(phrase: &str, password: Option<&str>) -> Result<bool> {
    let words = normalize_mnemonic(phrase);
    validate_words(&words, password)?;
    Ok(true)
}

fn validate_words(words: &[String], password: Option<&str>) -> Result<()> {
    if words.len() != MNEMONIC_WORD_COUNT {
        return Err(Error::Mnemonic(format!(
            "Expected {} words, got {}",
            MNEMONIC_WORD_COUNT,
            words.len()
        )));
    }

    let word_list = Language::English.word_list();
    if let Some(unknown) = words
        .iter()
        .find(|word| word_list.binary_search(&word.as_str()).is_err())
    {
        return Err(Error::Mnemonic(format!("Unknown word: {}", unknown)));
    }

    let password = password.filter(|p| !p.is_empty());
    if password.is_some() && !is_password_needed(words)? {
        return Err(Error::Mnemonic("Mnemonic is not password protected".to_string()));
    }

    if !is_basic_seed(&mnemonic_to_entropy(words, password)?)? {
        return Err(Error::Mnemonic("Invalid mnemonic phrase".to_string()));
    }

    Ok(())
}

/// Generate a seed from a mnemonic phrase and optional password
pub fn mnemonic_to_seed(phrase: &str, password: Option<&str>) -> Result<Vec<u8>> {
    let words = normalize_mnemonic(phrase);
    let entropy = mnemonic_to_entropy(&words, password)?;
    pbkdf2_sha512(&entropy, DEFAULT_SEED_SALT, PBKDF_ITERATIONS, 64)
}

/// Validate a phrase and derive the wallet key pair from it
pub fn mnemonic_to_key_pair(phrase: &str, password: Option<&str>) -> Result<KeyPair> {
    validate_mnemonic(phrase, password)?;
    let seed = mnemonic_to_seed(phrase, password)?;
    KeyPair::from_seed(&seed[..32])
}

/// Generate a new random mnemonic phrase
pub fn generate_mnemonic(password: Option<&str>) -> Result<String> {
    let word_list = Language::English.word_list();
    let password = password.filter(|p| !p.is_empty());

    loop {
        let words: Vec<String> = (0..MNEMONIC_WORD_COUNT)
            .map(|_| word_list[OsRng.gen_range(0..word_list.len())].to_string())
            .collect();

        if password.is_some() && !is_password_needed(&words)? {
            continue;
        }
        if !is_basic_seed(&mnemonic_to_entropy(&words, password)?)? {
            continue;
        }

        return Ok(words.join(" "));
    }
}
