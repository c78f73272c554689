//! Ed25519 key pairs and the HMAC / PBKDF2 used to derive them

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::{Error, Result};

type HmacSha512 = Hmac<Sha512>;

/// An ed25519 key pair controlling a wallet
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Create a key pair from the first 32 bytes of a seed
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let secret: [u8; 32] = seed
            .get(..32)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::KeyDerivation(format!("Seed must be at least 32 bytes, got {}", seed.len())))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    /// Get the public key bytes
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

/// Check an ed25519 signature
pub fn verify_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> Result<()> {
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| Error::Signing(format!("Invalid public key: {}", e)))?;
    verifying_key
        .verify(message, &Signature::from_bytes(signature))
        .map_err(|e| Error::Signing(format!("Signature verification failed: {}", e)))
}

/// HMAC-SHA512
pub fn hmac_sha512(key: &[u8], message: &[u8]) -> Result<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;
    mac.update(message);
    Ok(finish(mac))
}

fn finish(mac: HmacSha512) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// PBKDF2 with HMAC-SHA512 as the pseudo-random function
pub fn pbkdf2_sha512(password: &[u8], salt: &[u8], rounds: u32, output_len: usize) -> Result<Vec<u8>> {
    if rounds == 0 {
        return Err(Error::KeyDerivation("PBKDF2 needs at least one round".to_string()));
    }

    let mut output = vec![0u8; output_len];
    pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, &mut output);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_sha512_vector() {
        // PBKDF2-HMAC-SHA512("password", "salt", 1)
        let output = pbkdf2_sha512(b"password", b"salt", 1, 64).unwrap();
        assert_eq!(
            hex::encode(output),
            "867f70cf1ade02cff3752599a3a53dc4af34c7a669815ae5d513554e1c8cf252\
             c02d470a285a0501bad999bfe943c08f050235d7d68b1da55e63f73b60a57fce"
        );
    }

    #[test]
    fn test_pbkdf2_sha512_iterated() {
        let output = pbkdf2_sha512(b"password", b"salt", 2, 64).unwrap();
        assert_eq!(
            hex::encode(output),
            "e1d9c16aa681708a45f5c7c4e215ceb66e011a2e9f0040713f18aefdb866d53c\
             f76cab2868a39b9f7840edce4fef5a82be67335c77a6068e04112754f27ccf4e"
        );
        assert!(pbkdf2_sha512(b"password", b"salt", 0, 64).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let key_pair = KeyPair::from_seed(&[7u8; 32]).unwrap();
        let signature = key_pair.sign(b"transfer");

        assert!(verify_signature(&key_pair.public_key(), b"transfer", &signature).is_ok());
        assert!(verify_signature(&key_pair.public_key(), b"tampered", &signature).is_err());
    }

    #[test]
    fn test_short_seed() {
        assert!(KeyPair::from_seed(&[0u8; 16]).is_err());
    }
}
