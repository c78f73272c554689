//! TON address handling

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TEST_ONLY: u8 = 0x80;

/// Length of a user-friendly address in characters
const FRIENDLY_LEN: usize = 48;

/// Flags for the user-friendly representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyFormat {
    pub bounceable: bool,
    pub test_only: bool,
    pub url_safe: bool,
}

impl Default for FriendlyFormat {
    fn default() -> Self {
        Self {
            bounceable: true,
            test_only: false,
            url_safe: true,
        }
    }
}

/// A standard internal address: workchain plus 256-bit account id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    workchain: i32,
    hash_part: [u8; 32],
}

/// An address parsed from its user-friendly form, with the flags it carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyAddress {
    pub address: Address,
    pub bounceable: bool,
    pub test_only: bool,
}

impl Address {
    /// Create a new address
    pub fn new(workchain: i32, hash_part: [u8; 32]) -> Self {
        Self { workchain, hash_part }
    }

    /// Get the workchain id
    pub fn workchain(&self) -> i32 {
        self.workchain
    }

    /// Get the account id
    pub fn hash_part(&self) -> &[u8; 32] {
        &self.hash_part
    }

    /// Parse either the raw `wc:hex` form or the user-friendly form
    pub fn parse(s: &str) -> Result<Self> {
        if s.contains(':') {
            Self::parse_raw(s)
        } else {
            Self::parse_friendly(s).map(|f| f.address)
        }
    }

    /// Parse the raw `workchain:hex` form
    pub fn parse_raw(s: &str) -> Result<Self> {
        let (workchain, hash) = s
            .split_once(':')
            .ok_or_else(|| Error::Address(format!("Invalid raw address: {}", s)))?;

        let workchain = workchain
            .parse::<i32>()
            .map_err(|e| Error::Address(format!("Invalid workchain in {}: {}", s, e)))?;
        check_workchain(workchain)?;

        let bytes = hex::decode(hash)
            .map_err(|e| Error::Address(format!("Invalid account id in {}: {}", s, e)))?;
        let hash_part: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Address(format!("Account id must be 32 bytes: {}", s)))?;

        Ok(Self::new(workchain, hash_part))
    }

    /// Parse the 48-character user-friendly form (either base64 alphabet)
    pub fn parse_friendly(s: &str) -> Result<FriendlyAddress> {
        if s.len() != FRIENDLY_LEN {
            return Err(Error::Address(format!("Friendly address must be {} characters: {}", FRIENDLY_LEN, s)));
        }

        let bytes = if s.contains('-') || s.contains('_') {
            URL_SAFE.decode(s)
        } else {
            STANDARD.decode(s)
        }
        .map_err(|e| Error::Address(format!("Invalid base64 in {}: {}", s, e)))?;

        if bytes.len() != 36 {
            return Err(Error::Address(format!("Friendly address must decode to 36 bytes: {}", s)));
        }

        let checksum = crc16(&bytes[..34]);
        if checksum.to_be_bytes() != bytes[34..36] {
            return Err(Error::Address(format!("Checksum mismatch in {}", s)));
        }

        let mut tag = bytes[0];
        let test_only = tag & FLAG_TEST_ONLY != 0;
        tag &= !FLAG_TEST_ONLY;
        let bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            _ => return Err(Error::Address(format!("Unknown address tag {:#04x} in {}", tag, s))),
        };

        let workchain = bytes[1] as i8 as i32;
        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&bytes[2..34]);

        Ok(FriendlyAddress {
            address: Self::new(workchain, hash_part),
            bounceable,
            test_only,
        })
    }

    /// Format as `workchain:hex`
    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Format in the user-friendly form
    pub fn to_friendly(&self, format: FriendlyFormat) -> String {
        let mut tag = if format.bounceable { TAG_BOUNCEABLE } else { TAG_NON_BOUNCEABLE };
        if format.test_only {
            tag |= FLAG_TEST_ONLY;
        }

        let mut bytes = Vec::with_capacity(36);
        bytes.push(tag);
        bytes.push(self.workchain as i8 as u8);
        bytes.extend_from_slice(&self.hash_part);
        let checksum = crc16(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());

        if format.url_safe {
            URL_SAFE.encode(bytes)
        } else {
            STANDARD.encode(bytes)
        }
    }
}

fn check_workchain(workchain: i32) -> Result<()> {
    if workchain < i8::MIN as i32 || workchain > i8::MAX as i32 {
        return Err(Error::Address(format!("Workchain {} does not fit in 8 bits", workchain)));
    }
    Ok(())
}

/// CRC-16/XMODEM
fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in bytes {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
        }
    }
    crc
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_friendly(FriendlyFormat::default()))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRIENDLY: &str = "EQABcgiBXgflf5xypnwkssE57kF2B0trj2R_kq1esmudMjA6";
    const RAW: &str = "0:017208815e07e57f9c72a67c24b2c139ee4176074b6b8f647f92ad5eb26b9d32";

    #[test]
    fn test_parse_friendly() {
        let parsed = Address::parse_friendly(FRIENDLY).unwrap();
        assert!(parsed.bounceable);
        assert!(!parsed.test_only);
        assert_eq!(parsed.address.workchain(), 0);
        assert_eq!(parsed.address.to_raw_string(), RAW);
    }

    #[test]
    fn test_raw_and_friendly_agree() {
        let from_raw = Address::parse(RAW).unwrap();
        let from_friendly = Address::parse(FRIENDLY).unwrap();
        assert_eq!(from_raw, from_friendly);
        assert_eq!(from_raw.to_string(), FRIENDLY);
    }

    #[test]
    fn test_standard_alphabet() {
        let address = Address::parse(RAW).unwrap();
        let standard = address.to_friendly(FriendlyFormat { url_safe: false, ..Default::default() });
        assert_eq!(standard, "EQABcgiBXgflf5xypnwkssE57kF2B0trj2R/kq1esmudMjA6");
        assert_eq!(Address::parse(&standard).unwrap(), address);
    }

    #[test]
    fn test_non_bounceable_and_test_only_flags() {
        let address = Address::parse(RAW).unwrap();
        let formatted = address.to_friendly(FriendlyFormat {
            bounceable: false,
            test_only: true,
            url_safe: true,
        });
        let parsed = Address::parse_friendly(&formatted).unwrap();
        assert!(!parsed.bounceable);
        assert!(parsed.test_only);
        assert_eq!(parsed.address, address);
    }

    #[test]
    fn test_masterchain_round_trip() {
        let address = Address::new(-1, [0x33; 32]);
        assert!(address.to_raw_string().starts_with("-1:"));
        assert_eq!(Address::parse(&address.to_string()).unwrap(), address);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut corrupted = FRIENDLY.to_string();
        corrupted.replace_range(10..11, "A");
        assert!(Address::parse(&corrupted).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(Address::parse("0:abcd").is_err());
        assert!(Address::parse("1000:017208815e07e57f9c72a67c24b2c139ee4176074b6b8f647f92ad5eb26b9d32").is_err());
        assert!(Address::parse("not an address").is_err());
    }

    #[test]
    fn test_serde_uses_friendly_form() {
        let address = Address::parse(RAW).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", FRIENDLY));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
