//! Tests for key derivation

use ton_transfer::account::WalletV3R1;
use ton_transfer::crypto::mnemonic::*;
use ton_transfer::crypto::keys::*;

const MNEMONIC: &str = "air ahead abuse again album abuse adult aerobic accident airport abandon able \
                        abstract able acid agree adapt above actor act address action absurd agent";

#[test]
fn test_mnemonic_seed() {
    let seed = mnemonic_to_seed(MNEMONIC, None).unwrap();
    assert_eq!(seed.len(), 64);
    assert_eq!(
        hex::encode(&seed[..32]),
        "fd5971ef9dd6b67f3cd3457e233c4b2adff80c0b4c49ff691dc06b033363c23d"
    );
}

#[test]
fn test_mnemonic_key_pair() {
    let key_pair = mnemonic_to_key_pair(MNEMONIC, None).unwrap();
    assert_eq!(
        hex::encode(key_pair.public_key()),
        "26b46aa440bb3c52bf5cbea84f1315a09f8947daa7ff953bb0bbb918eba165ec"
    );
}

#[test]
fn test_wallet_address() {
    let key_pair = mnemonic_to_key_pair(MNEMONIC, None).unwrap();
    let wallet = WalletV3R1::new(0, key_pair.public_key());
    let address = wallet.address().unwrap();

    assert_eq!(
        hex::encode(address.hash_part()),
        "017208815e07e57f9c72a67c24b2c139ee4176074b6b8f647f92ad5eb26b9d32"
    );
    assert_eq!(address.to_string(), "EQABcgiBXgflf5xypnwkssE57kF2B0trj2R_kq1esmudMjA6");
}

#[test]
fn test_invalid_mnemonic_has_no_key() {
    // every word is listed but the checksum byte is wrong
    let mnemonic = format!("{} art", vec!["abandon"; 23].join(" "));
    assert!(mnemonic_to_key_pair(&mnemonic, None).is_err());
}

#[test]
fn test_generated_mnemonic_round_trip() {
    let mnemonic = generate_mnemonic(None).unwrap();
    assert_eq!(mnemonic.split_whitespace().count(), MNEMONIC_WORD_COUNT);

    let key_pair = mnemonic_to_key_pair(&mnemonic, None).unwrap();
    let signature = key_pair.sign(b"transfer");
    assert!(verify_signature(&key_pair.public_key(), b"transfer", &signature).is_ok());
}
