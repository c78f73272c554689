//! Base64 encodings of serialized cells

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::boc::{from_boc_single_root, to_boc, ArcCell, Cell};
use crate::error::{Error, Result};

/// Standard alphabet accepting padded and unpadded input
const STANDARD_ANY_PADDING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Standard base64
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// URL-safe variant used in deep links: standard base64 with
/// `+` -> `-`, `/` -> `_` and `=` -> `.`
pub fn encode_base64_url(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            '=' => '.',
            c => c,
        })
        .collect()
}

/// Decode standard base64 or either URL-safe variant, padded with `=`,
/// padded with `.` or unpadded
pub fn decode_base64(s: &str) -> Result<Vec<u8>> {
    let normalized: String = s
        .trim()
        .trim_end_matches(|c: char| c == '=' || c == '.')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            '.' => '=',
            c => c,
        })
        .collect();
    STANDARD_ANY_PADDING
        .decode(normalized)
        .map_err(|e| Error::Serialization(format!("Invalid base64: {}", e)))
}

/// Serialize a cell as a BoC in standard base64
pub fn cell_to_base64(cell: &Cell) -> Result<String> {
    Ok(encode_base64(&to_boc(cell)?))
}

/// Serialize a cell as a BoC in the deep link base64 variant
pub fn cell_to_base64_url(cell: &Cell) -> Result<String> {
    Ok(encode_base64_url(&to_boc(cell)?))
}

/// Parse a single-root BoC given in any supported base64 form
pub fn cell_from_base64(s: &str) -> Result<ArcCell> {
    from_boc_single_root(&decode_base64(s)?)
}
