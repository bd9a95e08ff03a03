// src/hex_codec.rs
use crate::error::DecodeError;

/// Encodes bytes as lowercase hex, two digits per byte.
pub fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes hex text (either case) back into bytes.
///
/// Length is counted in characters, so a non-ASCII string with an even
/// character count reports `InvalidDigit` rather than `OddLength`.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    if text.chars().count() % 2 != 0 {
        return Err(DecodeError::OddLength);
    }
    // hex::decode counts bytes, so multi-byte characters surface there as
    // bad digits or an odd byte length. Both mean a non-hex character here.
    hex::decode(text).map_err(|_| DecodeError::InvalidDigit)
}
