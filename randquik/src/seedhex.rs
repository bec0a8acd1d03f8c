//! Hex encoding/decoding for the 32-byte seed, with right-zero-padding of
//! short `-s` arguments per the CLI's documented behavior.

use randquik_core::KEY_BYTES;

/// Decodes a hex string into a 32-byte seed. Strings shorter than 64 hex
/// digits are zero-padded on the right; strings with non-hex characters or
/// more than 64 digits are rejected.
pub fn decode(hex: &str) -> Result<[u8; KEY_BYTES], SeedFormatError> {
    if hex.len() > KEY_BYTES * 2 {
        return Err(SeedFormatError::TooLong);
    }
    let mut padded = hex.to_string();
    padded.push_str(&"0".repeat(KEY_BYTES * 2 - hex.len()));

    let mut out = [0u8; KEY_BYTES];
    for (byte, chunk) in out.iter_mut().zip(padded.as_bytes().chunks_exact(2)) {
        let hi = hex_digit(chunk[0]).ok_or(SeedFormatError::NonHex)?;
        let lo = hex_digit(chunk[1]).ok_or(SeedFormatError::NonHex)?;
        *byte = (hi << 4) | lo;
    }
    Ok(out)
}

/// Hex-encodes a seed for echoing back to the user (e.g. on auto-seed).
pub fn encode(seed: &[u8; KEY_BYTES]) -> String {
    let mut s = String::with_capacity(KEY_BYTES * 2);
    for byte in seed {
        s.push_str(&format!("{byte:02x}"));
    }
    s
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Reasons a `-s` argument could not be parsed as a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SeedFormatError {
    #[error("seed must be at most {} hex digits", KEY_BYTES * 2)]
    TooLong,
    #[error("seed must be a hex string")]
    NonHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_length_seed_round_trips() {
        let seed = [0xabu8; KEY_BYTES];
        let hex = encode(&seed);
        assert_eq!(decode(&hex).unwrap(), seed);
    }

    #[test]
    fn short_seed_is_zero_padded_on_the_right() {
        let decoded = decode("ff").unwrap();
        assert_eq!(decoded[0], 0xff);
        assert_eq!(&decoded[1..], &[0u8; KEY_BYTES - 1]);
    }

    #[test]
    fn odd_length_short_hex_pads_to_even_before_decoding() {
        // "f" alone pads to "f0000...0" (64 digits), i.e. decoded[0] = 0xf0.
        let decoded = decode("f").unwrap();
        assert_eq!(decoded[0], 0xf0);
    }

    #[test]
    fn rejects_non_hex_characters() {
        assert_eq!(decode("zz"), Err(SeedFormatError::NonHex));
    }

    #[test]
    fn rejects_overlong_seed() {
        let too_long = "a".repeat(KEY_BYTES * 2 + 1);
        assert_eq!(decode(&too_long), Err(SeedFormatError::TooLong));
    }

    #[test]
    fn empty_seed_decodes_to_all_zero() {
        assert_eq!(decode("").unwrap(), [0u8; KEY_BYTES]);
    }
}
