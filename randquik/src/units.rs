//! Byte-count argument parsing: a decimal number followed by an optional
//! case-insensitive SI (1000-based) or IEC (1024-based) unit suffix.

/// Parses a byte count string such as `"4g"`, `"256MiB"`, or a bare number.
/// Returns `None` if the string isn't a valid count (non-numeric prefix,
/// unrecognized suffix, or a count that doesn't fit in a `u64`).
pub fn parse_byte_count(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    let split_at = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split_at);
    if digits.is_empty() {
        return None;
    }
    let count: u64 = digits.parse().ok()?;
    let multiplier = unit_multiplier(suffix)?;
    count.checked_mul(multiplier)
}

fn unit_multiplier(suffix: &str) -> Option<u64> {
    const KI: u64 = 1024;
    const MI: u64 = KI * 1024;
    const GI: u64 = MI * 1024;
    const TI: u64 = GI * 1024;
    const K: u64 = 1000;
    const M: u64 = K * 1000;
    const G: u64 = M * 1000;
    const T: u64 = G * 1000;

    match suffix.to_ascii_lowercase().as_str() {
        "" => Some(1),
        "k" | "kb" => Some(K),
        "ki" | "kib" => Some(KI),
        "m" | "mb" => Some(M),
        "mi" | "mib" => Some(MI),
        "g" | "gb" => Some(G),
        "gi" | "gib" => Some(GI),
        "t" | "tb" => Some(T),
        "ti" | "tib" => Some(TI),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_bytes() {
        assert_eq!(parse_byte_count("1024"), Some(1024));
    }

    #[test]
    fn si_suffixes_are_decimal() {
        assert_eq!(parse_byte_count("1k"), Some(1_000));
        assert_eq!(parse_byte_count("1KB"), Some(1_000));
        assert_eq!(parse_byte_count("2m"), Some(2_000_000));
        assert_eq!(parse_byte_count("3g"), Some(3_000_000_000));
        assert_eq!(parse_byte_count("1t"), Some(1_000_000_000_000));
    }

    #[test]
    fn iec_suffixes_are_binary() {
        assert_eq!(parse_byte_count("1ki"), Some(1024));
        assert_eq!(parse_byte_count("1KiB"), Some(1024));
        assert_eq!(parse_byte_count("4mib"), Some(4 * 1024 * 1024));
        assert_eq!(parse_byte_count("1gib"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_byte_count("1TiB"), Some(1024u64.pow(4)));
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(parse_byte_count("4MiB"), parse_byte_count("4mib"));
        assert_eq!(parse_byte_count("4Gb"), parse_byte_count("4gb"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_byte_count(""), None);
        assert_eq!(parse_byte_count("abc"), None);
        assert_eq!(parse_byte_count("4xb"), None);
        assert_eq!(parse_byte_count("4 mb extra"), None);
    }

    #[test]
    fn rejects_overflow() {
        assert_eq!(parse_byte_count("99999999999999999999t"), None);
    }
}
