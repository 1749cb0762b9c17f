//! Path-segment percent-encoding.

use std::fmt::Write;

/// Percent-encode a string for use as a single path segment.
///
/// Bytes in the RFC 3986 unreserved set (`A-Z a-z 0-9 - _ . ~`) pass
/// through; every other byte of the UTF-8 encoding becomes `%XX` with
/// upper-case hex.
#[must_use]
pub fn encode_path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_pass_through() {
        assert_eq!(encode_path_segment("AZaz09-_.~"), "AZaz09-_.~");
    }

    #[test]
    fn reserved_are_escaped() {
        assert_eq!(encode_path_segment("51F 123/45"), "51F%20123%2F45");
        assert_eq!(encode_path_segment("a+b?c#d"), "a%2Bb%3Fc%23d");
        assert_eq!(encode_path_segment("%"), "%25");
    }

    #[test]
    fn multibyte_is_escaped_per_byte() {
        assert_eq!(encode_path_segment("đ"), "%C4%91");
    }

    #[test]
    fn empty() {
        assert_eq!(encode_path_segment(""), "");
    }
}
