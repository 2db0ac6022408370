//! Character set conversion to UTF-8.

use charset::Charset;
use tracing::{debug, warn};

/// Converts `bytes` from the declared `label` to UTF-8.
///
/// Bytes are returned unchanged when no label is given, when the label is
/// empty, `utf-8` or `us-ascii` (any case), or when the label names no known
/// encoding. Unmappable sequences in a known encoding become U+FFFD.
#[must_use]
pub fn decode_charset(bytes: &[u8], label: Option<&str>) -> Vec<u8> {
    let label = label.map(str::trim).unwrap_or_default();
    if is_passthrough(label) {
        return bytes.to_vec();
    }

    let Some(charset) = Charset::for_label_no_replacement(label.as_bytes()) else {
        warn!(charset = label, "unknown charset, keeping raw bytes");
        return bytes.to_vec();
    };

    let (decoded, malformed) = charset.decode_without_bom_handling(bytes);
    if malformed {
        debug!(charset = label, "malformed input replaced during conversion");
    }
    decoded.into_owned().into_bytes()
}

fn is_passthrough(label: &str) -> bool {
    label.is_empty() || label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("us-ascii")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_labels() {
        let raw = b"caf\xe9";
        assert_eq!(decode_charset(raw, None), raw);
        assert_eq!(decode_charset(raw, Some("")), raw);
        assert_eq!(decode_charset(raw, Some("UTF-8")), raw);
        assert_eq!(decode_charset(raw, Some(" us-ascii ")), raw);
    }

    #[test]
    fn test_latin1_conversion() {
        assert_eq!(decode_charset(b"caf\xe9", Some("iso-8859-1")), "café".as_bytes());
    }

    #[test]
    fn test_windows_1252_conversion() {
        assert_eq!(
            decode_charset(b"\x93quoted\x94", Some("windows-1252")),
            "\u{201c}quoted\u{201d}".as_bytes()
        );
    }

    #[test]
    fn test_shift_jis_conversion() {
        assert_eq!(decode_charset(b"\x82\xa0", Some("Shift_JIS")), "あ".as_bytes());
    }

    #[test]
    fn test_unknown_label_keeps_raw_bytes() {
        let raw = b"caf\xe9";
        assert_eq!(decode_charset(raw, Some("x-no-such-charset")), raw);
    }
}
