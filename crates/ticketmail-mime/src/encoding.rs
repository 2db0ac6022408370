//! MIME transfer-encoding and header-word decoding.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded words. Every
//! decoder here is lenient: mail in the wild is frequently slightly broken
//! and a best-effort result beats rejecting the message.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::charset::decode_charset;

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the remaining input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(cleaned)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks (`=` at the end of a line) are removed along with the
/// line break, trailing whitespace on each line is dropped, and `=XX`
/// escapes are decoded. Malformed escapes are kept literally.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());

    for line in data.split_inclusive(|&b| b == b'\n') {
        let (content, eol): (&[u8], &[u8]) = if let Some(rest) = line.strip_suffix(b"\r\n") {
            (rest, b"\r\n")
        } else if let Some(rest) = line.strip_suffix(b"\n") {
            (rest, b"\n")
        } else {
            (line, b"")
        };

        let content = content.trim_ascii_end();
        let (content, soft_break) = match content.strip_suffix(b"=") {
            Some(rest) => (rest, true),
            None => (content, false),
        };

        decode_qp_escapes(content, &mut out);
        if !soft_break {
            out.extend_from_slice(eol);
        }
    }

    out
}

fn decode_qp_escapes(content: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < content.len() {
        let byte = content[i];
        if byte == b'='
            && let (Some(hi), Some(lo)) = (
                content.get(i + 1).copied().and_then(hex_value),
                content.get(i + 2).copied().and_then(hex_value),
            )
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(byte);
        i += 1;
    }
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Decodes RFC 2047 encoded words anywhere in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`
///
/// Whitespace between two adjacent encoded words is dropped, as the RFC
/// requires. Words that fail to decode are left untouched.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = String::new();
    let mut last_was_word = false;

    while !rest.is_empty() {
        if let Some((decoded, consumed)) = rest.strip_prefix("=?").and_then(decode_word) {
            if !last_was_word {
                out.push_str(&pending_space);
            }
            pending_space.clear();
            out.push_str(&decoded);
            rest = &rest[2 + consumed..];
            last_was_word = true;
            continue;
        }

        let ch = rest.chars().next().unwrap_or_default();
        if ch.is_whitespace() {
            pending_space.push(ch);
        } else {
            out.push_str(&pending_space);
            pending_space.clear();
            out.push(ch);
            last_was_word = false;
        }
        rest = &rest[ch.len_utf8()..];
    }

    out.push_str(&pending_space);
    out
}

/// Decodes one encoded word body (after `=?`). Returns the text and the
/// number of bytes consumed, including the closing `?=`.
fn decode_word(word: &str) -> Option<(String, usize)> {
    let (charset, rest) = word.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let payload = &rest[..end];
    if charset.is_empty() || payload.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(payload.as_bytes()).ok()?,
        "Q" | "q" => {
            let underscored = payload.replace('_', " ");
            let mut out = Vec::with_capacity(underscored.len());
            decode_qp_escapes(underscored.as_bytes(), &mut out);
            out
        }
        _ => return None,
    };

    // RFC 2231 language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);
    let decoded = decode_charset(&bytes, Some(charset));
    let consumed = charset_len(word) + encoding.len() + end + 4;
    Some((String::from_utf8_lossy(&decoded).into_owned(), consumed))
}

/// Length of the charset field including any language suffix.
fn charset_len(word: &str) -> usize {
    word.find('?').unwrap_or(word.len())
}
