//! Multipart body splitting (RFC 2046 §5.1).

use tracing::warn;

use crate::error::{Error, Result};
use crate::message::Part;

/// Splits a multipart body into its parts, in order.
///
/// A delimiter line is `--boundary`, optionally followed by whitespace; the
/// close delimiter adds a trailing `--`. The preamble before the first
/// delimiter and the epilogue after the close delimiter are ignored. The
/// line break preceding a delimiter belongs to the delimiter, not the part.
///
/// A body that ends without a close delimiter keeps its last part; a body
/// with no delimiter at all has no parts.
///
/// # Errors
///
/// Returns [`Error::InvalidMultipart`] if a part's header block contains a
/// line that is neither a header field nor a continuation.
pub fn split_multipart(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut offset = 0;
    let mut closed = false;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let line_start = offset;
        offset += line.len();

        let Some(rest) = line.strip_prefix(delimiter) else {
            continue;
        };
        let rest = rest.trim_ascii_end();
        let is_close = rest == b"--";
        if !rest.is_empty() && !is_close {
            // Longer boundary that merely shares our prefix.
            continue;
        }

        if let Some(start) = current.take() {
            let end = strip_line_break(body, start, line_start);
            parts.push(parse_part(&body[start..end])?);
        }

        if is_close {
            closed = true;
            break;
        }
        current = Some(offset);
    }

    if let Some(start) = current {
        warn!(boundary, "multipart body has no close delimiter");
        parts.push(parse_part(&body[start..])?);
    } else if !closed && parts.is_empty() {
        warn!(boundary, "multipart body contains no delimiter");
    }

    Ok(parts)
}

/// Returns `end` moved back over one trailing CRLF or LF, never before `start`.
fn strip_line_break(body: &[u8], start: usize, end: usize) -> usize {
    let slice = &body[start..end];
    if slice.ends_with(b"\r\n") {
        end - 2
    } else if slice.ends_with(b"\n") {
        end - 1
    } else {
        end
    }
}

fn parse_part(raw: &[u8]) -> Result<Part> {
    for line in raw.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            break;
        }
        let continuation = line.first().is_some_and(|&b| b == b' ' || b == b'\t');
        if !continuation && !line.contains(&b':') {
            return Err(Error::InvalidMultipart(format!(
                "malformed part header line: {:?}",
                String::from_utf8_lossy(line)
            )));
        }
    }
    Ok(Part::parse(raw))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_parts() {
        let body = concat!(
            "preamble\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "first\r\n",
            "--XYZ\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>second</p>\r\n",
            "--XYZ--\r\n",
            "epilogue\r\n",
        );
        let parts = split_multipart(body.as_bytes(), "XYZ").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].body, b"first");
        assert_eq!(parts[1].body, b"<p>second</p>");
        assert!(parts[1].content_type().unwrap().is_html());
    }

    #[test]
    fn test_split_lf_only_and_trailing_whitespace() {
        let body = "--b  \nContent-Type: text/plain\n\nline one\nline two\n--b-- \n";
        let parts = split_multipart(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"line one\nline two");
    }

    #[test]
    fn test_split_missing_close_delimiter() {
        let body = "--b\r\nContent-Type: text/plain\r\n\r\ntail\r\n";
        let parts = split_multipart(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"tail\r\n");
    }

    #[test]
    fn test_split_no_delimiter() {
        assert!(split_multipart(b"just text\r\n", "b").unwrap().is_empty());
    }

    #[test]
    fn test_split_ignores_longer_boundary() {
        let body = "--b\n\nouter\n--bb\nstill outer\n--b--\n";
        let parts = split_multipart(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"outer\n--bb\nstill outer");
    }

    #[test]
    fn test_split_empty_part() {
        let parts = split_multipart(b"--b\r\n--b--\r\n", "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].body.is_empty());
        assert!(parts[0].headers.is_empty());
    }

    #[test]
    fn test_split_malformed_part_header() {
        let err = split_multipart(b"--b\r\nnot a header\r\n--b--\r\n", "b").unwrap_err();
        assert!(matches!(err, Error::InvalidMultipart(_)));
    }
}
