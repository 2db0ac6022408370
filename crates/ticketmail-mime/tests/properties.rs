//! Property-based tests for the decoders and the body selector.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use ticketmail_mime::encoding::{decode_base64, decode_quoted_printable};
use ticketmail_mime::{Headers, decode_body, split_multipart};

proptest! {
    #[test]
    fn qp_without_escapes_or_breaks_is_identity(text in "[a-zA-Z0-9 ,.!?]*[a-zA-Z0-9.]") {
        prop_assert_eq!(decode_quoted_printable(text.as_bytes()), text.as_bytes());
    }

    #[test]
    fn qp_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_quoted_printable(&bytes);
    }

    #[test]
    fn base64_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_base64(&bytes);
    }

    #[test]
    fn splitter_never_panics(
        bytes in proptest::collection::vec(any::<u8>(), 0..512),
        boundary in "[a-z0-9]{1,8}",
    ) {
        let _ = split_multipart(&bytes, &boundary);
    }

    #[test]
    fn plain_body_is_trimmed(text in "\\PC*") {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain; charset=utf-8");
        let out = decode_body(&headers, text.as_bytes()).unwrap();
        prop_assert_eq!(out, text.trim());
    }

    #[test]
    fn selector_output_is_trimmed(body in "[ -~\r\n]{0,200}") {
        let mut headers = Headers::new();
        headers.add("Content-Type", "multipart/alternative; boundary=b");
        let raw = format!("--b\r\nContent-Type: text/plain\r\n\r\n{body}\r\n--b--\r\n");
        if let Ok(out) = decode_body(&headers, raw.as_bytes()) {
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
