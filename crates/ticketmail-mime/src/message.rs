//! MIME message structure and handling.

use crate::body::{decode_body, decode_payload};
use crate::content_type::ContentType;
use crate::error::Result;
use crate::header::Headers;

/// Content-Transfer-Encoding of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// `7bit`, `8bit`, `binary`, or anything unrecognized: bytes pass through.
    #[default]
    Identity,
    /// `base64`.
    Base64,
    /// `quoted-printable`.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Reads a Content-Transfer-Encoding value, ignoring case and padding.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("base64") {
            Self::Base64
        } else if value.eq_ignore_ascii_case("quoted-printable") {
            Self::QuotedPrintable
        } else {
            Self::Identity
        }
    }

    /// Whether the body must be decoded before use.
    #[must_use]
    pub const fn is_encoded(self) -> bool {
        !matches!(self, Self::Identity)
    }
}

/// Content-Disposition of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Displayed as part of the message (also the default).
    Inline,
    /// Attached file, never used as the message body.
    Attachment,
}

impl Disposition {
    /// Parses a Content-Disposition header value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim_start().to_ascii_lowercase().starts_with("attachment") {
            Self::Attachment
        } else {
            Self::Inline
        }
    }
}

/// MIME message part.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw bytes).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Parses a part from its raw header block and body.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (head, body) = split_head(raw);
        Self::new(Headers::parse(&String::from_utf8_lossy(head)), body.to_vec())
    }

    /// Gets the content type. A part without a Content-Type header is
    /// `text/plain; charset=us-ascii`.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Transfer encoding; [`TransferEncoding::Identity`] when absent.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        TransferEncoding::parse(self.headers.get_or_empty("content-transfer-encoding"))
    }

    /// Gets the disposition.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        self.headers
            .get("content-disposition")
            .map_or(Disposition::Inline, Disposition::parse)
    }

    /// Checks whether this part is an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition() == Disposition::Attachment
    }

    /// Decodes the body: transfer encoding first, then the declared charset.
    ///
    /// Never fails; undecodable content is returned as-is.
    #[must_use]
    pub fn decode_body(&self) -> Vec<u8> {
        let charset = self.content_type().ok();
        decode_payload(
            &self.body,
            self.transfer_encoding(),
            charset.as_ref().and_then(ContentType::charset),
        )
    }
}

/// RFC 822 message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Raw body, still transfer-encoded.
    pub body: Vec<u8>,
}

impl Message {
    /// Creates a message from parsed headers and a raw body.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Parses raw message bytes.
    ///
    /// The header block ends at the first empty line (CRLF or LF). Folded
    /// header lines are unfolded. Everything after the empty line is the body.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (head, body) = split_head(raw);
        Self::new(Headers::parse(&String::from_utf8_lossy(head)), body.to_vec())
    }

    /// Raw `From` value.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("From")
    }

    /// Raw `To` value.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("To")
    }

    /// Raw `Cc` value.
    #[must_use]
    pub fn cc(&self) -> Option<&str> {
        self.headers.get("Cc")
    }

    /// Raw `Subject` value; see [`Headers::decode_value`] for display.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("Subject")
    }

    /// `Message-ID` value, angle brackets included.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("Message-ID")
    }

    /// `Authentication-Results` value added by the receiving MTA.
    #[must_use]
    pub fn authentication_results(&self) -> Option<&str> {
        self.headers.get("Authentication-Results")
    }

    /// Selects the body text and converts it to Markdown.
    ///
    /// # Errors
    ///
    /// See [`decode_body`].
    pub fn body_markdown(&self) -> Result<String> {
        decode_body(&self.headers, self.body.as_slice())
    }
}

/// Splits raw bytes at the first empty line into (headers, body).
///
/// Without an empty line everything is header and the body is empty.
fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    for line in raw.split_inclusive(|&b| b == b'\n') {
        let content = line
            .strip_suffix(b"\n")
            .map_or(line, |l| l.strip_suffix(b"\r").unwrap_or(l));
        if content.is_empty() {
            return (&raw[..offset], &raw[offset + line.len()..]);
        }
        offset += line.len();
    }
    (raw, &[])
}
