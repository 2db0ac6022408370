//! Body selection: pick the best textual representation of a message.

use std::io::Read;

use tracing::{debug, trace, warn};

use crate::charset::decode_charset;
use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Part, TransferEncoding};
use crate::multipart::split_multipart;

/// Text decoded from a single part, tagged with its flavour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedText {
    /// `text/plain` content.
    Plain(String),
    /// `text/html` content, still to be rendered.
    Html(String),
}

impl DecodedText {
    /// Converts the text into Markdown.
    ///
    /// Plain text is trimmed; HTML goes through the renderer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the HTML cannot be parsed.
    pub fn into_markdown(self) -> Result<String> {
        match self {
            Self::Plain(text) => Ok(text.trim().to_string()),
            Self::Html(html) => Ok(ticketmail_html::render_html(&html)?),
        }
    }
}

/// Selects and decodes the body of a message, returning Markdown.
///
/// - Missing or unparseable Content-Type: the body is plain text.
/// - `multipart/*`: the first inline `text/plain` part wins. Otherwise the
///   first inline `text/html` part is rendered. Attachments are skipped.
/// - Anything else: the body is decoded and rendered if it is HTML.
///
/// # Errors
///
/// - [`ErrorKind::Parse`](crate::ErrorKind::Parse) if the stream cannot be
///   read, a multipart type has no boundary, or the multipart structure is
///   broken.
/// - [`Error::NoTextPart`] if a non-text inline part comes before any text
///   candidate.
/// - [`Error::Render`] if the chosen HTML cannot be rendered.
pub fn decode_body<R: Read>(headers: &Headers, mut body: R) -> Result<String> {
    let mut raw = Vec::new();
    body.read_to_end(&mut raw)?;

    let content_type = match headers.get("content-type").map(ContentType::parse) {
        Some(Ok(content_type)) => content_type,
        Some(Err(err)) => {
            debug!(%err, "unparseable Content-Type, treating body as plain text");
            return Ok(lossy(raw).trim().to_string());
        }
        None => {
            debug!("no Content-Type, treating body as plain text");
            return Ok(lossy(raw).trim().to_string());
        }
    };

    if content_type.is_multipart() {
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        let parts = split_multipart(&raw, boundary)?;
        debug!(
            media_type = %content_type.media_type(),
            parts = parts.len(),
            "selecting body from multipart"
        );
        return select_part(&parts)?.map_or_else(|| Ok(String::new()), DecodedText::into_markdown);
    }

    let encoding = TransferEncoding::parse(headers.get_or_empty("content-transfer-encoding"));
    let decoded = lossy(decode_payload(&raw, encoding, content_type.charset()));
    let text = if content_type.is_html() {
        DecodedText::Html(decoded)
    } else {
        DecodedText::Plain(decoded)
    };
    text.into_markdown()
}

/// Walks the parts in order and returns the chosen text, if any.
fn select_part(parts: &[Part]) -> Result<Option<DecodedText>> {
    let mut html: Option<String> = None;

    for (index, part) in parts.iter().enumerate() {
        if part.is_attachment() {
            trace!(index, "skipping attachment");
            continue;
        }

        match part.content_type() {
            Ok(content_type) if content_type.is_plain_text() => {
                debug!(index, "selected text/plain part");
                return Ok(Some(DecodedText::Plain(lossy(part.decode_body()))));
            }
            Ok(content_type) if content_type.is_html() => {
                if html.is_none() {
                    debug!(index, "remembering text/html part");
                    html = Some(lossy(part.decode_body()));
                }
            }
            Ok(content_type) if content_type.is_text() => {
                trace!(index, media_type = %content_type.media_type(), "skipping text part");
            }
            other => {
                let media_type = other.map_or_else(
                    |_| part.headers.get_or_empty("content-type").to_string(),
                    |content_type| content_type.media_type(),
                );
                if html.is_none() {
                    return Err(Error::NoTextPart {
                        content_type: media_type,
                    });
                }
                trace!(index, %media_type, "skipping non-text part");
            }
        }
    }

    Ok(html.map(DecodedText::Html))
}

/// Reverses the transfer encoding, then converts the charset to UTF-8.
///
/// Never fails: Base64 that does not decode is kept as-is, as is text in an
/// unknown charset.
#[must_use]
pub fn decode_payload(raw: &[u8], encoding: TransferEncoding, charset: Option<&str>) -> Vec<u8> {
    let transferred = match encoding {
        TransferEncoding::QuotedPrintable => decode_quoted_printable(raw),
        TransferEncoding::Base64 => decode_base64(raw).unwrap_or_else(|err| {
            warn!(%err, "invalid base64 body, keeping raw bytes");
            raw.to_vec()
        }),
        TransferEncoding::Identity => raw.to_vec(),
    };
    decode_charset(&transferred, charset)
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}
