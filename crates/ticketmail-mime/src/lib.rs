//! # ticketmail-mime
//!
//! MIME parsing and body selection for inbound email.
//!
//! ## Features
//!
//! - **Message parsing**: Headers with folding, header/body split
//! - **Multipart**: Part splitting with attachment detection
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 headers, charsets
//! - **Body selection**: Plain text preferred, HTML rendered to Markdown
//!
//! ## Quick Start
//!
//! ```
//! use ticketmail_mime::Message;
//!
//! let raw = "From: sender@example.com\r\n\
//!            Content-Type: text/html\r\n\
//!            \r\n\
//!            <p>Hello, <b>World</b>!</p>";
//!
//! let message = Message::parse(raw.as_bytes());
//! assert_eq!(message.from(), Some("sender@example.com"));
//! assert_eq!(message.body_markdown()?, "Hello, **World**!");
//! # Ok::<(), ticketmail_mime::Error>(())
//! ```
//!
//! ### Selecting a body from headers and a stream
//!
//! ```
//! use ticketmail_mime::{Headers, decode_body};
//!
//! let mut headers = Headers::new();
//! headers.add("Content-Type", "text/plain");
//! headers.add("Content-Transfer-Encoding", "quoted-printable");
//!
//! let text = decode_body(&headers, &b"Hello=\r\nWorld"[..])?;
//! assert_eq!(text, "HelloWorld");
//! # Ok::<(), ticketmail_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod body;
mod charset;
mod content_type;
mod error;
mod header;
mod message;
mod multipart;

pub mod encoding;

pub use body::{DecodedText, decode_body, decode_payload};
pub use charset::decode_charset;
pub use content_type::ContentType;
pub use error::{Error, ErrorKind, Result};
pub use header::Headers;
pub use message::{Disposition, Message, Part, TransferEncoding};
pub use multipart::split_multipart;
