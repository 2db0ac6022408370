//! Error types for MIME operations.

use std::io;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
///
/// Decoding problems (bad transfer encoding, unknown charset) never show up
/// here: they degrade to the undecoded bytes instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Missing boundary in multipart message.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Invalid multipart structure.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),

    /// The body stream could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A non-text part was reached before any usable text part.
    #[error("No text part found (hit {content_type})")]
    NoTextPart {
        /// Media type of the part that stopped the scan.
        content_type: String,
    },

    /// The selected HTML part could not be rendered.
    #[error("HTML render error: {0}")]
    Render(#[from] ticketmail_html::Error),
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural problem with the message or its stream.
    Parse,
    /// No text candidate could be selected.
    NoTextPart,
    /// HTML rendering failed.
    Render,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidContentType(_)
            | Self::MissingBoundary
            | Self::InvalidMultipart(_)
            | Self::Io(_) => ErrorKind::Parse,
            Self::NoTextPart { .. } => ErrorKind::NoTextPart,
            Self::Render(_) => ErrorKind::Render,
        }
    }
}
