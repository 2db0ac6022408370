//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The message body could not be selected or rendered.
    #[error("MIME error: {0}")]
    Mime(#[from] ticketmail_mime::Error),

    /// HTTP request to the issue tracker failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Neither SPF nor DKIM passed.
    #[error("{message_id}: authentication failure, possibly spoofed")]
    AuthenticationFailed {
        /// Message-ID of the rejected message.
        message_id: String,
    },

    /// The sender's domain is not on the allowlist.
    #[error("sender domain {domain:?} is not allowed (expected {allowed:?})")]
    SenderNotAllowed {
        /// Domain of the From address.
        domain: String,
        /// Configured allowed domain.
        allowed: String,
    },

    /// No recipient address names an issue.
    #[error("no issue number found in To: or Cc:")]
    NoIssueNumber,

    /// The issue tracker answered with an unexpected status.
    #[error("GitHub returned {status}: {body}")]
    GitHub {
        /// HTTP status code.
        status: u16,
        /// Response body, trimmed.
        body: String,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
