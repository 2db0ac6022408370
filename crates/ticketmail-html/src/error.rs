//! Error types for HTML rendering.

use std::io;

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Rendering error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tokenizer could not consume the input stream.
    #[error("Render error: {0}")]
    Render(#[from] io::Error),
}
