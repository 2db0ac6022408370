//! # ticketmail-html
//!
//! Lossy HTML to Markdown rendering for email bodies.
//!
//! The renderer targets readable output for the formatting people actually
//! send in mail (paragraphs, headings, emphasis, links, lists, code and
//! images), not faithful conversion of arbitrary markup.
//!
//! ## Quick Start
//!
//! ```
//! use ticketmail_html::render_html;
//!
//! let markdown = render_html("<h2>Title</h2><p>Hello &amp; welcome</p>")?;
//! assert_eq!(markdown, "## Title\n\nHello & welcome");
//! # Ok::<(), ticketmail_html::Error>(())
//! ```
//!
//! ## Output guarantees
//!
//! - Rendering is deterministic: the same input always yields the same text.
//! - Output is trimmed and never contains more than one blank line in a row.
//! - Ordered lists number from 1 and nested lists keep their own counters.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod render;

pub use error::{Error, Result};
pub use render::{ListKind, RenderState, render_html};
