//! # ticketmail-core
//!
//! Email-to-issue plumbing for Ticketmail.
//!
//! This crate provides:
//! - **Quote folding** - hide or drop quoted reply history ([`fold_quotes`])
//! - **Header metadata** - issue number, sender domain, SPF/DKIM verdicts
//! - **Configuration** - builder and environment loading ([`Config`])
//! - **Comment posting** - the [`CommentPoster`] seam and a GitHub implementation
//! - **Dispatch** - the full check, render, fold and post pipeline ([`Dispatcher`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
mod error;
pub mod metadata;
pub mod poster;
mod quote;

pub use config::{Config, ConfigBuilder};
pub use dispatch::{DispatchOutcome, Dispatcher, Ticket};
pub use error::{Error, Result};
pub use metadata::{extract_issue_number, extract_sender_domain, passes_email_auth};
pub use poster::{CommentPoster, GitHubPoster, PostOutcome};
pub use quote::fold_quotes;
