//! Turning raw inbound mail into issue comments.

use std::path::Path;

use ticketmail_mime::{Headers, Message};
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{extract_issue_number, extract_sender_domain, passes_email_auth};
use crate::poster::{CommentPoster, GitHubPoster, PostOutcome};
use crate::quote::fold_quotes;

/// A message that passed every check, ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Message-ID header, as received.
    pub message_id: String,
    /// Issue number taken from the recipients.
    pub issue: String,
    /// Decoded From header.
    pub from: String,
    /// Decoded Subject header.
    pub subject: String,
    /// Comment text: a `From:` line, a blank line, then the folded body.
    pub comment: String,
}

/// What happened to a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The comment was created.
    Posted(Ticket),
    /// The issue already had a comment for this message.
    AlreadyPosted(Ticket),
    /// No poster is configured; the message was only checked and logged.
    MetadataOnly(Ticket),
}

impl DispatchOutcome {
    /// The ticket behind this outcome.
    #[must_use]
    pub const fn ticket(&self) -> &Ticket {
        match self {
            Self::Posted(ticket) | Self::AlreadyPosted(ticket) | Self::MetadataOnly(ticket) => {
                ticket
            }
        }
    }
}

/// Checks inbound messages and posts them as issue comments.
#[derive(Debug)]
pub struct Dispatcher<P = GitHubPoster> {
    config: Config,
    poster: Option<P>,
}

impl<P: CommentPoster> Dispatcher<P> {
    /// Creates a dispatcher that only checks and logs messages.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            poster: None,
        }
    }

    /// Sets the poster used by [`dispatch`](Self::dispatch).
    #[must_use]
    pub fn with_poster(mut self, poster: P) -> Self {
        self.poster = Some(poster);
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Parses and checks a raw message and builds the comment text.
    ///
    /// Checks run in order: SPF/DKIM pass, sender domain, issue number.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthenticationFailed`], [`Error::SenderNotAllowed`] or
    ///   [`Error::NoIssueNumber`] when a check fails.
    /// - [`Error::Mime`] when no body can be selected.
    pub fn prepare(&self, raw: &[u8]) -> Result<Ticket> {
        let message = Message::parse(raw);
        let message_id = message.message_id().unwrap_or_default().to_string();

        if !passes_email_auth(message.authentication_results().unwrap_or_default()) {
            return Err(Error::AuthenticationFailed { message_id });
        }

        let from = message.from().unwrap_or_default();
        let domain = extract_sender_domain(from).unwrap_or_default();
        if !self.config.is_sender_allowed(&domain) {
            return Err(Error::SenderNotAllowed {
                domain,
                allowed: self.config.allowed_sender_domain.clone(),
            });
        }

        let issue = extract_issue_number(
            message.to().unwrap_or_default(),
            message.cc().unwrap_or_default(),
            &self.config.ticket_domain,
        )
        .ok_or(Error::NoIssueNumber)?;

        let from = Headers::decode_value(from);
        let subject = Headers::decode_value(message.subject().unwrap_or_default());
        info!(
            %message_id,
            %from,
            to = message.to().unwrap_or_default(),
            %subject,
            %issue,
            "accepted message"
        );

        let body = message.body_markdown()?;
        let folded = fold_quotes(&body, !self.config.show_quoted_text);

        Ok(Ticket {
            comment: format!("From: {from}\n\n{folded}"),
            message_id,
            issue,
            from,
            subject,
        })
    }

    /// Prepares a message and posts it when a poster is configured.
    ///
    /// # Errors
    ///
    /// Any error from [`prepare`](Self::prepare) or from the poster.
    #[instrument(skip_all)]
    pub async fn dispatch(&self, raw: &[u8]) -> Result<DispatchOutcome> {
        let ticket = self.prepare(raw)?;

        let Some(poster) = &self.poster else {
            info!(issue = %ticket.issue, "no project configured, not posting");
            return Ok(DispatchOutcome::MetadataOnly(ticket));
        };

        match poster
            .post(&ticket.issue, &ticket.message_id, &ticket.comment)
            .await?
        {
            PostOutcome::Posted => Ok(DispatchOutcome::Posted(ticket)),
            PostOutcome::AlreadyPosted => Ok(DispatchOutcome::AlreadyPosted(ticket)),
        }
    }

    /// Reads a message file and dispatches it.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, otherwise as
    /// [`dispatch`](Self::dispatch).
    pub async fn dispatch_file(&self, path: impl AsRef<Path>) -> Result<DispatchOutcome> {
        let raw = tokio::fs::read(path.as_ref()).await?;
        info!(path = %path.as_ref().display(), bytes = raw.len(), "processing message");
        self.dispatch(&raw).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPoster {
        posted: Mutex<Vec<(String, String, String)>>,
    }

    impl CommentPoster for RecordingPoster {
        async fn post(&self, issue: &str, message_id: &str, body: &str) -> Result<PostOutcome> {
            let mut posted = self.posted.lock().unwrap();
            if posted.iter().any(|(i, m, _)| i == issue && m == message_id) {
                return Ok(PostOutcome::AlreadyPosted);
            }
            posted.push((issue.to_string(), message_id.to_string(), body.to_string()));
            Ok(PostOutcome::Posted)
        }
    }

    fn config() -> Config {
        Config::new("issues.example.com", "example.com")
    }

    fn raw(auth: &str, from: &str, to: &str, body: &str) -> Vec<u8> {
        format!(
            "Message-ID: <m1@example.com>\r\n\
             Authentication-Results: {auth}\r\n\
             From: {from}\r\n\
             To: {to}\r\n\
             Subject: Re: bug\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             {body}"
        )
        .into_bytes()
    }

    fn good(body: &str) -> Vec<u8> {
        raw(
            "mx; spf=pass",
            "Ann <ann@example.com>",
            "7@issues.example.com",
            body,
        )
    }

    #[test]
    fn test_prepare_builds_comment() {
        let dispatcher = Dispatcher::<RecordingPoster>::new(config());
        let ticket = dispatcher
            .prepare(&good("Fixed.\n\nOn Mon, Bob wrote:\n> broken\n"))
            .unwrap();

        assert_eq!(ticket.issue, "7");
        assert_eq!(ticket.message_id, "<m1@example.com>");
        assert_eq!(ticket.subject, "Re: bug");
        assert_eq!(ticket.comment, "From: Ann <ann@example.com>\n\nFixed.\n");
    }

    #[test]
    fn test_prepare_show_quoted() {
        let config = Config::builder("issues.example.com", "example.com")
            .show_quoted_text(true)
            .build();
        let dispatcher = Dispatcher::<RecordingPoster>::new(config);
        let ticket = dispatcher
            .prepare(&good("Fixed.\n\nOn Mon, Bob wrote:\n> broken"))
            .unwrap();
        assert!(ticket.comment.contains("<summary>Show quoted email</summary>"));
        assert!(ticket.comment.contains("> broken"));
    }

    #[test]
    fn test_prepare_check_order() {
        let dispatcher = Dispatcher::<RecordingPoster>::new(config());

        let err = dispatcher
            .prepare(&raw("mx; spf=fail", "x@evil.org", "nobody@x", "hi"))
            .unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed { .. }));

        let err = dispatcher
            .prepare(&raw("mx; dkim=pass", "x@evil.org", "nobody@x", "hi"))
            .unwrap_err();
        assert!(matches!(err, Error::SenderNotAllowed { ref domain, .. } if domain == "evil.org"));

        let err = dispatcher
            .prepare(&raw("mx; dkim=pass", "x@dev.example.com", "nobody@x", "hi"))
            .unwrap_err();
        assert!(matches!(err, Error::NoIssueNumber));
    }

    #[test]
    fn test_prepare_body_error() {
        let dispatcher = Dispatcher::<RecordingPoster>::new(config());
        let message = "Message-ID: <m2@example.com>\r\n\
                       Authentication-Results: spf=pass\r\n\
                       From: ann@example.com\r\n\
                       To: 3@issues.example.com\r\n\
                       Content-Type: multipart/mixed\r\n\
                       \r\n\
                       body";
        let err = dispatcher.prepare(message.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Mime(_)));
    }

    #[tokio::test]
    async fn test_dispatch_without_poster_is_metadata_only() {
        let dispatcher = Dispatcher::<RecordingPoster>::new(config());
        let outcome = dispatcher.dispatch(&good("hello")).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::MetadataOnly(_)));
        assert_eq!(outcome.ticket().issue, "7");
    }

    #[tokio::test]
    async fn test_dispatch_posts_once() {
        let dispatcher = Dispatcher::new(config()).with_poster(RecordingPoster::default());

        let first = dispatcher.dispatch(&good("hello")).await.unwrap();
        let second = dispatcher.dispatch(&good("hello")).await.unwrap();

        assert!(matches!(first, DispatchOutcome::Posted(_)));
        assert!(matches!(second, DispatchOutcome::AlreadyPosted(_)));

        let posted = dispatcher.poster.as_ref().unwrap().posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "7");
        assert_eq!(posted[0].2, "From: Ann <ann@example.com>\n\nhello");
    }

    #[tokio::test]
    async fn test_dispatch_file_missing() {
        let dispatcher = Dispatcher::<RecordingPoster>::new(config());
        let err = dispatcher
            .dispatch_file("/nonexistent/ticketmail/message.eml")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
