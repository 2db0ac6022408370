//! Dispatching complete messages through an in-memory poster.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use ticketmail_core::{
    CommentPoster, Config, DispatchOutcome, Dispatcher, Error, PostOutcome, Result,
};

#[derive(Default)]
struct MemoryPoster {
    comments: Mutex<Vec<(String, String)>>,
}

impl CommentPoster for MemoryPoster {
    async fn post(&self, issue: &str, message_id: &str, body: &str) -> Result<PostOutcome> {
        let marker = format!("Message-ID: {message_id}");
        let mut comments = self.comments.lock().unwrap();
        if comments
            .iter()
            .any(|(i, text)| i == issue && text.lines().next() == Some(marker.as_str()))
        {
            return Ok(PostOutcome::AlreadyPosted);
        }
        comments.push((issue.to_string(), format!("{marker}\n{body}")));
        Ok(PostOutcome::Posted)
    }
}

const HTML_REPLY: &str = concat!(
    "Message-ID: <reply-1@mail.example.com>\r\n",
    "Authentication-Results: mx.example.net; dkim=pass header.d=example.com\r\n",
    "From: =?UTF-8?Q?Zo=C3=AB?= <zoe@mail.example.com>\r\n",
    "To: Support <support@example.com>,\r\n",
    " 1234@issues.example.com\r\n",
    "Subject: Re: [acme/widgets] Crash on start (#1234)\r\n",
    "MIME-Version: 1.0\r\n",
    "Content-Type: multipart/alternative; boundary=\"000000000000abcdef\"\r\n",
    "\r\n",
    "--000000000000abcdef\r\n",
    "Content-Type: text/html; charset=\"UTF-8\"\r\n",
    "Content-Transfer-Encoding: quoted-printable\r\n",
    "\r\n",
    "<div>Still crashes on <b>1.2</b>, see <a href=3D\"https://example.com/log\">log</a>.</div>=\r\n",
    "<div>On Tue, Jan 7, 2025 at 9:00 AM Bot &lt;bot@example.com&gt; wrote:</div>=\r\n",
    "<div>please retry</div>\r\n",
    "--000000000000abcdef--\r\n",
);

fn config() -> Config {
    Config::builder("issues.example.com", "example.com").build()
}

#[tokio::test]
async fn html_reply_is_rendered_folded_and_posted() {
    let dispatcher = Dispatcher::new(config()).with_poster(MemoryPoster::default());

    let outcome = dispatcher.dispatch(HTML_REPLY.as_bytes()).await.unwrap();
    let ticket = match outcome {
        DispatchOutcome::Posted(ticket) => ticket,
        other => panic!("expected Posted, got {other:?}"),
    };

    assert_eq!(ticket.issue, "1234");
    assert_eq!(ticket.from, "Zoë <zoe@mail.example.com>");
    assert_eq!(
        ticket.comment,
        "From: Zoë <zoe@mail.example.com>\n\n\
         Still crashes on **1.2**, see log (https://example.com/log).\n"
    );
}

#[tokio::test]
async fn redelivery_is_not_posted_twice() {
    let dispatcher = Dispatcher::new(config()).with_poster(MemoryPoster::default());

    let first = dispatcher.dispatch(HTML_REPLY.as_bytes()).await.unwrap();
    let second = dispatcher.dispatch(HTML_REPLY.as_bytes()).await.unwrap();

    assert!(matches!(first, DispatchOutcome::Posted(_)));
    assert!(matches!(second, DispatchOutcome::AlreadyPosted(_)));
}

#[tokio::test]
async fn spoofed_message_is_rejected() {
    let dispatcher = Dispatcher::new(config()).with_poster(MemoryPoster::default());
    let spoofed = HTML_REPLY.replace("dkim=pass", "dkim=fail");

    let err = dispatcher.dispatch(spoofed.as_bytes()).await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed { ref message_id } if message_id == "<reply-1@mail.example.com>"));
}

#[tokio::test]
async fn shown_quotes_are_folded_into_details() {
    let config = Config::builder("issues.example.com", "example.com")
        .show_quoted_text(true)
        .build();
    let dispatcher = Dispatcher::<MemoryPoster>::new(config);

    let outcome = dispatcher.dispatch(HTML_REPLY.as_bytes()).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::MetadataOnly(_)));
    assert!(outcome.ticket().comment.ends_with(
        "<details>\n<summary>Show quoted email</summary>\n\n\
         On Tue, Jan 7, 2025 at 9:00 AM Bot <bot@example.com> wrote:\n\nplease retry\n\n</details>"
    ));
}
