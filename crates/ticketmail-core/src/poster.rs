//! Posting Markdown comments to an issue tracker.

use std::future::Future;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Comments fetched per page while looking for duplicates.
const PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("ticketmail/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Result of a post attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// A new comment was created.
    Posted,
    /// A comment for this Message-ID already exists; nothing was sent.
    AlreadyPosted,
}

/// Destination for rendered messages.
///
/// Implementations own idempotency: posting the same `message_id` twice to
/// the same issue should yield [`PostOutcome::AlreadyPosted`] the second time.
pub trait CommentPoster {
    /// Posts `body` as a comment on `issue`, tagged with `message_id`.
    fn post(
        &self,
        issue: &str,
        message_id: &str,
        body: &str,
    ) -> impl Future<Output = Result<PostOutcome>> + Send;
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

/// Posts comments through the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubPoster {
    client: Client,
    api_base: String,
    project: String,
    token: String,
}

impl GitHubPoster {
    /// Creates a poster from the project, token, base URL and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the project or token is missing, or
    /// [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let project = config
            .github_project
            .clone()
            .ok_or_else(|| Error::Config("GITHUB_PROJECT is not set".to_string()))?;
        let token = config
            .github_token
            .clone()
            .ok_or_else(|| Error::Config("GITHUB_TOKEN is not set".to_string()))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.github_api_base.clone(),
            project,
            token,
        })
    }

    fn comments_url(&self, issue: &str) -> String {
        comments_url(&self.api_base, &self.project, issue)
    }

    /// Pages through the issue's comments looking for `message_id`.
    async fn already_posted(&self, issue: &str, message_id: &str) -> Result<bool> {
        let url = self.comments_url(issue);
        let mut page: u32 = 1;

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("per_page", PAGE_SIZE), ("page", page)])
                .header(AUTHORIZATION, format!("token {}", self.token))
                .header(ACCEPT, GITHUB_ACCEPT)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;
            if status != StatusCode::OK {
                return Err(Error::GitHub {
                    status: status.as_u16(),
                    body: text.trim().to_string(),
                });
            }

            let comments: Vec<IssueComment> = serde_json::from_str(&text)?;
            debug!(issue, page, count = comments.len(), "fetched comments");
            if comments.is_empty() {
                return Ok(false);
            }
            if contains_message_id(&comments, message_id) {
                return Ok(true);
            }
            page += 1;
        }
    }
}

impl CommentPoster for GitHubPoster {
    async fn post(&self, issue: &str, message_id: &str, body: &str) -> Result<PostOutcome> {
        match self.already_posted(issue, message_id).await {
            Ok(true) => {
                info!(issue, message_id, "already posted, skipping");
                return Ok(PostOutcome::AlreadyPosted);
            }
            Ok(false) => {}
            // Posting twice beats dropping the message.
            Err(err) => warn!(issue, message_id, %err, "duplicate check failed, posting anyway"),
        }

        let comment = comment_body(message_id, body);
        let response = self
            .client
            .post(self.comments_url(issue))
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .json(&NewComment { body: &comment })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::GitHub {
                status: status.as_u16(),
                body: text.trim().to_string(),
            });
        }

        info!(issue, message_id, "comment posted");
        Ok(PostOutcome::Posted)
    }
}

fn comments_url(api_base: &str, project: &str, issue: &str) -> String {
    format!("{api_base}/repos/{project}/issues/{issue}/comments")
}

/// First line of every comment we post.
fn marker_line(message_id: &str) -> String {
    format!("Message-ID: {message_id}").trim().to_string()
}

fn comment_body(message_id: &str, body: &str) -> String {
    format!("Message-ID: {message_id}\n{body}")
}

fn contains_message_id(comments: &[IssueComment], message_id: &str) -> bool {
    let marker = marker_line(message_id);
    comments
        .iter()
        .filter_map(|comment| comment.body.as_deref())
        .any(|body| body.lines().next().unwrap_or_default().trim() == marker)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn comments(json: &str) -> Vec<IssueComment> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_comments_url() {
        assert_eq!(
            comments_url("https://api.github.com", "acme/widgets", "42"),
            "https://api.github.com/repos/acme/widgets/issues/42/comments"
        );
    }

    #[test]
    fn test_comment_body_starts_with_marker() {
        let body = comment_body("<a@b>", "From: x\n\nhello");
        assert_eq!(body, "Message-ID: <a@b>\nFrom: x\n\nhello");
        assert_eq!(body.lines().next(), Some(marker_line("<a@b>").as_str()));
    }

    #[test]
    fn test_contains_message_id() {
        let list = comments(
            r#"[
                {"body": "unrelated"},
                {"body": null},
                {"id": 7},
                {"body": "  Message-ID: <a@b>  \r\nFrom: x"}
            ]"#,
        );
        assert!(contains_message_id(&list, "<a@b>"));
        assert!(!contains_message_id(&list, "<c@d>"));
    }

    #[test]
    fn test_marker_must_be_first_line() {
        let list = comments(r#"[{"body": "hello\nMessage-ID: <a@b>"}]"#);
        assert!(!contains_message_id(&list, "<a@b>"));
    }

    #[test]
    fn test_new_requires_project_and_token() {
        let config = Config::new("issues.example.com", "example.com");
        assert!(matches!(GitHubPoster::new(&config), Err(Error::Config(_))));

        let config = Config::builder("issues.example.com", "example.com")
            .github_project("acme/widgets")
            .build();
        assert!(matches!(GitHubPoster::new(&config), Err(Error::Config(_))));

        let config = Config::builder("issues.example.com", "example.com")
            .github_project("acme/widgets")
            .github_token("t")
            .github_api_base("http://127.0.0.1:9")
            .build();
        let poster = GitHubPoster::new(&config).unwrap();
        assert_eq!(
            poster.comments_url("1"),
            "http://127.0.0.1:9/repos/acme/widgets/issues/1/comments"
        );
    }
}
