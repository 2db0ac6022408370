//! Dispatcher configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default GitHub REST endpoint.
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Environment variable names read by [`Config::from_env`].
pub mod env {
    /// Domain whose numeric local parts are issue numbers.
    pub const TICKET_DOMAIN: &str = "TICKETMAIL_DOMAIN";
    /// Allowed sender domain.
    pub const ALLOWED_DOMAIN: &str = "TICKETMAIL_ALLOWED_DOMAIN";
    /// `owner/repo` to comment on.
    pub const GITHUB_PROJECT: &str = "GITHUB_PROJECT";
    /// API token.
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
    /// API base URL override.
    pub const GITHUB_API_BASE: &str = "GITHUB_API_BASE";
    /// Any non-empty value keeps quoted text in a collapsible block.
    pub const SHOW_QUOTED: &str = "TICKETMAIL_SHOW_QUOTED";
}

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Domain whose all-digit local parts name issues, e.g. `issues.example.com`.
    pub ticket_domain: String,
    /// Senders must be on this domain or one of its subdomains.
    pub allowed_sender_domain: String,
    /// `owner/repo`. Without it messages are checked but not posted.
    pub github_project: Option<String>,
    /// API token used for posting.
    pub github_token: Option<String>,
    /// API base URL.
    pub github_api_base: String,
    /// Keep quoted text (folded) instead of discarding it.
    pub show_quoted_text: bool,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a configuration with defaults for everything optional.
    #[must_use]
    pub fn new(ticket_domain: impl Into<String>, allowed_sender_domain: impl Into<String>) -> Self {
        Self {
            ticket_domain: ticket_domain.into(),
            allowed_sender_domain: allowed_sender_domain.into(),
            github_project: None,
            github_token: None,
            github_api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            show_quoted_text: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(
        ticket_domain: impl Into<String>,
        allowed_sender_domain: impl Into<String>,
    ) -> ConfigBuilder {
        ConfigBuilder::new(ticket_domain, allowed_sender_domain)
    }

    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup.
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required key is missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str, example: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} is not set, example: {example}")))
        };

        let mut builder = Self::builder(
            require(env::TICKET_DOMAIN, "issues.example.com")?,
            require(env::ALLOWED_DOMAIN, "example.com")?,
        )
        .show_quoted_text(get(env::SHOW_QUOTED).is_some());

        if let Some(project) = get(env::GITHUB_PROJECT) {
            builder = builder.github_project(project);
        }
        if let Some(token) = get(env::GITHUB_TOKEN) {
            builder = builder.github_token(token);
        }
        if let Some(base) = get(env::GITHUB_API_BASE) {
            builder = builder.github_api_base(base);
        }

        Ok(builder.build())
    }

    /// Whether `domain` is the allowed sender domain or a subdomain of it.
    #[must_use]
    pub fn is_sender_allowed(&self, domain: &str) -> bool {
        let allowed = self.allowed_sender_domain.trim_start_matches('.');
        if allowed.is_empty() {
            return false;
        }
        let domain = domain.to_ascii_lowercase();
        let allowed = allowed.to_ascii_lowercase();
        domain == allowed
            || domain
                .strip_suffix(&allowed)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder with the two required domains.
    #[must_use]
    pub fn new(ticket_domain: impl Into<String>, allowed_sender_domain: impl Into<String>) -> Self {
        Self {
            config: Config::new(ticket_domain, allowed_sender_domain),
        }
    }

    /// Sets the `owner/repo` project.
    #[must_use]
    pub fn github_project(mut self, project: impl Into<String>) -> Self {
        self.config.github_project = Some(project.into());
        self
    }

    /// Sets the API token.
    #[must_use]
    pub fn github_token(mut self, token: impl Into<String>) -> Self {
        self.config.github_token = Some(token.into());
        self
    }

    /// Sets the API base URL. A trailing `/` is dropped.
    #[must_use]
    pub fn github_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.config.github_api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Keeps quoted text in a collapsible block.
    #[must_use]
    pub const fn show_quoted_text(mut self, show: bool) -> Self {
        self.config.show_quoted_text = show;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}
