//! Connector configuration.
//!
//! A [`ConnectorConfig`] is passed into the client constructor; nothing here is
//! process-wide, so several clients can talk to different servers side by side.

use reqwest::Url;
use std::fmt;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::http::RetryPolicy;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("secrat/", env!("SECRAT_VERSION"));

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Full API base URL such as `https://rat.example.com/api`, without a trailing slash.
    pub api_url: String,
    /// If false, TLS certificate validation is disabled.
    pub verify_certificates: bool,
    /// If true, list calls are cached until a write touches the same collection.
    pub cached: bool,
    /// Optional age limit for cached entries.
    pub cache_ttl: Option<Duration>,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl ConnectorConfig {
    pub fn new(api_url: &str) -> Result<Self> {
        let parsed = Url::parse(api_url)
            .map_err(|e| ApiError::config(format!("Invalid API URL '{}': {}", api_url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ApiError::config(format!(
                "Unsupported URL scheme '{}'. Expected http or https.",
                parsed.scheme()
            )));
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            verify_certificates: true,
            cached: true,
            cache_ttl: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_verify_certificates(mut self, verify: bool) -> Self {
        self.verify_certificates = verify;
        self
    }

    pub fn with_cache(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Joins an endpoint such as `tagInstances/4` onto the API base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

/// Username and password used by the login flow.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
