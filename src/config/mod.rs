//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BellbookError, Result};
use crate::util::retry::RetryPolicy;

/// Default API root. Every HTTP path in this crate is relative to it.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SESSION_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Reconnect backoff for the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(3),
            max: Duration::from_secs(30),
        }
    }
}

/// Freshness and retry defaults for cached queries.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Cached data younger than this is served without refetching.
    pub stale_time: Duration,
    /// Entries unused for this long are dropped.
    pub gc_time: Duration,
    pub retry: RetryPolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(2 * 60),
            gc_time: Duration::from_secs(10 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Configuration for a BellBook client session.
///
/// # Example
/// ```no_run
/// use bellbook::config::ClientConfig;
///
/// let config = ClientConfig::from_env().with_base_url("https://bellbook.co.za/api");
/// assert_eq!(config.base_url, "https://bellbook.co.za/api");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials_dir: PathBuf,
    pub request_timeout: Duration,
    pub backoff: BackoffConfig,
    pub query: QueryConfig,
    pub session_stale_time: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials_dir: default_bellbook_dir(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backoff: BackoffConfig::default(),
            query: QueryConfig::default(),
            session_stale_time: DEFAULT_SESSION_STALE_TIME,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (`BELLBOOK_BASE_URL`, `BELLBOOK_HOME`,
    /// `BELLBOOK_TIMEOUT_SECS`), reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::new();

        if let Ok(url) = std::env::var("BELLBOOK_BASE_URL") {
            config.base_url = url;
        }
        if let Some(home) = std::env::var_os("BELLBOOK_HOME") {
            config.credentials_dir = PathBuf::from(home);
        }
        if let Ok(raw) = std::env::var("BELLBOOK_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => config.request_timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid BELLBOOK_TIMEOUT_SECS"),
            }
        }

        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_credentials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.credentials_dir = dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_query(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    /// Join `path` onto the configured base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Build the shared HTTP client for this configuration.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| BellbookError::Configuration(format!("HTTP client: {e}")))
    }

    /// Client for the push channel: no overall timeout, only a connect timeout,
    /// since the stream stays open for the whole session.
    pub fn streaming_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.request_timeout)
            .build()
            .map_err(|e| BellbookError::Configuration(format!("HTTP client: {e}")))
    }
}

fn default_bellbook_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".bellbook"))
        .unwrap_or_else(|| PathBuf::from(".bellbook"))
}
