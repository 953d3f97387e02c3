//! Client configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Dispatcher URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Directory the ping cache is stored in when none is configured.
pub const DEFAULT_STORAGE_DIR: &str = ".ping-client";

/// Configuration for automatic reconnection of the change feed.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of retries (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

/// Configuration for a sender's client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the dispatcher (e.g., "http://127.0.0.1:3000").
    pub api_url: String,
    /// Directory holding the persisted ping cache.
    pub storage_dir: PathBuf,
    /// Change-feed reconnection policy.
    pub reconnect: ReconnectConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Create a configuration for the given dispatcher URL.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Load configuration from `PING_API_URL` and `PING_STORAGE_DIR`.
    pub fn from_env() -> Self {
        let mut config =
            Self::new(env::var("PING_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()));
        if let Ok(dir) = env::var("PING_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        config
    }

    /// Set the cache directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Set the reconnection policy.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Full URL of a dispatcher endpoint.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// The signed-in user a session acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    /// Push token registered for this user; doubles as the sender credential.
    pub token: String,
}

impl Identity {
    pub fn new(id: i64, name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            token: token.into(),
        }
    }
}
