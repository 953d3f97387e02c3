//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use push_gateway::config::DEFAULT_FCM_BASE_URL;
use push_gateway::GatewayConfig;

/// Default age after which pings are swept, and the default sweep period.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(10 * 60);

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Push provider connection.
    pub push: GatewayConfig,
    /// Pings older than this are deleted by the sweep.
    pub retention: Duration,
    /// How often the sweep runs.
    pub sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DISPATCHER_ADDR` | Server bind address | `127.0.0.1:3000` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:pings.db?mode=rwc` |
    /// | `PUSH_BASE_URL` | Push provider base URL | `https://fcm.googleapis.com` |
    /// | `PUSH_PROJECT_ID` | Push provider project | (required) |
    /// | `PUSH_ACCESS_TOKEN` | Push provider bearer token | (required) |
    /// | `PING_RETENTION_SECS` | Ping retention window | `600` |
    /// | `PING_SWEEP_INTERVAL_SECS` | Sweep period | `600` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("DISPATCHER_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            lookup("SQLITE_PATH").unwrap_or_else(|| "sqlite:pings.db?mode=rwc".to_string());

        let base_url = lookup("PUSH_BASE_URL").unwrap_or_else(|| DEFAULT_FCM_BASE_URL.to_string());
        let project_id = lookup("PUSH_PROJECT_ID").ok_or(ConfigError::MissingProjectId)?;
        let access_token = lookup("PUSH_ACCESS_TOKEN").ok_or(ConfigError::MissingAccessToken)?;

        let retention = seconds(&lookup, "PING_RETENTION_SECS")?.unwrap_or(DEFAULT_RETENTION);
        let sweep_interval =
            seconds(&lookup, "PING_SWEEP_INTERVAL_SECS")?.unwrap_or(DEFAULT_RETENTION);

        Ok(Self {
            addr,
            database_url,
            push: GatewayConfig::new(base_url, project_id, access_token),
            retention,
            sweep_interval,
        })
    }
}

fn seconds<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(ConfigError::InvalidDuration(key)),
        },
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid DISPATCHER_ADDR format")]
    InvalidAddr,

    #[error("PUSH_PROJECT_ID environment variable is required")]
    MissingProjectId,

    #[error("PUSH_ACCESS_TOKEN environment variable is required")]
    MissingAccessToken,

    #[error("{0} must be a positive number of seconds")]
    InvalidDuration(&'static str),
}
