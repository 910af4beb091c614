//! # Session Configuration
//!
//! Environment-based configuration for the session backends. Read once at
//! startup and passed explicitly to [`crate::build_backend`].

use std::env;
use std::time::Duration;

use session_domain::{DEFAULT_DATABASE, DEFAULT_PORT};

/// Comma-separated server list, e.g. `tcp://h1:6379?database=2,tcp://h2`
pub const ENV_SAVE_PATH: &str = "SESSION_REDIS_SAVE_PATH";
pub const ENV_SERVER_IP: &str = "SESSION_REDIS_SERVERIP";
pub const ENV_PORT: &str = "SESSION_REDIS_PORT";
pub const ENV_DATABASE: &str = "SESSION_REDIS_DATABASE";
pub const ENV_PREFIX: &str = "SESSION_REDIS_PREFIX";
pub const ENV_ACQUIRE_LOCK_TIMEOUT: &str = "SESSION_REDIS_ACQUIRE_LOCK_TIMEOUT";
pub const ENV_EXECUTION_TIME_LIMIT: &str = "SESSION_EXECUTION_TIME_LIMIT";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

const DEFAULT_ACQUIRE_LOCK_TIMEOUT_SECS: u64 = 120;
const DEFAULT_EXECUTION_TIME_LIMIT_SECS: u64 = 30;

/// Session subsystem configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Multi-server connection string; takes precedence over `single`
    pub connection_string: Option<String>,

    /// Discrete single-server settings
    pub single: SingleServerConfig,

    /// How long session start may wait for the session lock
    pub acquire_lock_timeout: Duration,

    /// Execution budget outside of session start
    pub execution_time_limit: Duration,

    /// Logging level
    pub log_level: String,
}

/// Settings for the single-server backend
#[derive(Debug, Clone)]
pub struct SingleServerConfig {
    pub server_ip: String,
    pub port: u16,
    pub database: i64,
    /// `None` keeps the default key prefix
    pub prefix: Option<String>,
}

impl Default for SingleServerConfig {
    fn default() -> Self {
        Self {
            server_ip: String::new(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE,
            prefix: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            single: SingleServerConfig::default(),
            acquire_lock_timeout: Duration::from_secs(DEFAULT_ACQUIRE_LOCK_TIMEOUT_SECS),
            execution_time_limit: Duration::from_secs(DEFAULT_EXECUTION_TIME_LIMIT_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset and
    /// unparsable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            connection_string: get(ENV_SAVE_PATH),

            single: SingleServerConfig {
                server_ip: get(ENV_SERVER_IP).unwrap_or_default(),
                port: get(ENV_PORT)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_PORT),
                database: get(ENV_DATABASE)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_DATABASE),
                prefix: get(ENV_PREFIX),
            },

            acquire_lock_timeout: get(ENV_ACQUIRE_LOCK_TIMEOUT)
                .and_then(|v| v.trim().parse().ok())
                .map_or(defaults.acquire_lock_timeout, Duration::from_secs),

            execution_time_limit: get(ENV_EXECUTION_TIME_LIMIT)
                .and_then(|v| v.trim().parse().ok())
                .map_or(defaults.execution_time_limit, Duration::from_secs),

            log_level: get(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
        }
    }
}
