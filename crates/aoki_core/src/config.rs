//! Runtime configuration read from environment variables.
//!
//! # Responsibility
//! - Select the storage backend (local SQLite or remote store server).
//! - Carry backend, lifecycle policy and logging settings to the caller that
//!   constructs the service.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set-but-invalid values are
//!   errors, never silently replaced.
//! - Configuration is plain data: nothing here opens connections.

use crate::logging::default_log_level;
use crate::service::lifecycle_service::StatePolicy;
use log::Level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATA_MODE: &str = "AOKI_DATA_MODE";
pub const ENV_DB_PATH: &str = "AOKI_DB_PATH";
pub const ENV_API_URL: &str = "AOKI_API_URL";
pub const ENV_REMOTE_TIMEOUT_MS: &str = "AOKI_REMOTE_TIMEOUT_MS";
pub const ENV_STRICT_LIFECYCLE: &str = "AOKI_STRICT_LIFECYCLE";
pub const ENV_LOG_LEVEL: &str = "AOKI_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "AOKI_LOG_DIR";

const DEFAULT_DB_PATH: &str = "aoki_vault.sqlite3";
const DEFAULT_API_URL: &str = "http://localhost:3001/api";
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5_000;
const MAX_REMOTE_TIMEOUT_MS: u64 = 120_000;

/// Which backend the process talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataMode {
    /// Embedded SQLite file.
    #[default]
    Local,
    /// Store server over HTTP.
    Remote,
}

impl DataMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Configuration error for one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid {key} value `{value}`; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub data_mode: DataMode,
    pub db_path: PathBuf,
    pub api_url: String,
    pub remote_timeout: Duration,
    pub state_policy: StatePolicy,
    pub log_level: Level,
    /// Absolute directory for log files. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_mode: DataMode::Local,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            api_url: DEFAULT_API_URL.to_string(),
            remote_timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
            state_policy: StatePolicy::Strict,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl VaultConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = read(ENV_DATA_MODE) {
            config.data_mode = match value.to_ascii_lowercase().as_str() {
                "local" => DataMode::Local,
                "remote" => DataMode::Remote,
                _ => return Err(invalid(ENV_DATA_MODE, value, "local|remote")),
            };
        }
        if let Some(value) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_API_URL) {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(invalid(ENV_API_URL, value, "an http(s) URL"));
            }
            config.api_url = value;
        }
        if let Some(value) = read(ENV_REMOTE_TIMEOUT_MS) {
            let millis = value
                .parse::<u64>()
                .ok()
                .filter(|millis| (1..=MAX_REMOTE_TIMEOUT_MS).contains(millis))
                .ok_or_else(|| invalid(ENV_REMOTE_TIMEOUT_MS, value, "1..=120000"))?;
            config.remote_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = read(ENV_STRICT_LIFECYCLE) {
            config.state_policy = match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => StatePolicy::Strict,
                "false" | "0" | "no" => StatePolicy::Lenient,
                _ => return Err(invalid(ENV_STRICT_LIFECYCLE, value, "true|false")),
            };
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value
                .parse::<Level>()
                .map_err(|_| invalid(ENV_LOG_LEVEL, value, "trace|debug|info|warn|error"))?;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            if !Path::new(&value).is_absolute() {
                return Err(invalid(ENV_LOG_DIR, value, "an absolute path"));
            }
            config.log_dir = Some(PathBuf::from(value));
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value,
        expected,
    }
}
