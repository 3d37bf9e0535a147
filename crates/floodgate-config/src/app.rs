//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// JSON-RPC endpoint of the engine.
pub const ENV_ENGINE_URL: &str = "FLOODGATE_ENGINE_URL";
/// Listener address of the HTTP API.
pub const ENV_BIND_ADDR: &str = "FLOODGATE_BIND_ADDR";
/// Directory holding temporary download archives.
pub const ENV_TEMP_DIR: &str = "FLOODGATE_TEMP_DIR";
/// Seconds between periodic cache refreshes.
pub const ENV_REFRESH_INTERVAL_SECS: &str = "FLOODGATE_REFRESH_INTERVAL_SECS";
/// Seconds before an engine round trip is abandoned.
pub const ENV_RPC_TIMEOUT_SECS: &str = "FLOODGATE_RPC_TIMEOUT_SECS";
/// Default log level directive.
pub const ENV_LOG_LEVEL: &str = "FLOODGATE_LOG_LEVEL";
/// Log output format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "FLOODGATE_LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Fully resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON-RPC endpoint of the engine.
    pub engine_url: String,
    /// HTTP listener address.
    pub bind_addr: SocketAddr,
    /// Directory for temporary archive artifacts.
    pub temp_dir: PathBuf,
    /// Interval between periodic cache refreshes.
    pub refresh_interval: Duration,
    /// Per round-trip deadline.
    pub rpc_timeout: Duration,
    /// Default log level directive.
    pub log_level: String,
    /// Requested log format, if any.
    pub log_format: Option<String>,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value is invalid.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let engine_url = read(ENV_ENGINE_URL).ok_or(ConfigError::MissingEnv {
            name: ENV_ENGINE_URL,
        })?;
        if !(engine_url.starts_with("http://") || engine_url.starts_with("https://")) {
            return Err(invalid("engine_url", Some(engine_url), "must be an http(s) URL"));
        }

        let bind_raw = read(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| invalid("bind_addr", Some(bind_raw.clone()), "must be host:port"))?;

        let temp_dir = read(ENV_TEMP_DIR)
            .map_or_else(|| std::env::temp_dir().join("floodgate"), PathBuf::from);

        let refresh_interval = seconds(
            "refresh_interval_secs",
            read(ENV_REFRESH_INTERVAL_SECS),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        let rpc_timeout = seconds(
            "rpc_timeout_secs",
            read(ENV_RPC_TIMEOUT_SECS),
            DEFAULT_RPC_TIMEOUT_SECS,
        )?;

        Ok(Self {
            engine_url,
            bind_addr,
            temp_dir,
            refresh_interval,
            rpc_timeout,
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: read(ENV_LOG_FORMAT),
        })
    }
}

fn seconds(field: &'static str, raw: Option<String>, default: u64) -> ConfigResult<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid(field, Some(raw), "must be positive")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(invalid(field, Some(raw), "must be an integer")),
    }
}

fn invalid(field: &'static str, value: Option<String>, reason: &'static str) -> ConfigError {
    ConfigError::InvalidField {
        section: "app",
        field,
        value,
        reason,
    }
}
