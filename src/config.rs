//! Gateway configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

use crate::guard::FailurePolicy;
use crate::identity::{DEFAULT_IDENTITY_CONNECT_TIMEOUT_SECS, DEFAULT_IDENTITY_REQUEST_TIMEOUT_SECS, IdentityTimeouts};
use crate::registry::{ConfigError, GuardTable, default_table};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "./dist";

#[derive(Debug, thiserror::Error)]
pub enum GatewayConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub port: u16,
    pub identity_url: String,
    pub identity_timeouts: IdentityTimeouts,
    pub guard_config_path: Option<PathBuf>,
    pub on_failure: FailurePolicy,
    pub static_dir: PathBuf,
}

impl GatewayConfig {
    /// Build typed gateway config from environment variables.
    ///
    /// Required:
    /// - `IDENTITY_URL`: user-info endpoint returning the current user's auth state
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `IDENTITY_REQUEST_TIMEOUT_SECS`: default 10
    /// - `IDENTITY_CONNECT_TIMEOUT_SECS`: default 5
    /// - `GUARD_CONFIG_PATH`: YAML guard table; built-in table when absent
    /// - `GUARD_FAIL_CLOSED`: deny instead of erroring when identity is unavailable
    /// - `STATIC_DIR`: built frontend to serve, default `./dist`
    ///
    /// # Errors
    ///
    /// Returns [`GatewayConfigError::Missing`] if `IDENTITY_URL` is unset or empty.
    pub fn from_env() -> Result<Self, GatewayConfigError> {
        let identity_url = std::env::var("IDENTITY_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(GatewayConfigError::Missing("IDENTITY_URL"))?;

        let identity_timeouts = IdentityTimeouts {
            request_secs: env_parse("IDENTITY_REQUEST_TIMEOUT_SECS", DEFAULT_IDENTITY_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("IDENTITY_CONNECT_TIMEOUT_SECS", DEFAULT_IDENTITY_CONNECT_TIMEOUT_SECS),
        };

        let on_failure = if env_bool("GUARD_FAIL_CLOSED").unwrap_or(false) {
            FailurePolicy::FailClosed
        } else {
            FailurePolicy::Propagate
        };

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            identity_url,
            identity_timeouts,
            guard_config_path: std::env::var("GUARD_CONFIG_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            on_failure,
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR)),
        })
    }

    /// Load the guard table named by `GUARD_CONFIG_PATH`, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configured file is unreadable or invalid.
    pub fn guard_table(&self) -> Result<GuardTable, ConfigError> {
        match &self.guard_config_path {
            Some(path) => GuardTable::from_file(path),
            None => Ok(default_table()),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
