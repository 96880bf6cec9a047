//! Connection settings for the Connect server.

use std::time::Duration;

use thiserror::Error;

/// Base URL of the Connect server.
pub const HOST_ENV: &str = "OP_CONNECT_HOST";
/// Bearer token presented on every request.
pub const TOKEN_ENV: &str = "OP_CONNECT_TOKEN";
/// Optional request timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "OP_CONNECT_TIMEOUT_MS";
/// Optional `true`/`false`; idle connections are only pooled when `true`.
pub const KEEP_ALIVE_ENV: &str = "OP_CONNECT_KEEP_ALIVE";

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration problems detected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("{name} must be set")]
    Missing {
        /// Environment variable or setting name.
        name: &'static str,
    },

    /// A setting is present but unusable.
    #[error("{name} is invalid: {reason}")]
    Invalid {
        /// Environment variable or setting name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Where and how to reach the Connect server.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    pub server_url: String,
    pub token: String,
    pub timeout: Duration,
    pub keep_alive: bool,
}

impl ConnectConfig {
    pub fn new(server_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            keep_alive: false,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] when [`HOST_ENV`] or [`TOKEN_ENV`] is unset;
    /// [`ConfigError::Invalid`] when an optional setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`] but reads settings through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing { name })
        };

        let mut config = Self::new(required(HOST_ENV)?, required(TOKEN_ENV)?);

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let millis = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: TIMEOUT_ENV,
                reason: e.to_string(),
            })?;
            config.timeout = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup(KEEP_ALIVE_ENV) {
            config.keep_alive = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::Invalid {
                        name: KEEP_ALIVE_ENV,
                        reason: format!("expected true or false, got '{other}'"),
                    })
                }
            };
        }

        Ok(config)
    }
}

impl std::fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("server_url", &self.server_url)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}
