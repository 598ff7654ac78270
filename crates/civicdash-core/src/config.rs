//! Extract-layer configuration and the app token lookup.
//!
//! Configuration is resolved once, before any extract call, into an
//! immutable [`OpenDataConfig`] that the client holds by value.

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use crate::ConfigError;

pub const APP_TOKEN_VAR: &str = "OPEN_DATA_APP_TOKEN";
pub const DATA_TIMEOUT_VAR: &str = "OPEN_DATA_DATA_TIMEOUT_SECS";
pub const METADATA_TIMEOUT_VAR: &str = "OPEN_DATA_METADATA_TIMEOUT_SECS";

pub const DEFAULT_DATA_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(500);

#[derive(Clone, PartialEq, Eq)]
pub struct OpenDataConfig {
    app_token: Option<String>,
    data_timeout: Duration,
    metadata_timeout: Duration,
}

impl Default for OpenDataConfig {
    fn default() -> Self {
        Self {
            app_token: None,
            data_timeout: DEFAULT_DATA_TIMEOUT,
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }
}

impl OpenDataConfig {
    /// Load a local `.env` file if there is one, then read the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = |name: &str, default: Duration| {
            lookup(name)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            app_token: lookup(APP_TOKEN_VAR),
            data_timeout: timeout(DATA_TIMEOUT_VAR, DEFAULT_DATA_TIMEOUT),
            metadata_timeout: timeout(METADATA_TIMEOUT_VAR, DEFAULT_METADATA_TIMEOUT),
        }
    }

    pub fn with_app_token(mut self, token: impl Into<String>) -> Self {
        self.app_token = Some(token.into());
        self
    }

    pub fn with_data_timeout(mut self, timeout: Duration) -> Self {
        self.data_timeout = timeout;
        self
    }

    pub fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// Token sent as `X-App-Token` on data queries.
    pub fn app_token(&self) -> Result<&str, ConfigError> {
        match self.app_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::MissingAppToken {
                variable: APP_TOKEN_VAR,
            }),
        }
    }

    pub const fn data_timeout(&self) -> Duration {
        self.data_timeout
    }

    pub const fn metadata_timeout(&self) -> Duration {
        self.metadata_timeout
    }
}

impl Debug for OpenDataConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenDataConfig")
            .field("app_token", &self.app_token.as_ref().map(|_| "<redacted>"))
            .field("data_timeout", &self.data_timeout)
            .field("metadata_timeout", &self.metadata_timeout)
            .finish()
    }
}
