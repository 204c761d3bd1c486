//! Server configuration.
//!
//! Every option can be given on the command line or through a `MATINEE_*`
//! environment variable.

use std::time::Duration;

use clap::Args;
use thiserror::Error;

use crate::domain::ContentId;

/// Upper bound for `--clock-ttl-secs` (30 days)
pub const MAX_CLOCK_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("token secret must not be empty (set --token-secret or MATINEE_TOKEN_SECRET)")]
    EmptySecret,
    #[error("store timeout must be greater than zero")]
    ZeroStoreTimeout,
    #[error("clock TTL must be greater than zero")]
    ZeroClockTtl,
    #[error("clock TTL must not exceed {max_secs} seconds")]
    ClockTtlTooLong { max_secs: u64 },
    #[error("invalid content id '{0}'")]
    InvalidContentId(String),
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "MATINEE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "MATINEE_PORT", default_value = "8080")]
    pub port: u16,

    /// Shared secret used to verify signed access tokens
    #[arg(long, env = "MATINEE_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: String,

    /// Deadline for every room store / sync cache call, in milliseconds
    #[arg(long, env = "MATINEE_STORE_TIMEOUT_MS", default_value = "2000")]
    pub store_timeout_ms: u64,

    /// How long a cached sync clock survives without updates, in seconds
    #[arg(long, env = "MATINEE_CLOCK_TTL_SECS", default_value = "86400")]
    pub clock_ttl_secs: u64,

    /// Content ids rooms may be created for (comma separated); empty accepts any id
    #[arg(long = "content", env = "MATINEE_CONTENT", value_delimiter = ',')]
    pub content: Vec<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::ZeroStoreTimeout);
        }
        if self.clock_ttl_secs == 0 {
            return Err(ConfigError::ZeroClockTtl);
        }
        if self.clock_ttl_secs > MAX_CLOCK_TTL_SECS {
            return Err(ConfigError::ClockTtlTooLong {
                max_secs: MAX_CLOCK_TTL_SECS,
            });
        }
        self.content_ids()?;
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn clock_ttl(&self) -> Duration {
        Duration::from_secs(self.clock_ttl_secs)
    }

    pub fn content_ids(&self) -> Result<Vec<ContentId>, ConfigError> {
        self.content
            .iter()
            .map(|id| {
                ContentId::new(id.trim().to_string())
                    .map_err(|_| ConfigError::InvalidContentId(id.clone()))
            })
            .collect()
    }
}
