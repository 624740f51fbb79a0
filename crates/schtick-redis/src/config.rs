use std::time::Duration;

use thiserror::Error;

pub const ENV_REDIS_URL: &str = "SCHTICK_REDIS_URL";
pub const ENV_REDIS_TIMEOUT_MS: &str = "SCHTICK_REDIS_TIMEOUT_MS";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedisConfigError {
    #[error("redis url is empty")]
    EmptyUrl,
    #[error("invalid redis timeout: {0} (expected milliseconds > 0)")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub url: String,
    /// Upper bound on every single store call, connecting included.
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379")
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), RedisConfigError> {
        if self.url.trim().is_empty() {
            return Err(RedisConfigError::EmptyUrl);
        }
        if self.timeout_ms == 0 {
            return Err(RedisConfigError::InvalidTimeout("0".into()));
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, RedisConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RedisConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(ENV_REDIS_URL) {
            Some(url) => Self::new(url),
            None => Self::default(),
        };
        if let Some(raw) = lookup(ENV_REDIS_TIMEOUT_MS) {
            cfg.timeout_ms = raw
                .trim()
                .parse()
                .map_err(|_| RedisConfigError::InvalidTimeout(raw.clone()))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
