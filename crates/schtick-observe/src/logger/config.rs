use std::io::IsTerminal;

use crate::logger::{error::LoggerError, format::LoggerFormat};

pub const ENV_LOG_FORMAT: &str = "SCHTICK_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "SCHTICK_LOG_LEVEL";
pub const ENV_LOG_COLOR: &str = "SCHTICK_LOG_COLOR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `schtick_core=debug,info`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stdout().is_terminal();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

impl LoggerConfig {
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            cfg.format = format.parse()?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            if level.trim().is_empty() {
                return Err(LoggerError::InvalidFilter {
                    filter: level,
                    reason: "empty".into(),
                });
            }
            cfg.level = level;
        }
        if let Some(color) = lookup(ENV_LOG_COLOR) {
            cfg.use_color = matches!(color.trim(), "1" | "true" | "yes" | "on");
        }
        Ok(cfg)
    }
}
