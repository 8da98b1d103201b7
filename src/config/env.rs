use std::{collections::HashMap, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub fetch: FetchConfig,
    pub retry: RetryConfig,
    pub courtesy: CourtesyConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Prefix of the rolling log file inside `LOGS_DIR`.
    pub file_name: String,
    pub rotation: LogRotation,
    pub ansi: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl LogRotation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "never" | "none" => Some(Self::Never),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub cooldown_override: Option<Duration>,
}

/// Per-platform courtesy delay overrides, keyed by canonical platform code.
#[derive(Debug, Clone, Default)]
pub struct CourtesyConfig {
    pub overrides: HashMap<String, Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub write_bom: bool,
    pub ebook_package: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("unknown platform code: {0}")]
    UnknownPlatform(String),
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            directories: DirectoryConfig {
                logs_dir: "logs".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_name: "access-checker.log".to_string(),
                rotation: LogRotation::Daily,
                ansi: false,
            },
            fetch: FetchConfig {
                timeout: Duration::from_secs(1),
                user_agent: "access-checker/test".to_string(),
            },
            retry: RetryConfig {
                max_attempts: 5,
                cooldown_override: None,
            },
            courtesy: CourtesyConfig::default(),
            output: OutputConfig::default(),
        }
    }
}
