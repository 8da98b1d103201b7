use std::{collections::HashMap, env, time::Duration};

use super::env::{
    AppConfig, ConfigError, CourtesyConfig, DirectoryConfig, FetchConfig, LogRotation,
    LoggingConfig, OutputConfig, RetryConfig,
};
use crate::platforms::registry;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
        };

        let rotation = match env::var("LOG_ROTATION") {
            Ok(value) => LogRotation::parse(&value).ok_or(ConfigError::Invalid {
                key: "LOG_ROTATION",
                value,
            })?,
            Err(_) => LogRotation::Daily,
        };
        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            file_name: env::var("LOG_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "access-checker.log".to_string()),
            rotation,
            ansi: env::var_os("NO_COLOR").is_none(),
        };

        let fetch = FetchConfig {
            timeout: Duration::from_millis(parse_num("FETCH_TIMEOUT_MS")?.unwrap_or(30_000)),
            user_agent: env::var("USER_AGENT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| format!("access-checker/{}", env!("CARGO_PKG_VERSION"))),
        };

        let max_attempts =
            parse_num::<u32>("RATE_LIMIT_MAX_ATTEMPTS")?.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }
        let retry = RetryConfig {
            max_attempts,
            cooldown_override: parse_num("RATE_LIMIT_COOLDOWN_MS")?.map(Duration::from_millis),
        };

        let courtesy = match env::var("COURTESY_DELAYS") {
            Ok(value) => CourtesyConfig {
                overrides: parse_delay_map(&value)?,
            },
            Err(_) => CourtesyConfig::default(),
        };

        let output = OutputConfig {
            write_bom: parse_bool("WRITE_BOM")?,
            ebook_package: parse_bool("EBOOK_PACKAGE")?,
        };

        Ok(Self {
            directories,
            logging,
            fetch,
            retry,
            courtesy,
            output,
        })
    }
}

/// Maps a platform code or legacy alias to the registered code.
pub fn canonical_code(code: &str) -> Result<&'static str, ConfigError> {
    registry()
        .resolve(code)
        .map(|platform| platform.code)
        .ok_or_else(|| ConfigError::UnknownPlatform(code.trim().to_string()))
}

/// Parses `code=millis;code=millis`. Codes may be aliases and are stored
/// under the registered code; empty segments are skipped.
pub fn parse_delay_map(value: &str) -> Result<HashMap<String, Duration>, ConfigError> {
    let mut overrides = HashMap::new();
    for part in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let invalid = || ConfigError::Invalid {
            key: "COURTESY_DELAYS",
            value: part.to_string(),
        };
        let (code, millis) = part.split_once('=').ok_or_else(invalid)?;
        let millis = millis.trim().parse::<u64>().map_err(|_| invalid())?;
        overrides.insert(canonical_code(code)?.to_string(), Duration::from_millis(millis));
    }
    Ok(overrides)
}

fn parse_num<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(None),
    }
}

fn parse_bool(key: &'static str) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "no" | "off" => Ok(false),
            "1" | "true" | "yes" | "on" => Ok(true),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_map_parses_codes_case_insensitively() {
        let map = parse_delay_map("SCID=3000; tandf = 5000;;").unwrap();
        assert_eq!(map.get("scid"), Some(&Duration::from_millis(3000)));
        assert_eq!(map.get("tandf"), Some(&Duration::from_millis(5000)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn delay_map_stores_aliases_under_registered_code() {
        let map = parse_delay_map("oso=250;UPO=300").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("upso"), Some(&Duration::from_millis(300)));
    }

    #[test]
    fn delay_map_rejects_unknown_platform() {
        let err = parse_delay_map("nope=100").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlatform(code) if code == "nope"));
    }

    #[test]
    fn rotation_names_parse() {
        assert_eq!(LogRotation::parse(" Hourly "), Some(LogRotation::Hourly));
        assert_eq!(LogRotation::parse("never"), Some(LogRotation::Never));
        assert_eq!(LogRotation::parse("weekly"), None);
    }

    #[test]
    fn delay_map_rejects_missing_millis() {
        let err = parse_delay_map("scid").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "COURTESY_DELAYS", .. }));
    }
}
