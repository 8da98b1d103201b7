pub mod env;
mod loader;

pub use env::{AppConfig, ConfigError, DirectoryConfig, FetchConfig, LogRotation, LoggingConfig};
pub use loader::canonical_code;
pub use loader::load_config;
