//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod gateway;
mod lock;
mod server;

pub use gateway::HotelGatewayConfig;
pub use lock::LockConfig;
pub use server::ServerConfig;

use serde::Deserialize;

use crate::storage::StorageConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "STAYLOCK_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "STAYLOCK";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "STAYLOCK_LOG";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Hotel gateway configuration (booking side).
    pub hotel: HotelGatewayConfig,
    /// Lock engine configuration (hotel side).
    pub lock: LockConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        // Add config file from path argument if provided
        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        // Add config file from CONFIG_ENV_VAR env var if set
        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            // Environment variables with CONFIG_ENV_PREFIX prefix
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.booking_port, 8181);
        assert_eq!(config.server.hotel_port, 8282);
        assert_eq!(config.hotel.max_retries, 3);
        assert_eq!(config.lock.hold_ttl_minutes, 15);
    }

    #[test]
    fn test_config_for_test() {
        let config = Config::for_test();
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
