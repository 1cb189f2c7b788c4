use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_rounds: {0}. Must be between 1 and 20")]
    InvalidMaxRounds(u32),

    #[error("Invalid fan_out: {0}. Must be between 1 and 8")]
    InvalidFanOut(usize),

    #[error("Invalid concurrency_limit: {0}. Must be at least 1")]
    InvalidConcurrencyLimit(usize),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than or equal to max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .magellan/config.yaml (project config)
    /// 3. .magellan/local.yaml (project local overrides, optional)
    /// 4. Environment variables (MAGELLAN_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".magellan/config.yaml"))
            .merge(Yaml::file(".magellan/local.yaml"))
            .merge(Env::prefixed("MAGELLAN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.research.max_rounds == 0 || config.research.max_rounds > 20 {
            return Err(ConfigError::InvalidMaxRounds(config.research.max_rounds));
        }

        if config.research.fan_out == 0 || config.research.fan_out > 8 {
            return Err(ConfigError::InvalidFanOut(config.research.fan_out));
        }

        if config.research.concurrency_limit == 0 {
            return Err(ConfigError::InvalidConcurrencyLimit(
                config.research.concurrency_limit,
            ));
        }

        for bucket in [&config.rate_limit.completion, &config.rate_limit.search] {
            if bucket.requests_per_second <= 0.0 {
                return Err(ConfigError::InvalidRateLimit(bucket.requests_per_second));
            }
            if bucket.burst_size == 0 {
                return Err(ConfigError::InvalidBurstSize(bucket.burst_size));
            }
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_with(mutate: impl FnOnce(&mut Config)) -> Config {
        let mut config = Config::default();
        mutate(&mut config);
        config
    }

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_zero_max_rounds() {
        let config = config_with(|c| c.research.max_rounds = 0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRounds(0))
        ));
    }

    #[test]
    fn test_rejects_oversized_fan_out() {
        let config = config_with(|c| c.research.fan_out = 50);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidFanOut(50))
        ));
    }

    #[test]
    fn test_rejects_inverted_backoff() {
        let config = config_with(|c| {
            c.retry.initial_backoff_ms = 5000;
            c.retry.max_backoff_ms = 1000;
        });
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(5000, 1000))
        ));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "research:\n  max_rounds: 5\n  fan_out: 4\nlogging:\n  level: debug"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.research.max_rounds, 5);
        assert_eq!(config.research.fan_out, 4);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep defaults
        assert_eq!(config.research.concurrency_limit, 4);
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "research:\n  max_rounds: 0").unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }
}
