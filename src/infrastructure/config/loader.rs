use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project configuration file, created by `djinn init`.
pub const DEFAULT_CONFIG_PATH: &str = ".djinn/config.yaml";

/// Prefix of environment overrides, e.g. `DJINN_POLL__WAIT_SECS=60`.
pub const ENV_PREFIX: &str = "DJINN_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid poll wait_secs: {0}. Must be at least 1")]
    InvalidWaitSecs(u64),

    #[error("Vote symbol cannot be empty")]
    EmptyVoteSymbol,

    #[error("Invalid amount bounds: need 1 <= min ({min}) <= default ({default}) <= max ({max})")]
    InvalidAmountBounds { min: u32, default: u32, max: u32 },
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the project configuration.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .djinn/config.yaml (project config, created by init)
    /// 3. .djinn/local.yaml (local overrides, optional)
    /// 4. Environment variables (DJINN_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        Self::load_layered(DEFAULT_CONFIG_PATH)
    }

    /// Same layering as [`load`](Self::load) with the project file at `path`.
    /// `local.yaml` is looked up next to it.
    pub fn load_layered(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Yaml::file(path.with_file_name("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a single file, without local or env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
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
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
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

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.poll.wait_secs == 0 {
            return Err(ConfigError::InvalidWaitSecs(config.poll.wait_secs));
        }

        if config.poll.vote_symbol.trim().is_empty() {
            return Err(ConfigError::EmptyVoteSymbol);
        }

        let commands = &config.commands;
        if commands.min_amount == 0
            || commands.min_amount > commands.default_amount
            || commands.default_amount > commands.max_amount
        {
            return Err(ConfigError::InvalidAmountBounds {
                min: commands.min_amount,
                default: commands.default_amount,
                max: commands.max_amount,
            });
        }

        Ok(())
    }
}
