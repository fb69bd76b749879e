use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure for Djinn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Movie dataset configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Poll workflow configuration
    #[serde(default)]
    pub poll: PollConfig,

    /// Command argument limits
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` movie dataset
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".djinn/movies.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// `sqlite:` URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation policy for the log file: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Poll workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollConfig {
    /// Seconds to wait between publishing candidates and counting votes
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    /// Reaction symbol that counts as a vote
    #[serde(default = "default_vote_symbol")]
    pub vote_symbol: String,
}

const fn default_wait_secs() -> u64 {
    600
}

fn default_vote_symbol() -> String {
    "\u{1F44D}".to_string()
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            wait_secs: default_wait_secs(),
            vote_symbol: default_vote_symbol(),
        }
    }
}

impl PollConfig {
    pub const fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

/// Bounds for the amount argument of `fetch` and `poll`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandsConfig {
    /// Amount used when a command does not give one
    #[serde(default = "default_amount")]
    pub default_amount: u32,

    /// Smallest accepted amount (inclusive)
    #[serde(default = "default_min_amount")]
    pub min_amount: u32,

    /// Largest accepted amount (inclusive)
    #[serde(default = "default_max_amount")]
    pub max_amount: u32,
}

const fn default_amount() -> u32 {
    3
}

const fn default_min_amount() -> u32 {
    1
}

const fn default_max_amount() -> u32 {
    10
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            default_amount: default_amount(),
            min_amount: default_min_amount(),
            max_amount: default_max_amount(),
        }
    }
}
