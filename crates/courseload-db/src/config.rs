//! Configuration for the course catalog store and its logging
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use crate::db::RetryPolicy;

/// Default location of the database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "courseload.db";

/// Top-level configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DbConfig,
    pub logging: LoggingConfig,
}

/// Where the store lives and how hard to try opening it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub path: PathBuf,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `"json"` for structured output, anything else for the human-readable format
    pub format: String,
}

impl Config {
    /// Loads configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the config file
    ///
    /// # Returns
    /// * `Ok(Config)` - Parsed configuration, with defaults for missing fields
    /// * `Err` - If the file can't be read or isn't valid JSON
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

impl DbConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            max_attempts: 5,
            base_delay_ms: 100,
        }
    }
}

impl LoggingConfig {
    /// Installs the global tracing subscriber. `RUST_LOG` takes precedence over `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).init(),
            _ => fmt().with_env_filter(filter).init(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}
