//! # Configuration
//!
//! Settings for the batch orchestrator, layered with the `config` crate:
//!
//! 1. built-in defaults
//! 2. an optional TOML file: `config/batch-orchestrator.toml`, or the path in
//!    `BATCH_ORCHESTRATOR_CONFIG`
//! 3. environment variables such as
//!    `BATCH_ORCHESTRATOR__EXECUTION__MAX_BATCH_SIZE=50`

pub mod error;

pub use error::{ConfigResult, ConfigurationError};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "config/batch-orchestrator.toml";
pub const CONFIG_PATH_ENV: &str = "BATCH_ORCHESTRATOR_CONFIG";
pub const ENV_PREFIX: &str = "BATCH_ORCHESTRATOR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Largest accepted batch; 0 disables the limit
    pub max_batch_size: usize,
    /// Mode used when the caller does not pass `enclosingTransaction`
    pub enclosing_transaction_by_default: bool,
    /// Restrict explicit `${id}` targets to the declared reference
    pub strict_references: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 200,
            enclosing_transaction_by_default: false,
            strict_references: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_seconds: 30,
        }
    }
}

impl BatchConfig {
    /// Load from the default locations and the process environment
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load with an explicit file. A file given here must exist; without one
    /// the default path is used if present.
    pub fn load_from(path: Option<&Path>) -> ConfigResult<Self> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment map in place of the process
    /// environment
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> ConfigResult<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false),
        };

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(
            max_batch_size = config.execution.max_batch_size,
            strict_references = config.execution.strict_references,
            database_configured = config.database.url.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "logging.level",
                "logging configuration",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        Ok(())
    }
}
