//! # Hydration Configuration
//!
//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `HYDRATION_*` environment variables (nested keys use `__`, for example
//! `HYDRATION_LOGGING__LEVEL=debug`).
//!
//! ```rust,no_run
//! use tasker_hydration::config::HydrationConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HydrationConfig::load()?;
//! println!("concurrent keys: {}", config.concurrent_keys);
//! # Ok(())
//! # }
//! ```

use crate::error::{HydrationError, HydrationResult};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Looked up relative to the working directory, extension detected by `config`
pub const DEFAULT_CONFIG_PATH: &str = "config/hydration";

pub const ENV_PREFIX: &str = "HYDRATION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    /// Resolve top-level specs concurrently when their head keys are distinct.
    ///
    /// Every spec sees the collection as it was before any of them ran, so a
    /// resolver must not read a sibling top-level key while this is enabled.
    pub concurrent_keys: bool,
    /// Deepest nested spec accepted, an atomic key being depth 1
    pub max_spec_depth: usize,
    /// Relation ids with no matching entity hydrate to `null` instead of staying absent
    pub fetch_missing_as_null: bool,
    pub logging: LoggingConfig,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            concurrent_keys: false,
            max_spec_depth: 8,
            fetch_missing_as_null: true,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `tasker_hydration=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl HydrationConfig {
    /// Load from `config/hydration.*` (if present) and the environment
    pub fn load() -> HydrationResult<Self> {
        Self::build(None, None)
    }

    /// Load from an explicit file (required to exist) and the environment
    pub fn load_from_file(path: &Path) -> HydrationResult<Self> {
        Self::build(Some(path), None)
    }

    fn build(path: Option<&Path>, env: Option<HashMap<String, String>>) -> HydrationResult<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: HydrationConfig = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(config = ?config, "Hydration configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> HydrationResult<()> {
        if self.max_spec_depth == 0 {
            return Err(HydrationError::Configuration(
                "max_spec_depth must be at least 1".to_string(),
            ));
        }
        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            HydrationError::Configuration(format!(
                "invalid logging.level '{}': {e}",
                self.logging.level
            ))
        })?;
        Ok(())
    }
}
