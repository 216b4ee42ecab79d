//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - relq.toml (default configuration)
//! - relq.local.toml (git-ignored local overrides)
//! - Environment variables (RELQ_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # relq.toml
//! [limits]
//! max_result_rows = 100000
//! max_intermediate_rows = 1000000
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! RELQ_LIMITS__MAX_RESULT_ROWS=500
//! RELQ_LOGGING__LEVEL=trace
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::execution::ResourceLimits;

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Resource limits applied via [`crate::Query::evaluate_with`]
    #[serde(default)]
    pub limits: ResourceLimits,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default file locations and environment
    pub fn load() -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Toml::file("relq.toml"))
            .merge(Toml::file("relq.local.toml"))
            .merge(Env::prefixed("RELQ_").split("__"))
            .extract()
    }

    /// Load configuration from an explicit TOML file plus environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("RELQ_").split("__"))
            .extract()
    }

    /// Render the configuration as TOML, e.g. for writing a starter file
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
