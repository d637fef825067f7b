//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - quest.toml (default configuration)
//! - quest.local.toml (git-ignored local overrides)
//! - Environment variables (QUEST_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # quest.toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [store]
//! path = "./quest.db"
//!
//! [program]
//! queries = ["a(X):-b(X),c(X);"]
//!
//! [program.schema]
//! a = ["string"]
//! b = ["string"]
//! c = ["string"]
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! QUEST_LOGGING__LEVEL=trace
//! QUEST_STORE__PATH=/tmp/other.db
//! ```

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::schema::QueryConfig;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Queries and schema registered for every run
    #[serde(default)]
    pub program: QueryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional log file; stderr when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Document store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding one document per relation
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. quest.toml (base configuration)
    /// 2. quest.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (QUEST_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("quest.toml"))
            .merge(Toml::file("quest.local.toml"))
            .merge(Env::prefixed("QUEST_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("QUEST_").split("__"))
            .extract()
    }

    /// Registered program, ready to hand to the engine
    pub fn query_config(&self) -> &QueryConfig {
        &self.program
    }
}
