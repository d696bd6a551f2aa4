//! Host configuration for bulkgen
//!
//! The CLI reads its engine limits from a TOML file. A missing file means
//! defaults; only present keys override them.
//!
//! # Location
//!
//! 1. `--config PATH` on the command line
//! 2. the `BULKGEN_CONFIG` environment variable
//! 3. the default location:
//!    - Unix/macOS: `~/.bulkgen/config.toml`
//!    - Windows: `%LOCALAPPDATA%\bulkgen\config.toml`
//!
//! # Format
//!
//! ```toml
//! [generator]
//! # Deepest allowed nesting of node definitions
//! max_depth = 64
//! # "drop" or "reject" generate keys missing from the field schema
//! unknown_fields = "drop"
//! # Refuse to print trees with more nodes than this
//! max_nodes = 100000
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES};
use crate::core::BulkError;
use crate::fields::UnknownFieldPolicy;
use crate::generator::GeneratorOptions;

/// Contents of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Engine limits
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// The `[generator]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Deepest allowed nesting of node definitions
    pub max_depth: usize,

    /// Handling of `generate` keys missing from the field schema
    pub unknown_fields: UnknownFieldPolicy,

    /// Most nodes one generate request may produce
    pub max_nodes: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            unknown_fields: UnknownFieldPolicy::default(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl Config {
    /// Load from `path`, or from the environment override or default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if a value is out of range.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match std::env::var_os(CONFIG_PATH_ENV) {
                Some(path) => PathBuf::from(path),
                None => Self::default_path()?,
            },
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or has
    /// out-of-range values.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate().with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Default configuration file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("bulkgen")
        } else {
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?.join(".bulkgen")
        };

        Ok(config_dir.join("config.toml"))
    }

    fn validate(&self) -> std::result::Result<(), BulkError> {
        if self.generator.max_depth == 0 {
            return Err(BulkError::Config {
                message: "generator.max_depth must be at least 1".to_string(),
            });
        }
        if self.generator.max_nodes == 0 {
            return Err(BulkError::Config {
                message: "generator.max_nodes must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Engine options from the `[generator]` table.
    #[must_use]
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            max_depth: self.generator.max_depth,
            unknown_fields: self.generator.unknown_fields,
            max_nodes: self.generator.max_nodes,
        }
    }
}
