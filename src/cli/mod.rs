//! Command-line interface for bulkgen.
//!
//! # Commands
//!
//! - `generate` - expand a schema and print the generated tree
//! - `validate` - check a schema without expanding it
//! - `dimension` - resolve a single dimension string
//! - `fields` - print the built-in field schemas
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - errors only
//! - `--config` / `-c` - configuration file (see [`crate::config`])
//!
//! # Examples
//!
//! ```bash
//! # Preview a schema as a tree
//! bulkgen generate shelves.yaml --format tree
//!
//! # Check a part schema against the part fields
//! bulkgen validate parts.yaml --preset part --strict
//!
//! # Try out a dimension string
//! bulkgen dimension "*ALPHA(casing=upper)" --count 5
//! ```

pub mod common;
pub mod dimension;
pub mod fields;
pub mod generate;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Settings derived from the global flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter; `None` keeps `RUST_LOG` (or `warn`)
    pub log_level: Option<String>,

    /// Configuration file given with `--config`
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).try_init();
    }
}

/// Declarative tree generator
#[derive(Parser, Debug)]
#[command(name = "bulkgen", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "BULKGEN_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Expand a schema and print the generated tree
    Generate(generate::GenerateCommand),

    /// Check a schema without expanding it
    Validate(validate::ValidateCommand),

    /// Resolve a dimension string
    Dimension(dimension::DimensionCommand),

    /// Print the built-in field schemas
    Fields(fields::FieldsCommand),
}

impl Cli {
    /// Settings of the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    pub async fn execute_with_config(self, cli_config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Dimension(cmd) => cmd.execute().await,
            Commands::Fields(cmd) => cmd.execute().await,
            Commands::Generate(cmd) => {
                let config = Config::load_with_optional(cli_config.config_path).await?;
                cmd.execute(&config).await
            }
            Commands::Validate(cmd) => {
                let config = Config::load_with_optional(cli_config.config_path).await?;
                cmd.execute(&config).await
            }
        }
    }
}
