//! Check a schema without expanding it.
//!
//! Runs the version gate, applies input and compiles every template of every
//! reachable node definition. With a field schema, missing required fields
//! are reported together.
//!
//! ```bash
//! bulkgen validate locations.yaml --preset stock-location
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{FieldArgs, read_schema};
use crate::config::Config;
use crate::fields::UnknownFieldPolicy;
use crate::generator::BulkGenerator;

/// Command to validate a schema
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Schema file (JSON or YAML)
    schema: PathBuf,

    #[command(flatten)]
    fields: FieldArgs,

    /// Reject `generate` keys missing from the field schema
    #[arg(long)]
    strict: bool,
}

impl ValidateCommand {
    pub async fn execute(self, config: &Config) -> Result<()> {
        let schema = read_schema(&self.schema).await?;
        let selected = self.fields.load().await?;

        let mut options = config.generator_options();
        if self.strict {
            options.unknown_fields = UnknownFieldPolicy::Reject;
        }

        let mut generator = BulkGenerator::new(schema).with_options(options);
        if let Some(fields) = selected.fields {
            generator = generator.with_fields(fields);
        }
        generator.validate().with_context(|| format!("Invalid schema {}", self.schema.display()))?;

        println!("{} {} is valid", "✓".green(), self.schema.display());
        Ok(())
    }
}
