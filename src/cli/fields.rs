//! Print the built-in field schemas as JSON.

use anyhow::Result;
use clap::Args;

use super::common::find_preset;
use crate::fields::presets;

/// Command to show field presets
#[derive(Args, Debug)]
pub struct FieldsCommand {
    /// Only show this preset
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,
}

impl FieldsCommand {
    pub async fn execute(self) -> Result<()> {
        println!("{}", self.run()?);
        Ok(())
    }

    pub fn run(&self) -> Result<String> {
        let output = match &self.preset {
            Some(name) => serde_json::to_string_pretty(&find_preset(name)?)?,
            None => serde_json::to_string_pretty(&presets())?,
        };
        Ok(output)
    }
}
