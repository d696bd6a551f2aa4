//! Helpers shared by the CLI commands.

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::fields::{FieldMap, Preset, preset, presets};
use crate::schema::{DocumentFormat, Schema, parse_document};
use crate::utils::did_you_mean;

/// Read a JSON or YAML document, picking the format from the extension.
pub async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).await.with_context(|| format!("Failed to read {}", path.display()))?;
    parse_document(&content, DocumentFormat::from_path(path)).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read and shape-check a schema file.
pub async fn read_schema(path: &Path) -> Result<Schema> {
    let content =
        fs::read_to_string(path).await.with_context(|| format!("Failed to read schema {}", path.display()))?;
    let schema = Schema::parse(&content, DocumentFormat::from_path(path))
        .with_context(|| format!("Failed to parse schema {}", path.display()))?;
    tracing::debug!("Loaded schema {} (v{})", path.display(), schema.version);
    Ok(schema)
}

/// Look up a preset, suggesting the closest name when it does not exist.
pub fn find_preset(name: &str) -> Result<Preset> {
    preset(name).ok_or_else(|| {
        let all = presets();
        let names: Vec<&str> = all.iter().map(|p| p.name).collect();
        match did_you_mean(name, names.iter().copied()) {
            Some(closest) => anyhow::anyhow!("Unknown preset '{}'. Did you mean '{}'?", name, closest),
            None => anyhow::anyhow!("Unknown preset '{}'. Available presets: {}", name, names.join(", ")),
        }
    })
}

/// Where the field schema of a command comes from
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Field schema file (JSON or YAML) checked against `generate`
    #[arg(long, value_name = "FILE", conflicts_with = "preset")]
    pub fields: Option<PathBuf>,

    /// Built-in field schema (stock-location, part-category, part)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,
}

/// Field schema selected on the command line
#[derive(Debug, Clone, Default)]
pub struct SelectedFields {
    pub fields: Option<FieldMap>,
    pub preset: Option<Preset>,
}

impl FieldArgs {
    /// Load the selected field schema, if any.
    pub async fn load(&self) -> Result<SelectedFields> {
        if let Some(path) = &self.fields {
            let fields: FieldMap = read_document(path).await?;
            return Ok(SelectedFields {
                fields: Some(fields),
                preset: None,
            });
        }
        if let Some(name) = &self.preset {
            let preset = find_preset(name)?;
            return Ok(SelectedFields {
                fields: Some(preset.fields.clone()),
                preset: Some(preset),
            });
        }
        Ok(SelectedFields::default())
    }
}
