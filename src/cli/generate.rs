//! Expand a schema and print the generated tree.
//!
//! # Examples
//!
//! ```bash
//! bulkgen generate locations.yaml
//! bulkgen generate locations.yaml --preset stock-location --format tree
//! bulkgen generate parts.json --fields fields.json --strict --parent parent.json
//! ```

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::common::{FieldArgs, read_document, read_schema};
use crate::config::Config;
use crate::fields::UnknownFieldPolicy;
use crate::generator::{BulkGenerator, GeneratedNode, count_nodes};

/// Output format of `generate`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Nested `[fields, children]` pairs
    Json,
    /// Same structure as YAML
    Yaml,
    /// Human-readable tree of node names
    Tree,
}

/// Command to expand a schema
#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Schema file (JSON or YAML)
    schema: PathBuf,

    #[command(flatten)]
    fields: FieldArgs,

    /// Parent context file (JSON or YAML), visible as `par` at the top level
    #[arg(long, value_name = "FILE")]
    parent: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Reject `generate` keys missing from the field schema
    #[arg(long)]
    strict: bool,

    /// Deepest allowed nesting, overrides the configuration
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
}

impl GenerateCommand {
    pub async fn execute(self, config: &Config) -> Result<()> {
        let output = self.run(config).await?;
        print!("{output}");
        Ok(())
    }

    /// Generate and format the tree.
    pub async fn run(&self, config: &Config) -> Result<String> {
        let schema = read_schema(&self.schema).await?;
        let selected = self.fields.load().await?;

        let parent: Value = match (&self.parent, &selected.preset) {
            (Some(path), _) => read_document(path).await?,
            (None, Some(preset)) => preset.placeholder_parent(),
            (None, None) => Value::Object(Map::new()),
        };

        let mut options = config.generator_options();
        if self.strict {
            options.unknown_fields = UnknownFieldPolicy::Reject;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }

        let mut generator = BulkGenerator::new(schema).with_options(options);
        if let Some(fields) = selected.fields {
            generator = generator.with_fields(fields);
        }

        let nodes = generator
            .generate_with_parent(parent)
            .with_context(|| format!("Failed to generate {}", self.schema.display()))?;

        tracing::debug!("Generated {} nodes from {}", count_nodes(&nodes), self.schema.display());

        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&nodes)? + "\n"),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(&nodes)?),
            OutputFormat::Tree => Ok(format_tree(&nodes)),
        }
    }
}

/// Display label of a node: its `name` field, else its fields as JSON.
fn node_label(node: &GeneratedNode) -> String {
    match node.fields.get("name") {
        Some(Value::String(name)) => name.clone(),
        _ => Value::Object(node.fields.clone()).to_string(),
    }
}

fn format_nodes(nodes: &[GeneratedNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(&format!("{}{}{}\n", prefix, connector, node_label(node)));

        let child_prefix = if is_last { format!("{prefix}    ") } else { format!("{prefix}│   ") };
        format_nodes(&node.children, &child_prefix, out);
    }
}

/// Render nodes as an indented tree.
#[must_use]
pub fn format_tree(nodes: &[GeneratedNode]) -> String {
    if nodes.is_empty() {
        return "No nodes generated.\n".to_string();
    }
    let mut out = String::new();
    format_nodes(nodes, "", &mut out);
    out.push_str(&format!("\n{} nodes\n", count_nodes(nodes)));
    out
}
