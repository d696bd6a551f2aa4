//! Common test utilities for bulkgen integration tests
//!
//! Schema construction helpers for engine tests and a temporary project
//! directory for running the `bulkgen` binary.

// Allow dead code because these utilities are used across different test files
// and not all utilities are used in every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use bulkgen_cli::constants::ENGINE_VERSION;
use bulkgen_cli::fields::{FieldDefinition, FieldMap};
use bulkgen_cli::generator::{BulkGenerator, GeneratedNode};
use bulkgen_cli::schema::Schema;

/// Builder for schema documents
///
/// ```rust,ignore
/// let schema = SchemaBuilder::new()
///     .input("prefix", "D")
///     .output(json!({"dimensions": ["1-3"], "generate": {"name": "{{ inp.prefix }}{{ dim.1 }}"}}))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    version: String,
    input: serde_json::Map<String, Value>,
    templates: Vec<Value>,
    output: Value,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            version: ENGINE_VERSION.to_string(),
            input: serde_json::Map::new(),
            templates: Vec::new(),
            output: json!({}),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn input(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.input.insert(key.to_string(), value.into());
        self
    }

    /// Add a named template; `definition` must not contain `name`.
    pub fn template(mut self, name: &str, definition: Value) -> Self {
        let mut template = definition;
        if let Value::Object(map) = &mut template {
            map.insert("name".to_string(), json!(name));
        }
        self.templates.push(template);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.output = output;
        self
    }

    pub fn to_value(&self) -> Value {
        json!({
            "version": self.version,
            "input": self.input,
            "templates": self.templates,
            "output": self.output,
        })
    }

    pub fn build(&self) -> Schema {
        Schema::from_value(self.to_value()).expect("schema should be well-formed")
    }

    pub fn generator(&self) -> BulkGenerator {
        BulkGenerator::new(self.build())
    }
}

/// Field map of text fields with the given keys.
pub fn text_fields(keys: &[&str]) -> FieldMap {
    keys.iter().map(|key| (key.to_string(), FieldDefinition::text(*key))).collect()
}

/// Field map from `(key, definition)` pairs.
pub fn field_map(entries: Vec<(&str, FieldDefinition)>) -> FieldMap {
    entries.into_iter().map(|(key, field)| (key.to_string(), field)).collect()
}

/// `fields` of the nodes as JSON values.
pub fn records(nodes: &[GeneratedNode]) -> Vec<Value> {
    nodes.iter().map(|node| Value::Object(node.fields.clone())).collect()
}

/// A temporary directory for CLI tests
pub struct TestProject {
    temp_dir: TempDir,
}

/// Captured result of a `bulkgen` run
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new().context("Failed to create temp dir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` inside the project and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a schema as JSON.
    pub fn write_schema(&self, name: &str, schema: &SchemaBuilder) -> Result<PathBuf> {
        self.write_file(name, &serde_json::to_string_pretty(&schema.to_value())?)
    }

    /// Run `bulkgen` in the project directory with an isolated configuration.
    pub fn run_bulkgen(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::cargo_bin("bulkgen")?
            .current_dir(self.path())
            .env("BULKGEN_CONFIG", self.path().join("config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .context("Failed to run bulkgen")?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
