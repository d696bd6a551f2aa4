//! Schema model of a generation request.
//!
//! A schema describes a tree of repeating naming patterns:
//!
//! ```yaml
//! version: "1.0.0"
//! input:
//!   prefix: "D"
//! templates:
//!   - name: "Drawer"
//!     dimensions: ["*NUMERIC"]
//!     count: [2]
//!     generate:
//!       name: "{{ par.gen.name }}.{{ dim.1 }}"
//! output:
//!   dimensions: ["A-E"]
//!   generate:
//!     name: "{{ inp.prefix }}{{ dim.1 }}"
//!   childs:
//!     - extends: "Drawer"
//! ```
//!
//! - `version` - semantic version; its major component must match the engine's
//! - `input` - scalar values exposed to every template as `inp`
//! - `templates` - named [`NodeTemplate`]s, only used through `extends`
//! - `output` - the root [`NodeDefinition`]
//!
//! Documents are read from JSON or YAML with [`Schema::parse`]. Shape
//! errors name the offending location, e.g. `output.childs[0].count[1]`.

mod merge;

pub use merge::{apply_base_child, merge};

use indexmap::IndexMap;
use serde::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::core::{BulkError, Result};
use crate::templating::{TemplateEngine, context::input_vars};

/// Top-level generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Semantic version the schema was written for
    pub version: String,

    /// Input values, exposed to templates as `inp`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub input: IndexMap<String, Value>,

    /// Named templates referenced by `extends`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<NodeTemplate>,

    /// Root node definition
    pub output: NodeDefinition,
}

/// One level of the generation tree
///
/// Every field is optional in documents. After `extends` and base-child
/// merging, `parent_name_match` defaults to `"true"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Name of a [`NodeTemplate`] to inherit from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// `{% set %}` template rendered once per instance, exposed as `global`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_context: Option<String>,

    /// Dimension strings, one per axis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,

    /// Optional per-axis counts, aligned with `dimensions`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub count: Vec<Option<CountSpec>>,

    /// Field templates
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub generate: IndexMap<String, GenerateValue>,

    /// Template deciding whether this definition applies to a parent instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name_match: Option<String>,

    /// Base definition merged into every entry of `childs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<NodeDefinition>>,

    /// Child definitions, the first matching one is expanded per instance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub childs: Vec<NodeDefinition>,
}

/// A named node definition used as `extends` source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Unique template name
    pub name: String,

    /// The inherited definition
    #[serde(flatten)]
    pub definition: NodeDefinition,
}

/// Count entry of one axis
///
/// Integers are used as they are; text is rendered against `inp` first and
/// must then be empty (no count) or a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountSpec {
    Number(u64),
    Text(String),
}

impl CountSpec {
    /// Whether this entry is overridable by a template's entry.
    ///
    /// Only an empty text counts as empty; an explicit `0` is kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, CountSpec::Text(text) if text.trim().is_empty())
    }

    /// The numeric count, `None` for an empty text.
    pub fn resolve(&self) -> std::result::Result<Option<usize>, String> {
        match self {
            CountSpec::Number(n) => usize::try_from(*n).map(Some).map_err(|e| e.to_string()),
            CountSpec::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<usize>()
                    .map(Some)
                    .map_err(|_| format!("count must be a non-negative integer, got '{text}'"))
            }
        }
    }
}

/// Template structure of a `generate` entry
///
/// Numbers and booleans in documents are read as their template text; `null`
/// is an empty template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerateValue {
    Leaf(String),
    List(Vec<GenerateValue>),
    Object(IndexMap<String, GenerateValue>),
}

impl GenerateValue {
    /// Whether this is a leaf with an empty template.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, GenerateValue::Leaf(text) if text.is_empty())
    }

    /// Short description of the structure, used in error messages.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            GenerateValue::Leaf(_) => "a template",
            GenerateValue::List(_) => "a list",
            GenerateValue::Object(_) => "a mapping",
        }
    }
}

impl From<&str> for GenerateValue {
    fn from(value: &str) -> Self {
        GenerateValue::Leaf(value.to_string())
    }
}

impl From<Value> for GenerateValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => GenerateValue::Leaf(String::new()),
            Value::Bool(b) => GenerateValue::Leaf(b.to_string()),
            Value::Number(n) => GenerateValue::Leaf(n.to_string()),
            Value::String(s) => GenerateValue::Leaf(s),
            Value::Array(items) => GenerateValue::List(items.into_iter().map(GenerateValue::from).collect()),
            Value::Object(map) => {
                GenerateValue::Object(map.into_iter().map(|(k, v)| (k, GenerateValue::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for GenerateValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(GenerateValue::from)
    }
}

/// Document format of a schema or field file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a file extension; anything but `.json` is YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Deserialize a document, reporting the failing location on error.
pub fn parse_document<T: serde::de::DeserializeOwned>(content: &str, format: DocumentFormat) -> Result<T> {
    let shape_error = |path: String, reason: String| BulkError::SchemaShapeInvalid {
        path,
        reason,
    };
    match format {
        DocumentFormat::Json => {
            let de = &mut serde_json::Deserializer::from_str(content);
            serde_path_to_error::deserialize::<_, T>(de)
                .map_err(|err| shape_error(err.path().to_string(), err.into_inner().to_string()))
        }
        DocumentFormat::Yaml => {
            let de = serde_yaml::Deserializer::from_str(content);
            serde_path_to_error::deserialize::<_, T>(de)
                .map_err(|err| shape_error(err.path().to_string(), err.into_inner().to_string()))
        }
    }
}

impl Schema {
    /// Parse a schema document.
    ///
    /// # Errors
    ///
    /// [`BulkError::SchemaShapeInvalid`] if the document does not describe a
    /// schema or an input value is not a scalar.
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        let schema: Schema = parse_document(content, format)?;
        schema.check_shape()?;
        Ok(schema)
    }

    /// Build a schema from an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let schema: Schema = serde_path_to_error::deserialize(value).map_err(|err| BulkError::SchemaShapeInvalid {
            path: err.path().to_string(),
            reason: err.into_inner().to_string(),
        })?;
        schema.check_shape()?;
        Ok(schema)
    }

    fn check_shape(&self) -> Result<()> {
        for (name, value) in &self.input {
            if value.is_array() || value.is_object() {
                return Err(BulkError::SchemaShapeInvalid {
                    path: format!("input.{name}"),
                    reason: "input values must be scalars".to_string(),
                });
            }
        }
        let mut names: Vec<&str> = Vec::new();
        for template in &self.templates {
            if names.contains(&template.name.as_str()) {
                return Err(BulkError::SchemaShapeInvalid {
                    path: format!("templates[{}]", template.name),
                    reason: "template names must be unique".to_string(),
                });
            }
            names.push(&template.name);
        }
        Ok(())
    }

    /// Reject schemas whose major version differs from the engine's.
    ///
    /// # Errors
    ///
    /// [`BulkError::VersionIncompatible`] on a major mismatch,
    /// [`BulkError::SchemaShapeInvalid`] if either version has no numeric major.
    pub fn check_version(&self, engine_version: &str) -> Result<()> {
        let major_of = |version: &str, path: &str| {
            major_version(version).ok_or_else(|| BulkError::SchemaShapeInvalid {
                path: path.to_string(),
                reason: format!("'{version}' is not a semantic version"),
            })
        };

        if major_of(&self.version, "version")? != major_of(engine_version, "engine version")? {
            return Err(BulkError::VersionIncompatible {
                engine: engine_version.to_string(),
                schema: self.version.clone(),
            });
        }
        Ok(())
    }

    /// Input values as a JSON map for template contexts.
    #[must_use]
    pub fn input_map(&self) -> serde_json::Map<String, Value> {
        self.input.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Look up a template by name.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&NodeTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Render every `dimensions` entry and every textual `count` entry
    /// against `inp`, in `output` and in all templates.
    ///
    /// # Errors
    ///
    /// Template errors, with the location (e.g. `output.dimensions.0`) as
    /// field path.
    pub fn apply_input(&mut self, engine: &dyn TemplateEngine) -> Result<()> {
        let vars = input_vars(&self.input_map());
        apply_input_to(&mut self.output, "output", engine, &vars)?;
        for template in &mut self.templates {
            let location = format!("templates[{}]", template.name);
            apply_input_to(&mut template.definition, &location, engine, &vars)?;
        }
        Ok(())
    }
}

/// Major component of a version; tolerant of versions like `1.2`.
fn major_version(version: &str) -> Option<u64> {
    let version = version.trim().trim_start_matches('v');
    match semver::Version::parse(version) {
        Ok(parsed) => Some(parsed.major),
        Err(_) => version.split('.').next()?.parse().ok(),
    }
}

fn render_input(engine: &dyn TemplateEngine, source: &str, vars: &Value, location: &str) -> Result<String> {
    engine
        .compile(source)
        .and_then(|template| template.render(vars))
        .map_err(|e| e.into_bulk_error(source).at_path(location))
}

fn apply_input_to(node: &mut NodeDefinition, location: &str, engine: &dyn TemplateEngine, vars: &Value) -> Result<()> {
    for (i, dimension) in node.dimensions.iter_mut().enumerate() {
        *dimension = render_input(engine, dimension, vars, &format!("{location}.dimensions.{i}"))?;
    }
    for (i, count) in node.count.iter_mut().enumerate() {
        if let Some(CountSpec::Text(text)) = count {
            *text = render_input(engine, text, vars, &format!("{location}.count.{i}"))?;
        }
    }
    if let Some(child) = node.child.as_deref_mut() {
        apply_input_to(child, &format!("{location}.child"), engine, vars)?;
    }
    for (i, child) in node.childs.iter_mut().enumerate() {
        apply_input_to(child, &format!("{location}.childs.{i}"), engine, vars)?;
    }
    Ok(())
}
