//! Field schemas describing what `generate` may produce.
//!
//! The host decides which fields a generated node has. A field schema maps
//! output keys to [`FieldDefinition`]s; the compiler in [`compiler`] walks it
//! in lock-step with a node's `generate` mapping, checks required fields and
//! casts every rendered string to its typed value.
//!
//! Without a field schema every `generate` key is accepted and rendered as
//! text.
//!
//! # Field Types
//!
//! | Type              | Rendered value becomes                               |
//! |-------------------|------------------------------------------------------|
//! | `text`            | string                                               |
//! | `boolean`         | `true` for a truthy token, `false` otherwise         |
//! | `number`          | integer, `null` when empty                           |
//! | `float`           | float, `null` when empty                             |
//! | `model-reference` | integer id, `null` when empty                        |
//! | `select`          | one of `options`, `null` when empty                  |
//! | `list`            | list of `items_type` values                          |
//! | `object`          | mapping of `fields`                                  |

pub mod cast;
pub mod compiler;
pub mod presets;

pub use cast::{FieldCast, ModelResolver, default_cast};
pub use compiler::{CompiledGenerate, FieldCompiler, UnknownFieldPolicy};
pub use presets::{Preset, preset, presets};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Field schema: output key to definition
pub type FieldMap = IndexMap<String, FieldDefinition>;

/// Type of a generated field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[default]
    Text,
    Boolean,
    Number,
    Float,
    ModelReference,
    Select,
    List,
    Object,
}

impl FieldType {
    /// Whether values of this type are rendered from a single template.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        !matches!(self, FieldType::List | FieldType::Object)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::Float => "float",
            FieldType::ModelReference => "model-reference",
            FieldType::Select => "select",
            FieldType::List => "list",
            FieldType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Target of a `model-reference` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    /// Host model name, e.g. `part.PartCategory`
    pub model: String,

    /// Filters the host applies when offering choices
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub limit_choices_to: IndexMap<String, Value>,
}

/// Definition of one generated field
#[derive(Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Display label
    pub name: String,

    /// Field type
    #[serde(default)]
    pub field_type: FieldType,

    /// Whether `generate` must provide a non-empty value
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Referenced model of `model-reference` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRef>,

    /// Allowed values of `select` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Item definition of `list` fields, text when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_type: Option<Box<FieldDefinition>>,

    /// Sub-fields of `object` fields; any key is accepted when empty
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: FieldMap,

    /// Cast hook replacing the default cast of the field type
    #[serde(skip)]
    pub cast: Option<Arc<dyn FieldCast>>,
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("model", &self.model)
            .field("options", &self.options)
            .field("items_type", &self.items_type)
            .field("fields", &self.fields)
            .field("cast", &self.cast.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl FieldDefinition {
    /// Field of the given type with no further settings.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            description: None,
            model: None,
            options: Vec::new(),
            items_type: None,
            fields: FieldMap::new(),
            cast: None,
        }
    }

    /// Text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Integer field.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Reference to an entity of a host model.
    pub fn model_reference(name: impl Into<String>, model: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::ModelReference);
        field.model = Some(ModelRef {
            model: model.into(),
            limit_choices_to: IndexMap::new(),
        });
        field
    }

    /// Choice between fixed options.
    pub fn select<S: Into<String>>(name: impl Into<String>, options: impl IntoIterator<Item = S>) -> Self {
        let mut field = Self::new(name, FieldType::Select);
        field.options = options.into_iter().map(Into::into).collect();
        field
    }

    /// List of `items`.
    pub fn list(name: impl Into<String>, items: FieldDefinition) -> Self {
        let mut field = Self::new(name, FieldType::List);
        field.items_type = Some(Box::new(items));
        field
    }

    /// Mapping with the given sub-fields.
    pub fn object(name: impl Into<String>, fields: FieldMap) -> Self {
        let mut field = Self::new(name, FieldType::Object);
        field.fields = fields;
        field
    }

    /// Mark as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the help text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a filter to the referenced model's choices.
    #[must_use]
    pub fn limit_choices_to(mut self, key: impl Into<String>, value: Value) -> Self {
        if let Some(model) = self.model.as_mut() {
            model.limit_choices_to.insert(key.into(), value);
        }
        self
    }

    /// Replace the default cast.
    #[must_use]
    pub fn with_cast(mut self, cast: impl FieldCast + 'static) -> Self {
        self.cast = Some(Arc::new(cast));
        self
    }
}
