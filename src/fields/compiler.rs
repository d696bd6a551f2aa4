//! Compiling a node's `generate` mapping against a field schema.
//!
//! Compilation walks the field schema and the `generate` mapping in
//! lock-step, compiling every leaf template once. Required fields without a
//! template are collected over the whole walk and reported together. The
//! resulting [`CompiledGenerate`] is rendered once per generated instance.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use super::{FieldDefinition, FieldMap, FieldType, ModelResolver, default_cast};
use crate::core::{BulkError, Result};
use crate::schema::GenerateValue;
use crate::templating::{CompiledTemplate, TemplateEngine};

/// What happens to `generate` keys the field schema does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Silently leave them out of the output
    #[default]
    Drop,
    /// Fail with [`BulkError::FieldNotAllowed`]
    Reject,
}

enum CompiledField {
    Leaf {
        path: String,
        template: Box<dyn CompiledTemplate>,
        /// `None` for free-form fields, rendered as text
        field: Option<FieldDefinition>,
    },
    List(Vec<CompiledField>),
    Object(Vec<(String, CompiledField)>),
}

/// A compiled `generate` mapping
pub struct CompiledGenerate {
    fields: Vec<(String, CompiledField)>,
    resolver: Option<Arc<dyn ModelResolver>>,
}

impl std::fmt::Debug for CompiledGenerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGenerate")
            .field("fields", &self.fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

/// Compiles `generate` mappings for one field schema
pub struct FieldCompiler<'a> {
    engine: &'a dyn TemplateEngine,
    fields: Option<&'a FieldMap>,
    unknown_fields: UnknownFieldPolicy,
    resolver: Option<Arc<dyn ModelResolver>>,
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

impl<'a> FieldCompiler<'a> {
    /// Compiler for `fields`, or free-form when no field schema is given.
    pub fn new(engine: &'a dyn TemplateEngine, fields: Option<&'a FieldMap>) -> Self {
        Self {
            engine,
            fields,
            unknown_fields: UnknownFieldPolicy::default(),
            resolver: None,
        }
    }

    #[must_use]
    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Option<Arc<dyn ModelResolver>>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Compile a `generate` mapping.
    ///
    /// # Errors
    ///
    /// - [`BulkError::TemplateSyntax`] for the first template that fails to parse
    /// - [`BulkError::FieldNotAllowed`] for unknown keys in reject mode
    /// - [`BulkError::InvalidGenerateShape`] for a mapping or list given to a leaf field
    /// - [`BulkError::MissingRequiredFields`] with every missing path
    pub fn compile(&self, generate: &IndexMap<String, GenerateValue>) -> Result<CompiledGenerate> {
        let mut missing = Vec::new();
        let fields = match self.fields {
            Some(schema) => self.compile_object(schema, generate, "", &mut missing)?,
            None => self.compile_free_object(generate, "")?,
        };

        if !missing.is_empty() {
            return Err(BulkError::MissingRequiredFields {
                paths: missing,
            });
        }

        Ok(CompiledGenerate {
            fields,
            resolver: self.resolver.clone(),
        })
    }

    fn compile_object(
        &self,
        schema: &FieldMap,
        generate: &IndexMap<String, GenerateValue>,
        prefix: &str,
        missing: &mut Vec<String>,
    ) -> Result<Vec<(String, CompiledField)>> {
        for key in generate.keys().filter(|key| !schema.contains_key(*key)) {
            let path = join(prefix, key);
            match self.unknown_fields {
                UnknownFieldPolicy::Reject => {
                    return Err(BulkError::FieldNotAllowed {
                        path,
                    });
                }
                UnknownFieldPolicy::Drop => trace!("Dropping '{}', it is not part of the field schema", path),
            }
        }

        let mut compiled = Vec::with_capacity(schema.len());
        for (key, field) in schema {
            let path = join(prefix, key);
            if let Some(value) = self.compile_field(field, generate.get(key), &path, missing)? {
                compiled.push((key.clone(), value));
            }
        }
        Ok(compiled)
    }

    fn compile_field(
        &self,
        field: &FieldDefinition,
        value: Option<&GenerateValue>,
        path: &str,
        missing: &mut Vec<String>,
    ) -> Result<Option<CompiledField>> {
        match (field.field_type, value) {
            (FieldType::Object, Some(GenerateValue::Object(map))) => {
                let compiled = if field.fields.is_empty() {
                    self.compile_free_object(map, path)?
                } else {
                    self.compile_object(&field.fields, map, path, missing)?
                };
                Ok(Some(CompiledField::Object(compiled)))
            }
            (FieldType::List, Some(GenerateValue::List(items))) => {
                let text = FieldDefinition::text(field.name.clone());
                let item_field = field.items_type.as_deref().unwrap_or(&text);
                let mut compiled = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = join(path, &i.to_string());
                    if let Some(value) = self.compile_field(item_field, Some(item), &item_path, missing)? {
                        compiled.push(value);
                    }
                }
                Ok(Some(CompiledField::List(compiled)))
            }
            (FieldType::Object | FieldType::List, _) | (_, None) => {
                if field.required {
                    missing.push(path.to_string());
                }
                Ok(None)
            }
            (_, Some(GenerateValue::Leaf(source))) => Ok(Some(CompiledField::Leaf {
                path: path.to_string(),
                template: self.compile_template(source, path)?,
                field: Some(field.clone()),
            })),
            (_, Some(other)) => Err(BulkError::InvalidGenerateShape {
                path: path.to_string(),
                expected: format!("a template for a {} field, not {}", field.field_type, other.shape()),
            }),
        }
    }

    fn compile_free_object(
        &self,
        generate: &IndexMap<String, GenerateValue>,
        prefix: &str,
    ) -> Result<Vec<(String, CompiledField)>> {
        generate
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.compile_free(value, &join(prefix, key))?)))
            .collect()
    }

    fn compile_free(&self, value: &GenerateValue, path: &str) -> Result<CompiledField> {
        Ok(match value {
            GenerateValue::Leaf(source) => CompiledField::Leaf {
                path: path.to_string(),
                template: self.compile_template(source, path)?,
                field: None,
            },
            GenerateValue::List(items) => CompiledField::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.compile_free(item, &join(path, &i.to_string())))
                    .collect::<Result<_>>()?,
            ),
            GenerateValue::Object(map) => CompiledField::Object(self.compile_free_object(map, path)?),
        })
    }

    fn compile_template(&self, source: &str, path: &str) -> Result<Box<dyn CompiledTemplate>> {
        trace!("Compiling template for '{}'", path);
        self.engine.compile(source).map_err(|e| e.into_bulk_error(source).at_path(path))
    }
}

impl CompiledGenerate {
    /// Render every field with `vars` and cast the results.
    ///
    /// # Errors
    ///
    /// - template errors annotated with the field path
    /// - [`BulkError::RequiredFieldEmpty`] when a required field renders empty
    /// - [`BulkError::FieldCast`] when a cast rejects the rendered value
    pub fn render(&self, vars: &Value) -> Result<Map<String, Value>> {
        let mut rendered = Map::new();
        for (key, field) in &self.fields {
            rendered.insert(key.clone(), self.render_field(field, vars)?);
        }
        Ok(rendered)
    }

    /// Whether nothing would be rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn render_field(&self, compiled: &CompiledField, vars: &Value) -> Result<Value> {
        match compiled {
            CompiledField::Object(fields) => {
                let mut rendered = Map::new();
                for (key, field) in fields {
                    rendered.insert(key.clone(), self.render_field(field, vars)?);
                }
                Ok(Value::Object(rendered))
            }
            CompiledField::List(items) => {
                items.iter().map(|item| self.render_field(item, vars)).collect::<Result<Vec<_>>>().map(Value::Array)
            }
            CompiledField::Leaf {
                path,
                template,
                field,
            } => {
                let value = template
                    .render(vars)
                    .map_err(|e| e.into_bulk_error(template.source()).at_path(path))?;

                let Some(field) = field else {
                    return Ok(Value::String(value));
                };

                if field.required && value.is_empty() {
                    return Err(BulkError::RequiredFieldEmpty {
                        path: path.clone(),
                        template: template.source().to_string(),
                    });
                }

                let cast = match &field.cast {
                    Some(cast) => cast.cast(&value, field),
                    None => default_cast(&value, field, self.resolver.as_deref()),
                };
                cast.map_err(|message| BulkError::FieldCast {
                    path: path.clone(),
                    message,
                })
            }
        }
    }
}
