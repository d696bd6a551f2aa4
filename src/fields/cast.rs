//! Casting rendered strings to typed field values.

use serde_json::Value;

use super::{FieldDefinition, FieldType, ModelRef};
use crate::utils::{is_truthy, parse_optional_int};

/// Cast hook turning a rendered string into a field value
///
/// The error message is reported prefixed with the field path.
pub trait FieldCast: Send + Sync {
    fn cast(&self, value: &str, field: &FieldDefinition) -> Result<Value, String>;
}

impl<F> FieldCast for F
where
    F: Fn(&str, &FieldDefinition) -> Result<Value, String> + Send + Sync,
{
    fn cast(&self, value: &str, field: &FieldDefinition) -> Result<Value, String> {
        self(value, field)
    }
}

/// Host lookup verifying that a referenced entity exists
///
/// Called synchronously from the `model-reference` cast; this is the only
/// point where generation may touch the host's store.
pub trait ModelResolver: Send + Sync {
    fn resolve(&self, model: &ModelRef, id: i64) -> Result<(), String>;
}

/// Cast by field type.
///
/// Empty values of `number`, `float`, `model-reference` and `select` fields
/// become `null`.
pub fn default_cast(value: &str, field: &FieldDefinition, resolver: Option<&dyn ModelResolver>) -> Result<Value, String> {
    match field.field_type {
        FieldType::Boolean => Ok(Value::Bool(is_truthy(value))),
        FieldType::Number => parse_optional_int(value)
            .map(|n| n.map_or(Value::Null, Value::from))
            .map_err(|()| format!("'{value}' is not a valid integer")),
        FieldType::Float => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{value}' is not a valid number"))
        }
        FieldType::ModelReference => {
            let Some(id) = parse_optional_int(value).map_err(|()| format!("'{value}' is not a valid id"))? else {
                return Ok(Value::Null);
            };
            if let (Some(resolver), Some(model)) = (resolver, field.model.as_ref()) {
                resolver.resolve(model, id)?;
            }
            Ok(Value::from(id))
        }
        FieldType::Select => {
            if value.is_empty() {
                return Ok(Value::Null);
            }
            if !field.options.is_empty() && !field.options.iter().any(|option| option == value) {
                return Err(format!("'{}' is not one of: {}", value, field.options.join(", ")));
            }
            Ok(Value::String(value.to_string()))
        }
        FieldType::Text | FieldType::List | FieldType::Object => Ok(Value::String(value.to_string())),
    }
}
