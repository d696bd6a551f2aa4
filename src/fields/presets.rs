//! Built-in field schemas for common inventory entities.

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{FieldDefinition, FieldMap};
use crate::materialize::GenerateType;

/// A named field schema with the shape its output is materialized in
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    /// Identifier used on the command line, e.g. `stock-location`
    pub name: &'static str,
    /// Display label
    pub label: &'static str,
    pub generate_type: GenerateType,
    pub fields: FieldMap,
}

impl Preset {
    /// Parent context used when generating without a real parent entity.
    ///
    /// For trees every field becomes a `<parent 'Label'>` placeholder under
    /// `par.gen`; flat presets have no parent.
    #[must_use]
    pub fn placeholder_parent(&self) -> Value {
        if self.generate_type == GenerateType::Single {
            return Value::Object(Map::new());
        }
        let placeholders: Map<String, Value> = self
            .fields
            .iter()
            .map(|(key, field)| (key.clone(), Value::String(format!("<parent '{}'>", field.name))))
            .collect();
        json!({ "gen": placeholders })
    }
}

fn fields(entries: Vec<(&str, FieldDefinition)>) -> FieldMap {
    entries.into_iter().map(|(key, field)| (key.to_string(), field)).collect()
}

fn stock_location() -> Preset {
    Preset {
        name: "stock-location",
        label: "Stock Location",
        generate_type: GenerateType::Tree,
        fields: fields(vec![
            ("name", FieldDefinition::text("Name").required()),
            ("description", FieldDefinition::text("Description")),
            ("structural", FieldDefinition::boolean("Structural")),
            ("external", FieldDefinition::boolean("External")),
            ("icon", FieldDefinition::text("Icon")),
        ]),
    }
}

fn part_category() -> Preset {
    Preset {
        name: "part-category",
        label: "Part Category",
        generate_type: GenerateType::Tree,
        fields: fields(vec![
            ("name", FieldDefinition::text("Name").required()),
            ("description", FieldDefinition::text("Description")),
            (
                "default_location_id",
                FieldDefinition::number("Default location")
                    .with_description("This must evaluate to a valid stock location id."),
            ),
            ("default_keywords", FieldDefinition::text("Default keywords")),
            ("structural", FieldDefinition::boolean("Structural")),
            ("icon", FieldDefinition::text("Icon")),
        ]),
    }
}

fn part() -> Preset {
    Preset {
        name: "part",
        label: "Part",
        generate_type: GenerateType::Single,
        fields: fields(vec![
            ("name", FieldDefinition::text("Name").required()),
            ("description", FieldDefinition::text("Description")),
            (
                "category",
                FieldDefinition::model_reference("Category", "part.PartCategory")
                    .with_description("If not set, defaults to current category"),
            ),
            (
                "variant_of",
                FieldDefinition::model_reference("Variant of", "part.Part").limit_choices_to("is_template", json!(true)),
            ),
            ("keywords", FieldDefinition::text("Keywords")),
            ("IPN", FieldDefinition::text("IPN")),
            ("revision", FieldDefinition::text("Revision")),
            ("is_template", FieldDefinition::boolean("Is Template")),
            ("link", FieldDefinition::text("Link")),
            ("default_location", FieldDefinition::model_reference("Default Location", "stock.StockLocation")),
            ("default_supplier", FieldDefinition::model_reference("Default Supplier part", "company.SupplierPart")),
            (
                "default_expiry",
                FieldDefinition::number("Default Expiry")
                    .with_description("Expiry time (in days) for stock items of this part"),
            ),
            ("minimum_stock", FieldDefinition::number("Minimum Stock").with_description("Minimum allowed stock level")),
            ("units", FieldDefinition::text("Units").with_description("Units of measure for this part")),
            ("salable", FieldDefinition::boolean("Salable")),
            ("assembly", FieldDefinition::boolean("Assembly")),
            ("component", FieldDefinition::boolean("Component")),
            ("purchaseable", FieldDefinition::boolean("Purchaseable")),
            ("trackable", FieldDefinition::boolean("Trackable")),
            ("active", FieldDefinition::boolean("Active")),
            ("virtual", FieldDefinition::boolean("Virtual")),
            ("notes", FieldDefinition::text("Notes")),
            ("responsible", FieldDefinition::model_reference("Responsible", "auth.user")),
            ("image", FieldDefinition::text("Image")),
        ]),
    }
}

/// All built-in presets.
#[must_use]
pub fn presets() -> Vec<Preset> {
    vec![stock_location(), part_category(), part()]
}

/// Look up a preset by name.
#[must_use]
pub fn preset(name: &str) -> Option<Preset> {
    presets().into_iter().find(|preset| preset.name == name)
}
