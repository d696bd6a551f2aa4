use bulkgen_cli::core::ErrorKind;
use bulkgen_cli::fields::{FieldDefinition, ModelRef, ModelResolver, UnknownFieldPolicy, preset};
use bulkgen_cli::generator::GeneratorOptions;
use bulkgen_cli::test_utils::name_paths;
use serde_json::{Value, json};

use crate::common::{SchemaBuilder, field_map, records};

/// Keys outside the field schema are dropped
#[test]
fn test_not_allowed_field_is_dropped() {
    let nodes = SchemaBuilder::new()
        .output(json!({"generate": {"NOT_ALLOWED_KEY": "1"}}))
        .generator()
        .with_fields(field_map(vec![("BBBB", FieldDefinition::text("BBBB"))]))
        .generate()
        .unwrap();

    assert_eq!(serde_json::to_value(&nodes).unwrap(), json!([[{}, []]]));
}

#[test]
fn test_not_allowed_field_is_rejected_in_strict_mode() {
    let err = SchemaBuilder::new()
        .output(json!({"generate": {"NOT_ALLOWED_KEY": "1"}}))
        .generator()
        .with_fields(field_map(vec![("BBBB", FieldDefinition::text("BBBB"))]))
        .with_options(GeneratorOptions {
            unknown_fields: UnknownFieldPolicy::Reject,
            ..GeneratorOptions::default()
        })
        .generate()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FieldNotAllowed);
    assert_eq!(err.to_string(), "'NOT_ALLOWED_KEY' is not allowed to be generated");
}

#[test]
fn test_cast_field() {
    let nodes = SchemaBuilder::new()
        .output(json!({"generate": {"number_field": "42"}}))
        .generator()
        .with_fields(field_map(vec![("number_field", FieldDefinition::number("number_field"))]))
        .generate()
        .unwrap();
    assert_eq!(nodes[0].fields["number_field"], json!(42));

    let only_three = |value: &str, field: &FieldDefinition| {
        if value == "3" { Ok(Value::String(value.to_string())) } else { Err(format!("Value for field {} is not '3'", field.name)) }
    };
    let fields = field_map(vec![("number_field", FieldDefinition::text("number_field").with_cast(only_three))]);

    let nodes = SchemaBuilder::new()
        .output(json!({"generate": {"number_field": "3"}}))
        .generator()
        .with_fields(fields.clone())
        .generate()
        .unwrap();
    assert_eq!(nodes[0].fields["number_field"], json!("3"));

    let err = SchemaBuilder::new()
        .output(json!({"generate": {"number_field": "42"}}))
        .generator()
        .with_fields(fields)
        .generate()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldCast);
    assert_eq!(err.to_string(), "number_field: Value for field number_field is not '3'");
}

#[test]
fn test_required_field() {
    let required = |name: &str| FieldDefinition::text(name).required();

    let err = SchemaBuilder::new()
        .output(json!({"generate": {"required_field": ""}}))
        .generator()
        .with_fields(field_map(vec![("required_field", required("required_field"))]))
        .generate()
        .unwrap_err();
    assert_eq!(err.to_string(), "'required_field' is a required field, but template '' returned empty string");

    let err = SchemaBuilder::new()
        .output(json!({"generate": {"description": ""}}))
        .generator()
        .with_fields(field_map(vec![("name", required("name"))]))
        .generate()
        .unwrap_err();
    assert_eq!(err.to_string(), "'name' are missing in generated keys.");

    let object = FieldDefinition::object("required_dict", field_map(vec![("a", FieldDefinition::text("A"))])).required();
    let err = SchemaBuilder::new()
        .output(json!({"generate": {}}))
        .generator()
        .with_fields(field_map(vec![("required_dict", object)]))
        .generate()
        .unwrap_err();
    assert_eq!(err.to_string(), "'required_dict' are missing in generated keys.");

    let list = FieldDefinition::list("required_list", FieldDefinition::text("A")).required();
    let err = SchemaBuilder::new()
        .output(json!({"generate": {}}))
        .generator()
        .with_fields(field_map(vec![("required_list", list)]))
        .generate()
        .unwrap_err();
    assert_eq!(err.to_string(), "'required_list' are missing in generated keys.");

    let err = SchemaBuilder::new()
        .output(json!({"generate": {"name": "", "description": "AA"}}))
        .generator()
        .with_fields(field_map(vec![("name", required("name")), ("description", FieldDefinition::text("description"))]))
        .generate()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequiredFieldEmpty);
    assert_eq!(err.to_string(), "'name' is a required field, but template '' returned empty string");
}

#[test]
fn test_recursive_output() {
    let list = FieldDefinition::list("required_list", FieldDefinition::text("A")).required();
    let nodes = SchemaBuilder::new()
        .output(json!({"generate": {"required_list": ["1", "2", "3"]}}))
        .generator()
        .with_fields(field_map(vec![("required_list", list)]))
        .generate()
        .unwrap();

    assert_eq!(serde_json::to_value(&nodes).unwrap(), json!([[{"required_list": ["1", "2", "3"]}, []]]));
}

#[test]
fn test_nested_object_is_typed() {
    let dimensions = FieldDefinition::object(
        "Dimensions",
        field_map(vec![
            ("width", FieldDefinition::number("Width")),
            ("depth", FieldDefinition::float("Depth")),
            ("stacked", FieldDefinition::boolean("Stacked")),
        ]),
    );
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": ["1-2"],
            "generate": {
                "name": "Bin {{ dim.1 }}",
                "size": {"width": "{{ dim.1 | int * 10 }}", "depth": "0.5", "stacked": "{{ dim.1 == '2' }}"}
            }
        }))
        .generator()
        .with_fields(field_map(vec![("name", FieldDefinition::text("Name").required()), ("size", dimensions)]))
        .generate()
        .unwrap();

    assert_eq!(
        records(&nodes),
        vec![
            json!({"name": "Bin 1", "size": {"width": 10, "depth": 0.5, "stacked": false}}),
            json!({"name": "Bin 2", "size": {"width": 20, "depth": 0.5, "stacked": true}}),
        ]
    );
}

#[test]
fn test_select_field() {
    let fields = field_map(vec![("status", FieldDefinition::select("Status", ["ok", "damaged"]))]);

    let nodes = SchemaBuilder::new()
        .output(json!({"generate": {"status": "ok"}}))
        .generator()
        .with_fields(fields.clone())
        .generate()
        .unwrap();
    assert_eq!(nodes[0].fields["status"], json!("ok"));

    let err = SchemaBuilder::new()
        .output(json!({"generate": {"status": "lost"}}))
        .generator()
        .with_fields(fields)
        .generate()
        .unwrap_err();
    assert_eq!(err.to_string(), "status: 'lost' is not one of: ok, damaged");
}

struct KnownCategories(Vec<i64>);

impl ModelResolver for KnownCategories {
    fn resolve(&self, model: &ModelRef, id: i64) -> Result<(), String> {
        if self.0.contains(&id) { Ok(()) } else { Err(format!("{} {} does not exist", model.model, id)) }
    }
}

#[test]
fn test_model_reference_is_resolved() {
    let fields = field_map(vec![
        ("name", FieldDefinition::text("Name")),
        ("category", FieldDefinition::model_reference("Category", "partcategory")),
    ]);
    let schema = SchemaBuilder::new().output(json!({
        "dimensions": ["1-2"],
        "generate": {"name": "Part {{ dim.1 }}", "category": "{{ dim.1 | int + 6 }}"}
    }));

    let nodes = schema
        .generator()
        .with_fields(fields.clone())
        .with_resolver(KnownCategories(vec![7, 8]))
        .generate()
        .unwrap();
    assert_eq!(nodes[1].fields["category"], json!(8));

    let err = schema.generator().with_fields(fields).with_resolver(KnownCategories(vec![7])).generate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldCast);
    assert_eq!(err.to_string(), "category: partcategory 8 does not exist");
}

#[test]
fn test_stock_location_preset() {
    let preset = preset("stock-location").unwrap();
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": ["A-B"],
            "generate": {"name": "{{ par.gen.name }}-{{ dim.1 }}", "structural": "yes"},
            "child": {
                "dimensions": ["1-2"],
                "generate": {"name": "{{ par.gen.name }}.{{ dim.1 }}", "description": "Shelf of {{ par.gen.name }}"}
            }
        }))
        .generator()
        .with_fields(preset.fields.clone())
        .generate_with_parent(preset.placeholder_parent())
        .unwrap();

    assert_eq!(
        name_paths(&nodes),
        vec![
            "<parent 'Name'>-A",
            "<parent 'Name'>-A/<parent 'Name'>-A.1",
            "<parent 'Name'>-A/<parent 'Name'>-A.2",
            "<parent 'Name'>-B",
            "<parent 'Name'>-B/<parent 'Name'>-B.1",
            "<parent 'Name'>-B/<parent 'Name'>-B.2",
        ]
    );
    assert_eq!(nodes[0].fields["structural"], json!(true));
    assert_eq!(nodes[0].children[0].fields["description"], json!("Shelf of <parent 'Name'>-A"));
}

#[test]
fn test_preset_requires_name() {
    let preset = preset("part-category").unwrap();
    let err = SchemaBuilder::new()
        .output(json!({"generate": {"description": "no name"}}))
        .generator()
        .with_fields(preset.fields)
        .validate()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingRequiredFields);
}
