use bulkgen_cli::core::ErrorKind;
use bulkgen_cli::generator::BulkGenerator;
use bulkgen_cli::schema::{DocumentFormat, Schema};
use serde_json::json;

use crate::common::{SchemaBuilder, records, text_fields};

#[test]
fn test_input_variables() {
    let nodes = SchemaBuilder::new()
        .input("a", "2")
        .input("b", "Hello")
        .output(json!({
            "dimensions": ["*NUMERIC(count={{inp.a}})"],
            "count": [],
            "generate": {"name": "{{inp.b}} {{dim.1}}"},
            "childs": []
        }))
        .generator()
        .with_fields(text_fields(&["name"]))
        .generate()
        .unwrap();

    assert_eq!(records(&nodes), vec![json!({"name": "Hello 1"}), json!({"name": "Hello 2"})]);
    assert!(nodes.iter().all(|node| node.children.is_empty()));
}

#[test]
fn test_input_in_count() {
    let nodes = SchemaBuilder::new()
        .input("shelves", 3)
        .output(json!({
            "dimensions": ["*ALPHA(casing=upper)"],
            "count": ["{{ inp.shelves }}"],
            "generate": {"name": "{{ dim.1 }}"}
        }))
        .generator()
        .generate()
        .unwrap();

    assert_eq!(records(&nodes), vec![json!({"name": "A"}), json!({"name": "B"}), json!({"name": "C"})]);
}

#[test]
fn test_invalid_template_in_dimensions() {
    let err = SchemaBuilder::new()
        .output(json!({"dimensions": ["{{hello.1}}"], "generate": {"name": "A"}}))
        .generator()
        .with_fields(text_fields(&["name"]))
        .generate()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UndefinedVariable);
    assert_eq!(err.field_path(), Some("output.dimensions.0"));
    assert!(err.to_string().contains("'hello.1' is undefined"));
}

#[test]
fn test_invalid_generate_templates() {
    let cases = [("{{}", ErrorKind::TemplateSyntax), ("{{hello.world}}", ErrorKind::UndefinedVariable)];

    for (template, kind) in cases {
        let err = SchemaBuilder::new()
            .output(json!({"generate": {"name": template}}))
            .generator()
            .with_fields(text_fields(&["name"]))
            .generate()
            .unwrap_err();

        assert_eq!(err.kind(), kind, "template {template}");
        assert_eq!(err.field_path(), Some("name"));
        assert!(err.to_string().starts_with(&format!("Invalid generator template '{template}'")));
    }
}

/// `par` reaches up the whole chain of ancestors
#[test]
fn test_parent_context() {
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": ["A-B"],
            "generate": {"name": "First {{dim.1}}"},
            "child": {
                "generate": {"name": "Second"},
                "child": {
                    "generate": {"parent_name": "{{par.gen.name}}", "parent_parent_dim_1": "{{par.par.dim.1}}"}
                }
            }
        }))
        .generator()
        .with_fields(text_fields(&["name", "parent_name", "parent_parent_dim_1"]))
        .generate()
        .unwrap();

    let tree = serde_json::to_value(&nodes).unwrap();
    assert_eq!(
        tree,
        json!([
            [{"name": "First A"}, [[{"name": "Second"}, [[{"parent_name": "Second", "parent_parent_dim_1": "A"}, []]]]]],
            [{"name": "First B"}, [[{"name": "Second"}, [[{"parent_name": "Second", "parent_parent_dim_1": "B"}, []]]]]]
        ])
    );
}

#[test]
fn test_len_context_variable() {
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": ["*NUMERIC", "*ALPHA"],
            "count": [10, 2],
            "generate": {"length": "{{len}}", "dim1len": "{{dim_len.1}}", "dim2len": "{{dim_len.2}}"}
        }))
        .generator()
        .with_fields(text_fields(&["length", "dim1len", "dim2len"]))
        .generate()
        .unwrap();

    assert_eq!(nodes.len(), 20);
    for record in records(&nodes) {
        assert_eq!(record, json!({"length": "20", "dim1len": "10", "dim2len": "2"}));
    }
}

#[test]
fn test_global_context() {
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": ["1-3"],
            "global_context": "{% set a = dim.1 %}",
            "generate": {"name": "{{global.a}}"}
        }))
        .generator()
        .with_fields(text_fields(&["name"]))
        .generate()
        .unwrap();

    assert_eq!(records(&nodes), vec![json!({"name": "1"}), json!({"name": "2"}), json!({"name": "3"})]);
}

#[test]
fn test_global_context_bindings_build_on_each_other() {
    let nodes = SchemaBuilder::new()
        .input("prefix", "WH")
        .output(json!({
            "dimensions": ["A-B"],
            "global_context": "{% set code = inp.prefix ~ '-' ~ dim.1 %}{% set label = code | lower %}",
            "generate": {"name": "{{ global.code }}", "description": "{{ global.label }}"}
        }))
        .generator()
        .generate()
        .unwrap();

    assert_eq!(
        records(&nodes),
        vec![json!({"name": "WH-A", "description": "wh-a"}), json!({"name": "WH-B", "description": "wh-b"})]
    );
}

#[test]
fn test_global_context_with_conditional_and_loop_bindings() {
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": ["A-B"],
            "global_context": "{% set code = 'other' %}{% if dim.1 == 'A' %}{% set code = 'first' %}{% endif %}{% for i in [1, 2] %}{% set tmp = i %}{% endfor %}",
            "generate": {"name": "{{ global.code }}"}
        }))
        .generator()
        .generate()
        .unwrap();

    assert_eq!(records(&nodes), vec![json!({"name": "first"}), json!({"name": "other"})]);
}

#[test]
fn test_root_parent_context() {
    let schema = Schema::parse(
        r#"
version: "1.0.0"
output:
  dimensions: ["1-2"]
  generate:
    name: "{{ par.gen.name }}.{{ dim.1 }}"
"#,
        DocumentFormat::Yaml,
    )
    .unwrap();

    let nodes = BulkGenerator::new(schema).generate_with_parent(json!({"gen": {"name": "Room 4"}})).unwrap();
    assert_eq!(records(&nodes), vec![json!({"name": "Room 4.1"}), json!({"name": "Room 4.2"})]);
}
