use bulkgen_cli::core::{ErrorKind, create_error_context};
use bulkgen_cli::generator::GeneratorOptions;
use bulkgen_cli::test_utils::name_paths;
use serde_json::json;

use crate::common::{SchemaBuilder, records, text_fields};

/// Values set on the node win; empty ones fall back to the template
#[test]
fn test_extends_template() {
    let nodes = SchemaBuilder::new()
        .template(
            "Drawer",
            json!({
                "dimensions": ["*NUMERIC"],
                "count": ["4"],
                "generate": {
                    "name": "{{dim.1}} from template",
                    "description": "",
                    "abc": "{{dim.1}} from template"
                },
                "childs": []
            }),
        )
        .output(json!({
            "extends": "Drawer",
            "dimensions": [""],
            "count": ["10"],
            "generate": {
                "name": "{{dim.1}} from child",
                "description": "{{dim.1}} from child",
                "abc": ""
            },
            "childs": []
        }))
        .generator()
        .with_fields(text_fields(&["name", "description", "abc"]))
        .generate()
        .unwrap();

    assert_eq!(nodes.len(), 10, "should generate 10 elements");
    for (i, record) in records(&nodes).into_iter().enumerate() {
        let n = i + 1;
        assert_eq!(
            record,
            json!({
                "name": format!("{n} from child"),
                "description": format!("{n} from child"),
                "abc": format!("{n} from template")
            })
        );
    }
}

#[test]
fn test_reference_undefined_template() {
    let err = SchemaBuilder::new().output(json!({"extends": "Drawer"})).generator().generate().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnknownTemplateReference);
    assert_eq!(err.to_string(), "template Drawer is not defined");
}

#[test]
fn test_misspelled_template_suggestion() {
    let err = SchemaBuilder::new()
        .template("Drawer", json!({}))
        .output(json!({"extends": "Drawr"}))
        .generator()
        .validate()
        .unwrap_err();

    let context = create_error_context(&err);
    assert_eq!(context.suggestion.as_deref(), Some("Did you mean 'Drawer'?"));
}

#[test]
fn test_template_childs_are_inherited() {
    let nodes = SchemaBuilder::new()
        .template(
            "Shelf",
            json!({
                "dimensions": ["1-2"],
                "generate": {"name": "{{ par.gen.name }}.{{ dim.1 }}"},
                "childs": [{"generate": {"name": "{{ par.gen.name }} box"}}]
            }),
        )
        .output(json!({
            "dimensions": ["A"],
            "generate": {"name": "{{ dim.1 }}"},
            "childs": [{"extends": "Shelf"}]
        }))
        .generator()
        .generate()
        .unwrap();

    assert_eq!(name_paths(&nodes), vec!["A", "A/A.1", "A/A.1/A.1 box", "A/A.2", "A/A.2/A.2 box"]);
}

#[test]
fn test_merge_base_child_to_childs() {
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": [],
            "count": [],
            "generate": {"name": "abc"},
            "child": {"generate": {"name": "def", "description": "jkl"}},
            "childs": [{"generate": {"description": "ghi"}}]
        }))
        .generator()
        .with_fields(text_fields(&["name", "description"]))
        .generate()
        .unwrap();

    assert_eq!(nodes.len(), 1);
    assert_eq!(records(&nodes), vec![json!({"name": "abc"})]);
    assert_eq!(nodes[0].children.len(), 1, "only one child is generated");
    assert_eq!(records(&nodes[0].children), vec![json!({"name": "def", "description": "ghi"})]);
}

#[test]
fn test_merge_base_child_without_childs() {
    let nodes = SchemaBuilder::new()
        .output(json!({
            "generate": {"name": "abc"},
            "child": {"generate": {"name": "def", "description": "jkl"}},
            "childs": []
        }))
        .generator()
        .with_fields(text_fields(&["name", "description"]))
        .generate()
        .unwrap();

    assert_eq!(nodes[0].children.len(), 1);
    assert_eq!(records(&nodes[0].children), vec![json!({"name": "def", "description": "jkl"})]);
}

#[test]
fn test_base_child_parent_name_match_applies_to_all() {
    let nodes = SchemaBuilder::new()
        .output(json!({
            "dimensions": ["1-3"],
            "generate": {"name": "{{ dim.1 }}"},
            "child": {"parent_name_match": "{{ par.dim.1 != '2' }}"},
            "childs": [
                {"generate": {"name": "kept"}},
                {"parent_name_match": "true", "generate": {"name": "fallback"}}
            ]
        }))
        .generator()
        .generate()
        .unwrap();

    assert_eq!(name_paths(&nodes), vec!["1", "1/kept", "2", "2/fallback", "3", "3/kept"]);
}

#[test]
fn test_self_referencing_template() {
    let schema = SchemaBuilder::new()
        .template(
            "Folder",
            json!({
                "dimensions": ["1-2"],
                "generate": {"name": "{{ dim.1 }}"},
                "childs": [{"extends": "Folder"}]
            }),
        )
        .output(json!({"extends": "Folder"}));

    // validation visits the template once
    assert!(schema.generator().validate().is_ok());

    let err = schema
        .generator()
        .with_options(GeneratorOptions {
            max_depth: 3,
            ..GeneratorOptions::default()
        })
        .generate()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MaxDepthExceeded);
}
