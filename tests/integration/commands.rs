use predicates::prelude::*;
use serde_json::{Value, json};

use crate::common::{SchemaBuilder, TestProject};

fn shelves() -> SchemaBuilder {
    SchemaBuilder::new().input("prefix", "S").output(json!({
        "dimensions": ["A-B"],
        "generate": {"name": "{{ inp.prefix }}{{ dim.1 }}"},
        "childs": [{
            "dimensions": ["*NUMERIC"],
            "count": [2],
            "generate": {"name": "{{ par.gen.name }}.{{ dim.1 }}"}
        }]
    }))
}

#[test]
fn test_generate_json() {
    let project = TestProject::new().unwrap();
    project.write_schema("shelves.json", &shelves()).unwrap();

    let output = project.run_bulkgen(&["generate", "shelves.json"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);

    let tree: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(tree[0][0], json!({"name": "SA"}));
    assert_eq!(tree[1][1][1][0], json!({"name": "SB.2"}));
}

#[test]
fn test_generate_tree_from_yaml() {
    let project = TestProject::new().unwrap();
    project
        .write_file(
            "rooms.yaml",
            r#"
version: "1.0.0"
output:
  dimensions: ["1-2"]
  generate:
    name: "Room {{ dim.1 }}"
  child:
    dimensions: ["a-b"]
    generate:
      name: "Shelf {{ dim.1 }}"
"#,
        )
        .unwrap();

    let output = project.run_bulkgen(&["generate", "rooms.yaml", "--format", "tree"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert_eq!(
        output.stdout,
        "├── Room 1\n│   ├── Shelf a\n│   └── Shelf b\n└── Room 2\n    ├── Shelf a\n    └── Shelf b\n\n6 nodes\n"
    );
}

#[test]
fn test_generate_yaml_with_preset_and_parent() {
    let project = TestProject::new().unwrap();
    project
        .write_schema(
            "bins.json",
            &SchemaBuilder::new().output(json!({
                "dimensions": ["1-2"],
                "generate": {"name": "{{ par.gen.name }}-{{ dim.1 }}", "structural": "no"}
            })),
        )
        .unwrap();
    project.write_file("parent.json", r#"{"gen": {"name": "Rack 7"}}"#).unwrap();

    let output = project
        .run_bulkgen(&["generate", "bins.json", "--preset", "stock-location", "--parent", "parent.json", "-f", "yaml"])
        .unwrap();
    assert!(output.success, "stderr: {}", output.stderr);

    let tree: Value = serde_yaml::from_str(&output.stdout).unwrap();
    assert_eq!(tree, json!([[{"name": "Rack 7-1", "structural": false}, []], [{"name": "Rack 7-2", "structural": false}, []]]));
}

#[test]
fn test_generate_strict_rejects_unknown_keys() {
    let project = TestProject::new().unwrap();
    project
        .write_schema("parts.json", &SchemaBuilder::new().output(json!({"generate": {"name": "P", "colour": "red"}})))
        .unwrap();

    let output = project.run_bulkgen(&["generate", "parts.json", "--preset", "part"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);

    let output = project.run_bulkgen(&["generate", "parts.json", "--preset", "part", "--strict"]).unwrap();
    assert!(!output.success);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("'colour' is not allowed to be generated"));
}

#[test]
fn test_generate_reports_engine_error() {
    let project = TestProject::new().unwrap();
    project
        .write_schema(
            "broken.json",
            &SchemaBuilder::new().output(json!({
                "dimensions": ["1-2"],
                "generate": {"name": "{{ dim.1 }}"},
                "childs": [{"parent_name_match": "no"}]
            })),
        )
        .unwrap();

    let output = project.run_bulkgen(&["generate", "broken.json"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("No match for 1"));
    assert!(output.stderr.contains("parent_name_match"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_generate_respects_configured_max_nodes() {
    let project = TestProject::new().unwrap();
    project.write_schema("shelves.json", &shelves()).unwrap();
    project.write_file("config.toml", "[generator]\nmax_nodes = 3\n").unwrap();

    let output = project.run_bulkgen(&["generate", "shelves.json"]).unwrap();
    assert!(!output.success);
    assert!(output.stderr.contains("more than the configured maximum of 3"));
}

#[test]
fn test_oversized_schema_fails_before_expanding() {
    let project = TestProject::new().unwrap();
    project
        .write_schema(
            "huge.json",
            &SchemaBuilder::new().output(json!({
                "dimensions": ["*NUMERIC(count=1000000000)"],
                "generate": {"name": "{{ dim.1 }}"}
            })),
        )
        .unwrap();

    let output = project.run_bulkgen(&["generate", "huge.json"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("more than the configured maximum of 100000 nodes"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_invalid_config_file() {
    let project = TestProject::new().unwrap();
    project.write_schema("shelves.json", &shelves()).unwrap();
    project.write_file("config.toml", "[generator]\nmax_depth = 0\n").unwrap();

    let output = project.run_bulkgen(&["validate", "shelves.json"]).unwrap();
    assert!(!output.success);
    assert!(output.stderr.contains("generator.max_depth must be at least 1"));
}

#[test]
fn test_validate() {
    let project = TestProject::new().unwrap();
    project.write_schema("shelves.json", &shelves()).unwrap();

    let output = project.run_bulkgen(&["validate", "shelves.json"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("shelves.json is valid"));

    let output = project.run_bulkgen(&["validate", "shelves.json", "--preset", "part-category"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
}

#[test]
fn test_validate_missing_required_fields() {
    let project = TestProject::new().unwrap();
    project
        .write_schema("nameless.json", &SchemaBuilder::new().output(json!({"generate": {"description": "x"}})))
        .unwrap();

    let output = project.run_bulkgen(&["validate", "nameless.json", "--preset", "part"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("'name' are missing in generated keys."));
}

#[test]
fn test_validate_with_fields_file() {
    let project = TestProject::new().unwrap();
    project.write_schema("shelves.json", &shelves()).unwrap();
    project.write_file("fields.yaml", "name:\n  name: Name\n  required: true\n").unwrap();

    let output = project.run_bulkgen(&["validate", "shelves.json", "--fields", "fields.yaml"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
}

#[test]
fn test_missing_schema_file() {
    let project = TestProject::new().unwrap();

    let output = project.run_bulkgen(&["generate", "nope.json"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Failed to read schema"));
}

#[test]
fn test_unknown_preset() {
    let project = TestProject::new().unwrap();
    project.write_schema("shelves.json", &shelves()).unwrap();

    let output = project.run_bulkgen(&["generate", "shelves.json", "--preset", "prt"]).unwrap();
    assert!(!output.success);
    assert!(output.stderr.contains("Unknown preset 'prt'. Did you mean 'part'?"));
}

#[test]
fn test_dimension_command() {
    let project = TestProject::new().unwrap();

    let output = project.run_bulkgen(&["dimension", "*NUMERIC(start=10,step=5)", "--count", "3"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert_eq!(output.stdout, "10\n15\n20\n");

    let output = project.run_bulkgen(&["dimension", "A-1"]).unwrap();
    assert!(!output.success);
    assert!(output.stderr.contains("No generator can produce the range 'A-1'"));
}

#[test]
fn test_fields_command() {
    assert_cmd::Command::cargo_bin("bulkgen")
        .unwrap()
        .args(["fields", "--preset", "part"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"generate_type\": \"single\""))
        .stdout(predicate::str::contains("\"is_template\""));
}

#[test]
fn test_version_flag() {
    assert_cmd::Command::cargo_bin("bulkgen")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
