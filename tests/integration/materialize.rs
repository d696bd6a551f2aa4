use bulkgen_cli::fields::preset;
use bulkgen_cli::materialize::{GenerateType, materialize};
use bulkgen_cli::test_utils::MemoryStore;
use serde_json::json;

use crate::common::SchemaBuilder;

fn warehouse() -> SchemaBuilder {
    SchemaBuilder::new().output(json!({
        "dimensions": ["A-B"],
        "generate": {"name": "{{ dim.1 }}", "description": "Aisle {{ dim.1 }}"},
        "child": {
            "dimensions": ["1-2"],
            "generate": {"name": "{{ par.gen.name }}{{ dim.1 }}"}
        }
    }))
}

#[test]
fn test_generated_tree_is_stored_below_parent() {
    let location = preset("stock-location").unwrap();
    let nodes = warehouse().generator().with_fields(location.fields.clone()).generate().unwrap();

    let mut store = MemoryStore::default();
    let allow_list: Vec<&str> = location.fields.keys().map(String::as_str).collect();
    let ids = materialize(&mut store, &nodes, &allow_list, location.generate_type, Some(&42)).unwrap();

    assert_eq!(ids.len(), 6);
    assert_eq!(store.committed, 1);

    let stored: Vec<_> = store
        .records
        .iter()
        .map(|record| (record.fields["name"].as_str().unwrap_or_default(), record.parent))
        .collect();
    assert_eq!(
        stored,
        vec![("A", Some(42)), ("A1", Some(1)), ("A2", Some(1)), ("B", Some(42)), ("B1", Some(4)), ("B2", Some(4))]
    );
}

#[test]
fn test_single_type_ignores_children() {
    let nodes = warehouse().generator().generate().unwrap();

    let mut store = MemoryStore::default();
    let ids = materialize(&mut store, &nodes, &["name"], GenerateType::Single, Some(&9)).unwrap();

    assert_eq!(ids, vec![1, 2]);
    assert!(store.records.iter().all(|record| record.parent == Some(9)));
    assert!(store.records.iter().all(|record| !record.fields.contains_key("description")));
}

#[test]
fn test_failed_create_keeps_nothing() {
    let nodes = warehouse().generator().generate().unwrap();

    let mut store = MemoryStore::failing_on("B1");
    let err = materialize(&mut store, &nodes, &["name"], GenerateType::Tree, None).unwrap_err();

    assert_eq!(err, "cannot store 'B1'");
    assert!(store.records.is_empty());
    assert_eq!(store.rolled_back, 1);
    assert_eq!(store.committed, 0);
}
