//! Handing generated trees to a host store.
//!
//! The engine never persists anything. Hosts implement [`Materializer`] for
//! their store and call [`materialize`] with the generated nodes; every node
//! becomes one entity. The whole call is one transaction: on the first failed
//! `create` or a failed `commit` the materializer is rolled back and nothing
//! is kept.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::generator::GeneratedNode;

/// How generated nodes map to entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateType {
    /// Every node is created below the entity of its parent node
    #[default]
    Tree,
    /// Only top-level nodes are created below the given parent, children are ignored
    Single,
}

/// A store that turns field maps into entities
pub trait Materializer {
    /// Identifier of a created entity
    type Id: Clone;
    type Error;

    /// Create one entity below `parent`.
    fn create(&mut self, fields: Map<String, Value>, parent: Option<&Self::Id>) -> Result<Self::Id, Self::Error>;

    /// Called before the first `create`.
    fn begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after the last successful `create`.
    fn commit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when a `create` or the `commit` failed.
    fn rollback(&mut self) {}
}

fn allowed_fields(fields: &Map<String, Value>, allow_list: &[&str]) -> Map<String, Value> {
    fields.iter().filter(|(key, _)| allow_list.contains(&key.as_str())).map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn create_tree<M: Materializer>(
    materializer: &mut M,
    nodes: &[GeneratedNode],
    allow_list: &[&str],
    parent: Option<&M::Id>,
    created: &mut Vec<M::Id>,
) -> Result<(), M::Error> {
    for node in nodes {
        let id = materializer.create(allowed_fields(&node.fields, allow_list), parent)?;
        created.push(id.clone());
        create_tree(materializer, &node.children, allow_list, Some(&id), created)?;
    }
    Ok(())
}

/// Create one entity per generated node.
///
/// Only fields named in `allow_list` are passed on. Returns the ids of all
/// created entities in creation order (depth-first, parents first).
///
/// # Errors
///
/// The first error of the materializer, including a failed commit, after
/// rolling it back.
pub fn materialize<M: Materializer>(
    materializer: &mut M,
    nodes: &[GeneratedNode],
    allow_list: &[&str],
    generate_type: GenerateType,
    parent: Option<&M::Id>,
) -> Result<Vec<M::Id>, M::Error> {
    materializer.begin()?;

    let mut created = Vec::new();
    let result = match generate_type {
        GenerateType::Tree => create_tree(materializer, nodes, allow_list, parent, &mut created),
        GenerateType::Single => nodes.iter().try_for_each(|node| {
            created.push(materializer.create(allowed_fields(&node.fields, allow_list), parent)?);
            Ok(())
        }),
    };

    match result.and_then(|()| materializer.commit()) {
        Ok(()) => {
            debug!("Materialized {} entities", created.len());
            Ok(created)
        }
        Err(err) => {
            materializer.rollback();
            Err(err)
        }
    }
}
