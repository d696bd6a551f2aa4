//! Field-wise merging of node definitions (`extends` and base children).

use super::{CountSpec, NodeDefinition};

/// Merge `source` into `target`, keeping everything `target` already sets.
///
/// - `childs`: taken from `source` only when `target` has none
/// - `dimensions` / `count`: per position, empty `target` entries are
///   replaced by `source` entries and `source`'s extra entries are appended
/// - `generate`: `source` keys are added where `target` has no or an empty
///   template
/// - everything else: taken from `source` only when `target` has no value
///
/// A `count` entry is empty when it is `null` or an empty string; an explicit
/// `0` is kept.
#[must_use]
pub fn merge(mut target: NodeDefinition, source: &NodeDefinition) -> NodeDefinition {
    if target.childs.is_empty() {
        target.childs = source.childs.clone();
    }

    merge_positional(&mut target.dimensions, &source.dimensions, |d| d.is_empty());
    merge_positional(&mut target.count, &source.count, |c| c.as_ref().is_none_or(CountSpec::is_empty));

    for (key, value) in &source.generate {
        let target_is_empty = target.generate.get(key).is_none_or(|existing| existing.is_blank());
        if target_is_empty && !value.is_blank() {
            target.generate.insert(key.clone(), value.clone());
        }
    }

    if target.extends.is_none() {
        target.extends = source.extends.clone();
    }
    if target.global_context.is_none() {
        target.global_context = source.global_context.clone();
    }
    if target.parent_name_match.is_none() {
        target.parent_name_match = source.parent_name_match.clone();
    }
    if target.child.is_none() {
        target.child = source.child.clone();
    }

    target
}

fn merge_positional<T: Clone>(target: &mut Vec<T>, source: &[T], is_empty: impl Fn(&T) -> bool) {
    for (i, value) in source.iter().enumerate() {
        match target.get_mut(i) {
            Some(existing) if is_empty(existing) => *existing = value.clone(),
            Some(_) => {}
            None => target.push(value.clone()),
        }
    }
}

/// Merge a base child into every child definition.
///
/// Without child definitions the base child becomes the only one.
#[must_use]
pub fn apply_base_child(childs: Vec<NodeDefinition>, base: &NodeDefinition) -> Vec<NodeDefinition> {
    if childs.is_empty() {
        return vec![base.clone()];
    }
    childs.into_iter().map(|child| merge(child, base)).collect()
}
