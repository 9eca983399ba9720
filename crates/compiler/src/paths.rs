//! Property path resolution inside response envelopes
//!
//! Paging and long-running metadata locate values as a chain of properties
//! starting at a wire body. Selectors are either a dotted name path or a
//! property identity, the latter matched through spread source links.

use clientgraph_common::{DescriptionGraph, PropertyId, PropertySelector, TypeId};
use std::collections::{HashSet, VecDeque};

/// Properties of a model with inherited ones first
pub fn properties_base_first(graph: &DescriptionGraph, model: TypeId) -> Vec<PropertyId> {
    let mut chain = Vec::new();
    let mut current = Some(model);
    while let Some(id) = current {
        if chain.contains(&id) {
            break;
        }
        chain.push(id);
        current = graph.type_node(id).as_model().and_then(|m| m.base);
    }
    chain
        .iter()
        .rev()
        .filter_map(|id| graph.type_node(*id).as_model())
        .flat_map(|m| m.properties.iter().copied())
        .collect()
}

/// Locate `selector` starting at `root`; `None` when it cannot be found
pub fn resolve_segments(
    graph: &DescriptionGraph,
    root: TypeId,
    selector: &PropertySelector,
) -> Option<Vec<PropertyId>> {
    match selector {
        PropertySelector::Path(path) => resolve_path(graph, root, path),
        PropertySelector::Property(target) => search_property(graph, root, *target),
    }
}

fn resolve_path(graph: &DescriptionGraph, root: TypeId, path: &str) -> Option<Vec<PropertyId>> {
    let mut segments = Vec::new();
    let mut current = root;
    for name in path.split('.').filter(|s| !s.is_empty()) {
        let model = graph.non_nullable(current);
        let property = graph.find_property(model, name)?;
        segments.push(property);
        current = graph.property(property).type_id;
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

fn search_property(
    graph: &DescriptionGraph,
    root: TypeId,
    target: PropertyId,
) -> Option<Vec<PropertyId>> {
    let wanted = graph.root_source(target);
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((graph.non_nullable(root), Vec::new()));

    while let Some((model, path)) = queue.pop_front() {
        if !visited.insert(model) || !graph.type_node(model).is_model() {
            continue;
        }
        let properties = properties_base_first(graph, model);
        for property in &properties {
            if graph.root_source(*property) == wanted {
                let mut found = path.clone();
                found.push(*property);
                return Some(found);
            }
        }
        for property in properties {
            let nested = graph.non_nullable(graph.property(property).type_id);
            if graph.type_node(nested).is_model() {
                let mut next = path.clone();
                next.push(property);
                queue.push_back((nested, next));
            }
        }
    }
    None
}

/// Type at the end of a segment chain
pub fn segments_type(graph: &DescriptionGraph, segments: &[PropertyId]) -> Option<TypeId> {
    segments.last().map(|p| graph.property(*p).type_id)
}
