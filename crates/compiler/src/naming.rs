//! Generated names for anonymous types
//!
//! A name is a pure function of the ownership chain from the nearest named
//! ancestor, so recompiling the same graph yields the same names. Results
//! are cached for the lifetime of one resolver, which lives for one run.

use clientgraph_common::{
    pascal_case, DescriptionGraph, OperationId, OverrideTarget, PropertyOwner, TypeId, TypeKind,
    TypeOwner,
};
use std::collections::HashMap;

/// Depth guard for malformed owner chains
const MAX_OWNER_DEPTH: usize = 64;

#[derive(Debug, Default)]
pub struct NameResolver {
    emitter: Option<String>,
    names: HashMap<TypeId, String>,
    cross_ids: HashMap<TypeId, String>,
}

impl NameResolver {
    pub fn new(emitter: Option<&str>) -> Self {
        Self {
            emitter: emitter.map(str::to_string),
            names: HashMap::new(),
            cross_ids: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.cross_ids.clear();
    }

    /// Client-facing name of a type
    pub fn name_for(&mut self, graph: &DescriptionGraph, id: TypeId) -> String {
        self.name_at_depth(graph, id, 0)
    }

    fn name_at_depth(&mut self, graph: &DescriptionGraph, id: TypeId, depth: usize) -> String {
        if let Some(name) = self.names.get(&id) {
            return name.clone();
        }
        let name = self.compute_name(graph, id, depth);
        self.names.insert(id, name.clone());
        name
    }

    fn compute_name(&mut self, graph: &DescriptionGraph, id: TypeId, depth: usize) -> String {
        if let Some(renamed) = graph
            .overrides
            .client_name(OverrideTarget::Type(id), self.emitter.as_deref())
        {
            return renamed.to_string();
        }
        let node = graph.type_node(id);
        if let Some(name) = &node.name {
            return name.clone();
        }
        if depth > MAX_OWNER_DEPTH {
            return format!("Anonymous{}", id.0);
        }
        let Some(owner) = node.owner else {
            return fallback_name(graph, id);
        };
        match owner {
            TypeOwner::Property { property } => {
                let prop = graph.property(property);
                let prop_name = graph
                    .overrides
                    .client_name(OverrideTarget::Property(property), self.emitter.as_deref())
                    .unwrap_or(&prop.name)
                    .to_string();
                let prefix = match prop.owner {
                    PropertyOwner::Model { model } => self.name_at_depth(graph, model, depth + 1),
                    PropertyOwner::Operation { operation } => {
                        self.operation_name(graph, operation)
                    }
                    PropertyOwner::Namespace { namespace } => {
                        pascal_case(&graph.namespace(namespace).name)
                    }
                };
                format!("{}{}", prefix, pascal_case(&prop_name))
            }
            TypeOwner::OperationRequest { operation } => {
                format!("{}Request", self.operation_name(graph, operation))
            }
            TypeOwner::OperationResponse { operation } => {
                format!("{}Response", self.operation_name(graph, operation))
            }
            TypeOwner::Element { container } => {
                let container_name = self.name_at_depth(graph, container, depth + 1);
                match graph.type_node(container).kind {
                    TypeKind::Nullable { .. } => container_name,
                    _ => singularize(&container_name),
                }
            }
            TypeOwner::Variant { union, index } => {
                let union_name = self.name_at_depth(graph, union, depth + 1);
                let variant = match &graph.type_node(union).kind {
                    TypeKind::Union(u) => u.variants.get(index).and_then(|v| v.name.clone()),
                    _ => None,
                };
                match variant {
                    Some(variant) => format!("{}{}", union_name, pascal_case(&variant)),
                    None => format!("{}Variant{}", union_name, index),
                }
            }
        }
    }

    fn operation_name(&self, graph: &DescriptionGraph, operation: OperationId) -> String {
        let name = graph
            .overrides
            .client_name(OverrideTarget::Operation(operation), self.emitter.as_deref())
            .unwrap_or(&graph.operation(operation).name);
        pascal_case(name)
    }

    /// Dotted structural identifier, unaffected by rename overrides
    pub fn cross_component_id(&mut self, graph: &DescriptionGraph, id: TypeId) -> String {
        if let Some(cached) = self.cross_ids.get(&id) {
            return cached.clone();
        }
        let path = structural_path(graph, id, 0);
        let cross_id = if graph.type_node(id).name.is_some() {
            path
        } else {
            format!("{}.anonymous", path)
        };
        self.cross_ids.insert(id, cross_id.clone());
        cross_id
    }
}

/// Dotted path of an operation, e.g. `Widgets.Parts.upload`
pub fn operation_cross_id(graph: &DescriptionGraph, operation: OperationId) -> String {
    let op = graph.operation(operation);
    let mut path = graph.namespace_path(op.namespace);
    path.push(op.name.clone());
    path.join(".")
}

fn structural_path(graph: &DescriptionGraph, id: TypeId, depth: usize) -> String {
    let node = graph.type_node(id);
    if let Some(name) = &node.name {
        return match node.namespace {
            Some(ns) => format!("{}.{}", graph.namespace_path(ns).join("."), name),
            None => name.clone(),
        };
    }
    if depth > MAX_OWNER_DEPTH {
        return format!("anonymous{}", id.0);
    }
    match node.owner {
        Some(TypeOwner::Property { property }) => {
            let prop = graph.property(property);
            let owner_path = match prop.owner {
                PropertyOwner::Model { model } => structural_path(graph, model, depth + 1),
                PropertyOwner::Operation { operation } => operation_cross_id(graph, operation),
                PropertyOwner::Namespace { namespace } => {
                    graph.namespace_path(namespace).join(".")
                }
            };
            format!("{}.{}", owner_path, prop.name)
        }
        Some(TypeOwner::OperationRequest { operation }) => {
            format!("{}.Request", operation_cross_id(graph, operation))
        }
        Some(TypeOwner::OperationResponse { operation }) => {
            format!("{}.Response", operation_cross_id(graph, operation))
        }
        Some(TypeOwner::Element { container }) => {
            let container_path = structural_path(graph, container, depth + 1);
            match graph.type_node(container).kind {
                TypeKind::Array { .. } => format!("{}.items", container_path),
                TypeKind::Dict { .. } => format!("{}.values", container_path),
                _ => container_path,
            }
        }
        Some(TypeOwner::Variant { union, index }) => {
            let union_path = structural_path(graph, union, depth + 1);
            let variant = match &graph.type_node(union).kind {
                TypeKind::Union(u) => u.variants.get(index).and_then(|v| v.name.clone()),
                _ => None,
            };
            format!("{}.{}", union_path, variant.unwrap_or_else(|| index.to_string()))
        }
        None => format!("anonymous{}", id.0),
    }
}

/// Name for an anonymous node with no owner link
fn fallback_name(graph: &DescriptionGraph, id: TypeId) -> String {
    let kind = pascal_case(graph.type_node(id).kind_name());
    format!("Anonymous{}{}", kind, id.0)
}

/// Singular form of a PascalCase name, used for element types
pub fn singularize(name: &str) -> String {
    let singular = if let Some(stem) = name.strip_suffix("ies") {
        format!("{}y", stem)
    } else if name.ends_with("sses")
        || name.ends_with("xes")
        || name.ends_with("ches")
        || name.ends_with("shes")
    {
        name[..name.len() - 2].to_string()
    } else if name.ends_with('s') && !name.ends_with("ss") && name.len() > 1 {
        name[..name.len() - 1].to_string()
    } else {
        String::new()
    };
    if singular.is_empty() || singular == name {
        format!("{}Item", name)
    } else {
        singular
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientgraph_common::{Directive, GraphBuilder, HttpVerb, ParameterLocation, PrimitiveKind};

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("WidgetParts"), "WidgetPart");
        assert_eq!(singularize("Policies"), "Policy");
        assert_eq!(singularize("Boxes"), "Box");
        assert_eq!(singularize("Address"), "AddressItem");
        assert_eq!(singularize("Data"), "DataItem");
    }

    #[test]
    fn test_property_owned_name() {
        let mut b = GraphBuilder::new();
        let svc = b.service("Widgets");
        let widget = b.model(svc, "Widget");
        let details = b.anonymous_model();
        b.property(widget, "details", details);

        let graph = b.build();
        let mut names = NameResolver::new(None);
        assert_eq!(names.name_for(&graph, details), "WidgetDetails");
        assert_eq!(
            names.cross_component_id(&graph, details),
            "Widgets.Widget.details.anonymous"
        );
    }

    #[test]
    fn test_operation_owned_and_element_names() {
        let mut b = GraphBuilder::new();
        let svc = b.service("Widgets");
        let s = b.primitive(PrimitiveKind::String);
        let op = b.operation(svc, "listParts", HttpVerb::Get, "/parts");
        let part = b.anonymous_model();
        b.property(part, "id", s);
        let parts = b.array(part);
        b.parameter(op, "filters", parts, ParameterLocation::Query);
        let response = b.anonymous_model();
        b.response(op, clientgraph_common::StatusCodes::Exact(200), Some(response));

        let graph = b.build();
        let mut names = NameResolver::new(None);
        assert_eq!(names.name_for(&graph, parts), "ListPartsFilters");
        assert_eq!(names.name_for(&graph, part), "ListPartsFilter");
        assert_eq!(names.name_for(&graph, response), "ListPartsResponse");
        assert_eq!(
            names.cross_component_id(&graph, response),
            "Widgets.listParts.Response.anonymous"
        );
    }

    #[test]
    fn test_rename_does_not_change_cross_id() {
        let mut b = GraphBuilder::new();
        let svc = b.service("Widgets");
        let widget = b.model(svc, "Widget");
        b.add_override(
            OverrideTarget::Type(widget),
            Directive::ClientName("Gadget".to_string()),
            Some("python"),
        );

        let graph = b.build();
        let mut python = NameResolver::new(Some("python"));
        assert_eq!(python.name_for(&graph, widget), "Gadget");
        assert_eq!(python.cross_component_id(&graph, widget), "Widgets.Widget");
        let mut java = NameResolver::new(Some("java"));
        assert_eq!(java.name_for(&graph, widget), "Widget");
    }
}
