//! Programmatic construction of description graphs
//!
//! `GraphBuilder` keeps ownership links consistent: an anonymous type gets
//! its owner the first time it is attached to a property, container, union,
//! or operation, so generated names can be derived later.

use crate::flags::Access;
use crate::graph::*;
use crate::overrides::{Directive, OverrideEntry, OverrideTarget};

#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DescriptionGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> DescriptionGraph {
        self.graph
    }

    pub fn graph(&self) -> &DescriptionGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut DescriptionGraph {
        &mut self.graph
    }

    fn add_namespace(
        &mut self,
        parent: Option<NamespaceId>,
        name: &str,
        kind: NamespaceKind,
        is_service: bool,
    ) -> NamespaceId {
        self.graph.add_namespace(NamespaceNode {
            name: name.to_string(),
            parent,
            kind,
            operations: Vec::new(),
            children: Vec::new(),
            types: Vec::new(),
            is_service,
            servers: Vec::new(),
            credential: None,
            client: None,
            doc: None,
        })
    }

    /// Top-level service namespace
    pub fn service(&mut self, name: &str) -> NamespaceId {
        self.add_namespace(None, name, NamespaceKind::Namespace, true)
    }

    pub fn namespace(&mut self, parent: NamespaceId, name: &str) -> NamespaceId {
        self.add_namespace(Some(parent), name, NamespaceKind::Namespace, false)
    }

    pub fn interface(&mut self, parent: NamespaceId, name: &str) -> NamespaceId {
        self.add_namespace(Some(parent), name, NamespaceKind::Interface, false)
    }

    pub fn declare_client(&mut self, namespace: NamespaceId, name: Option<&str>, independent: bool) {
        self.graph.namespace_mut(namespace).client = Some(ClientDeclaration {
            name: name.map(str::to_string),
            independent,
        });
    }

    pub fn credential(&mut self, namespace: NamespaceId, scheme: CredentialScheme) {
        self.graph.namespace_mut(namespace).credential = Some(scheme);
    }

    /// Declare a server url; returns the namespace-owned template arguments
    pub fn server(
        &mut self,
        namespace: NamespaceId,
        url: &str,
        arguments: &[(&str, TypeId, ParameterLocation)],
    ) -> Vec<PropertyId> {
        let mut parameters = Vec::new();
        let mut ids = Vec::new();
        for (name, type_id, location) in arguments {
            let property = self.new_property(
                name,
                PropertyOwner::Namespace { namespace },
                *type_id,
            );
            parameters.push(WireParameter {
                property,
                location: *location,
                body_kind: BodyKind::Explicit,
            });
            ids.push(property);
        }
        self.graph.namespace_mut(namespace).servers.push(ServerTemplate {
            url: url.to_string(),
            parameters,
        });
        ids
    }

    pub fn primitive(&mut self, primitive: PrimitiveKind) -> TypeId {
        self.graph
            .add_type(TypeNode::new(TypeKind::Primitive { primitive }))
    }

    pub fn constant(&mut self, value: LiteralValue, primitive: PrimitiveKind) -> TypeId {
        self.graph
            .add_type(TypeNode::new(TypeKind::Constant { value, primitive }))
    }

    /// Named type of any kind declared in `namespace`
    pub fn declare(&mut self, namespace: NamespaceId, name: &str, kind: TypeKind) -> TypeId {
        let mut node = TypeNode::new(kind);
        node.name = Some(name.to_string());
        node.namespace = Some(namespace);
        let id = self.graph.add_type(node);
        self.graph.namespace_mut(namespace).types.push(id);
        id
    }

    pub fn model(&mut self, namespace: NamespaceId, name: &str) -> TypeId {
        self.declare(namespace, name, TypeKind::Model(ModelType::default()))
    }

    /// Model without a name; its owner is set when it is first attached
    pub fn anonymous_model(&mut self) -> TypeId {
        self.graph
            .add_type(TypeNode::new(TypeKind::Model(ModelType::default())))
    }

    pub fn enumeration(
        &mut self,
        namespace: NamespaceId,
        name: &str,
        members: &[(&str, LiteralValue)],
        is_fixed: bool,
    ) -> TypeId {
        let value_kind = match members.first() {
            Some((_, LiteralValue::Number(_))) => PrimitiveKind::Float64,
            _ => PrimitiveKind::String,
        };
        let members = members
            .iter()
            .map(|(name, value)| EnumMember {
                name: name.to_string(),
                value: value.clone(),
            })
            .collect();
        self.declare(
            namespace,
            name,
            TypeKind::Enum(EnumType {
                members,
                value_kind,
                is_fixed,
            }),
        )
    }

    /// Union, named when `declaration` is given
    pub fn union(
        &mut self,
        declaration: Option<(NamespaceId, &str)>,
        variants: &[(Option<&str>, TypeId)],
    ) -> TypeId {
        let kind = TypeKind::Union(UnionType::default());
        let id = match declaration {
            Some((namespace, name)) => self.declare(namespace, name, kind),
            None => self.graph.add_type(TypeNode::new(kind)),
        };
        self.union_variants(id, variants);
        id
    }

    /// Replace the variants of an existing union node
    pub fn union_variants(&mut self, union: TypeId, variants: &[(Option<&str>, TypeId)]) {
        self.graph.type_node_mut(union).kind = TypeKind::Union(UnionType {
            variants: variants
                .iter()
                .map(|(name, type_id)| UnionVariant {
                    name: name.map(str::to_string),
                    type_id: *type_id,
                })
                .collect(),
        });
        for (index, (_, variant)) in variants.iter().enumerate() {
            self.adopt(*variant, TypeOwner::Variant { union, index });
        }
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        let id = self.graph.add_type(TypeNode::new(TypeKind::Array { element }));
        self.adopt(element, TypeOwner::Element { container: id });
        id
    }

    pub fn dict(&mut self, element: TypeId) -> TypeId {
        let id = self.graph.add_type(TypeNode::new(TypeKind::Dict { element }));
        self.adopt(element, TypeOwner::Element { container: id });
        id
    }

    pub fn nullable(&mut self, inner: TypeId) -> TypeId {
        let id = self.graph.add_type(TypeNode::new(TypeKind::Nullable { inner }));
        self.adopt(inner, TypeOwner::Element { container: id });
        id
    }

    /// Give an anonymous, unowned type its structural owner
    pub fn adopt(&mut self, type_id: TypeId, owner: TypeOwner) {
        let node = self.graph.type_node_mut(type_id);
        let scalar = matches!(
            node.kind,
            TypeKind::Primitive { .. } | TypeKind::Constant { .. }
        );
        if node.name.is_none() && node.owner.is_none() && !scalar {
            node.owner = Some(owner);
        }
    }

    fn new_property(&mut self, name: &str, owner: PropertyOwner, type_id: TypeId) -> PropertyId {
        let id = self.graph.add_property(PropertyNode {
            name: name.to_string(),
            serialized_name: name.to_string(),
            owner,
            type_id,
            optional: false,
            discriminator: false,
            visibility_restricted: false,
            source: None,
            access: None,
            doc: None,
        });
        self.adopt(type_id, TypeOwner::Property { property: id });
        id
    }

    pub fn property(&mut self, model: TypeId, name: &str, type_id: TypeId) -> PropertyId {
        let id = self.new_property(name, PropertyOwner::Model { model }, type_id);
        if let Some(model) = self.graph.type_node_mut(model).as_model_mut() {
            model.properties.push(id);
        }
        id
    }

    pub fn optional_property(&mut self, model: TypeId, name: &str, type_id: TypeId) -> PropertyId {
        let id = self.property(model, name, type_id);
        self.graph.property_mut(id).optional = true;
        id
    }

    pub fn serialized_as(&mut self, property: PropertyId, wire_name: &str) {
        self.graph.property_mut(property).serialized_name = wire_name.to_string();
    }

    /// Record that `property` was copied from `source` by spreading
    pub fn spread_from(&mut self, property: PropertyId, source: PropertyId) {
        self.graph.property_mut(property).source = Some(source);
    }

    pub fn extends(&mut self, derived: TypeId, base: TypeId) {
        if let Some(model) = self.graph.type_node_mut(derived).as_model_mut() {
            model.base = Some(base);
        }
    }

    /// Make `base` polymorphic on `property_name`
    pub fn discriminator(&mut self, base: TypeId, property_name: &str) {
        if let Some(model) = self.graph.type_node_mut(base).as_model_mut() {
            model.discriminator = Some(property_name.to_string());
        }
        if let Some(property) = self.graph.find_property(base, property_name) {
            self.graph.property_mut(property).discriminator = true;
        }
    }

    /// Register `derived` as the subtype selected by `value`
    pub fn subtype(&mut self, base: TypeId, derived: TypeId, value: &str) {
        self.extends(derived, base);
        if let Some(model) = self.graph.type_node_mut(derived).as_model_mut() {
            model.discriminator_value = Some(value.to_string());
        }
        if let Some(model) = self.graph.type_node_mut(base).as_model_mut() {
            model.subtypes.insert(value.to_string(), derived);
        }
    }

    pub fn additional_properties(&mut self, model: TypeId, value_type: TypeId) {
        if let Some(model) = self.graph.type_node_mut(model).as_model_mut() {
            model.additional_properties = Some(value_type);
        }
    }

    pub fn operation(
        &mut self,
        namespace: NamespaceId,
        name: &str,
        verb: HttpVerb,
        route: &str,
    ) -> OperationId {
        self.graph.add_operation(OperationNode {
            name: name.to_string(),
            namespace,
            verb,
            route: route.to_string(),
            protocol: Protocol::Http,
            parameters: Vec::new(),
            responses: Vec::new(),
            pageable: None,
            long_running: None,
            operation_id: None,
            doc: None,
        })
    }

    fn operation_mut(&mut self, operation: OperationId) -> &mut OperationNode {
        self.graph.operation_mut(operation)
    }

    pub fn parameter(
        &mut self,
        operation: OperationId,
        name: &str,
        type_id: TypeId,
        location: ParameterLocation,
    ) -> PropertyId {
        let property = self.new_property(name, PropertyOwner::Operation { operation }, type_id);
        self.operation_mut(operation).parameters.push(WireParameter {
            property,
            location,
            body_kind: BodyKind::Explicit,
        });
        property
    }

    pub fn body(&mut self, operation: OperationId, name: &str, type_id: TypeId, kind: BodyKind) -> PropertyId {
        let property = self.new_property(name, PropertyOwner::Operation { operation }, type_id);
        if kind == BodyKind::Spread {
            let node = self.graph.type_node_mut(type_id);
            if node.name.is_none() {
                node.owner = Some(TypeOwner::OperationRequest { operation });
            }
        }
        self.operation_mut(operation).parameters.push(WireParameter {
            property,
            location: ParameterLocation::Body,
            body_kind: kind,
        });
        property
    }

    /// Add a response; returns its index
    pub fn response(&mut self, operation: OperationId, status: StatusCodes, body: Option<TypeId>) -> usize {
        if let Some(body) = body {
            self.adopt(body, TypeOwner::OperationResponse { operation });
        }
        let op = self.operation_mut(operation);
        op.responses.push(OperationResponse {
            status,
            body,
            nullable_body: false,
            headers: Vec::new(),
        });
        op.responses.len() - 1
    }

    pub fn nullable_response(&mut self, operation: OperationId, response: usize) {
        self.operation_mut(operation).responses[response].nullable_body = true;
    }

    pub fn response_header(
        &mut self,
        operation: OperationId,
        response: usize,
        name: &str,
        type_id: TypeId,
    ) -> PropertyId {
        let property = self.new_property(name, PropertyOwner::Operation { operation }, type_id);
        self.operation_mut(operation).responses[response]
            .headers
            .push(property);
        property
    }

    pub fn pageable(&mut self, operation: OperationId, marker: PageableMarker) {
        self.operation_mut(operation).pageable = Some(marker);
    }

    pub fn long_running(&mut self, operation: OperationId, marker: LroMarker) {
        self.operation_mut(operation).long_running = Some(marker);
    }

    pub fn operation_id(&mut self, operation: OperationId, id: &str) {
        self.operation_mut(operation).operation_id = Some(id.to_string());
    }

    pub fn protocol(&mut self, operation: OperationId, protocol: Protocol) {
        self.operation_mut(operation).protocol = protocol;
    }

    pub fn add_override(&mut self, target: OverrideTarget, directive: Directive, scope: Option<&str>) {
        let entry = OverrideEntry::new(target, directive);
        let entry = match scope {
            Some(scope) => entry.scoped(scope),
            None => entry,
        };
        self.graph.overrides.push(entry);
    }

    pub fn access(&mut self, target: OverrideTarget, access: Access, scope: Option<&str>) {
        self.add_override(target, Directive::Access(access), scope);
    }
}
