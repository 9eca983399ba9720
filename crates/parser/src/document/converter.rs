//! Converts a graph document into a `DescriptionGraph`
//!
//! Named types are allocated before any of them is filled in, so forward
//! and cyclic references resolve to the same node. References to spread
//! sources and final operations are resolved after every property and
//! operation exists.

use super::types::*;
use clientgraph_common::{
    Access, DescriptionGraph, Directive, EnumMember, EnumType, GraphBuilder, GraphError,
    LiteralValue, LroMarker, LroResult, ModelType, NamespaceId, OperationId, OverrideTarget,
    PageableMarker, ParameterLocation, PrimitiveKind, PropertyId, PropertySelector, Protocol,
    Result, StatusCodes, TypeId, TypeKind, TypeOwner, UsageFlags,
};
use std::collections::HashMap;

/// Convert a parsed document into the arena graph
pub fn convert_document(document: &GraphDocument) -> Result<DescriptionGraph> {
    let mut converter = Converter::new(document);
    converter.declare_namespaces();
    converter.declare_types()?;
    converter.fill_types()?;
    converter.convert_operations()?;
    converter.resolve_pending()?;
    converter.convert_overrides()?;
    Ok(converter.builder.build())
}

struct Converter<'a> {
    document: &'a GraphDocument,
    builder: GraphBuilder,
    namespaces: HashMap<String, NamespaceId>,
    /// Namespace declarations in traversal order, with their dotted path
    namespace_decls: Vec<(NamespaceId, String, &'a NamespaceDecl)>,
    named: HashMap<String, TypeId>,
    primitives: HashMap<PrimitiveKind, TypeId>,
    properties: HashMap<String, PropertyId>,
    operations: HashMap<String, OperationId>,
    pending_sources: Vec<(PropertyId, String)>,
    pending_final_operations: Vec<(OperationId, String)>,
}

impl<'a> Converter<'a> {
    fn new(document: &'a GraphDocument) -> Self {
        Self {
            document,
            builder: GraphBuilder::new(),
            namespaces: HashMap::new(),
            namespace_decls: Vec::new(),
            named: HashMap::new(),
            primitives: HashMap::new(),
            properties: HashMap::new(),
            operations: HashMap::new(),
            pending_sources: Vec::new(),
            pending_final_operations: Vec::new(),
        }
    }

    fn declare_namespaces(&mut self) {
        let document = self.document;
        for service in &document.services {
            let id = self.builder.service(&service.name);
            self.declare_namespace_tree(id, service.name.clone(), service);
        }
    }

    fn declare_namespace_tree(&mut self, id: NamespaceId, path: String, decl: &'a NamespaceDecl) {
        if let Some(client) = &decl.client {
            self.builder
                .declare_client(id, client.name.as_deref(), client.independent);
        }
        if let Some(credential) = &decl.credential {
            self.builder.credential(id, credential.clone());
        }
        self.builder.graph_mut().namespace_mut(id).doc = decl.doc.clone();
        self.namespaces.insert(path.clone(), id);
        self.namespace_decls.push((id, path.clone(), decl));

        for child in &decl.namespaces {
            let child_id = self.builder.namespace(id, &child.name);
            self.declare_namespace_tree(child_id, format!("{}.{}", path, child.name), child);
        }
        for child in &decl.interfaces {
            let child_id = self.builder.interface(id, &child.name);
            self.declare_namespace_tree(child_id, format!("{}.{}", path, child.name), child);
        }
    }

    fn namespace_for(&self, path: Option<&str>, owner: &str) -> Result<NamespaceId> {
        match path {
            Some(path) => self.namespaces.get(path).copied().ok_or_else(|| {
                GraphError::InvalidReference(format!(
                    "namespace '{}' referenced by type '{}'",
                    path, owner
                ))
            }),
            None => self
                .namespace_decls
                .first()
                .map(|(id, _, _)| *id)
                .ok_or_else(|| {
                    GraphError::Parse(format!(
                        "type '{}' declared without any service namespace",
                        owner
                    ))
                }),
        }
    }

    /// Allocate a node for every named type
    fn declare_types(&mut self) -> Result<()> {
        let document = self.document;
        for (key, decl) in &document.types {
            let namespace_path = match decl {
                TypeDecl::Model(model) => model.namespace.as_deref(),
                TypeDecl::Enum(decl) => decl.namespace.as_deref(),
                TypeDecl::Union(decl) => decl.namespace.as_deref(),
                _ => None,
            };
            let namespace = self.namespace_for(namespace_path, key)?;
            let id = self
                .builder
                .declare(namespace, key, TypeKind::Model(ModelType::default()));
            self.named.insert(key.clone(), id);
        }
        Ok(())
    }

    fn fill_types(&mut self) -> Result<()> {
        let document = self.document;
        for (key, decl) in &document.types {
            let id = self.named[key];
            self.fill_type(id, key, decl)?;
        }

        // Polymorphism needs every model's properties in place
        for (key, decl) in &document.types {
            let TypeDecl::Model(model) = decl else {
                continue;
            };
            let id = self.named[key];
            if let Some(discriminator) = &model.discriminator {
                self.builder.discriminator(id, discriminator);
            }
            if let (Some(base), Some(value)) = (&model.base, &model.discriminator_value) {
                let base = self.named_type(base, key)?;
                self.builder.subtype(base, id, value);
            }
        }
        Ok(())
    }

    fn fill_type(&mut self, id: TypeId, key: &str, decl: &TypeDecl) -> Result<()> {
        match decl {
            TypeDecl::Model(model) => {
                self.fill_model(id, Some(key), model)?;
            }
            TypeDecl::Enum(decl) => {
                self.builder.graph_mut().type_node_mut(id).kind = enum_kind(decl)?;
                self.builder.graph_mut().type_node_mut(id).doc = decl.doc.clone();
            }
            TypeDecl::Union(decl) => {
                let variants = self.resolve_variants(&decl.variants)?;
                let borrowed: Vec<(Option<&str>, TypeId)> = variants
                    .iter()
                    .map(|(name, ty)| (name.as_deref(), *ty))
                    .collect();
                self.builder.union_variants(id, &borrowed);
                self.builder.graph_mut().type_node_mut(id).doc = decl.doc.clone();
            }
            TypeDecl::Array { items } => {
                let element = self.resolve(items)?;
                self.builder.graph_mut().type_node_mut(id).kind = TypeKind::Array { element };
                self.builder.adopt(element, TypeOwner::Element { container: id });
            }
            TypeDecl::Dict { values } => {
                let element = self.resolve(values)?;
                self.builder.graph_mut().type_node_mut(id).kind = TypeKind::Dict { element };
                self.builder.adopt(element, TypeOwner::Element { container: id });
            }
            TypeDecl::Nullable { inner } => {
                let inner = self.resolve(inner)?;
                self.builder.graph_mut().type_node_mut(id).kind = TypeKind::Nullable { inner };
                self.builder.adopt(inner, TypeOwner::Element { container: id });
            }
            TypeDecl::Constant { value } => {
                let (value, primitive) = literal(value)?;
                self.builder.graph_mut().type_node_mut(id).kind =
                    TypeKind::Constant { value, primitive };
            }
        }
        Ok(())
    }

    fn fill_model(&mut self, id: TypeId, key: Option<&str>, model: &ModelDecl) -> Result<()> {
        for prop in &model.properties {
            let type_id = self.resolve(&prop.type_ref)?;
            let pid = self.builder.property(id, &prop.name, type_id);
            let node = self.builder.graph_mut().property_mut(pid);
            node.optional = prop.optional;
            node.visibility_restricted = prop.visibility_restricted;
            node.doc = prop.doc.clone();
            if let Some(wire) = &prop.serialized_name {
                node.serialized_name = wire.clone();
            }
            if let Some(source) = &prop.source {
                self.pending_sources.push((pid, source.clone()));
            }
            if let Some(key) = key {
                self.properties.insert(format!("{}.{}", key, prop.name), pid);
            }
        }
        let owner = key.unwrap_or("<anonymous>");
        if let Some(base) = &model.base {
            let base = self.named_type(base, owner)?;
            self.builder.extends(id, base);
        }
        if let Some(additional) = &model.additional_properties {
            let value_type = self.resolve(additional)?;
            self.builder.additional_properties(id, value_type);
        }
        self.builder.graph_mut().type_node_mut(id).doc = model.doc.clone();
        Ok(())
    }

    fn resolve_variants(&mut self, variants: &[VariantDecl]) -> Result<Vec<(Option<String>, TypeId)>> {
        variants
            .iter()
            .map(|variant| Ok((variant.name.clone(), self.resolve(&variant.type_ref)?)))
            .collect()
    }

    fn named_type(&self, key: &str, referrer: &str) -> Result<TypeId> {
        self.named.get(key).copied().ok_or_else(|| {
            GraphError::InvalidReference(format!("type '{}' referenced by '{}'", key, referrer))
        })
    }

    /// Resolve a type reference, creating nodes for inline declarations
    fn resolve(&mut self, type_ref: &TypeRef) -> Result<TypeId> {
        match type_ref {
            TypeRef::Named(key) => {
                if let Some(id) = self.named.get(key) {
                    return Ok(*id);
                }
                let primitive = primitive_kind(key).ok_or_else(|| {
                    GraphError::InvalidReference(format!("unknown type '{}'", key))
                })?;
                if let Some(id) = self.primitives.get(&primitive) {
                    return Ok(*id);
                }
                let id = self.builder.primitive(primitive);
                self.primitives.insert(primitive, id);
                Ok(id)
            }
            TypeRef::Inline(decl) => self.resolve_inline(decl),
        }
    }

    fn resolve_inline(&mut self, decl: &TypeDecl) -> Result<TypeId> {
        match decl {
            TypeDecl::Model(model) => {
                let id = self.builder.anonymous_model();
                self.fill_model(id, None, model)?;
                Ok(id)
            }
            TypeDecl::Enum(decl) => {
                let kind = enum_kind(decl)?;
                Ok(self
                    .builder
                    .graph_mut()
                    .add_type(clientgraph_common::TypeNode::new(kind)))
            }
            TypeDecl::Union(decl) => {
                let variants = self.resolve_variants(&decl.variants)?;
                let borrowed: Vec<(Option<&str>, TypeId)> = variants
                    .iter()
                    .map(|(name, ty)| (name.as_deref(), *ty))
                    .collect();
                Ok(self.builder.union(None, &borrowed))
            }
            TypeDecl::Array { items } => {
                let element = self.resolve(items)?;
                Ok(self.builder.array(element))
            }
            TypeDecl::Dict { values } => {
                let element = self.resolve(values)?;
                Ok(self.builder.dict(element))
            }
            TypeDecl::Nullable { inner } => {
                let inner = self.resolve(inner)?;
                Ok(self.builder.nullable(inner))
            }
            TypeDecl::Constant { value } => {
                let (value, primitive) = literal(value)?;
                Ok(self.builder.constant(value, primitive))
            }
        }
    }

    fn convert_operations(&mut self) -> Result<()> {
        let decls = self.namespace_decls.clone();
        for (namespace, path, decl) in decls {
            for server in &decl.servers {
                let mut arguments = Vec::new();
                for param in &server.parameters {
                    let type_id = self.resolve(&param.type_ref)?;
                    arguments.push((param.name.as_str(), type_id, location(param.location)));
                }
                self.builder.server(namespace, &server.url, &arguments);
            }
            for op in &decl.operations {
                let op_path = format!("{}.{}", path, op.name);
                let id = self.convert_operation(namespace, &op_path, op)?;
                self.operations.insert(op_path, id);
            }
        }
        Ok(())
    }

    fn convert_operation(
        &mut self,
        namespace: NamespaceId,
        op_path: &str,
        decl: &OperationDecl,
    ) -> Result<OperationId> {
        let id = self
            .builder
            .operation(namespace, &decl.name, decl.verb, &decl.route);
        if let Some(protocol) = &decl.protocol {
            if !protocol.eq_ignore_ascii_case("http") {
                self.builder.protocol(id, Protocol::Other(protocol.clone()));
            }
        }
        if let Some(operation_id) = &decl.operation_id {
            self.builder.operation_id(id, operation_id);
        }
        self.builder.graph_mut().operation_mut(id).doc = decl.doc.clone();

        for param in &decl.parameters {
            let type_id = self.resolve(&param.type_ref)?;
            let pid = match param.location {
                LocationDecl::Body => self.builder.body(id, &param.name, type_id, param.body_kind),
                other => self
                    .builder
                    .parameter(id, &param.name, type_id, location(other)),
            };
            let node = self.builder.graph_mut().property_mut(pid);
            node.optional = param.optional;
            node.doc = param.doc.clone();
            if let Some(wire) = &param.serialized_name {
                node.serialized_name = wire.clone();
            }
            if let Some(source) = &param.source {
                self.pending_sources.push((pid, source.clone()));
            }
            self.properties.insert(format!("{}.{}", op_path, param.name), pid);
        }

        for response in &decl.responses {
            let status = parse_status(&response.status)?;
            let body = match &response.body {
                Some(body) => Some(self.resolve(body)?),
                None => None,
            };
            let index = self.builder.response(id, status, body);
            if response.nullable {
                self.builder.nullable_response(id, index);
            }
            for header in &response.headers {
                let type_id = self.resolve(&header.type_ref)?;
                self.builder.response_header(id, index, &header.name, type_id);
            }
        }

        if let Some(paging) = &decl.paging {
            let selector = |path: &Option<String>| path.clone().map(PropertySelector::Path);
            self.builder.pageable(
                id,
                PageableMarker {
                    items: selector(&paging.items),
                    next_link: selector(&paging.next_link),
                    continuation_token_parameter: selector(&paging.continuation_token_parameter),
                    continuation_token_response: selector(&paging.continuation_token_response),
                },
            );
        }

        if let Some(lro) = &decl.lro {
            let final_envelope = match &lro.final_envelope {
                Some(TypeRef::Named(name)) if name == "void" => Some(LroResult::Void),
                Some(type_ref) => Some(LroResult::Type(self.resolve(type_ref)?)),
                None => None,
            };
            let polling_body = match &lro.polling_body {
                Some(type_ref) => Some(self.resolve(type_ref)?),
                None => None,
            };
            if let Some(final_operation) = &lro.final_operation {
                self.pending_final_operations
                    .push((id, final_operation.clone()));
            }
            self.builder.long_running(
                id,
                LroMarker {
                    final_state_via: lro.final_state_via,
                    final_envelope,
                    final_result_path: lro.final_result_path.clone(),
                    polling_body,
                    final_operation: None,
                },
            );
        }
        Ok(id)
    }

    fn resolve_pending(&mut self) -> Result<()> {
        for (property, source) in std::mem::take(&mut self.pending_sources) {
            let source_id = self.properties.get(&source).copied().ok_or_else(|| {
                GraphError::InvalidReference(format!("spread source property '{}'", source))
            })?;
            self.builder.spread_from(property, source_id);
        }
        for (operation, path) in std::mem::take(&mut self.pending_final_operations) {
            let target = self.operations.get(&path).copied().ok_or_else(|| {
                GraphError::InvalidReference(format!("final operation '{}'", path))
            })?;
            if let Some(lro) = self
                .builder
                .graph_mut()
                .operation_mut(operation)
                .long_running
                .as_mut()
            {
                lro.final_operation = Some(target);
            }
        }
        Ok(())
    }

    fn convert_overrides(&mut self) -> Result<()> {
        let document = self.document;
        for decl in &document.overrides {
            let target = self.override_target(&decl.target)?;
            let scope = decl.scope.as_deref();
            if let Some(access) = &decl.access {
                let access = Access::parse(access).ok_or_else(|| {
                    GraphError::Parse(format!("invalid access '{}' on '{}'", access, decl.target))
                })?;
                self.builder.add_override(target, Directive::Access(access), scope);
            }
            if let Some(names) = &decl.usage {
                let mut usage = UsageFlags::NONE;
                for name in names {
                    usage |= UsageFlags::from_name(name).ok_or_else(|| {
                        GraphError::Parse(format!("invalid usage '{}' on '{}'", name, decl.target))
                    })?;
                }
                self.builder.add_override(target, Directive::Usage(usage), scope);
            }
            if let Some(name) = &decl.client_name {
                self.builder
                    .add_override(target, Directive::ClientName(name.clone()), scope);
            }
            if let Some(model) = &decl.client_initialization {
                let model = self.named_type(model, &decl.target)?;
                self.builder
                    .add_override(target, Directive::ClientInitialization(model), scope);
            }
            if let Some(alias) = &decl.param_alias {
                self.builder
                    .add_override(target, Directive::ParamAlias(alias.clone()), scope);
            }
        }
        Ok(())
    }

    fn override_target(&self, text: &str) -> Result<OverrideTarget> {
        let (kind, path) = text.split_once(':').ok_or_else(|| {
            GraphError::Parse(format!("override target '{}' has no kind prefix", text))
        })?;
        let missing = || GraphError::InvalidReference(format!("override target '{}'", text));
        match kind {
            "type" => self
                .named
                .get(path)
                .map(|id| OverrideTarget::Type(*id))
                .ok_or_else(missing),
            "property" => self
                .properties
                .get(path)
                .map(|id| OverrideTarget::Property(*id))
                .ok_or_else(missing),
            "operation" => self
                .operations
                .get(path)
                .map(|id| OverrideTarget::Operation(*id))
                .ok_or_else(missing),
            "namespace" => self
                .namespaces
                .get(path)
                .map(|id| OverrideTarget::Namespace(*id))
                .ok_or_else(missing),
            other => Err(GraphError::Parse(format!(
                "unknown override target kind '{}'",
                other
            ))),
        }
    }
}

fn location(decl: LocationDecl) -> ParameterLocation {
    match decl {
        LocationDecl::Path => ParameterLocation::Path,
        LocationDecl::Query => ParameterLocation::Query,
        LocationDecl::Header => ParameterLocation::Header,
        LocationDecl::Body => ParameterLocation::Body,
    }
}

fn enum_kind(decl: &EnumDecl) -> Result<TypeKind> {
    let mut members = Vec::new();
    let mut value_kind = PrimitiveKind::String;
    for member in &decl.members {
        let value = match &member.value {
            Some(value) => {
                let (value, kind) = literal(value)?;
                value_kind = kind;
                value
            }
            None => LiteralValue::String(member.name.clone()),
        };
        members.push(EnumMember {
            name: member.name.clone(),
            value,
        });
    }
    Ok(TypeKind::Enum(EnumType {
        members,
        value_kind,
        is_fixed: decl.fixed,
    }))
}

fn literal(value: &serde_json::Value) -> Result<(LiteralValue, PrimitiveKind)> {
    match value {
        serde_json::Value::Bool(b) => Ok((LiteralValue::Boolean(*b), PrimitiveKind::Boolean)),
        serde_json::Value::Number(n) => {
            let kind = if n.is_f64() {
                PrimitiveKind::Float64
            } else {
                PrimitiveKind::Int64
            };
            let value = n
                .as_f64()
                .ok_or_else(|| GraphError::Parse(format!("number {} out of range", n)))?;
            Ok((LiteralValue::Number(value), kind))
        }
        serde_json::Value::String(s) => Ok((LiteralValue::String(s.clone()), PrimitiveKind::String)),
        serde_json::Value::Null => Ok((LiteralValue::Null, PrimitiveKind::Any)),
        other => Err(GraphError::Parse(format!(
            "literal must be a scalar, found {}",
            other
        ))),
    }
}

/// Map a scalar type name to its kind
pub fn primitive_kind(name: &str) -> Option<PrimitiveKind> {
    let kind = match name {
        "string" => PrimitiveKind::String,
        "boolean" => PrimitiveKind::Boolean,
        "int8" | "int16" | "int32" | "uint8" | "uint16" | "safeint" => PrimitiveKind::Int32,
        "int64" | "uint32" | "uint64" | "integer" => PrimitiveKind::Int64,
        "float32" => PrimitiveKind::Float32,
        "float64" | "float" | "numeric" => PrimitiveKind::Float64,
        "decimal" | "decimal128" => PrimitiveKind::Decimal,
        "bytes" => PrimitiveKind::Bytes,
        "url" => PrimitiveKind::Url,
        "utcDateTime" | "offsetDateTime" | "dateTime" => PrimitiveKind::DateTime,
        "duration" => PrimitiveKind::Duration,
        "plainDate" => PrimitiveKind::PlainDate,
        "plainTime" => PrimitiveKind::PlainTime,
        "uuid" => PrimitiveKind::Uuid,
        "unknown" | "any" => PrimitiveKind::Any,
        _ => return None,
    };
    Some(kind)
}

/// Parse `"200"`, `"2XX"`, `"200-299"` or `"default"`
pub fn parse_status(text: &str) -> Result<StatusCodes> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("default") || text == "*" {
        return Ok(StatusCodes::Default);
    }
    let invalid = || GraphError::Parse(format!("invalid status code '{}'", text));
    if let Some((start, end)) = text.split_once('-') {
        let start = start.trim().parse().map_err(|_| invalid())?;
        let end = end.trim().parse().map_err(|_| invalid())?;
        return Ok(StatusCodes::Range { start, end });
    }
    if text.len() == 3 && text[1..].eq_ignore_ascii_case("xx") {
        let class: u16 = text[..1].parse().map_err(|_| invalid())?;
        return Ok(StatusCodes::Range {
            start: class * 100,
            end: class * 100 + 99,
        });
    }
    text.parse().map(StatusCodes::Exact).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("200").unwrap(), StatusCodes::Exact(200));
        assert_eq!(
            parse_status("4XX").unwrap(),
            StatusCodes::Range { start: 400, end: 499 }
        );
        assert_eq!(
            parse_status("200-204").unwrap(),
            StatusCodes::Range { start: 200, end: 204 }
        );
        assert_eq!(parse_status("default").unwrap(), StatusCodes::Default);
        assert!(parse_status("ok").is_err());
    }

    #[test]
    fn test_primitive_kind() {
        assert_eq!(primitive_kind("utcDateTime"), Some(PrimitiveKind::DateTime));
        assert_eq!(primitive_kind("int32"), Some(PrimitiveKind::Int32));
        assert_eq!(primitive_kind("Widget"), None);
    }

    #[test]
    fn test_literal_rejects_objects() {
        assert!(literal(&serde_json::json!({"a": 1})).is_err());
        let (value, kind) = literal(&serde_json::json!(3)).unwrap();
        assert_eq!(value, LiteralValue::Number(3.0));
        assert_eq!(kind, PrimitiveKind::Int64);
    }

    #[test]
    fn test_body_kind_defaults_to_explicit() {
        assert_eq!(
            clientgraph_common::BodyKind::default(),
            clientgraph_common::BodyKind::Explicit
        );
    }
}
