//! Service description graph
//!
//! The graph is an arena: every node lives in a `Vec` owned by
//! [`DescriptionGraph`] and is addressed by a typed index. Edges (base model,
//! property type, discriminated subtypes, owners) are ids, so cycles and
//! shared references need no reference counting. Identity is the id: two
//! structurally identical anonymous shapes are distinct nodes.

use crate::flags::{Access, UsageFlags};
use crate::overrides::OverrideTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Position in the owning arena
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Index of a [`TypeNode`]
    TypeId
);
arena_id!(
    /// Index of a [`PropertyNode`]
    PropertyId
);
arena_id!(
    /// Index of an [`OperationNode`]
    OperationId
);
arena_id!(
    /// Index of a [`NamespaceNode`]
    NamespaceId
);

/// Scalar kinds understood by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    String,
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Bytes,
    Url,
    DateTime,
    Duration,
    PlainDate,
    PlainTime,
    Uuid,
    Any,
}

impl PrimitiveKind {
    /// Integer, float and decimal kinds
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::Float32
                | PrimitiveKind::Float64
                | PrimitiveKind::Decimal
        )
    }

    /// Kinds whose literal form is a JSON string
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            PrimitiveKind::String
                | PrimitiveKind::Bytes
                | PrimitiveKind::Url
                | PrimitiveKind::DateTime
                | PrimitiveKind::Duration
                | PrimitiveKind::PlainDate
                | PrimitiveKind::PlainTime
                | PrimitiveKind::Uuid
        )
    }
}

/// Literal value of a constant or enum member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Null,
}

impl LiteralValue {
    /// Compare against a JSON literal from an example document
    pub fn matches_json(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (LiteralValue::Boolean(a), serde_json::Value::Bool(b)) => a == b,
            (LiteralValue::Number(a), serde_json::Value::Number(b)) => {
                b.as_f64().is_some_and(|b| (a - b).abs() < f64::EPSILON)
            }
            (LiteralValue::String(a), serde_json::Value::String(b)) => a == b,
            (LiteralValue::Null, serde_json::Value::Null) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelType {
    /// Properties in declaration order
    pub properties: Vec<PropertyId>,
    pub base: Option<TypeId>,
    /// Name of the discriminator property, when polymorphic
    pub discriminator: Option<String>,
    /// Value selecting this model in its base's discriminator
    pub discriminator_value: Option<String>,
    pub subtypes: IndexMap<String, TypeId>,
    pub additional_properties: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub members: Vec<EnumMember>,
    pub value_kind: PrimitiveKind,
    pub is_fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionVariant {
    pub name: Option<String>,
    pub type_id: TypeId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    pub variants: Vec<UnionVariant>,
}

/// Shape of a type node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeKind {
    Model(ModelType),
    Enum(EnumType),
    Union(UnionType),
    Array { element: TypeId },
    Dict { element: TypeId },
    Nullable { inner: TypeId },
    Primitive { primitive: PrimitiveKind },
    Constant {
        value: LiteralValue,
        primitive: PrimitiveKind,
    },
}

/// Structural position of an anonymous node, used to derive its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeOwner {
    /// Type of a model property or operation parameter
    Property { property: PropertyId },
    /// Request body synthesized or declared inline on an operation
    OperationRequest { operation: OperationId },
    /// Response body declared inline on an operation
    OperationResponse { operation: OperationId },
    /// Element of an array, dict or nullable container
    Element { container: TypeId },
    /// Variant of a union
    Variant { union: TypeId, index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub kind: TypeKind,
    /// Declared name; `None` for anonymous shapes
    pub name: Option<String>,
    pub namespace: Option<NamespaceId>,
    pub owner: Option<TypeOwner>,
    /// Created by the compiler rather than the front-end
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub usage: UsageFlags,
    #[serde(default)]
    pub access: Option<Access>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl TypeNode {
    /// Unnamed node with no usage and unresolved access
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            name: None,
            namespace: None,
            owner: None,
            synthetic: false,
            usage: UsageFlags::NONE,
            access: None,
            doc: None,
        }
    }

    /// Model payload, if this is a model
    pub fn as_model(&self) -> Option<&ModelType> {
        match &self.kind {
            TypeKind::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_model_mut(&mut self) -> Option<&mut ModelType> {
        match &mut self.kind {
            TypeKind::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self.kind, TypeKind::Model(_))
    }

    /// Models, enums and unions are the types that surface in a package
    pub fn is_declaration(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Model(_) | TypeKind::Enum(_) | TypeKind::Union(_)
        )
    }

    /// Short kind label used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Model(_) => "model",
            TypeKind::Enum(_) => "enum",
            TypeKind::Union(_) => "union",
            TypeKind::Array { .. } => "array",
            TypeKind::Dict { .. } => "dict",
            TypeKind::Nullable { .. } => "nullable",
            TypeKind::Primitive { .. } => "primitive",
            TypeKind::Constant { .. } => "constant",
        }
    }
}

/// Who declares a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropertyOwner {
    Model { model: TypeId },
    Operation { operation: OperationId },
    /// Server template argument declared on a service namespace
    Namespace { namespace: NamespaceId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyNode {
    pub name: String,
    /// Name on the wire
    pub serialized_name: String,
    pub owner: PropertyOwner,
    pub type_id: TypeId,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub discriminator: bool,
    #[serde(default)]
    pub visibility_restricted: bool,
    /// Property this one was copied from by spreading
    #[serde(default)]
    pub source: Option<PropertyId>,
    /// Resolved access, set by propagation
    #[serde(default)]
    pub access: Option<Access>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

/// How a body parameter relates to the request payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyKind {
    /// `@body`: the parameter is the payload
    #[default]
    Explicit,
    /// `@bodyRoot`: the parameter's properties are the payload
    Root,
    /// Implicit body assembled from several loose parameters
    Spread,
}

/// A parameter as it is sent on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireParameter {
    pub property: PropertyId,
    pub location: ParameterLocation,
    #[serde(default)]
    pub body_kind: BodyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Put,
    Post,
    Patch,
    Delete,
    Head,
}

/// Status code key of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCodes {
    Exact(u16),
    Range { start: u16, end: u16 },
    Default,
}

impl StatusCodes {
    /// Whether `code` falls under this status; `Default` matches nothing explicitly
    pub fn matches(&self, code: u16) -> bool {
        match *self {
            StatusCodes::Exact(c) => c == code,
            StatusCodes::Range { start, end } => start <= code && code <= end,
            StatusCodes::Default => false,
        }
    }

    /// 2xx codes and ranges contained in 2xx
    pub fn is_success(&self) -> bool {
        match *self {
            StatusCodes::Exact(c) => (200..300).contains(&c),
            StatusCodes::Range { start, end } => start >= 200 && end < 300,
            StatusCodes::Default => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub status: StatusCodes,
    pub body: Option<TypeId>,
    /// Body explicitly annotated as nullable
    #[serde(default)]
    pub nullable_body: bool,
    #[serde(default)]
    pub headers: Vec<PropertyId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Other(String),
}

/// Locates a property inside a response envelope or parameter list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertySelector {
    /// Match by property identity (through spread sources)
    Property(PropertyId),
    /// Dotted property-name path, e.g. `"page.items"`
    Path(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageableMarker {
    pub items: Option<PropertySelector>,
    #[serde(default)]
    pub next_link: Option<PropertySelector>,
    #[serde(default)]
    pub continuation_token_parameter: Option<PropertySelector>,
    #[serde(default)]
    pub continuation_token_response: Option<PropertySelector>,
}

/// How the final result of a long-running operation is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinalStateVia {
    LocationHeader,
    AzureAsyncOperationHeader,
    OriginalUri,
    OperationLocationHeader,
    CustomOperationReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LroResult {
    Void,
    Type(TypeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LroMarker {
    pub final_state_via: FinalStateVia,
    /// Body returned once polling completes; defaults to the operation's own response
    #[serde(default)]
    pub final_envelope: Option<LroResult>,
    /// Property of the final envelope holding the logical result
    #[serde(default)]
    pub final_result_path: Option<String>,
    #[serde(default)]
    pub polling_body: Option<TypeId>,
    /// Operation whose response replaces the final result
    #[serde(default)]
    pub final_operation: Option<OperationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationNode {
    pub name: String,
    pub namespace: NamespaceId,
    pub verb: HttpVerb,
    pub route: String,
    pub protocol: Protocol,
    pub parameters: Vec<WireParameter>,
    pub responses: Vec<OperationResponse>,
    #[serde(default)]
    pub pageable: Option<PageableMarker>,
    #[serde(default)]
    pub long_running: Option<LroMarker>,
    /// Explicit operation id used to match example documents
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Namespace,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTemplate {
    pub url: String,
    #[serde(default)]
    pub parameters: Vec<WireParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CredentialScheme {
    ApiKey { header: String },
    Bearer,
    #[serde(rename = "oauth2")]
    OAuth2 { scopes: Vec<String> },
}

/// Explicit client declaration on a namespace or interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDeclaration {
    pub name: Option<String>,
    /// Hoist this operation group to a top-level client
    #[serde(default)]
    pub independent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceNode {
    pub name: String,
    pub parent: Option<NamespaceId>,
    pub kind: NamespaceKind,
    #[serde(default)]
    pub operations: Vec<OperationId>,
    #[serde(default)]
    pub children: Vec<NamespaceId>,
    #[serde(default)]
    pub types: Vec<TypeId>,
    #[serde(default)]
    pub is_service: bool,
    #[serde(default)]
    pub servers: Vec<ServerTemplate>,
    #[serde(default)]
    pub credential: Option<CredentialScheme>,
    #[serde(default)]
    pub client: Option<ClientDeclaration>,
    #[serde(default)]
    pub doc: Option<String>,
}

/// The whole input handed over by the front-end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptionGraph {
    types: Vec<TypeNode>,
    properties: Vec<PropertyNode>,
    operations: Vec<OperationNode>,
    namespaces: Vec<NamespaceNode>,
    pub overrides: OverrideTable,
}

impl DescriptionGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a type node and return its id
    pub fn add_type(&mut self, node: TypeNode) -> TypeId {
        self.types.push(node);
        TypeId((self.types.len() - 1) as u32)
    }

    /// Append a property node and return its id
    pub fn add_property(&mut self, node: PropertyNode) -> PropertyId {
        self.properties.push(node);
        PropertyId((self.properties.len() - 1) as u32)
    }

    /// Append an operation and register it with its namespace
    pub fn add_operation(&mut self, node: OperationNode) -> OperationId {
        let namespace = node.namespace;
        self.operations.push(node);
        let id = OperationId((self.operations.len() - 1) as u32);
        self.namespaces[namespace.index()].operations.push(id);
        id
    }

    /// Append a namespace and link it under its parent
    pub fn add_namespace(&mut self, node: NamespaceNode) -> NamespaceId {
        let parent = node.parent;
        self.namespaces.push(node);
        let id = NamespaceId((self.namespaces.len() - 1) as u32);
        if let Some(parent) = parent {
            self.namespaces[parent.index()].children.push(id);
        }
        id
    }

    /// Type node by id; panics on a foreign id
    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.index()]
    }

    pub fn type_node_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.types[id.index()]
    }

    /// Property node by id
    pub fn property(&self, id: PropertyId) -> &PropertyNode {
        &self.properties[id.index()]
    }

    pub fn property_mut(&mut self, id: PropertyId) -> &mut PropertyNode {
        &mut self.properties[id.index()]
    }

    /// Operation node by id
    pub fn operation(&self, id: OperationId) -> &OperationNode {
        &self.operations[id.index()]
    }

    pub fn operation_mut(&mut self, id: OperationId) -> &mut OperationNode {
        &mut self.operations[id.index()]
    }

    /// Namespace node by id
    pub fn namespace(&self, id: NamespaceId) -> &NamespaceNode {
        &self.namespaces[id.index()]
    }

    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut NamespaceNode {
        &mut self.namespaces[id.index()]
    }

    /// All type ids in declaration order
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len() as u32).map(TypeId)
    }

    /// All operation ids in declaration order
    pub fn operation_ids(&self) -> impl Iterator<Item = OperationId> {
        (0..self.operations.len() as u32).map(OperationId)
    }

    /// All namespace ids in declaration order
    pub fn namespace_ids(&self) -> impl Iterator<Item = NamespaceId> {
        (0..self.namespaces.len() as u32).map(NamespaceId)
    }

    /// Number of type nodes, synthetic ones included
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Whether `id` belongs to this arena
    pub fn contains_type(&self, id: TypeId) -> bool {
        id.index() < self.types.len()
    }

    pub fn contains_property(&self, id: PropertyId) -> bool {
        id.index() < self.properties.len()
    }

    pub fn contains_operation(&self, id: OperationId) -> bool {
        id.index() < self.operations.len()
    }

    pub fn contains_namespace(&self, id: NamespaceId) -> bool {
        id.index() < self.namespaces.len()
    }

    /// Service namespaces in declaration order
    pub fn services(&self) -> Vec<NamespaceId> {
        self.namespace_ids()
            .filter(|id| self.namespace(*id).is_service)
            .collect()
    }

    /// Names from the outermost namespace down to `id`
    pub fn namespace_path(&self, id: NamespaceId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(ns) = current {
            let node = self.namespace(ns);
            path.push(node.name.clone());
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Nearest enclosing service namespace
    pub fn service_of(&self, id: NamespaceId) -> Option<NamespaceId> {
        let mut current = Some(id);
        while let Some(ns) = current {
            if self.namespace(ns).is_service {
                return Some(ns);
            }
            current = self.namespace(ns).parent;
        }
        None
    }

    /// Follow spread `source` links back to the declaring property
    pub fn root_source(&self, id: PropertyId) -> PropertyId {
        let mut current = id;
        let mut hops = 0;
        while let Some(source) = self.property(current).source {
            current = source;
            hops += 1;
            if hops > self.properties.len() {
                break;
            }
        }
        current
    }

    /// Structural equivalence used to deduplicate client-level parameters
    ///
    /// Locations are compared only when both properties are wire parameters.
    pub fn properties_equivalent(&self, a: PropertyId, b: PropertyId) -> bool {
        if self.root_source(a) == self.root_source(b) {
            return true;
        }
        let same_location = match (self.property_location(a), self.property_location(b)) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        };
        let (pa, pb) = (self.property(a), self.property(b));
        pa.name == pb.name && same_location && self.types_equivalent(pa.type_id, pb.type_id)
    }

    /// Wire location of an operation or server parameter; model properties have none
    pub fn property_location(&self, id: PropertyId) -> Option<ParameterLocation> {
        let wire = match self.property(id).owner {
            PropertyOwner::Operation { operation } => self
                .operation(operation)
                .parameters
                .iter()
                .find(|w| w.property == id),
            PropertyOwner::Namespace { namespace } => self
                .namespace(namespace)
                .servers
                .iter()
                .flat_map(|s| s.parameters.iter())
                .find(|w| w.property == id),
            PropertyOwner::Model { .. } => None,
        };
        wire.map(|w| w.location)
    }

    fn types_equivalent(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (&self.type_node(a).kind, &self.type_node(b).kind) {
            (
                TypeKind::Primitive { primitive: x },
                TypeKind::Primitive { primitive: y },
            ) => x == y,
            (TypeKind::Array { element: x }, TypeKind::Array { element: y })
            | (TypeKind::Dict { element: x }, TypeKind::Dict { element: y })
            | (TypeKind::Nullable { inner: x }, TypeKind::Nullable { inner: y }) => {
                self.types_equivalent(*x, *y)
            }
            _ => false,
        }
    }

    /// Look a property up by name or wire name, searching base models too
    pub fn find_property(&self, model: TypeId, name: &str) -> Option<PropertyId> {
        let mut current = Some(model);
        let mut depth = 0;
        while let Some(id) = current {
            let model = self.type_node(id).as_model()?;
            let found = model.properties.iter().copied().find(|p| {
                let prop = self.property(*p);
                prop.name == name || prop.serialized_name == name
            });
            if found.is_some() {
                return found;
            }
            current = model.base;
            depth += 1;
            if depth > self.types.len() {
                break;
            }
        }
        None
    }

    /// Properties of a model followed by those inherited from its bases
    pub fn all_properties(&self, model: TypeId) -> Vec<PropertyId> {
        let mut result = Vec::new();
        let mut seen = Vec::new();
        let mut current = Some(model);
        while let Some(id) = current {
            if seen.contains(&id) {
                break;
            }
            seen.push(id);
            match self.type_node(id).as_model() {
                Some(model) => {
                    result.extend(model.properties.iter().copied());
                    current = model.base;
                }
                None => break,
            }
        }
        result
    }

    /// Strip a nullable wrapper
    pub fn non_nullable(&self, id: TypeId) -> TypeId {
        match self.type_node(id).kind {
            TypeKind::Nullable { inner } => inner,
            _ => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_type(graph: &mut DescriptionGraph) -> TypeId {
        graph.add_type(TypeNode::new(TypeKind::Primitive {
            primitive: PrimitiveKind::String,
        }))
    }

    fn model(graph: &mut DescriptionGraph, name: &str) -> TypeId {
        let mut node = TypeNode::new(TypeKind::Model(ModelType::default()));
        node.name = Some(name.to_string());
        graph.add_type(node)
    }

    fn property(graph: &mut DescriptionGraph, owner: TypeId, name: &str, ty: TypeId) -> PropertyId {
        let id = graph.add_property(PropertyNode {
            name: name.to_string(),
            serialized_name: name.to_string(),
            owner: PropertyOwner::Model { model: owner },
            type_id: ty,
            optional: false,
            discriminator: false,
            visibility_restricted: false,
            source: None,
            access: None,
            doc: None,
        });
        graph
            .type_node_mut(owner)
            .as_model_mut()
            .unwrap()
            .properties
            .push(id);
        id
    }

    #[test]
    fn test_root_source_follows_chain() {
        let mut graph = DescriptionGraph::new();
        let s = string_type(&mut graph);
        let a = model(&mut graph, "A");
        let b = model(&mut graph, "B");
        let original = property(&mut graph, a, "name", s);
        let copy = property(&mut graph, b, "name", s);
        graph.property_mut(copy).source = Some(original);

        assert_eq!(graph.root_source(copy), original);
        assert_eq!(graph.root_source(original), original);
    }

    #[test]
    fn test_properties_equivalent_by_name_and_type() {
        let mut graph = DescriptionGraph::new();
        let s1 = string_type(&mut graph);
        let s2 = string_type(&mut graph);
        let a = model(&mut graph, "A");
        let b = model(&mut graph, "B");
        let x = property(&mut graph, a, "blobName", s1);
        let y = property(&mut graph, b, "blobName", s2);
        let z = property(&mut graph, b, "other", s2);

        assert!(graph.properties_equivalent(x, y));
        assert!(!graph.properties_equivalent(x, z));
    }

    #[test]
    fn test_find_property_searches_base() {
        let mut graph = DescriptionGraph::new();
        let s = string_type(&mut graph);
        let base = model(&mut graph, "Base");
        let derived = model(&mut graph, "Derived");
        graph.type_node_mut(derived).as_model_mut().unwrap().base = Some(base);
        let kind = property(&mut graph, base, "kind", s);
        let own = property(&mut graph, derived, "own", s);

        assert_eq!(graph.find_property(derived, "kind"), Some(kind));
        assert_eq!(graph.all_properties(derived), vec![own, kind]);
    }

    #[test]
    fn test_status_codes() {
        assert!(StatusCodes::Exact(204).is_success());
        assert!(!StatusCodes::Exact(404).is_success());
        assert!(StatusCodes::Range { start: 400, end: 499 }.matches(404));
        assert!(!StatusCodes::Default.is_success());
    }
}
