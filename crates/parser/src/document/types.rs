//! Graph document type definitions
//!
//! Declarations reference each other by string key. Type references are
//! either a key (a named type or a primitive name such as `"string"`) or an
//! inline anonymous declaration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Graph document root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    /// Service namespaces
    #[serde(default)]
    pub services: Vec<NamespaceDecl>,

    /// Named types keyed by name
    #[serde(default)]
    pub types: IndexMap<String, TypeDecl>,

    /// Override directives in declaration order
    #[serde(default)]
    pub overrides: Vec<OverrideDecl>,
}

/// Namespace or interface with its operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDecl {
    pub name: String,

    /// Servers (service namespaces only)
    #[serde(default)]
    pub servers: Vec<ServerDecl>,

    /// Credential scheme (service namespaces only)
    #[serde(default)]
    pub credential: Option<clientgraph_common::CredentialScheme>,

    /// Explicit client declaration
    #[serde(default)]
    pub client: Option<ClientDecl>,

    #[serde(default)]
    pub operations: Vec<OperationDecl>,

    /// Nested interfaces (operation groups)
    #[serde(default)]
    pub interfaces: Vec<NamespaceDecl>,

    /// Nested sub-namespaces
    #[serde(default)]
    pub namespaces: Vec<NamespaceDecl>,

    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDecl {
    #[serde(default)]
    pub name: Option<String>,

    /// Hoist to a top-level client
    #[serde(default)]
    pub independent: bool,
}

/// Server url template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDecl {
    /// Url, e.g. `"{endpoint}/widgets"`
    pub url: String,

    /// Template arguments
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
}

/// Type reference: a key or an inline declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Named(String),
    Inline(Box<TypeDecl>),
}

/// Type declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDecl {
    Model(ModelDecl),
    Enum(EnumDecl),
    Union(UnionDecl),
    Array {
        items: TypeRef,
    },
    Dict {
        values: TypeRef,
    },
    Nullable {
        #[serde(rename = "type")]
        inner: TypeRef,
    },
    Constant {
        value: serde_json::Value,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDecl {
    /// Dotted namespace path; defaults to the first service
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub properties: Vec<PropertyDecl>,

    /// Base model key
    #[serde(default)]
    pub base: Option<String>,

    /// Discriminator property name (polymorphic bases)
    #[serde(default)]
    pub discriminator: Option<String>,

    /// Value selecting this model under its base's discriminator
    #[serde(default)]
    pub discriminator_value: Option<String>,

    #[serde(default)]
    pub additional_properties: Option<TypeRef>,

    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDecl {
    #[serde(default)]
    pub namespace: Option<String>,

    pub members: Vec<EnumMemberDecl>,

    /// Closed set of values
    #[serde(default = "default_true")]
    pub fixed: bool,

    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumMemberDecl {
    pub name: String,

    /// Defaults to the member name
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionDecl {
    #[serde(default)]
    pub namespace: Option<String>,

    pub variants: Vec<VariantDecl>,

    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDecl {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// Model property
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDecl {
    pub name: String,

    /// Wire name when it differs from `name`
    #[serde(default)]
    pub serialized_name: Option<String>,

    #[serde(rename = "type")]
    pub type_ref: TypeRef,

    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub visibility_restricted: bool,

    /// `Model.property` this property was spread from
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub doc: Option<String>,
}

/// Wire location of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationDecl {
    Path,
    Query,
    Header,
    Body,
}

/// Operation parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDecl {
    pub name: String,

    #[serde(default)]
    pub serialized_name: Option<String>,

    #[serde(rename = "type")]
    pub type_ref: TypeRef,

    #[serde(rename = "in")]
    pub location: LocationDecl,

    /// `explicit`, `root` or `spread` (body parameters only)
    #[serde(default)]
    pub body_kind: clientgraph_common::BodyKind,

    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub doc: Option<String>,
}

/// HTTP operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDecl {
    pub name: String,

    pub verb: clientgraph_common::HttpVerb,

    #[serde(default)]
    pub route: String,

    /// Defaults to `http`
    #[serde(default)]
    pub protocol: Option<String>,

    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,

    #[serde(default)]
    pub responses: Vec<ResponseDecl>,

    #[serde(default)]
    pub paging: Option<PagingDecl>,

    #[serde(default)]
    pub lro: Option<LroDecl>,

    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDecl {
    /// `"200"`, `"2XX"`, `"200-299"` or `"default"`
    pub status: String,

    #[serde(default)]
    pub body: Option<TypeRef>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub headers: Vec<HeaderDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// Paging metadata; each selector is a dotted property path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingDecl {
    #[serde(default)]
    pub items: Option<String>,

    #[serde(default)]
    pub next_link: Option<String>,

    #[serde(default)]
    pub continuation_token_parameter: Option<String>,

    #[serde(default)]
    pub continuation_token_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LroDecl {
    pub final_state_via: clientgraph_common::FinalStateVia,

    /// Type key, inline type, or `"void"`
    #[serde(default)]
    pub final_envelope: Option<TypeRef>,

    #[serde(default)]
    pub final_result_path: Option<String>,

    #[serde(default)]
    pub polling_body: Option<TypeRef>,

    /// Dotted path of the operation providing the final result
    #[serde(default)]
    pub final_operation: Option<String>,
}

/// Override directive; every field that is set becomes one entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDecl {
    /// `type:Widget`, `property:Widget.name`, `operation:Svc.Group.op`,
    /// `namespace:Svc.Group`
    pub target: String,

    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default)]
    pub access: Option<String>,

    /// Usage role names, e.g. `["input", "json"]`
    #[serde(default)]
    pub usage: Option<Vec<String>>,

    #[serde(default)]
    pub client_name: Option<String>,

    /// Model key whose properties join client initialization
    #[serde(default)]
    pub client_initialization: Option<String>,

    #[serde(default)]
    pub param_alias: Option<String>,
}

fn default_true() -> bool {
    true
}
