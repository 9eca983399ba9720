//! Output of a compilation: the normalized SDK package
//!
//! Clients, methods and method-level parameters live in arenas owned by the
//! package and reference each other by id. Types stay in the description
//! graph, which is carried along with resolved usage and access.

use clientgraph_common::{
    Access, BodyKind, CredentialScheme, DescriptionGraph, Diagnostic, FinalStateVia, HttpVerb,
    NamespaceId, OperationId, ParameterLocation, PropertyId, StatusCodes, TypeId, UsageFlags,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodParamId(pub u32);

/// Role of a method-level parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParameterKind {
    /// Ordinary per-call parameter
    Method,
    /// Service endpoint, built from the server url template
    Endpoint {
        server_url: String,
        template_arguments: Vec<MethodParamId>,
        overridable: bool,
    },
    /// Argument of the server url template
    TemplateArgument,
    Credential { scheme: CredentialScheme },
    ApiVersion { default_value: Option<String> },
    /// Property of a client-initialization override model
    ClientInitialization { alias: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkMethodParameter {
    pub name: String,
    pub kind: ParameterKind,
    /// `None` for credentials
    pub type_id: Option<TypeId>,
    pub optional: bool,
    /// Property this parameter was derived from
    pub source: Option<PropertyId>,
    pub access: Access,
}

impl SdkMethodParameter {
    /// Parameters stored on the client rather than passed per call
    pub fn is_client_level(&self) -> bool {
        !matches!(self.kind, ParameterKind::Method)
    }
}

/// A wire parameter and the method parameters that feed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkWireParameter {
    pub property: PropertyId,
    pub name: String,
    pub serialized_name: String,
    pub location: ParameterLocation,
    pub body_kind: BodyKind,
    pub type_id: TypeId,
    pub corresponding_method_params: Vec<MethodParamId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkHttpResponse {
    pub status: StatusCodes,
    pub type_id: Option<TypeId>,
    pub headers: Vec<PropertyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkHttpOperation {
    pub operation: OperationId,
    pub verb: HttpVerb,
    pub route: String,
    pub parameters: Vec<SdkWireParameter>,
    /// Success responses
    pub responses: Vec<SdkHttpResponse>,
    /// Error and `default` responses
    #[serde(default)]
    pub exceptions: Vec<SdkHttpResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Basic,
    Paging,
    Lro,
    LroPaging,
    ClientAccessor,
}

/// Why a method response type was wrapped as nullable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseNullability {
    /// The body itself is annotated nullable
    ExplicitNullableBody,
    /// One success response carries a body and another carries none
    OptionalFromMultipleResponses,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodResponse {
    pub type_id: Option<TypeId>,
    /// Property path from the wire body to the value returned
    pub result_segments: Vec<PropertyId>,
    pub nullability: Option<ResponseNullability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagingMetadata {
    pub item_segments: Vec<PropertyId>,
    pub next_link_segments: Vec<PropertyId>,
    pub continuation_token_parameter_segments: Vec<PropertyId>,
    pub continuation_token_response_segments: Vec<PropertyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LroMetadata {
    pub final_state_via: FinalStateVia,
    /// `None` when the operation produces no result
    pub final_result: Option<TypeId>,
    pub final_envelope: Option<TypeId>,
    pub final_result_path: Option<String>,
    pub result_segments: Vec<PropertyId>,
    pub polling_body: Option<TypeId>,
    pub final_operation: Option<OperationId>,
}

/// Literal bound from an example against its declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExampleValue {
    String { type_id: TypeId, value: String },
    Number { type_id: TypeId, value: f64 },
    Boolean { type_id: TypeId, value: bool },
    Null { type_id: TypeId },
    Unknown { type_id: TypeId, value: serde_json::Value },
    Union { type_id: TypeId, value: serde_json::Value },
    Array { type_id: TypeId, values: Vec<ExampleValue> },
    Dict {
        type_id: TypeId,
        values: IndexMap<String, ExampleValue>,
    },
    Model {
        type_id: TypeId,
        properties: IndexMap<String, ExampleValue>,
        additional_properties: IndexMap<String, ExampleValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleParameter {
    pub property: PropertyId,
    pub value: ExampleValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleResponseValue {
    pub status: u16,
    pub body: Option<ExampleValue>,
    pub headers: Vec<ExampleParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundExample {
    pub title: String,
    pub file_path: String,
    pub parameters: Vec<ExampleParameter>,
    pub responses: Vec<ExampleResponseValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkMethod {
    pub name: String,
    pub kind: MethodKind,
    pub access: Access,
    pub parameters: Vec<MethodParamId>,
    pub response: MethodResponse,
    /// `None` for client accessors
    pub operation: Option<SdkHttpOperation>,
    pub paging: Option<PagingMetadata>,
    pub lro: Option<LroMetadata>,
    /// Client returned by a client accessor
    pub accessed_client: Option<ClientId>,
    pub cross_component_id: String,
    #[serde(default)]
    pub examples: Vec<BoundExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInitialization {
    pub name: String,
    pub parameters: Vec<MethodParamId>,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkClient {
    pub name: String,
    /// Dotted namespace after remapping
    pub namespace: String,
    pub source: NamespaceId,
    pub methods: Vec<MethodId>,
    pub initialization: ClientInitialization,
    /// Weak back-reference; the package owns every client
    pub parent: Option<ClientId>,
    pub children: Vec<ClientId>,
    pub cross_component_id: String,
}

/// A model, enum or union that made it into the package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkTypeEntry {
    pub id: TypeId,
    pub name: String,
    pub cross_component_id: String,
    pub namespace: String,
    pub access: Access,
    pub usage: UsageFlags,
    /// Name was derived from the type's structural position
    pub generated_name: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkPackage {
    pub name: String,
    pub root_namespace: String,
    /// Top-level clients, hoisted independent clients included
    pub clients: Vec<ClientId>,
    pub all_clients: Vec<SdkClient>,
    pub methods: Vec<SdkMethod>,
    pub parameters: Vec<SdkMethodParameter>,
    pub models: Vec<SdkTypeEntry>,
    pub enums: Vec<SdkTypeEntry>,
    pub unions: Vec<SdkTypeEntry>,
    pub diagnostics: Vec<Diagnostic>,
    /// The graph with resolved usage and access
    pub graph: DescriptionGraph,
}

impl SdkPackage {
    /// Client by id
    pub fn client(&self, id: ClientId) -> &SdkClient {
        &self.all_clients[id.0 as usize]
    }

    /// Method by id
    pub fn method(&self, id: MethodId) -> &SdkMethod {
        &self.methods[id.0 as usize]
    }

    /// Parameter by id
    pub fn parameter(&self, id: MethodParamId) -> &SdkMethodParameter {
        &self.parameters[id.0 as usize]
    }

    /// First client with this name, nested clients included
    pub fn find_client(&self, name: &str) -> Option<&SdkClient> {
        self.all_clients.iter().find(|c| c.name == name)
    }

    /// Method with the given name in the given client
    pub fn find_method(&self, client: &SdkClient, name: &str) -> Option<&SdkMethod> {
        client
            .methods
            .iter()
            .map(|id| self.method(*id))
            .find(|m| m.name == name)
    }

    /// Model, enum or union by generated or declared name
    pub fn find_type(&self, name: &str) -> Option<&SdkTypeEntry> {
        self.models
            .iter()
            .chain(self.enums.iter())
            .chain(self.unions.iter())
            .find(|t| t.name == name)
    }

    /// Whether any diagnostic is an error
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == clientgraph_common::Severity::Error)
    }
}
