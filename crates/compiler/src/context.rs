//! State shared by the passes of one compilation run

use crate::naming::NameResolver;
use crate::package::{
    ClientId, MethodId, MethodParamId, ParameterKind, SdkClient, SdkMethod, SdkMethodParameter,
};
use clientgraph_common::{
    Access, CompilerOptions, DescriptionGraph, DiagnosticCode, Diagnostics, NamespaceId,
    OperationId, OverrideTarget, PrimitiveKind, PropertyId, TypeId, TypeKind, TypeNode,
};

pub struct CompileContext<'o> {
    pub graph: DescriptionGraph,
    pub options: &'o CompilerOptions,
    pub diagnostics: Diagnostics,
    pub names: NameResolver,
    pub clients: Vec<SdkClient>,
    pub methods: Vec<SdkMethod>,
    pub parameters: Vec<SdkMethodParameter>,
    /// Top-level clients in build order
    pub roots: Vec<ClientId>,
    url_type: Option<TypeId>,
}

impl<'o> CompileContext<'o> {
    /// Take ownership of the graph for one compilation
    pub fn new(graph: DescriptionGraph, options: &'o CompilerOptions) -> Self {
        Self {
            graph,
            options,
            diagnostics: Diagnostics::new(),
            names: NameResolver::new(options.emitter()),
            clients: Vec::new(),
            methods: Vec::new(),
            parameters: Vec::new(),
            roots: Vec::new(),
            url_type: None,
        }
    }

    /// Emitter scope used for override lookups
    pub fn emitter(&self) -> Option<&str> {
        self.options.emitter()
    }

    /// Record a diagnostic with the code's default severity
    pub fn report(&mut self, code: DiagnosticCode, message: impl Into<String>, target: Option<String>) {
        self.diagnostics.report(code, message, target);
    }

    /// Store a method or client parameter and return its id
    pub fn add_parameter(&mut self, parameter: SdkMethodParameter) -> MethodParamId {
        self.parameters.push(parameter);
        MethodParamId((self.parameters.len() - 1) as u32)
    }

    pub fn parameter(&self, id: MethodParamId) -> &SdkMethodParameter {
        &self.parameters[id.0 as usize]
    }

    /// Store a method and return its id
    pub fn add_method(&mut self, method: SdkMethod) -> MethodId {
        self.methods.push(method);
        MethodId((self.methods.len() - 1) as u32)
    }

    /// Store a client and return its id
    pub fn add_client(&mut self, client: SdkClient) -> ClientId {
        self.clients.push(client);
        ClientId((self.clients.len() - 1) as u32)
    }

    pub fn client(&self, id: ClientId) -> &SdkClient {
        &self.clients[id.0 as usize]
    }

    pub fn client_mut(&mut self, id: ClientId) -> &mut SdkClient {
        &mut self.clients[id.0 as usize]
    }

    /// Method parameter copied from a graph property
    pub fn parameter_from_property(&mut self, property: PropertyId, kind: ParameterKind) -> MethodParamId {
        let name = self.property_name(property);
        let prop = self.graph.property(property);
        let parameter = SdkMethodParameter {
            name,
            kind,
            type_id: Some(prop.type_id),
            optional: prop.optional,
            source: Some(property),
            access: Access::Public,
        };
        self.add_parameter(parameter)
    }

    /// Property name after rename overrides
    pub fn property_name(&self, property: PropertyId) -> String {
        self.graph
            .overrides
            .client_name(OverrideTarget::Property(property), self.emitter())
            .map(str::to_string)
            .unwrap_or_else(|| self.graph.property(property).name.clone())
    }

    /// Operation name after `client-name` overrides
    pub fn operation_name(&self, operation: OperationId) -> String {
        self.graph
            .overrides
            .client_name(OverrideTarget::Operation(operation), self.emitter())
            .map(str::to_string)
            .unwrap_or_else(|| self.graph.operation(operation).name.clone())
    }

    /// Access override on a namespace or its nearest overridden ancestor
    pub fn namespace_access(&self, namespace: NamespaceId) -> Option<Access> {
        let mut current = Some(namespace);
        while let Some(ns) = current {
            if let Some(access) = self
                .graph
                .overrides
                .access(OverrideTarget::Namespace(ns), self.emitter())
            {
                return Some(access);
            }
            current = self.graph.namespace(ns).parent;
        }
        None
    }

    /// Operation access: own override, then enclosing namespaces, then public
    pub fn operation_access(&self, operation: OperationId) -> Access {
        self.graph
            .overrides
            .access(OverrideTarget::Operation(operation), self.emitter())
            .or_else(|| self.namespace_access(self.graph.operation(operation).namespace))
            .unwrap_or(Access::Public)
    }

    /// Dotted namespace with the service prefix remapped
    pub fn namespace_string(&self, namespace: NamespaceId) -> String {
        let path = self.graph.namespace_path(namespace);
        match &self.options.namespace {
            Some(remap) => {
                let mut remapped = vec![remap.clone()];
                remapped.extend(path.into_iter().skip(1));
                remapped.join(".")
            }
            None => path.join("."),
        }
    }

    /// Shared synthetic `url` primitive used by endpoint parameters
    pub fn url_type(&mut self) -> TypeId {
        if let Some(id) = self.url_type {
            return id;
        }
        let mut node = TypeNode::new(TypeKind::Primitive {
            primitive: PrimitiveKind::Url,
        });
        node.synthetic = true;
        let id = self.graph.add_type(node);
        self.url_type = Some(id);
        id
    }

    /// Synthetic nullable wrapper around a response type
    pub fn nullable_of(&mut self, inner: TypeId) -> TypeId {
        if let TypeKind::Nullable { .. } = self.graph.type_node(inner).kind {
            return inner;
        }
        let mut node = TypeNode::new(TypeKind::Nullable { inner });
        node.synthetic = true;
        self.graph.add_type(node)
    }
}
