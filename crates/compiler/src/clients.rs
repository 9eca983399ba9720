//! Client hierarchy construction
//!
//! Every service namespace becomes a top-level client; its interfaces and
//! sub-namespaces become child clients reached through accessor methods,
//! unless declared independent, in which case they are hoisted to the top.

use crate::context::CompileContext;
use crate::methods::build_method;
use crate::package::{
    ClientId, ClientInitialization, MethodKind, MethodParamId, MethodResponse, ParameterKind,
    SdkClient, SdkMethod, SdkMethodParameter,
};
use crate::parameters::{is_api_version, ClientContext, ElevatedParameter};
use clientgraph_common::{
    pascal_case, Access, CredentialScheme, DiagnosticCode, NamespaceId, NamespaceNode,
    OperationId, OverrideTarget, ParameterLocation, PropertyId, ServerTemplate,
};
use std::collections::HashMap;

/// Client-level parameters visible to a client and its nested children
#[derive(Debug, Clone, Default)]
struct InitScope {
    endpoint: Vec<MethodParamId>,
    credential: Option<MethodParamId>,
    api_version: Option<MethodParamId>,
    elevated: Vec<ElevatedParameter>,
}

impl InitScope {
    fn parameters(&self) -> Vec<MethodParamId> {
        let mut parameters = self.endpoint.clone();
        parameters.extend(self.credential);
        parameters.extend(self.api_version);
        parameters.extend(self.elevated.iter().map(|e| e.parameter));
        parameters
    }
}

/// Build all clients; top-level ids end up in `ctx.roots`
pub fn build_clients(ctx: &mut CompileContext) {
    let roots: Vec<NamespaceId> = ctx
        .graph
        .services()
        .into_iter()
        .filter(|ns| {
            ctx.graph
                .namespace(*ns)
                .parent
                .and_then(|p| ctx.graph.service_of(p))
                .is_none()
        })
        .collect();

    for namespace in roots {
        build_client(ctx, namespace, None, None);
    }
    check_duplicate_names(ctx);
}

fn build_client(
    ctx: &mut CompileContext,
    namespace: NamespaceId,
    parent: Option<ClientId>,
    inherited: Option<&InitScope>,
) -> Option<ClientId> {
    if parent.is_some() && !has_operations(ctx, namespace) {
        tracing::debug!(
            namespace = %ctx.graph.namespace(namespace).name,
            "skipping operation group without operations"
        );
        hoist_independent_descendants(ctx, namespace);
        return None;
    }

    let name = client_name(ctx, namespace, parent.is_none());
    let mut scope = match inherited {
        Some(scope) => scope.clone(),
        None => top_level_scope(ctx, namespace),
    };
    if inherited.is_some() {
        if let Some(scheme) = ctx.graph.namespace(namespace).credential.clone() {
            scope.credential = Some(credential_parameter(ctx, scheme));
        }
    }
    add_initialization_override(ctx, namespace, &mut scope);

    let init_access = if parent.is_some() {
        Access::Internal
    } else {
        Access::Public
    };
    let client = SdkClient {
        name: name.clone(),
        namespace: ctx.namespace_string(namespace),
        source: namespace,
        methods: Vec::new(),
        initialization: ClientInitialization {
            name: format!("{}Options", name),
            parameters: scope.parameters(),
            access: init_access,
        },
        parent,
        children: Vec::new(),
        cross_component_id: ctx.graph.namespace_path(namespace).join("."),
    };
    let id = ctx.add_client(client);
    if parent.is_none() {
        ctx.roots.push(id);
    }
    tracing::debug!(client = %name, "built client");

    let client_context = ClientContext {
        client: Some(id),
        elevated: scope.elevated.clone(),
        api_version: scope.api_version,
    };
    let operations = ctx.graph.namespace(namespace).operations.clone();
    for operation in operations {
        if let Some(method) = build_method(ctx, operation, &client_context) {
            let method = ctx.add_method(method);
            ctx.client_mut(id).methods.push(method);
        }
    }

    let children = ctx.graph.namespace(namespace).children.clone();
    for child in children {
        if is_independent(ctx, child) {
            tracing::debug!(namespace = %ctx.graph.namespace(child).name, "hoisting independent client");
            build_client(ctx, child, None, None);
            continue;
        }
        let Some(child_id) = build_client(ctx, child, Some(id), Some(&scope)) else {
            continue;
        };
        let accessor = accessor_method(ctx, child_id);
        let accessor = ctx.add_method(accessor);
        let client = ctx.client_mut(id);
        client.methods.push(accessor);
        client.children.push(child_id);
    }
    Some(id)
}

fn accessor_method(ctx: &CompileContext, child_id: ClientId) -> SdkMethod {
    let child = ctx.client(child_id);
    SdkMethod {
        name: format!("get{}", child.name),
        kind: MethodKind::ClientAccessor,
        access: Access::Internal,
        parameters: Vec::new(),
        response: MethodResponse::default(),
        operation: None,
        paging: None,
        lro: None,
        accessed_client: Some(child_id),
        cross_component_id: child.cross_component_id.clone(),
        examples: Vec::new(),
    }
}

fn client_name(ctx: &CompileContext, namespace: NamespaceId, top_level: bool) -> String {
    if let Some(renamed) = ctx
        .graph
        .overrides
        .client_name(OverrideTarget::Namespace(namespace), ctx.emitter())
    {
        return renamed.to_string();
    }
    let ns = ctx.graph.namespace(namespace);
    if let Some(name) = ns.client.as_ref().and_then(|c| c.name.clone()) {
        return name;
    }
    let last = ns.name.rsplit('.').next().unwrap_or(&ns.name);
    if top_level && ns.is_service {
        format!("{}Client", pascal_case(last))
    } else {
        pascal_case(last)
    }
}

/// Endpoint, credential and api-version slots of a top-level client
fn top_level_scope(ctx: &mut CompileContext, namespace: NamespaceId) -> InitScope {
    let server = nearest(ctx, namespace, |ns| ns.servers.first().cloned());
    let endpoint = endpoint_parameters(ctx, namespace, server);
    let credential = nearest(ctx, namespace, |ns| ns.credential.clone())
        .map(|scheme| credential_parameter(ctx, scheme));
    let api_version = api_version_source(ctx, namespace).map(|property| {
        let mut parameter = SdkMethodParameter {
            name: ctx.property_name(property),
            kind: ParameterKind::ApiVersion {
                default_value: ctx.options.api_version.clone(),
            },
            type_id: Some(ctx.graph.property(property).type_id),
            optional: ctx.graph.property(property).optional,
            source: Some(property),
            access: Access::Public,
        };
        if ctx.options.api_version.is_some() {
            parameter.optional = true;
        }
        ctx.add_parameter(parameter)
    });
    InitScope {
        endpoint,
        credential,
        api_version,
        elevated: Vec::new(),
    }
}

/// First value found walking from `namespace` out through its ancestors
fn nearest<T>(
    ctx: &CompileContext,
    namespace: NamespaceId,
    pick: impl Fn(&NamespaceNode) -> Option<T>,
) -> Option<T> {
    let mut current = Some(namespace);
    while let Some(ns) = current {
        let node = ctx.graph.namespace(ns);
        if let Some(found) = pick(node) {
            return Some(found);
        }
        current = node.parent;
    }
    None
}

fn endpoint_parameters(
    ctx: &mut CompileContext,
    namespace: NamespaceId,
    server: Option<ServerTemplate>,
) -> Vec<MethodParamId> {
    let url_type = ctx.url_type();
    let Some(server) = server else {
        let endpoint = ctx.add_parameter(SdkMethodParameter {
            name: "endpoint".to_string(),
            kind: ParameterKind::Endpoint {
                server_url: "{endpoint}".to_string(),
                template_arguments: Vec::new(),
                overridable: true,
            },
            type_id: Some(url_type),
            optional: false,
            source: None,
            access: Access::Public,
        });
        return vec![endpoint];
    };

    let mut arguments = Vec::new();
    for wire in &server.parameters {
        if wire.location != ParameterLocation::Path {
            let message = format!(
                "Server parameter '{}' of '{}' must be a path parameter",
                ctx.graph.property(wire.property).name,
                server.url
            );
            let target = Some(ctx.graph.namespace_path(namespace).join("."));
            ctx.report(DiagnosticCode::ServerParamNotPath, message, target);
            continue;
        }
        arguments.push(ctx.parameter_from_property(wire.property, ParameterKind::TemplateArgument));
    }

    let trimmed = server.url.trim();
    let overridable = trimmed.starts_with('{')
        && trimmed.ends_with('}')
        && trimmed.matches('{').count() == 1
        && arguments.len() == 1;
    let endpoint = ctx.add_parameter(SdkMethodParameter {
        name: "endpoint".to_string(),
        kind: ParameterKind::Endpoint {
            server_url: server.url.clone(),
            template_arguments: arguments.clone(),
            overridable,
        },
        type_id: Some(url_type),
        optional: false,
        source: None,
        access: Access::Public,
    });
    let mut parameters = vec![endpoint];
    parameters.extend(arguments);
    parameters
}

fn credential_parameter(
    ctx: &mut CompileContext,
    scheme: CredentialScheme,
) -> MethodParamId {
    ctx.add_parameter(SdkMethodParameter {
        name: "credential".to_string(),
        kind: ParameterKind::Credential { scheme },
        type_id: None,
        optional: false,
        source: None,
        access: Access::Public,
    })
}

/// Properties of a client-initialization override model become client slots
fn add_initialization_override(ctx: &mut CompileContext, namespace: NamespaceId, scope: &mut InitScope) {
    let Some(model) = ctx
        .graph
        .overrides
        .client_initialization(namespace, ctx.emitter())
    else {
        return;
    };
    let properties = ctx.graph.all_properties(model);
    for property in properties {
        let already = scope
            .elevated
            .iter()
            .any(|slot| ctx.graph.properties_equivalent(slot.property, property));
        if already {
            continue;
        }
        let alias = ctx
            .graph
            .overrides
            .param_alias(property, ctx.emitter())
            .map(str::to_string);
        let parameter = ctx.parameter_from_property(
            property,
            ParameterKind::ClientInitialization {
                alias: alias.clone(),
            },
        );
        tracing::debug!(
            parameter = %ctx.parameter(parameter).name,
            alias = ?alias,
            "client initialization parameter"
        );
        scope.elevated.push(ElevatedParameter {
            parameter,
            property,
            alias,
        });
    }
}

fn is_independent(ctx: &CompileContext, namespace: NamespaceId) -> bool {
    ctx.graph
        .namespace(namespace)
        .client
        .as_ref()
        .is_some_and(|c| c.independent)
}

/// Independent clients below a skipped group still become top-level clients
fn hoist_independent_descendants(ctx: &mut CompileContext, namespace: NamespaceId) {
    let children = ctx.graph.namespace(namespace).children.clone();
    for child in children {
        if is_independent(ctx, child) {
            build_client(ctx, child, None, None);
        } else {
            hoist_independent_descendants(ctx, child);
        }
    }
}

/// Operations contained by the client built for `namespace`; hoisted
/// independent descendants are not part of it
fn subtree_operations(ctx: &CompileContext, namespace: NamespaceId) -> Vec<OperationId> {
    let mut operations = Vec::new();
    let mut stack = vec![namespace];
    while let Some(ns) = stack.pop() {
        let node = ctx.graph.namespace(ns);
        operations.extend(node.operations.iter().copied());
        stack.extend(
            node.children
                .iter()
                .rev()
                .copied()
                .filter(|child| !is_independent(ctx, *child)),
        );
    }
    operations
}

fn has_operations(ctx: &CompileContext, namespace: NamespaceId) -> bool {
    !subtree_operations(ctx, namespace).is_empty()
}

/// First api-version wire parameter among the contained operations
fn api_version_source(ctx: &CompileContext, namespace: NamespaceId) -> Option<PropertyId> {
    subtree_operations(ctx, namespace)
        .into_iter()
        .flat_map(|op| ctx.graph.operation(op).parameters.iter())
        .filter(|wire| wire.location != ParameterLocation::Body)
        .map(|wire| wire.property)
        .find(|property| {
            let prop = ctx.graph.property(*property);
            is_api_version(&prop.name) || is_api_version(&prop.serialized_name)
        })
}

fn check_duplicate_names(ctx: &mut CompileContext) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for client in &ctx.clients {
        *seen.entry(client.name.clone()).or_default() += 1;
    }
    let mut duplicates: Vec<(String, usize)> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort();
    for (name, count) in duplicates {
        ctx.report(
            DiagnosticCode::DuplicateClientName,
            format!("{} clients resolve to the name '{}'", count, name),
            Some(name),
        );
    }
}
