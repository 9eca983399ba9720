//! Correspondence between method parameters and wire parameters
//!
//! Every wire parameter ends up pointing at the method-level parameters
//! that supply it. Parameters that belong to client initialization are
//! elevated: they leave the method signature and point at the client's
//! shared slot instead.

use crate::context::CompileContext;
use crate::package::{ClientId, MethodParamId, ParameterKind, SdkWireParameter};
use crate::paths::properties_base_first;
use clientgraph_common::{
    BodyKind, DiagnosticCode, OperationId, ParameterLocation, PropertyId, WireParameter,
};

/// A client-level slot that wire parameters may be elevated to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevatedParameter {
    pub parameter: MethodParamId,
    pub property: PropertyId,
    pub alias: Option<String>,
}

/// What an operation can see of its enclosing client
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub client: Option<ClientId>,
    pub elevated: Vec<ElevatedParameter>,
    pub api_version: Option<MethodParamId>,
}

#[derive(Debug, Clone, Default)]
pub struct MappedParameters {
    pub method_params: Vec<MethodParamId>,
    pub wire_params: Vec<SdkWireParameter>,
}

/// Api-version parameters are recognized by name
pub fn is_api_version(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("apiversion") || lower.contains("api-version") || lower.contains("api_version")
}

/// Build the method signature of `operation` and link every wire parameter
pub fn build_method_parameters(
    ctx: &mut CompileContext,
    operation: OperationId,
    client: &ClientContext,
) -> MappedParameters {
    tracing::debug!(client = ?client.client, operation = operation.0, "mapping parameters");
    let mut mapped = MappedParameters::default();
    let wire_params: Vec<WireParameter> = ctx.graph.operation(operation).parameters.clone();

    for wire in wire_params {
        let corresponding = map_wire_parameter(ctx, operation, client, &wire, &mut mapped.method_params);
        let prop = ctx.graph.property(wire.property);
        mapped.wire_params.push(SdkWireParameter {
            property: wire.property,
            name: prop.name.clone(),
            serialized_name: prop.serialized_name.clone(),
            location: wire.location,
            body_kind: wire.body_kind,
            type_id: prop.type_id,
            corresponding_method_params: corresponding,
        });
    }
    mapped
}

fn map_wire_parameter(
    ctx: &mut CompileContext,
    operation: OperationId,
    client: &ClientContext,
    wire: &WireParameter,
    method_params: &mut Vec<MethodParamId>,
) -> Vec<MethodParamId> {
    let prop = ctx.graph.property(wire.property);
    if wire.location != ParameterLocation::Body
        && (is_api_version(&prop.name) || is_api_version(&prop.serialized_name))
    {
        if let Some(slot) = client.api_version {
            tracing::debug!(parameter = %prop.name, "api-version elevated to client");
            return vec![slot];
        }
    }

    if wire.location == ParameterLocation::Body && wire.body_kind == BodyKind::Spread {
        let body_type = ctx.graph.non_nullable(prop.type_id);
        if ctx.graph.type_node(body_type).is_model() {
            let mut corresponding = Vec::new();
            for property in properties_base_first(&ctx.graph, body_type) {
                let param = match match_elevated(ctx, operation, client, property) {
                    Some(slot) => slot,
                    None => method_parameter(ctx, property, method_params),
                };
                corresponding.push(param);
            }
            return corresponding;
        }
    }

    if let Some(slot) = match_elevated(ctx, operation, client, wire.property) {
        return vec![slot];
    }
    vec![method_parameter(ctx, wire.property, method_params)]
}

/// Reuse a parameter spread from the same source, or add a new one
fn method_parameter(
    ctx: &mut CompileContext,
    property: PropertyId,
    method_params: &mut Vec<MethodParamId>,
) -> MethodParamId {
    let root = ctx.graph.root_source(property);
    let reusable = method_params.iter().copied().find(|id| {
        ctx.parameter(*id)
            .source
            .is_some_and(|s| s != property && ctx.graph.root_source(s) == root)
    });
    if let Some(existing) = reusable {
        return existing;
    }
    let id = ctx.parameter_from_property(property, ParameterKind::Method);
    method_params.push(id);
    id
}

/// Find the client slot a property elevates to, by alias or equivalence
fn match_elevated(
    ctx: &mut CompileContext,
    operation: OperationId,
    client: &ClientContext,
    property: PropertyId,
) -> Option<MethodParamId> {
    let name = ctx.graph.property(property).name.clone();
    for slot in &client.elevated {
        if slot.alias.as_deref() == Some(name.as_str())
            || ctx.graph.properties_equivalent(slot.property, property)
        {
            tracing::debug!(parameter = %name, "parameter elevated to client initialization");
            return Some(slot.parameter);
        }
    }

    let same_name = client
        .elevated
        .iter()
        .any(|slot| ctx.graph.property(slot.property).name == name);
    if same_name {
        let op_name = ctx.graph.operation(operation).name.clone();
        ctx.report(
            DiagnosticCode::NoCorrespondingMethodParam,
            format!(
                "Parameter '{}' of operation '{}' matches a client initialization parameter by name but not by type",
                name, op_name
            ),
            Some(format!("{}.{}", op_name, name)),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_api_version() {
        assert!(is_api_version("api-version"));
        assert!(is_api_version("apiVersion"));
        assert!(is_api_version("x-ms-api-version"));
        assert!(!is_api_version("version"));
    }
}
