//! Operation classification and method construction
//!
//! An operation becomes a `basic`, `paging`, `lro` or `lropaging` method.
//! Shape mismatches never fail the run: the method keeps its kind with
//! empty metadata and a diagnostic explains what was missing.

use crate::context::CompileContext;
use crate::naming::operation_cross_id;
use crate::package::{
    LroMetadata, MethodKind, MethodResponse, PagingMetadata, ResponseNullability,
    SdkHttpOperation, SdkHttpResponse, SdkMethod, SdkWireParameter,
};
use crate::parameters::{build_method_parameters, ClientContext, MappedParameters};
use crate::paths::{resolve_segments, segments_type};
use clientgraph_common::{
    DiagnosticCode, LroMarker, LroResult, OperationId, PageableMarker, PropertyId,
    PropertySelector, Protocol, TypeId, TypeKind,
};

/// Build the method for `operation`; `None` when it cannot be represented
pub fn build_method(
    ctx: &mut CompileContext,
    operation: OperationId,
    client: &ClientContext,
) -> Option<SdkMethod> {
    let op_name = ctx.graph.operation(operation).name.clone();
    if let Protocol::Other(protocol) = &ctx.graph.operation(operation).protocol {
        let message = format!(
            "Operation '{}' uses protocol '{}' which has no HTTP mapping; it is dropped",
            op_name, protocol
        );
        ctx.report(
            DiagnosticCode::UnsupportedProtocol,
            message,
            Some(operation_cross_id(&ctx.graph, operation)),
        );
        return None;
    }

    let access = ctx.operation_access(operation);
    let mapped = build_method_parameters(ctx, operation, client);
    for id in &mapped.method_params {
        ctx.parameters[id.0 as usize].access = access;
    }

    let shaped = shape_response(ctx, operation);
    let op = ctx.graph.operation(operation);
    let pageable = op.pageable.clone();
    let long_running = op.long_running.clone();
    let kind = match (&pageable, &long_running) {
        (Some(_), Some(_)) => MethodKind::LroPaging,
        (Some(_), None) => MethodKind::Paging,
        (None, Some(_)) => MethodKind::Lro,
        (None, None) => MethodKind::Basic,
    };
    tracing::debug!(operation = %op_name, kind = ?kind, "classified operation");

    let mut response = MethodResponse {
        type_id: shaped.type_id,
        result_segments: Vec::new(),
        nullability: shaped.nullability,
    };

    let lro = long_running
        .as_ref()
        .map(|marker| lro_metadata(ctx, operation, marker, shaped.type_id));
    if let Some(lro) = &lro {
        response.type_id = lro.final_result;
        response.result_segments = lro.result_segments.clone();
        response.nullability = None;
    }

    let paging = pageable.as_ref().map(|marker| {
        let envelope = match &lro {
            Some(lro) => lro.final_result,
            None => shaped.type_id,
        };
        let (metadata, items_type) = paging_metadata(ctx, operation, marker, envelope, &mapped);
        if let Some(items_type) = items_type {
            response.type_id = Some(items_type);
            response.result_segments = metadata.item_segments.clone();
            response.nullability = None;
        }
        metadata
    });

    if kind == MethodKind::Basic && response.nullability.is_some() {
        response.type_id = response.type_id.map(|t| ctx.nullable_of(t));
    }

    let http = http_operation(ctx, operation, mapped.wire_params);
    Some(SdkMethod {
        name: ctx.operation_name(operation),
        kind,
        access,
        parameters: mapped.method_params,
        response,
        operation: Some(http),
        paging,
        lro,
        accessed_client: None,
        cross_component_id: operation_cross_id(&ctx.graph, operation),
        examples: Vec::new(),
    })
}

fn http_operation(
    ctx: &CompileContext,
    operation: OperationId,
    parameters: Vec<SdkWireParameter>,
) -> SdkHttpOperation {
    let op = ctx.graph.operation(operation);
    let (responses, exceptions): (Vec<_>, Vec<_>) = op
        .responses
        .iter()
        .map(|r| SdkHttpResponse {
            status: r.status,
            type_id: r.body,
            headers: r.headers.clone(),
        })
        .partition(|r| r.status.is_success());
    SdkHttpOperation {
        operation,
        verb: op.verb,
        route: op.route.clone(),
        parameters,
        responses,
        exceptions,
    }
}

/// Success response type before any nullable wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedResponse {
    pub type_id: Option<TypeId>,
    pub nullability: Option<ResponseNullability>,
}

/// Determine the response type and how it became nullable
pub fn shape_response(ctx: &mut CompileContext, operation: OperationId) -> ShapedResponse {
    let op = ctx.graph.operation(operation);
    let success: Vec<_> = op.responses.iter().filter(|r| r.status.is_success()).collect();

    let mut body_types: Vec<TypeId> = Vec::new();
    let mut explicit_nullable = false;
    for response in &success {
        let Some(body) = response.body else {
            continue;
        };
        if response.nullable_body
            || matches!(ctx.graph.type_node(body).kind, TypeKind::Nullable { .. })
        {
            explicit_nullable = true;
        }
        let body = ctx.graph.non_nullable(body);
        if !body_types.contains(&body) {
            body_types.push(body);
        }
    }
    let missing_body = success.iter().any(|r| r.body.is_none());
    let op_name = op.name.clone();

    // initial and final responses of a long-running operation differ
    if body_types.len() > 1 && op.long_running.is_none() {
        ctx.report(
            DiagnosticCode::MultipleResponseTypes,
            format!(
                "Operation '{}' has {} distinct success response types; the first is used",
                op_name,
                body_types.len()
            ),
            Some(operation_cross_id(&ctx.graph, operation)),
        );
    }

    let type_id = body_types.first().copied();
    let nullability = match type_id {
        Some(_) if explicit_nullable => Some(ResponseNullability::ExplicitNullableBody),
        Some(_) if missing_body => Some(ResponseNullability::OptionalFromMultipleResponses),
        _ => None,
    };
    ShapedResponse {
        type_id,
        nullability,
    }
}

/// First success body of an operation
fn success_body(ctx: &CompileContext, operation: OperationId) -> Option<TypeId> {
    ctx.graph
        .operation(operation)
        .responses
        .iter()
        .filter(|r| r.status.is_success())
        .find_map(|r| r.body)
        .map(|b| ctx.graph.non_nullable(b))
}

fn lro_metadata(
    ctx: &mut CompileContext,
    operation: OperationId,
    marker: &LroMarker,
    response_type: Option<TypeId>,
) -> LroMetadata {
    let target = Some(operation_cross_id(&ctx.graph, operation));
    let mut metadata = LroMetadata {
        final_state_via: marker.final_state_via,
        final_result: None,
        final_envelope: None,
        final_result_path: marker.final_result_path.clone(),
        result_segments: Vec::new(),
        polling_body: marker.polling_body,
        final_operation: marker.final_operation,
    };

    if let Some(final_operation) = marker.final_operation {
        let result = success_body(ctx, final_operation);
        metadata.final_result = result;
        metadata.final_envelope = result;
        return metadata;
    }

    let envelope = match marker.final_envelope {
        Some(LroResult::Void) => None,
        Some(LroResult::Type(t)) => Some(t),
        None => response_type,
    };
    metadata.final_envelope = envelope;
    metadata.final_result = envelope;
    let Some(envelope) = envelope else {
        return metadata;
    };

    let model = ctx.graph.non_nullable(envelope);
    if !ctx.graph.type_node(model).is_model() {
        if matches!(marker.final_envelope, Some(LroResult::Type(_))) {
            let message = format!(
                "Final envelope of long-running operation '{}' is a {}, not a model",
                ctx.graph.operation(operation).name,
                ctx.graph.type_node(model).kind_name()
            );
            ctx.report(DiagnosticCode::InvalidLroMetadata, message, target);
        }
        return metadata;
    }

    if let Some(path) = &marker.final_result_path {
        match ctx.graph.find_property(model, path) {
            Some(property) => {
                metadata.result_segments = vec![property];
                metadata.final_result = Some(ctx.graph.property(property).type_id);
            }
            None => {
                let message = format!(
                    "Final result path '{}' not found on the final envelope of '{}'",
                    path,
                    ctx.graph.operation(operation).name
                );
                ctx.report(DiagnosticCode::LroFinalResultPathNotFound, message, target);
            }
        }
    }
    metadata
}

fn paging_metadata(
    ctx: &mut CompileContext,
    operation: OperationId,
    marker: &PageableMarker,
    envelope: Option<TypeId>,
    mapped: &MappedParameters,
) -> (PagingMetadata, Option<TypeId>) {
    let target = Some(operation_cross_id(&ctx.graph, operation));
    let op_name = ctx.graph.operation(operation).name.clone();
    let envelope = envelope.map(|t| ctx.graph.non_nullable(t));
    let Some(envelope) = envelope.filter(|t| ctx.graph.type_node(*t).is_model()) else {
        ctx.report(
            DiagnosticCode::UnexpectedPageableOperationReturnType,
            format!("Paging operation '{}' does not return a model", op_name),
            target,
        );
        return (PagingMetadata::default(), None);
    };

    let items_selector = marker
        .items
        .clone()
        .unwrap_or_else(|| PropertySelector::Path("value".to_string()));
    let Some(item_segments) = resolve_segments(&ctx.graph, envelope, &items_selector) else {
        ctx.report(
            DiagnosticCode::UnexpectedPageableOperationReturnType,
            format!(
                "Paging operation '{}' has no item property in its response",
                op_name
            ),
            target,
        );
        return (PagingMetadata::default(), None);
    };
    let items_type = segments_type(&ctx.graph, &item_segments);

    let mut metadata = PagingMetadata {
        item_segments,
        ..PagingMetadata::default()
    };
    if let Some(selector) = &marker.next_link {
        metadata.next_link_segments = resolve_response_selector(ctx, operation, envelope, selector)
            .unwrap_or_else(|| {
                report_unresolved(ctx, operation, "next link", selector);
                Vec::new()
            });
    }
    if let Some(selector) = &marker.continuation_token_response {
        metadata.continuation_token_response_segments =
            resolve_response_selector(ctx, operation, envelope, selector).unwrap_or_else(|| {
                report_unresolved(ctx, operation, "continuation token", selector);
                Vec::new()
            });
    }
    if let Some(selector) = &marker.continuation_token_parameter {
        metadata.continuation_token_parameter_segments =
            resolve_parameter_selector(ctx, mapped, selector).unwrap_or_else(|| {
                report_unresolved(ctx, operation, "continuation token parameter", selector);
                Vec::new()
            });
    }
    (metadata, items_type)
}

fn report_unresolved(
    ctx: &mut CompileContext,
    operation: OperationId,
    what: &str,
    selector: &PropertySelector,
) {
    let described = match selector {
        PropertySelector::Path(path) => path.clone(),
        PropertySelector::Property(id) => ctx.graph.property(*id).name.clone(),
    };
    let message = format!(
        "Paging operation '{}' declares {} '{}' which was not found",
        ctx.graph.operation(operation).name,
        what,
        described
    );
    let target = Some(operation_cross_id(&ctx.graph, operation));
    ctx.report(
        DiagnosticCode::UnexpectedPageableOperationReturnType,
        message,
        target,
    );
}

/// Response headers are searched before the envelope
fn resolve_response_selector(
    ctx: &CompileContext,
    operation: OperationId,
    envelope: TypeId,
    selector: &PropertySelector,
) -> Option<Vec<PropertyId>> {
    let headers: Vec<PropertyId> = ctx
        .graph
        .operation(operation)
        .responses
        .iter()
        .filter(|r| r.status.is_success())
        .flat_map(|r| r.headers.iter().copied())
        .collect();
    let header = headers.into_iter().find(|h| {
        let prop = ctx.graph.property(*h);
        match selector {
            PropertySelector::Path(path) => {
                !path.contains('.') && (prop.name == *path || prop.serialized_name == *path)
            }
            PropertySelector::Property(id) => {
                ctx.graph.root_source(*h) == ctx.graph.root_source(*id)
            }
        }
    });
    match header {
        Some(header) => Some(vec![header]),
        None => resolve_segments(&ctx.graph, envelope, selector),
    }
}

/// Request-side selectors start at a wire parameter
fn resolve_parameter_selector(
    ctx: &CompileContext,
    mapped: &MappedParameters,
    selector: &PropertySelector,
) -> Option<Vec<PropertyId>> {
    match selector {
        PropertySelector::Property(id) => {
            let wanted = ctx.graph.root_source(*id);
            let direct = mapped
                .wire_params
                .iter()
                .find(|w| ctx.graph.root_source(w.property) == wanted);
            if let Some(wire) = direct {
                return Some(vec![wire.property]);
            }
            mapped
                .wire_params
                .iter()
                .find_map(|w| resolve_segments(&ctx.graph, w.type_id, selector).map(|rest| {
                    let mut segments = vec![w.property];
                    segments.extend(rest);
                    segments
                }))
        }
        PropertySelector::Path(path) => {
            let (first, rest) = match path.split_once('.') {
                Some((first, rest)) => (first, Some(rest)),
                None => (path.as_str(), None),
            };
            let wire = mapped
                .wire_params
                .iter()
                .find(|w| w.name == first || w.serialized_name == first)?;
            let mut segments = vec![wire.property];
            if let Some(rest) = rest {
                let nested = PropertySelector::Path(rest.to_string());
                segments.extend(resolve_segments(&ctx.graph, wire.type_id, &nested)?);
            }
            Some(segments)
        }
    }
}
