//! Integration tests for operation classification and metadata extraction

use clientgraph_common::{
    CompilerOptions, DiagnosticCode, FinalStateVia, GraphBuilder, HttpVerb, LroMarker, LroResult,
    NamespaceId, PageableMarker, ParameterLocation, PrimitiveKind, PropertySelector, Protocol,
    StatusCodes, TypeId, TypeKind, UsageFlags,
};
use clientgraph_compiler::{
    compile, MethodKind, PagingMetadata, ResponseNullability, SdkMethod, SdkPackage,
};
use pretty_assertions::assert_eq;

struct Fixture {
    builder: GraphBuilder,
    service: NamespaceId,
    string: TypeId,
    widget: TypeId,
}

fn fixture() -> Fixture {
    let mut builder = GraphBuilder::new();
    let service = builder.service("Widgets");
    let string = builder.primitive(PrimitiveKind::String);
    let widget = builder.model(service, "Widget");
    builder.property(widget, "name", string);
    Fixture {
        builder,
        service,
        string,
        widget,
    }
}

fn method<'p>(package: &'p SdkPackage, name: &str) -> &'p SdkMethod {
    let client = package.find_client("WidgetsClient").unwrap();
    package.find_method(client, name).unwrap()
}

fn path(value: &str) -> Option<PropertySelector> {
    Some(PropertySelector::Path(value.to_string()))
}

#[test]
fn test_basic_operation() {
    let mut f = fixture();
    let op = f.builder.operation(f.service, "getWidget", HttpVerb::Get, "/widgets/{name}");
    f.builder.parameter(op, "name", f.string, ParameterLocation::Path);
    f.builder.response(op, StatusCodes::Exact(200), Some(f.widget));

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let get = method(&package, "getWidget");
    assert_eq!(get.kind, MethodKind::Basic);
    assert_eq!(get.response.type_id, Some(f.widget));
    assert_eq!(get.response.nullability, None);
    assert!(get.paging.is_none());
    assert!(get.lro.is_none());
    assert!(package.diagnostics.is_empty());
}

#[test]
fn test_paging_returns_item_array() {
    let mut f = fixture();
    let url = f.builder.primitive(PrimitiveKind::Url);
    let items = f.builder.array(f.widget);
    let page = f.builder.model(f.service, "WidgetPage");
    let value = f.builder.property(page, "value", items);
    let next_link = f.builder.optional_property(page, "nextLink", url);
    let op = f.builder.operation(f.service, "listWidgets", HttpVerb::Get, "/widgets");
    f.builder.response(op, StatusCodes::Exact(200), Some(page));
    f.builder.pageable(
        op,
        PageableMarker {
            items: path("value"),
            next_link: path("nextLink"),
            ..PageableMarker::default()
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let list = method(&package, "listWidgets");
    assert_eq!(list.kind, MethodKind::Paging);
    assert_eq!(list.response.type_id, Some(items));
    assert_eq!(list.response.result_segments, vec![value]);

    let paging = list.paging.as_ref().unwrap();
    assert_eq!(paging.item_segments, vec![value]);
    assert_eq!(paging.next_link_segments, vec![next_link]);
    assert!(package.diagnostics.is_empty());

    // the envelope is still on the wire
    assert!(package.find_type("WidgetPage").is_some());
}

#[test]
fn test_paging_defaults_item_path_to_value() {
    let mut f = fixture();
    let items = f.builder.array(f.widget);
    let page = f.builder.model(f.service, "WidgetPage");
    let value = f.builder.property(page, "value", items);
    let op = f.builder.operation(f.service, "listWidgets", HttpVerb::Get, "/widgets");
    f.builder.response(op, StatusCodes::Exact(200), Some(page));
    f.builder.pageable(op, PageableMarker::default());

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let paging = method(&package, "listWidgets").paging.clone().unwrap();
    assert_eq!(paging.item_segments, vec![value]);
    assert!(paging.next_link_segments.is_empty());
}

#[test]
fn test_next_link_found_in_response_header() {
    let mut f = fixture();
    let url = f.builder.primitive(PrimitiveKind::Url);
    let items = f.builder.array(f.widget);
    let page = f.builder.model(f.service, "WidgetPage");
    f.builder.property(page, "value", items);
    let op = f.builder.operation(f.service, "listWidgets", HttpVerb::Get, "/widgets");
    let response = f.builder.response(op, StatusCodes::Exact(200), Some(page));
    let header = f.builder.response_header(op, response, "next-link", url);
    f.builder.pageable(
        op,
        PageableMarker {
            items: path("value"),
            next_link: path("next-link"),
            ..PageableMarker::default()
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let paging = method(&package, "listWidgets").paging.clone().unwrap();
    assert_eq!(paging.next_link_segments, vec![header]);
}

#[test]
fn test_continuation_tokens() {
    let mut f = fixture();
    let items = f.builder.array(f.widget);
    let page = f.builder.model(f.service, "WidgetPage");
    f.builder.property(page, "value", items);
    let next_token = f.builder.optional_property(page, "nextToken", f.string);
    let op = f.builder.operation(f.service, "listWidgets", HttpVerb::Get, "/widgets");
    let token = f.builder.parameter(op, "token", f.string, ParameterLocation::Query);
    f.builder.response(op, StatusCodes::Exact(200), Some(page));
    f.builder.pageable(
        op,
        PageableMarker {
            items: path("value"),
            continuation_token_parameter: path("token"),
            continuation_token_response: Some(PropertySelector::Property(next_token)),
            ..PageableMarker::default()
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let paging = method(&package, "listWidgets").paging.clone().unwrap();
    assert_eq!(paging.continuation_token_parameter_segments, vec![token]);
    assert_eq!(paging.continuation_token_response_segments, vec![next_token]);
}

#[test]
fn test_paging_without_model_envelope_degrades() {
    let mut f = fixture();
    let items = f.builder.array(f.widget);
    let op = f.builder.operation(f.service, "listWidgets", HttpVerb::Get, "/widgets");
    f.builder.response(op, StatusCodes::Exact(200), Some(items));
    f.builder.pageable(op, PageableMarker::default());

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let list = method(&package, "listWidgets");
    assert_eq!(list.kind, MethodKind::Paging);
    assert_eq!(list.paging.clone().unwrap(), PagingMetadata::default());
    assert_eq!(
        package
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::UnexpectedPageableOperationReturnType)
            .count(),
        1
    );
    assert!(!package.has_errors());
}

#[test]
fn test_lro_final_result_path() {
    let mut f = fixture();
    let status = f.builder.model(f.service, "PollStatus");
    f.builder.property(status, "status", f.string);
    let result = f.builder.optional_property(status, "result", f.widget);
    let op = f.builder.operation(f.service, "createWidget", HttpVerb::Put, "/widgets/{name}");
    f.builder.response(op, StatusCodes::Exact(202), Some(status));
    f.builder.long_running(
        op,
        LroMarker {
            final_state_via: FinalStateVia::OperationLocationHeader,
            final_envelope: Some(LroResult::Type(status)),
            final_result_path: Some("result".to_string()),
            polling_body: Some(status),
            final_operation: None,
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let create = method(&package, "createWidget");
    assert_eq!(create.kind, MethodKind::Lro);
    let lro = create.lro.as_ref().unwrap();
    assert_eq!(lro.final_result, Some(f.widget));
    assert_eq!(lro.final_envelope, Some(status));
    assert_eq!(lro.result_segments, vec![result]);
    assert_eq!(lro.polling_body, Some(status));
    assert_eq!(create.response.type_id, Some(f.widget));
    assert_eq!(create.response.result_segments, vec![result]);
    assert!(package.diagnostics.is_empty());
}

#[test]
fn test_lro_missing_result_path_falls_back_to_envelope() {
    let mut f = fixture();
    let status = f.builder.model(f.service, "PollStatus");
    f.builder.property(status, "status", f.string);
    let op = f.builder.operation(f.service, "createWidget", HttpVerb::Put, "/widgets/{name}");
    f.builder.response(op, StatusCodes::Exact(202), Some(status));
    f.builder.long_running(
        op,
        LroMarker {
            final_state_via: FinalStateVia::LocationHeader,
            final_envelope: None,
            final_result_path: Some("result".to_string()),
            polling_body: None,
            final_operation: None,
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let lro = method(&package, "createWidget").lro.clone().unwrap();
    assert_eq!(lro.final_result, Some(status));
    assert!(lro.result_segments.is_empty());
    assert_eq!(
        package.diagnostics[0].code,
        DiagnosticCode::LroFinalResultPathNotFound
    );
}

#[test]
fn test_lro_void_result() {
    let mut f = fixture();
    let op = f.builder.operation(f.service, "deleteWidget", HttpVerb::Delete, "/widgets/{name}");
    f.builder.response(op, StatusCodes::Exact(202), None);
    f.builder.long_running(
        op,
        LroMarker {
            final_state_via: FinalStateVia::LocationHeader,
            final_envelope: Some(LroResult::Void),
            final_result_path: None,
            polling_body: None,
            final_operation: None,
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let delete = method(&package, "deleteWidget");
    assert_eq!(delete.kind, MethodKind::Lro);
    assert_eq!(delete.lro.as_ref().unwrap().final_result, None);
    assert_eq!(delete.response.type_id, None);
    assert!(package.diagnostics.is_empty());
}

#[test]
fn test_lro_final_operation_replaces_result() {
    let mut f = fixture();
    let get = f.builder.operation(f.service, "getWidget", HttpVerb::Get, "/widgets/{name}");
    f.builder.response(get, StatusCodes::Exact(200), Some(f.widget));
    let status = f.builder.model(f.service, "PollStatus");
    f.builder.property(status, "status", f.string);
    let op = f.builder.operation(f.service, "createWidget", HttpVerb::Post, "/widgets");
    f.builder.response(op, StatusCodes::Exact(202), Some(status));
    f.builder.long_running(
        op,
        LroMarker {
            final_state_via: FinalStateVia::CustomOperationReference,
            final_envelope: None,
            final_result_path: None,
            polling_body: Some(status),
            final_operation: Some(get),
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let lro = method(&package, "createWidget").lro.clone().unwrap();
    assert_eq!(lro.final_result, Some(f.widget));
    assert_eq!(lro.final_operation, Some(get));
    assert!(lro.result_segments.is_empty());
}

#[test]
fn test_lro_envelope_must_be_model() {
    let mut f = fixture();
    let op = f.builder.operation(f.service, "createWidget", HttpVerb::Post, "/widgets");
    f.builder.response(op, StatusCodes::Exact(202), None);
    f.builder.long_running(
        op,
        LroMarker {
            final_state_via: FinalStateVia::LocationHeader,
            final_envelope: Some(LroResult::Type(f.string)),
            final_result_path: Some("result".to_string()),
            polling_body: None,
            final_operation: None,
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let lro = method(&package, "createWidget").lro.clone().unwrap();
    assert_eq!(lro.final_result, Some(f.string));
    assert_eq!(package.diagnostics[0].code, DiagnosticCode::InvalidLroMetadata);
}

#[test]
fn test_lro_paging() {
    let mut f = fixture();
    let items = f.builder.array(f.widget);
    let page = f.builder.model(f.service, "WidgetPage");
    let value = f.builder.property(page, "value", items);
    let status = f.builder.model(f.service, "PollStatus");
    f.builder.property(status, "status", f.string);
    f.builder.optional_property(status, "result", page);
    let op = f.builder.operation(f.service, "exportWidgets", HttpVerb::Post, "/widgets:export");
    f.builder.response(op, StatusCodes::Exact(202), Some(status));
    f.builder.long_running(
        op,
        LroMarker {
            final_state_via: FinalStateVia::OperationLocationHeader,
            final_envelope: None,
            final_result_path: Some("result".to_string()),
            polling_body: Some(status),
            final_operation: None,
        },
    );
    f.builder.pageable(
        op,
        PageableMarker {
            items: path("value"),
            ..PageableMarker::default()
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let export = method(&package, "exportWidgets");
    assert_eq!(export.kind, MethodKind::LroPaging);
    assert_eq!(export.lro.as_ref().unwrap().final_result, Some(page));
    assert_eq!(export.paging.as_ref().unwrap().item_segments, vec![value]);
    assert_eq!(export.response.type_id, Some(items));
}

#[test]
fn test_explicit_nullable_body() {
    let mut f = fixture();
    let op = f.builder.operation(f.service, "getWidget", HttpVerb::Get, "/widgets/{name}");
    let response = f.builder.response(op, StatusCodes::Exact(200), Some(f.widget));
    f.builder.nullable_response(op, response);

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let get = method(&package, "getWidget");
    assert_eq!(
        get.response.nullability,
        Some(ResponseNullability::ExplicitNullableBody)
    );
    let wrapped = get.response.type_id.unwrap();
    assert_eq!(
        package.graph.type_node(wrapped).kind,
        TypeKind::Nullable { inner: f.widget }
    );
}

#[test]
fn test_optional_from_multiple_responses() {
    let mut f = fixture();
    let op = f.builder.operation(f.service, "getWidget", HttpVerb::Get, "/widgets/{name}");
    f.builder.response(op, StatusCodes::Exact(200), Some(f.widget));
    f.builder.response(op, StatusCodes::Exact(204), None);

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let get = method(&package, "getWidget");
    assert_eq!(
        get.response.nullability,
        Some(ResponseNullability::OptionalFromMultipleResponses)
    );
    let wrapped = get.response.type_id.unwrap();
    assert_eq!(
        package.graph.type_node(wrapped).kind,
        TypeKind::Nullable { inner: f.widget }
    );
}

#[test]
fn test_error_responses_do_not_shape_the_result() {
    let mut f = fixture();
    let error = f.builder.model(f.service, "Error");
    f.builder.property(error, "code", f.string);
    let op = f.builder.operation(f.service, "getWidget", HttpVerb::Get, "/widgets/{name}");
    f.builder.response(op, StatusCodes::Exact(200), Some(f.widget));
    f.builder.response(op, StatusCodes::Default, Some(error));

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let get = method(&package, "getWidget");
    assert_eq!(get.response.type_id, Some(f.widget));
    assert_eq!(get.response.nullability, None);
}

#[test]
fn test_error_responses_are_kept_as_exceptions() {
    let mut f = fixture();
    let error = f.builder.model(f.service, "Error");
    f.builder.property(error, "code", f.string);
    let not_found = f.builder.model(f.service, "NotFound");
    f.builder.property(not_found, "resource", f.string);
    let op = f.builder.operation(f.service, "getWidget", HttpVerb::Get, "/widgets/{name}");
    f.builder.response(op, StatusCodes::Exact(200), Some(f.widget));
    f.builder.response(op, StatusCodes::Range { start: 400, end: 499 }, Some(not_found));
    f.builder.response(op, StatusCodes::Default, Some(error));

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let http = method(&package, "getWidget").operation.as_ref().unwrap();
    let statuses: Vec<StatusCodes> = http.responses.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![StatusCodes::Exact(200)]);
    let exceptions: Vec<_> = http.exceptions.iter().map(|r| (r.status, r.type_id)).collect();
    assert_eq!(
        exceptions,
        vec![
            (StatusCodes::Range { start: 400, end: 499 }, Some(not_found)),
            (StatusCodes::Default, Some(error)),
        ]
    );

    // error models are told apart from regular outputs
    let usage = |id: TypeId| package.graph.type_node(id).usage;
    assert!(usage(error).contains(UsageFlags::OUTPUT | UsageFlags::EXCEPTION));
    assert!(usage(not_found).contains(UsageFlags::EXCEPTION));
    assert!(!usage(f.widget).contains(UsageFlags::EXCEPTION));
}

#[test]
fn test_multiple_response_types() {
    let mut f = fixture();
    let gadget = f.builder.model(f.service, "Gadget");
    f.builder.property(gadget, "id", f.string);
    let op = f.builder.operation(f.service, "getThing", HttpVerb::Get, "/things/{id}");
    f.builder.response(op, StatusCodes::Exact(200), Some(f.widget));
    f.builder.response(op, StatusCodes::Exact(201), Some(gadget));

    let package = compile(f.builder.build(), &CompilerOptions::default());
    assert_eq!(method(&package, "getThing").response.type_id, Some(f.widget));
    assert_eq!(
        package.diagnostics[0].code,
        DiagnosticCode::MultipleResponseTypes
    );
}

#[test]
fn test_unsupported_protocol_is_dropped() {
    let mut f = fixture();
    let keep = f.builder.operation(f.service, "getWidget", HttpVerb::Get, "/widgets/{name}");
    f.builder.response(keep, StatusCodes::Exact(200), Some(f.widget));
    let drop = f.builder.operation(f.service, "streamWidgets", HttpVerb::Get, "/stream");
    f.builder.protocol(drop, Protocol::Other("grpc".to_string()));

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let client = package.find_client("WidgetsClient").unwrap();
    assert!(package.find_method(client, "getWidget").is_some());
    assert!(package.find_method(client, "streamWidgets").is_none());
    assert_eq!(package.diagnostics[0].code, DiagnosticCode::UnsupportedProtocol);
    assert!(package.has_errors());
}

#[test]
fn test_lro_initial_responses_may_differ() {
    let mut f = fixture();
    let status = f.builder.model(f.service, "PollStatus");
    f.builder.property(status, "status", f.string);
    let op = f.builder.operation(f.service, "createWidget", HttpVerb::Put, "/widgets/{name}");
    f.builder.response(op, StatusCodes::Exact(201), Some(f.widget));
    f.builder.response(op, StatusCodes::Exact(202), Some(status));
    f.builder.long_running(
        op,
        LroMarker {
            final_state_via: FinalStateVia::OriginalUri,
            final_envelope: None,
            final_result_path: None,
            polling_body: Some(status),
            final_operation: None,
        },
    );

    let package = compile(f.builder.build(), &CompilerOptions::default());
    let lro = method(&package, "createWidget").lro.clone().unwrap();
    assert_eq!(lro.final_result, Some(f.widget));
    assert!(package.diagnostics.is_empty());
}
