//! End-to-end test compiling the bundled widgets demo

use clientgraph_common::{Access, CompilerOptions, DiagnosticCode};
use clientgraph_compiler::{MethodKind, PackageCompiler, ParameterKind, SdkPackage};
use clientgraph_parser::{load_examples, GraphParser};
use pretty_assertions::assert_eq;
use std::path::Path;

const DEMO_GRAPH: &str = include_str!("../../../demos/widgets.graph.json");

fn compile_demo(emitter: &str) -> SdkPackage {
    let graph = GraphParser::from_json(DEMO_GRAPH).unwrap().parse().unwrap();
    let examples_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/examples");
    let loaded = load_examples(&examples_dir).unwrap();
    assert!(loaded.failures.is_empty());

    let options = CompilerOptions::for_emitter(emitter);
    PackageCompiler::new(graph, &options)
        .with_examples(&loaded.documents)
        .compile()
}

#[test]
fn test_demo_clients() {
    let package = compile_demo("python");
    assert_eq!(package.name, "Widgets");
    assert_eq!(package.clients.len(), 1);

    let root = package.find_client("WidgetsClient").unwrap();
    let kinds: Vec<&str> = root
        .initialization
        .parameters
        .iter()
        .map(|id| match package.parameter(*id).kind {
            ParameterKind::Endpoint { .. } => "endpoint",
            ParameterKind::TemplateArgument => "template",
            ParameterKind::Credential { .. } => "credential",
            ParameterKind::ApiVersion { .. } => "api-version",
            ParameterKind::ClientInitialization { .. } => "client-initialization",
            ParameterKind::Method => "method",
        })
        .collect();
    assert_eq!(kinds, vec!["endpoint", "template", "credential", "api-version"]);

    let parts = package.find_client("Parts").unwrap();
    assert_eq!(
        package.find_method(root, "getParts").unwrap().accessed_client,
        Some(root.children[0])
    );
    assert_eq!(parts.initialization.parameters, root.initialization.parameters);
}

#[test]
fn test_demo_methods() {
    let package = compile_demo("python");
    let root = package.find_client("WidgetsClient").unwrap();

    let get = package.find_method(root, "getWidget").unwrap();
    assert_eq!(get.kind, MethodKind::Basic);
    let names: Vec<_> = get
        .parameters
        .iter()
        .map(|id| package.parameter(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["name"]);

    let list = package.find_method(root, "listWidgets").unwrap();
    assert_eq!(list.kind, MethodKind::Paging);
    assert_eq!(list.paging.as_ref().unwrap().next_link_segments.len(), 1);

    let create = package.find_method(root, "createWidget").unwrap();
    assert_eq!(create.kind, MethodKind::Lro);
    let widget = package.find_type("Widget").unwrap().id;
    assert_eq!(create.response.type_id, Some(widget));
    assert_eq!(create.response.result_segments.len(), 1);

    let parts = package.find_client("Parts").unwrap();
    let upload = package.find_method(parts, "upload").unwrap();
    let names: Vec<_> = upload
        .parameters
        .iter()
        .map(|id| package.parameter(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["blobName", "color", "weight"]);
}

#[test]
fn test_demo_examples_bound() {
    let package = compile_demo("python");
    assert!(package.diagnostics.is_empty(), "{:?}", package.diagnostics);

    let root = package.find_client("WidgetsClient").unwrap();
    let get = package.find_method(root, "getWidget").unwrap();
    assert_eq!(get.examples.len(), 1);
    assert_eq!(get.examples[0].title, "Get a widget");
    assert_eq!(get.examples[0].parameters.len(), 2);

    let parts = package.find_client("Parts").unwrap();
    let upload = package.find_method(parts, "upload").unwrap();
    assert_eq!(upload.examples.len(), 1);
    assert_eq!(upload.examples[0].responses[0].status, 204);
}

#[test]
fn test_demo_scoped_access_override() {
    let python = compile_demo("python");
    assert_eq!(python.find_type("OperationStatus").unwrap().access, Access::Public);

    // csharp sees the internal override, which loses against the public lro
    let csharp = compile_demo("csharp");
    assert_eq!(csharp.find_type("OperationStatus").unwrap().access, Access::Public);
    assert!(csharp
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::ConflictAccessOverride
            && d.target.as_deref() == Some("OperationStatus")));
}

#[test]
fn test_demo_package_serializes() {
    let package = compile_demo("python");
    let json = serde_json::to_value(&package).unwrap();
    assert_eq!(json["name"], "Widgets");
    assert_eq!(json["methods"].as_array().unwrap().len(), package.methods.len());
}
