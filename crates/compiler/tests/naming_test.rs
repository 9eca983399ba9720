//! Integration tests for generated names of anonymous types

use clientgraph_common::{
    pascal_case, BodyKind, CompilerOptions, DescriptionGraph, GraphBuilder, HttpVerb,
    PrimitiveKind, StatusCodes, TypeId,
};
use clientgraph_compiler::{compile, NameResolver};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Named `Root` with a chain of anonymous models hung off `names`
fn nested_chain(names: &[String]) -> (DescriptionGraph, Vec<TypeId>) {
    let mut b = GraphBuilder::new();
    let service = b.service("Shapes");
    let root = b.model(service, "Root");
    let mut chain = Vec::new();
    let mut parent = root;
    for name in names {
        let child = b.anonymous_model();
        b.property(parent, name, child);
        chain.push(child);
        parent = child;
    }
    let op = b.operation(service, "getRoot", HttpVerb::Get, "/root");
    b.response(op, StatusCodes::Exact(200), Some(root));
    (b.build(), chain)
}

#[test]
fn test_nested_anonymous_models() {
    let (graph, chain) = nested_chain(&["a".to_string(), "b".to_string()]);
    let mut names = NameResolver::new(None);
    assert_eq!(names.name_for(&graph, chain[0]), "RootA");
    assert_eq!(names.name_for(&graph, chain[1]), "RootAB");
    assert_eq!(
        names.cross_component_id(&graph, chain[1]),
        "Shapes.Root.a.b.anonymous"
    );
}

#[test]
fn test_generated_names_in_package() {
    let (graph, chain) = nested_chain(&["details".to_string()]);
    let package = compile(graph, &CompilerOptions::default());
    let entry = package.find_type("RootDetails").unwrap();
    assert_eq!(entry.id, chain[0]);
    assert!(entry.generated_name);
    assert!(!package.find_type("Root").unwrap().generated_name);
}

#[test]
fn test_spread_request_and_response_names() {
    let mut b = GraphBuilder::new();
    let service = b.service("Widgets");
    let string = b.primitive(PrimitiveKind::String);
    let request = b.anonymous_model();
    b.property(request, "color", string);
    let response = b.anonymous_model();
    b.property(response, "id", string);
    let op = b.operation(service, "paintWidget", HttpVerb::Post, "/paint");
    b.body(op, "body", request, BodyKind::Spread);
    b.response(op, StatusCodes::Exact(200), Some(response));

    let package = compile(b.build(), &CompilerOptions::default());
    assert_eq!(package.find_type("PaintWidgetRequest").unwrap().id, request);
    assert_eq!(package.find_type("PaintWidgetResponse").unwrap().id, response);
}

#[test]
fn test_compiling_twice_is_stable() {
    let names = ["inner".to_string(), "deeper".to_string(), "deepest".to_string()];
    let first = compile(nested_chain(&names).0, &CompilerOptions::default());
    let second = compile(nested_chain(&names).0, &CompilerOptions::default());
    assert_eq!(first.models, second.models);
    assert_eq!(
        serde_json::to_value(&first.methods).unwrap(),
        serde_json::to_value(&second.methods).unwrap()
    );
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

proptest! {
    #[test]
    fn test_names_are_a_function_of_position(chain in prop::collection::vec(segment(), 1..6)) {
        let (graph, ids) = nested_chain(&chain);
        let mut first = NameResolver::new(None);
        let mut second = NameResolver::new(None);

        let mut expected = "Root".to_string();
        for (segment, id) in chain.iter().zip(&ids) {
            expected.push_str(&pascal_case(segment));
            prop_assert_eq!(first.name_for(&graph, *id), expected.clone());
        }
        // resolving deepest-first must not change anything
        for id in ids.iter().rev() {
            prop_assert_eq!(second.name_for(&graph, *id), first.name_for(&graph, *id));
            prop_assert_eq!(
                second.cross_component_id(&graph, *id),
                first.cross_component_id(&graph, *id)
            );
        }
    }
}
