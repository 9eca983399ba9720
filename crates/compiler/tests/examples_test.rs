//! Integration tests for binding example documents to methods

use clientgraph_common::{
    CompilerOptions, DescriptionGraph, DiagnosticCode, ExampleDocument, ExampleResponse,
    GraphBuilder, HttpVerb, LiteralValue, ParameterLocation, PrimitiveKind, StatusCodes, TypeId,
};
use clientgraph_compiler::{
    example_operation_id, BoundExample, ExampleValue, PackageCompiler, SdkPackage,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::json;

struct Shop {
    graph: DescriptionGraph,
    pet: TypeId,
    dog: TypeId,
}

/// `getPet(name) -> Pet` where Pet is polymorphic on `kind`
fn shop() -> Shop {
    let mut b = GraphBuilder::new();
    let service = b.service("PetShop");
    let string = b.primitive(PrimitiveKind::String);
    let int32 = b.primitive(PrimitiveKind::Int32);
    let size = b.enumeration(
        service,
        "Size",
        &[
            ("small", LiteralValue::String("small".to_string())),
            ("large", LiteralValue::String("large".to_string())),
        ],
        true,
    );

    let pet = b.model(service, "Pet");
    b.property(pet, "kind", string);
    b.optional_property(pet, "size", size);
    b.discriminator(pet, "kind");
    let dog = b.model(service, "Dog");
    b.property(dog, "barks", int32);
    b.subtype(pet, dog, "dog");
    let tags = b.model(service, "Tags");
    b.additional_properties(tags, string);
    b.optional_property(pet, "tags", tags);

    let op = b.operation(service, "getPet", HttpVerb::Get, "/pets/{name}");
    b.parameter(op, "name", string, ParameterLocation::Path);
    let ok = b.response(op, StatusCodes::Exact(200), Some(pet));
    b.response_header(op, ok, "etag", string);
    b.response(op, StatusCodes::Default, None);

    let internal = b.interface(service, "Admin");
    let purge = b.operation(internal, "purge", HttpVerb::Post, "/purge");
    b.response(purge, StatusCodes::Exact(204), None);

    Shop {
        graph: b.build(),
        pet,
        dog,
    }
}

fn document(operation_id: Option<&str>, title: &str, file: &str) -> ExampleDocument {
    ExampleDocument {
        operation_id: operation_id.map(str::to_string),
        title: Some(title.to_string()),
        parameters: IndexMap::new(),
        responses: IndexMap::new(),
        file_path: file.to_string(),
    }
}

fn compile_with(graph: DescriptionGraph, examples: &[ExampleDocument]) -> SdkPackage {
    let options = CompilerOptions::default();
    PackageCompiler::new(graph, &options)
        .with_examples(examples)
        .compile()
}

fn examples_of<'p>(package: &'p SdkPackage, client: &str, method: &str) -> &'p [BoundExample] {
    let client = package.find_client(client).unwrap();
    &package.find_method(client, method).unwrap().examples
}

fn count(package: &SdkPackage, code: DiagnosticCode) -> usize {
    package.diagnostics.iter().filter(|d| d.code == code).count()
}

#[test]
fn test_example_operation_ids() {
    let shop = shop();
    let ids: Vec<String> = shop
        .graph
        .operation_ids()
        .map(|op| example_operation_id(&shop.graph, op))
        .collect();
    assert_eq!(ids, vec!["GetPet", "Admin_Purge"]);
}

#[test]
fn test_bind_parameters_and_response() {
    let shop = shop();
    let mut example = document(Some("GetPet"), "Get a dog", "get_pet.json");
    example.parameters.insert("name".to_string(), json!("rex"));
    example
        .parameters
        .insert("description".to_string(), json!("ignored"));
    example.responses.insert(
        "200".to_string(),
        ExampleResponse {
            body: Some(json!({ "kind": "dog", "barks": 3, "size": "large" })),
            headers: IndexMap::from([("ETag".to_string(), json!("abc"))]),
        },
    );

    let package = compile_with(shop.graph, &[example]);
    assert!(package.diagnostics.is_empty(), "{:?}", package.diagnostics);
    let bound = examples_of(&package, "PetShopClient", "getPet");
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].title, "Get a dog");
    assert_eq!(bound[0].parameters.len(), 1);
    assert!(matches!(
        &bound[0].parameters[0].value,
        ExampleValue::String { value, .. } if value == "rex"
    ));

    let response = &bound[0].responses[0];
    assert_eq!(response.status, 200);
    assert_eq!(response.headers.len(), 1);
    match response.body.as_ref().unwrap() {
        ExampleValue::Model {
            type_id,
            properties,
            additional_properties,
        } => {
            // dispatched to the subtype named by the discriminator
            assert_eq!(*type_id, shop.dog);
            assert_eq!(properties.len(), 3);
            assert!(additional_properties.is_empty());
        }
        other => panic!("expected a model, got {:?}", other),
    }
}

#[test]
fn test_operation_id_match_is_case_insensitive() {
    let shop = shop();
    let example = document(Some("admin_purge"), "Purge", "purge.json");

    let package = compile_with(shop.graph, &[example]);
    assert_eq!(examples_of(&package, "Admin", "purge").len(), 1);
}

#[test]
fn test_status_falls_back_to_default_response() {
    let shop = shop();
    let mut example = document(Some("GetPet"), "Missing", "missing.json");
    example
        .responses
        .insert("404".to_string(), ExampleResponse::default());

    let package = compile_with(shop.graph, &[example]);
    let bound = examples_of(&package, "PetShopClient", "getPet");
    assert_eq!(bound[0].responses[0].status, 404);
    assert!(package.diagnostics.is_empty());
}

#[test]
fn test_bad_value_is_dropped_and_reported() {
    let shop = shop();
    let mut example = document(Some("GetPet"), "Bad size", "bad_size.json");
    example.responses.insert(
        "200".to_string(),
        ExampleResponse {
            body: Some(json!({ "kind": "cat", "size": "huge" })),
            headers: IndexMap::new(),
        },
    );

    let package = compile_with(shop.graph, &[example]);
    let bound = examples_of(&package, "PetShopClient", "getPet");
    match bound[0].responses[0].body.as_ref().unwrap() {
        ExampleValue::Model {
            type_id,
            properties,
            ..
        } => {
            assert_eq!(*type_id, shop.pet);
            assert!(properties.contains_key("kind"));
            assert!(!properties.contains_key("size"));
        }
        other => panic!("expected a model, got {:?}", other),
    }
    // unmapped discriminator and the enum value
    assert_eq!(count(&package, DiagnosticCode::ExampleValueNoMapping), 2);
    assert!(!package.has_errors());
}

#[test]
fn test_additional_properties_are_collected() {
    let shop = shop();
    let mut example = document(Some("GetPet"), "Tagged", "tagged.json");
    example.responses.insert(
        "200".to_string(),
        ExampleResponse {
            body: Some(json!({ "kind": "dog", "barks": 1, "tags": { "color": "brown" } })),
            headers: IndexMap::new(),
        },
    );

    let package = compile_with(shop.graph, &[example]);
    let bound = examples_of(&package, "PetShopClient", "getPet");
    let ExampleValue::Model { properties, .. } = bound[0].responses[0].body.as_ref().unwrap() else {
        panic!("expected a model");
    };
    let ExampleValue::Model {
        additional_properties,
        ..
    } = &properties["tags"]
    else {
        panic!("expected tags to be a model");
    };
    assert_eq!(additional_properties.len(), 1);
    assert!(package.diagnostics.is_empty());
}

#[test]
fn test_duplicate_titles() {
    let shop = shop();
    let first = document(Some("GetPet"), "Same", "first.json");
    let second = document(Some("GetPet"), "Same", "second.json");

    let package = compile_with(shop.graph, &[first, second]);
    assert_eq!(examples_of(&package, "PetShopClient", "getPet").len(), 1);
    assert_eq!(count(&package, DiagnosticCode::DuplicateExampleFile), 1);
    assert!(package.has_errors());
}

#[test]
fn test_missing_operation_id() {
    let shop = shop();
    let example = document(None, "Anonymous", "anonymous.json");
    let blank = document(Some("  "), "Blank", "blank.json");

    let package = compile_with(shop.graph, &[example, blank]);
    assert_eq!(count(&package, DiagnosticCode::ExampleLoading), 2);
}

#[test]
fn test_unknown_operation_is_ignored() {
    let shop = shop();
    let example = document(Some("DeletePet"), "Delete", "delete.json");

    let package = compile_with(shop.graph, &[example]);
    assert!(package.diagnostics.is_empty());
    assert!(examples_of(&package, "PetShopClient", "getPet").is_empty());
}

#[test]
fn test_load_failures_become_diagnostics() {
    let shop = shop();
    let options = CompilerOptions::default();
    let package = PackageCompiler::new(shop.graph, &options)
        .with_example_failures([("broken.json".to_string(), "expected value".to_string())])
        .compile();
    assert_eq!(count(&package, DiagnosticCode::ExampleLoading), 1);
    assert_eq!(package.diagnostics[0].target.as_deref(), Some("broken.json"));
}
