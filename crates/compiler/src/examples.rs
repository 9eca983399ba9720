//! Example binding
//!
//! Example documents are matched to methods by operation id and their JSON
//! literals are walked against the declared types. A literal that does not
//! fit its type is dropped with a diagnostic; the rest of the example stays.

use crate::context::CompileContext;
use crate::package::{
    BoundExample, ExampleParameter, ExampleResponseValue, ExampleValue, SdkHttpOperation,
    SdkHttpResponse,
};
use clientgraph_common::{
    pascal_case, BodyKind, DescriptionGraph, DiagnosticCode, ExampleDocument, ExampleResponse,
    NamespaceKind, OperationId, ParameterLocation, PrimitiveKind, PropertyId, StatusCodes, TypeId,
    TypeKind,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Attach every example to the method it documents
pub fn bind_examples(ctx: &mut CompileContext, examples: &[ExampleDocument]) {
    let index = method_index(ctx);
    let mut titles: HashSet<(usize, String)> = HashSet::new();

    for example in examples {
        let operation_id = example
            .operation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let Some(operation_id) = operation_id else {
            ctx.report(
                DiagnosticCode::ExampleLoading,
                format!("Example '{}' has no operationId", example.file_path),
                Some(example.file_path.clone()),
            );
            continue;
        };
        let Some(&method) = index.get(&operation_id.to_lowercase()) else {
            tracing::debug!(operation_id, file = %example.file_path, "example matches no operation");
            continue;
        };

        let title = example.display_title().to_string();
        if !titles.insert((method, title.clone())) {
            ctx.report(
                DiagnosticCode::DuplicateExampleFile,
                format!(
                    "Example title '{}' is used more than once for operation '{}'",
                    title, operation_id
                ),
                Some(example.file_path.clone()),
            );
            continue;
        }

        let Some(http) = ctx.methods[method].operation.clone() else {
            continue;
        };
        let mut walker = ValueWalker::new(&ctx.graph);
        let bound = walker.bind(&http, example, title);
        let failures = walker.failures;
        for failure in failures {
            ctx.report(
                DiagnosticCode::ExampleValueNoMapping,
                format!("{} in example '{}'", failure, example.file_path),
                Some(example.file_path.clone()),
            );
        }
        tracing::debug!(operation_id, file = %example.file_path, "bound example");
        ctx.methods[method].examples.push(bound);
    }
}

/// Lowercased example ids and cross-component ids to method index
fn method_index(ctx: &CompileContext) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (position, method) in ctx.methods.iter().enumerate() {
        let Some(http) = &method.operation else {
            continue;
        };
        let id = example_operation_id(&ctx.graph, http.operation);
        index.entry(id.to_lowercase()).or_insert(position);
        index
            .entry(method.cross_component_id.to_lowercase())
            .or_insert(position);
    }
    index
}

/// Explicit operation id, else `Group_Op` inside a group, else `Op`
pub fn example_operation_id(graph: &DescriptionGraph, operation: OperationId) -> String {
    let op = graph.operation(operation);
    if let Some(id) = &op.operation_id {
        return id.clone();
    }
    let namespace = graph.namespace(op.namespace);
    if namespace.kind == NamespaceKind::Interface || !namespace.is_service {
        format!("{}_{}", pascal_case(&namespace.name), pascal_case(&op.name))
    } else {
        pascal_case(&op.name)
    }
}

struct ValueWalker<'g> {
    graph: &'g DescriptionGraph,
    failures: Vec<String>,
}

impl<'g> ValueWalker<'g> {
    fn new(graph: &'g DescriptionGraph) -> Self {
        Self {
            graph,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, path: &str, reason: impl Into<String>) {
        self.failures.push(format!("'{}': {}", path, reason.into()));
    }

    fn bind(&mut self, http: &SdkHttpOperation, example: &ExampleDocument, title: String) -> BoundExample {
        let mut parameters = Vec::new();
        for (key, value) in &example.parameters {
            if key == "description" {
                continue;
            }
            let path = format!("parameters.{}", key);
            parameters.extend(self.bind_parameter(http, key, value, &path));
        }

        let mut responses = Vec::new();
        for (code, response) in &example.responses {
            let path = format!("responses.{}", code);
            let Ok(status) = code.parse::<u16>() else {
                self.fail(&path, "status code is not a number");
                continue;
            };
            match find_response(http, status) {
                Some(declared) => responses.push(self.bind_response(declared, status, response, &path)),
                None => self.fail(&path, "operation declares no such response"),
            }
        }

        BoundExample {
            title,
            file_path: example.file_path.clone(),
            parameters,
            responses,
        }
    }

    fn bind_parameter(
        &mut self,
        http: &SdkHttpOperation,
        key: &str,
        value: &Value,
        path: &str,
    ) -> Option<ExampleParameter> {
        let wire = http
            .parameters
            .iter()
            .find(|w| w.serialized_name == key || w.name == key)
            .or_else(|| {
                (key == "body")
                    .then(|| http.parameters.iter().find(|w| w.location == ParameterLocation::Body))
                    .flatten()
            });
        if let Some(wire) = wire {
            let value = self.walk(wire.type_id, value, path)?;
            return Some(ExampleParameter {
                property: wire.property,
                value,
            });
        }

        if let Some(property) = self.spread_property(http, key) {
            let type_id = self.graph.property(property).type_id;
            let value = self.walk(type_id, value, path)?;
            return Some(ExampleParameter { property, value });
        }
        self.fail(path, "no parameter with this name");
        None
    }

    /// Property of a spread body model, looked up by name
    fn spread_property(&self, http: &SdkHttpOperation, key: &str) -> Option<PropertyId> {
        http.parameters
            .iter()
            .filter(|w| w.body_kind == BodyKind::Spread)
            .find_map(|w| {
                let model = self.graph.non_nullable(w.type_id);
                self.graph.find_property(model, key)
            })
    }

    fn bind_response(
        &mut self,
        declared: &SdkHttpResponse,
        status: u16,
        example: &ExampleResponse,
        path: &str,
    ) -> ExampleResponseValue {
        let body = match (&example.body, declared.type_id) {
            (Some(value), Some(type_id)) => self.walk(type_id, value, &format!("{}.body", path)),
            (Some(_), None) => {
                self.fail(path, "response declares no body");
                None
            }
            (None, _) => None,
        };

        let mut headers = Vec::new();
        for (name, value) in &example.headers {
            let header_path = format!("{}.headers.{}", path, name);
            let header = declared.headers.iter().copied().find(|h| {
                let prop = self.graph.property(*h);
                prop.name.eq_ignore_ascii_case(name) || prop.serialized_name.eq_ignore_ascii_case(name)
            });
            let Some(header) = header else {
                self.fail(&header_path, "response declares no such header");
                continue;
            };
            let type_id = self.graph.property(header).type_id;
            if let Some(value) = self.walk(type_id, value, &header_path) {
                headers.push(ExampleParameter {
                    property: header,
                    value,
                });
            }
        }

        ExampleResponseValue {
            status,
            body,
            headers,
        }
    }

    /// Map `value` onto `type_id`; `None` drops the value
    fn walk(&mut self, type_id: TypeId, value: &Value, path: &str) -> Option<ExampleValue> {
        let graph = self.graph;
        match &graph.type_node(type_id).kind {
            TypeKind::Primitive { primitive } => self.walk_primitive(type_id, *primitive, value, path),
            TypeKind::Constant { value: literal, .. } => {
                if literal.matches_json(value) {
                    literal_example(type_id, value)
                } else {
                    self.fail(path, format!("{} does not match the constant", value));
                    None
                }
            }
            TypeKind::Enum(enumeration) => {
                let known = enumeration.members.iter().any(|m| m.value.matches_json(value));
                let open = !enumeration.is_fixed && json_fits(enumeration.value_kind, value);
                if known || open {
                    literal_example(type_id, value)
                } else {
                    self.fail(path, format!("{} is not a member of the enum", value));
                    None
                }
            }
            TypeKind::Nullable { inner } => {
                if value.is_null() {
                    Some(ExampleValue::Null { type_id })
                } else {
                    self.walk(*inner, value, path)
                }
            }
            TypeKind::Union(_) => Some(ExampleValue::Union {
                type_id,
                value: value.clone(),
            }),
            TypeKind::Array { element } => {
                let Some(items) = value.as_array() else {
                    self.fail(path, "expected an array");
                    return None;
                };
                let values = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| self.walk(*element, item, &format!("{}[{}]", path, i)))
                    .collect();
                Some(ExampleValue::Array { type_id, values })
            }
            TypeKind::Dict { element } => {
                let Some(entries) = value.as_object() else {
                    self.fail(path, "expected an object");
                    return None;
                };
                let mut values = IndexMap::new();
                for (key, item) in entries {
                    if let Some(bound) = self.walk(*element, item, &format!("{}.{}", path, key)) {
                        values.insert(key.clone(), bound);
                    }
                }
                Some(ExampleValue::Dict { type_id, values })
            }
            TypeKind::Model(_) => self.walk_model(type_id, value, path),
        }
    }

    fn walk_primitive(
        &mut self,
        type_id: TypeId,
        primitive: PrimitiveKind,
        value: &Value,
        path: &str,
    ) -> Option<ExampleValue> {
        if primitive == PrimitiveKind::Any {
            return Some(ExampleValue::Unknown {
                type_id,
                value: value.clone(),
            });
        }
        if json_fits(primitive, value) {
            return literal_example(type_id, value);
        }
        self.fail(path, format!("{} is not a valid {:?}", value, primitive));
        None
    }

    fn walk_model(&mut self, type_id: TypeId, value: &Value, path: &str) -> Option<ExampleValue> {
        let Some(object) = value.as_object() else {
            self.fail(path, "expected an object");
            return None;
        };
        let model_id = self.dispatch_subtype(type_id, object, path);

        let mut properties = IndexMap::new();
        let mut additional_properties = IndexMap::new();
        let additional = self.additional_properties_type(model_id);
        for (key, item) in object {
            let item_path = format!("{}.{}", path, key);
            if let Some(property) = self.graph.find_property(model_id, key) {
                let property_type = self.graph.property(property).type_id;
                if let Some(bound) = self.walk(property_type, item, &item_path) {
                    properties.insert(key.clone(), bound);
                }
            } else if let Some(additional) = additional {
                if let Some(bound) = self.walk(additional, item, &item_path) {
                    additional_properties.insert(key.clone(), bound);
                }
            } else {
                self.fail(&item_path, "model has no such property");
            }
        }
        Some(ExampleValue::Model {
            type_id: model_id,
            properties,
            additional_properties,
        })
    }

    /// Follow the discriminator value down to the matching subtype
    fn dispatch_subtype(
        &mut self,
        type_id: TypeId,
        object: &serde_json::Map<String, Value>,
        path: &str,
    ) -> TypeId {
        let graph = self.graph;
        let mut current = type_id;
        let mut seen = HashSet::new();
        while seen.insert(current) {
            let Some(model) = graph.type_node(current).as_model() else {
                break;
            };
            let (Some(discriminator), false) = (&model.discriminator, model.subtypes.is_empty()) else {
                break;
            };
            let Some(value) = object.get(discriminator).and_then(Value::as_str) else {
                break;
            };
            match model.subtypes.get(value) {
                Some(subtype) if *subtype != current => current = *subtype,
                Some(_) => break,
                None => {
                    let reason = format!("discriminator value '{}' is not mapped", value);
                    self.fail(path, reason);
                    break;
                }
            }
        }
        current
    }

    fn additional_properties_type(&self, model: TypeId) -> Option<TypeId> {
        let mut current = Some(model);
        let mut seen = HashSet::new();
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let node = self.graph.type_node(id).as_model()?;
            if node.additional_properties.is_some() {
                return node.additional_properties;
            }
            current = node.base;
        }
        None
    }
}

/// Response declared for `status` among success and error responses:
/// exact code, then range, then default
fn find_response(http: &SdkHttpOperation, status: u16) -> Option<&SdkHttpResponse> {
    let declared = || http.responses.iter().chain(&http.exceptions);
    declared()
        .find(|r| r.status == StatusCodes::Exact(status))
        .or_else(|| {
            declared().find(|r| matches!(r.status, StatusCodes::Range { .. }) && r.status.matches(status))
        })
        .or_else(|| declared().find(|r| r.status == StatusCodes::Default))
}

fn json_fits(primitive: PrimitiveKind, value: &Value) -> bool {
    match primitive {
        PrimitiveKind::Any => true,
        PrimitiveKind::Boolean => value.is_boolean(),
        p if p.is_numeric() => value.is_number(),
        p if p.is_string_like() => value.is_string(),
        _ => false,
    }
}

fn literal_example(type_id: TypeId, value: &Value) -> Option<ExampleValue> {
    match value {
        Value::String(s) => Some(ExampleValue::String {
            type_id,
            value: s.clone(),
        }),
        Value::Number(n) => n.as_f64().map(|value| ExampleValue::Number { type_id, value }),
        Value::Bool(b) => Some(ExampleValue::Boolean { type_id, value: *b }),
        Value::Null => Some(ExampleValue::Null { type_id }),
        other => Some(ExampleValue::Unknown {
            type_id,
            value: other.clone(),
        }),
    }
}
