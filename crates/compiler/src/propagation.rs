//! Access and usage propagation
//!
//! Runs once every operation has been classified. Usage is OR-accumulated
//! along type edges and never cleared. Access takes the widest value that
//! reaches a type, so a narrowing override loses against a public use and
//! is reported as a conflict.

use crate::context::CompileContext;
use crate::package::ParameterKind;
use clientgraph_common::{
    Access, BodyKind, DescriptionGraph, DiagnosticCode, OverrideTarget, ParameterLocation,
    PropertyId, PropertyOwner, TypeId, TypeKind, UsageFlags,
};
use std::collections::{HashSet, VecDeque};

/// Roles that describe how a type is reached rather than what it is
const ROOT_ONLY: UsageFlags = UsageFlags::from_bits(
    UsageFlags::SPREAD.bits()
        | UsageFlags::API_VERSION_ENUM.bits()
        | UsageFlags::CLIENT_INITIALIZATION.bits(),
);

/// Roles a usage override may add
const OVERRIDABLE: UsageFlags = UsageFlags::from_bits(
    UsageFlags::INPUT.bits() | UsageFlags::OUTPUT.bits() | UsageFlags::JSON.bits(),
);

#[derive(Debug, Clone, Copy)]
struct UsageRoot {
    type_id: TypeId,
    usage: UsageFlags,
    access: Access,
}

pub(crate) fn propagate(ctx: &mut CompileContext) {
    report_invalid_scopes(ctx);

    let roots = collect_roots(ctx);
    tracing::debug!(roots = roots.len(), "propagating usage");
    for root in &roots {
        mark_usage(&mut ctx.graph, root.type_id, root.usage);
    }
    apply_usage_overrides(ctx);
    resolve_type_access(ctx, &roots);
    propagate_to_subtypes(ctx);
    resolve_property_access(ctx);
}

fn report_invalid_scopes(ctx: &mut CompileContext) {
    let invalid: Vec<String> = ctx
        .graph
        .overrides
        .invalid_scopes()
        .into_iter()
        .map(|(_, err)| err.to_string())
        .collect();
    for message in invalid {
        ctx.report(DiagnosticCode::InvalidScope, message, None);
    }
}

/// Types referenced directly by methods and client initialization
fn collect_roots(ctx: &CompileContext) -> Vec<UsageRoot> {
    let convenience = ctx.options.generate_convenience_methods;
    let mut roots = Vec::new();
    let mut push = |type_id: TypeId, usage: UsageFlags, access: Access| {
        roots.push(UsageRoot {
            type_id,
            usage,
            access,
        })
    };

    for method in &ctx.methods {
        let Some(http) = &method.operation else {
            continue;
        };
        let access = method.access;
        for wire in &http.parameters {
            match (wire.location, wire.body_kind) {
                (ParameterLocation::Body, _) if !convenience => {}
                (ParameterLocation::Body, BodyKind::Spread) => {
                    push(wire.type_id, UsageFlags::INPUT | UsageFlags::SPREAD, access)
                }
                (ParameterLocation::Body, _) => {
                    push(wire.type_id, UsageFlags::INPUT | UsageFlags::JSON, access)
                }
                _ => push(wire.type_id, UsageFlags::INPUT, access),
            }
        }
        let responses = http
            .responses
            .iter()
            .map(|r| (r, UsageFlags::OUTPUT | UsageFlags::JSON))
            .chain(http.exceptions.iter().map(|r| {
                (r, UsageFlags::OUTPUT | UsageFlags::JSON | UsageFlags::EXCEPTION)
            }));
        for (response, body_usage) in responses {
            if let Some(body) = response.type_id.filter(|_| convenience) {
                push(body, body_usage, access);
            }
            for header in &response.headers {
                push(ctx.graph.property(*header).type_id, UsageFlags::OUTPUT, access);
            }
        }
        if !convenience {
            continue;
        }
        if let Some(lro) = &method.lro {
            for type_id in [lro.final_result, lro.final_envelope, lro.polling_body]
                .into_iter()
                .flatten()
            {
                push(type_id, UsageFlags::OUTPUT | UsageFlags::JSON, access);
            }
        }
        if let Some(type_id) = method.response.type_id {
            push(type_id, UsageFlags::OUTPUT | UsageFlags::JSON, access);
        }
    }

    for parameter in &ctx.parameters {
        let Some(type_id) = parameter.type_id else {
            continue;
        };
        match parameter.kind {
            ParameterKind::Method | ParameterKind::Credential { .. } => {}
            ParameterKind::ApiVersion { .. } => {
                push(type_id, UsageFlags::INPUT, Access::Public);
                if matches!(ctx.graph.type_node(type_id).kind, TypeKind::Enum(_)) {
                    push(type_id, UsageFlags::API_VERSION_ENUM, Access::Public);
                }
            }
            _ => push(type_id, UsageFlags::INPUT, Access::Public),
        }
    }

    for client in &ctx.clients {
        if let Some(model) = ctx
            .graph
            .overrides
            .client_initialization(client.source, ctx.emitter())
        {
            push(model, UsageFlags::CLIENT_INITIALIZATION, Access::Public);
        }
    }
    roots
}

/// Usage handed from a type to the types it references
fn child_usage(usage: UsageFlags) -> UsageFlags {
    let mut child = UsageFlags::from_bits(usage.bits() & !ROOT_ONLY.bits());
    if usage.contains(UsageFlags::SPREAD) {
        child |= UsageFlags::JSON;
    }
    child
}

/// Types directly referenced by `id`; base models only when `follow_base`
fn referenced_types(graph: &DescriptionGraph, id: TypeId, follow_base: bool) -> Vec<TypeId> {
    match &graph.type_node(id).kind {
        TypeKind::Model(model) => {
            let mut refs: Vec<TypeId> = model
                .properties
                .iter()
                .map(|p| graph.property(*p).type_id)
                .collect();
            if follow_base {
                refs.extend(model.base);
            }
            refs.extend(model.subtypes.values().copied());
            refs.extend(model.additional_properties);
            refs
        }
        TypeKind::Array { element } | TypeKind::Dict { element } => vec![*element],
        TypeKind::Nullable { inner } => vec![*inner],
        TypeKind::Union(union) => union.variants.iter().map(|v| v.type_id).collect(),
        TypeKind::Enum(_) | TypeKind::Primitive { .. } | TypeKind::Constant { .. } => Vec::new(),
    }
}

/// OR `usage` into `root` and everything reachable from it
///
/// Only ever adds bits. Role flags such as spread stay on the root; the
/// referenced types of a spread model are serialized and gain `JSON`.
pub fn mark_usage(graph: &mut DescriptionGraph, root: TypeId, usage: UsageFlags) {
    if usage.is_empty() {
        return;
    }
    let mut visited: HashSet<(TypeId, u32)> = HashSet::new();
    let mut queue = VecDeque::from([(root, usage)]);
    while let Some((id, usage)) = queue.pop_front() {
        if !visited.insert((id, usage.bits())) {
            continue;
        }
        graph.type_node_mut(id).usage |= usage;
        let next = child_usage(usage);
        if next.is_empty() {
            continue;
        }
        for referenced in referenced_types(graph, id, true) {
            queue.push_back((referenced, next));
        }
    }
}

/// Every type reachable from `root`, `root` included
fn reachable(graph: &DescriptionGraph, root: TypeId, follow_base: bool) -> Vec<TypeId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id);
        queue.extend(referenced_types(graph, id, follow_base));
    }
    order
}

fn apply_usage_overrides(ctx: &mut CompileContext) {
    let type_ids: Vec<TypeId> = ctx.graph.type_ids().collect();
    for id in type_ids {
        let Some(usage) = ctx
            .graph
            .overrides
            .usage(OverrideTarget::Type(id), ctx.emitter())
        else {
            continue;
        };
        let allowed = UsageFlags::from_bits(usage.bits() & OVERRIDABLE.bits());
        if allowed != usage {
            let dropped = UsageFlags::from_bits(usage.bits() & !OVERRIDABLE.bits());
            let name = ctx.names.name_for(&ctx.graph, id);
            ctx.report(
                DiagnosticCode::ConflictUsageOverride,
                format!(
                    "Usage override on '{}' cannot add '{}'; only input, output and json may be set",
                    name, dropped
                ),
                Some(name),
            );
        }
        tracing::debug!(type_id = id.0, usage = %allowed, "applying usage override");
        mark_usage(&mut ctx.graph, id, allowed);
    }
}

/// Override declared on a type, or inherited from its namespace
fn declared_access(ctx: &CompileContext, id: TypeId) -> Option<Access> {
    ctx.graph
        .overrides
        .access(OverrideTarget::Type(id), ctx.emitter())
        .or_else(|| {
            ctx.graph
                .type_node(id)
                .namespace
                .and_then(|ns| ctx.namespace_access(ns))
        })
}

fn resolve_type_access(ctx: &mut CompileContext, roots: &[UsageRoot]) {
    let count = ctx.graph.type_count();
    let mut computed: Vec<Option<Access>> = vec![None; count];
    for root in roots {
        for id in reachable(&ctx.graph, root.type_id, true) {
            let slot = &mut computed[id.index()];
            *slot = Some(slot.map_or(root.access, |a| a.widest(root.access)));
        }
    }

    // Override values reaching each type: its own first, then those of
    // every type that references it. Overrides never flow to a base model.
    let mut from_overrides: Vec<Vec<Access>> = vec![Vec::new(); count];
    let type_ids: Vec<TypeId> = ctx.graph.type_ids().collect();
    for id in &type_ids {
        let Some(declared) = declared_access(ctx, *id) else {
            continue;
        };
        for reached in reachable(&ctx.graph, *id, false) {
            if ctx.graph.type_node(reached).is_declaration() {
                from_overrides[reached.index()].push(declared);
            }
        }
    }

    for id in type_ids {
        let overrides = &from_overrides[id.index()];
        let resolved = match overrides.iter().min() {
            None => computed[id.index()].unwrap_or(Access::Public),
            Some(narrowest) => {
                let widest = overrides
                    .iter()
                    .copied()
                    .chain(computed[id.index()])
                    .max()
                    .unwrap_or(*narrowest);
                if widest > *narrowest {
                    let name = ctx.names.name_for(&ctx.graph, id);
                    ctx.report(
                        DiagnosticCode::ConflictAccessOverride,
                        format!(
                            "Access of '{}' is overridden as {} but it is reachable as {}; using {}",
                            name, narrowest, widest, widest
                        ),
                        Some(name),
                    );
                }
                widest
            }
        };
        tracing::debug!(type_id = id.0, access = %resolved, "resolved access");
        ctx.graph.type_node_mut(id).access = Some(resolved);
    }
}

/// Subtypes are at least as visible as their base
fn propagate_to_subtypes(ctx: &mut CompileContext) {
    let type_ids: Vec<TypeId> = ctx.graph.type_ids().collect();
    let mut changed = true;
    while changed {
        changed = false;
        for id in &type_ids {
            let Some(model) = ctx.graph.type_node(*id).as_model() else {
                continue;
            };
            let Some(base_access) = ctx.graph.type_node(*id).access else {
                continue;
            };
            let subtypes: Vec<TypeId> = model.subtypes.values().copied().collect();
            for subtype in subtypes {
                let node = ctx.graph.type_node_mut(subtype);
                let widened = node.access.map_or(base_access, |a| a.widest(base_access));
                if node.access != Some(widened) {
                    node.access = Some(widened);
                    changed = true;
                }
            }
        }
    }
}

/// Properties follow their model unless overridden
fn resolve_property_access(ctx: &mut CompileContext) {
    let property_count = ctx.graph.property_count();
    for index in 0..property_count {
        let id = PropertyId(index as u32);
        let prop = ctx.graph.property(id);
        let owner_access = match prop.owner {
            PropertyOwner::Model { model } => {
                let node = ctx.graph.type_node(model);
                Some((node.access.unwrap_or(Access::Public), node.usage))
            }
            _ => None,
        };
        let optional = prop.optional;
        let name = prop.name.clone();
        let Some((model_access, model_usage)) = owner_access else {
            continue;
        };

        let declared = ctx
            .graph
            .overrides
            .access(OverrideTarget::Property(id), ctx.emitter());
        let resolved = match declared {
            Some(Access::Internal)
                if !optional
                    && model_access == Access::Public
                    && model_usage.contains(UsageFlags::INPUT) =>
            {
                ctx.report(
                    DiagnosticCode::ConflictAccessOverride,
                    format!(
                        "Required property '{}' of a public input model cannot be internal",
                        name
                    ),
                    Some(name.clone()),
                );
                Access::Public
            }
            Some(access) => access,
            None => model_access,
        };
        ctx.graph.property_mut(id).access = Some(resolved);
    }
}
