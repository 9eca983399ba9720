//! Compilation of description graphs into SDK packages
//!
//! This crate turns a description graph into a normalized package of
//! clients, methods and types:
//! - client hierarchy with merged initialization parameters
//! - methods classified as basic, paging, long-running or both
//! - method/wire parameter correspondence
//! - resolved access and usage for every reachable type
//! - examples bound to the methods they document

mod clients;
mod context;
mod examples;
mod methods;
pub mod naming;
pub mod package;
mod parameters;
mod paths;
pub mod propagation;

pub use examples::example_operation_id;
pub use naming::{operation_cross_id, singularize, NameResolver};
pub use package::*;
pub use parameters::is_api_version;
pub use paths::resolve_segments;

use clientgraph_common::{
    Access, CompilerOptions, DescriptionGraph, DiagnosticCode, ExampleDocument,
};
use context::CompileContext;

/// Package compiler
///
/// Runs the passes in order: client building (which classifies every
/// operation), access and usage propagation, then example binding.
pub struct PackageCompiler<'o> {
    graph: DescriptionGraph,
    options: &'o CompilerOptions,
    examples: Vec<ExampleDocument>,
    /// Example files that could not be read, as (file, reason)
    example_failures: Vec<(String, String)>,
}

impl<'o> PackageCompiler<'o> {
    pub fn new(graph: DescriptionGraph, options: &'o CompilerOptions) -> Self {
        Self {
            graph,
            options,
            examples: Vec::new(),
            example_failures: Vec::new(),
        }
    }

    /// Bind these example documents after propagation
    pub fn with_examples(mut self, examples: &[ExampleDocument]) -> Self {
        self.examples.extend_from_slice(examples);
        self
    }

    /// Report example files the front-end failed to load
    pub fn with_example_failures(
        mut self,
        failures: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.example_failures.extend(failures);
        self
    }

    /// Compile the graph; anomalies end up in the package diagnostics
    pub fn compile(self) -> SdkPackage {
        let span = tracing::info_span!("compile", emitter = ?self.options.emitter());
        let _enter = span.enter();

        let mut ctx = CompileContext::new(self.graph, self.options);
        ctx.names.clear();

        {
            let _classify = tracing::info_span!("classify").entered();
            clients::build_clients(&mut ctx);
        }
        {
            let _propagate = tracing::info_span!("propagate").entered();
            propagation::propagate(&mut ctx);
        }
        {
            let _bind = tracing::info_span!("bind-examples", examples = self.examples.len()).entered();
            for (file, reason) in self.example_failures {
                ctx.report(DiagnosticCode::ExampleLoading, reason, Some(file));
            }
            examples::bind_examples(&mut ctx, &self.examples);
        }

        let package = assemble(ctx);
        tracing::info!(
            clients = package.all_clients.len(),
            methods = package.methods.len(),
            models = package.models.len(),
            diagnostics = package.diagnostics.len(),
            "compiled package {}",
            package.name
        );
        package
    }
}

/// Compile a graph without examples (convenience function)
pub fn compile(graph: DescriptionGraph, options: &CompilerOptions) -> SdkPackage {
    PackageCompiler::new(graph, options).compile()
}

/// Collect the used declarations and hand the arenas over to the package
fn assemble(mut ctx: CompileContext) -> SdkPackage {
    let root = ctx.roots.first().map(|id| ctx.client(*id).source);
    let root_namespace = root.map(|ns| ctx.namespace_string(ns)).unwrap_or_default();
    let name = match (&ctx.options.namespace, root) {
        (Some(namespace), _) => namespace.clone(),
        (None, Some(ns)) => ctx.graph.namespace(ns).name.clone(),
        (None, None) => String::new(),
    };

    let mut models = Vec::new();
    let mut enums = Vec::new();
    let mut unions = Vec::new();
    let type_ids: Vec<_> = ctx.graph.type_ids().collect();
    for id in type_ids {
        let node = ctx.graph.type_node(id);
        if !node.is_declaration() || node.usage.is_empty() {
            continue;
        }
        let generated_name = node.name.is_none();
        let usage = node.usage;
        let access = node.access.unwrap_or(Access::Public);
        let namespace = node
            .namespace
            .map(|ns| ctx.namespace_string(ns))
            .unwrap_or_else(|| root_namespace.clone());
        let kind = node.kind_name();
        let entry = SdkTypeEntry {
            id,
            name: ctx.names.name_for(&ctx.graph, id),
            cross_component_id: ctx.names.cross_component_id(&ctx.graph, id),
            namespace,
            access,
            usage,
            generated_name,
        };
        match kind {
            "model" => models.push(entry),
            "enum" => enums.push(entry),
            _ => unions.push(entry),
        }
    }

    SdkPackage {
        name,
        root_namespace,
        clients: ctx.roots,
        all_clients: ctx.clients,
        methods: ctx.methods,
        parameters: ctx.parameters,
        models,
        enums,
        unions,
        diagnostics: ctx.diagnostics.into_vec(),
        graph: ctx.graph,
    }
}
