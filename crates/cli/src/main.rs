//! clientgraph CLI
//!
//! Command-line interface for compiling service description graphs into
//! normalized SDK package graphs.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clientgraph_common::{CompilerOptions, DescriptionGraph, Diagnostic, Severity};
use clientgraph_compiler::{ClientId, PackageCompiler, SdkPackage};
use clientgraph_parser::{load_examples, parse_graph_file};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clientgraph")]
#[command(version, about = "Compile service description graphs into SDK package graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a graph document and display what it declares
    #[command(after_help = "EXAMPLES:\n  \
        clientgraph inspect --graph demos/widgets.graph.json")]
    Inspect {
        /// Path to the graph document
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Compile a graph document into an SDK package
    #[command(after_help = "EXAMPLES:\n  \
        # Compile for the python emitter and bind examples\n  \
        clientgraph compile \\\n    \
        --graph demos/widgets.graph.json \\\n    \
        --emitter python \\\n    \
        --examples-dir demos/examples \\\n    \
        --output widgets.package.json\n\n  \
        # Read options from a YAML file\n  \
        clientgraph compile --graph service.json --options clientgraph.yaml")]
    Compile {
        /// Path to the graph document
        #[arg(short, long)]
        graph: PathBuf,

        /// YAML options file
        #[arg(long)]
        options: Option<PathBuf>,

        /// Target emitter used to resolve scoped overrides
        #[arg(short, long)]
        emitter: Option<String>,

        /// Directory holding example documents
        #[arg(long)]
        examples_dir: Option<PathBuf>,

        /// Write the package as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail when any warning is reported
        #[arg(long)]
        deny_warnings: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { graph } => inspect_command(&graph, cli.verbose),
        Commands::Compile {
            graph,
            options,
            emitter,
            examples_dir,
            output,
            deny_warnings,
        } => {
            let options = resolve_options(options.as_deref(), emitter, examples_dir)?;
            debug!(?options, "resolved compiler options");
            compile_command(CompileConfig {
                graph: &graph,
                options: &options,
                output: output.as_deref(),
                deny_warnings,
                verbose: cli.verbose,
            })
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Options file first, then command-line flags on top
fn resolve_options(
    path: Option<&Path>,
    emitter: Option<String>,
    examples_dir: Option<PathBuf>,
) -> Result<CompilerOptions> {
    let mut options = match path {
        Some(path) => CompilerOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => CompilerOptions::default(),
    };
    if emitter.is_some() {
        options.emitter_name = emitter;
    }
    if examples_dir.is_some() {
        options.examples_dir = examples_dir;
    }
    Ok(options)
}

fn load_graph(path: &Path) -> Result<DescriptionGraph> {
    parse_graph_file(path).with_context(|| format!("Failed to parse graph {}", path.display()))
}

fn inspect_command(path: &Path, verbose: bool) -> Result<()> {
    println!("{} Parsing graph: {}", "→".cyan(), path.display());
    let graph = load_graph(path)?;

    println!("\n{}", "✓ Parse successful!".green().bold());
    println!("  Services: {}", graph.services().len());
    println!("  Namespaces: {}", graph.namespace_ids().count());
    println!("  Operations: {}", graph.operation_ids().count());
    println!("  Types: {}", graph.type_count());
    println!("  Overrides: {}", graph.overrides.entries().len());

    if verbose {
        println!("\n{}", "Operations:".bold());
        for id in graph.operation_ids() {
            let op = graph.operation(id);
            let mut traits = Vec::new();
            if op.pageable.is_some() {
                traits.push("paging");
            }
            if op.long_running.is_some() {
                traits.push("lro");
            }
            println!(
                "  • {} {:?} {} {}",
                graph.namespace_path(op.namespace).join(".").cyan(),
                op.verb,
                op.route,
                traits.join(",").yellow()
            );
        }
    }
    Ok(())
}

struct CompileConfig<'a> {
    graph: &'a Path,
    options: &'a CompilerOptions,
    output: Option<&'a Path>,
    deny_warnings: bool,
    verbose: bool,
}

fn compile_command(config: CompileConfig) -> Result<()> {
    println!("{} Compiling graph: {}", "→".cyan(), config.graph.display());
    let graph = load_graph(config.graph)?;

    let mut compiler = PackageCompiler::new(graph, config.options);
    if let Some(dir) = &config.options.examples_dir {
        let loaded = load_examples(dir)
            .with_context(|| format!("Failed to load examples from {}", dir.display()))?;
        println!(
            "{} Loaded {} example documents",
            "→".cyan(),
            loaded.documents.len()
        );
        let failures = loaded
            .failures
            .into_iter()
            .map(|f| (f.file_path, f.message));
        compiler = compiler
            .with_examples(&loaded.documents)
            .with_example_failures(failures);
    }
    let package = compiler.compile();

    print_summary(&package, config.verbose);
    print_diagnostics(&package.diagnostics);

    if let Some(output) = config.output {
        write_package(&package, output)?;
        println!("{} Wrote {}", "✓".green(), output.display());
    }

    let errors = count_severity(&package.diagnostics, Severity::Error);
    let warnings = count_severity(&package.diagnostics, Severity::Warning);
    if errors > 0 {
        bail!("compilation reported {} error(s)", errors);
    }
    if config.deny_warnings && warnings > 0 {
        bail!("compilation reported {} warning(s)", warnings);
    }
    println!("\n{}", "✓ Compilation complete!".green().bold());
    Ok(())
}

fn print_summary(package: &SdkPackage, verbose: bool) {
    println!("\n{}", "Package:".bold());
    println!("  Name: {}", package.name.yellow());
    println!("  Clients: {}", package.all_clients.len());
    println!("  Methods: {}", package.methods.len());
    println!(
        "  Types: {} models, {} enums, {} unions",
        package.models.len(),
        package.enums.len(),
        package.unions.len()
    );

    if !verbose {
        return;
    }
    println!("\n{}", "Clients:".bold());
    for id in &package.clients {
        print_client(package, *id, 1);
    }
}

fn print_client(package: &SdkPackage, id: ClientId, depth: usize) {
    let client = package.client(id);
    let indent = "  ".repeat(depth);
    println!(
        "{}• {} ({} init parameters)",
        indent,
        client.name.cyan(),
        client.initialization.parameters.len()
    );
    for method in client.methods.iter().map(|m| package.method(*m)) {
        println!(
            "{}  {} {:?} {}",
            indent,
            method.name,
            method.kind,
            format!("{}", method.access).dimmed()
        );
    }
    for child in &client.children {
        print_client(package, *child, depth + 1);
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("\n{}", "Diagnostics:".bold());
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        print!("  {} [{}] {}", label, diagnostic.code, diagnostic.message);
        match &diagnostic.target {
            Some(target) => println!(" {}", format!("({})", target).dimmed()),
            None => println!(),
        }
    }
}

fn count_severity(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

fn write_package(package: &SdkPackage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(package).context("Failed to serialize package")?;
    fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_options_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "emitter-name: java\napi-version: \"2024-01-01\"").unwrap();

        let options = resolve_options(Some(file.path()), Some("python".to_string()), None).unwrap();
        assert_eq!(options.emitter(), Some("python"));
        assert_eq!(options.api_version.as_deref(), Some("2024-01-01"));
        assert!(options.examples_dir.is_none());
    }

    #[test]
    fn test_defaults_without_options_file() {
        let options = resolve_options(None, None, Some(PathBuf::from("examples"))).unwrap();
        assert_eq!(options.emitter(), None);
        assert!(options.generate_convenience_methods);
        assert_eq!(options.examples_dir, Some(PathBuf::from("examples")));
    }

    #[test]
    fn test_missing_options_file() {
        let err = resolve_options(Some(Path::new("/nonexistent/options.yaml")), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load options"));
    }

    #[test]
    fn test_write_package_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let graph = clientgraph_common::GraphBuilder::new().build();
        let package = clientgraph_compiler::compile(graph, &CompilerOptions::default());
        let output = dir.path().join("out").join("package.json");

        write_package(&package, &output).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["clients"], serde_json::json!([]));
    }
}
