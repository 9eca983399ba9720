//! Front-end interface for clientgraph
//!
//! This crate reads the JSON form of a service description graph into the
//! arena used by the compiler, and loads example documents from disk.
//!
//! ## Document layout
//!
//! - `services`: namespaces with operations, nested `interfaces` and `namespaces`
//! - `types`: named models, enums, unions keyed by name
//! - `overrides`: directives such as `{"target": "type:Widget", "access": "internal", "scope": "csharp"}`
//!
//! Type references are either a key or an inline anonymous declaration.

pub mod document;
pub mod examples;

pub use document::{GraphDocument, GraphParser};
pub use examples::{load_examples, parse_example, ExampleLoadFailure, LoadedExamples};

use clientgraph_common::{DescriptionGraph, Result};
use std::path::Path;

/// Load and convert a graph document file
pub fn parse_graph_file(path: &Path) -> Result<DescriptionGraph> {
    GraphParser::from_file(path)?.parse()
}
