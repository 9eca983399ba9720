//! Common types for clientgraph
//!
//! This crate holds the service description graph handed over by a
//! front-end, the override table attached to it, and the diagnostic,
//! option and error types shared by the parser, compiler, and CLI.

pub mod builder;
pub mod diagnostics;
pub mod examples;
pub mod flags;
pub mod graph;
pub mod options;
pub mod overrides;

pub use builder::GraphBuilder;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use examples::{ExampleDocument, ExampleResponse};
pub use flags::{Access, UsageFlags};
pub use graph::*;
pub use options::CompilerOptions;
pub use overrides::{
    Directive, DirectiveKind, InvalidScope, OverrideEntry, OverrideTable, OverrideTarget, Scope,
};

use thiserror::Error;

/// Errors raised at the boundary, while reading graphs, examples or options
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for graph loading operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// PascalCase a name segment, keeping interior capitals
pub fn pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if c == '_' || c == '-' || c == ' ' || c == '.' || c == '$' {
            upper_next = true;
            continue;
        }
        if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("blobName"), "BlobName");
        assert_eq!(pascal_case("next_link"), "NextLink");
        assert_eq!(pascal_case("api-version"), "ApiVersion");
        assert_eq!(pascal_case(""), "");
    }

    #[test]
    fn test_error_display() {
        let err = GraphError::InvalidReference("type 'Missing'".to_string());
        assert_eq!(err.to_string(), "Invalid reference: type 'Missing'");
    }
}
