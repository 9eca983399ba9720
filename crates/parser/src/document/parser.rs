//! Graph document file parser

use super::types::GraphDocument;
use clientgraph_common::{DescriptionGraph, GraphError, Result};
use std::fs;
use std::path::Path;

/// Graph document parser
///
/// Reads a JSON graph document and converts it into a `DescriptionGraph`.
pub struct GraphParser {
    document: GraphDocument,
}

impl GraphParser {
    /// Load a graph document from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GraphError::Parse(format!(
                "Failed to read graph document {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a graph document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let document: GraphDocument = serde_json::from_str(json)
            .map_err(|e| GraphError::Parse(format!("Failed to parse graph JSON: {}", e)))?;

        Ok(Self { document })
    }

    /// Convert the document into a description graph
    pub fn parse(&self) -> Result<DescriptionGraph> {
        let graph = super::converter::convert_document(&self.document)?;
        tracing::debug!(
            types = graph.type_count(),
            properties = graph.property_count(),
            "converted graph document"
        );
        Ok(graph)
    }

    /// Get reference to the underlying document
    pub fn document(&self) -> &GraphDocument {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let json = r#"{ "services": [ { "name": "Widgets" } ] }"#;

        let parser = GraphParser::from_json(json).unwrap();
        let graph = parser.parse().unwrap();
        assert_eq!(graph.services().len(), 1);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = GraphParser::from_json("{ not json");
        assert!(matches!(result, Err(GraphError::Parse(_))));
    }
}
