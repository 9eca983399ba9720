//! Example document loading
//!
//! Example documents are JSON files anywhere below an examples directory.
//! Files that fail to parse are returned as load failures rather than
//! aborting the scan, so the compiler can report them individually.

use clientgraph_common::{ExampleDocument, GraphError, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// A file that could not be read as an example document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleLoadFailure {
    pub file_path: String,
    pub message: String,
}

/// Result of scanning an examples directory
#[derive(Debug, Clone, Default)]
pub struct LoadedExamples {
    pub documents: Vec<ExampleDocument>,
    pub failures: Vec<ExampleLoadFailure>,
}

/// Parse one example document
pub fn parse_example(json: &str, file_path: &str) -> Result<ExampleDocument> {
    let mut document: ExampleDocument = serde_json::from_str(json).map_err(|e| {
        GraphError::Parse(format!("Failed to parse example {}: {}", file_path, e))
    })?;
    document.file_path = file_path.to_string();
    Ok(document)
}

/// Load every `*.json` file below `dir`, sorted by relative path
pub fn load_examples(dir: &Path) -> Result<LoadedExamples> {
    if !dir.is_dir() {
        return Err(GraphError::Parse(format!(
            "Examples directory {} does not exist",
            dir.display()
        )));
    }

    let mut entries: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let mut loaded = LoadedExamples::default();
    for entry in entries {
        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let parsed = fs::read_to_string(entry.path())
            .map_err(GraphError::from)
            .and_then(|content| parse_example(&content, &relative));
        match parsed {
            Ok(document) => loaded.documents.push(document),
            Err(e) => {
                tracing::warn!(file = %relative, "skipping example: {}", e);
                loaded.failures.push(ExampleLoadFailure {
                    file_path: relative,
                    message: e.to_string(),
                });
            }
        }
    }
    tracing::debug!(count = loaded.documents.len(), "loaded example documents");
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example_sets_path() {
        let doc = parse_example(r#"{"operationId": "Get", "title": "t"}"#, "get.json").unwrap();
        assert_eq!(doc.file_path, "get.json");
        assert_eq!(doc.operation_id.as_deref(), Some("Get"));
    }

    #[test]
    fn test_load_examples_missing_dir() {
        assert!(load_examples(Path::new("/nonexistent/examples")).is_err());
    }
}
