//! Example documents as read from disk
//!
//! Loading is done by the parser crate; binding an example to an operation
//! and walking its values against the type graph is done by the compiler.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleDocument {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub parameters: IndexMap<String, serde_json::Value>,
    /// Keyed by status code string
    #[serde(default)]
    pub responses: IndexMap<String, ExampleResponse>,
    /// Path relative to the examples directory
    #[serde(skip)]
    pub file_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleResponse {
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    #[serde(default)]
    pub headers: IndexMap<String, serde_json::Value>,
}

impl ExampleDocument {
    /// Title used to detect duplicates, falling back to the file name
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.file_path)
    }
}
