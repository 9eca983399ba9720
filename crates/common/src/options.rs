//! Compiler options loaded from YAML files
//!
//! The options select the target emitter used to resolve scoped overrides
//! and carry the few switches that change how the package is assembled.

use crate::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompilerOptions {
    /// Target emitter identifier (e.g., "python", "csharp")
    #[serde(default)]
    pub emitter_name: Option<String>,
    /// Replacement for the service namespace prefix
    #[serde(default)]
    pub namespace: Option<String>,
    /// Pinned default for the api-version client parameter
    #[serde(default)]
    pub api_version: Option<String>,
    /// When false, operation bodies do not propagate usage
    #[serde(default = "default_true")]
    pub generate_convenience_methods: bool,
    /// Directory holding example documents
    #[serde(default)]
    pub examples_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            emitter_name: None,
            namespace: None,
            api_version: None,
            generate_convenience_methods: true,
            examples_dir: None,
        }
    }
}

impl CompilerOptions {
    pub fn for_emitter(name: impl Into<String>) -> Self {
        Self {
            emitter_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Load options from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GraphError::Parse(format!("Failed to read options file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            GraphError::Parse(format!("Failed to parse options YAML from {:?}: {}", path, e))
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn emitter(&self) -> Option<&str> {
        self.emitter_name.as_deref()
    }
}
