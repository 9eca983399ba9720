//! Diagnostics reported by the compiler
//!
//! The compiler never aborts on a malformed graph. Every anomaly is recorded
//! here with a stable code and the run continues.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    ConflictAccessOverride,
    ConflictUsageOverride,
    UnexpectedPageableOperationReturnType,
    InvalidLroMetadata,
    LroFinalResultPathNotFound,
    MultipleResponseTypes,
    UnsupportedProtocol,
    NoCorrespondingMethodParam,
    DuplicateClientName,
    ServerParamNotPath,
    ExampleLoading,
    DuplicateExampleFile,
    ExampleValueNoMapping,
    InvalidScope,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::ConflictAccessOverride => "conflict-access-override",
            DiagnosticCode::ConflictUsageOverride => "conflict-usage-override",
            DiagnosticCode::UnexpectedPageableOperationReturnType => {
                "unexpected-pageable-operation-return-type"
            }
            DiagnosticCode::InvalidLroMetadata => "invalid-lro-metadata",
            DiagnosticCode::LroFinalResultPathNotFound => "lro-final-result-path-not-found",
            DiagnosticCode::MultipleResponseTypes => "multiple-response-types",
            DiagnosticCode::UnsupportedProtocol => "unsupported-protocol",
            DiagnosticCode::NoCorrespondingMethodParam => "no-corresponding-method-param",
            DiagnosticCode::DuplicateClientName => "duplicate-client-name",
            DiagnosticCode::ServerParamNotPath => "server-param-not-path",
            DiagnosticCode::ExampleLoading => "example-loading",
            DiagnosticCode::DuplicateExampleFile => "duplicate-example-file",
            DiagnosticCode::ExampleValueNoMapping => "example-value-no-mapping",
            DiagnosticCode::InvalidScope => "invalid-scope",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::UnsupportedProtocol
            | DiagnosticCode::NoCorrespondingMethodParam
            | DiagnosticCode::DuplicateClientName
            | DiagnosticCode::ServerParamNotPath
            | DiagnosticCode::DuplicateExampleFile => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub severity: Severity,
    /// Display path of the node the diagnostic is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;
        if let Some(target) = &self.target {
            write!(f, " ({})", target)?;
        }
        Ok(())
    }
}

/// Ordered collector; each report is mirrored to `tracing`
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        target: Option<String>,
    ) {
        let diagnostic = Diagnostic {
            code,
            message: message.into(),
            severity: code.default_severity(),
            target,
        };
        match diagnostic.severity {
            Severity::Error => tracing::error!(code = %code, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(code = %code, "{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.items.iter().filter(|d| d.code == code).count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
