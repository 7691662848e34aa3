use mgen_error::{ErrorCode, TranslateError};
use mgen_ir::SourceLocation;

/// How serious a diagnostic is
///
/// Only `Error` affects the success of a pipeline run; warnings and info
/// diagnostics never halt anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stylistic or informational finding
    Info,
    /// Probable problem that does not block translation
    Warning,
    /// Problem that fails the translation
    Error,
}

impl Severity {
    /// The lowercase label used when rendering
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A structured message collected during translation
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// How serious the finding is
    pub severity: Severity,
    /// The structured error code
    pub error_code: ErrorCode,
    /// Message describing the finding
    pub message: String,
    /// Where in the source the finding applies
    pub location: SourceLocation,
    /// Optional one-line remediation hint
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Creates an error-severity diagnostic
    pub fn error(error_code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic {
            severity: Severity::Error,
            error_code,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    /// Creates a warning-severity diagnostic
    pub fn warning(
        error_code: ErrorCode,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            error_code,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    /// Creates an info-severity diagnostic
    pub fn info(error_code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic {
            severity: Severity::Info,
            error_code,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    /// Attaches a remediation hint
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl From<TranslateError> for Diagnostic {
    fn from(error: TranslateError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            error_code: error.error_code,
            message: error.message,
            location: error.location,
            suggestion: error.suggestion,
        }
    }
}

impl From<Diagnostic> for TranslateError {
    fn from(diagnostic: Diagnostic) -> Self {
        TranslateError {
            error_code: diagnostic.error_code,
            message: diagnostic.message,
            location: diagnostic.location,
            suggestion: diagnostic.suggestion,
        }
    }
}
