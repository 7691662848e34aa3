use crate::error_codes::ErrorCode;
use mgen_ir::SourceLocation;

/// A single structured error produced by a pipeline phase
///
/// Phases accumulate these rather than failing fast so a single run
/// surfaces every problem it can find. The optional suggestion becomes the
/// `help:` line of the rendered diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateError {
    /// The structured error code
    pub error_code: ErrorCode,
    /// Message describing the problem
    pub message: String,
    /// Where in the source the problem was found
    pub location: SourceLocation,
    /// Optional one-line remediation hint
    pub suggestion: Option<String>,
}

impl TranslateError {
    /// Creates a new translation error
    pub fn new(error_code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        TranslateError {
            error_code,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    /// Creates a new translation error carrying a remediation hint
    pub fn with_suggestion(
        error_code: ErrorCode,
        message: impl Into<String>,
        location: SourceLocation,
        suggestion: impl Into<String>,
    ) -> Self {
        TranslateError {
            error_code,
            message: message.into(),
            location,
            suggestion: Some(suggestion.into()),
        }
    }
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} at {}:{}",
            self.error_code, self.message, self.location.line, self.location.column
        )
    }
}

impl std::error::Error for TranslateError {}

/// The result type used between pipeline phases: success, or every error
/// the phase found
pub type CompileResult<T> = Result<T, Vec<TranslateError>>;
