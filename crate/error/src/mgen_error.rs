use crate::translate_error::TranslateError;

/// Top-level error taxonomy surfaced to callers of the translator
#[derive(Debug, thiserror::Error)]
pub enum MgenError {
    #[error("Unsupported source feature: {0}")]
    UnsupportedFeature(String),

    #[error("Type inference failure: {0}")]
    TypeInferenceFailure(String),

    #[error("Type inconsistency: {0}")]
    TypeInconsistency(String),

    #[error("Unsupported container method: {0}")]
    UnsupportedMethod(String),

    #[error("Code generation failure: {0}")]
    GenerationFailure(String),

    #[error("Build failure: {0}")]
    BuildFailure(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Translation produced {} error(s)", .errors.len())]
    Multiple { errors: Vec<TranslateError> },
}

pub type MgenResult<T> = Result<T, MgenError>;

impl From<std::io::Error> for MgenError {
    fn from(error: std::io::Error) -> Self {
        MgenError::Io(error.to_string())
    }
}

impl From<Vec<TranslateError>> for MgenError {
    fn from(errors: Vec<TranslateError>) -> Self {
        MgenError::Multiple { errors }
    }
}
