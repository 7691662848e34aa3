use crate::exit;

/// Errors surfaced by the command-line driver
#[derive(Debug)]
pub enum CliError {
    /// An input or output file could not be accessed
    Io {
        source: std::io::Error,
        path: String,
        exit_code: exit::Code,
    },
    /// Any other driver-level failure
    Generic {
        message: String,
        exit_code: exit::Code,
    },
}

impl CliError {
    /// Creates an IO error with an exit code matching the failure kind
    pub fn from_io_error(source: std::io::Error, path: &str) -> Self {
        let exit_code = match source.kind() {
            std::io::ErrorKind::NotFound => exit::Code::NoInput,
            std::io::ErrorKind::PermissionDenied => exit::Code::NoPerm,
            _ => exit::Code::IoErr,
        };
        CliError::Io {
            source,
            path: path.to_string(),
            exit_code,
        }
    }

    /// The exit code this error maps to
    pub fn exit_code(&self) -> exit::Code {
        match self {
            CliError::Io { exit_code, .. } => *exit_code,
            CliError::Generic { exit_code, .. } => *exit_code,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io { source, path, .. } => write!(f, "{}: {}", path, source),
            CliError::Generic { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;
