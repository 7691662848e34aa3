/// Error codes for every diagnostic the translator can emit.
///
/// Codes come in four families, mirrored by the prefix of the rendered
/// code string:
/// - `V....`: validation diagnostics (subset violations, malformed source)
/// - `A....`: analysis diagnostics (type inference, symbol resolution)
/// - `G..../B....`: generation and build diagnostics
/// - `TS/SA/CC/MS...`: constraint and memory-safety checker rules, which
///   keep their published rule identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation diagnostics (V1000-V1999)

    /// Source construct outside the supported subset
    UnsupportedFeature,
    /// Syntax not recognizable as any statement or expression
    InvalidSyntax,
    /// Token not valid at this position
    UnexpectedToken,
    /// String literal without a closing quote
    UnterminatedString,
    /// Dedent to an indentation level that was never opened
    InconsistentIndentation,
    /// Expected an identifier
    ExpectedIdentifier,
    /// Expected a colon
    ExpectedColon,
    /// Expected an expression
    ExpectedExpression,
    /// Expected an indented block
    ExpectedIndentedBlock,
    /// Malformed numeric literal
    InvalidNumberLiteral,
    /// Parameter or return annotation missing where the subset requires one
    MissingAnnotation,

    // Analysis diagnostics (A2000-A2999)

    /// A type needed for generation could not be determined
    TypeInferenceFailure,
    /// Declared and inferred types conflict
    TypeInconsistency,
    /// Name used before being bound
    UndefinedVariable,
    /// Call to a function the module does not define
    UndefinedFunction,
    /// Call with the wrong number of arguments
    ArgumentCountMismatch,
    /// Call argument type conflicts with the parameter annotation
    ArgumentTypeMismatch,
    /// Returned value conflicts with the declared return type
    ReturnTypeMismatch,
    /// Attribute access on a type without that attribute
    UnknownAttribute,
    /// Two module-level definitions share a name
    DuplicateDefinition,

    // Constraint checker rules (published identifiers)

    /// TS001: type consistency in binary operations
    BinaryTypeConsistency,
    /// TS002: lossy implicit conversion
    LossyConversion,
    /// TS003: division by a provably-zero value
    DivisionByZero,
    /// TS004: integer literal outside the 32-bit range
    IntegerRange,
    /// SA001: unreachable code after a return
    UnreachableCode,
    /// SA002: bound but never used local
    UnusedLocal,
    /// SA005: parameter never mutated despite a mutable annotation
    ReadOnlyParameter,
    /// CC004: cyclomatic complexity above the threshold
    ExcessiveComplexity,
    /// MS001: variable index without a bounds guard
    UnguardedIndex,
    /// MS002: dereference of a possibly-absent lookup result
    NullableDereference,
    /// MS003: allocation without a matching lifecycle call
    MissingRelease,
    /// MS004: returning a local container by reference
    LocalReferenceReturn,

    // Generation diagnostics (G3000-G3999)

    /// Container method not implemented for the chosen target
    UnsupportedMethod,
    /// Internal converter invariant violated
    GenerationFailure,

    // Build diagnostics (B4000-B4999)

    /// External compiler invocation failed
    BuildFailure,
}

impl ErrorCode {
    /// Get the rendered code string for this error
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedFeature => "V1001",
            ErrorCode::InvalidSyntax => "V1002",
            ErrorCode::UnexpectedToken => "V1003",
            ErrorCode::UnterminatedString => "V1004",
            ErrorCode::InconsistentIndentation => "V1005",
            ErrorCode::ExpectedIdentifier => "V1006",
            ErrorCode::ExpectedColon => "V1007",
            ErrorCode::ExpectedExpression => "V1008",
            ErrorCode::ExpectedIndentedBlock => "V1009",
            ErrorCode::InvalidNumberLiteral => "V1010",
            ErrorCode::MissingAnnotation => "V1011",

            ErrorCode::TypeInferenceFailure => "A2001",
            ErrorCode::TypeInconsistency => "A2002",
            ErrorCode::UndefinedVariable => "A2003",
            ErrorCode::UndefinedFunction => "A2004",
            ErrorCode::ArgumentCountMismatch => "A2005",
            ErrorCode::ArgumentTypeMismatch => "A2006",
            ErrorCode::ReturnTypeMismatch => "A2007",
            ErrorCode::UnknownAttribute => "A2008",
            ErrorCode::DuplicateDefinition => "A2009",

            ErrorCode::BinaryTypeConsistency => "TS001",
            ErrorCode::LossyConversion => "TS002",
            ErrorCode::DivisionByZero => "TS003",
            ErrorCode::IntegerRange => "TS004",
            ErrorCode::UnreachableCode => "SA001",
            ErrorCode::UnusedLocal => "SA002",
            ErrorCode::ReadOnlyParameter => "SA005",
            ErrorCode::ExcessiveComplexity => "CC004",
            ErrorCode::UnguardedIndex => "MS001",
            ErrorCode::NullableDereference => "MS002",
            ErrorCode::MissingRelease => "MS003",
            ErrorCode::LocalReferenceReturn => "MS004",

            ErrorCode::UnsupportedMethod => "G3001",
            ErrorCode::GenerationFailure => "G3002",

            ErrorCode::BuildFailure => "B4001",
        }
    }

    /// Get a short description of the error
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedFeature => "Source construct outside the supported subset",
            ErrorCode::InvalidSyntax => "Invalid syntax",
            ErrorCode::UnexpectedToken => "Unexpected token",
            ErrorCode::UnterminatedString => "Unterminated string literal",
            ErrorCode::InconsistentIndentation => "Inconsistent indentation",
            ErrorCode::ExpectedIdentifier => "Expected identifier",
            ErrorCode::ExpectedColon => "Expected colon ':'",
            ErrorCode::ExpectedExpression => "Expected expression",
            ErrorCode::ExpectedIndentedBlock => "Expected an indented block",
            ErrorCode::InvalidNumberLiteral => "Invalid number literal format",
            ErrorCode::MissingAnnotation => "Missing type annotation",

            ErrorCode::TypeInferenceFailure => "Cannot determine a type needed for generation",
            ErrorCode::TypeInconsistency => "Declared and inferred types conflict",
            ErrorCode::UndefinedVariable => "Undefined variable",
            ErrorCode::UndefinedFunction => "Undefined function",
            ErrorCode::ArgumentCountMismatch => "Wrong number of call arguments",
            ErrorCode::ArgumentTypeMismatch => "Call argument type mismatch",
            ErrorCode::ReturnTypeMismatch => "Return type mismatch",
            ErrorCode::UnknownAttribute => "Unknown attribute",
            ErrorCode::DuplicateDefinition => "Duplicate definition",

            ErrorCode::BinaryTypeConsistency => "Incompatible operand types",
            ErrorCode::LossyConversion => "Lossy implicit conversion",
            ErrorCode::DivisionByZero => "Division by zero",
            ErrorCode::IntegerRange => "Integer literal outside the 32-bit range",
            ErrorCode::UnreachableCode => "Unreachable code",
            ErrorCode::UnusedLocal => "Bound but never used",
            ErrorCode::ReadOnlyParameter => "Parameter is never mutated",
            ErrorCode::ExcessiveComplexity => "Cyclomatic complexity above threshold",
            ErrorCode::UnguardedIndex => "Index without a bounds guard",
            ErrorCode::NullableDereference => "Dereference of a possibly-absent value",
            ErrorCode::MissingRelease => "Allocation without a matching release",
            ErrorCode::LocalReferenceReturn => "Returning a local container by reference",

            ErrorCode::UnsupportedMethod => "Container method not implemented for this target",
            ErrorCode::GenerationFailure => "Internal code generation failure",

            ErrorCode::BuildFailure => "External compiler invocation failed",
        }
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        self.code().starts_with('V')
    }

    /// Check if this is an analysis error
    pub fn is_analysis_error(&self) -> bool {
        self.code().starts_with('A')
    }

    /// Check if this is a checker rule
    pub fn is_checker_rule(&self) -> bool {
        let code = self.code();
        code.starts_with("TS")
            || code.starts_with("SA")
            || code.starts_with("CC")
            || code.starts_with("MS")
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())
    }
}
