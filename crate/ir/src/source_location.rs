/// A position in the source text
///
/// Tracks both the absolute byte offset (for mapping back into the source)
/// and the human-facing line/column pair used in diagnostics. `length` is
/// the number of characters underlined by the caret in error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// Absolute byte offset in the source text
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub column: usize,
    /// Number of characters the location spans
    pub length: usize,
}

impl SourceLocation {
    /// Creates a new source location
    pub fn new(offset: usize, line: usize, column: usize, length: usize) -> Self {
        SourceLocation {
            offset,
            line,
            column,
            length,
        }
    }
}
