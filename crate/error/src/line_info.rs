/// Maps byte offsets in the source text to line/column pairs and line text
///
/// Built once per source file and shared by everything that renders
/// diagnostics with a source snippet.
#[derive(Debug)]
pub struct LineInfo<'a> {
    /// The source text the offsets refer to
    source: &'a str,
    /// Byte offset of the first character of every line
    line_starts: Vec<usize>,
}

impl<'a> LineInfo<'a> {
    /// Creates line information for the given source text
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        LineInfo {
            source,
            line_starts,
        }
    }

    /// Converts a byte offset into a 1-based (line, column) pair
    ///
    /// Offsets past the end of the source map to the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let col = offset - self.line_starts[line_idx] + 1;
        (line_idx + 1, col)
    }

    /// The text of the given 1-based line, without its newline
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        if line == 0 || line > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        self.source.get(start..end).map(|text| text.trim_end_matches('\r'))
    }

    /// The number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
