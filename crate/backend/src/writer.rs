/// Indentation-aware text builder used by every converter
///
/// Keeps converters free of manual whitespace bookkeeping: `line` writes
/// a full line at the current indentation, `indent`/`dedent` move the
/// level, and `finish` returns the accumulated text.
pub struct FormatWriter {
    buffer: String,
    level: usize,
    unit: &'static str,
}

impl FormatWriter {
    /// Creates a writer indenting with four spaces
    pub fn new() -> Self {
        FormatWriter::with_unit("    ")
    }

    /// Creates a writer with a custom indentation unit
    pub fn with_unit(unit: &'static str) -> Self {
        FormatWriter {
            buffer: String::new(),
            level: 0,
            unit,
        }
    }

    /// Writes one line at the current indentation level
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.buffer.push('\n');
            return;
        }
        for _ in 0..self.level {
            self.buffer.push_str(self.unit);
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    /// Writes an empty line
    pub fn blank(&mut self) {
        self.buffer.push('\n');
    }

    /// Appends text verbatim, without indentation or newline
    pub fn raw(&mut self, text: impl AsRef<str>) {
        self.buffer.push_str(text.as_ref());
    }

    /// Increases the indentation level
    pub fn indent(&mut self) {
        self.level += 1;
    }

    /// Decreases the indentation level
    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// The current indentation level
    pub fn level(&self) -> usize {
        self.level
    }

    /// Consumes the writer and returns the accumulated text
    pub fn finish(mut self) -> String {
        if !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.buffer
    }
}

impl Default for FormatWriter {
    fn default() -> Self {
        FormatWriter::new()
    }
}
