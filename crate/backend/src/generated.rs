/// The files produced by one conversion
///
/// The primary source file comes first; runtime side files and build
/// descriptors follow in the order the builder adds them. Paths are
/// relative to the output directory.
#[derive(Debug, Default)]
pub struct GeneratedOutput {
    /// (relative path, contents) pairs in emission order
    pub files: Vec<(String, String)>,
}

impl GeneratedOutput {
    /// Creates an output holding a single primary source file
    pub fn single(path: impl Into<String>, contents: impl Into<String>) -> Self {
        GeneratedOutput {
            files: vec![(path.into(), contents.into())],
        }
    }

    /// Appends a side file
    pub fn push(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.push((path.into(), contents.into()));
    }

    /// The contents of the primary source file
    pub fn primary(&self) -> Option<&str> {
        self.files.first().map(|(_, contents)| contents.as_str())
    }
}
