/// Per-parameter result of the immutability analysis
///
/// `Immutable` is strictly stronger than `ReadOnly`: an `Immutable`
/// parameter cannot be mutated through any alias, while a `ReadOnly`
/// parameter merely is not mutated by the function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mutability {
    /// The parameter type is value-immutable (string, tuple, scalar)
    Immutable,
    /// The body never mutates the parameter
    ReadOnly,
    /// The body mutates the parameter
    Mutable,
    /// The analyzer could not classify the parameter
    #[default]
    Unknown,
}

impl Mutability {
    /// Check if a converter may take the parameter by shared reference
    pub fn is_read_only(&self) -> bool {
        matches!(self, Mutability::Immutable | Mutability::ReadOnly)
    }
}
