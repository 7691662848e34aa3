use mgen_derive::NamedEnum;

/// The container kinds recognized by the conversion strategy tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NamedEnum)]
pub enum ContainerKind {
    /// Ordered sequence (source `list`)
    Vec,
    /// Keyed associative container (source `dict`)
    Map,
    /// Unordered unique collection (source `set`)
    Set,
    /// String (source `str`)
    Str,
}

/// Methods the strategy tables recognize on vectors
pub const VEC_METHODS: &[&str] = &[
    "append", "pop", "at", "size", "clear", "extend", "insert", "remove",
];

/// Methods the strategy tables recognize on maps
pub const MAP_METHODS: &[&str] = &[
    "get", "contains", "erase", "size", "keys", "values", "items", "clear", "pop", "setdefault",
];

/// Methods the strategy tables recognize on sets
pub const SET_METHODS: &[&str] = &[
    "add", "contains", "remove", "discard", "clear", "size", "union", "intersection", "difference",
];

/// Methods the strategy tables recognize on strings
pub const STR_METHODS: &[&str] = &[
    "upper",
    "lower",
    "strip",
    "split",
    "join",
    "replace",
    "find",
    "startswith",
    "endswith",
];

impl ContainerKind {
    /// Check if the strategy tables recognize `method` for this kind
    pub fn recognizes(&self, method: &str) -> bool {
        self.method_table().contains(&method)
    }

    /// Check if calling `method` mutates the receiver
    ///
    /// String methods all return a new value; strings are value-immutable.
    pub fn is_mutating_method(&self, method: &str) -> bool {
        match self {
            ContainerKind::Vec => matches!(
                method,
                "append" | "pop" | "clear" | "extend" | "insert" | "remove"
            ),
            ContainerKind::Map => matches!(method, "erase" | "clear" | "pop" | "setdefault"),
            ContainerKind::Set => matches!(method, "add" | "remove" | "discard" | "clear"),
            ContainerKind::Str => false,
        }
    }

    fn method_table(&self) -> &'static [&'static str] {
        match self {
            ContainerKind::Vec => VEC_METHODS,
            ContainerKind::Map => MAP_METHODS,
            ContainerKind::Set => SET_METHODS,
            ContainerKind::Str => STR_METHODS,
        }
    }
}
