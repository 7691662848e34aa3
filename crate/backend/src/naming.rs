//! Per-target naming policy
//!
//! Escapes identifiers that collide with the target's reserved words and
//! normalizes names the target cannot accept. Mangling is deterministic:
//! a colliding name gets a single trailing underscore.

use mgen_types::Target;

const C_RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while",
];

const CPP_RESERVED: &[&str] = &[
    "auto", "bool", "break", "case", "catch", "char", "class", "const", "continue", "default",
    "delete", "do", "double", "else", "enum", "explicit", "export", "extern", "false", "float",
    "for", "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new",
    "operator", "private", "protected", "public", "register", "return", "short", "signed",
    "sizeof", "static", "struct", "switch", "template", "this", "throw", "true", "try",
    "typedef", "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "while",
];

const RUST_RESERVED: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

const GO_RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

const HASKELL_RESERVED: &[&str] = &[
    "case", "class", "data", "default", "deriving", "do", "else", "foreign", "if", "import",
    "in", "infix", "infixl", "infixr", "instance", "let", "module", "newtype", "of", "then",
    "type", "where",
];

const OCAML_RESERVED: &[&str] = &[
    "and", "as", "assert", "begin", "class", "constraint", "do", "done", "downto", "else",
    "end", "exception", "external", "false", "for", "fun", "function", "functor", "if", "in",
    "include", "inherit", "lazy", "let", "match", "method", "module", "mutable", "new",
    "object", "of", "open", "or", "rec", "sig", "struct", "then", "to", "true", "try", "type",
    "val", "virtual", "when", "while", "with",
];

/// The naming policy of one target
pub struct NamingPolicy {
    reserved: &'static [&'static str],
}

impl NamingPolicy {
    /// The policy for the given target
    ///
    /// LLVM IR identifiers are sigil-prefixed, so nothing collides and
    /// the reserved list is empty.
    pub fn for_target(target: Target) -> Self {
        let reserved = match target {
            Target::C => C_RESERVED,
            Target::Cpp => CPP_RESERVED,
            Target::Rust => RUST_RESERVED,
            Target::Go => GO_RESERVED,
            Target::Haskell => HASKELL_RESERVED,
            Target::OCaml => OCAML_RESERVED,
            Target::LlvmIr => &[],
        };
        NamingPolicy { reserved }
    }

    /// Escapes a source identifier for the target
    pub fn escape(&self, name: &str) -> String {
        if self.reserved.contains(&name) {
            format!("{}_", name)
        } else {
            name.to_string()
        }
    }
}
