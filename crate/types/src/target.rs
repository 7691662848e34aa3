use mgen_derive::NamedEnum;

/// The output languages supported by the converter framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NamedEnum)]
pub enum Target {
    C,
    Cpp,
    Rust,
    Go,
    Haskell,
    #[name = "ocaml"]
    OCaml,
    #[name = "llvm"]
    LlvmIr,
}

/// All supported targets, in the order they are listed to the user
pub const ALL_TARGETS: &[Target] = &[
    Target::C,
    Target::Cpp,
    Target::Rust,
    Target::Go,
    Target::Haskell,
    Target::OCaml,
    Target::LlvmIr,
];

impl Target {
    /// The file extension of generated sources for this target
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Target::C => "c",
            Target::Cpp => "cpp",
            Target::Rust => "rs",
            Target::Go => "go",
            Target::Haskell => "hs",
            Target::OCaml => "ml",
            Target::LlvmIr => "ll",
        }
    }

    /// Check if generated code links against the MGen container runtime
    pub const fn uses_runtime_library(&self) -> bool {
        matches!(self, Target::C | Target::LlvmIr)
    }

    /// Check if the target reclaims memory automatically
    pub const fn is_garbage_collected(&self) -> bool {
        matches!(self, Target::Go | Target::Haskell | Target::OCaml)
    }

    /// Check if the target is expression-oriented and loops become folds
    pub const fn is_functional(&self) -> bool {
        matches!(self, Target::Haskell | Target::OCaml)
    }

    /// Check if the target distinguishes shared from exclusive references
    pub const fn distinguishes_mutability(&self) -> bool {
        matches!(self, Target::Rust)
    }

    /// Check if converters must emit explicit container lifecycle calls
    pub const fn emits_lifecycle_calls(&self) -> bool {
        self.uses_runtime_library()
    }

    /// The bit width of the target's native integer type
    ///
    /// OCaml native ints carry a tag bit; everything else maps source
    /// integers to a 64-bit type.
    pub const fn int_bit_width(&self) -> u8 {
        match self {
            Target::OCaml => 63,
            _ => 64,
        }
    }

    /// Check if the target can represent containers nested inside
    /// container values (e.g. `dict[str, list[int]]`)
    ///
    /// The monomorphized C runtime has no boxed element representation, so
    /// C and LLVM IR reject such shapes during the Mapping phase.
    pub const fn supports_nested_containers(&self) -> bool {
        !matches!(self, Target::C | Target::LlvmIr)
    }
}
