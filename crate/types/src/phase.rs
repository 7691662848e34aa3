use mgen_derive::NamedEnum;

/// The seven phases of the translation pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, NamedEnum)]
pub enum Phase {
    /// Parse the source and reject constructs outside the subset
    Validation,
    /// Type inference, mutability analysis, constraint checking
    Analysis,
    /// Optional constant folding on the typed AST
    #[name = "source-optimization"]
    SourceOptimization,
    /// Resolve semantic types against the target's type mapping
    Mapping,
    /// Optional textual cleanup of the generated sources
    #[name = "target-optimization"]
    TargetOptimization,
    /// Emit target source text
    Generation,
    /// Emit the build descriptor and runtime side files
    Build,
}

/// All pipeline phases in the order they are reported
pub const ALL_PHASES: &[Phase] = &[
    Phase::Validation,
    Phase::Analysis,
    Phase::SourceOptimization,
    Phase::Mapping,
    Phase::TargetOptimization,
    Phase::Generation,
    Phase::Build,
];
