//! Converter dispatch
//!
//! One converter per target, all behind the same trait. Converters walk
//! the typed AST and emit target source text; they never mutate the AST
//! and only touch the context to register runtime requirement flags.

use crate::generated::GeneratedOutput;
use crate::targets;
use mgen_error::CompileResult;
use mgen_ir::ast::Module;
use mgen_shared::CompilationContext;
use mgen_types::Target;

/// A per-target converter
pub trait TargetConverter {
    /// The target this converter emits
    fn target(&self) -> Target;

    /// Converts the module to target source
    ///
    /// ### Arguments
    /// * `module` - The analyzed module
    /// * `context` - The compilation context; requirement flags are
    ///   registered here as strategies fire
    /// * `stem` - The output file name without extension
    ///
    /// ### Returns
    /// The generated source file, or every generation error found
    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput>;
}

/// The converter for the given target
pub fn converter_for(target: Target) -> Box<dyn TargetConverter> {
    match target {
        Target::C => Box::new(targets::c::CConverter),
        Target::Cpp => Box::new(targets::cpp::CppConverter),
        Target::Rust => Box::new(targets::rust::RustConverter),
        Target::Go => Box::new(targets::go::GoConverter),
        Target::Haskell => Box::new(targets::haskell::HaskellConverter),
        Target::OCaml => Box::new(targets::ocaml::OCamlConverter),
        Target::LlvmIr => Box::new(targets::llvm::LlvmConverter),
    }
}

/// Converts a module with the converter for `target`
pub fn generate(
    module: &Module,
    context: &mut CompilationContext,
    target: Target,
    stem: &str,
) -> CompileResult<GeneratedOutput> {
    converter_for(target).convert(module, context, stem)
}
