//! Semantic analysis of a validated module
//!
//! Runs after validation and before any optimizer or converter: collects
//! function and class signatures, assigns a semantic type to every
//! expression and binding (flow-insensitive propagation followed by
//! flow-sensitive container refinement), and classifies every function
//! parameter's mutability.

pub mod builtins;
pub mod inference;
pub mod mutability;
pub mod operations;
pub mod signatures;

use mgen_error::TranslateError;
use mgen_ir::ast::{Declaration, Module};
use mgen_shared::CompilationContext;

/// Runs the complete analysis over a module
///
/// The module is mutated in place: every expression node receives its
/// semantic type. Analysis continues past errors so one run reports every
/// problem it can find.
///
/// ### Arguments
/// * `module` - The validated module to analyze
/// * `context` - The compilation context to fill with signatures,
///   mutability classes, and symbol information
///
/// ### Returns
/// * `Ok(())` when the module analyzed cleanly
/// * `Err` with every analysis error found
pub fn execute(
    module: &mut Module,
    context: &mut CompilationContext,
) -> Result<(), Vec<TranslateError>> {
    let mut errors = signatures::collect(module, context);

    for decl in &mut module.declarations {
        match decl {
            Declaration::Function(func) => {
                errors.extend(inference::analyze_function(func, context, None));
            }
            Declaration::Class(class) => {
                let class_name = class.name.clone();
                for method in &mut class.methods {
                    errors.extend(inference::analyze_function(
                        method,
                        context,
                        Some(&class_name),
                    ));
                }
            }
            Declaration::GlobalVar(var) => {
                errors.extend(inference::analyze_global(var, context));
            }
            Declaration::Import(_) => {}
        }
    }

    mutability::analyze(module, context);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
