//! Runtime library assets
//!
//! The C container runtime is embedded in the translator binary and
//! copied verbatim next to generated C and LLVM IR sources. The
//! conversion strategies register the instantiations they use (as
//! requirement flags in the compilation context); the Build phase calls
//! [`runtime_files`] to materialize the side files.

use mgen_types::Target;

/// The runtime header source
pub const RUNTIME_HEADER: &str = include_str!("mgen_runtime.h");

/// The runtime implementation source
pub const RUNTIME_IMPL: &str = include_str!("mgen_runtime.c");

/// The side files a target needs next to its generated source
///
/// Empty for every target whose standard library covers the container
/// contract.
pub fn runtime_files(target: Target) -> Vec<(String, String)> {
    if !target.uses_runtime_library() {
        return Vec::new();
    }
    vec![
        ("mgen_runtime.h".to_string(), RUNTIME_HEADER.to_string()),
        ("mgen_runtime.c".to_string(), RUNTIME_IMPL.to_string()),
    ]
}
