//! Build phase: runtime side files and build descriptors
//!
//! The external compiler is never invoked here; the builder only lays
//! out everything a compiler invocation would need next to the generated
//! source.

use crate::runtime;
use mgen_types::Target;

/// The side files for one generated source: runtime files first, then an
/// optional build descriptor
pub fn side_files(target: Target, stem: &str) -> Vec<(String, String)> {
    let mut files = runtime::runtime_files(target);
    if let Some(descriptor) = build_descriptor(target, stem) {
        files.push(descriptor);
    }
    files
}

/// The build descriptor for the target, when one is conventional
pub fn build_descriptor(target: Target, stem: &str) -> Option<(String, String)> {
    match target {
        Target::C => Some((
            "Makefile".to_string(),
            format!(
                "CC ?= cc\nCFLAGS ?= -O2 -std=c11 -Wall\n\n{stem}: {stem}.c mgen_runtime.c mgen_runtime.h\n\t$(CC) $(CFLAGS) -o {stem} {stem}.c mgen_runtime.c -lm\n\nclean:\n\trm -f {stem}\n\n.PHONY: clean\n"
            ),
        )),
        Target::Cpp => Some((
            "Makefile".to_string(),
            format!(
                "CXX ?= c++\nCXXFLAGS ?= -O2 -std=c++17 -Wall\n\n{stem}: {stem}.cpp\n\t$(CXX) $(CXXFLAGS) -o {stem} {stem}.cpp\n\nclean:\n\trm -f {stem}\n\n.PHONY: clean\n"
            ),
        )),
        Target::LlvmIr => Some((
            "Makefile".to_string(),
            format!(
                "CLANG ?= clang\nCFLAGS ?= -O2\n\n{stem}: {stem}.ll mgen_runtime.c mgen_runtime.h\n\t$(CLANG) $(CFLAGS) -o {stem} {stem}.ll mgen_runtime.c -lm\n\nclean:\n\trm -f {stem}\n\n.PHONY: clean\n"
            ),
        )),
        Target::Go => Some((
            "go.mod".to_string(),
            format!("module {}\n\ngo 1.22\n", stem),
        )),
        Target::Rust | Target::Haskell | Target::OCaml => None,
    }
}
