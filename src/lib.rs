//! MGen: a source-to-source translator
//!
//! Translates a statically-typed source subset into idiomatic C, C++,
//! Rust, Go, Haskell, OCaml, or textual LLVM IR through a seven-phase
//! pipeline: Validation, Analysis, Source-level Optimization, Mapping,
//! Target-level Optimization, Generation, and Build.

pub mod translation_pipeline;

pub use translation_pipeline::{
    check, translate, translate_with_cancel, CancelToken, PhaseOutcome, PipelineResult,
};
