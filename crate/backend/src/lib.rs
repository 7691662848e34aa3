//! Backend of the MGen translator
//!
//! Covers the Mapping, Generation, and Build pipeline phases: one
//! converter per target walks the typed AST and emits target source text,
//! consulting the shared container-operation and loop-conversion
//! strategies, and the builder assembles the runtime side files and build
//! descriptor.

pub mod builder;
pub mod converter;
pub mod generated;
pub mod loops;
pub mod mapping;
pub mod naming;
pub mod postprocess;
pub mod runtime;
pub mod targets;
pub mod writer;

pub use converter::{converter_for, generate, TargetConverter};
pub use generated::GeneratedOutput;
