//! Typed AST for the MGen translator
//!
//! The module tree produced by the validator and annotated by the analysis
//! phases. Every expression node carries a source location and, after
//! analysis, a semantic type.

pub mod ast;
#[cfg(feature = "print-ast")]
pub mod ast_printer;
pub mod source_location;
pub mod visitor;

pub use source_location::SourceLocation;
pub use visitor::Visitor;
