//! Frontend of the MGen translator
//!
//! Covers the first two pipeline phases: Validation (lexing, parsing, and
//! subset rejection) and Analysis (type inference, mutability
//! classification, constraint and memory-safety checking).

pub mod checkers;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod semantic_analysis;
pub mod token;
#[cfg(feature = "print-tokens")]
pub mod token_printer;

pub use token::{Token, TokenKind};

use mgen_error::CompileResult;
use mgen_ir::ast::Module;

/// Parses source text into a validated module
///
/// This is the Validation phase entry point: it tokenizes the source,
/// parses it, and rejects every construct outside the supported subset,
/// reporting all violations in one pass.
///
/// ### Arguments
/// * `source` - The source text to parse
///
/// ### Returns
/// The validated module, or every lexical and validation error found
pub fn parse_and_validate(source: &str) -> CompileResult<Module> {
    let tokens = lexer::tokenize(source)?;
    #[cfg(feature = "print-tokens")]
    token_printer::print_tokens(&tokens);
    parser::parse(&tokens)
}
