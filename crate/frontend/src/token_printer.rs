//! Debugging dump of the token stream
//!
//! Only compiled with the `print-tokens` feature.

use crate::token::{Token, TokenKind};
use colored::Colorize;

/// Prints every token with its location to standard output
pub fn print_tokens(tokens: &[Token]) {
    for token in tokens {
        let kind = format!("{:?}", token.kind);
        let rendered = match token.kind {
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof => {
                kind.cyan()
            }
            TokenKind::Identifier => kind.green(),
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral => {
                kind.yellow()
            }
            _ => kind.normal(),
        };
        println!(
            "{:4}:{:<3} {} {:?}",
            token.location.line, token.location.column, rendered, token.lexeme
        );
    }
}
