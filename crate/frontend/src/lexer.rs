use crate::token::{keyword_kind, Token, TokenKind};
use mgen_error::{CompileResult, ErrorCode, TranslateError};
use mgen_ir::SourceLocation;

/// Number of columns a tab advances the indentation measure
const TAB_WIDTH: usize = 4;

/// Lexer state for tracking position during tokenization
struct LexerState<'a> {
    /// Source text being tokenized
    input: &'a str,
    /// Source characters with their byte offsets
    chars: Vec<(usize, char)>,
    /// Index of the next unread character
    pos: usize,
    /// Current 1-based line number
    current_line: usize,
    /// Byte offset of the first character of the current line
    line_start: usize,
    /// Open indentation widths, outermost first
    indent_stack: Vec<usize>,
    /// Nesting depth of parentheses, brackets, and braces
    bracket_depth: usize,
    /// Tokens generated so far
    tokens: Vec<Token>,
    /// Errors collected so far
    errors: Vec<TranslateError>,
}

impl<'a> LexerState<'a> {
    fn new(input: &'a str) -> Self {
        LexerState {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
            current_line: 1,
            line_start: 0,
            indent_stack: vec![0],
            bracket_depth: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Peeks at the next character without consuming it
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    /// Peeks one character past the next one
    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos + 1).map(|(_, c)| *c)
    }

    /// The byte offset of the next unread character
    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }

    /// Advances to the next character in the input
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).map(|(_, c)| *c);
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// The location of a token starting at `start_offset` and spanning
    /// `length` characters
    fn location(&self, start_offset: usize, length: usize) -> SourceLocation {
        SourceLocation::new(
            start_offset,
            self.current_line,
            start_offset - self.line_start + 1,
            length.max(1),
        )
    }

    /// Adds a token to the token list
    fn add_token(&mut self, kind: TokenKind, lexeme: String, start_offset: usize) {
        let length = lexeme.chars().count();
        let location = self.location(start_offset, length);
        self.tokens.push(Token::new(kind, lexeme, location));
    }

    /// Records an error at the given offset
    fn add_error(&mut self, code: ErrorCode, message: String, start_offset: usize) {
        let location = self.location(start_offset, 1);
        self.errors.push(TranslateError::new(code, message, location));
    }

    /// Records the start of a new physical line
    fn record_line_start(&mut self) {
        self.current_line += 1;
        self.line_start = self.offset();
    }

    /// Check if the last emitted token ends a logical line
    fn line_has_tokens(&self) -> bool {
        !matches!(
            self.tokens.last().map(|t| t.kind),
            None | Some(TokenKind::Newline) | Some(TokenKind::Indent) | Some(TokenKind::Dedent)
        )
    }

    /// Finishes tokenization: closes the final line and any open indents
    fn finish(mut self) -> CompileResult<Vec<Token>> {
        let offset = self.input.len();
        if self.line_has_tokens() {
            self.add_token(TokenKind::Newline, String::new(), offset);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.add_token(TokenKind::Dedent, String::new(), offset);
        }
        self.add_token(TokenKind::Eof, String::new(), offset);

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }
}

/// Converts source code text into a sequence of tokens
///
/// Indentation is significant outside brackets: the lexer emits `Indent`
/// and `Dedent` tokens around nested blocks and a `Newline` token at the
/// end of every logical line. Blank and comment-only lines never affect
/// indentation.
///
/// ### Arguments
/// * `input` - The source code to tokenize
///
/// ### Returns
/// The token list, or every lexical error found in one pass
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
    let mut state = LexerState::new(input);

    handle_indentation(&mut state);
    while let Some(c) = state.peek() {
        let token_start = state.offset();

        match c {
            '\n' => handle_newline(&mut state),
            '\r' => {
                state.advance();
            }
            ' ' | '\t' => {
                state.advance();
            }
            '#' => handle_comment(&mut state),
            c if c.is_alphabetic() || c == '_' => handle_identifier(&mut state, token_start),
            c if c.is_ascii_digit() => handle_number(&mut state, token_start),
            '"' | '\'' => handle_string(&mut state, token_start),
            '(' | '[' | '{' => handle_open_bracket(&mut state, token_start),
            ')' | ']' | '}' => handle_close_bracket(&mut state, token_start),
            '+' => handle_with_equal(&mut state, TokenKind::Plus, TokenKind::PlusEqual, token_start),
            '-' => handle_dash(&mut state, token_start),
            '*' => handle_star(&mut state, token_start),
            '/' => handle_slash(&mut state, token_start),
            '%' => handle_with_equal(
                &mut state,
                TokenKind::Percent,
                TokenKind::PercentEqual,
                token_start,
            ),
            '=' => handle_with_equal(&mut state, TokenKind::Equal, TokenKind::EqualEqual, token_start),
            '<' => handle_less_than(&mut state, token_start),
            '>' => handle_greater_than(&mut state, token_start),
            '!' => handle_exclamation(&mut state, token_start),
            '&' => handle_simple_token(&mut state, TokenKind::Ampersand, "&", token_start),
            '|' => handle_simple_token(&mut state, TokenKind::Pipe, "|", token_start),
            '^' => handle_simple_token(&mut state, TokenKind::Caret, "^", token_start),
            '~' => handle_simple_token(&mut state, TokenKind::Tilde, "~", token_start),
            ',' => handle_simple_token(&mut state, TokenKind::Comma, ",", token_start),
            ':' => handle_simple_token(&mut state, TokenKind::Colon, ":", token_start),
            '.' => handle_simple_token(&mut state, TokenKind::Dot, ".", token_start),
            '@' => handle_simple_token(&mut state, TokenKind::At, "@", token_start),
            _ => handle_invalid_char(&mut state, token_start),
        }
    }

    state.finish()
}

/// Handles the end of a physical line
///
/// Inside brackets the newline is insignificant (implicit line joining);
/// outside, a `Newline` token is emitted when the line produced any tokens
/// and the next line's indentation is measured.
fn handle_newline(state: &mut LexerState) {
    state.advance();
    if state.bracket_depth == 0 && state.line_has_tokens() {
        let offset = state.offset().saturating_sub(1);
        state.add_token(TokenKind::Newline, String::new(), offset);
    }
    state.record_line_start();
    if state.bracket_depth == 0 {
        handle_indentation(state);
    }
}

/// Measures the indentation of the upcoming line and emits Indent/Dedent
/// tokens against the indent stack
///
/// Blank and comment-only lines are consumed without affecting the stack.
fn handle_indentation(state: &mut LexerState) {
    loop {
        let mut width = 0;
        while let Some(c) = state.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                _ => break,
            }
            state.advance();
        }

        match state.peek() {
            // Blank line: consume and measure the next one
            Some('\n') => {
                state.advance();
                state.record_line_start();
                continue;
            }
            Some('\r') => {
                state.advance();
                continue;
            }
            // Comment-only line: consume to end of line
            Some('#') => {
                while let Some(c) = state.peek() {
                    if c == '\n' {
                        break;
                    }
                    state.advance();
                }
                continue;
            }
            None => return,
            _ => {}
        }

        let offset = state.offset();
        let current = *state.indent_stack.last().expect("indent stack is never empty");
        if width > current {
            state.indent_stack.push(width);
            state.add_token(TokenKind::Indent, String::new(), offset);
        } else if width < current {
            while *state.indent_stack.last().expect("indent stack is never empty") > width {
                state.indent_stack.pop();
                state.add_token(TokenKind::Dedent, String::new(), offset);
            }
            if *state.indent_stack.last().expect("indent stack is never empty") != width {
                state.add_error(
                    ErrorCode::InconsistentIndentation,
                    "dedent does not match any outer indentation level".to_string(),
                    offset,
                );
                state.indent_stack.push(width);
            }
        }
        return;
    }
}

/// Handles comments (skips to end of line)
fn handle_comment(state: &mut LexerState) {
    while let Some(c) = state.peek() {
        if c == '\n' {
            break;
        }
        state.advance();
    }
}

/// Handles alphabetic identifiers and keywords
fn handle_identifier(state: &mut LexerState, start_offset: usize) {
    let mut identifier = String::new();

    while let Some(c) = state.peek() {
        if c.is_alphanumeric() || c == '_' {
            identifier.push(c);
            state.advance();
        } else {
            break;
        }
    }

    let kind = keyword_kind(&identifier).unwrap_or(TokenKind::Identifier);
    state.add_token(kind, identifier, start_offset);
}

/// Handles numeric literals (integers and floating point)
fn handle_number(state: &mut LexerState, start_offset: usize) {
    let mut number = String::new();
    let mut is_float = false;

    while let Some(c) = state.peek() {
        if c.is_ascii_digit() || c == '_' {
            if c != '_' {
                number.push(c);
            }
            state.advance();
        } else if c == '.' && state.peek_second().is_some_and(|n| n.is_ascii_digit()) {
            if is_float {
                break;
            }
            is_float = true;
            number.push(c);
            state.advance();
        } else if c == 'e' || c == 'E' {
            is_float = true;
            number.push(c);
            state.advance();
            if let Some(next_c) = state.peek() {
                if next_c == '+' || next_c == '-' {
                    number.push(next_c);
                    state.advance();
                }
            }
        } else {
            break;
        }
    }

    let kind = if is_float {
        TokenKind::FloatLiteral
    } else {
        TokenKind::IntLiteral
    };
    state.add_token(kind, number, start_offset);
}

/// Handles string literals with either quote character
fn handle_string(state: &mut LexerState, start_offset: usize) {
    let quote = state.advance().expect("caller peeked a quote");
    let mut string = String::new();
    let mut terminated = false;

    while let Some(c) = state.peek() {
        if c == quote {
            state.advance();
            terminated = true;
            break;
        } else if c == '\n' {
            break;
        } else if c == '\\' {
            state.advance();
            match state.advance() {
                Some('n') => string.push('\n'),
                Some('t') => string.push('\t'),
                Some('\\') => string.push('\\'),
                Some('\'') => string.push('\''),
                Some('"') => string.push('"'),
                Some('0') => string.push('\0'),
                Some(other) => {
                    string.push('\\');
                    string.push(other);
                }
                None => break,
            }
        } else {
            string.push(c);
            state.advance();
        }
    }

    if !terminated {
        state.add_error(
            ErrorCode::UnterminatedString,
            "string literal is missing its closing quote".to_string(),
            start_offset,
        );
    }
    state.add_token(TokenKind::StringLiteral, string, start_offset);
}

/// Handles opening brackets, tracking depth for implicit line joining
fn handle_open_bracket(state: &mut LexerState, start_offset: usize) {
    let c = state.advance().expect("caller peeked a bracket");
    state.bracket_depth += 1;
    let kind = match c {
        '(' => TokenKind::LeftParen,
        '[' => TokenKind::LeftBracket,
        _ => TokenKind::LeftBrace,
    };
    state.add_token(kind, c.to_string(), start_offset);
}

/// Handles closing brackets
fn handle_close_bracket(state: &mut LexerState, start_offset: usize) {
    let c = state.advance().expect("caller peeked a bracket");
    state.bracket_depth = state.bracket_depth.saturating_sub(1);
    let kind = match c {
        ')' => TokenKind::RightParen,
        ']' => TokenKind::RightBracket,
        _ => TokenKind::RightBrace,
    };
    state.add_token(kind, c.to_string(), start_offset);
}

/// Handles a single-character token
fn handle_simple_token(state: &mut LexerState, kind: TokenKind, lexeme: &str, start_offset: usize) {
    state.advance();
    state.add_token(kind, lexeme.to_string(), start_offset);
}

/// Handles an operator that may be followed by `=`
fn handle_with_equal(
    state: &mut LexerState,
    bare: TokenKind,
    with_equal: TokenKind,
    start_offset: usize,
) {
    let c = state.advance().expect("caller peeked the operator");
    if state.peek() == Some('=') {
        state.advance();
        state.add_token(with_equal, format!("{}=", c), start_offset);
    } else {
        state.add_token(bare, c.to_string(), start_offset);
    }
}

/// Handles dash (minus, `-=`, or arrow)
fn handle_dash(state: &mut LexerState, start_offset: usize) {
    state.advance();
    match state.peek() {
        Some('>') => {
            state.advance();
            state.add_token(TokenKind::Arrow, "->".to_string(), start_offset);
        }
        Some('=') => {
            state.advance();
            state.add_token(TokenKind::MinusEqual, "-=".to_string(), start_offset);
        }
        _ => state.add_token(TokenKind::Minus, "-".to_string(), start_offset),
    }
}

/// Handles star (multiply, power, or `*=`)
fn handle_star(state: &mut LexerState, start_offset: usize) {
    state.advance();
    match state.peek() {
        Some('*') => {
            state.advance();
            state.add_token(TokenKind::DoubleStar, "**".to_string(), start_offset);
        }
        Some('=') => {
            state.advance();
            state.add_token(TokenKind::StarEqual, "*=".to_string(), start_offset);
        }
        _ => state.add_token(TokenKind::Star, "*".to_string(), start_offset),
    }
}

/// Handles slash (divide, floor divide, or their augmented forms)
fn handle_slash(state: &mut LexerState, start_offset: usize) {
    state.advance();
    match state.peek() {
        Some('/') => {
            state.advance();
            if state.peek() == Some('=') {
                state.advance();
                state.add_token(TokenKind::DoubleSlashEqual, "//=".to_string(), start_offset);
            } else {
                state.add_token(TokenKind::DoubleSlash, "//".to_string(), start_offset);
            }
        }
        Some('=') => {
            state.advance();
            state.add_token(TokenKind::SlashEqual, "/=".to_string(), start_offset);
        }
        _ => state.add_token(TokenKind::Slash, "/".to_string(), start_offset),
    }
}

/// Handles less than (comparison or left shift)
fn handle_less_than(state: &mut LexerState, start_offset: usize) {
    state.advance();
    match state.peek() {
        Some('=') => {
            state.advance();
            state.add_token(TokenKind::LessEqual, "<=".to_string(), start_offset);
        }
        Some('<') => {
            state.advance();
            state.add_token(TokenKind::ShiftLeft, "<<".to_string(), start_offset);
        }
        _ => state.add_token(TokenKind::Less, "<".to_string(), start_offset),
    }
}

/// Handles greater than (comparison or right shift)
fn handle_greater_than(state: &mut LexerState, start_offset: usize) {
    state.advance();
    match state.peek() {
        Some('=') => {
            state.advance();
            state.add_token(TokenKind::GreaterEqual, ">=".to_string(), start_offset);
        }
        Some('>') => {
            state.advance();
            state.add_token(TokenKind::ShiftRight, ">>".to_string(), start_offset);
        }
        _ => state.add_token(TokenKind::Greater, ">".to_string(), start_offset),
    }
}

/// Handles exclamation mark (only valid as `!=`)
fn handle_exclamation(state: &mut LexerState, start_offset: usize) {
    state.advance();
    if state.peek() == Some('=') {
        state.advance();
        state.add_token(TokenKind::NotEqual, "!=".to_string(), start_offset);
    } else {
        state.add_error(
            ErrorCode::UnexpectedToken,
            "'!' is only valid as part of '!='".to_string(),
            start_offset,
        );
        state.add_token(TokenKind::Invalid, "!".to_string(), start_offset);
    }
}

/// Handles invalid characters
fn handle_invalid_char(state: &mut LexerState, start_offset: usize) {
    let invalid_char = state.advance().expect("caller peeked a character");
    state.add_error(
        ErrorCode::UnexpectedToken,
        format!("unrecognized character '{}'", invalid_char),
        start_offset,
    );
    state.add_token(TokenKind::Invalid, invalid_char.to_string(), start_offset);
}
