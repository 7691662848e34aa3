use mgen_frontend::lexer::tokenize;
use mgen_frontend::token::TokenKind;
use rstest::rstest;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("lexing succeeds")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_indentation_produces_layout_tokens() {
    let source = "def f(n: int) -> int:\n    return n\n";
    let kinds = kinds(source);
    assert!(kinds.contains(&TokenKind::Indent));
    assert!(kinds.contains(&TokenKind::Dedent));
    assert_eq!(kinds.last(), Some(&TokenKind::Eof));
}

#[test]
fn test_blank_and_comment_lines_do_not_affect_indentation() {
    let source = "def f() -> int:\n\n    # a comment\n    return 1\n";
    let kinds = kinds(source);
    let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = kinds.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, 1);
    assert_eq!(dedents, 1);
}

#[test]
fn test_newlines_inside_brackets_are_joined() {
    let source = "xs: list[int] = [1,\n    2,\n    3]\n";
    let kinds = kinds(source);
    assert!(!kinds.contains(&TokenKind::Indent));
    let newlines = kinds.iter().filter(|k| **k == TokenKind::Newline).count();
    assert_eq!(newlines, 1);
}

#[rstest]
#[case("//", TokenKind::DoubleSlash)]
#[case("**", TokenKind::DoubleStar)]
#[case("->", TokenKind::Arrow)]
#[case("//=", TokenKind::DoubleSlashEqual)]
#[case("<=", TokenKind::LessEqual)]
#[case("<<", TokenKind::ShiftLeft)]
fn test_multi_character_operators(#[case] text: &str, #[case] expected: TokenKind) {
    let source = format!("a {} b\n", text);
    assert!(kinds(&source).contains(&expected));
}

#[rstest]
#[case("async", TokenKind::Async)]
#[case("lambda", TokenKind::Lambda)]
#[case("yield", TokenKind::Yield)]
#[case("try", TokenKind::Try)]
#[case("while", TokenKind::While)]
#[case("True", TokenKind::True)]
fn test_keywords(#[case] word: &str, #[case] expected: TokenKind) {
    assert_eq!(kinds(word)[0], expected);
}

#[test]
fn test_string_escapes() {
    let tokens = tokenize("s = \"a\\tb\\n\"\n").expect("lexing succeeds");
    let literal = tokens
        .iter()
        .find(|t| t.kind == TokenKind::StringLiteral)
        .expect("string token");
    assert_eq!(literal.lexeme, "a\tb\n");
}

#[test]
fn test_unterminated_string_is_an_error() {
    assert!(tokenize("s = \"oops\n").is_err());
}

#[test]
fn test_locations_are_one_based() {
    let tokens = tokenize("x = 1\n").expect("lexing succeeds");
    assert_eq!(tokens[0].location.line, 1);
    assert_eq!(tokens[0].location.column, 1);
    assert_eq!(tokens[2].location.column, 5);
}
