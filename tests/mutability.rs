//! Immutability analysis: per-parameter classification and its
//! consumption by the Rust converter

use crate::test_utils::assert_generates;
use mgen_frontend::{parse_and_validate, semantic_analysis};
use mgen_shared::CompilationContext;
use mgen_types::{Mutability, Target};
use rstest::rstest;

fn classify(source: &str, function: &str, param: &str) -> Mutability {
    let mut module = parse_and_validate(source).expect("validation succeeds");
    let mut context = CompilationContext::new();
    semantic_analysis::execute(&mut module, &mut context).expect("analysis succeeds");
    context.mutability(function, param)
}

#[test]
fn test_appended_list_parameter_is_mutable() {
    let source = r#"
def push(items: list[int], value: int) -> None:
    items.append(value)
"#;
    assert_eq!(classify(source, "push", "items"), Mutability::Mutable);
}

#[test]
fn test_read_only_list_parameter() {
    let source = r#"
def total(items: list[int]) -> int:
    acc: int = 0
    for x in items:
        acc = acc + x
    return acc
"#;
    assert_eq!(classify(source, "total", "items"), Mutability::ReadOnly);
}

#[test]
fn test_string_parameter_is_immutable_without_body_inspection() {
    let source = r#"
def shout(message: str) -> str:
    return message.upper()
"#;
    assert_eq!(classify(source, "shout", "message"), Mutability::Immutable);
}

#[test]
fn test_subscript_store_marks_parameter_mutable() {
    let source = r#"
def bump(freq: dict[str, int], key: str) -> None:
    freq[key] = freq[key] + 1
"#;
    assert_eq!(classify(source, "bump", "freq"), Mutability::Mutable);
    assert_eq!(classify(source, "bump", "key"), Mutability::Immutable);
}

/// Immutable implies read-only: an Immutable parameter is never also
/// classified as mutated
#[rstest]
#[case("def f(t: str) -> int:\n    return len(t)\n", "f", "t")]
#[case(
    "def g(pair: tuple[int, int]) -> int:\n    return pair[0]\n",
    "g",
    "pair"
)]
fn test_immutable_is_read_only(
    #[case] source: &str,
    #[case] function: &str,
    #[case] param: &str,
) {
    let class = classify(source, function, param);
    assert_eq!(class, Mutability::Immutable);
    assert!(class.is_read_only());
}

#[test]
fn test_rust_converter_picks_reference_kind_from_mutability() {
    let source = r#"
def push(items: list[int], value: int) -> None:
    items.append(value)

def total(items: list[int]) -> int:
    acc: int = 0
    for x in items:
        acc = acc + x
    return acc
"#;
    assert_generates(
        source,
        Target::Rust,
        &[
            "fn push(items: &mut Vec<i64>, value: i64)",
            "fn total(items: &Vec<i64>) -> i64",
        ],
    );
}

#[test]
fn test_method_self_mutability_reaches_cpp_constness() {
    let source = r#"
class Counter:
    def __init__(self, start: int):
        self.count = start

    def bump(self) -> None:
        self.count = self.count + 1

    def value(self) -> int:
        return self.count
"#;
    assert_generates(
        source,
        Target::Cpp,
        &[
            "void bump()",
            "int64_t value() const",
        ],
    );
}
