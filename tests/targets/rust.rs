//! Rust converter: ownership-aware parameters and ordered collections

use crate::test_utils::{assert_generates, primary_output, translate_for};
use mgen_types::Target;

#[test]
fn test_string_parameters_arrive_as_slices() {
    let source = r#"
def greet(name: str) -> str:
    return "hello " + name
"#;
    assert_generates(
        source,
        Target::Rust,
        &["fn greet(name: &str) -> String", "format!(\"{}{}\""],
    );
}

#[test]
fn test_ordered_collections_keep_output_deterministic() {
    let source = r#"
def tally(words: list[str]) -> dict[str, int]:
    freq: dict[str, int] = {}
    for w in words:
        if w in freq:
            freq[w] = freq[w] + 1
        else:
            freq[w] = 1
    return freq
"#;
    assert_generates(
        source,
        Target::Rust,
        &[
            "use std::collections::{BTreeMap, BTreeSet};",
            "BTreeMap<String, i64>",
            "freq.insert(w.clone(), ",
        ],
    );
}

#[test]
fn test_mut_is_only_emitted_where_needed() {
    let source = r#"
def f(n: int) -> int:
    fixed: int = 5
    total: int = 0
    for i in range(n):
        total = total + i
    return total + fixed
"#;
    let result = translate_for(source, Target::Rust);
    assert!(result.success);
    let output = primary_output(&result, Target::Rust);
    assert!(output.contains("let fixed: i64 = 5;"), "{}", output);
    assert!(output.contains("let mut total: i64 = 0;"), "{}", output);
}

#[test]
fn test_comprehensions_become_iterator_chains() {
    let source = r#"
def evens(n: int) -> list[int]:
    result: list[int] = [x * 2 for x in range(n) if x % 2 == 0]
    return result
"#;
    assert_generates(
        source,
        Target::Rust,
        &[".filter(", ".map(|x| (x * 2)).collect::<Vec<_>>()"],
    );
}

#[test]
fn test_classes_become_structs_with_impls() {
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
        Target::Rust,
        &[
            "#[derive(Debug, Clone, Default)]",
            "struct Counter {",
            "impl Counter {",
            "fn new(start: i64) -> Self",
            "fn bump(&mut self)",
            "fn value(&self) -> i64",
            "self_.count = start;",
        ],
    );
}
