//! OCaml converter: ref cells, Hashtbl containers, and the return
//! exception idiom

use crate::test_utils::{assert_generates, primary_output, translate_for};
use mgen_error::ErrorCode;
use mgen_types::Target;

#[test]
fn test_early_returns_use_the_exception_idiom() {
    let source = r#"
def fib(n: int) -> int:
    if n <= 1: return n
    return fib(n-1) + fib(n-2)
"#;
    assert_generates(
        source,
        Target::OCaml,
        &[
            "exception Return_fib of int",
            "raise (Return_fib (n));",
            "with Return_fib mgen_ret -> mgen_ret",
        ],
    );
}

#[test]
fn test_mutated_locals_become_refs() {
    let source = r#"
def total(items: list[int]) -> int:
    acc: int = 0
    for x in items:
        acc = acc + x
    return acc
"#;
    assert_generates(
        source,
        Target::OCaml,
        &["let acc = ref (0) in", "acc := ", "raise (Return_total (!acc));"],
    );
}

#[test]
fn test_dicts_are_hashtables() {
    let source = r#"
def bump(freq: dict[str, int], key: str) -> None:
    freq[key] = 1
"#;
    assert_generates(source, Target::OCaml, &["Hashtbl.replace freq (key) (1);"]);
}

#[test]
fn test_in_place_list_parameter_mutation_is_rejected() {
    let source = r#"
def push(items: list[int], value: int) -> None:
    items.append(value)
"#;
    let result = translate_for(source, Target::OCaml);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::GenerationFailure));
}

#[test]
fn test_classes_become_mutable_records() {
    let source = r#"
class Counter:
    def __init__(self, start: int):
        self.count = start

    def value(self) -> int:
        return self.count
"#;
    let result = translate_for(source, Target::OCaml);
    assert!(result.success, "{:?}", result.diagnostics);
    let output = primary_output(&result, Target::OCaml);
    assert!(output.contains("type counter = {"), "{}", output);
    assert!(output.contains("mutable count : int;"), "{}", output);
    assert!(output.contains("let rec counter_new start ="), "{}", output);
}
