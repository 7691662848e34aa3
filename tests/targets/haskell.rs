//! Haskell converter: pure renderings and honest failures

use crate::test_utils::{assert_generates, primary_output, translate_for};
use mgen_error::ErrorCode;
use mgen_types::Target;

#[test]
fn test_accumulation_becomes_a_fold() {
    let source = r#"
def total(items: list[int]) -> int:
    acc: int = 0
    for x in items:
        acc = acc + x
    return acc
"#;
    assert_generates(
        source,
        Target::Haskell,
        &["total :: [Int] -> Int", "foldl (\\acc x -> acc + x) acc items"],
    );
}

#[test]
fn test_comprehensions_map_onto_native_syntax() {
    let source = r#"
def evens(n: int) -> list[int]:
    result: list[int] = [x * 2 for x in range(n) if x % 2 == 0]
    return result
"#;
    assert_generates(
        source,
        Target::Haskell,
        &["[(x * 2) | x <- [0 .. n - 1], "],
    );
}

#[test]
fn test_if_chains_become_guards() {
    let source = r#"
def sign(n: int) -> int:
    if n < 0:
        return -1
    if n > 0:
        return 1
    return 0
"#;
    assert_generates(
        source,
        Target::Haskell,
        &["sign :: Int -> Int", "if (n < 0) then (negate 1) else if (n > 0) then 1 else 0"],
    );
}

#[test]
fn test_general_mutation_is_rejected_cleanly() {
    let source = r#"
def messy(n: int) -> int:
    total: int = 0
    while n > 0:
        total = total + n
        n = n - 1
    return total
"#;
    let result = translate_for(source, Target::Haskell);
    assert!(!result.success);
    let failure = result
        .diagnostics
        .iter()
        .find(|d| d.error_code == ErrorCode::GenerationFailure)
        .expect("a clear diagnostic");
    assert!(failure.suggestion.is_some(), "failures carry guidance");
}

#[test]
fn test_main_prints_through_io() {
    let source = r#"
def fib(n: int) -> int:
    if n <= 1: return n
    return fib(n-1) + fib(n-2)

def main() -> None:
    print(fib(10))
"#;
    let result = translate_for(source, Target::Haskell);
    assert!(result.success, "{:?}", result.diagnostics);
    let output = primary_output(&result, Target::Haskell);
    assert!(output.contains("main :: IO ()"), "{}", output);
    assert!(output.contains("print ((fib (10)))"), "{}", output);
}
