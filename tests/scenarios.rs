//! The canonical translation scenarios, run against every target that
//! supports the shape involved

use crate::test_utils::{assert_generates, translate_for};
use mgen_error::ErrorCode;
use mgen_shared::Severity;
use mgen_types::Target;
use rstest::rstest;

const SUM_FIRST_N: &str = r#"
def sum_first_n(n: int) -> int:
    total: int = 0
    for i in range(n):
        total = total + i
    return total
"#;

#[rstest]
#[case(Target::C, "long long sum_first_n(long long n)")]
#[case(Target::Cpp, "int64_t sum_first_n(int64_t n)")]
#[case(Target::Rust, "fn sum_first_n(n: i64) -> i64")]
#[case(Target::Go, "func sum_first_n(n int64) int64")]
#[case(Target::OCaml, "let rec sum_first_n n =")]
#[case(Target::LlvmIr, "define i64 @sum_first_n(i64 %arg.n)")]
fn test_range_indexed_loop(#[case] target: Target, #[case] signature: &str) {
    assert_generates(SUM_FIRST_N, target, &[signature, "sum_first_n"]);
}

#[test]
fn test_range_loop_becomes_fold_in_haskell() {
    assert_generates(
        SUM_FIRST_N,
        Target::Haskell,
        &["sum_first_n :: Int -> Int", "foldl"],
    );
}

const SQUARES: &str = r#"
def squares(n: int) -> list[int]:
    result: list[int] = []
    for i in range(n):
        result.append(i * i)
    return result
"#;

#[test]
fn test_append_build_c_uses_runtime_vector() {
    assert_generates(
        SQUARES,
        Target::C,
        &[
            "vec_int squares(long long n)",
            "vec_int result = vec_int_init();",
            "vec_int_push(&result, (i * i));",
            "return result;",
        ],
    );
    // The runtime rides along with the generated source
    let result = translate_for(SQUARES, Target::C);
    assert!(result.output_files.contains_key("mgen_runtime.h"));
    assert!(result.output_files.contains_key("mgen_runtime.c"));
    assert!(result.output_files.contains_key("Makefile"));
}

#[test]
fn test_append_build_rust_uses_map_collect() {
    assert_generates(
        SQUARES,
        Target::Rust,
        &["fn squares(n: i64) -> Vec<i64>", ".extend((0..n).map("],
    );
}

#[test]
fn test_append_build_go_appends_to_slice() {
    assert_generates(
        SQUARES,
        Target::Go,
        &["func squares(n int64) []int64", "result = append(result"],
    );
}

const WORD_COUNT: &str = r#"
def count(words: list[str]) -> dict[str, int]:
    freq: dict[str, int] = {}
    for w in words:
        if w in freq:
            freq[w] = freq[w] + 1
        else:
            freq[w] = 1
    return freq
"#;

#[test]
fn test_dict_word_count_c_uses_map_contains() {
    assert_generates(
        WORD_COUNT,
        Target::C,
        &[
            "map_str_int count(vec_str *words)",
            "map_str_int_contains(&freq, w)",
            "map_str_int_set(&freq, w",
            "map_str_int_get(&freq, w)",
        ],
    );
}

#[rstest]
#[case(Target::Cpp, "freq.count(w)")]
#[case(Target::Rust, "freq.contains_key(&w)")]
#[case(Target::Go, "mgenContainsKey(freq, w)")]
fn test_dict_membership_uses_contains(#[case] target: Target, #[case] snippet: &str) {
    assert_generates(WORD_COUNT, target, &[snippet]);
}

const UNIQ: &str = r#"
def uniq(items: list[int]) -> int:
    s: set[int] = set()
    for x in items:
        s.add(x)
    return len(s)
"#;

#[test]
fn test_set_operations_c() {
    assert_generates(
        UNIQ,
        Target::C,
        &[
            "set_int s = set_int_init();",
            "set_int_insert(&s, x);",
            "((long long)set_int_size(&s))",
            // The set is released before the value leaves the function
            "set_int_drop(&s);",
        ],
    );
}

#[rstest]
#[case(Target::Cpp, "s.insert(x)")]
#[case(Target::Rust, "s.insert(x)")]
#[case(Target::Go, "s[x] = true")]
#[case(Target::OCaml, "Hashtbl.replace")]
fn test_set_operations(#[case] target: Target, #[case] snippet: &str) {
    assert_generates(UNIQ, target, &[snippet]);
}

const FIB: &str = r#"
def fib(n: int) -> int:
    if n <= 1: return n
    return fib(n-1) + fib(n-2)
"#;

#[rstest]
#[case(Target::C, "fib((n - 1))")]
#[case(Target::Cpp, "fib((n - 1))")]
#[case(Target::Rust, "fib((n - 1))")]
#[case(Target::Go, "fib((n - int64(1)))")]
#[case(Target::Haskell, "if (n <= 1) then n else")]
#[case(Target::OCaml, "let rec fib n =")]
#[case(Target::LlvmIr, "call i64 @fib")]
fn test_recursion(#[case] target: Target, #[case] snippet: &str) {
    assert_generates(FIB, target, &[snippet]);
}

#[test]
fn test_async_def_is_rejected_with_one_diagnostic() {
    let source = r#"
async def fetch(n: int) -> int:
    return n
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result.output_files.is_empty());
    let errors: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1, "exactly one diagnostic: {:?}", errors);
    assert_eq!(errors[0].error_code, ErrorCode::UnsupportedFeature);
    assert!(
        errors[0]
            .suggestion
            .as_deref()
            .is_some_and(|s| s.contains("synchronous")),
        "the suggestion names the synchronous form"
    );
}

#[test]
fn test_mutation_heavy_code_fails_cleanly_on_haskell() {
    // A set built by in-place mutation has no pure rendering
    let result = translate_for(UNIQ, Target::Haskell);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::GenerationFailure));
}
