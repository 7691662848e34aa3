//! Constraint and memory-safety checker rules

use crate::test_utils::{has_diagnostic_code, translate_for};
use mgen_shared::Severity;
use mgen_types::Target;
use rstest::rstest;

#[test]
fn test_ts001_incompatible_binary_operands() {
    let source = r#"
def f(flag: bool) -> int:
    x = flag + 3
    return 0
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(has_diagnostic_code(&result, "TS001"), "{:?}", result.diagnostics);
}

#[rstest]
#[case::store("def f() -> int:\n    x: int = 2.5\n    return x\n")]
#[case::ret("def f() -> int:\n    return 2.5\n")]
#[case::argument(
    "def half(n: int) -> int:\n    return n\n\ndef f() -> int:\n    return half(2.5)\n"
)]
fn test_ts002_lossy_conversion_warns(#[case] source: &str) {
    let result = translate_for(source, Target::C);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(has_diagnostic_code(&result, "TS002"), "{:?}", result.diagnostics);
}

#[test]
fn test_ts003_literal_zero_divisor() {
    let source = "def f(n: int) -> int:\n    return n // 0\n";
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(has_diagnostic_code(&result, "TS003"));
}

#[test]
fn test_ts004_integer_range_for_tagged_ints() {
    // OCaml native ints lose one bit to the tag
    let source = "def f() -> int:\n    return 4611686018427387904\n";
    let result = translate_for(source, Target::OCaml);
    assert!(has_diagnostic_code(&result, "TS004"), "{:?}", result.diagnostics);
}

#[test]
fn test_sa001_unreachable_after_return() {
    let source = r#"
def f(n: int) -> int:
    return n
    n = n + 1
    return n
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(has_diagnostic_code(&result, "SA001"));
}

#[test]
fn test_sa002_unused_local_is_info() {
    let source = r#"
def f(n: int) -> int:
    wasted: int = 3
    return n
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success);
    let finding = result
        .diagnostics
        .iter()
        .find(|d| d.error_code.code() == "SA002")
        .expect("SA002 emitted");
    assert_eq!(finding.severity, Severity::Info);
    assert!(finding.message.contains("wasted"));
}

#[test]
fn test_sa005_read_only_parameter_with_mutable_annotation() {
    let source = r#"
def total(items: list[int]) -> int:
    acc: int = 0
    for x in items:
        acc = acc + x
    return acc
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success);
    assert!(has_diagnostic_code(&result, "SA005"));
}

#[test]
fn test_cc004_complexity_threshold() {
    let mut body = String::new();
    for i in 0..11 {
        body.push_str(&format!(
            "    if n == {}:\n        return {}\n",
            i, i
        ));
    }
    let source = format!("def dispatch(n: int) -> int:\n{}    return -1\n", body);
    let result = translate_for(&source, Target::C);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(has_diagnostic_code(&result, "CC004"));
}

#[test]
fn test_ms001_unguarded_variable_index() {
    let source = r#"
def pick(items: list[int], i: int) -> int:
    return items[i]
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(has_diagnostic_code(&result, "MS001"));
}

#[test]
fn test_ms001_respects_len_guards() {
    let source = r#"
def pick(items: list[int], i: int) -> int:
    if i < len(items):
        return items[i]
    return 0
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success);
    assert!(!has_diagnostic_code(&result, "MS001"), "{:?}", result.diagnostics);
}

#[test]
fn test_ms_rules_only_run_for_manual_memory_targets() {
    let source = r#"
def pick(items: list[int], i: int) -> int:
    return items[i]
"#;
    let result = translate_for(source, Target::Go);
    assert!(result.success);
    assert!(!has_diagnostic_code(&result, "MS001"));
}

#[test]
fn test_ms002_unchecked_get_dereference() {
    let source = r#"
def lookup(freq: dict[str, int], key: str) -> int:
    return freq.get(key) + 1
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(has_diagnostic_code(&result, "MS002"));
}

#[test]
fn test_ms003_container_rebind() {
    let source = r#"
def f() -> int:
    xs: list[int] = []
    xs = [1]
    return len(xs)
"#;
    let result = translate_for(source, Target::C);
    assert!(has_diagnostic_code(&result, "MS003"), "{:?}", result.diagnostics);
}

#[test]
fn test_ms004_interior_container_return() {
    let source = r#"
class Holder:
    def __init__(self, size: int):
        self.items: list[int] = []

    def raw(self) -> list[int]:
        return self.items
"#;
    let result = translate_for(source, Target::C);
    assert!(has_diagnostic_code(&result, "MS004"), "{:?}", result.diagnostics);
}
