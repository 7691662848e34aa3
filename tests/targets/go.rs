//! Go converter: slices, maps, and generic helpers

use crate::test_utils::{assert_generates, primary_output, translate_for};
use mgen_types::Target;

#[test]
fn test_package_and_imports_track_usage() {
    let source = r#"
def shout(s: str) -> str:
    return s.upper()
"#;
    let result = translate_for(source, Target::Go);
    assert!(result.success, "{:?}", result.diagnostics);
    let output = primary_output(&result, Target::Go);
    assert!(output.starts_with("package main"), "{}", output);
    assert!(output.contains("\"strings\""), "{}", output);
    assert!(!output.contains("\"math\""), "unused imports break Go builds: {}", output);
}

#[test]
fn test_sets_are_boolean_maps() {
    let source = r#"
def uniq(items: list[int]) -> int:
    seen: set[int] = set()
    for x in items:
        seen.add(x)
    return len(seen)
"#;
    assert_generates(
        source,
        Target::Go,
        &["seen := map[int64]bool{}", "seen[x] = true", "int64(len(seen))"],
    );
}

#[test]
fn test_mutable_list_parameters_are_pointers() {
    let source = r#"
def push(items: list[int], value: int) -> None:
    items.append(value)
"#;
    assert_generates(
        source,
        Target::Go,
        &["func push(items *[]int64, value int64)", "(*items) = append((*items), value)"],
    );
}

#[test]
fn test_membership_uses_generic_helper() {
    let source = r#"
def seen(freq: dict[str, int], key: str) -> bool:
    return key in freq
"#;
    assert_generates(
        source,
        Target::Go,
        &["mgenContainsKey(freq, key)", "func mgenContainsKey[K comparable, V any]"],
    );
}

#[test]
fn test_classes_become_structs_with_pointer_receivers() {
    let source = r#"
class Counter:
    def __init__(self, start: int):
        self.count = start

    def bump(self) -> None:
        self.count = self.count + 1
"#;
    assert_generates(
        source,
        Target::Go,
        &[
            "type Counter struct {",
            "func NewCounter(start int64) Counter",
            "func (self *Counter) bump()",
        ],
    );
}
