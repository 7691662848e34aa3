//! C converter: runtime containers and explicit lifecycle calls

use crate::test_utils::{assert_generates, primary_output, translate_for};
use mgen_types::Target;

#[test]
fn test_locals_are_dropped_on_every_exit_path() {
    let source = r#"
def probe(n: int) -> int:
    seen: set[int] = set()
    if n < 0:
        return 0
    seen.add(n)
    return len(seen)
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success, "{:?}", result.diagnostics);
    let output = primary_output(&result, Target::C);
    // One drop before the early return, one before the final return
    assert_eq!(
        output.matches("set_int_drop(&seen);").count(),
        2,
        "{}",
        output
    );
}

#[test]
fn test_returned_container_is_not_dropped() {
    let source = r#"
def build(n: int) -> list[int]:
    out: list[int] = []
    out.append(n)
    return out
"#;
    let result = translate_for(source, Target::C);
    assert!(result.success);
    let output = primary_output(&result, Target::C);
    assert!(!output.contains("vec_int_drop(&out);"), "{}", output);
    assert!(output.contains("return out;"));
}

#[test]
fn test_string_methods_route_through_the_runtime() {
    let source = r#"
def tidy(s: str) -> str:
    return s.strip()

def shout(s: str) -> str:
    return s.upper()
"#;
    assert_generates(
        source,
        Target::C,
        &["mgen_str_strip(s)", "mgen_str_upper(s)"],
    );
}

#[test]
fn test_floor_division_uses_the_helper() {
    let source = "def halve(n: int) -> int:\n    return n // 2\n";
    assert_generates(
        source,
        Target::C,
        &["mgen_floordiv_i64(n, 2)", "static long long mgen_floordiv_i64"],
    );
}

#[test]
fn test_classes_become_structs_with_free_functions() {
    let source = r#"
class Counter:
    def __init__(self, start: int):
        self.count = start

    def bump(self) -> None:
        self.count = self.count + 1

    def value(self) -> int:
        return self.count

def use_counter() -> int:
    c = Counter(5)
    c.bump()
    return c.value()
"#;
    assert_generates(
        source,
        Target::C,
        &[
            "} Counter;",
            "Counter Counter_new(long long start)",
            "void Counter_bump(Counter *self)",
            "self->count = start;",
            "Counter c = Counter_new(5);",
            "Counter_bump(&c);",
            "return Counter_value(&c);",
        ],
    );
}

#[test]
fn test_user_main_is_wrapped() {
    let source = r#"
def main() -> int:
    return 0
"#;
    assert_generates(
        source,
        Target::C,
        &["long long mgen_user_main(void)", "int main(void) {"],
    );
}

#[test]
fn test_comprehension_lowers_to_a_fill_loop() {
    let source = r#"
def evens(n: int) -> list[int]:
    result: list[int] = [x * 2 for x in range(n)]
    return result
"#;
    assert_generates(
        source,
        Target::C,
        &["vec_int result = vec_int_init();", "vec_int_push(&result, (x * 2));"],
    );
}
