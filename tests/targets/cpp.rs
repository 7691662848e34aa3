//! C++ converter: std containers, RAII, const discipline

use crate::test_utils::{assert_generates, primary_output, translate_for};
use mgen_types::Target;

#[test]
fn test_std_container_types() {
    let source = r#"
def index(names: list[str]) -> dict[str, int]:
    positions: dict[str, int] = {}
    i: int = 0
    for name in names:
        positions[name] = i
        i = i + 1
    return positions
"#;
    assert_generates(
        source,
        Target::Cpp,
        &[
            "std::map<std::string, int64_t> index(const std::vector<std::string>& names)",
            "positions[name] = i;",
        ],
    );
}

#[test]
fn test_no_lifecycle_calls_are_emitted() {
    let source = r#"
def build(n: int) -> list[int]:
    out: list[int] = []
    for i in range(n):
        out.append(i)
    return out
"#;
    let result = translate_for(source, Target::Cpp);
    assert!(result.success);
    let output = primary_output(&result, Target::Cpp);
    assert!(!output.contains("drop"), "RAII covers the lifecycle: {}", output);
    assert!(!result.output_files.contains_key("mgen_runtime.h"));
}

#[test]
fn test_classes_become_structs_with_member_functions() {
    let source = r#"
class Point:
    def __init__(self, x: int, y: int):
        self.x = x
        self.y = y

    def manhattan(self) -> int:
        return abs(self.x) + abs(self.y)
"#;
    assert_generates(
        source,
        Target::Cpp,
        &[
            "struct Point {",
            "Point::Point(int64_t x, int64_t y)",
            "int64_t Point::manhattan() const",
            "this->x = x;",
        ],
    );
}

#[test]
fn test_string_helpers_are_emitted_on_demand() {
    let source = "def tidy(s: str) -> str:\n    return s.strip()\n";
    assert_generates(source, Target::Cpp, &["mgen_strip(", "static std::string mgen_strip"]);
}

#[test]
fn test_dict_get_uses_a_checked_lookup() {
    let source = r#"
def lookup(freq: dict[str, int], key: str) -> int:
    if key in freq:
        return freq.get(key)
    return 0
"#;
    assert_generates(source, Target::Cpp, &["freq.count(key)", "freq.at(key)"]);
}
