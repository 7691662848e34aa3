//! Loop-conversion strategy classification and per-target emission

use crate::test_utils::assert_generates;
use mgen_backend::loops::{classify, BodyPattern, IterationSource};
use mgen_frontend::{parse_and_validate, semantic_analysis};
use mgen_ir::ast::{Declaration, ForStatement, Statement};
use mgen_shared::CompilationContext;
use mgen_types::Target;

/// Parses a single function and returns its first for loop
fn first_for_loop(source: &str) -> ForStatement {
    let mut module = parse_and_validate(source).expect("validation succeeds");
    let mut context = CompilationContext::new();
    let _ = semantic_analysis::execute(&mut module, &mut context);
    for decl in &module.declarations {
        if let Declaration::Function(func) = decl {
            for stmt in &func.body {
                if let Statement::For(for_stmt) = stmt {
                    return for_stmt.clone();
                }
            }
        }
    }
    panic!("no for loop in source");
}

#[test]
fn test_range_source_is_recognized() {
    let loop_stmt = first_for_loop(
        "def f(n: int) -> int:\n    total: int = 0\n    for i in range(2, n, 3):\n        total += i\n    return total\n",
    );
    let shape = classify(&loop_stmt);
    match shape.source {
        IterationSource::Range(args) => assert_eq!(args.len(), 3),
        IterationSource::Container(_) => panic!("expected a range source"),
    }
}

#[test]
fn test_accumulation_body_is_recognized() {
    let loop_stmt = first_for_loop(
        "def f(n: int) -> int:\n    total: int = 0\n    for i in range(n):\n        total = total + i\n    return total\n",
    );
    match classify(&loop_stmt).body {
        BodyPattern::Accumulate { accumulator, .. } => assert_eq!(accumulator, "total"),
        _ => panic!("expected an accumulation body"),
    }
}

#[test]
fn test_append_build_body_is_recognized() {
    let loop_stmt = first_for_loop(
        "def f(n: int) -> list[int]:\n    out: list[int] = []\n    for i in range(n):\n        out.append(i)\n    return out\n",
    );
    match classify(&loop_stmt).body {
        BodyPattern::AppendBuild { list, .. } => assert_eq!(list, "out"),
        _ => panic!("expected an append-build body"),
    }
}

#[test]
fn test_nested_build_wins_over_append_build() {
    let loop_stmt = first_for_loop(
        "def f(n: int) -> list[int]:\n    out: list[int] = []\n    for i in range(n):\n        for j in range(n):\n            out.append(i * j)\n    return out\n",
    );
    match classify(&loop_stmt).body {
        BodyPattern::NestedBuild { list, .. } => assert_eq!(list, "out"),
        _ => panic!("expected a nested-build body"),
    }
}

/// Two independent append targets fall through to the general strategy
#[test]
fn test_two_append_targets_stay_general() {
    let loop_stmt = first_for_loop(
        "def f(n: int) -> int:\n    evens: list[int] = []\n    odds: list[int] = []\n    for i in range(n):\n        evens.append(i)\n        odds.append(i)\n    return len(evens)\n",
    );
    assert!(matches!(classify(&loop_stmt).body, BodyPattern::General));
}

#[test]
fn test_while_true_is_recognized_specifically() {
    let source = r#"
def countdown(n: int) -> int:
    while True:
        n = n - 1
        if n <= 0:
            break
    return n
"#;
    assert_generates(source, Target::C, &["while (1) {"]);
    assert_generates(source, Target::Rust, &["loop {"]);
    assert_generates(source, Target::Go, &["for {"]);
}

#[test]
fn test_negative_literal_step_reverses_direction() {
    let source = r#"
def down(n: int) -> int:
    total: int = 0
    for i in range(n, 0, -1):
        total = total + i
    return total
"#;
    assert_generates(source, Target::C, &["i > 0", "i += (-1)"]);
}

#[test]
fn test_dict_items_iteration() {
    let source = r#"
def total(freq: dict[str, int]) -> int:
    acc: int = 0
    for k, v in freq.items():
        acc = acc + v
    return acc
"#;
    assert_generates(source, Target::Cpp, &["for (const auto& [k, v] : freq)"]);
    assert_generates(source, Target::Go, &["for k, v := range freq"]);
    assert_generates(source, Target::C, &["map_str_int_keys", "map_str_int_get"]);
}

#[test]
fn test_foreach_over_known_container() {
    let source = r#"
def total(items: list[int]) -> int:
    acc: int = 0
    for x in items:
        acc = acc + x
    return acc
"#;
    assert_generates(source, Target::Cpp, &["for (const auto& x : items)"]);
    assert_generates(source, Target::Go, &["for _, x := range items"]);
    assert_generates(source, Target::Rust, &["for x in items.iter().cloned()"]);
    assert_generates(source, Target::OCaml, &["List.iter (fun x ->"]);
}
