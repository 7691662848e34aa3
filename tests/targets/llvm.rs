//! LLVM IR converter: alloca-based locals, explicit blocks, and calls
//! into the shared C runtime

use crate::test_utils::{assert_generates, primary_output, translate_for};
use mgen_error::ErrorCode;
use mgen_types::Target;

#[test]
fn test_scalar_function_shape() {
    let source = r#"
def add(a: int, b: int) -> int:
    return a + b
"#;
    assert_generates(
        source,
        Target::LlvmIr,
        &[
            "define i64 @add(i64 %arg.a, i64 %arg.b)",
            "store i64 %arg.a, ptr %a.addr",
            "ret i64",
        ],
    );
}

#[test]
fn test_control_flow_uses_basic_blocks() {
    let source = r#"
def sign(n: int) -> int:
    if n < 0:
        return 0 - 1
    return 1
"#;
    let result = translate_for(source, Target::LlvmIr);
    assert!(result.success, "{:?}", result.diagnostics);
    let output = primary_output(&result, Target::LlvmIr);
    assert!(output.contains("br i1"), "{}", output);
    assert!(output.contains("icmp slt i64"), "{}", output);
}

#[test]
fn test_containers_call_the_shared_runtime() {
    let source = r#"
def uniq(items: list[int]) -> int:
    seen: set[int] = set()
    for x in items:
        seen.add(x)
    return len(seen)
"#;
    let result = translate_for(source, Target::LlvmIr);
    assert!(result.success, "{:?}", result.diagnostics);
    let output = primary_output(&result, Target::LlvmIr);
    assert!(output.contains("%struct.set_int = type { ptr, i64, i64 }"), "{}", output);
    assert!(output.contains("call i1 @set_int_insert"), "{}", output);
    assert!(output.contains("call void @set_int_drop"), "{}", output);
    // The C runtime rides along for linking
    assert!(result.output_files.contains_key("mgen_runtime.c"));
    assert!(result.output_files.contains_key("Makefile"));
}

#[test]
fn test_container_returns_are_rejected() {
    let source = r#"
def build(n: int) -> list[int]:
    out: list[int] = []
    out.append(n)
    return out
"#;
    let result = translate_for(source, Target::LlvmIr);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::GenerationFailure));
}

#[test]
fn test_print_goes_through_printf() {
    let source = r#"
def main() -> None:
    print(42)
"#;
    assert_generates(
        source,
        Target::LlvmIr,
        &["declare i32 @printf(ptr, ...)", "@printf(ptr @.str.0, i64 42)"],
    );
}
