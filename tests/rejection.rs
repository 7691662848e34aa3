//! Subset rejection: every unsupported construct yields exactly one
//! `UnsupportedFeature` diagnostic with a suggestion, and validation
//! keeps going so one run reports every violation

use crate::test_utils::{assert_rejected_once, translate_for};
use mgen_error::ErrorCode;
use mgen_shared::Severity;
use mgen_types::Target;
use rstest::rstest;

#[rstest]
#[case::async_def("async def f(n: int) -> int:\n    return n\n")]
#[case::await_expr(
    "def f(n: int) -> int:\n    x: int = await compute(n)\n    return x\n"
)]
#[case::generator(
    "def f(n: int) -> int:\n    yield n\n    return n\n"
)]
#[case::decorator("@cached\ndef f(n: int) -> int:\n    return n\n")]
#[case::star_args("def f(*args) -> int:\n    return 0\n")]
#[case::kwargs("def f(**kwargs) -> int:\n    return 0\n")]
#[case::try_except(
    "def f(n: int) -> int:\n    try:\n        return n\n    except ValueError:\n        return 0\n    return 0\n"
)]
#[case::with_stmt(
    "def f(n: int) -> int:\n    with open_resource():\n        pass\n    return n\n"
)]
#[case::raise_stmt("def f(n: int) -> int:\n    raise ValueError\n    return n\n")]
#[case::global_decl("def f() -> int:\n    global counter\n    return 0\n")]
#[case::del_stmt("def f(n: int) -> int:\n    del n\n    return 0\n")]
#[case::inheritance("class Child(Base):\n    def get(self) -> int:\n        return 0\n")]
#[case::multiple_inheritance(
    "class Child(A, B):\n    def get(self) -> int:\n        return 0\n"
)]
#[case::parameter_default("def f(n: int = 0) -> int:\n    return n\n")]
#[case::eval_call("def f(s: str) -> int:\n    eval(s)\n    return 0\n")]
fn test_unsupported_feature_single_diagnostic(#[case] source: &str) {
    assert_rejected_once(source, ErrorCode::UnsupportedFeature);
}

#[test]
fn test_lambda_is_rejected() {
    let source = "def f(n: int) -> int:\n    g = lambda x: x + 1\n    return n\n";
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::UnsupportedFeature
            && d.message.contains("lambda")));
}

#[test]
fn test_generator_expression_is_rejected() {
    let source = "def f(n: int) -> int:\n    total = sum(x * x for x in items)\n    return total\n";
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::UnsupportedFeature
            && d.message.contains("generator")));
}

#[test]
fn test_multiple_violations_are_all_reported() {
    let source = r#"
async def first(n: int) -> int:
    return n

@decorated
def second(n: int) -> int:
    return n

def third(n: int) -> int:
    global counter
    return n
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    let unsupported = result
        .diagnostics
        .iter()
        .filter(|d| d.error_code == ErrorCode::UnsupportedFeature)
        .count();
    assert!(
        unsupported >= 3,
        "all three violations surface in one run, got {:?}",
        result.diagnostics
    );
}

#[test]
fn test_missing_parameter_annotation_is_flagged() {
    let source = "def f(n) -> int:\n    return 0\n";
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::MissingAnnotation));
}

#[test]
fn test_warnings_never_halt_translation() {
    // A lossy float-into-int store is warned about, not rejected
    let source = "def f() -> int:\n    x: int = 1.5\n    return x\n";
    let result = translate_for(source, Target::C);
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning
            && d.error_code == ErrorCode::LossyConversion));
}
