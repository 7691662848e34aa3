//! Type inference: flow-insensitive propagation, flow-sensitive
//! container refinement, and the inference failure modes

use crate::test_utils::{has_diagnostic_code, translate_for};
use mgen_error::ErrorCode;
use mgen_frontend::{parse_and_validate, semantic_analysis};
use mgen_ir::ast::{Expression, Module, Statement};
use mgen_shared::CompilationContext;
use mgen_types::{SemanticType, Target};
use rstest::rstest;

/// Parses and analyzes a program, returning the annotated module
fn analyze(source: &str) -> (Module, CompilationContext) {
    let mut module = parse_and_validate(source).expect("validation succeeds");
    let mut context = CompilationContext::new();
    semantic_analysis::execute(&mut module, &mut context).expect("analysis succeeds");
    (module, context)
}

fn first_assignment_type(module: &Module, function: &str) -> SemanticType {
    let func = module.function(function).expect("function exists");
    for stmt in &func.body {
        if let Statement::Assign(assign) = stmt {
            if let Expression::Variable(var) = &assign.target {
                return var.ty.clone();
            }
        }
    }
    panic!("no assignment in '{}'", function);
}

#[test]
fn test_empty_list_is_refined_by_first_append() {
    let source = r#"
def build() -> int:
    xs = []
    xs.append(41)
    return len(xs)
"#;
    let (module, _) = analyze(source);
    assert_eq!(
        first_assignment_type(&module, "build"),
        SemanticType::List(Box::new(SemanticType::Int))
    );
}

#[test]
fn test_empty_dict_is_refined_by_first_store() {
    let source = r#"
def build() -> int:
    m = {}
    m["a"] = 1
    return len(m)
"#;
    let (module, _) = analyze(source);
    assert_eq!(
        first_assignment_type(&module, "build"),
        SemanticType::Dict(Box::new(SemanticType::Str), Box::new(SemanticType::Int))
    );
}

#[rstest]
#[case("1 + 2", SemanticType::Int)]
#[case("1 + 2.0", SemanticType::Float)]
#[case("1 / 2", SemanticType::Float)]
#[case("7 // 2", SemanticType::Int)]
#[case("1 < 2", SemanticType::Bool)]
fn test_expression_result_types(#[case] expr: &str, #[case] expected: SemanticType) {
    let source = format!("def probe() -> int:\n    x = {}\n    return 0\n", expr);
    let mut module = parse_and_validate(&source).expect("validation succeeds");
    let mut context = CompilationContext::new();
    // The probe may warn; only the binding type matters here
    let _ = semantic_analysis::execute(&mut module, &mut context);
    assert_eq!(first_assignment_type(&module, "probe"), expected);
}

#[test]
fn test_conflicting_element_types_are_inconsistent() {
    let source = r#"
def bad() -> int:
    xs = []
    xs.append(1)
    xs.append("two")
    return len(xs)
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::TypeInconsistency));
}

#[test]
fn test_annotated_binding_type_is_fixed() {
    let source = r#"
def bad() -> int:
    x: int = 1
    x = "shadow"
    return x
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::TypeInconsistency));
}

#[test]
fn test_unresolved_empty_container_fails_at_mapping() {
    let source = r#"
def opaque() -> int:
    xs = []
    return 0
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(has_diagnostic_code(&result, "A2001"), "{:?}", result.diagnostics);
}

#[test]
fn test_undefined_name_is_reported() {
    let source = "def f() -> int:\n    return missing + 1\n";
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::UndefinedVariable));
}

#[test]
fn test_undefined_function_is_reported() {
    let source = "def f() -> int:\n    return helper(1)\n";
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::UndefinedFunction));
}

#[test]
fn test_argument_count_is_checked() {
    let source = r#"
def double(n: int) -> int:
    return n * 2

def f() -> int:
    return double(1, 2)
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::ArgumentCountMismatch));
}

#[test]
fn test_class_fields_come_from_the_constructor() {
    let source = r#"
class Counter:
    def __init__(self, start: int):
        self.count = start

    def value(self) -> int:
        return self.count
"#;
    let (_, context) = analyze(source);
    let info = context.class_info("Counter").expect("class registered");
    assert_eq!(info.field_type("count"), Some(&SemanticType::Int));
    assert!(info.methods.contains_key("value"));
}

#[test]
fn test_dict_with_list_values_is_rejected_for_c() {
    let source = r#"
def group(names: list[str]) -> int:
    buckets: dict[str, list[int]] = {}
    return len(buckets)
"#;
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.error_code == ErrorCode::UnsupportedFeature
            && d.message.contains("container-valued")));
}

#[test]
fn test_dict_with_list_values_is_accepted_for_cpp() {
    let source = r#"
def group() -> int:
    buckets: dict[str, list[int]] = {}
    return len(buckets)
"#;
    let result = translate_for(source, Target::Cpp);
    assert!(result.success, "{:?}", result.diagnostics);
}
