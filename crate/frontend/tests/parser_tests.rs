use mgen_frontend::parse_and_validate;
use mgen_ir::ast::{BindingTarget, Declaration, Expression, Statement};
use mgen_types::SemanticType;

#[test]
fn test_function_signature_annotations() {
    let module = parse_and_validate(
        "def mix(a: int, b: float, c: str) -> list[int]:\n    return []\n",
    )
    .expect("validation succeeds");
    let func = module.function("mix").expect("function parsed");
    assert_eq!(func.parameters.len(), 3);
    assert_eq!(func.parameters[0].annotation, SemanticType::Int);
    assert_eq!(func.parameters[1].annotation, SemanticType::Float);
    assert_eq!(func.parameters[2].annotation, SemanticType::Str);
    assert_eq!(
        func.return_type,
        SemanticType::List(Box::new(SemanticType::Int))
    );
}

#[test]
fn test_elif_chains_nest_in_the_else_branch() {
    let module = parse_and_validate(
        "def f(n: int) -> int:\n    if n == 0:\n        return 0\n    elif n == 1:\n        return 1\n    else:\n        return 2\n",
    )
    .expect("validation succeeds");
    let func = module.function("f").expect("function parsed");
    let Statement::If(outer) = &func.body[0] else {
        panic!("expected an if");
    };
    assert_eq!(outer.else_branch.len(), 1);
    assert!(matches!(outer.else_branch[0], Statement::If(_)));
}

#[test]
fn test_inline_suites_parse() {
    let module = parse_and_validate("def f(n: int) -> int:\n    if n <= 1: return n\n    return 2\n")
        .expect("validation succeeds");
    let func = module.function("f").expect("function parsed");
    assert_eq!(func.body.len(), 2);
}

#[test]
fn test_pair_loop_targets() {
    let module = parse_and_validate(
        "def f(m: dict[str, int]) -> int:\n    for k, v in m.items():\n        pass\n    return 0\n",
    )
    .expect("validation succeeds");
    let func = module.function("f").expect("function parsed");
    let Statement::For(for_stmt) = &func.body[0] else {
        panic!("expected a for loop");
    };
    assert_eq!(
        for_stmt.target,
        BindingTarget::Pair("k".to_string(), "v".to_string())
    );
}

#[test]
fn test_comprehension_forms() {
    let module = parse_and_validate(
        "def f(n: int) -> int:\n    a = [x for x in range(n)]\n    b = {x for x in range(n)}\n    c = {x: x for x in range(n) if x > 0}\n    return 0\n",
    )
    .expect("validation succeeds");
    let func = module.function("f").expect("function parsed");
    let values: Vec<&Expression> = func
        .body
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::Assign(assign) => Some(&assign.value),
            _ => None,
        })
        .collect();
    assert!(matches!(values[0], Expression::ListComp(_)));
    assert!(matches!(values[1], Expression::SetComp(_)));
    assert!(matches!(values[2], Expression::DictComp(_)));
    let Expression::DictComp(comp) = values[2] else {
        unreachable!();
    };
    assert!(comp.generator.condition.is_some());
}

#[test]
fn test_class_bodies_hold_methods() {
    let module = parse_and_validate(
        "class Pair:\n    def __init__(self, a: int, b: int):\n        self.a = a\n        self.b = b\n\n    def total(self) -> int:\n        return self.a + self.b\n",
    )
    .expect("validation succeeds");
    let class = module.class("Pair").expect("class parsed");
    assert_eq!(class.methods.len(), 2);
    assert!(class.constructor().is_some());
    assert!(class.methods[1].is_method());
    assert_eq!(class.methods[1].value_parameters().len(), 0);
}

#[test]
fn test_imports_are_recorded() {
    let module =
        parse_and_validate("from math import sqrt, floor\nimport sys\n").expect("valid");
    let imports: Vec<_> = module
        .declarations
        .iter()
        .filter_map(|d| match d {
            Declaration::Import(import) => Some(import),
            _ => None,
        })
        .collect();
    assert_eq!(imports.len(), 2);
    assert_eq!(imports[0].module, "math");
    assert_eq!(imports[0].names, vec!["sqrt", "floor"]);
    assert!(imports[1].names.is_empty());
}

#[test]
fn test_global_variables_require_annotations() {
    let module = parse_and_validate("LIMIT: int = 100\n").expect("validation succeeds");
    let Declaration::GlobalVar(var) = &module.declarations[0] else {
        panic!("expected a global");
    };
    assert_eq!(var.name, "LIMIT");
    assert_eq!(var.annotation, SemanticType::Int);

    assert!(parse_and_validate("def f() -> int:\n    return 0\nlimit = 100\n").is_err());
}

#[test]
fn test_comparison_chaining_is_rejected() {
    assert!(parse_and_validate("def f(n: int) -> bool:\n    return 0 < n < 10\n").is_err());
}
