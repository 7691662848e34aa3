//! Memory-safety checker for the hand-managed targets (C and C++)
//!
//! | Code  | Rule                                                  |
//! |-------|-------------------------------------------------------|
//! | MS001 | Index with a variable and no bounds guard             |
//! | MS002 | Dereference of a lookup that may yield no value       |
//! | MS003 | Container re-bound while its allocation is still live |
//! | MS004 | Returning an interior container reference             |
//!
//! The rules are conservative source-level heuristics over the typed AST:
//! they flag patterns whose generated code would need manual review, they
//! do not prove the absence of hazards.

use super::{each_expression, each_statement};
use mgen_error::ErrorCode;
use mgen_ir::ast::{
    BindingTarget, CompareOperator, Declaration, Expression, FunctionDef, Module, Statement,
};
use mgen_shared::Diagnostic;
use mgen_types::SemanticType;
use std::collections::HashSet;

/// Runs the memory-safety rules over every function in the module
pub fn check(module: &Module) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for decl in &module.declarations {
        match decl {
            Declaration::Function(func) => check_function(func, &mut diagnostics),
            Declaration::Class(class) => {
                for method in &class.methods {
                    check_function(method, &mut diagnostics);
                }
            }
            _ => {}
        }
    }
    diagnostics
}

fn check_function(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    check_unguarded_indexing(func, diagnostics);
    check_nullable_lookups(func, diagnostics);
    check_container_rebinds(func, diagnostics);
    check_interior_returns(func, diagnostics);
}

// ----- MS001 -----

/// Flags list subscripts whose index variable has no visible bounds guard
///
/// A variable counts as guarded when it is bound by `range(...)` in a
/// loop header or compared against `len(...)` anywhere in the function.
fn check_unguarded_indexing(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    let mut guarded: HashSet<String> = HashSet::new();

    each_statement(&func.body, &mut |stmt| {
        if let Statement::For(for_stmt) = stmt {
            if is_range_call(&for_stmt.iterable) {
                if let BindingTarget::Name(name) = &for_stmt.target {
                    guarded.insert(name.clone());
                }
            }
        }
    });
    each_expression(&func.body, &mut |expr| {
        if let Expression::Comparison(cmp) = expr {
            let against_len = |e: &Expression| {
                matches!(e, Expression::Call(call) if call.callee_name() == Some("len"))
            };
            match cmp.operator {
                CompareOperator::Less | CompareOperator::LessEqual => {
                    if let Expression::Variable(var) = cmp.left.as_ref() {
                        if against_len(&cmp.right) {
                            guarded.insert(var.name.clone());
                        }
                    }
                }
                CompareOperator::Greater | CompareOperator::GreaterEqual => {
                    if let Expression::Variable(var) = cmp.right.as_ref() {
                        if against_len(&cmp.left) {
                            guarded.insert(var.name.clone());
                        }
                    }
                }
                _ => {}
            }
        }
    });

    each_expression(&func.body, &mut |expr| {
        if let Expression::Subscript(sub) = expr {
            if !matches!(sub.object.ty(), SemanticType::List(_)) {
                return;
            }
            if let Expression::Variable(index) = sub.index.as_ref() {
                if !guarded.contains(&index.name) {
                    diagnostics.push(
                        Diagnostic::warning(
                            ErrorCode::UnguardedIndex,
                            format!("index '{}' has no visible bounds guard", index.name),
                            sub.location,
                        )
                        .with_suggestion(
                            "compare the index against len(...) before subscripting",
                        ),
                    );
                }
            }
        }
    });
}

fn is_range_call(expr: &Expression) -> bool {
    matches!(expr, Expression::Call(call) if call.callee_name() == Some("range"))
}

// ----- MS002 -----

/// Flags `.get()` results consumed directly by an operator
///
/// The runtime's map lookup yields a sentinel when the key is absent;
/// feeding it straight into arithmetic or another subscript dereferences
/// a possibly-absent value.
fn check_nullable_lookups(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    each_expression(&func.body, &mut |expr| {
        let operands: Vec<&Expression> = match expr {
            Expression::Binary(bin) => vec![&bin.left, &bin.right],
            Expression::Comparison(cmp) => vec![&cmp.left, &cmp.right],
            Expression::Subscript(sub) => vec![&sub.object],
            _ => return,
        };
        for operand in operands {
            if let Expression::Call(call) = operand {
                if let Some((receiver, method)) = call.method_parts() {
                    if method == "get" && matches!(receiver.ty(), SemanticType::Dict(_, _)) {
                        diagnostics.push(
                            Diagnostic::warning(
                                ErrorCode::NullableDereference,
                                "result of '.get()' is used without an absence check"
                                    .to_string(),
                                call.location,
                            )
                            .with_suggestion("test membership with 'in' before the lookup"),
                        );
                    }
                }
            }
        }
    });
}

// ----- MS003 -----

/// Flags container locals re-bound to a fresh container
///
/// In the hand-managed targets the first allocation must be released
/// before the binding can take a new one; re-binding hides that release
/// point.
fn check_container_rebinds(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    let mut bound: HashSet<String> = HashSet::new();

    each_statement(&func.body, &mut |stmt| {
        let (target, value, location) = match stmt {
            Statement::Assign(assign) => (&assign.target, &assign.value, assign.location),
            Statement::AnnAssign(ann) => match &ann.value {
                Some(value) => (&ann.target, value, ann.location),
                None => return,
            },
            _ => return,
        };
        let Expression::Variable(var) = target else {
            return;
        };
        if !allocates_container(value) {
            return;
        }
        if bound.contains(&var.name) {
            diagnostics.push(
                Diagnostic::warning(
                    ErrorCode::MissingRelease,
                    format!(
                        "'{}' is re-bound to a new container while the previous one is still live",
                        var.name
                    ),
                    location,
                )
                .with_suggestion("clear the existing container instead of re-binding it"),
            );
        } else {
            bound.insert(var.name.clone());
        }
    });
}

/// Check if the expression allocates a fresh container
fn allocates_container(expr: &Expression) -> bool {
    match expr {
        Expression::ListDisplay(_)
        | Expression::DictDisplay(_)
        | Expression::SetDisplay(_)
        | Expression::ListComp(_)
        | Expression::DictComp(_)
        | Expression::SetComp(_) => true,
        Expression::Call(call) => matches!(
            call.callee_name(),
            Some("list") | Some("dict") | Some("set")
        ),
        _ => false,
    }
}

// ----- MS004 -----

/// Flags returns of an interior container reference
///
/// Returning `self.items` (or any attribute of container type) hands the
/// caller a view into storage owned by the object.
fn check_interior_returns(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    each_statement(&func.body, &mut |stmt| {
        if let Statement::Return(ret) = stmt {
            if let Some(Expression::Attribute(attr)) = &ret.value {
                if attr.ty.container_kind().is_some() {
                    diagnostics.push(
                        Diagnostic::warning(
                            ErrorCode::LocalReferenceReturn,
                            format!(
                                "returning the interior container '{}' exposes object-owned storage",
                                attr.name
                            ),
                            ret.location,
                        )
                        .with_suggestion("return a copy of the container"),
                    );
                }
            }
        }
    });
}
