//! Per-parameter immutability analysis
//!
//! Classifies every function parameter as Immutable, ReadOnly, or
//! Mutable from AST inspection alone. Targets that distinguish shared
//! from exclusive references consume the result during generation;
//! garbage-collected targets ignore it for codegen but the constraint
//! checker still uses it for stylistic advice.

use mgen_ir::ast::{Declaration, Expression, FunctionDef, Module, Statement};
use mgen_shared::CompilationContext;
use mgen_types::Mutability;
use std::collections::HashSet;

/// Classifies the parameters of every function in the module
///
/// Results are stored in the context keyed by function name; methods are
/// keyed as `Class.method`.
pub fn analyze(module: &Module, context: &mut CompilationContext) {
    for decl in &module.declarations {
        match decl {
            Declaration::Function(func) => analyze_function(func, &func.name, context),
            Declaration::Class(class) => {
                for method in &class.methods {
                    let key = format!("{}.{}", class.name, method.name);
                    analyze_function(method, &key, context);
                }
            }
            _ => {}
        }
    }
}

fn analyze_function(func: &FunctionDef, key: &str, context: &mut CompilationContext) {
    let mutated = collect_mutated_names(&func.body);

    for param in &func.parameters {
        // Type-based short circuit: value-immutable types need no body
        // inspection
        let class = if param.annotation.is_value_immutable() && param.name != "self" {
            Mutability::Immutable
        } else if mutated.contains(param.name.as_str()) {
            Mutability::Mutable
        } else {
            Mutability::ReadOnly
        };
        context.set_mutability(key, &param.name, class);
    }
}

/// Collects every name the body mutates
///
/// A name counts as mutated when it is re-bound, is the receiver of a
/// mutating container method, has a subscript or attribute stored
/// through it, or is the target of an augmented assignment.
fn collect_mutated_names(body: &[Statement]) -> HashSet<String> {
    let mut mutated = HashSet::new();
    scan_block(body, &mut mutated);
    mutated
}

fn scan_block(statements: &[Statement], mutated: &mut HashSet<String>) {
    for stmt in statements {
        scan_statement(stmt, mutated);
    }
}

fn scan_statement(stmt: &Statement, mutated: &mut HashSet<String>) {
    match stmt {
        Statement::Assign(assign) => {
            mark_store_target(&assign.target, mutated);
            scan_expression(&assign.value, mutated);
        }
        Statement::AugAssign(aug) => {
            mark_store_target(&aug.target, mutated);
            scan_expression(&aug.value, mutated);
        }
        Statement::AnnAssign(ann) => {
            mark_store_target(&ann.target, mutated);
            if let Some(value) = &ann.value {
                scan_expression(value, mutated);
            }
        }
        Statement::If(if_stmt) => {
            scan_expression(&if_stmt.condition, mutated);
            scan_block(&if_stmt.then_branch, mutated);
            scan_block(&if_stmt.else_branch, mutated);
        }
        Statement::While(while_stmt) => {
            scan_expression(&while_stmt.condition, mutated);
            scan_block(&while_stmt.body, mutated);
        }
        Statement::For(for_stmt) => {
            scan_expression(&for_stmt.iterable, mutated);
            scan_block(&for_stmt.body, mutated);
        }
        Statement::Return(ret) => {
            if let Some(value) = &ret.value {
                scan_expression(value, mutated);
            }
        }
        Statement::Expression(expr_stmt) => {
            scan_expression(&expr_stmt.expression, mutated);
        }
        Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => {}
    }
}

/// Marks the root name of a store target as mutated
fn mark_store_target(target: &Expression, mutated: &mut HashSet<String>) {
    match target {
        Expression::Variable(var) => {
            mutated.insert(var.name.clone());
        }
        Expression::Subscript(sub) => mark_store_target(&sub.object, mutated),
        Expression::Attribute(attr) => mark_store_target(&attr.object, mutated),
        _ => {}
    }
}

/// Scans an expression for mutating method calls
fn scan_expression(expr: &Expression, mutated: &mut HashSet<String>) {
    match expr {
        Expression::Call(call) => {
            if let Some((receiver, method)) = call.method_parts() {
                if let Some(kind) = receiver.ty().container_kind() {
                    if kind.is_mutating_method(method) {
                        mark_store_target(receiver, mutated);
                    }
                } else if matches!(receiver.ty(), mgen_types::SemanticType::Object(_)) {
                    // A method may mutate its receiver; without
                    // interprocedural analysis the receiver counts as
                    // mutated unless the method body proves otherwise
                    mark_store_target(receiver, mutated);
                }
            }
            scan_expression(&call.function, mutated);
            for arg in &call.arguments {
                scan_expression(arg, mutated);
            }
        }
        Expression::Binary(bin) => {
            scan_expression(&bin.left, mutated);
            scan_expression(&bin.right, mutated);
        }
        Expression::Unary(unary) => scan_expression(&unary.operand, mutated),
        Expression::Boolean(boolean) => {
            scan_expression(&boolean.left, mutated);
            scan_expression(&boolean.right, mutated);
        }
        Expression::Comparison(cmp) => {
            scan_expression(&cmp.left, mutated);
            scan_expression(&cmp.right, mutated);
        }
        Expression::Attribute(attr) => scan_expression(&attr.object, mutated),
        Expression::Subscript(sub) => {
            scan_expression(&sub.object, mutated);
            scan_expression(&sub.index, mutated);
        }
        Expression::ListDisplay(list) => {
            for elem in &list.elements {
                scan_expression(elem, mutated);
            }
        }
        Expression::SetDisplay(set) => {
            for elem in &set.elements {
                scan_expression(elem, mutated);
            }
        }
        Expression::DictDisplay(dict) => {
            for key in &dict.keys {
                scan_expression(key, mutated);
            }
            for value in &dict.values {
                scan_expression(value, mutated);
            }
        }
        Expression::TupleDisplay(tuple) => {
            for elem in &tuple.elements {
                scan_expression(elem, mutated);
            }
        }
        Expression::ListComp(comp) => {
            scan_expression(&comp.element, mutated);
            scan_expression(&comp.generator.iterable, mutated);
        }
        Expression::SetComp(comp) => {
            scan_expression(&comp.element, mutated);
            scan_expression(&comp.generator.iterable, mutated);
        }
        Expression::DictComp(comp) => {
            scan_expression(&comp.key, mutated);
            scan_expression(&comp.value, mutated);
            scan_expression(&comp.generator.iterable, mutated);
        }
        Expression::Literal(_) | Expression::Variable(_) => {}
    }
}
