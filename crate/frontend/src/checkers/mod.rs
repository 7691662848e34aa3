//! Constraint and memory-safety checkers
//!
//! Run after inference as part of the Analysis phase. The universal rules
//! (TS/SA/CC codes) apply to every target; the memory-safety rules (MS
//! codes) only to the targets whose output manages memory by hand. The
//! checkers emit diagnostics but never mutate the AST.

pub mod constraint;
pub mod memory_safety;

use mgen_ir::ast::{Expression, Module, Statement};
use mgen_shared::{CompilationContext, Diagnostic};
use mgen_types::{Config, Target};

/// Runs every checker applicable to the configured target
pub fn run_all(
    module: &Module,
    context: &CompilationContext,
    config: &Config,
) -> Vec<Diagnostic> {
    let mut diagnostics = constraint::check(module, context, config);
    if matches!(config.target, Target::C | Target::Cpp) {
        diagnostics.extend(memory_safety::check(module));
    }
    diagnostics
}

/// Applies `f` to every statement in the block, recursing into nested
/// blocks
pub(crate) fn each_statement<'a>(statements: &'a [Statement], f: &mut dyn FnMut(&'a Statement)) {
    for stmt in statements {
        f(stmt);
        match stmt {
            Statement::If(if_stmt) => {
                each_statement(&if_stmt.then_branch, f);
                each_statement(&if_stmt.else_branch, f);
            }
            Statement::While(while_stmt) => each_statement(&while_stmt.body, f),
            Statement::For(for_stmt) => each_statement(&for_stmt.body, f),
            _ => {}
        }
    }
}

/// Applies `f` to every expression node reachable from the block,
/// including nested subexpressions
pub(crate) fn each_expression<'a>(statements: &'a [Statement], f: &mut dyn FnMut(&'a Expression)) {
    each_statement(statements, &mut |stmt| match stmt {
        Statement::Assign(assign) => {
            walk_expression(&assign.target, f);
            walk_expression(&assign.value, f);
        }
        Statement::AugAssign(aug) => {
            walk_expression(&aug.target, f);
            walk_expression(&aug.value, f);
        }
        Statement::AnnAssign(ann) => {
            walk_expression(&ann.target, f);
            if let Some(value) = &ann.value {
                walk_expression(value, f);
            }
        }
        Statement::If(if_stmt) => walk_expression(&if_stmt.condition, f),
        Statement::While(while_stmt) => walk_expression(&while_stmt.condition, f),
        Statement::For(for_stmt) => walk_expression(&for_stmt.iterable, f),
        Statement::Return(ret) => {
            if let Some(value) = &ret.value {
                walk_expression(value, f);
            }
        }
        Statement::Expression(expr_stmt) => walk_expression(&expr_stmt.expression, f),
        Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => {}
    });
}

/// Applies `f` to an expression and all of its subexpressions
pub(crate) fn walk_expression<'a>(expr: &'a Expression, f: &mut dyn FnMut(&'a Expression)) {
    f(expr);
    match expr {
        Expression::Binary(bin) => {
            walk_expression(&bin.left, f);
            walk_expression(&bin.right, f);
        }
        Expression::Unary(unary) => walk_expression(&unary.operand, f),
        Expression::Boolean(boolean) => {
            walk_expression(&boolean.left, f);
            walk_expression(&boolean.right, f);
        }
        Expression::Comparison(cmp) => {
            walk_expression(&cmp.left, f);
            walk_expression(&cmp.right, f);
        }
        Expression::Call(call) => {
            walk_expression(&call.function, f);
            for arg in &call.arguments {
                walk_expression(arg, f);
            }
        }
        Expression::Attribute(attr) => walk_expression(&attr.object, f),
        Expression::Subscript(sub) => {
            walk_expression(&sub.object, f);
            walk_expression(&sub.index, f);
        }
        Expression::ListDisplay(list) => {
            for elem in &list.elements {
                walk_expression(elem, f);
            }
        }
        Expression::SetDisplay(set) => {
            for elem in &set.elements {
                walk_expression(elem, f);
            }
        }
        Expression::DictDisplay(dict) => {
            for key in &dict.keys {
                walk_expression(key, f);
            }
            for value in &dict.values {
                walk_expression(value, f);
            }
        }
        Expression::TupleDisplay(tuple) => {
            for elem in &tuple.elements {
                walk_expression(elem, f);
            }
        }
        Expression::ListComp(comp) => {
            walk_expression(&comp.element, f);
            walk_expression(&comp.generator.iterable, f);
            if let Some(condition) = &comp.generator.condition {
                walk_expression(condition, f);
            }
        }
        Expression::SetComp(comp) => {
            walk_expression(&comp.element, f);
            walk_expression(&comp.generator.iterable, f);
            if let Some(condition) = &comp.generator.condition {
                walk_expression(condition, f);
            }
        }
        Expression::DictComp(comp) => {
            walk_expression(&comp.key, f);
            walk_expression(&comp.value, f);
            walk_expression(&comp.generator.iterable, f);
            if let Some(condition) = &comp.generator.condition {
                walk_expression(condition, f);
            }
        }
        Expression::Literal(_) | Expression::Variable(_) => {}
    }
}
