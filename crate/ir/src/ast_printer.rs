//! Debugging dump of the typed AST as an indented tree
//!
//! Only compiled with the `print-ast` feature.

use crate::ast::{
    BindingTarget, Declaration, Expression, LiteralValue, Module, Statement,
};

/// Prints a module as an indented tree to standard output
pub fn print_module(module: &Module) {
    println!("Module");
    for decl in &module.declarations {
        print_declaration(decl, 1);
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn print_declaration(decl: &Declaration, depth: usize) {
    match decl {
        Declaration::Function(func) => {
            println!(
                "{}Function {} -> {}",
                indent(depth),
                func.name,
                func.return_type
            );
            for param in &func.parameters {
                println!("{}param {}: {}", indent(depth + 1), param.name, param.annotation);
            }
            for stmt in &func.body {
                print_statement(stmt, depth + 1);
            }
        }
        Declaration::Class(class) => {
            println!("{}Class {}", indent(depth), class.name);
            for method in &class.methods {
                print_declaration(&Declaration::Function(method.clone()), depth + 1);
            }
        }
        Declaration::GlobalVar(var) => {
            println!("{}Global {}: {}", indent(depth), var.name, var.annotation);
            print_expression(&var.value, depth + 1);
        }
        Declaration::Import(import) => {
            println!("{}Import {}", indent(depth), import.module);
        }
    }
}

fn print_statement(stmt: &Statement, depth: usize) {
    match stmt {
        Statement::Assign(assign) => {
            println!("{}Assign", indent(depth));
            print_expression(&assign.target, depth + 1);
            print_expression(&assign.value, depth + 1);
        }
        Statement::AugAssign(aug) => {
            println!("{}AugAssign {}=", indent(depth), aug.operator);
            print_expression(&aug.target, depth + 1);
            print_expression(&aug.value, depth + 1);
        }
        Statement::AnnAssign(ann) => {
            println!("{}AnnAssign : {}", indent(depth), ann.annotation);
            print_expression(&ann.target, depth + 1);
            if let Some(value) = &ann.value {
                print_expression(value, depth + 1);
            }
        }
        Statement::If(if_stmt) => {
            println!("{}If", indent(depth));
            print_expression(&if_stmt.condition, depth + 1);
            for stmt in &if_stmt.then_branch {
                print_statement(stmt, depth + 1);
            }
            if !if_stmt.else_branch.is_empty() {
                println!("{}Else", indent(depth));
                for stmt in &if_stmt.else_branch {
                    print_statement(stmt, depth + 1);
                }
            }
        }
        Statement::While(while_stmt) => {
            println!("{}While", indent(depth));
            print_expression(&while_stmt.condition, depth + 1);
            for stmt in &while_stmt.body {
                print_statement(stmt, depth + 1);
            }
        }
        Statement::For(for_stmt) => {
            println!("{}For {}", indent(depth), target_names(&for_stmt.target));
            print_expression(&for_stmt.iterable, depth + 1);
            for stmt in &for_stmt.body {
                print_statement(stmt, depth + 1);
            }
        }
        Statement::Return(ret) => {
            println!("{}Return", indent(depth));
            if let Some(value) = &ret.value {
                print_expression(value, depth + 1);
            }
        }
        Statement::Expression(expr_stmt) => {
            println!("{}Expr", indent(depth));
            print_expression(&expr_stmt.expression, depth + 1);
        }
        Statement::Pass(_) => println!("{}Pass", indent(depth)),
        Statement::Break(_) => println!("{}Break", indent(depth)),
        Statement::Continue(_) => println!("{}Continue", indent(depth)),
    }
}

fn target_names(target: &BindingTarget) -> String {
    match target {
        BindingTarget::Name(name) => name.clone(),
        BindingTarget::Pair(first, second) => format!("{}, {}", first, second),
    }
}

fn print_expression(expr: &Expression, depth: usize) {
    match expr {
        Expression::Literal(lit) => {
            let rendered = match &lit.value {
                LiteralValue::Int(value) => value.to_string(),
                LiteralValue::Float(value) => value.to_string(),
                LiteralValue::Bool(value) => value.to_string(),
                LiteralValue::Str(value) => format!("{:?}", value),
                LiteralValue::None => "None".to_string(),
            };
            println!("{}Literal {} : {}", indent(depth), rendered, lit.ty);
        }
        Expression::Variable(var) => {
            println!("{}Var {} : {}", indent(depth), var.name, var.ty);
        }
        Expression::Binary(bin) => {
            println!("{}Binary {} : {}", indent(depth), bin.operator, bin.ty);
            print_expression(&bin.left, depth + 1);
            print_expression(&bin.right, depth + 1);
        }
        Expression::Unary(unary) => {
            println!("{}Unary {} : {}", indent(depth), unary.operator, unary.ty);
            print_expression(&unary.operand, depth + 1);
        }
        Expression::Boolean(boolean) => {
            println!("{}Bool {} : {}", indent(depth), boolean.operator, boolean.ty);
            print_expression(&boolean.left, depth + 1);
            print_expression(&boolean.right, depth + 1);
        }
        Expression::Comparison(cmp) => {
            println!("{}Compare {} : {}", indent(depth), cmp.operator, cmp.ty);
            print_expression(&cmp.left, depth + 1);
            print_expression(&cmp.right, depth + 1);
        }
        Expression::Call(call) => {
            println!("{}Call : {}", indent(depth), call.ty);
            print_expression(&call.function, depth + 1);
            for arg in &call.arguments {
                print_expression(arg, depth + 1);
            }
        }
        Expression::Attribute(attr) => {
            println!("{}Attribute .{} : {}", indent(depth), attr.name, attr.ty);
            print_expression(&attr.object, depth + 1);
        }
        Expression::Subscript(sub) => {
            println!("{}Subscript : {}", indent(depth), sub.ty);
            print_expression(&sub.object, depth + 1);
            print_expression(&sub.index, depth + 1);
        }
        Expression::ListDisplay(list) => {
            println!("{}List : {}", indent(depth), list.ty);
            for elem in &list.elements {
                print_expression(elem, depth + 1);
            }
        }
        Expression::DictDisplay(dict) => {
            println!("{}Dict : {}", indent(depth), dict.ty);
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                print_expression(key, depth + 1);
                print_expression(value, depth + 2);
            }
        }
        Expression::SetDisplay(set) => {
            println!("{}Set : {}", indent(depth), set.ty);
            for elem in &set.elements {
                print_expression(elem, depth + 1);
            }
        }
        Expression::TupleDisplay(tuple) => {
            println!("{}Tuple : {}", indent(depth), tuple.ty);
            for elem in &tuple.elements {
                print_expression(elem, depth + 1);
            }
        }
        Expression::ListComp(comp) => {
            println!("{}ListComp : {}", indent(depth), comp.ty);
            print_expression(&comp.element, depth + 1);
            print_expression(&comp.generator.iterable, depth + 1);
        }
        Expression::DictComp(comp) => {
            println!("{}DictComp : {}", indent(depth), comp.ty);
            print_expression(&comp.key, depth + 1);
            print_expression(&comp.value, depth + 1);
            print_expression(&comp.generator.iterable, depth + 1);
        }
        Expression::SetComp(comp) => {
            println!("{}SetComp : {}", indent(depth), comp.ty);
            print_expression(&comp.element, depth + 1);
            print_expression(&comp.generator.iterable, depth + 1);
        }
    }
}
