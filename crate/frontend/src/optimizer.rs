//! Source-level optimizer
//!
//! Optional pipeline phase, gated by the compile-time-optimization switch
//! and an optimization level of at least `basic`. Folds constant integer,
//! float, and boolean expressions and prunes `if True:`/`if False:`
//! branches. The pass preserves algorithmic structure: it never reorders
//! statements or rewrites loops.

use mgen_ir::ast::{
    BinaryOperator, BoolOperator, Declaration, Expression, LiteralExpr, LiteralValue, Module,
    Statement, UnaryOperator,
};
use mgen_types::SemanticType;

/// Folds constants across the module, returning the number of rewrites
pub fn fold_module(module: &mut Module) -> usize {
    let mut folded = 0;
    for decl in &mut module.declarations {
        match decl {
            Declaration::Function(func) => folded += fold_block(&mut func.body),
            Declaration::Class(class) => {
                for method in &mut class.methods {
                    folded += fold_block(&mut method.body);
                }
            }
            Declaration::GlobalVar(var) => folded += fold_expression(&mut var.value),
            Declaration::Import(_) => {}
        }
    }
    folded
}

fn fold_block(statements: &mut Vec<Statement>) -> usize {
    let mut folded = 0;

    for stmt in statements.iter_mut() {
        folded += fold_statement(stmt);
    }

    // Prune branches with literal conditions
    let mut pruned = Vec::with_capacity(statements.len());
    for stmt in statements.drain(..) {
        match stmt {
            Statement::If(if_stmt) if literal_bool(&if_stmt.condition) == Some(true) => {
                folded += 1;
                pruned.extend(if_stmt.then_branch);
            }
            Statement::If(if_stmt) if literal_bool(&if_stmt.condition) == Some(false) => {
                folded += 1;
                pruned.extend(if_stmt.else_branch);
            }
            other => pruned.push(other),
        }
    }
    *statements = pruned;

    folded
}

fn fold_statement(stmt: &mut Statement) -> usize {
    match stmt {
        Statement::Assign(assign) => fold_expression(&mut assign.value),
        Statement::AugAssign(aug) => fold_expression(&mut aug.value),
        Statement::AnnAssign(ann) => ann
            .value
            .as_mut()
            .map(fold_expression)
            .unwrap_or(0),
        Statement::If(if_stmt) => {
            fold_expression(&mut if_stmt.condition)
                + fold_block(&mut if_stmt.then_branch)
                + fold_block(&mut if_stmt.else_branch)
        }
        Statement::While(while_stmt) => {
            fold_expression(&mut while_stmt.condition) + fold_block(&mut while_stmt.body)
        }
        Statement::For(for_stmt) => {
            fold_expression(&mut for_stmt.iterable) + fold_block(&mut for_stmt.body)
        }
        Statement::Return(ret) => ret.value.as_mut().map(fold_expression).unwrap_or(0),
        Statement::Expression(expr_stmt) => fold_expression(&mut expr_stmt.expression),
        Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => 0,
    }
}

fn fold_expression(expr: &mut Expression) -> usize {
    let mut folded = match expr {
        Expression::Binary(bin) => {
            fold_expression(&mut bin.left) + fold_expression(&mut bin.right)
        }
        Expression::Unary(unary) => fold_expression(&mut unary.operand),
        Expression::Boolean(boolean) => {
            fold_expression(&mut boolean.left) + fold_expression(&mut boolean.right)
        }
        Expression::Comparison(cmp) => {
            fold_expression(&mut cmp.left) + fold_expression(&mut cmp.right)
        }
        Expression::Call(call) => {
            let mut count = 0;
            for arg in &mut call.arguments {
                count += fold_expression(arg);
            }
            count
        }
        Expression::Subscript(sub) => {
            fold_expression(&mut sub.object) + fold_expression(&mut sub.index)
        }
        Expression::ListDisplay(list) => {
            list.elements.iter_mut().map(fold_expression).sum()
        }
        Expression::SetDisplay(set) => set.elements.iter_mut().map(fold_expression).sum(),
        Expression::DictDisplay(dict) => {
            let keys: usize = dict.keys.iter_mut().map(fold_expression).sum();
            let values: usize = dict.values.iter_mut().map(fold_expression).sum();
            keys + values
        }
        Expression::TupleDisplay(tuple) => {
            tuple.elements.iter_mut().map(fold_expression).sum()
        }
        _ => 0,
    };

    if let Some(replacement) = fold_node(expr) {
        *expr = replacement;
        folded += 1;
    }
    folded
}

/// The folded literal replacing this node, when its operands are literal
fn fold_node(expr: &Expression) -> Option<Expression> {
    match expr {
        Expression::Binary(bin) => {
            let (Expression::Literal(left), Expression::Literal(right)) =
                (bin.left.as_ref(), bin.right.as_ref())
            else {
                return None;
            };
            let value = match (&left.value, &right.value) {
                (LiteralValue::Int(a), LiteralValue::Int(b)) => fold_int(bin.operator, *a, *b)?,
                (LiteralValue::Float(a), LiteralValue::Float(b)) => {
                    LiteralValue::Float(fold_float(bin.operator, *a, *b)?)
                }
                _ => return None,
            };
            let ty = match &value {
                LiteralValue::Int(_) => SemanticType::Int,
                LiteralValue::Float(_) => SemanticType::Float,
                _ => bin.ty.clone(),
            };
            Some(Expression::Literal(LiteralExpr {
                value,
                ty,
                location: bin.location,
            }))
        }
        Expression::Unary(unary) => {
            let Expression::Literal(lit) = unary.operand.as_ref() else {
                return None;
            };
            let value = match (unary.operator, &lit.value) {
                (UnaryOperator::Negate, LiteralValue::Int(v)) => {
                    LiteralValue::Int(v.checked_neg()?)
                }
                (UnaryOperator::Negate, LiteralValue::Float(v)) => LiteralValue::Float(-v),
                (UnaryOperator::Not, LiteralValue::Bool(v)) => LiteralValue::Bool(!v),
                (UnaryOperator::Invert, LiteralValue::Int(v)) => LiteralValue::Int(!v),
                _ => return None,
            };
            let ty = lit.ty.clone();
            Some(Expression::Literal(LiteralExpr {
                value,
                ty,
                location: unary.location,
            }))
        }
        Expression::Boolean(boolean) => {
            let (Expression::Literal(left), Expression::Literal(right)) =
                (boolean.left.as_ref(), boolean.right.as_ref())
            else {
                return None;
            };
            let (LiteralValue::Bool(a), LiteralValue::Bool(b)) = (&left.value, &right.value)
            else {
                return None;
            };
            let value = match boolean.operator {
                BoolOperator::And => *a && *b,
                BoolOperator::Or => *a || *b,
            };
            Some(Expression::Literal(LiteralExpr {
                value: LiteralValue::Bool(value),
                ty: SemanticType::Bool,
                location: boolean.location,
            }))
        }
        _ => None,
    }
}

fn fold_int(operator: BinaryOperator, a: i64, b: i64) -> Option<LiteralValue> {
    let value = match operator {
        BinaryOperator::Add => a.checked_add(b)?,
        BinaryOperator::Subtract => a.checked_sub(b)?,
        BinaryOperator::Multiply => a.checked_mul(b)?,
        // True division leaves the int domain
        BinaryOperator::Divide => {
            if b == 0 {
                return None;
            }
            return Some(LiteralValue::Float(a as f64 / b as f64));
        }
        BinaryOperator::FloorDivide => {
            if b == 0 {
                return None;
            }
            a.checked_div_euclid(b)?
        }
        BinaryOperator::Modulo => {
            if b == 0 {
                return None;
            }
            a.checked_rem_euclid(b)?
        }
        BinaryOperator::Power => {
            let exp = u32::try_from(b).ok()?;
            a.checked_pow(exp)?
        }
        BinaryOperator::BitAnd => a & b,
        BinaryOperator::BitOr => a | b,
        BinaryOperator::BitXor => a ^ b,
        BinaryOperator::ShiftLeft => a.checked_shl(u32::try_from(b).ok()?)?,
        BinaryOperator::ShiftRight => a.checked_shr(u32::try_from(b).ok()?)?,
    };
    Some(LiteralValue::Int(value))
}

fn fold_float(operator: BinaryOperator, a: f64, b: f64) -> Option<f64> {
    let value = match operator {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => {
            if b == 0.0 {
                return None;
            }
            a / b
        }
        BinaryOperator::FloorDivide => {
            if b == 0.0 {
                return None;
            }
            (a / b).floor()
        }
        BinaryOperator::Power => a.powf(b),
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn literal_bool(expr: &Expression) -> Option<bool> {
    match expr {
        Expression::Literal(lit) => match lit.value {
            LiteralValue::Bool(value) => Some(value),
            _ => None,
        },
        _ => None,
    }
}
