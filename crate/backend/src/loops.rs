//! Loop-conversion strategy classification
//!
//! Inspects a `for` loop and decides, in priority order, which emission
//! strategy applies. The iteration source (a `range(...)` header versus a
//! container) and the body shape (accumulation, append-build, nested
//! build, or general) are classified independently: imperative targets
//! mostly care about the source, functional targets about both.
//!
//! Append-build recognition is deliberately narrow: only a
//! single-statement body with a single `append` call on a single output
//! list qualifies. Loops feeding two independent lists fall through to
//! the general strategy.

use mgen_ir::ast::{
    BinaryOperator, BindingTarget, Expression, ForStatement, Statement,
};

/// Where the loop's values come from
pub enum IterationSource<'a> {
    /// `for i in range(...)` with 1, 2, or 3 arguments
    Range(&'a [Expression]),
    /// Iteration over a container expression
    Container(&'a Expression),
}

/// The recognized shape of the loop body
pub enum BodyPattern<'a> {
    /// The body only folds values into one accumulator with an
    /// associative operator
    Accumulate {
        accumulator: &'a str,
        operator: BinaryOperator,
        value: &'a Expression,
    },
    /// The body only appends one element per iteration to one list
    AppendBuild {
        list: &'a str,
        element: &'a Expression,
    },
    /// Two nested loops, each append-building into the same list
    NestedBuild {
        inner: &'a ForStatement,
        list: &'a str,
        element: &'a Expression,
    },
    /// Anything else
    General,
}

/// The full classification of one `for` loop
pub struct LoopShape<'a> {
    pub source: IterationSource<'a>,
    pub body: BodyPattern<'a>,
}

/// Classifies a `for` loop against the strategy table
pub fn classify(for_stmt: &ForStatement) -> LoopShape<'_> {
    let source = match &for_stmt.iterable {
        Expression::Call(call) if call.callee_name() == Some("range") => {
            IterationSource::Range(&call.arguments)
        }
        other => IterationSource::Container(other),
    };

    let body = classify_body(for_stmt);

    LoopShape { source, body }
}

/// Classifies the body; the most specific pattern wins
fn classify_body(for_stmt: &ForStatement) -> BodyPattern<'_> {
    let [only] = for_stmt.body.as_slice() else {
        return BodyPattern::General;
    };

    // Nested build: the single statement is itself a loop whose single
    // statement appends
    if let Statement::For(inner) = only {
        if let Some((list, element)) = single_append(&inner.body) {
            return BodyPattern::NestedBuild {
                inner,
                list,
                element,
            };
        }
        return BodyPattern::General;
    }

    if let Some((list, element)) = single_append(std::slice::from_ref(only)) {
        return BodyPattern::AppendBuild { list, element };
    }

    if let Some(pattern) = accumulation(only, &for_stmt.target) {
        return pattern;
    }

    BodyPattern::General
}

/// Matches a single-statement body consisting of `list.append(element)`
fn single_append(body: &[Statement]) -> Option<(&str, &Expression)> {
    let [Statement::Expression(expr_stmt)] = body else {
        return None;
    };
    let Expression::Call(call) = &expr_stmt.expression else {
        return None;
    };
    let (receiver, method) = call.method_parts()?;
    if method != "append" || call.arguments.len() != 1 {
        return None;
    }
    let Expression::Variable(list) = receiver else {
        return None;
    };
    Some((&list.name, &call.arguments[0]))
}

/// Matches an accumulator statement: `acc += value`, `acc *= value`, or
/// the spelled-out `acc = acc <op> value`
fn accumulation<'a>(stmt: &'a Statement, target: &BindingTarget) -> Option<BodyPattern<'a>> {
    let (accumulator, operator, value) = match stmt {
        Statement::AugAssign(aug) => {
            let Expression::Variable(var) = &aug.target else {
                return None;
            };
            (&var.name, aug.operator, &aug.value)
        }
        Statement::Assign(assign) => {
            let Expression::Variable(var) = &assign.target else {
                return None;
            };
            let Expression::Binary(bin) = &assign.value else {
                return None;
            };
            let Expression::Variable(left) = bin.left.as_ref() else {
                return None;
            };
            if left.name != var.name {
                return None;
            }
            (&var.name, bin.operator, bin.right.as_ref())
        }
        _ => return None,
    };

    // The accumulator must be distinct from the loop variable and the
    // operator associative
    if target.single_name() == Some(accumulator.as_str()) {
        return None;
    }
    if !matches!(
        operator,
        BinaryOperator::Add
            | BinaryOperator::Multiply
            | BinaryOperator::BitAnd
            | BinaryOperator::BitOr
            | BinaryOperator::BitXor
    ) {
        return None;
    }

    Some(BodyPattern::Accumulate {
        accumulator,
        operator,
        value,
    })
}
