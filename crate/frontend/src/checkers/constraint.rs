//! Universal constraint checker (TS, SA, and CC rules)
//!
//! | Code  | Rule                                              | Severity |
//! |-------|---------------------------------------------------|----------|
//! | TS001 | Type consistency in binary operations             | error    |
//! | TS002 | Lossy implicit conversion (float into int)        | warning  |
//! | TS003 | Division by a provably-zero literal               | error    |
//! | TS004 | Integer literal outside the target's int range    | warning  |
//! | SA001 | Unreachable code after return/break/continue      | warning  |
//! | SA002 | Bound but never used local                        | info     |
//! | SA005 | ReadOnly parameter with a mutable annotation      | info     |
//! | CC004 | Cyclomatic complexity above 10                    | warning  |

use super::{each_expression, each_statement};
use crate::semantic_analysis::operations;
use mgen_error::ErrorCode;
use mgen_ir::ast::{
    AnnAssignStatement, AssignStatement, AttributeExpr, AugAssignStatement, BinaryExpr,
    BinaryOperator, BindingTarget, BooleanExpr, CallExpr, ComparisonExpr, Declaration,
    DictCompExpr, DictExpr, Expression, ExpressionStatement, ForStatement, FunctionDef,
    IfStatement, ListCompExpr, ListExpr, LiteralExpr, LiteralValue, Module, ReturnStatement,
    SetCompExpr, SetExpr, Statement, SubscriptExpr, TupleExpr, UnaryExpr, VariableExpr,
    WhileStatement,
};
use mgen_ir::{SourceLocation, Visitor};
use mgen_shared::{CompilationContext, Diagnostic};
use mgen_types::{Config, Mutability, SemanticType};
use std::collections::{HashMap, HashSet};

/// The complexity threshold above which CC004 fires
const COMPLEXITY_THRESHOLD: usize = 10;

/// Runs every universal rule over the module
pub fn check(
    module: &Module,
    context: &CompilationContext,
    config: &Config,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for decl in &module.declarations {
        match decl {
            Declaration::Function(func) => {
                check_function(func, &func.name, context, config, &mut diagnostics);
            }
            Declaration::Class(class) => {
                for method in &class.methods {
                    let key = format!("{}.{}", class.name, method.name);
                    check_function(method, &key, context, config, &mut diagnostics);
                }
            }
            Declaration::GlobalVar(var) => {
                check_expression_rules(
                    std::slice::from_ref(&Statement::Expression(ExpressionStatement {
                        expression: var.value.clone(),
                        location: var.location,
                    })),
                    context,
                    config,
                    &mut diagnostics,
                );
            }
            Declaration::Import(_) => {}
        }
    }

    diagnostics
}

fn check_function(
    func: &FunctionDef,
    key: &str,
    context: &CompilationContext,
    config: &Config,
    diagnostics: &mut Vec<Diagnostic>,
) {
    check_complexity(func, diagnostics);
    check_unreachable(&func.body, diagnostics);
    check_unused_locals(func, diagnostics);
    check_readonly_parameters(func, key, context, diagnostics);
    check_expression_rules(&func.body, context, config, diagnostics);
    check_lossy_returns(func, diagnostics);
}

// ----- TS001 / TS002 / TS003 / TS004 -----

fn check_expression_rules(
    body: &[Statement],
    context: &CompilationContext,
    config: &Config,
    diagnostics: &mut Vec<Diagnostic>,
) {
    each_expression(body, &mut |expr| match expr {
        Expression::Binary(bin) => {
            check_binary_consistency(bin, diagnostics);
            check_zero_division(bin, diagnostics);
        }
        Expression::Literal(lit) => check_integer_range(lit, config, diagnostics),
        Expression::Call(call) => check_lossy_arguments(call, context, diagnostics),
        _ => {}
    });

    each_statement(body, &mut |stmt| match stmt {
        Statement::AnnAssign(ann) => {
            if let Some(value) = &ann.value {
                check_lossy_store(&ann.annotation, value, ann.location, diagnostics);
            }
        }
        Statement::Assign(assign) => {
            check_lossy_store(assign.target.ty(), &assign.value, assign.location, diagnostics);
        }
        _ => {}
    });
}

/// TS001: both operand types known and the join table rejects the pair
fn check_binary_consistency(bin: &BinaryExpr, diagnostics: &mut Vec<Diagnostic>) {
    let left = bin.left.ty();
    let right = bin.right.ty();
    if matches!(left, SemanticType::Unknown) || matches!(right, SemanticType::Unknown) {
        return;
    }
    if operations::binary_result_type(bin.operator, left, right).is_err() {
        diagnostics.push(Diagnostic::error(
            ErrorCode::BinaryTypeConsistency,
            format!(
                "cannot apply '{}' to operands of type '{}' and '{}'",
                bin.operator, left, right
            ),
            bin.location,
        ));
    }
}

/// TS003: the divisor is a literal zero
fn check_zero_division(bin: &BinaryExpr, diagnostics: &mut Vec<Diagnostic>) {
    if !matches!(
        bin.operator,
        BinaryOperator::Divide | BinaryOperator::FloorDivide | BinaryOperator::Modulo
    ) {
        return;
    }
    let is_zero = match bin.right.as_ref() {
        Expression::Literal(lit) => match &lit.value {
            LiteralValue::Int(value) => *value == 0,
            LiteralValue::Float(value) => *value == 0.0,
            _ => false,
        },
        _ => false,
    };
    if is_zero {
        diagnostics.push(
            Diagnostic::error(
                ErrorCode::DivisionByZero,
                format!("'{}' divides by a literal zero", bin.operator),
                bin.location,
            )
            .with_suggestion("guard the division with a zero check"),
        );
    }
}

/// TS004: integer literal outside the target's native int range
fn check_integer_range(lit: &LiteralExpr, config: &Config, diagnostics: &mut Vec<Diagnostic>) {
    let LiteralValue::Int(value) = lit.value else {
        return;
    };
    let width = config.target.int_bit_width();
    if width >= 64 {
        return;
    }
    let max = (1i64 << (width - 1)) - 1;
    let min = -(1i64 << (width - 1));
    if value > max || value < min {
        diagnostics.push(Diagnostic::warning(
            ErrorCode::IntegerRange,
            format!(
                "integer literal {} does not fit the target's {}-bit native int",
                value, width
            ),
            lit.location,
        ));
    }
}

/// TS002 on stores: a float value flowing into an int slot
fn check_lossy_store(
    slot: &SemanticType,
    value: &Expression,
    location: SourceLocation,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if matches!(slot, SemanticType::Int) && matches!(value.ty(), SemanticType::Float) {
        diagnostics.push(
            Diagnostic::warning(
                ErrorCode::LossyConversion,
                "implicit conversion from 'float' to 'int' loses precision".to_string(),
                location,
            )
            .with_suggestion("make the truncation explicit with int(...)"),
        );
    }
}

/// TS002 on calls: a float argument flowing into an int parameter
fn check_lossy_arguments(
    call: &CallExpr,
    context: &CompilationContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(name) = call.callee_name() else {
        return;
    };
    let Some(signature) = context.function_signature(name) else {
        return;
    };
    for ((param_name, param_ty), arg) in signature.params.iter().zip(&call.arguments) {
        if matches!(param_ty, SemanticType::Int) && matches!(arg.ty(), SemanticType::Float) {
            diagnostics.push(
                Diagnostic::warning(
                    ErrorCode::LossyConversion,
                    format!(
                        "float argument for int parameter '{}' loses precision",
                        param_name
                    ),
                    arg.location(),
                )
                .with_suggestion("make the truncation explicit with int(...)"),
            );
        }
    }
}

/// TS002 on returns: a float returned from a function declared int
fn check_lossy_returns(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    if !matches!(func.return_type, SemanticType::Int) {
        return;
    }
    each_statement(&func.body, &mut |stmt| {
        if let Statement::Return(ret) = stmt {
            if let Some(value) = &ret.value {
                if matches!(value.ty(), SemanticType::Float) {
                    diagnostics.push(
                        Diagnostic::warning(
                            ErrorCode::LossyConversion,
                            "returning a float from a function declared to return int".to_string(),
                            ret.location,
                        )
                        .with_suggestion("make the truncation explicit with int(...)"),
                    );
                }
            }
        }
    });
}

// ----- SA001 -----

/// Flags statements that can never execute because the block already
/// diverged
fn check_unreachable(body: &[Statement], diagnostics: &mut Vec<Diagnostic>) {
    check_unreachable_block(body, diagnostics);
}

fn check_unreachable_block(block: &[Statement], diagnostics: &mut Vec<Diagnostic>) {
    let mut diverged = false;
    for stmt in block {
        if diverged {
            diagnostics.push(Diagnostic::warning(
                ErrorCode::UnreachableCode,
                "statement is unreachable".to_string(),
                statement_location(stmt),
            ));
            break;
        }
        match stmt {
            Statement::Return(_) | Statement::Break(_) | Statement::Continue(_) => diverged = true,
            Statement::If(if_stmt) => {
                check_unreachable_block(&if_stmt.then_branch, diagnostics);
                check_unreachable_block(&if_stmt.else_branch, diagnostics);
            }
            Statement::While(while_stmt) => check_unreachable_block(&while_stmt.body, diagnostics),
            Statement::For(for_stmt) => check_unreachable_block(&for_stmt.body, diagnostics),
            _ => {}
        }
    }
}

fn statement_location(stmt: &Statement) -> SourceLocation {
    match stmt {
        Statement::Assign(s) => s.location,
        Statement::AugAssign(s) => s.location,
        Statement::AnnAssign(s) => s.location,
        Statement::If(s) => s.location,
        Statement::While(s) => s.location,
        Statement::For(s) => s.location,
        Statement::Return(s) => s.location,
        Statement::Expression(s) => s.location,
        Statement::Pass(loc) | Statement::Break(loc) | Statement::Continue(loc) => *loc,
    }
}

// ----- SA002 -----

/// Flags locals that are bound but never read
fn check_unused_locals(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    let mut binds: HashMap<String, SourceLocation> = HashMap::new();
    let mut uses: HashSet<String> = HashSet::new();
    scan_block(&func.body, &mut binds, &mut uses);

    let params: HashSet<&str> = func.parameters.iter().map(|p| p.name.as_str()).collect();

    let mut unused: Vec<(&String, &SourceLocation)> = binds
        .iter()
        .filter(|(name, _)| !uses.contains(*name) && !params.contains(name.as_str()))
        .collect();
    unused.sort_by_key(|(_, loc)| (loc.line, loc.column));

    for (name, location) in unused {
        diagnostics.push(Diagnostic::info(
            ErrorCode::UnusedLocal,
            format!("'{}' is bound but never used", name),
            *location,
        ));
    }
}

fn scan_block(
    block: &[Statement],
    binds: &mut HashMap<String, SourceLocation>,
    uses: &mut HashSet<String>,
) {
    for stmt in block {
        match stmt {
            Statement::Assign(assign) => {
                scan_store_target(&assign.target, assign.location, binds, uses);
                collect_uses(&assign.value, uses);
            }
            Statement::AugAssign(aug) => {
                // An augmented store both reads and writes its target
                scan_store_target(&aug.target, aug.location, binds, uses);
                collect_uses(&aug.target, uses);
                collect_uses(&aug.value, uses);
            }
            Statement::AnnAssign(ann) => {
                scan_store_target(&ann.target, ann.location, binds, uses);
                if let Some(value) = &ann.value {
                    collect_uses(value, uses);
                }
            }
            Statement::If(if_stmt) => {
                collect_uses(&if_stmt.condition, uses);
                scan_block(&if_stmt.then_branch, binds, uses);
                scan_block(&if_stmt.else_branch, binds, uses);
            }
            Statement::While(while_stmt) => {
                collect_uses(&while_stmt.condition, uses);
                scan_block(&while_stmt.body, binds, uses);
            }
            Statement::For(for_stmt) => {
                match &for_stmt.target {
                    BindingTarget::Name(name) => {
                        binds.entry(name.clone()).or_insert(for_stmt.location);
                    }
                    BindingTarget::Pair(a, b) => {
                        binds.entry(a.clone()).or_insert(for_stmt.location);
                        binds.entry(b.clone()).or_insert(for_stmt.location);
                    }
                }
                collect_uses(&for_stmt.iterable, uses);
                scan_block(&for_stmt.body, binds, uses);
            }
            Statement::Return(ret) => {
                if let Some(value) = &ret.value {
                    collect_uses(value, uses);
                }
            }
            Statement::Expression(expr_stmt) => collect_uses(&expr_stmt.expression, uses),
            Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => {}
        }
    }
}

fn scan_store_target(
    target: &Expression,
    location: SourceLocation,
    binds: &mut HashMap<String, SourceLocation>,
    uses: &mut HashSet<String>,
) {
    match target {
        Expression::Variable(var) => {
            binds.entry(var.name.clone()).or_insert(location);
        }
        // Storing through a subscript or attribute reads the base object
        other => collect_uses(other, uses),
    }
}

fn collect_uses(expr: &Expression, uses: &mut HashSet<String>) {
    super::walk_expression(expr, &mut |e| {
        if let Expression::Variable(var) = e {
            uses.insert(var.name.clone());
        }
    });
}

// ----- SA005 -----

/// Flags parameters the body never mutates despite a mutable container
/// annotation
fn check_readonly_parameters(
    func: &FunctionDef,
    key: &str,
    context: &CompilationContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for param in func.value_parameters() {
        let is_mutable_annotation = matches!(
            param.annotation,
            SemanticType::List(_) | SemanticType::Dict(_, _) | SemanticType::Set(_)
        );
        if !is_mutable_annotation {
            continue;
        }
        if context.mutability(key, &param.name) == Mutability::ReadOnly {
            diagnostics.push(Diagnostic::info(
                ErrorCode::ReadOnlyParameter,
                format!(
                    "parameter '{}' is never mutated; consider a more restrictive annotation",
                    param.name
                ),
                param.location,
            ));
        }
    }
}

// ----- CC004 -----

fn check_complexity(func: &FunctionDef, diagnostics: &mut Vec<Diagnostic>) {
    let mut visitor = ComplexityVisitor;
    let decision_points: usize = func
        .body
        .iter()
        .map(|stmt| visitor.visit_statement(stmt))
        .sum();
    let complexity = decision_points + 1;
    if complexity > COMPLEXITY_THRESHOLD {
        diagnostics.push(
            Diagnostic::warning(
                ErrorCode::ExcessiveComplexity,
                format!(
                    "cyclomatic complexity of '{}' is {} (threshold {})",
                    func.name, complexity, COMPLEXITY_THRESHOLD
                ),
                func.location,
            )
            .with_suggestion("split the function into smaller pieces"),
        );
    }
}

/// Counts decision points: each `if`/`elif`, loop, and short-circuit
/// operator adds one
struct ComplexityVisitor;

impl Visitor<usize> for ComplexityVisitor {
    fn visit_assign_statement(&mut self, stmt: &AssignStatement) -> usize {
        self.visit_expression(&stmt.target) + self.visit_expression(&stmt.value)
    }

    fn visit_aug_assign_statement(&mut self, stmt: &AugAssignStatement) -> usize {
        self.visit_expression(&stmt.target) + self.visit_expression(&stmt.value)
    }

    fn visit_ann_assign_statement(&mut self, stmt: &AnnAssignStatement) -> usize {
        let value = stmt
            .value
            .as_ref()
            .map(|v| self.visit_expression(v))
            .unwrap_or(0);
        self.visit_expression(&stmt.target) + value
    }

    fn visit_if_statement(&mut self, stmt: &IfStatement) -> usize {
        let branches: usize = stmt
            .then_branch
            .iter()
            .chain(&stmt.else_branch)
            .map(|s| self.visit_statement(s))
            .sum();
        1 + self.visit_expression(&stmt.condition) + branches
    }

    fn visit_while_statement(&mut self, stmt: &WhileStatement) -> usize {
        let body: usize = stmt.body.iter().map(|s| self.visit_statement(s)).sum();
        1 + self.visit_expression(&stmt.condition) + body
    }

    fn visit_for_statement(&mut self, stmt: &ForStatement) -> usize {
        let body: usize = stmt.body.iter().map(|s| self.visit_statement(s)).sum();
        1 + self.visit_expression(&stmt.iterable) + body
    }

    fn visit_return_statement(&mut self, stmt: &ReturnStatement) -> usize {
        stmt.value.as_ref().map(|v| self.visit_expression(v)).unwrap_or(0)
    }

    fn visit_expression_statement(&mut self, stmt: &ExpressionStatement) -> usize {
        self.visit_expression(&stmt.expression)
    }

    fn visit_pass_statement(&mut self, _location: &SourceLocation) -> usize {
        0
    }

    fn visit_break_statement(&mut self, _location: &SourceLocation) -> usize {
        0
    }

    fn visit_continue_statement(&mut self, _location: &SourceLocation) -> usize {
        0
    }

    fn visit_literal_expression(&mut self, _expr: &LiteralExpr) -> usize {
        0
    }

    fn visit_variable_expression(&mut self, _expr: &VariableExpr) -> usize {
        0
    }

    fn visit_binary_expression(&mut self, expr: &BinaryExpr) -> usize {
        self.visit_expression(&expr.left) + self.visit_expression(&expr.right)
    }

    fn visit_unary_expression(&mut self, expr: &UnaryExpr) -> usize {
        self.visit_expression(&expr.operand)
    }

    fn visit_boolean_expression(&mut self, expr: &BooleanExpr) -> usize {
        1 + self.visit_expression(&expr.left) + self.visit_expression(&expr.right)
    }

    fn visit_comparison_expression(&mut self, expr: &ComparisonExpr) -> usize {
        self.visit_expression(&expr.left) + self.visit_expression(&expr.right)
    }

    fn visit_call_expression(&mut self, expr: &CallExpr) -> usize {
        let args: usize = expr.arguments.iter().map(|a| self.visit_expression(a)).sum();
        self.visit_expression(&expr.function) + args
    }

    fn visit_attribute_expression(&mut self, expr: &AttributeExpr) -> usize {
        self.visit_expression(&expr.object)
    }

    fn visit_subscript_expression(&mut self, expr: &SubscriptExpr) -> usize {
        self.visit_expression(&expr.object) + self.visit_expression(&expr.index)
    }

    fn visit_list_display(&mut self, expr: &ListExpr) -> usize {
        expr.elements.iter().map(|e| self.visit_expression(e)).sum()
    }

    fn visit_dict_display(&mut self, expr: &DictExpr) -> usize {
        let keys: usize = expr.keys.iter().map(|e| self.visit_expression(e)).sum();
        let values: usize = expr.values.iter().map(|e| self.visit_expression(e)).sum();
        keys + values
    }

    fn visit_set_display(&mut self, expr: &SetExpr) -> usize {
        expr.elements.iter().map(|e| self.visit_expression(e)).sum()
    }

    fn visit_tuple_display(&mut self, expr: &TupleExpr) -> usize {
        expr.elements.iter().map(|e| self.visit_expression(e)).sum()
    }

    fn visit_list_comprehension(&mut self, expr: &ListCompExpr) -> usize {
        let condition = expr
            .generator
            .condition
            .as_ref()
            .map(|c| 1 + self.visit_expression(c))
            .unwrap_or(0);
        1 + self.visit_expression(&expr.element)
            + self.visit_expression(&expr.generator.iterable)
            + condition
    }

    fn visit_dict_comprehension(&mut self, expr: &DictCompExpr) -> usize {
        let condition = expr
            .generator
            .condition
            .as_ref()
            .map(|c| 1 + self.visit_expression(c))
            .unwrap_or(0);
        1 + self.visit_expression(&expr.key)
            + self.visit_expression(&expr.value)
            + self.visit_expression(&expr.generator.iterable)
            + condition
    }

    fn visit_set_comprehension(&mut self, expr: &SetCompExpr) -> usize {
        let condition = expr
            .generator
            .condition
            .as_ref()
            .map(|c| 1 + self.visit_expression(c))
            .unwrap_or(0);
        1 + self.visit_expression(&expr.element)
            + self.visit_expression(&expr.generator.iterable)
            + condition
    }
}
