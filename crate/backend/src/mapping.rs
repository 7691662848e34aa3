//! Mapping phase: resolve semantic types against the target's type system
//!
//! Runs between analysis and generation. Verifies that every type the
//! converter will need is fully resolved (no `Unknown` or `Any` survives
//! into generation) and that the target can represent every shape (the
//! monomorphized C runtime cannot hold containers inside container
//! values). Emits one diagnostic per offending binding or shape and never
//! mutates the AST.

use mgen_error::{ErrorCode, TranslateError};
use mgen_ir::SourceLocation;
use mgen_ir::ast::{Declaration, Expression, FunctionDef, Module, Statement};
use mgen_types::{SemanticType, Target};
use std::collections::BTreeSet;

/// Checks the module against the target's type mapping
///
/// ### Returns
/// * `Ok(())` when every shape is resolved and representable
/// * `Err` with one diagnostic per problem
pub fn check_module(module: &Module, target: Target) -> Result<(), Vec<TranslateError>> {
    let mut checker = MappingChecker {
        target,
        errors: Vec::new(),
        seen: BTreeSet::new(),
    };

    for decl in &module.declarations {
        match decl {
            Declaration::Function(func) => checker.check_function(func),
            Declaration::Class(class) => {
                for method in &class.methods {
                    checker.check_function(method);
                }
            }
            Declaration::GlobalVar(var) => {
                checker.check_type(&var.annotation, var.location, &var.name);
            }
            Declaration::Import(_) => {}
        }
    }

    if checker.errors.is_empty() {
        Ok(())
    } else {
        Err(checker.errors)
    }
}

struct MappingChecker {
    target: Target,
    errors: Vec<TranslateError>,
    /// (line, column, code) triples already reported, to avoid repeating
    /// one unresolved binding at every use site
    seen: BTreeSet<(usize, usize, &'static str)>,
}

impl MappingChecker {
    fn check_function(&mut self, func: &FunctionDef) {
        for param in func.value_parameters() {
            self.check_type(&param.annotation, param.location, &param.name);
        }
        self.check_type(&func.return_type, func.location, &func.name);
        self.check_block(&func.body);
    }

    fn check_block(&mut self, statements: &[Statement]) {
        for stmt in statements {
            self.check_statement(stmt);
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Assign(assign) => {
                self.check_expression(&assign.target);
                self.check_expression(&assign.value);
            }
            Statement::AugAssign(aug) => {
                self.check_expression(&aug.target);
                self.check_expression(&aug.value);
            }
            Statement::AnnAssign(ann) => {
                self.check_expression(&ann.target);
                if let Some(value) = &ann.value {
                    self.check_expression(value);
                }
            }
            Statement::If(if_stmt) => {
                self.check_expression(&if_stmt.condition);
                self.check_block(&if_stmt.then_branch);
                self.check_block(&if_stmt.else_branch);
            }
            Statement::While(while_stmt) => {
                self.check_expression(&while_stmt.condition);
                self.check_block(&while_stmt.body);
            }
            Statement::For(for_stmt) => {
                self.check_expression(&for_stmt.iterable);
                self.check_block(&for_stmt.body);
            }
            Statement::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.check_expression(value);
                }
            }
            Statement::Expression(expr_stmt) => self.check_expression(&expr_stmt.expression),
            Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => {}
        }
    }

    fn check_expression(&mut self, expr: &Expression) {
        self.check_expression_type(expr);
        match expr {
            Expression::Binary(bin) => {
                self.check_expression(&bin.left);
                self.check_expression(&bin.right);
            }
            Expression::Unary(unary) => self.check_expression(&unary.operand),
            Expression::Boolean(boolean) => {
                self.check_expression(&boolean.left);
                self.check_expression(&boolean.right);
            }
            Expression::Comparison(cmp) => {
                self.check_expression(&cmp.left);
                self.check_expression(&cmp.right);
            }
            Expression::Call(call) => {
                // The function child's callable type is synthetic; only
                // the receiver of a method call needs checking
                if let Expression::Attribute(attr) = call.function.as_ref() {
                    self.check_expression(&attr.object);
                }
                for arg in &call.arguments {
                    self.check_expression(arg);
                }
            }
            Expression::Attribute(attr) => self.check_expression(&attr.object),
            Expression::Subscript(sub) => {
                self.check_expression(&sub.object);
                self.check_expression(&sub.index);
            }
            Expression::ListDisplay(list) => {
                for elem in &list.elements {
                    self.check_expression(elem);
                }
            }
            Expression::SetDisplay(set) => {
                for elem in &set.elements {
                    self.check_expression(elem);
                }
            }
            Expression::DictDisplay(dict) => {
                for key in &dict.keys {
                    self.check_expression(key);
                }
                for value in &dict.values {
                    self.check_expression(value);
                }
            }
            Expression::TupleDisplay(tuple) => {
                for elem in &tuple.elements {
                    self.check_expression(elem);
                }
            }
            Expression::ListComp(comp) => {
                self.check_expression(&comp.element);
                self.check_expression(&comp.generator.iterable);
            }
            Expression::SetComp(comp) => {
                self.check_expression(&comp.element);
                self.check_expression(&comp.generator.iterable);
            }
            Expression::DictComp(comp) => {
                self.check_expression(&comp.key);
                self.check_expression(&comp.value);
                self.check_expression(&comp.generator.iterable);
            }
            Expression::Literal(_) | Expression::Variable(_) => {}
        }
    }

    fn check_expression_type(&mut self, expr: &Expression) {
        // Callable types only describe call plumbing; the call result is
        // checked on the call node itself
        if matches!(expr.ty(), SemanticType::Callable(_, _)) {
            return;
        }
        // `.items()` in a loop header never materializes its pair list;
        // the converters iterate the map directly
        if let Expression::Call(call) = expr {
            if call.method_parts().is_some_and(|(_, m)| m == "items") {
                return;
            }
        }
        let described = match expr {
            Expression::Variable(var) => var.name.clone(),
            _ => "expression".to_string(),
        };
        self.check_type(expr.ty(), expr.location(), &described);
    }

    fn check_type(&mut self, ty: &SemanticType, location: SourceLocation, name: &str) {
        if ty.contains_unknown() {
            self.report(
                ErrorCode::TypeInferenceFailure,
                format!(
                    "the type of '{}' could not be fully resolved (inferred '{}')",
                    name, ty
                ),
                location,
                Some("add a type annotation or an element insertion the inference can use"),
            );
            return;
        }
        if matches!(ty, SemanticType::Any) {
            self.report(
                ErrorCode::TypeInferenceFailure,
                format!("'{}' is annotated 'Any', which cannot be lowered", name),
                location,
                Some("replace 'Any' with a concrete type"),
            );
            return;
        }
        if !self.target.supports_nested_containers() && has_nested_container(ty) {
            self.report(
                ErrorCode::UnsupportedFeature,
                format!(
                    "the {} target does not support container-valued container elements ('{}')",
                    self.target.name(),
                    ty
                ),
                location,
                Some("flatten the data shape or choose a target with nested-container support"),
            );
        }
    }

    fn report(
        &mut self,
        code: ErrorCode,
        message: String,
        location: SourceLocation,
        suggestion: Option<&str>,
    ) {
        if !self.seen.insert((location.line, location.column, code.code())) {
            return;
        }
        let error = match suggestion {
            Some(suggestion) => {
                TranslateError::with_suggestion(code, message, location, suggestion.to_string())
            }
            None => TranslateError::new(code, message, location),
        };
        self.errors.push(error);
    }
}

/// Check if a container shape stores containers inside its elements
fn has_nested_container(ty: &SemanticType) -> bool {
    fn element_is_container(elem: &SemanticType) -> bool {
        elem.container_kind()
            .is_some_and(|_| !matches!(elem, SemanticType::Str))
            || matches!(elem, SemanticType::Tuple(_))
    }
    match ty {
        SemanticType::List(elem) | SemanticType::Set(elem) => {
            element_is_container(elem) || has_nested_container(elem)
        }
        SemanticType::Dict(key, value) => {
            element_is_container(key)
                || element_is_container(value)
                || has_nested_container(key)
                || has_nested_container(value)
        }
        _ => false,
    }
}
