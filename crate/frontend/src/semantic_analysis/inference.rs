//! Flow-sensitive type inference over function bodies
//!
//! Two cooperating passes, implemented as one deterministic walk run
//! twice. The first run propagates types through expressions and refines
//! provisional container types (an empty `[]` later appended with ints
//! becomes `list[int]`); the second run starts from the refined bindings,
//! writes the final type into every expression node, and reports errors.
//! Running the same walk twice keeps the retroactive annotation of early
//! nodes and the error reporting in a single place.

use super::builtins;
use super::operations;
use mgen_error::{ErrorCode, TranslateError};
use mgen_ir::SourceLocation;
use mgen_ir::ast::{
    BindingTarget, CallExpr, Comprehension, Expression, FunctionDef, GlobalVarDecl, LiteralValue,
    Statement,
};
use mgen_shared::CompilationContext;
use mgen_types::{ContainerKind, SemanticType};
use std::collections::HashMap;

/// Analyzes one function body, mutating its expression types in place
///
/// ### Arguments
/// * `func` - The function to analyze
/// * `context` - The compilation context with all signatures collected
/// * `class_name` - The enclosing class when the function is a method
///
/// ### Returns
/// Every inference error found in the body
pub fn analyze_function(
    func: &mut FunctionDef,
    context: &CompilationContext,
    class_name: Option<&str>,
) -> Vec<TranslateError> {
    let mut engine = TypeInference::new(context, func.return_type.clone());

    for param in &func.parameters {
        let ty = if param.name == "self" {
            match class_name {
                Some(name) => SemanticType::Object(name.to_string()),
                None => SemanticType::Unknown,
            }
        } else {
            param.annotation.clone()
        };
        engine.bindings.insert(
            param.name.clone(),
            Binding {
                ty,
                annotated: true,
            },
        );
    }

    engine.reporting = false;
    engine.infer_block(&mut func.body);
    engine.reporting = true;
    engine.infer_block(&mut func.body);
    engine.errors
}

/// Analyzes a module-level variable initializer
pub fn analyze_global(
    var: &mut GlobalVarDecl,
    context: &CompilationContext,
) -> Vec<TranslateError> {
    let mut engine = TypeInference::new(context, SemanticType::Void);
    engine.reporting = true;

    let value_ty = engine.infer_expression(&mut var.value);
    if adopts_annotation(&var.annotation, &value_ty) {
        var.value.set_ty(var.annotation.clone());
    } else if !compatible_assignment(&var.annotation, &value_ty) {
        engine.report(
            ErrorCode::TypeInconsistency,
            format!(
                "cannot initialize '{}: {}' with a value of type '{}'",
                var.name, var.annotation, value_ty
            ),
            var.location,
        );
    }
    engine.errors
}

/// A function-local binding
///
/// Source functions have a single flat scope, so bindings live for the
/// whole body regardless of the block they first appear in.
struct Binding {
    ty: SemanticType,
    annotated: bool,
}

struct TypeInference<'a> {
    context: &'a CompilationContext,
    bindings: HashMap<String, Binding>,
    errors: Vec<TranslateError>,
    /// Errors are recorded only on the second run
    reporting: bool,
    return_type: SemanticType,
}

/// Check if `expected` can absorb a value of type `actual`
///
/// `Unknown` always passes (its cause is already reported); an integer
/// coerces into a float slot; a float into an integer slot is accepted
/// here and reported separately as the lossy-conversion warning TS002;
/// otherwise the join of the two types must be `expected` itself (which
/// also lets `list[int]` absorb an empty `list[Unknown]` display).
fn compatible_assignment(expected: &SemanticType, actual: &SemanticType) -> bool {
    if matches!(actual, SemanticType::Unknown) || matches!(expected, SemanticType::Unknown) {
        return true;
    }
    if expected.is_numeric() && actual.is_numeric() {
        return true;
    }
    expected.join(actual).as_ref() == Some(expected)
}

/// Check if an under-resolved container value should simply adopt the
/// annotated type (empty displays, `list()`/`dict()`/`set()` calls)
fn adopts_annotation(annotation: &SemanticType, value_ty: &SemanticType) -> bool {
    !annotation.contains_unknown()
        && value_ty.contains_unknown()
        && annotation.container_kind().is_some()
        && value_ty.container_kind() == annotation.container_kind()
}

impl<'a> TypeInference<'a> {
    fn new(context: &'a CompilationContext, return_type: SemanticType) -> Self {
        TypeInference {
            context,
            bindings: HashMap::new(),
            errors: Vec::new(),
            reporting: false,
            return_type,
        }
    }

    fn report(&mut self, code: ErrorCode, message: String, location: SourceLocation) {
        if self.reporting {
            self.errors.push(TranslateError::new(code, message, location));
        }
    }

    fn report_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: String,
        location: SourceLocation,
        suggestion: &str,
    ) {
        if self.reporting {
            self.errors.push(TranslateError::with_suggestion(
                code,
                message,
                location,
                suggestion.to_string(),
            ));
        }
    }

    // ----- statements -----

    fn infer_block(&mut self, statements: &mut [Statement]) {
        for stmt in statements {
            self.infer_statement(stmt);
        }
    }

    fn infer_statement(&mut self, stmt: &mut Statement) {
        match stmt {
            Statement::AnnAssign(ann) => {
                let annotation = ann.annotation.clone();
                let location = ann.location;
                if let Some(value) = &mut ann.value {
                    let value_ty = self.infer_expression(value);
                    if adopts_annotation(&annotation, &value_ty) {
                        value.set_ty(annotation.clone());
                    } else if !compatible_assignment(&annotation, &value_ty) {
                        self.report(
                            ErrorCode::TypeInconsistency,
                            format!(
                                "cannot assign a value of type '{}' to a binding annotated '{}'",
                                value_ty, annotation
                            ),
                            location,
                        );
                    }
                }
                match &mut ann.target {
                    Expression::Variable(var) => {
                        var.ty = annotation.clone();
                        let name = var.name.clone();
                        self.bindings.insert(
                            name,
                            Binding {
                                ty: annotation,
                                annotated: true,
                            },
                        );
                    }
                    other => {
                        let target_ty = self.infer_expression(other);
                        if !compatible_assignment(&target_ty, &annotation) {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!(
                                    "annotation '{}' conflicts with the declared type '{}'",
                                    annotation, target_ty
                                ),
                                location,
                            );
                        }
                    }
                }
            }
            Statement::Assign(assign) => {
                let value_ty = self.infer_expression(&mut assign.value);
                let location = assign.location;
                self.infer_assignment_target(&mut assign.target, value_ty, location);
                // Under-resolved container values adopt the target's type
                let target_ty = assign.target.ty().clone();
                if adopts_annotation(&target_ty, assign.value.ty()) {
                    assign.value.set_ty(target_ty);
                }
            }
            Statement::AugAssign(aug) => {
                let target_ty = self.infer_expression(&mut aug.target);
                let value_ty = self.infer_expression(&mut aug.value);
                let location = aug.location;
                match operations::binary_result_type(aug.operator, &target_ty, &value_ty) {
                    Ok(result) => {
                        if !compatible_assignment(&target_ty, &result) {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!(
                                    "augmented assignment changes the type from '{}' to '{}'",
                                    target_ty, result
                                ),
                                location,
                            );
                        }
                    }
                    Err(()) => {
                        self.report(
                            ErrorCode::TypeInconsistency,
                            format!(
                                "cannot apply '{}=' to operands of type '{}' and '{}'",
                                aug.operator, target_ty, value_ty
                            ),
                            location,
                        );
                    }
                }
            }
            Statement::If(if_stmt) => {
                let cond_ty = self.infer_expression(&mut if_stmt.condition);
                self.require_bool(&cond_ty, if_stmt.location, "if condition");
                self.infer_block(&mut if_stmt.then_branch);
                self.infer_block(&mut if_stmt.else_branch);
            }
            Statement::While(while_stmt) => {
                let cond_ty = self.infer_expression(&mut while_stmt.condition);
                self.require_bool(&cond_ty, while_stmt.location, "while condition");
                self.infer_block(&mut while_stmt.body);
            }
            Statement::For(for_stmt) => {
                let iter_ty = self.infer_expression(&mut for_stmt.iterable);
                let location = for_stmt.location;
                self.bind_loop_target(&for_stmt.target, &iter_ty, location);
                self.infer_block(&mut for_stmt.body);
            }
            Statement::Return(ret) => {
                let location = ret.location;
                let value_ty = match &mut ret.value {
                    Some(value) => {
                        let ty = self.infer_expression(value);
                        let declared = self.return_type.clone();
                        if adopts_annotation(&declared, &ty) {
                            value.set_ty(declared);
                        }
                        value.ty().clone()
                    }
                    None => SemanticType::Void,
                };
                let declared = self.return_type.clone();
                if matches!(declared, SemanticType::Void) {
                    if !matches!(value_ty, SemanticType::Void | SemanticType::Unknown) {
                        self.report(
                            ErrorCode::ReturnTypeMismatch,
                            format!("function declared to return no value returns '{}'", value_ty),
                            location,
                        );
                    }
                } else if matches!(value_ty, SemanticType::Void) {
                    self.report(
                        ErrorCode::ReturnTypeMismatch,
                        format!("function declared to return '{}' returns no value", declared),
                        location,
                    );
                } else if !compatible_assignment(&declared, &value_ty) {
                    self.report(
                        ErrorCode::ReturnTypeMismatch,
                        format!(
                            "function declared to return '{}' returns '{}'",
                            declared, value_ty
                        ),
                        location,
                    );
                }
            }
            Statement::Expression(expr_stmt) => {
                self.infer_expression(&mut expr_stmt.expression);
            }
            Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => {}
        }
    }

    fn require_bool(&mut self, ty: &SemanticType, location: SourceLocation, what: &str) {
        if !matches!(ty, SemanticType::Bool | SemanticType::Unknown) {
            self.report(
                ErrorCode::TypeInconsistency,
                format!("{} must be a bool, got '{}'", what, ty),
                location,
            );
        }
    }

    /// Types an assignment target and records refinement evidence
    fn infer_assignment_target(
        &mut self,
        target: &mut Expression,
        value_ty: SemanticType,
        location: SourceLocation,
    ) {
        match target {
            Expression::Variable(var) => {
                let name = var.name.clone();
                let existing = self
                    .bindings
                    .get(&name)
                    .map(|b| (b.ty.clone(), b.annotated));
                match existing {
                    Some((bound_ty, true)) => {
                        if !compatible_assignment(&bound_ty, &value_ty) {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!(
                                    "cannot assign a value of type '{}' to '{}' annotated '{}'",
                                    value_ty, name, bound_ty
                                ),
                                location,
                            );
                        }
                        var.ty = bound_ty;
                    }
                    Some((bound_ty, false))
                        if value_ty.contains_unknown()
                            && value_ty.container_kind() == bound_ty.container_kind()
                            && !bound_ty.contains_unknown() =>
                    {
                        // Re-assignment of an empty display to an already
                        // refined container keeps the refined type
                        var.ty = bound_ty;
                    }
                    Some((bound_ty, false)) => match bound_ty.join(&value_ty) {
                        Some(joined) => {
                            var.ty = joined.clone();
                            self.bindings.get_mut(&name).expect("binding exists").ty = joined;
                        }
                        None => {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!(
                                    "'{}' was bound as '{}' and cannot be re-bound as '{}'",
                                    name, bound_ty, value_ty
                                ),
                                location,
                            );
                            var.ty = bound_ty;
                        }
                    },
                    None => {
                        var.ty = value_ty.clone();
                        self.bindings.insert(
                            name,
                            Binding {
                                ty: value_ty,
                                annotated: false,
                            },
                        );
                    }
                }
            }
            Expression::Subscript(sub) => {
                let object_ty = self.infer_expression(&mut sub.object);
                let index_ty = self.infer_expression(&mut sub.index);
                match &object_ty {
                    SemanticType::List(elem) => {
                        if !matches!(index_ty, SemanticType::Int | SemanticType::Unknown) {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("list index must be an int, got '{}'", index_ty),
                                location,
                            );
                        }
                        self.refine_element(&sub.object, ContainerKind::Vec, &value_ty, location);
                        let elem = (**elem).clone();
                        if !compatible_assignment(&elem, &value_ty) && !elem.contains_unknown() {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!(
                                    "cannot store a '{}' into a list of '{}'",
                                    value_ty, elem
                                ),
                                location,
                            );
                        }
                        sub.ty = elem;
                    }
                    SemanticType::Dict(key, value) => {
                        self.refine_dict(&sub.object, &index_ty, &value_ty, location);
                        let key = (**key).clone();
                        let value = (**value).clone();
                        if !compatible_assignment(&key, &index_ty) && !key.contains_unknown() {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("dict key must be '{}', got '{}'", key, index_ty),
                                location,
                            );
                        }
                        if !compatible_assignment(&value, &value_ty) && !value.contains_unknown() {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!(
                                    "cannot store a '{}' into a dict of '{}'",
                                    value_ty, value
                                ),
                                location,
                            );
                        }
                        sub.ty = value;
                    }
                    SemanticType::Str => {
                        self.report(
                            ErrorCode::TypeInconsistency,
                            "strings are immutable and cannot be assigned into".to_string(),
                            location,
                        );
                    }
                    SemanticType::Unknown => {}
                    other => {
                        self.report(
                            ErrorCode::TypeInconsistency,
                            format!("type '{}' does not support subscript assignment", other),
                            location,
                        );
                    }
                }
            }
            Expression::Attribute(_) => {
                let target_ty = self.infer_expression(target);
                if !compatible_assignment(&target_ty, &value_ty) {
                    self.report(
                        ErrorCode::TypeInconsistency,
                        format!(
                            "cannot assign a value of type '{}' to a field of type '{}'",
                            value_ty, target_ty
                        ),
                        location,
                    );
                }
            }
            other => {
                self.report(
                    ErrorCode::TypeInconsistency,
                    "invalid assignment target".to_string(),
                    other.location(),
                );
            }
        }
    }

    /// Binds the loop target of a `for` statement or comprehension
    fn bind_loop_target(
        &mut self,
        target: &BindingTarget,
        iter_ty: &SemanticType,
        location: SourceLocation,
    ) {
        let element = iter_ty.iteration_element();
        match target {
            BindingTarget::Name(name) => {
                let ty = match element {
                    Some(elem) => elem,
                    None => {
                        if !matches!(iter_ty, SemanticType::Unknown) {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("type '{}' is not iterable", iter_ty),
                                location,
                            );
                        }
                        SemanticType::Unknown
                    }
                };
                self.bindings.insert(
                    name.clone(),
                    Binding {
                        ty,
                        annotated: false,
                    },
                );
            }
            BindingTarget::Pair(first, second) => {
                let pair = match element {
                    Some(SemanticType::Tuple(elems)) if elems.len() == 2 => {
                        (elems[0].clone(), elems[1].clone())
                    }
                    Some(SemanticType::Unknown) | None => {
                        if !matches!(iter_ty, SemanticType::Unknown) && element.is_none() {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("type '{}' is not iterable", iter_ty),
                                location,
                            );
                        }
                        (SemanticType::Unknown, SemanticType::Unknown)
                    }
                    Some(other) => {
                        self.report(
                            ErrorCode::TypeInconsistency,
                            format!(
                                "cannot unpack elements of type '{}' into two names",
                                other
                            ),
                            location,
                        );
                        (SemanticType::Unknown, SemanticType::Unknown)
                    }
                };
                self.bindings.insert(
                    first.clone(),
                    Binding {
                        ty: pair.0,
                        annotated: false,
                    },
                );
                self.bindings.insert(
                    second.clone(),
                    Binding {
                        ty: pair.1,
                        annotated: false,
                    },
                );
            }
        }
    }

    // ----- refinement -----

    /// Joins new element evidence into a provisionally-typed local list or
    /// set binding
    fn refine_element(
        &mut self,
        object: &Expression,
        kind: ContainerKind,
        elem_ty: &SemanticType,
        location: SourceLocation,
    ) {
        let Expression::Variable(var) = object else {
            return;
        };
        let name = var.name.clone();
        let Some(binding) = self.bindings.get(&name) else {
            return;
        };
        let current = match (&binding.ty, kind) {
            (SemanticType::List(elem), ContainerKind::Vec) => (**elem).clone(),
            (SemanticType::Set(elem), ContainerKind::Set) => (**elem).clone(),
            _ => return,
        };
        match current.join(elem_ty) {
            Some(joined) => {
                let refined = match kind {
                    ContainerKind::Vec => SemanticType::List(Box::new(joined)),
                    _ => SemanticType::Set(Box::new(joined)),
                };
                self.bindings.get_mut(&name).expect("binding exists").ty = refined;
            }
            None => {
                self.report(
                    ErrorCode::TypeInconsistency,
                    format!(
                        "conflicting element types for '{}': '{}' and '{}'",
                        name, current, elem_ty
                    ),
                    location,
                );
            }
        }
    }

    /// Joins new key/value evidence into a provisionally-typed local dict
    /// binding
    fn refine_dict(
        &mut self,
        object: &Expression,
        key_ty: &SemanticType,
        value_ty: &SemanticType,
        location: SourceLocation,
    ) {
        let Expression::Variable(var) = object else {
            return;
        };
        let name = var.name.clone();
        let Some(binding) = self.bindings.get(&name) else {
            return;
        };
        let SemanticType::Dict(key, value) = binding.ty.clone() else {
            return;
        };
        let joined_key = key.join(key_ty);
        let joined_value = value.join(value_ty);
        match (joined_key, joined_value) {
            (Some(k), Some(v)) => {
                self.bindings.get_mut(&name).expect("binding exists").ty =
                    SemanticType::Dict(Box::new(k), Box::new(v));
            }
            _ => {
                self.report(
                    ErrorCode::TypeInconsistency,
                    format!(
                        "conflicting key or value types for dict '{}'",
                        name
                    ),
                    location,
                );
            }
        }
    }

    // ----- expressions -----

    fn infer_expression(&mut self, expr: &mut Expression) -> SemanticType {
        let ty = match expr {
            Expression::Literal(lit) => lit.ty.clone(),
            Expression::Variable(var) => {
                let ty = self.lookup_name(&var.name);
                match ty {
                    Some(ty) => {
                        var.ty = ty.clone();
                        ty
                    }
                    None => {
                        let name = var.name.clone();
                        let location = var.location;
                        self.report(
                            ErrorCode::UndefinedVariable,
                            format!("name '{}' is not defined", name),
                            location,
                        );
                        SemanticType::Unknown
                    }
                }
            }
            Expression::Binary(bin) => {
                let left = self.infer_expression(&mut bin.left);
                let right = self.infer_expression(&mut bin.right);
                // Operand mismatches are the constraint checker's TS001
                operations::binary_result_type(bin.operator, &left, &right)
                    .unwrap_or(SemanticType::Unknown)
            }
            Expression::Unary(unary) => {
                let operand = self.infer_expression(&mut unary.operand);
                let location = unary.location;
                let operator = unary.operator;
                match operations::unary_result_type(operator, &operand) {
                    Ok(ty) => ty,
                    Err(()) => {
                        self.report(
                            ErrorCode::TypeInconsistency,
                            format!("cannot apply '{}' to a value of type '{}'", operator, operand),
                            location,
                        );
                        SemanticType::Unknown
                    }
                }
            }
            Expression::Boolean(boolean) => {
                let left = self.infer_expression(&mut boolean.left);
                let right = self.infer_expression(&mut boolean.right);
                let location = boolean.location;
                let operator = boolean.operator;
                for ty in [&left, &right] {
                    if !matches!(ty, SemanticType::Bool | SemanticType::Unknown) {
                        self.report(
                            ErrorCode::TypeInconsistency,
                            format!("operands of '{}' must be bool, got '{}'", operator, ty),
                            location,
                        );
                    }
                }
                SemanticType::Bool
            }
            Expression::Comparison(cmp) => {
                let left = self.infer_expression(&mut cmp.left);
                let right = self.infer_expression(&mut cmp.right);
                let location = cmp.location;
                let operator = cmp.operator;
                if !operations::comparison_operands_compatible(operator, &left, &right) {
                    self.report(
                        ErrorCode::TypeInconsistency,
                        format!(
                            "cannot compare '{}' with '{}' using '{}'",
                            left, right, operator
                        ),
                        location,
                    );
                }
                SemanticType::Bool
            }
            Expression::Call(call) => self.infer_call(call),
            Expression::Attribute(attr) => {
                let object_ty = self.infer_expression(&mut attr.object);
                let name = attr.name.clone();
                let location = attr.location;
                let ty = self.attribute_type(&object_ty, &name, location);
                attr.ty = ty.clone();
                ty
            }
            Expression::Subscript(sub) => {
                let object_ty = self.infer_expression(&mut sub.object);
                let index_ty = self.infer_expression(&mut sub.index);
                let location = sub.location;
                self.subscript_type(&object_ty, &index_ty, sub.index.as_ref(), location)
            }
            Expression::ListDisplay(list) => {
                let mut elem = SemanticType::Unknown;
                let location = list.location;
                for element in &mut list.elements {
                    let ty = self.infer_expression(element);
                    match elem.join(&ty) {
                        Some(joined) => elem = joined,
                        None => {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("conflicting list element types '{}' and '{}'", elem, ty),
                                location,
                            );
                        }
                    }
                }
                SemanticType::List(Box::new(elem))
            }
            Expression::SetDisplay(set) => {
                let mut elem = SemanticType::Unknown;
                let location = set.location;
                for element in &mut set.elements {
                    let ty = self.infer_expression(element);
                    match elem.join(&ty) {
                        Some(joined) => elem = joined,
                        None => {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("conflicting set element types '{}' and '{}'", elem, ty),
                                location,
                            );
                        }
                    }
                }
                SemanticType::Set(Box::new(elem))
            }
            Expression::DictDisplay(dict) => {
                let mut key = SemanticType::Unknown;
                let mut value = SemanticType::Unknown;
                let location = dict.location;
                for key_expr in &mut dict.keys {
                    let ty = self.infer_expression(key_expr);
                    match key.join(&ty) {
                        Some(joined) => key = joined,
                        None => {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("conflicting dict key types '{}' and '{}'", key, ty),
                                location,
                            );
                        }
                    }
                }
                for value_expr in &mut dict.values {
                    let ty = self.infer_expression(value_expr);
                    match value.join(&ty) {
                        Some(joined) => value = joined,
                        None => {
                            self.report(
                                ErrorCode::TypeInconsistency,
                                format!("conflicting dict value types '{}' and '{}'", value, ty),
                                location,
                            );
                        }
                    }
                }
                SemanticType::Dict(Box::new(key), Box::new(value))
            }
            Expression::TupleDisplay(tuple) => {
                let elems = tuple
                    .elements
                    .iter_mut()
                    .map(|e| self.infer_expression(e))
                    .collect();
                SemanticType::Tuple(elems)
            }
            Expression::ListComp(comp) => {
                let saved = self.enter_comprehension(&mut comp.generator, comp.location);
                let elem = self.infer_expression(&mut comp.element);
                self.leave_comprehension(saved);
                SemanticType::List(Box::new(elem))
            }
            Expression::SetComp(comp) => {
                let saved = self.enter_comprehension(&mut comp.generator, comp.location);
                let elem = self.infer_expression(&mut comp.element);
                self.leave_comprehension(saved);
                SemanticType::Set(Box::new(elem))
            }
            Expression::DictComp(comp) => {
                let saved = self.enter_comprehension(&mut comp.generator, comp.location);
                let key = self.infer_expression(&mut comp.key);
                let value = self.infer_expression(&mut comp.value);
                self.leave_comprehension(saved);
                SemanticType::Dict(Box::new(key), Box::new(value))
            }
        };
        expr.set_ty(ty.clone());
        ty
    }

    /// Types the generator clause of a comprehension and binds its
    /// targets, returning the shadowed bindings for restoration
    fn enter_comprehension(
        &mut self,
        generator: &mut Comprehension,
        location: SourceLocation,
    ) -> Vec<(String, Option<Binding>)> {
        let iter_ty = self.infer_expression(&mut generator.iterable);

        let names: Vec<String> = match &generator.target {
            BindingTarget::Name(name) => vec![name.clone()],
            BindingTarget::Pair(a, b) => vec![a.clone(), b.clone()],
        };
        let saved = names
            .iter()
            .map(|name| (name.clone(), self.bindings.remove(name)))
            .collect();

        self.bind_loop_target(&generator.target, &iter_ty, location);

        if let Some(condition) = &mut generator.condition {
            let cond_ty = self.infer_expression(condition);
            self.require_bool(&cond_ty, location, "comprehension filter");
        }

        saved
    }

    fn leave_comprehension(&mut self, saved: Vec<(String, Option<Binding>)>) {
        for (name, binding) in saved {
            match binding {
                Some(binding) => {
                    self.bindings.insert(name, binding);
                }
                None => {
                    self.bindings.remove(&name);
                }
            }
        }
    }

    fn lookup_name(&self, name: &str) -> Option<SemanticType> {
        if let Some(binding) = self.bindings.get(name) {
            return Some(binding.ty.clone());
        }
        self.context.lookup_symbol(name).map(|s| s.ty.clone())
    }

    fn attribute_type(
        &mut self,
        object_ty: &SemanticType,
        name: &str,
        location: SourceLocation,
    ) -> SemanticType {
        match object_ty {
            SemanticType::Object(class) => {
                let Some(info) = self.context.class_info(class) else {
                    self.report(
                        ErrorCode::UnknownAttribute,
                        format!("unknown class '{}'", class),
                        location,
                    );
                    return SemanticType::Unknown;
                };
                if let Some(field_ty) = info.field_type(name) {
                    return field_ty.clone();
                }
                if let Some(method) = info.methods.get(name) {
                    return method.callable_type();
                }
                self.report(
                    ErrorCode::UnknownAttribute,
                    format!("'{}' has no attribute '{}'", class, name),
                    location,
                );
                SemanticType::Unknown
            }
            SemanticType::Unknown => SemanticType::Unknown,
            other => {
                // Container methods are typed at the call site; a bare
                // attribute read on a container is outside the subset
                if other.container_kind().is_some() {
                    return SemanticType::Unknown;
                }
                self.report(
                    ErrorCode::UnknownAttribute,
                    format!("type '{}' has no attribute '{}'", other, name),
                    location,
                );
                SemanticType::Unknown
            }
        }
    }

    fn subscript_type(
        &mut self,
        object_ty: &SemanticType,
        index_ty: &SemanticType,
        index: &Expression,
        location: SourceLocation,
    ) -> SemanticType {
        match object_ty {
            SemanticType::List(elem) => {
                if !matches!(index_ty, SemanticType::Int | SemanticType::Unknown) {
                    self.report(
                        ErrorCode::TypeInconsistency,
                        format!("list index must be an int, got '{}'", index_ty),
                        location,
                    );
                }
                (**elem).clone()
            }
            SemanticType::Dict(key, value) => {
                if !compatible_assignment(key, index_ty) && !key.contains_unknown() {
                    self.report(
                        ErrorCode::TypeInconsistency,
                        format!("dict key must be '{}', got '{}'", key, index_ty),
                        location,
                    );
                }
                (**value).clone()
            }
            SemanticType::Str => SemanticType::Str,
            SemanticType::Tuple(elems) => match index {
                Expression::Literal(lit) => match &lit.value {
                    LiteralValue::Int(i) if (*i as usize) < elems.len() && *i >= 0 => {
                        elems[*i as usize].clone()
                    }
                    _ => {
                        self.report(
                            ErrorCode::TypeInferenceFailure,
                            "tuple index is out of range".to_string(),
                            location,
                        );
                        SemanticType::Unknown
                    }
                },
                _ => {
                    self.report(
                        ErrorCode::TypeInferenceFailure,
                        "tuple subscripts must be integer literals".to_string(),
                        location,
                    );
                    SemanticType::Unknown
                }
            },
            SemanticType::Unknown => SemanticType::Unknown,
            other => {
                self.report(
                    ErrorCode::TypeInconsistency,
                    format!("type '{}' is not subscriptable", other),
                    location,
                );
                SemanticType::Unknown
            }
        }
    }

    // ----- calls -----

    fn infer_call(&mut self, call: &mut CallExpr) -> SemanticType {
        let arg_tys: Vec<SemanticType> = call
            .arguments
            .iter_mut()
            .map(|arg| self.infer_expression(arg))
            .collect();
        let location = call.location;

        // Method call
        if let Expression::Attribute(attr) = call.function.as_mut() {
            let object_ty = self.infer_expression(&mut attr.object);
            let method = attr.name.clone();

            let result = if let Some(kind) = object_ty.container_kind() {
                self.container_method_call(attr.object.as_ref(), &object_ty, kind, &method, &arg_tys, location)
            } else {
                match &object_ty {
                    SemanticType::Object(class) => {
                        self.class_method_call(class, &method, &arg_tys, location)
                    }
                    SemanticType::Unknown => SemanticType::Unknown,
                    other => {
                        self.report(
                            ErrorCode::UnknownAttribute,
                            format!("type '{}' has no method '{}'", other, method),
                            location,
                        );
                        SemanticType::Unknown
                    }
                }
            };

            attr.ty = SemanticType::Callable(arg_tys, Box::new(result.clone()));
            return result;
        }

        // Free call: user class constructor, user function, or builtin
        let Some(name) = call.callee_name().map(|n| n.to_string()) else {
            self.report(
                ErrorCode::TypeInferenceFailure,
                "unsupported call target".to_string(),
                location,
            );
            return SemanticType::Unknown;
        };

        let result = if self.context.is_class(&name) {
            let ctor_params = self
                .context
                .class_info(&name)
                .and_then(|info| info.methods.get("__init__"))
                .map(|sig| sig.params.clone())
                .unwrap_or_default();
            self.check_arguments(&name, &ctor_params, &arg_tys, location);
            SemanticType::Object(name.clone())
        } else if let Some(signature) = self.context.function_signature(&name).cloned() {
            self.check_arguments(&name, &signature.params, &arg_tys, location);
            signature.return_type
        } else if builtins::is_builtin(&name) {
            match builtins::builtin_result(&name, &arg_tys) {
                Ok(ty) => ty,
                Err(message) => {
                    let code = if message.contains("takes") || message.contains("at least") {
                        ErrorCode::ArgumentCountMismatch
                    } else {
                        ErrorCode::ArgumentTypeMismatch
                    };
                    self.report(code, message, location);
                    SemanticType::Unknown
                }
            }
        } else {
            self.report_with_suggestion(
                ErrorCode::UndefinedFunction,
                format!("function '{}' is not defined", name),
                location,
                "define the function in this module; cross-module calls are not translated",
            );
            SemanticType::Unknown
        };

        if let Expression::Variable(var) = call.function.as_mut() {
            var.ty = SemanticType::Callable(arg_tys, Box::new(result.clone()));
        }
        result
    }

    /// Types a method call on a container receiver and applies refinement
    /// evidence from mutating insertions
    fn container_method_call(
        &mut self,
        object: &Expression,
        object_ty: &SemanticType,
        kind: ContainerKind,
        method: &str,
        arg_tys: &[SemanticType],
        location: SourceLocation,
    ) -> SemanticType {
        // Evidence: the first append/add/insert refines a provisional
        // element type
        match (kind, method) {
            (ContainerKind::Vec, "append") | (ContainerKind::Set, "add") => {
                if let Some(arg) = arg_tys.first() {
                    self.refine_element(object, kind, arg, location);
                }
            }
            (ContainerKind::Vec, "insert") => {
                if let Some(arg) = arg_tys.get(1) {
                    self.refine_element(object, kind, arg, location);
                }
            }
            (ContainerKind::Vec, "extend") => {
                if let Some(SemanticType::List(elem)) = arg_tys.first() {
                    let elem = (**elem).clone();
                    self.refine_element(object, kind, &elem, location);
                }
            }
            _ => {}
        }

        // Re-read the receiver type: refinement may have sharpened it
        let effective = match object {
            Expression::Variable(var) => self
                .bindings
                .get(&var.name)
                .map(|b| b.ty.clone())
                .unwrap_or_else(|| object_ty.clone()),
            _ => object_ty.clone(),
        };

        match builtins::container_method_result(&effective, method, arg_tys) {
            Some(ty) => ty,
            None => {
                self.report(
                    ErrorCode::UnknownAttribute,
                    format!("'{}' values have no method '{}'", effective, method),
                    location,
                );
                SemanticType::Unknown
            }
        }
    }

    fn class_method_call(
        &mut self,
        class: &str,
        method: &str,
        arg_tys: &[SemanticType],
        location: SourceLocation,
    ) -> SemanticType {
        let Some(signature) = self
            .context
            .class_info(class)
            .and_then(|info| info.methods.get(method))
            .cloned()
        else {
            self.report(
                ErrorCode::UnknownAttribute,
                format!("'{}' has no method '{}'", class, method),
                location,
            );
            return SemanticType::Unknown;
        };
        self.check_arguments(method, &signature.params, arg_tys, location);
        signature.return_type
    }

    fn check_arguments(
        &mut self,
        name: &str,
        params: &[(String, SemanticType)],
        arg_tys: &[SemanticType],
        location: SourceLocation,
    ) {
        if params.len() != arg_tys.len() {
            self.report(
                ErrorCode::ArgumentCountMismatch,
                format!(
                    "'{}' takes {} argument{}, got {}",
                    name,
                    params.len(),
                    if params.len() == 1 { "" } else { "s" },
                    arg_tys.len()
                ),
                location,
            );
            return;
        }
        for ((param_name, param_ty), arg_ty) in params.iter().zip(arg_tys) {
            if !compatible_assignment(param_ty, arg_ty) {
                self.report(
                    ErrorCode::ArgumentTypeMismatch,
                    format!(
                        "argument '{}' of '{}' expects '{}', got '{}'",
                        param_name, name, param_ty, arg_ty
                    ),
                    location,
                );
            }
        }
    }
}
