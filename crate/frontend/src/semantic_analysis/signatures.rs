//! Signature collection: the first analysis step
//!
//! Registers every module-level function, class, and global variable in
//! the compilation context before body analysis starts, so calls between
//! functions (including mutual recursion) resolve without forward
//! declarations. Class field lists are derived from the constructor body.

use mgen_error::{ErrorCode, TranslateError};
use mgen_ir::ast::{
    ClassDef, Declaration, Expression, FunctionDef, Module, Statement,
};
use mgen_shared::{ClassInfo, CompilationContext, FunctionSignature, SymbolKind};
use mgen_types::SemanticType;

/// Collects all module-level signatures into the context
///
/// ### Arguments
/// * `module` - The validated module
/// * `context` - The compilation context to fill
///
/// ### Returns
/// Every duplicate-definition or field-typing error found
pub fn collect(module: &Module, context: &mut CompilationContext) -> Vec<TranslateError> {
    let mut errors = Vec::new();

    for decl in &module.declarations {
        match decl {
            Declaration::Function(func) => {
                let signature = function_signature(func);
                if context.function_signature(&func.name).is_some() {
                    errors.push(TranslateError::new(
                        ErrorCode::DuplicateDefinition,
                        format!("function '{}' is defined more than once", func.name),
                        func.location,
                    ));
                    continue;
                }
                let callable = signature.callable_type();
                context.register_function(signature);
                if let Err(message) =
                    context.define_symbol(func.name.clone(), SymbolKind::Function, callable, true)
                {
                    errors.push(TranslateError::new(
                        ErrorCode::DuplicateDefinition,
                        message,
                        func.location,
                    ));
                }
            }
            Declaration::Class(class) => {
                if context.is_class(&class.name) {
                    errors.push(TranslateError::new(
                        ErrorCode::DuplicateDefinition,
                        format!("class '{}' is defined more than once", class.name),
                        class.location,
                    ));
                    continue;
                }
                let info = class_info(class, &mut errors);
                context.register_class(class.name.clone(), info);
                if let Err(message) = context.define_symbol(
                    class.name.clone(),
                    SymbolKind::Class,
                    SemanticType::Object(class.name.clone()),
                    true,
                ) {
                    errors.push(TranslateError::new(
                        ErrorCode::DuplicateDefinition,
                        message,
                        class.location,
                    ));
                }
            }
            Declaration::GlobalVar(var) => {
                if let Err(message) = context.define_symbol(
                    var.name.clone(),
                    SymbolKind::Variable,
                    var.annotation.clone(),
                    true,
                ) {
                    errors.push(TranslateError::new(
                        ErrorCode::DuplicateDefinition,
                        message,
                        var.location,
                    ));
                }
            }
            Declaration::Import(_) => {}
        }
    }

    errors
}

fn function_signature(func: &FunctionDef) -> FunctionSignature {
    FunctionSignature {
        name: func.name.clone(),
        params: func
            .value_parameters()
            .iter()
            .map(|p| (p.name.clone(), p.annotation.clone()))
            .collect(),
        return_type: func.return_type.clone(),
    }
}

/// Derives a class's field list and method signatures
///
/// Fields come from the constructor body: an annotated assignment to
/// `self.x` uses its annotation; a plain `self.x = value` takes the type
/// of a parameter when the value is one, or the literal's type.
fn class_info(class: &ClassDef, errors: &mut Vec<TranslateError>) -> ClassInfo {
    let mut info = ClassInfo::default();

    if let Some(ctor) = class.constructor() {
        collect_fields(ctor, &ctor.body, &mut info, errors);
    }

    for method in &class.methods {
        info.methods
            .insert(method.name.clone(), function_signature(method));
    }

    info
}

fn collect_fields(
    ctor: &FunctionDef,
    body: &[Statement],
    info: &mut ClassInfo,
    errors: &mut Vec<TranslateError>,
) {
    for stmt in body {
        match stmt {
            Statement::AnnAssign(ann) => {
                if let Some(field) = self_field_name(&ann.target) {
                    push_field(info, field, ann.annotation.clone());
                }
            }
            Statement::Assign(assign) => {
                if let Some(field) = self_field_name(&assign.target) {
                    let ty = initializer_type(ctor, &assign.value);
                    if matches!(ty, SemanticType::Unknown) {
                        errors.push(TranslateError::with_suggestion(
                            ErrorCode::TypeInferenceFailure,
                            format!(
                                "cannot determine the type of field '{}' from its initializer",
                                field
                            ),
                            assign.location,
                            format!("annotate the field, e.g. 'self.{}: int = ...'", field),
                        ));
                    }
                    push_field(info, field, ty);
                }
            }
            Statement::If(if_stmt) => {
                collect_fields(ctor, &if_stmt.then_branch, info, errors);
                collect_fields(ctor, &if_stmt.else_branch, info, errors);
            }
            _ => {}
        }
    }
}

fn push_field(info: &mut ClassInfo, name: String, ty: SemanticType) {
    if info.field_type(&name).is_none() {
        info.fields.push((name, ty));
    }
}

/// The field name when the expression is `self.<name>`
fn self_field_name(target: &Expression) -> Option<String> {
    match target {
        Expression::Attribute(attr) => match attr.object.as_ref() {
            Expression::Variable(var) if var.name == "self" => Some(attr.name.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// The type a constructor initializer gives a field, without running full
/// inference: a parameter reference uses the parameter's annotation, a
/// literal uses its own type, an empty display stays unknown
fn initializer_type(ctor: &FunctionDef, value: &Expression) -> SemanticType {
    match value {
        Expression::Variable(var) => ctor
            .parameters
            .iter()
            .find(|p| p.name == var.name)
            .map(|p| p.annotation.clone())
            .unwrap_or(SemanticType::Unknown),
        Expression::Literal(lit) => lit.ty.clone(),
        _ => SemanticType::Unknown,
    }
}
