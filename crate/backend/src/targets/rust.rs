//! Rust converter
//!
//! Emits Rust over `Vec`, `BTreeMap`, `BTreeSet`, and `String` (ordered
//! maps keep iteration deterministic). This is the target that consumes
//! the mutability classes: container, string, and object parameters
//! become `&T` or `&mut T` according to the analysis, and owned
//! composites return by move with explicit clones where a borrowed value
//! crosses the boundary.

use crate::converter::TargetConverter;
use crate::generated::GeneratedOutput;
use crate::loops::{classify, BodyPattern, IterationSource};
use crate::naming::NamingPolicy;
use crate::writer::FormatWriter;
use mgen_error::{CompileResult, ErrorCode, TranslateError};
use mgen_ir::SourceLocation;
use mgen_ir::ast::{
    BinaryOperator, BindingTarget, ClassDef, CompareOperator, Declaration, Expression,
    ForStatement, FunctionDef, LiteralValue, Module, Statement, UnaryOperator,
};
use mgen_shared::CompilationContext;
use mgen_types::{Mutability, SemanticType, Target};
use std::collections::HashSet;

pub struct RustConverter;

impl TargetConverter for RustConverter {
    fn target(&self) -> Target {
        Target::Rust
    }

    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput> {
        let mut emitter = RustEmitter::new(context);
        let text = emitter.emit_module(module);
        if emitter.errors.is_empty() {
            Ok(GeneratedOutput::single(format!("{}.rs", stem), text))
        } else {
            Err(emitter.errors)
        }
    }
}

struct RustEmitter<'a> {
    context: &'a mut CompilationContext,
    naming: NamingPolicy,
    errors: Vec<TranslateError>,
    declared: HashSet<String>,
    /// Parameters received by reference in the current function
    ref_params: HashSet<String>,
    /// Locals the body mutates, so bindings get `mut`
    mutated: HashSet<String>,
    /// Inside `new()`, `self` refers to the local under construction
    in_constructor: bool,
    uses_collections: bool,
}

impl<'a> RustEmitter<'a> {
    fn new(context: &'a mut CompilationContext) -> Self {
        RustEmitter {
            context,
            naming: NamingPolicy::for_target(Target::Rust),
            errors: Vec::new(),
            declared: HashSet::new(),
            ref_params: HashSet::new(),
            mutated: HashSet::new(),
            in_constructor: false,
            uses_collections: false,
        }
    }

    fn error(&mut self, code: ErrorCode, message: String, location: SourceLocation) {
        self.errors.push(TranslateError::new(code, message, location));
    }

    // ----- module layout -----

    fn emit_module(&mut self, module: &Module) -> String {
        let mut body = FormatWriter::new();

        for decl in &module.declarations {
            match decl {
                Declaration::GlobalVar(var) => {
                    if let Some(rust_ty) = self.rust_type(&var.annotation, var.location) {
                        let value = self.expr_or_error(&var.value);
                        body.line(format!(
                            "const {}: {} = {};",
                            var.name.to_uppercase(),
                            rust_ty,
                            value
                        ));
                        body.blank();
                    }
                }
                Declaration::Class(class) => self.emit_class(&mut body, class),
                Declaration::Function(func) => self.emit_function(&mut body, func),
                Declaration::Import(_) => {}
            }
        }

        if module.function("main").is_some() {
            body.line("fn main() {");
            body.indent();
            match module.function("main").map(|f| &f.return_type) {
                Some(SemanticType::Int) => {
                    body.line("std::process::exit(mgen_user_main() as i32);")
                }
                _ => body.line("mgen_user_main();"),
            }
            body.dedent();
            body.line("}");
        }

        let mut out = FormatWriter::new();
        if self.uses_collections {
            out.line("use std::collections::{BTreeMap, BTreeSet};");
            out.blank();
        }
        out.raw(body.finish());
        out.finish()
    }

    // ----- types -----

    fn rust_type(&mut self, ty: &SemanticType, location: SourceLocation) -> Option<String> {
        let mapped = match ty {
            SemanticType::Int => "i64".to_string(),
            SemanticType::Float => "f64".to_string(),
            SemanticType::Bool => "bool".to_string(),
            SemanticType::Str => "String".to_string(),
            SemanticType::Void => "()".to_string(),
            SemanticType::Object(name) => name.clone(),
            SemanticType::List(elem) => format!("Vec<{}>", self.rust_type(elem, location)?),
            SemanticType::Dict(key, value) => {
                self.uses_collections = true;
                format!(
                    "BTreeMap<{}, {}>",
                    self.rust_type(key, location)?,
                    self.rust_type(value, location)?
                )
            }
            SemanticType::Set(elem) => {
                self.uses_collections = true;
                format!("BTreeSet<{}>", self.rust_type(elem, location)?)
            }
            other => {
                self.error(
                    ErrorCode::UnsupportedFeature,
                    format!("the rust target cannot represent the type '{}'", other),
                    location,
                );
                return None;
            }
        };
        Some(mapped)
    }

    fn is_heavy(&self, ty: &SemanticType) -> bool {
        matches!(
            ty,
            SemanticType::List(_)
                | SemanticType::Dict(_, _)
                | SemanticType::Set(_)
                | SemanticType::Str
                | SemanticType::Object(_)
        )
    }

    fn is_copy(&self, ty: &SemanticType) -> bool {
        matches!(
            ty,
            SemanticType::Int | SemanticType::Float | SemanticType::Bool
        )
    }

    // ----- functions -----

    fn function_name(&self, name: &str) -> String {
        if name == "main" {
            "mgen_user_main".to_string()
        } else {
            self.naming.escape(name)
        }
    }

    fn reset_function_state(&mut self, func: &FunctionDef) {
        self.declared.clear();
        self.ref_params.clear();
        self.mutated = collect_mutated(&func.body);
        for param in &func.parameters {
            self.declared.insert(param.name.clone());
            if param.name == "self" || self.is_heavy(&param.annotation) {
                self.ref_params.insert(param.name.clone());
            }
        }
    }

    /// Parameter spelling driven by the mutability classes: shared
    /// references for ReadOnly and Immutable, exclusive for Mutable
    fn parameter_decl(&mut self, key: &str, param: &mgen_ir::ast::Parameter) -> Option<String> {
        let name = self.naming.escape(&param.name);
        if matches!(param.annotation, SemanticType::Str) {
            // Value-immutable strings always arrive as shared slices
            return Some(format!("{}: &str", name));
        }
        let rust_ty = self.rust_type(&param.annotation, param.location)?;
        if self.is_heavy(&param.annotation) {
            let mutability = self.context.mutability(key, &param.name);
            if mutability == Mutability::Mutable {
                Some(format!("{}: &mut {}", name, rust_ty))
            } else {
                Some(format!("{}: &{}", name, rust_ty))
            }
        } else {
            Some(format!("{}: {}", name, rust_ty))
        }
    }

    fn emit_function(&mut self, out: &mut FormatWriter, func: &FunctionDef) {
        self.reset_function_state(func);

        let params: Vec<String> = func
            .value_parameters()
            .iter()
            .filter_map(|p| {
                let key = func.name.clone();
                self.parameter_decl(&key, p)
            })
            .collect();
        let ret = match &func.return_type {
            SemanticType::Void => String::new(),
            other => {
                let mapped = self
                    .rust_type(other, func.location)
                    .unwrap_or_else(|| "()".to_string());
                format!(" -> {}", mapped)
            }
        };

        out.line(format!(
            "fn {}({}){} {{",
            self.function_name(&func.name),
            params.join(", "),
            ret
        ));
        out.indent();
        self.emit_block(out, &func.body);
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn emit_class(&mut self, out: &mut FormatWriter, class: &ClassDef) {
        let fields = self
            .context
            .class_info(&class.name)
            .map(|info| info.fields.clone())
            .unwrap_or_default();

        out.line("#[derive(Debug, Clone, Default)]");
        out.line(format!("struct {} {{", class.name));
        out.indent();
        for (name, ty) in &fields {
            if let Some(rust_ty) = self.rust_type(ty, class.location) {
                out.line(format!("{}: {},", self.naming.escape(name), rust_ty));
            }
        }
        out.dedent();
        out.line("}");
        out.blank();

        out.line(format!("impl {} {{", class.name));
        out.indent();
        for method in &class.methods {
            self.emit_method(out, method, class);
        }
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn emit_method(&mut self, out: &mut FormatWriter, method: &FunctionDef, class: &ClassDef) {
        let key = format!("{}.{}", class.name, method.name);
        self.reset_function_state(method);

        if method.name == "__init__" {
            let params: Vec<String> = method
                .value_parameters()
                .iter()
                .filter_map(|p| self.parameter_decl(&key, p))
                .collect();
            out.line(format!("fn new({}) -> Self {{", params.join(", ")));
            out.indent();
            out.line("let mut self_ = Self::default();");
            self.in_constructor = true;
            self.emit_block(out, &method.body);
            self.in_constructor = false;
            out.line("self_");
            out.dedent();
            out.line("}");
            out.blank();
            return;
        }

        let self_param = if self.context.mutability(&key, "self") == Mutability::Mutable {
            "&mut self"
        } else {
            "&self"
        };
        let mut params = vec![self_param.to_string()];
        params.extend(
            method
                .value_parameters()
                .iter()
                .filter_map(|p| self.parameter_decl(&key, p)),
        );
        let ret = match &method.return_type {
            SemanticType::Void => String::new(),
            other => {
                let mapped = self
                    .rust_type(other, method.location)
                    .unwrap_or_else(|| "()".to_string());
                format!(" -> {}", mapped)
            }
        };

        out.line(format!(
            "fn {}({}){} {{",
            self.naming.escape(&method.name),
            params.join(", "),
            ret
        ));
        out.indent();
        self.emit_block(out, &method.body);
        out.dedent();
        out.line("}");
        out.blank();
    }

    // ----- statements -----

    fn emit_block(&mut self, out: &mut FormatWriter, statements: &[Statement]) {
        for stmt in statements {
            self.emit_statement(out, stmt);
        }
    }

    fn emit_statement(&mut self, out: &mut FormatWriter, stmt: &Statement) {
        match stmt {
            Statement::AnnAssign(ann) => match (&ann.target, &ann.value) {
                (Expression::Variable(var), Some(value)) => {
                    self.emit_binding(out, &var.name, &ann.annotation, value, ann.location);
                }
                (Expression::Variable(var), None) => {
                    if let Some(rust_ty) = self.rust_type(&ann.annotation, ann.location) {
                        out.line(format!(
                            "let mut {}: {} = Default::default();",
                            self.naming.escape(&var.name),
                            rust_ty
                        ));
                        self.declared.insert(var.name.clone());
                    }
                }
                (target, Some(value)) => {
                    let target_text = self.expr_or_error(target);
                    let value_text = self.owned_value(value, &ann.annotation);
                    out.line(format!("{} = {};", target_text, value_text));
                }
                _ => {}
            },
            Statement::Assign(assign) => self.emit_assign(out, assign),
            Statement::AugAssign(aug) => {
                let target_ty = aug.target.ty().clone();
                let target = self.expr_or_error(&aug.target);
                let value = self.expr_or_error(&aug.value);
                let ints = matches!(target_ty, SemanticType::Int);
                match aug.operator {
                    BinaryOperator::FloorDivide if ints => {
                        out.line(format!("{} = {}.div_euclid({});", target, target, value));
                    }
                    BinaryOperator::Modulo if ints => {
                        out.line(format!("{} = {}.rem_euclid({});", target, target, value));
                    }
                    BinaryOperator::FloorDivide => {
                        out.line(format!("{} = ({} / {}).floor();", target, target, value));
                    }
                    BinaryOperator::Power => {
                        let powered = self.power_text(&target, &value, ints);
                        out.line(format!("{} = {};", target, powered));
                    }
                    BinaryOperator::Divide => {
                        out.line(format!("{} = {} as f64 / {} as f64;", target, target, value));
                    }
                    BinaryOperator::Add if matches!(target_ty, SemanticType::Str) => {
                        out.line(format!("{} = format!(\"{{}}{{}}\", {}, {});", target, target, value));
                    }
                    op => out.line(format!("{} {}= {};", target, op, value)),
                }
            }
            Statement::If(if_stmt) => {
                let condition = self.expr_or_error(&if_stmt.condition);
                out.line(format!("if {} {{", condition));
                out.indent();
                self.emit_block(out, &if_stmt.then_branch);
                out.dedent();
                if if_stmt.else_branch.is_empty() {
                    out.line("}");
                } else {
                    out.line("} else {");
                    out.indent();
                    self.emit_block(out, &if_stmt.else_branch);
                    out.dedent();
                    out.line("}");
                }
            }
            Statement::While(while_stmt) => {
                // `while True:` becomes the idiomatic infinite loop
                match &while_stmt.condition {
                    Expression::Literal(lit) if lit.value == LiteralValue::Bool(true) => {
                        out.line("loop {");
                    }
                    other => {
                        let condition = self.expr_or_error(other);
                        out.line(format!("while {} {{", condition));
                    }
                }
                out.indent();
                self.emit_block(out, &while_stmt.body);
                out.dedent();
                out.line("}");
            }
            Statement::For(for_stmt) => self.emit_for(out, for_stmt),
            Statement::Return(ret) => match &ret.value {
                None => out.line("return;"),
                Some(Expression::Literal(lit)) if lit.value == LiteralValue::None => {
                    out.line("return;")
                }
                Some(value) => {
                    let ty = value.ty().clone();
                    let text = self.owned_value(value, &ty);
                    out.line(format!("return {};", text));
                }
            },
            Statement::Expression(expr_stmt) => {
                let text = self.expr_or_error(&expr_stmt.expression);
                out.line(format!("{};", text));
            }
            Statement::Pass(_) => {}
            Statement::Break(_) => out.line("break;"),
            Statement::Continue(_) => out.line("continue;"),
        }
    }

    fn emit_binding(
        &mut self,
        out: &mut FormatWriter,
        name: &str,
        ty: &SemanticType,
        value: &Expression,
        location: SourceLocation,
    ) {
        let escaped = self.naming.escape(name);
        let value_text = self.owned_value(value, ty);
        if self.declared.contains(name) {
            out.line(format!("{} = {};", escaped, value_text));
        } else if let Some(rust_ty) = self.rust_type(ty, location) {
            let mutability = if self.mutated.contains(name) { "mut " } else { "" };
            out.line(format!(
                "let {}{}: {} = {};",
                mutability, escaped, rust_ty, value_text
            ));
            self.declared.insert(name.to_string());
        }
    }

    fn emit_assign(&mut self, out: &mut FormatWriter, assign: &mgen_ir::ast::AssignStatement) {
        match &assign.target {
            Expression::Variable(var) => {
                let ty = assign.target.ty().clone();
                self.emit_binding(out, &var.name, &ty, &assign.value, assign.location);
            }
            Expression::Subscript(sub) => {
                let object_ty = sub.object.ty().clone();
                match &object_ty {
                    SemanticType::Dict(key_ty, value_ty) => {
                        let object = self.expr_or_error(&sub.object);
                        let key = self.owned_value(&sub.index, key_ty);
                        let value = self.owned_value(&assign.value, value_ty);
                        out.line(format!("{}.insert({}, {});", object, key, value));
                    }
                    SemanticType::List(elem_ty) => {
                        let object = self.expr_or_error(&sub.object);
                        let index = self.expr_or_error(&sub.index);
                        let value = self.owned_value(&assign.value, elem_ty);
                        out.line(format!("{}[{} as usize] = {};", object, index, value));
                    }
                    other => {
                        self.error(
                            ErrorCode::UnsupportedMethod,
                            format!("subscript assignment on '{}' is not supported", other),
                            assign.location,
                        );
                    }
                }
            }
            target => {
                let target_text = self.expr_or_error(target);
                let ty = target.ty().clone();
                let value_text = self.owned_value(&assign.value, &ty);
                out.line(format!("{} = {};", target_text, value_text));
            }
        }
    }

    // ----- loops -----

    fn emit_for(&mut self, out: &mut FormatWriter, for_stmt: &ForStatement) {
        match &for_stmt.target {
            BindingTarget::Name(name) => {
                self.declared.insert(name.clone());
            }
            BindingTarget::Pair(a, b) => {
                self.declared.insert(a.clone());
                self.declared.insert(b.clone());
            }
        }
        let shape = classify(for_stmt);

        // Append-build over a plain range becomes extend + map
        if let (IterationSource::Range(args), BodyPattern::AppendBuild { list, element }) =
            (&shape.source, &shape.body)
        {
            if args.len() <= 2 {
                if let Some(var) = for_stmt.target.single_name() {
                    let range = self.range_text(args);
                    let elem = self.expr_or_error(element);
                    out.line(format!(
                        "{}.extend({}.map(|{}| {}));",
                        self.naming.escape(list),
                        range,
                        self.naming.escape(var),
                        elem
                    ));
                    return;
                }
            }
        }

        match shape.source {
            IterationSource::Range(args) => {
                let Some(var) = for_stmt.target.single_name() else {
                    return self.error(
                        ErrorCode::GenerationFailure,
                        "range loops bind a single variable".to_string(),
                        for_stmt.location,
                    );
                };
                if args.len() <= 2 {
                    let range = self.range_text(args);
                    out.line(format!(
                        "for {} in {} {{",
                        self.naming.escape(var),
                        range
                    ));
                    out.indent();
                    self.emit_block(out, &for_stmt.body);
                    out.dedent();
                    out.line("}");
                } else {
                    // Arbitrary steps (including negative) lower to a
                    // while loop with an explicit induction variable
                    let start = self.expr_or_error(&args[0]);
                    let stop = self.expr_or_error(&args[1]);
                    let step = self.expr_or_error(&args[2]);
                    let name = self.naming.escape(var);
                    out.line(format!("let mut {} = {};", name, start));
                    out.line(format!(
                        "while ({step} > 0 && {name} < {stop}) || ({step} < 0 && {name} > {stop}) {{",
                    ));
                    out.indent();
                    self.emit_block(out, &for_stmt.body);
                    out.line(format!("{} += {};", name, step));
                    out.dedent();
                    out.line("}");
                }
            }
            IterationSource::Container(iterable) => {
                self.emit_container_for(out, for_stmt, iterable);
            }
        }
    }

    fn range_text(&mut self, args: &[Expression]) -> String {
        match args {
            [stop] => format!("(0..{})", self.expr_or_error(stop)),
            [start, stop] => format!(
                "({}..{})",
                self.expr_or_error(start),
                self.expr_or_error(stop)
            ),
            _ => String::from("(0..0)"),
        }
    }

    fn emit_container_for(
        &mut self,
        out: &mut FormatWriter,
        for_stmt: &ForStatement,
        iterable: &Expression,
    ) {
        // Dict iterations
        if let Expression::Call(call) = iterable {
            if let Some((receiver, method)) = call.method_parts() {
                if method == "items" {
                    if let BindingTarget::Pair(k, v) = &for_stmt.target {
                        let obj = self.expr_or_error(receiver);
                        out.line(format!(
                            "for ({}, {}) in {}.iter() {{",
                            self.naming.escape(k),
                            self.naming.escape(v),
                            obj
                        ));
                        out.indent();
                        out.line(format!(
                            "let {k} = {k}.clone();",
                            k = self.naming.escape(k)
                        ));
                        out.line(format!(
                            "let {v} = {v}.clone();",
                            v = self.naming.escape(v)
                        ));
                        self.emit_block(out, &for_stmt.body);
                        out.dedent();
                        out.line("}");
                        return;
                    }
                }
                if method == "keys" {
                    if let Some(var) = for_stmt.target.single_name() {
                        let obj = self.expr_or_error(receiver);
                        out.line(format!(
                            "for {} in {}.keys().cloned() {{",
                            self.naming.escape(var),
                            obj
                        ));
                        out.indent();
                        self.emit_block(out, &for_stmt.body);
                        out.dedent();
                        out.line("}");
                        return;
                    }
                }
                if method == "values" {
                    if let Some(var) = for_stmt.target.single_name() {
                        let obj = self.expr_or_error(receiver);
                        out.line(format!(
                            "for {} in {}.values().cloned() {{",
                            self.naming.escape(var),
                            obj
                        ));
                        out.indent();
                        self.emit_block(out, &for_stmt.body);
                        out.dedent();
                        out.line("}");
                        return;
                    }
                }
            }
        }

        let Some(var) = for_stmt.target.single_name() else {
            return self.error(
                ErrorCode::GenerationFailure,
                "pair targets require iterating .items()".to_string(),
                for_stmt.location,
            );
        };
        let iter_ty = iterable.ty().clone();
        let obj = self.expr_or_error(iterable);
        let iteration = match &iter_ty {
            SemanticType::Dict(_, _) => format!("{}.keys().cloned()", obj),
            SemanticType::List(_) | SemanticType::Set(_) => format!("{}.iter().cloned()", obj),
            SemanticType::Str => format!("{}.chars().map(|c| c.to_string())", obj),
            other => {
                return self.error(
                    ErrorCode::GenerationFailure,
                    format!("cannot iterate a value of type '{}'", other),
                    for_stmt.location,
                );
            }
        };
        out.line(format!(
            "for {} in {} {{",
            self.naming.escape(var),
            iteration
        ));
        out.indent();
        self.emit_block(out, &for_stmt.body);
        out.dedent();
        out.line("}");
    }

    // ----- expressions -----

    fn expr_or_error(&mut self, expr: &Expression) -> String {
        match self.emit_expression(expr) {
            Ok(text) => text,
            Err(error) => {
                self.errors.push(error);
                "0".to_string()
            }
        }
    }

    /// An expression as an owned value of `ty`: borrowed bindings are
    /// cloned, string slices become owned strings
    fn owned_value(&mut self, expr: &Expression, ty: &SemanticType) -> String {
        let text = self.expr_or_error(expr);
        if self.is_copy(ty) {
            return text;
        }
        match expr {
            Expression::Literal(lit) if matches!(lit.value, LiteralValue::Str(_)) => {
                format!("{}.to_string()", text)
            }
            Expression::Variable(var) => {
                if matches!(ty, SemanticType::Str) && self.ref_params.contains(&var.name) {
                    format!("{}.to_string()", text)
                } else if self.is_heavy(ty) {
                    // Locals stay usable after the store
                    format!("{}.clone()", text)
                } else {
                    text
                }
            }
            Expression::Attribute(_) if self.is_heavy(ty) => format!("{}.clone()", text),
            Expression::Subscript(_) if self.is_heavy(ty) => format!("{}.clone()", text),
            _ => text,
        }
    }

    fn power_text(&self, base: &str, exp: &str, ints: bool) -> String {
        if ints {
            format!("{}.pow({} as u32)", base, exp)
        } else {
            format!("{}.powf({})", base, exp)
        }
    }

    fn emit_expression(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Int(value) => format!("{}", value),
                LiteralValue::Float(value) => format_float(*value),
                LiteralValue::Bool(value) => format!("{}", value),
                LiteralValue::Str(value) => rust_string_literal(value),
                LiteralValue::None => "()".to_string(),
            }),
            Expression::Variable(var) => {
                if var.name == "self" {
                    return Ok(if self.in_constructor {
                        "self_".to_string()
                    } else {
                        "self".to_string()
                    });
                }
                // Module constants are emitted uppercased
                if self.context.lookup_symbol(&var.name).is_some()
                    && !self.declared.contains(&var.name)
                    && !matches!(var.ty, SemanticType::Callable(_, _))
                    && self.context.function_signature(&var.name).is_none()
                    && !self.context.is_class(&var.name)
                {
                    return Ok(var.name.to_uppercase());
                }
                Ok(self.naming.escape(&var.name))
            }
            Expression::Binary(bin) => {
                let ints = matches!(bin.ty, SemanticType::Int);
                let left_ty = bin.left.ty().clone();
                let left = self.emit_expression(&bin.left)?;
                let right = self.emit_expression(&bin.right)?;
                Ok(match bin.operator {
                    BinaryOperator::Add if matches!(left_ty, SemanticType::Str) => {
                        format!("format!(\"{{}}{{}}\", {}, {})", left, right)
                    }
                    BinaryOperator::Divide => {
                        format!("({} as f64 / {} as f64)", left, right)
                    }
                    BinaryOperator::FloorDivide if ints => {
                        format!("({}).div_euclid({})", left, right)
                    }
                    BinaryOperator::FloorDivide => format!("({} / {}).floor()", left, right),
                    BinaryOperator::Modulo if ints => {
                        format!("({}).rem_euclid({})", left, right)
                    }
                    BinaryOperator::Modulo => format!("({} % {})", left, right),
                    BinaryOperator::Power => {
                        format!("({})", self.power_text(&format!("({})", left), &right, ints))
                    }
                    op => format!("({} {} {})", left, op, right),
                })
            }
            Expression::Unary(unary) => {
                let operand = self.emit_expression(&unary.operand)?;
                Ok(match unary.operator {
                    UnaryOperator::Negate => format!("(-{})", operand),
                    UnaryOperator::Not => format!("(!{})", operand),
                    UnaryOperator::Invert => format!("(!{})", operand),
                })
            }
            Expression::Boolean(boolean) => {
                let left = self.emit_expression(&boolean.left)?;
                let right = self.emit_expression(&boolean.right)?;
                let op = match boolean.operator {
                    mgen_ir::ast::BoolOperator::And => "&&",
                    mgen_ir::ast::BoolOperator::Or => "||",
                };
                Ok(format!("({} {} {})", left, op, right))
            }
            Expression::Comparison(cmp) => {
                if matches!(cmp.operator, CompareOperator::In | CompareOperator::NotIn) {
                    let text = self.emit_membership(cmp)?;
                    return Ok(if cmp.operator == CompareOperator::NotIn {
                        format!("(!{})", text)
                    } else {
                        text
                    });
                }
                let left = self.emit_expression(&cmp.left)?;
                let right = self.emit_expression(&cmp.right)?;
                // The std cross-impls cover owned/borrowed string pairs
                Ok(format!("({} {} {})", left, cmp.operator, right))
            }
            Expression::Call(call) => self.emit_call(call),
            Expression::Attribute(attr) => {
                let object = self.emit_expression(&attr.object)?;
                Ok(format!("{}.{}", object, self.naming.escape(&attr.name)))
            }
            Expression::Subscript(sub) => {
                let object = self.emit_expression(&sub.object)?;
                let index = self.emit_expression(&sub.index)?;
                match sub.object.ty() {
                    SemanticType::Dict(_, _) => Ok(format!("{}[&{}]", object, index)),
                    SemanticType::Str => Ok(format!(
                        "{}.chars().nth({} as usize).map(|c| c.to_string()).unwrap_or_default()",
                        object, index
                    )),
                    _ => Ok(format!("{}[{} as usize]", object, index)),
                }
            }
            Expression::ListDisplay(list) => {
                let elem_ty = match &list.ty {
                    SemanticType::List(elem) => (**elem).clone(),
                    _ => SemanticType::Unknown,
                };
                let elems: Vec<String> = list
                    .elements
                    .iter()
                    .map(|e| self.owned_value(e, &elem_ty))
                    .collect();
                if elems.is_empty() {
                    Ok("Vec::new()".to_string())
                } else {
                    Ok(format!("vec![{}]", elems.join(", ")))
                }
            }
            Expression::SetDisplay(set) => {
                self.uses_collections = true;
                let elem_ty = match &set.ty {
                    SemanticType::Set(elem) => (**elem).clone(),
                    _ => SemanticType::Unknown,
                };
                let elems: Vec<String> = set
                    .elements
                    .iter()
                    .map(|e| self.owned_value(e, &elem_ty))
                    .collect();
                Ok(format!("BTreeSet::from([{}])", elems.join(", ")))
            }
            Expression::DictDisplay(dict) => {
                self.uses_collections = true;
                let (key_ty, value_ty) = match &dict.ty {
                    SemanticType::Dict(k, v) => ((**k).clone(), (**v).clone()),
                    _ => (SemanticType::Unknown, SemanticType::Unknown),
                };
                let mut pairs = Vec::new();
                for (key, value) in dict.keys.iter().zip(&dict.values) {
                    pairs.push(format!(
                        "({}, {})",
                        self.owned_value(key, &key_ty),
                        self.owned_value(value, &value_ty)
                    ));
                }
                Ok(format!("BTreeMap::from([{}])", pairs.join(", ")))
            }
            Expression::ListComp(comp) => {
                let elem = self.expr_or_error(&comp.element);
                self.emit_comprehension(&comp.generator, &elem, "collect::<Vec<_>>()")
            }
            Expression::SetComp(comp) => {
                self.uses_collections = true;
                let elem = self.expr_or_error(&comp.element);
                self.emit_comprehension(&comp.generator, &elem, "collect::<BTreeSet<_>>()")
            }
            Expression::DictComp(comp) => {
                self.uses_collections = true;
                let key = self.expr_or_error(&comp.key);
                let value = self.expr_or_error(&comp.value);
                let pair = format!("({}, {})", key, value);
                self.emit_comprehension(&comp.generator, &pair, "collect::<BTreeMap<_, _>>()")
            }
            Expression::TupleDisplay(tuple) => {
                let elems: Result<Vec<String>, TranslateError> =
                    tuple.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("({})", elems?.join(", ")))
            }
        }
    }

    /// Comprehensions become iterator chains: source, optional filter,
    /// map, collect
    fn emit_comprehension(
        &mut self,
        generator: &mgen_ir::ast::Comprehension,
        element: &str,
        collect: &str,
    ) -> Result<String, TranslateError> {
        let Some(var) = generator.target.single_name() else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "pair targets in comprehensions are not supported for the rust target"
                    .to_string(),
                generator.iterable.location(),
            ));
        };
        let var = self.naming.escape(var);

        let source = match generator.iterable.as_ref() {
            Expression::Call(call) if call.callee_name() == Some("range") => {
                self.range_text(&call.arguments)
            }
            other => {
                let obj = self.emit_expression(other)?;
                match other.ty() {
                    SemanticType::Dict(_, _) => format!("{}.keys().cloned()", obj),
                    _ => format!("{}.iter().cloned()", obj),
                }
            }
        };

        let filter = match &generator.condition {
            Some(condition) => {
                let cond = self.emit_expression(condition)?;
                format!(".filter(|&{}| {})", var, cond)
            }
            None => String::new(),
        };

        Ok(format!(
            "{}{}.map(|{}| {}).{}",
            source, filter, var, element, collect
        ))
    }

    fn emit_membership(
        &mut self,
        cmp: &mgen_ir::ast::ComparisonExpr,
    ) -> Result<String, TranslateError> {
        // String-literal needles are owned so one borrow shape serves
        // every container
        let needle = match cmp.left.as_ref() {
            Expression::Literal(lit) if matches!(lit.value, LiteralValue::Str(_)) => {
                format!("{}.to_string()", self.emit_expression(&cmp.left)?)
            }
            _ => self.emit_expression(&cmp.left)?,
        };
        let haystack = self.emit_expression(&cmp.right)?;
        match cmp.right.ty() {
            SemanticType::Dict(_, _) => {
                Ok(format!("{}.contains_key(&{})", haystack, needle))
            }
            SemanticType::Set(_) | SemanticType::List(_) => {
                Ok(format!("{}.contains(&{})", haystack, needle))
            }
            SemanticType::Str => Ok(format!("{}.contains(&{})", haystack, needle)),
            other => Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                format!("membership tests on '{}' are not supported", other),
                cmp.location,
            )),
        }
    }

    fn emit_call(&mut self, call: &mgen_ir::ast::CallExpr) -> Result<String, TranslateError> {
        if let Some((receiver, method)) = call.method_parts() {
            return self.emit_method_call(call, receiver, method);
        }

        let Some(name) = call.callee_name() else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "unsupported call target".to_string(),
                call.location,
            ));
        };

        match name {
            "print" => return self.emit_print(call),
            "len" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => format!("({}.chars().count() as i64)", arg),
                    _ => format!("({}.len() as i64)", arg),
                });
            }
            "abs" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(format!("({}).abs()", arg));
            }
            "min" | "max" => {
                if call.arguments.len() == 1 {
                    let arg = self.emit_expression(&call.arguments[0])?;
                    return Ok(format!(
                        "{}.iter().cloned().{}().unwrap_or_default()",
                        arg, name
                    ));
                }
                let a = self.emit_expression(&call.arguments[0])?;
                let b = self.emit_expression(&call.arguments[1])?;
                return Ok(format!("std::cmp::{}({}, {})", name, a, b));
            }
            "sum" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                let elem = match call.arguments[0].ty() {
                    SemanticType::List(elem) | SemanticType::Set(elem)
                        if matches!(elem.as_ref(), SemanticType::Float) =>
                    {
                        "f64"
                    }
                    _ => "i64",
                };
                return Ok(format!("{}.iter().sum::<{}>()", arg, elem));
            }
            "str" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Bool => {
                        format!("(if {} {{ \"True\" }} else {{ \"False\" }}).to_string()", arg)
                    }
                    _ => format!("{}.to_string()", arg),
                });
            }
            "int" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => format!("{}.parse::<i64>().unwrap_or_default()", arg),
                    SemanticType::Bool => format!("({} as i64)", arg),
                    _ => format!("({} as i64)", arg),
                });
            }
            "float" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => format!("{}.parse::<f64>().unwrap_or_default()", arg),
                    _ => format!("({} as f64)", arg),
                });
            }
            "bool" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Int => format!("({} != 0)", arg),
                    SemanticType::Float => format!("({} != 0.0)", arg),
                    SemanticType::Str => format!("(!{}.is_empty())", arg),
                    _ => arg,
                });
            }
            "list" => return Ok("Vec::new()".to_string()),
            "set" => {
                self.uses_collections = true;
                return Ok("BTreeSet::new()".to_string());
            }
            "dict" => {
                self.uses_collections = true;
                return Ok("BTreeMap::new()".to_string());
            }
            "range" => {
                return Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedMethod,
                    "range() is only supported as a loop header".to_string(),
                    call.location,
                    "iterate the range directly in a for loop".to_string(),
                ));
            }
            _ => {}
        }

        // Constructor call
        if self.context.is_class(name) {
            let params = self
                .context
                .class_info(name)
                .and_then(|info| info.methods.get("__init__"))
                .map(|sig| sig.params.clone())
                .unwrap_or_default();
            let args = self.emit_arguments(&call.arguments, &params, name)?;
            return Ok(format!("{}::new({})", name, args));
        }

        // User function call
        let params = self
            .context
            .function_signature(name)
            .map(|sig| sig.params.clone())
            .unwrap_or_default();
        let key = name.to_string();
        let args = self.emit_arguments(&call.arguments, &params, &key)?;
        Ok(format!("{}({})", self.function_name(name), args))
    }

    /// Emits call arguments with the borrow shape each parameter expects
    fn emit_arguments(
        &mut self,
        arguments: &[Expression],
        params: &[(String, SemanticType)],
        function_key: &str,
    ) -> Result<String, TranslateError> {
        let mut parts = Vec::new();
        for (i, arg) in arguments.iter().enumerate() {
            let text = self.emit_expression(arg)?;
            let part = match params.get(i) {
                Some((param_name, param_ty)) if matches!(param_ty, SemanticType::Str) => {
                    let _ = param_name;
                    match arg {
                        Expression::Literal(_) => text,
                        _ => format!("&{}", text),
                    }
                }
                Some((param_name, param_ty)) if self.is_heavy(param_ty) => {
                    let mutable = self.context.mutability(function_key, param_name)
                        == Mutability::Mutable;
                    if mutable {
                        format!("&mut {}", text)
                    } else {
                        format!("&{}", text)
                    }
                }
                _ => text,
            };
            parts.push(part);
        }
        Ok(parts.join(", "))
    }

    fn emit_method_call(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        receiver: &Expression,
        method: &str,
    ) -> Result<String, TranslateError> {
        let receiver_ty = receiver.ty().clone();
        let recv = self.emit_expression(receiver)?;

        match &receiver_ty {
            SemanticType::List(elem_ty) => match method {
                "append" => {
                    let value = self.owned_value(&call.arguments[0], elem_ty);
                    Ok(format!("{}.push({})", recv, value))
                }
                "pop" => Ok(format!("{}.pop().unwrap_or_default()", recv)),
                "clear" => Ok(format!("{}.clear()", recv)),
                "extend" => {
                    let other = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("{}.extend({}.iter().cloned())", recv, other))
                }
                "insert" => {
                    let index = self.emit_expression(&call.arguments[0])?;
                    let value = self.owned_value(&call.arguments[1], elem_ty);
                    Ok(format!("{}.insert({} as usize, {})", recv, index, value))
                }
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Dict(key_ty, _) => match method {
                "get" => {
                    let key = self.key_ref(&call.arguments[0], key_ty)?;
                    Ok(format!(
                        "{}.get({}).cloned().unwrap_or_default()",
                        recv, key
                    ))
                }
                "pop" | "erase" => {
                    let key = self.key_ref(&call.arguments[0], key_ty)?;
                    Ok(format!("{}.remove({}).unwrap_or_default()", recv, key))
                }
                "clear" => Ok(format!("{}.clear()", recv)),
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Set(elem_ty) => match method {
                "add" => {
                    let value = self.owned_value(&call.arguments[0], elem_ty);
                    Ok(format!("{}.insert({})", recv, value))
                }
                "remove" | "discard" => {
                    let value = self.key_ref(&call.arguments[0], elem_ty)?;
                    Ok(format!("{}.remove({})", recv, value))
                }
                "clear" => Ok(format!("{}.clear()", recv)),
                "union" | "intersection" | "difference" => {
                    let other = self.emit_expression(&call.arguments[0])?;
                    Ok(format!(
                        "{}.{}(&{}).cloned().collect::<BTreeSet<_>>()",
                        recv, method, other
                    ))
                }
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Str => match method {
                "upper" => Ok(format!("{}.to_uppercase()", recv)),
                "lower" => Ok(format!("{}.to_lowercase()", recv)),
                "strip" => Ok(format!("{}.trim().to_string()", recv)),
                "replace" => {
                    let from = self.emit_expression(&call.arguments[0])?;
                    let to = self.emit_expression(&call.arguments[1])?;
                    Ok(format!("{}.replace(&{}, &{})", recv, from, to))
                }
                "find" => {
                    let needle = self.emit_expression(&call.arguments[0])?;
                    Ok(format!(
                        "{}.find(&{}).map(|i| i as i64).unwrap_or(-1)",
                        recv, needle
                    ))
                }
                "startswith" => {
                    let prefix = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("{}.starts_with(&{})", recv, prefix))
                }
                "endswith" => {
                    let suffix = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("{}.ends_with(&{})", recv, suffix))
                }
                "split" => {
                    let delim = self.emit_expression(&call.arguments[0])?;
                    Ok(format!(
                        "{}.split(&{} as &str).map(|s| s.to_string()).collect::<Vec<String>>()",
                        recv, delim
                    ))
                }
                "join" => {
                    let parts = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("{}.join(&{})", parts, recv))
                }
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Object(_) => {
                let args: Result<Vec<String>, TranslateError> =
                    call.arguments.iter().map(|a| self.emit_expression(a)).collect();
                Ok(format!(
                    "{}.{}({})",
                    recv,
                    self.naming.escape(method),
                    args?.join(", ")
                ))
            }
            other => Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                format!("method call on unsupported receiver type '{}'", other),
                call.location,
            )),
        }
    }

    /// A key argument as the reference shape map lookups expect
    fn key_ref(
        &mut self,
        arg: &Expression,
        key_ty: &SemanticType,
    ) -> Result<String, TranslateError> {
        let text = self.emit_expression(arg)?;
        if matches!(key_ty, SemanticType::Str) {
            Ok(format!("{}.as_ref() as &str", text))
        } else {
            Ok(format!("&{}", text))
        }
    }

    fn unsupported_method(
        &self,
        method: &str,
        receiver_ty: &SemanticType,
        location: SourceLocation,
    ) -> Result<String, TranslateError> {
        Err(TranslateError::with_suggestion(
            ErrorCode::UnsupportedMethod,
            format!(
                "method '{}' on '{}' is not implemented for the rust target",
                method, receiver_ty
            ),
            location,
            "rewrite the operation with supported primitives".to_string(),
        ))
    }

    fn emit_print(&mut self, call: &mgen_ir::ast::CallExpr) -> Result<String, TranslateError> {
        let mut format_parts = Vec::new();
        let mut args = Vec::new();
        for arg in &call.arguments {
            format_parts.push("{}");
            let text = self.emit_expression(arg)?;
            match arg.ty() {
                SemanticType::Bool => {
                    args.push(format!("if {} {{ \"True\" }} else {{ \"False\" }}", text))
                }
                _ => args.push(text),
            }
        }
        if args.is_empty() {
            Ok("println!()".to_string())
        } else {
            Ok(format!(
                "println!(\"{}\", {})",
                format_parts.join(" "),
                args.join(", ")
            ))
        }
    }
}

/// Collects the names the function body re-binds or mutates, to decide
/// which `let` bindings need `mut`
///
/// The first plain assignment of a name is its declaration, not a
/// mutation; only later stores and mutating method calls count.
fn collect_mutated(body: &[Statement]) -> HashSet<String> {
    let mut mutated = HashSet::new();
    let mut bound = HashSet::new();
    scan_block(body, &mut mutated, &mut bound);
    mutated
}

fn scan_block(
    statements: &[Statement],
    mutated: &mut HashSet<String>,
    bound: &mut HashSet<String>,
) {
    for stmt in statements {
        match stmt {
            Statement::Assign(assign) => {
                mark_store(&assign.target, mutated, bound);
            }
            Statement::AugAssign(aug) => {
                if let Some(name) = root_name(&aug.target) {
                    mutated.insert(name);
                }
            }
            Statement::AnnAssign(ann) => {
                if let Expression::Variable(var) = &ann.target {
                    bound.insert(var.name.clone());
                } else if let Some(name) = root_name(&ann.target) {
                    mutated.insert(name);
                }
            }
            Statement::If(if_stmt) => {
                scan_block(&if_stmt.then_branch, mutated, bound);
                scan_block(&if_stmt.else_branch, mutated, bound);
            }
            Statement::While(while_stmt) => scan_block(&while_stmt.body, mutated, bound),
            Statement::For(for_stmt) => scan_block(&for_stmt.body, mutated, bound),
            Statement::Expression(expr_stmt) => {
                scan_mutating_calls(&expr_stmt.expression, mutated)
            }
            _ => {}
        }
    }
}

/// A plain store: declaration on first sight, mutation afterwards.
/// Subscript and attribute stores always mutate their root object.
fn mark_store(target: &Expression, mutated: &mut HashSet<String>, bound: &mut HashSet<String>) {
    match target {
        Expression::Variable(var) => {
            if !bound.insert(var.name.clone()) {
                mutated.insert(var.name.clone());
            }
        }
        other => {
            if let Some(name) = root_name(other) {
                mutated.insert(name);
            }
        }
    }
}

fn root_name(target: &Expression) -> Option<String> {
    match target {
        Expression::Variable(var) => Some(var.name.clone()),
        Expression::Subscript(sub) => root_name(&sub.object),
        Expression::Attribute(attr) => root_name(&attr.object),
        _ => None,
    }
}

fn scan_mutating_calls(expr: &Expression, mutated: &mut HashSet<String>) {
    if let Expression::Call(call) = expr {
        if let Some((receiver, method)) = call.method_parts() {
            if let Some(kind) = receiver.ty().container_kind() {
                if kind.is_mutating_method(method) {
                    if let Some(name) = root_name(receiver) {
                        mutated.insert(name);
                    }
                }
            } else if matches!(receiver.ty(), SemanticType::Object(_)) {
                if let Some(name) = root_name(receiver) {
                    mutated.insert(name);
                }
            }
        }
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn rust_string_literal(value: &str) -> String {
    format!("{:?}", value)
}
