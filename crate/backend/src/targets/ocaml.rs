//! OCaml converter
//!
//! Emits OCaml that leans on the language's impure side: locals the body
//! mutates become `ref` cells, dicts and sets become `Hashtbl.t`, and
//! early returns use the per-function exception idiom (`Return_<name>`
//! raised inside a `try`). Lists stay immutable `'a list` values, so a
//! parameter whose list the function must mutate in place has no
//! faithful rendering and is rejected.

use crate::converter::TargetConverter;
use crate::generated::GeneratedOutput;
use crate::loops::{classify, IterationSource};
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

pub struct OCamlConverter;

impl TargetConverter for OCamlConverter {
    fn target(&self) -> Target {
        Target::OCaml
    }

    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput> {
        let mut emitter = OCamlEmitter::new(context);
        let text = emitter.emit_module(module);
        if emitter.errors.is_empty() {
            Ok(GeneratedOutput::single(format!("{}.ml", stem), text))
        } else {
            Err(emitter.errors)
        }
    }
}

#[derive(Default)]
struct HelperFlags {
    floordiv: bool,
    floormod: bool,
    int_pow: bool,
}

struct OCamlEmitter<'a> {
    context: &'a mut CompilationContext,
    naming: NamingPolicy,
    errors: Vec<TranslateError>,
    /// Locals held in ref cells in the current function
    refs: HashSet<String>,
    declared: HashSet<String>,
    helpers: HelperFlags,
    current_return_exception: String,
}

impl<'a> OCamlEmitter<'a> {
    fn new(context: &'a mut CompilationContext) -> Self {
        OCamlEmitter {
            context,
            naming: NamingPolicy::for_target(Target::OCaml),
            errors: Vec::new(),
            refs: HashSet::new(),
            declared: HashSet::new(),
            helpers: HelperFlags::default(),
            current_return_exception: String::new(),
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
                Declaration::Class(class) => self.emit_class(&mut body, class),
                Declaration::Function(func) => self.emit_function(&mut body, func, None),
                Declaration::GlobalVar(var) => {
                    let value = self.expr_or_error(&var.value);
                    body.line(format!(
                        "let {} = {}",
                        self.naming.escape(&var.name),
                        value
                    ));
                    body.blank();
                }
                Declaration::Import(_) => {}
            }
        }

        if module.function("main").is_some() {
            match module.function("main").map(|f| &f.return_type) {
                Some(SemanticType::Int) => body.line("let () = exit (mgen_user_main ())"),
                _ => body.line("let () = mgen_user_main ()"),
            }
        }

        let mut out = FormatWriter::new();
        out.line("exception MgenUnreachable");
        out.blank();
        self.emit_helper_functions(&mut out);
        out.raw(body.finish());
        out.finish()
    }

    fn emit_helper_functions(&self, out: &mut FormatWriter) {
        if self.helpers.floordiv {
            out.line("let mgen_floordiv a b =");
            out.indent();
            out.line("let q = a / b in");
            out.line("if a mod b <> 0 && (a < 0) <> (b < 0) then q - 1 else q");
            out.dedent();
            out.blank();
        }
        if self.helpers.floormod {
            out.line("let mgen_floormod a b =");
            out.indent();
            out.line("let r = a mod b in");
            out.line("if r <> 0 && (r < 0) <> (b < 0) then r + b else r");
            out.dedent();
            out.blank();
        }
        if self.helpers.int_pow {
            out.line("let rec mgen_pow base exp =");
            out.indent();
            out.line("if exp <= 0 then 1");
            out.line("else if exp land 1 = 1 then base * mgen_pow base (exp - 1)");
            out.line("else let h = mgen_pow base (exp / 2) in h * h");
            out.dedent();
            out.blank();
        }
    }

    // ----- types -----

    fn ml_type(&mut self, ty: &SemanticType, location: SourceLocation) -> Option<String> {
        let mapped = match ty {
            SemanticType::Int => "int".to_string(),
            SemanticType::Float => "float".to_string(),
            SemanticType::Bool => "bool".to_string(),
            SemanticType::Str => "string".to_string(),
            SemanticType::Void => "unit".to_string(),
            SemanticType::Object(name) => name.to_lowercase(),
            SemanticType::List(elem) => format!("{} list", self.ml_type(elem, location)?),
            SemanticType::Dict(key, value) => format!(
                "({}, {}) Hashtbl.t",
                self.ml_type(key, location)?,
                self.ml_type(value, location)?
            ),
            SemanticType::Set(elem) => {
                format!("({}, unit) Hashtbl.t", self.ml_type(elem, location)?)
            }
            other => {
                self.error(
                    ErrorCode::UnsupportedFeature,
                    format!("the ocaml target cannot represent the type '{}'", other),
                    location,
                );
                return None;
            }
        };
        Some(mapped)
    }

    fn default_value(&mut self, ty: &SemanticType, location: SourceLocation) -> String {
        match ty {
            SemanticType::Int => "0".to_string(),
            SemanticType::Float => "0.0".to_string(),
            SemanticType::Bool => "false".to_string(),
            SemanticType::Str => "\"\"".to_string(),
            SemanticType::List(_) => "[]".to_string(),
            SemanticType::Dict(_, _) | SemanticType::Set(_) => "Hashtbl.create 16".to_string(),
            other => {
                self.error(
                    ErrorCode::UnsupportedFeature,
                    format!("no default value for type '{}'", other),
                    location,
                );
                "()".to_string()
            }
        }
    }

    // ----- functions -----

    fn function_name(&self, name: &str) -> String {
        if name == "main" {
            "mgen_user_main".to_string()
        } else {
            self.naming.escape(name)
        }
    }

    fn emit_function(&mut self, out: &mut FormatWriter, func: &FunctionDef, class: Option<&ClassDef>) {
        self.refs.clear();
        self.declared.clear();
        let key = match class {
            Some(class) => format!("{}.{}", class.name, func.name),
            None => func.name.clone(),
        };
        self.refs = collect_ref_locals(&func.body);
        for param in &func.parameters {
            self.declared.insert(param.name.clone());
            self.refs.remove(&param.name);
            // A list parameter the body mutates cannot be rendered over
            // immutable lists
            if matches!(param.annotation, SemanticType::List(_))
                && self.context.mutability(&key, &param.name) == Mutability::Mutable
            {
                self.errors.push(TranslateError::with_suggestion(
                    ErrorCode::GenerationFailure,
                    format!(
                        "parameter '{}' is mutated in place, which the ocaml target cannot express",
                        param.name
                    ),
                    param.location,
                    "return the updated list instead of mutating the argument".to_string(),
                ));
            }
        }

        let name = match class {
            Some(class) if func.name == "__init__" => {
                format!("{}_new", class.name.to_lowercase())
            }
            Some(class) => format!(
                "{}_{}",
                class.name.to_lowercase(),
                self.naming.escape(&func.name)
            ),
            None => self.function_name(&func.name),
        };

        let exception = format!("Return_{}", name);
        self.current_return_exception = exception.clone();
        let is_void = matches!(func.return_type, SemanticType::Void);
        let payload = if func.name == "__init__" {
            class.map(|c| c.name.to_lowercase())
        } else if is_void {
            None
        } else {
            self.ml_type(&func.return_type.clone(), func.location)
        };
        match &payload {
            Some(ty) => out.line(format!("exception {} of {}", exception, ty)),
            None => out.line(format!("exception {}", exception)),
        }

        let mut params: Vec<String> = Vec::new();
        if class.is_some() && func.name != "__init__" {
            params.push("self".to_string());
        }
        for param in func.value_parameters() {
            params.push(self.naming.escape(&param.name));
        }
        if params.is_empty() {
            params.push("()".to_string());
        }

        out.line(format!("let rec {} {} =", name, params.join(" ")));
        out.indent();
        out.line("try");
        out.indent();

        if class.is_some() && func.name == "__init__" {
            self.emit_constructor_body(out, func, class.expect("checked above"));
        } else {
            self.emit_block(out, &func.body);
        }

        if class.is_some() && func.name == "__init__" {
            out.line("raise (MgenUnreachable)");
        } else if is_void {
            out.line("()");
        } else {
            out.line("raise (MgenUnreachable)");
        }
        out.dedent();
        match &payload {
            Some(_) => out.line(format!("with {} mgen_ret -> mgen_ret", exception)),
            None => out.line(format!("with {} -> ()", exception)),
        }
        out.dedent();
        out.blank();
    }

    fn emit_constructor_body(&mut self, out: &mut FormatWriter, func: &FunctionDef, class: &ClassDef) {
        let fields = self
            .context
            .class_info(&class.name)
            .map(|info| info.fields.clone())
            .unwrap_or_default();
        let inits: Vec<String> = fields
            .iter()
            .map(|(name, ty)| {
                let default = self.default_value(ty, func.location);
                format!("{} = {}", self.naming.escape(name), default)
            })
            .collect();
        out.line(format!("let self = {{ {} }} in", inits.join("; ")));
        self.declared.insert("self".to_string());
        self.emit_block(out, &func.body);
        out.line(format!(
            "raise ({} (self));",
            self.current_return_exception
        ));
    }

    fn emit_class(&mut self, out: &mut FormatWriter, class: &ClassDef) {
        let fields = self
            .context
            .class_info(&class.name)
            .map(|info| info.fields.clone())
            .unwrap_or_default();
        out.line(format!("type {} = {{", class.name.to_lowercase()));
        out.indent();
        for (name, ty) in &fields {
            if let Some(ml_ty) = self.ml_type(ty, class.location) {
                out.line(format!("mutable {} : {};", self.naming.escape(name), ml_ty));
            }
        }
        out.dedent();
        out.line("}");
        out.blank();

        for method in &class.methods {
            self.emit_function(out, method, Some(class));
        }
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
                    self.emit_binding(out, &var.name, value);
                }
                (Expression::Variable(var), None) => {
                    let default = self.default_value(&ann.annotation, ann.location);
                    self.emit_raw_binding(out, &var.name, &default);
                }
                (target, Some(value)) => {
                    self.emit_store(out, target, value);
                }
                _ => {}
            },
            Statement::Assign(assign) => match &assign.target {
                Expression::Variable(var) => self.emit_binding(out, &var.name, &assign.value),
                target => self.emit_store(out, target, &assign.value),
            },
            Statement::AugAssign(aug) => {
                let Expression::Variable(var) = &aug.target else {
                    // Lower to a read-modify-write through the store path
                    let value = Expression::Binary(mgen_ir::ast::BinaryExpr {
                        left: Box::new(aug.target.clone()),
                        operator: aug.operator,
                        right: Box::new(aug.value.clone()),
                        ty: aug.target.ty().clone(),
                        location: aug.location,
                    });
                    return self.emit_store(out, &aug.target, &value);
                };
                let name = self.naming.escape(&var.name);
                let value = self.expr_or_error(&aug.value);
                let ty = aug.target.ty().clone();
                if self.refs.contains(&var.name) {
                    let combined = match (aug.operator, &ty) {
                        (BinaryOperator::FloorDivide, SemanticType::Int) => {
                            self.helpers.floordiv = true;
                            format!("mgen_floordiv !{} ({})", name, value)
                        }
                        (BinaryOperator::FloorDivide, _) => {
                            format!("floor (!{} /. ({}))", name, value)
                        }
                        (BinaryOperator::Modulo, SemanticType::Int) => {
                            self.helpers.floormod = true;
                            format!("mgen_floormod !{} ({})", name, value)
                        }
                        (BinaryOperator::Modulo, _) => {
                            format!("Float.rem !{} ({})", name, value)
                        }
                        (BinaryOperator::Power, SemanticType::Int) => {
                            self.helpers.int_pow = true;
                            format!("mgen_pow !{} ({})", name, value)
                        }
                        (BinaryOperator::Power, _) => format!("!{} ** ({})", name, value),
                        (BinaryOperator::Divide, SemanticType::Int) => {
                            format!("float_of_int !{} /. float_of_int ({})", name, value)
                        }
                        (operator, _) => {
                            let op = self.operator_text(operator, &ty);
                            format!("!{} {} ({})", name, op, value)
                        }
                    };
                    out.line(format!("{} := {};", name, combined));
                } else {
                    self.error(
                        ErrorCode::GenerationFailure,
                        format!("augmented assignment to immutable binding '{}'", var.name),
                        aug.location,
                    );
                }
            }
            Statement::If(if_stmt) => {
                let condition = self.expr_or_error(&if_stmt.condition);
                out.line(format!("(if {} then begin", condition));
                out.indent();
                self.emit_block(out, &if_stmt.then_branch);
                out.line("()");
                out.dedent();
                if if_stmt.else_branch.is_empty() {
                    out.line("end);");
                } else {
                    out.line("end else begin");
                    out.indent();
                    self.emit_block(out, &if_stmt.else_branch);
                    out.line("()");
                    out.dedent();
                    out.line("end);");
                }
            }
            Statement::While(while_stmt) => {
                let condition = match &while_stmt.condition {
                    Expression::Literal(lit) if lit.value == LiteralValue::Bool(true) => {
                        "true".to_string()
                    }
                    other => self.expr_or_error(other),
                };
                out.line(format!("while {} do", condition));
                out.indent();
                self.emit_block(out, &while_stmt.body);
                out.line("()");
                out.dedent();
                out.line("done;");
            }
            Statement::For(for_stmt) => self.emit_for(out, for_stmt),
            Statement::Return(ret) => {
                let exception = self.current_return_exception.clone();
                match &ret.value {
                    None => out.line(format!("raise ({});", exception)),
                    Some(Expression::Literal(lit)) if lit.value == LiteralValue::None => {
                        out.line(format!("raise ({});", exception))
                    }
                    Some(value) => {
                        let text = self.expr_or_error(value);
                        out.line(format!("raise ({} ({}));", exception, text));
                    }
                }
            }
            Statement::Expression(expr_stmt) => {
                let is_unit = matches!(expr_stmt.expression.ty(), SemanticType::Void);
                let text = self.expr_or_error(&expr_stmt.expression);
                if is_unit {
                    out.line(format!("{};", text));
                } else {
                    out.line(format!("ignore ({});", text));
                }
            }
            Statement::Pass(_) => {}
            Statement::Break(_) | Statement::Continue(_) => {
                self.error(
                    ErrorCode::GenerationFailure,
                    "break/continue have no rendering in the ocaml target's loops".to_string(),
                    statement_location(stmt),
                );
            }
        }
    }

    fn emit_binding(&mut self, out: &mut FormatWriter, name: &str, value: &Expression) {
        let text = self.expr_or_error(value);
        self.emit_raw_binding(out, name, &text);
    }

    fn emit_raw_binding(&mut self, out: &mut FormatWriter, name: &str, text: &str) {
        let escaped = self.naming.escape(name);
        if self.declared.contains(name) {
            if self.refs.contains(name) {
                out.line(format!("{} := {};", escaped, text));
            } else {
                // Shadowing re-binding
                out.line(format!("let {} = {} in", escaped, text));
            }
        } else if self.refs.contains(name) {
            out.line(format!("let {} = ref ({}) in", escaped, text));
            self.declared.insert(name.to_string());
        } else {
            out.line(format!("let {} = {} in", escaped, text));
            self.declared.insert(name.to_string());
        }
    }

    /// Subscript and attribute stores
    fn emit_store(&mut self, out: &mut FormatWriter, target: &Expression, value: &Expression) {
        match target {
            Expression::Subscript(sub) => {
                let object_ty = sub.object.ty().clone();
                let index = self.expr_or_error(&sub.index);
                let text = self.expr_or_error(value);
                match &object_ty {
                    SemanticType::Dict(_, _) => {
                        let object = self.expr_or_error(&sub.object);
                        out.line(format!(
                            "Hashtbl.replace {} ({}) ({});",
                            object, index, text
                        ));
                    }
                    SemanticType::List(_) => {
                        // Rebuild the list with the element replaced
                        let Expression::Variable(var) = sub.object.as_ref() else {
                            return self.error(
                                ErrorCode::GenerationFailure,
                                "list element stores require a named list".to_string(),
                                sub.location,
                            );
                        };
                        if !self.refs.contains(&var.name) {
                            return self.error(
                                ErrorCode::GenerationFailure,
                                format!("list '{}' is not mutable here", var.name),
                                sub.location,
                            );
                        }
                        let name = self.naming.escape(&var.name);
                        out.line(format!(
                            "{} := List.mapi (fun mgen_i mgen_x -> if mgen_i = ({}) then ({}) else mgen_x) !{};",
                            name, index, text, name
                        ));
                    }
                    other => self.error(
                        ErrorCode::GenerationFailure,
                        format!("subscript store on '{}' is not supported", other),
                        sub.location,
                    ),
                }
            }
            Expression::Attribute(attr) => {
                let object = self.expr_or_error(&attr.object);
                let text = self.expr_or_error(value);
                out.line(format!(
                    "{}.{} <- {};",
                    object,
                    self.naming.escape(&attr.name),
                    text
                ));
            }
            other => self.error(
                ErrorCode::GenerationFailure,
                "invalid store target survived analysis".to_string(),
                other.location(),
            ),
        }
    }

    // ----- loops -----

    fn emit_for(&mut self, out: &mut FormatWriter, for_stmt: &ForStatement) {
        let shape = classify(for_stmt);
        match shape.source {
            IterationSource::Range(args) => {
                let Some(var) = for_stmt.target.single_name() else {
                    return self.error(
                        ErrorCode::GenerationFailure,
                        "range loops bind a single variable".to_string(),
                        for_stmt.location,
                    );
                };
                let name = self.naming.escape(var);
                self.declared.insert(var.to_string());
                match args {
                    [stop] => {
                        let stop = self.expr_or_error(stop);
                        out.line(format!("for {} = 0 to ({}) - 1 do", name, stop));
                    }
                    [start, stop] => {
                        let start = self.expr_or_error(start);
                        let stop = self.expr_or_error(stop);
                        out.line(format!("for {} = {} to ({}) - 1 do", name, start, stop));
                    }
                    [start, stop, step] => {
                        // Only literal +-1 steps map onto for loops; other
                        // steps use a counter ref
                        let start = self.expr_or_error(start);
                        let stop = self.expr_or_error(stop);
                        let step = self.expr_or_error(step);
                        if step == "1" {
                            out.line(format!("for {} = {} to ({}) - 1 do", name, start, stop));
                        } else if step == "(-1)" || step == "-1" {
                            out.line(format!(
                                "for {} = {} downto ({}) + 1 do",
                                name, start, stop
                            ));
                        } else {
                            out.line(format!("let mgen_i = ref ({}) in", start));
                            out.line(format!(
                                "while (({step}) > 0 && !mgen_i < ({stop})) || (({step}) < 0 && !mgen_i > ({stop})) do"
                            ));
                            out.indent();
                            out.line(format!("let {} = !mgen_i in", name));
                            self.emit_block(out, &for_stmt.body);
                            out.line(format!("mgen_i := !mgen_i + ({});", step));
                            out.line("()");
                            out.dedent();
                            out.line("done;");
                            return;
                        }
                    }
                    _ => {
                        return self.error(
                            ErrorCode::GenerationFailure,
                            "range() takes 1 to 3 arguments".to_string(),
                            for_stmt.location,
                        );
                    }
                }
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.line("()");
                out.dedent();
                out.line("done;");
            }
            IterationSource::Container(iterable) => {
                self.emit_container_for(out, for_stmt, iterable);
            }
        }
    }

    fn emit_container_for(
        &mut self,
        out: &mut FormatWriter,
        for_stmt: &ForStatement,
        iterable: &Expression,
    ) {
        // Map iterations go through Hashtbl.iter
        if let Expression::Call(call) = iterable {
            if let Some((receiver, "items")) = call.method_parts() {
                if let BindingTarget::Pair(k, v) = &for_stmt.target {
                    let obj = self.expr_or_error(receiver);
                    self.declared.insert(k.clone());
                    self.declared.insert(v.clone());
                    out.line(format!(
                        "Hashtbl.iter (fun {} {} ->",
                        self.naming.escape(k),
                        self.naming.escape(v)
                    ));
                    out.indent();
                    self.emit_block(out, &for_stmt.body);
                    out.line("()");
                    out.dedent();
                    out.line(format!(") {};", obj));
                    return;
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
        let name = self.naming.escape(var);
        self.declared.insert(var.to_string());
        let iter_ty = iterable.ty().clone();

        match &iter_ty {
            SemanticType::List(_) => {
                let obj = self.expr_or_error(iterable);
                out.line(format!("List.iter (fun {} ->", name));
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.line("()");
                out.dedent();
                out.line(format!(") {};", obj));
            }
            SemanticType::Set(_) => {
                let obj = self.expr_or_error(iterable);
                out.line(format!("Hashtbl.iter (fun {} () ->", name));
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.line("()");
                out.dedent();
                out.line(format!(") {};", obj));
            }
            SemanticType::Dict(_, _) => {
                let obj = self.expr_or_error(iterable);
                out.line(format!("Hashtbl.iter (fun {} _ ->", name));
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.line("()");
                out.dedent();
                out.line(format!(") {};", obj));
            }
            other => self.error(
                ErrorCode::GenerationFailure,
                format!("cannot iterate a value of type '{}'", other),
                for_stmt.location,
            ),
        }
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

    fn operator_text(&mut self, operator: BinaryOperator, ty: &SemanticType) -> String {
        let floats = matches!(ty, SemanticType::Float);
        match operator {
            BinaryOperator::Add if matches!(ty, SemanticType::Str) => "^".to_string(),
            BinaryOperator::Add if floats => "+.".to_string(),
            BinaryOperator::Add => "+".to_string(),
            BinaryOperator::Subtract if floats => "-.".to_string(),
            BinaryOperator::Subtract => "-".to_string(),
            BinaryOperator::Multiply if floats => "*.".to_string(),
            BinaryOperator::Multiply => "*".to_string(),
            BinaryOperator::Divide => "/.".to_string(),
            // Callers special-case floor division and modulo; this is
            // only the fallback spelling
            BinaryOperator::FloorDivide => "/".to_string(),
            BinaryOperator::Modulo => "mod".to_string(),
            BinaryOperator::Power => "**".to_string(),
            BinaryOperator::BitAnd => "land".to_string(),
            BinaryOperator::BitOr => "lor".to_string(),
            BinaryOperator::BitXor => "lxor".to_string(),
            BinaryOperator::ShiftLeft => "lsl".to_string(),
            BinaryOperator::ShiftRight => "asr".to_string(),
        }
    }

    fn emit_expression(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Int(value) if *value < 0 => format!("({})", value),
                LiteralValue::Int(value) => format!("{}", value),
                LiteralValue::Float(value) => format_float(*value),
                LiteralValue::Bool(value) => format!("{}", value),
                LiteralValue::Str(value) => format!("{:?}", value),
                LiteralValue::None => "()".to_string(),
            }),
            Expression::Variable(var) => {
                let escaped = self.naming.escape(&var.name);
                if self.refs.contains(&var.name) {
                    Ok(format!("!{}", escaped))
                } else {
                    Ok(escaped)
                }
            }
            Expression::Binary(bin) => {
                let left = self.emit_expression(&bin.left)?;
                let right = self.emit_expression(&bin.right)?;
                let operand_ty = bin.left.ty().clone();
                match bin.operator {
                    BinaryOperator::Divide if matches!(operand_ty, SemanticType::Int) => {
                        Ok(format!(
                            "(float_of_int ({}) /. float_of_int ({}))",
                            left, right
                        ))
                    }
                    BinaryOperator::FloorDivide if matches!(operand_ty, SemanticType::Int) => {
                        self.helpers.floordiv = true;
                        Ok(format!("(mgen_floordiv ({}) ({}))", left, right))
                    }
                    BinaryOperator::FloorDivide => {
                        Ok(format!("(floor (({}) /. ({})))", left, right))
                    }
                    BinaryOperator::Modulo if matches!(operand_ty, SemanticType::Int) => {
                        self.helpers.floormod = true;
                        Ok(format!("(mgen_floormod ({}) ({}))", left, right))
                    }
                    BinaryOperator::Modulo => {
                        Ok(format!("(Float.rem ({}) ({}))", left, right))
                    }
                    BinaryOperator::Power if matches!(bin.ty, SemanticType::Int) => {
                        self.helpers.int_pow = true;
                        Ok(format!("(mgen_pow ({}) ({}))", left, right))
                    }
                    BinaryOperator::Power => Ok(format!("(({}) ** ({}))", left, right)),
                    operator => {
                        let op = self.operator_text(operator, &operand_ty);
                        Ok(format!("(({}) {} ({}))", left, op, right))
                    }
                }
            }
            Expression::Unary(unary) => {
                let operand = self.emit_expression(&unary.operand)?;
                Ok(match unary.operator {
                    UnaryOperator::Negate
                        if matches!(unary.operand.ty(), SemanticType::Float) =>
                    {
                        format!("(-. ({}))", operand)
                    }
                    UnaryOperator::Negate => format!("(- ({}))", operand),
                    UnaryOperator::Not => format!("(not ({}))", operand),
                    UnaryOperator::Invert => format!("(lnot ({}))", operand),
                })
            }
            Expression::Boolean(boolean) => {
                let left = self.emit_expression(&boolean.left)?;
                let right = self.emit_expression(&boolean.right)?;
                let op = match boolean.operator {
                    mgen_ir::ast::BoolOperator::And => "&&",
                    mgen_ir::ast::BoolOperator::Or => "||",
                };
                Ok(format!("(({}) {} ({}))", left, op, right))
            }
            Expression::Comparison(cmp) => {
                if matches!(cmp.operator, CompareOperator::In | CompareOperator::NotIn) {
                    let text = self.emit_membership(cmp)?;
                    return Ok(if cmp.operator == CompareOperator::NotIn {
                        format!("(not {})", text)
                    } else {
                        text
                    });
                }
                let left = self.emit_expression(&cmp.left)?;
                let right = self.emit_expression(&cmp.right)?;
                let op = match cmp.operator {
                    CompareOperator::Equal => "=",
                    CompareOperator::NotEqual => "<>",
                    CompareOperator::Less => "<",
                    CompareOperator::LessEqual => "<=",
                    CompareOperator::Greater => ">",
                    CompareOperator::GreaterEqual => ">=",
                    _ => unreachable!("membership handled above"),
                };
                Ok(format!("(({}) {} ({}))", left, op, right))
            }
            Expression::Call(call) => self.emit_call(call),
            Expression::Attribute(attr) => {
                let object = self.emit_expression(&attr.object)?;
                Ok(format!("{}.{}", object, self.naming.escape(&attr.name)))
            }
            Expression::Subscript(sub) => {
                let index = self.emit_expression(&sub.index)?;
                match sub.object.ty() {
                    SemanticType::Dict(_, _) => {
                        let object = self.emit_expression(&sub.object)?;
                        Ok(format!("(Hashtbl.find {} ({}))", object, index))
                    }
                    SemanticType::List(_) => {
                        let object = self.emit_expression(&sub.object)?;
                        Ok(format!("(List.nth {} ({}))", object, index))
                    }
                    SemanticType::Str => {
                        let object = self.emit_expression(&sub.object)?;
                        Ok(format!("(String.make 1 {}.[{}])", object, index))
                    }
                    other => Err(TranslateError::new(
                        ErrorCode::UnsupportedMethod,
                        format!("subscripting '{}' is not supported by the ocaml target", other),
                        sub.location,
                    )),
                }
            }
            Expression::ListDisplay(list) => {
                let elems: Result<Vec<String>, TranslateError> =
                    list.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("[{}]", elems?.join("; ")))
            }
            Expression::SetDisplay(set) => {
                let elems: Result<Vec<String>, TranslateError> =
                    set.elements.iter().map(|e| self.emit_expression(e)).collect();
                let inserts: Vec<String> = elems?
                    .iter()
                    .map(|e| format!("Hashtbl.replace mgen_s ({}) ();", e))
                    .collect();
                Ok(format!(
                    "(let mgen_s = Hashtbl.create 16 in {} mgen_s)",
                    inserts.join(" ")
                ))
            }
            Expression::DictDisplay(dict) => {
                let mut inserts = Vec::new();
                for (key, value) in dict.keys.iter().zip(&dict.values) {
                    inserts.push(format!(
                        "Hashtbl.replace mgen_m ({}) ({});",
                        self.emit_expression(key)?,
                        self.emit_expression(value)?
                    ));
                }
                Ok(format!(
                    "(let mgen_m = Hashtbl.create 16 in {} mgen_m)",
                    inserts.join(" ")
                ))
            }
            Expression::ListComp(comp) => {
                let element = self.emit_expression(&comp.element)?;
                let source = self.comprehension_source(&comp.generator)?;
                let var = self.comprehension_var(&comp.generator)?;
                match &comp.generator.condition {
                    Some(condition) => {
                        let cond = self.emit_expression(condition)?;
                        Ok(format!(
                            "(List.map (fun {var} -> {element}) (List.filter (fun {var} -> {cond}) {source}))"
                        ))
                    }
                    None => Ok(format!("(List.map (fun {var} -> {element}) {source})")),
                }
            }
            Expression::SetComp(_) | Expression::DictComp(_) => Err(TranslateError::with_suggestion(
                ErrorCode::GenerationFailure,
                "set and dict comprehensions are not supported by the ocaml target".to_string(),
                expr.location(),
                "build the container with an explicit loop".to_string(),
            )),
            Expression::TupleDisplay(tuple) => {
                let elems: Result<Vec<String>, TranslateError> =
                    tuple.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("({})", elems?.join(", ")))
            }
        }
    }

    fn comprehension_var(
        &mut self,
        generator: &mgen_ir::ast::Comprehension,
    ) -> Result<String, TranslateError> {
        match &generator.target {
            BindingTarget::Name(name) => Ok(self.naming.escape(name)),
            BindingTarget::Pair(a, b) => Ok(format!(
                "({}, {})",
                self.naming.escape(a),
                self.naming.escape(b)
            )),
        }
    }

    fn comprehension_source(
        &mut self,
        generator: &mgen_ir::ast::Comprehension,
    ) -> Result<String, TranslateError> {
        match generator.iterable.as_ref() {
            Expression::Call(call) if call.callee_name() == Some("range") => {
                match call.arguments.as_slice() {
                    [stop] => {
                        let stop = self.emit_expression(stop)?;
                        Ok(format!("(List.init ({}) (fun mgen_i -> mgen_i))", stop))
                    }
                    [start, stop] => {
                        let start = self.emit_expression(start)?;
                        let stop = self.emit_expression(stop)?;
                        Ok(format!(
                            "(List.init (({stop}) - ({start})) (fun mgen_i -> mgen_i + ({start})))"
                        ))
                    }
                    _ => Err(TranslateError::new(
                        ErrorCode::GenerationFailure,
                        "stepped ranges are not supported in comprehensions".to_string(),
                        call.location,
                    )),
                }
            }
            other => self.emit_expression(other),
        }
    }

    fn emit_membership(
        &mut self,
        cmp: &mgen_ir::ast::ComparisonExpr,
    ) -> Result<String, TranslateError> {
        let needle = self.emit_expression(&cmp.left)?;
        let haystack = self.emit_expression(&cmp.right)?;
        match cmp.right.ty() {
            SemanticType::Dict(_, _) | SemanticType::Set(_) => {
                Ok(format!("(Hashtbl.mem {} ({}))", haystack, needle))
            }
            SemanticType::List(_) => Ok(format!("(List.mem ({}) {})", needle, haystack)),
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
                    SemanticType::Dict(_, _) | SemanticType::Set(_) => {
                        format!("(Hashtbl.length {})", arg)
                    }
                    SemanticType::Str => format!("(String.length {})", arg),
                    _ => format!("(List.length {})", arg),
                });
            }
            "abs" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Float => format!("(abs_float {})", arg),
                    _ => format!("(abs {})", arg),
                });
            }
            "min" | "max" => {
                if call.arguments.len() == 2 {
                    let a = self.emit_expression(&call.arguments[0])?;
                    let b = self.emit_expression(&call.arguments[1])?;
                    return Ok(format!("({} ({}) ({}))", name, a, b));
                }
                let arg = self.emit_expression(&call.arguments[0])?;
                let fold = if name == "min" { "min" } else { "max" };
                return Ok(format!(
                    "(List.fold_left {} (List.hd {}) (List.tl {}))",
                    fold, arg, arg
                ));
            }
            "sum" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::List(elem) if matches!(elem.as_ref(), SemanticType::Float) => {
                        format!("(List.fold_left ( +. ) 0.0 {})", arg)
                    }
                    _ => format!("(List.fold_left ( + ) 0 {})", arg),
                });
            }
            "str" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Int => format!("(string_of_int {})", arg),
                    SemanticType::Float => format!("(Printf.sprintf \"%g\" {})", arg),
                    SemanticType::Bool => {
                        format!("(if {} then \"True\" else \"False\")", arg)
                    }
                    _ => arg,
                });
            }
            "int" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Float => format!("(int_of_float {})", arg),
                    SemanticType::Str => format!("(int_of_string {})", arg),
                    SemanticType::Bool => format!("(if {} then 1 else 0)", arg),
                    _ => arg,
                });
            }
            "float" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Int => format!("(float_of_int {})", arg),
                    SemanticType::Str => format!("(float_of_string {})", arg),
                    _ => arg,
                });
            }
            "bool" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Int => format!("({} <> 0)", arg),
                    SemanticType::Float => format!("({} <> 0.0)", arg),
                    SemanticType::Str => format!("({} <> \"\")", arg),
                    _ => arg,
                });
            }
            "list" => return Ok("[]".to_string()),
            "dict" | "set" => return Ok("(Hashtbl.create 16)".to_string()),
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

        if self.context.is_class(name) {
            let args: Result<Vec<String>, TranslateError> = call
                .arguments
                .iter()
                .map(|a| Ok(format!("({})", self.emit_expression(a)?)))
                .collect();
            let mut args = args?;
            if args.is_empty() {
                args.push("()".to_string());
            }
            return Ok(format!("({}_new {})", name.to_lowercase(), args.join(" ")));
        }

        let args: Result<Vec<String>, TranslateError> = call
            .arguments
            .iter()
            .map(|a| Ok(format!("({})", self.emit_expression(a)?)))
            .collect();
        let mut args = args?;
        if args.is_empty() {
            args.push("()".to_string());
        }
        Ok(format!(
            "({} {})",
            self.function_name(name),
            args.join(" ")
        ))
    }

    fn emit_method_call(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        receiver: &Expression,
        method: &str,
    ) -> Result<String, TranslateError> {
        let receiver_ty = receiver.ty().clone();

        match (&receiver_ty, method) {
            (SemanticType::List(_), "append") => {
                let Expression::Variable(var) = receiver else {
                    return self.mutable_list_error(call.location);
                };
                if !self.refs.contains(&var.name) {
                    return self.mutable_list_error(call.location);
                }
                let name = self.naming.escape(&var.name);
                let value = self.emit_expression(&call.arguments[0])?;
                Ok(format!("{} := !{} @ [{}]", name, name, value))
            }
            (SemanticType::List(_), "clear") => {
                let Expression::Variable(var) = receiver else {
                    return self.mutable_list_error(call.location);
                };
                let name = self.naming.escape(&var.name);
                Ok(format!("{} := []", name))
            }
            (SemanticType::Dict(_, _), "get") => {
                let recv = self.emit_expression(receiver)?;
                let key = self.emit_expression(&call.arguments[0])?;
                let default = match &call.ty {
                    SemanticType::Int => "0".to_string(),
                    SemanticType::Float => "0.0".to_string(),
                    SemanticType::Bool => "false".to_string(),
                    SemanticType::Str => "\"\"".to_string(),
                    _ => "0".to_string(),
                };
                Ok(format!(
                    "(match Hashtbl.find_opt {} ({}) with Some mgen_v -> mgen_v | None -> {})",
                    recv, key, default
                ))
            }
            (SemanticType::Dict(_, _), "pop") | (SemanticType::Dict(_, _), "erase") => {
                let recv = self.emit_expression(receiver)?;
                let key = self.emit_expression(&call.arguments[0])?;
                Ok(format!("Hashtbl.remove {} ({})", recv, key))
            }
            (SemanticType::Dict(_, _), "clear") => {
                let recv = self.emit_expression(receiver)?;
                Ok(format!("Hashtbl.reset {}", recv))
            }
            (SemanticType::Set(_), "add") => {
                let recv = self.emit_expression(receiver)?;
                let value = self.emit_expression(&call.arguments[0])?;
                Ok(format!("Hashtbl.replace {} ({}) ()", recv, value))
            }
            (SemanticType::Set(_), "remove") | (SemanticType::Set(_), "discard") => {
                let recv = self.emit_expression(receiver)?;
                let value = self.emit_expression(&call.arguments[0])?;
                Ok(format!("Hashtbl.remove {} ({})", recv, value))
            }
            (SemanticType::Set(_), "clear") => {
                let recv = self.emit_expression(receiver)?;
                Ok(format!("Hashtbl.reset {}", recv))
            }
            (SemanticType::Str, "upper") => {
                let recv = self.emit_expression(receiver)?;
                Ok(format!("(String.uppercase_ascii {})", recv))
            }
            (SemanticType::Str, "lower") => {
                let recv = self.emit_expression(receiver)?;
                Ok(format!("(String.lowercase_ascii {})", recv))
            }
            (SemanticType::Str, "strip") => {
                let recv = self.emit_expression(receiver)?;
                Ok(format!("(String.trim {})", recv))
            }
            (SemanticType::Str, "startswith") => {
                let recv = self.emit_expression(receiver)?;
                let prefix = self.emit_expression(&call.arguments[0])?;
                Ok(format!(
                    "(String.length {recv} >= String.length {prefix} && String.sub {recv} 0 (String.length {prefix}) = {prefix})"
                ))
            }
            (SemanticType::Str, "endswith") => {
                let recv = self.emit_expression(receiver)?;
                let suffix = self.emit_expression(&call.arguments[0])?;
                Ok(format!(
                    "(String.length {recv} >= String.length {suffix} && String.sub {recv} (String.length {recv} - String.length {suffix}) (String.length {suffix}) = {suffix})"
                ))
            }
            (SemanticType::Object(class), _) => {
                let recv = self.emit_expression(receiver)?;
                let args: Result<Vec<String>, TranslateError> = call
                    .arguments
                    .iter()
                    .map(|a| Ok(format!("({})", self.emit_expression(a)?)))
                    .collect();
                let mut args = args?;
                args.insert(0, format!("({})", recv));
                Ok(format!(
                    "({}_{} {})",
                    class.to_lowercase(),
                    self.naming.escape(method),
                    args.join(" ")
                ))
            }
            _ => Err(TranslateError::with_suggestion(
                ErrorCode::UnsupportedMethod,
                format!(
                    "method '{}' on '{}' is not implemented for the ocaml target",
                    method, receiver_ty
                ),
                call.location,
                "rewrite the operation with supported primitives".to_string(),
            )),
        }
    }

    fn mutable_list_error(&self, location: SourceLocation) -> Result<String, TranslateError> {
        Err(TranslateError::with_suggestion(
            ErrorCode::GenerationFailure,
            "in-place list mutation requires a mutable local list".to_string(),
            location,
            "build the list in a local binding before returning it".to_string(),
        ))
    }

    fn emit_print(&mut self, call: &mgen_ir::ast::CallExpr) -> Result<String, TranslateError> {
        let mut parts = Vec::new();
        for arg in &call.arguments {
            let text = self.emit_expression(arg)?;
            let rendered = match arg.ty() {
                SemanticType::Int => format!("(string_of_int {})", text),
                SemanticType::Float => format!("(Printf.sprintf \"%g\" {})", text),
                SemanticType::Bool => format!("(if {} then \"True\" else \"False\")", text),
                SemanticType::Str => text,
                other => {
                    return Err(TranslateError::new(
                        ErrorCode::UnsupportedMethod,
                        format!("print() cannot format a value of type '{}'", other),
                        arg.location(),
                    ));
                }
            };
            parts.push(rendered);
        }
        if parts.is_empty() {
            Ok("print_endline \"\"".to_string())
        } else {
            Ok(format!(
                "print_endline ({})",
                parts.join(" ^ \" \" ^ ")
            ))
        }
    }
}

/// Collects the locals that need ref cells: anything stored to more than
/// once, augmented, or mutated positionally
fn collect_ref_locals(body: &[Statement]) -> HashSet<String> {
    let mut mutated = HashSet::new();
    let mut bound = HashSet::new();
    scan(body, &mut mutated, &mut bound);
    mutated
}

fn scan(statements: &[Statement], mutated: &mut HashSet<String>, bound: &mut HashSet<String>) {
    for stmt in statements {
        match stmt {
            Statement::Assign(assign) => {
                if let Expression::Variable(var) = &assign.target {
                    if !bound.insert(var.name.clone()) {
                        mutated.insert(var.name.clone());
                    }
                } else if let Expression::Subscript(sub) = &assign.target {
                    if let Expression::Variable(var) = sub.object.as_ref() {
                        if matches!(sub.object.ty(), SemanticType::List(_)) {
                            mutated.insert(var.name.clone());
                        }
                    }
                }
            }
            Statement::AnnAssign(ann) => {
                if let Expression::Variable(var) = &ann.target {
                    bound.insert(var.name.clone());
                }
            }
            Statement::AugAssign(aug) => {
                if let Expression::Variable(var) = &aug.target {
                    mutated.insert(var.name.clone());
                }
            }
            Statement::If(if_stmt) => {
                scan(&if_stmt.then_branch, mutated, bound);
                scan(&if_stmt.else_branch, mutated, bound);
            }
            Statement::While(while_stmt) => scan(&while_stmt.body, mutated, bound),
            Statement::For(for_stmt) => scan(&for_stmt.body, mutated, bound),
            Statement::Expression(expr_stmt) => {
                if let Expression::Call(call) = &expr_stmt.expression {
                    if let Some((receiver, method)) = call.method_parts() {
                        if matches!(receiver.ty(), SemanticType::List(_))
                            && matches!(method, "append" | "clear" | "extend" | "insert" | "remove")
                        {
                            if let Expression::Variable(var) = receiver {
                                mutated.insert(var.name.clone());
                            }
                        }
                    }
                }
            }
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

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
