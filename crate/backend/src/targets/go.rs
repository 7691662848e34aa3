//! Go converter
//!
//! Emits a single `package main` file. Lists become slices, dicts become
//! maps, sets become `map[T]bool`. The garbage collector owns the
//! container lifecycle, so no release calls are emitted and the
//! mutability classes only matter for list parameters (append must reach
//! the caller's slice header, so Mutable list parameters arrive as
//! pointers).

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
use std::collections::{BTreeSet, HashSet};

pub struct GoConverter;

impl TargetConverter for GoConverter {
    fn target(&self) -> Target {
        Target::Go
    }

    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput> {
        let mut emitter = GoEmitter::new(context);
        let text = emitter.emit_module(module);
        if emitter.errors.is_empty() {
            Ok(GeneratedOutput::single(format!("{}.go", stem), text))
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
    contains_map: bool,
    contains_slice: bool,
    bool_str: bool,
}

struct GoEmitter<'a> {
    context: &'a mut CompilationContext,
    naming: NamingPolicy,
    errors: Vec<TranslateError>,
    declared: HashSet<String>,
    /// List parameters received as pointers in the current function
    pointer_params: HashSet<String>,
    imports: BTreeSet<&'static str>,
    helpers: HelperFlags,
}

impl<'a> GoEmitter<'a> {
    fn new(context: &'a mut CompilationContext) -> Self {
        GoEmitter {
            context,
            naming: NamingPolicy::for_target(Target::Go),
            errors: Vec::new(),
            declared: HashSet::new(),
            pointer_params: HashSet::new(),
            imports: BTreeSet::new(),
            helpers: HelperFlags::default(),
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
                    let value = self.expr_or_error(&var.value);
                    body.line(format!("var {} = {}", self.naming.escape(&var.name), value));
                    body.blank();
                }
                Declaration::Class(class) => self.emit_class(&mut body, class),
                Declaration::Function(func) => self.emit_function(&mut body, func),
                Declaration::Import(_) => {}
            }
        }

        if module.function("main").is_some() {
            body.line("func main() {");
            body.indent();
            match module.function("main").map(|f| &f.return_type) {
                Some(SemanticType::Int) => {
                    self.imports.insert("os");
                    body.line("os.Exit(int(mgenUserMain()))");
                }
                _ => body.line("mgenUserMain()"),
            }
            body.dedent();
            body.line("}");
        }

        let mut out = FormatWriter::with_unit("\t");
        out.line("package main");
        out.blank();
        if !self.imports.is_empty() {
            out.line("import (");
            out.indent();
            for import in &self.imports {
                out.line(format!("\"{}\"", import));
            }
            out.dedent();
            out.line(")");
            out.blank();
        }
        self.emit_helper_functions(&mut out);
        out.raw(body.finish());
        out.finish()
    }

    fn emit_helper_functions(&self, out: &mut FormatWriter) {
        if self.helpers.floordiv {
            out.line("func mgenFloorDiv(a, b int64) int64 {");
            out.indent();
            out.line("q := a / b");
            out.line("if a%b != 0 && (a < 0) != (b < 0) {");
            out.indent();
            out.line("q--");
            out.dedent();
            out.line("}");
            out.line("return q");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.floormod {
            out.line("func mgenFloorMod(a, b int64) int64 {");
            out.indent();
            out.line("r := a % b");
            out.line("if r != 0 && (r < 0) != (b < 0) {");
            out.indent();
            out.line("r += b");
            out.dedent();
            out.line("}");
            out.line("return r");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.int_pow {
            out.line("func mgenPow(base, exp int64) int64 {");
            out.indent();
            out.line("result := int64(1)");
            out.line("for exp > 0 {");
            out.indent();
            out.line("if exp&1 == 1 {");
            out.indent();
            out.line("result *= base");
            out.dedent();
            out.line("}");
            out.line("base *= base");
            out.line("exp >>= 1");
            out.dedent();
            out.line("}");
            out.line("return result");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.contains_map {
            out.line("func mgenContainsKey[K comparable, V any](m map[K]V, key K) bool {");
            out.indent();
            out.line("_, ok := m[key]");
            out.line("return ok");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.contains_slice {
            out.line("func mgenContains[T comparable](xs []T, value T) bool {");
            out.indent();
            out.line("for _, x := range xs {");
            out.indent();
            out.line("if x == value {");
            out.indent();
            out.line("return true");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.line("return false");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.bool_str {
            out.line("func mgenBoolStr(b bool) string {");
            out.indent();
            out.line("if b {");
            out.indent();
            out.line("return \"True\"");
            out.dedent();
            out.line("}");
            out.line("return \"False\"");
            out.dedent();
            out.line("}");
            out.blank();
        }
    }

    // ----- types -----

    fn go_type(&mut self, ty: &SemanticType, location: SourceLocation) -> Option<String> {
        let mapped = match ty {
            SemanticType::Int => "int64".to_string(),
            SemanticType::Float => "float64".to_string(),
            SemanticType::Bool => "bool".to_string(),
            SemanticType::Str => "string".to_string(),
            SemanticType::Void => String::new(),
            SemanticType::Object(name) => name.clone(),
            SemanticType::List(elem) => format!("[]{}", self.go_type(elem, location)?),
            SemanticType::Dict(key, value) => format!(
                "map[{}]{}",
                self.go_type(key, location)?,
                self.go_type(value, location)?
            ),
            SemanticType::Set(elem) => format!("map[{}]bool", self.go_type(elem, location)?),
            other => {
                self.error(
                    ErrorCode::UnsupportedFeature,
                    format!("the go target cannot represent the type '{}'", other),
                    location,
                );
                return None;
            }
        };
        Some(mapped)
    }

    // ----- functions -----

    fn function_name(&self, name: &str) -> String {
        if name == "main" {
            "mgenUserMain".to_string()
        } else {
            self.naming.escape(name)
        }
    }

    fn reset_function_state(&mut self, func: &FunctionDef, key: &str) {
        self.declared.clear();
        self.pointer_params.clear();
        for param in &func.parameters {
            self.declared.insert(param.name.clone());
            if matches!(param.annotation, SemanticType::List(_))
                && self.context.mutability(key, &param.name) == Mutability::Mutable
            {
                self.pointer_params.insert(param.name.clone());
            }
        }
    }

    fn parameter_decl(&mut self, key: &str, param: &mgen_ir::ast::Parameter) -> Option<String> {
        let go_ty = self.go_type(&param.annotation, param.location)?;
        let name = self.naming.escape(&param.name);
        // Appends must reach the caller's slice header
        if matches!(param.annotation, SemanticType::List(_))
            && self.context.mutability(key, &param.name) == Mutability::Mutable
        {
            Some(format!("{} *{}", name, go_ty))
        } else {
            Some(format!("{} {}", name, go_ty))
        }
    }

    fn emit_function(&mut self, out: &mut FormatWriter, func: &FunctionDef) {
        self.reset_function_state(func, &func.name);

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
                    .go_type(other, func.location)
                    .unwrap_or_default();
                format!(" {}", mapped)
            }
        };

        out.line(format!(
            "func {}({}){} {{",
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

        out.line(format!("type {} struct {{", class.name));
        out.indent();
        for (name, ty) in &fields {
            if let Some(go_ty) = self.go_type(ty, class.location) {
                out.line(format!("{} {}", self.naming.escape(name), go_ty));
            }
        }
        out.dedent();
        out.line("}");
        out.blank();

        for method in &class.methods {
            self.emit_method(out, method, class);
        }
    }

    fn emit_method(&mut self, out: &mut FormatWriter, method: &FunctionDef, class: &ClassDef) {
        let key = format!("{}.{}", class.name, method.name);
        self.reset_function_state(method, &key);

        let params: Vec<String> = method
            .value_parameters()
            .iter()
            .filter_map(|p| self.parameter_decl(&key, p))
            .collect();

        if method.name == "__init__" {
            out.line(format!(
                "func New{}({}) {} {{",
                class.name,
                params.join(", "),
                class.name
            ));
            out.indent();
            out.line(format!("self := &{}{{}}", class.name));
            self.emit_block(out, &method.body);
            out.line("return *self");
            out.dedent();
            out.line("}");
            out.blank();
            return;
        }

        let ret = match &method.return_type {
            SemanticType::Void => String::new(),
            other => {
                let mapped = self.go_type(other, method.location).unwrap_or_default();
                format!(" {}", mapped)
            }
        };
        out.line(format!(
            "func (self *{}) {}({}){} {{",
            class.name,
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
                    if let Some(go_ty) = self.go_type(&ann.annotation, ann.location) {
                        out.line(format!("var {} {}", self.naming.escape(&var.name), go_ty));
                        self.declared.insert(var.name.clone());
                    }
                }
                (target, Some(value)) => {
                    let target_text = self.expr_or_error(target);
                    let value_text = self.expr_or_error(value);
                    out.line(format!("{} = {}", target_text, value_text));
                }
                _ => {}
            },
            Statement::Assign(assign) => match &assign.target {
                Expression::Variable(var) => {
                    let ty = assign.target.ty().clone();
                    self.emit_binding(out, &var.name, &ty, &assign.value, assign.location);
                }
                Expression::Subscript(sub)
                    if matches!(sub.object.ty(), SemanticType::List(_)) =>
                {
                    let object = self.list_value(&sub.object);
                    let index = self.expr_or_error(&sub.index);
                    let value = self.expr_or_error(&assign.value);
                    out.line(format!("{}[{}] = {}", object, index, value));
                }
                target => {
                    let target_text = self.expr_or_error(target);
                    let value_text = self.expr_or_error(&assign.value);
                    out.line(format!("{} = {}", target_text, value_text));
                }
            },
            Statement::AugAssign(aug) => {
                let ints = matches!(aug.target.ty(), SemanticType::Int);
                let target = self.expr_or_error(&aug.target);
                let value = self.expr_or_error(&aug.value);
                match aug.operator {
                    BinaryOperator::FloorDivide if ints => {
                        self.helpers.floordiv = true;
                        out.line(format!("{} = mgenFloorDiv({}, {})", target, target, value));
                    }
                    BinaryOperator::FloorDivide => {
                        self.imports.insert("math");
                        out.line(format!("{} = math.Floor({} / {})", target, target, value));
                    }
                    BinaryOperator::Modulo if ints => {
                        self.helpers.floormod = true;
                        out.line(format!("{} = mgenFloorMod({}, {})", target, target, value));
                    }
                    BinaryOperator::Modulo => {
                        self.imports.insert("math");
                        out.line(format!("{} = math.Mod({}, {})", target, target, value));
                    }
                    BinaryOperator::Power if ints => {
                        self.helpers.int_pow = true;
                        out.line(format!("{} = mgenPow({}, {})", target, target, value));
                    }
                    BinaryOperator::Power => {
                        self.imports.insert("math");
                        out.line(format!("{} = math.Pow({}, {})", target, target, value));
                    }
                    BinaryOperator::Divide => {
                        out.line(format!(
                            "{} = float64({}) / float64({})",
                            target, target, value
                        ));
                    }
                    op => out.line(format!("{} {}= {}", target, op, value)),
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
                match &while_stmt.condition {
                    Expression::Literal(lit) if lit.value == LiteralValue::Bool(true) => {
                        out.line("for {");
                    }
                    other => {
                        let condition = self.expr_or_error(other);
                        out.line(format!("for {} {{", condition));
                    }
                }
                out.indent();
                self.emit_block(out, &while_stmt.body);
                out.dedent();
                out.line("}");
            }
            Statement::For(for_stmt) => self.emit_for(out, for_stmt),
            Statement::Return(ret) => match &ret.value {
                None => out.line("return"),
                Some(Expression::Literal(lit)) if lit.value == LiteralValue::None => {
                    out.line("return")
                }
                Some(value) => {
                    let text = self.expr_or_error(value);
                    out.line(format!("return {}", text));
                }
            },
            Statement::Expression(expr_stmt) => {
                let text = self.expr_or_error(&expr_stmt.expression);
                out.line(text);
            }
            Statement::Pass(_) => {}
            Statement::Break(_) => out.line("break"),
            Statement::Continue(_) => out.line("continue"),
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
        let value_text = self.initializer_text(ty, value, location);
        if self.declared.contains(name) {
            out.line(format!("{} = {}", escaped, value_text));
        } else {
            out.line(format!("{} := {}", escaped, value_text));
            self.declared.insert(name.to_string());
        }
    }

    /// The Go initializer for a value, giving empty containers their
    /// typed literal form
    fn initializer_text(
        &mut self,
        ty: &SemanticType,
        value: &Expression,
        location: SourceLocation,
    ) -> String {
        let is_empty_constructor = matches!(value, Expression::Call(call)
            if matches!(call.callee_name(), Some("list") | Some("dict") | Some("set")));
        let is_empty_display = match value {
            Expression::ListDisplay(list) => list.elements.is_empty(),
            Expression::DictDisplay(dict) => dict.keys.is_empty(),
            Expression::SetDisplay(set) => set.elements.is_empty(),
            _ => false,
        };
        if is_empty_constructor || is_empty_display {
            if let Some(go_ty) = self.go_type(ty, location) {
                return format!("{}{{}}", go_ty);
            }
        }
        self.expr_or_error(value)
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
        match shape.source {
            IterationSource::Range(args) => {
                let Some(var) = for_stmt.target.single_name() else {
                    return self.error(
                        ErrorCode::GenerationFailure,
                        "range loops bind a single variable".to_string(),
                        for_stmt.location,
                    );
                };
                let var = self.naming.escape(var);
                let (start, stop, step) = match args {
                    [stop] => ("int64(0)".to_string(), self.expr_or_error(stop), "1".to_string()),
                    [start, stop] => (
                        format!("int64({})", self.expr_or_error(start)),
                        self.expr_or_error(stop),
                        "1".to_string(),
                    ),
                    [start, stop, step] => (
                        format!("int64({})", self.expr_or_error(start)),
                        self.expr_or_error(stop),
                        self.expr_or_error(step),
                    ),
                    _ => {
                        return self.error(
                            ErrorCode::GenerationFailure,
                            "range() takes 1 to 3 arguments".to_string(),
                            for_stmt.location,
                        );
                    }
                };
                let condition = match step.trim_start_matches('(').trim_end_matches(')') {
                    s if s.starts_with('-') => format!("{} > {}", var, stop),
                    "1" => format!("{} < {}", var, stop),
                    _ => format!("({} > 0 && {} < {}) || ({} < 0 && {} > {})", step, var, stop, step, var, stop),
                };
                out.line(format!(
                    "for {} := {}; {}; {} += {} {{",
                    var, start, condition, var, step
                ));
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.dedent();
                out.line("}");
            }
            IterationSource::Container(iterable) => {
                // Map iterations
                if let Expression::Call(call) = iterable {
                    if let Some((receiver, "items")) = call.method_parts() {
                        if let BindingTarget::Pair(k, v) = &for_stmt.target {
                            let obj = self.expr_or_error(receiver);
                            out.line(format!(
                                "for {}, {} := range {} {{",
                                self.naming.escape(k),
                                self.naming.escape(v),
                                obj
                            ));
                            out.indent();
                            self.emit_block(out, &for_stmt.body);
                            out.dedent();
                            out.line("}");
                            return;
                        }
                    }
                    if let Some((receiver, "keys")) = call.method_parts() {
                        if let Some(var) = for_stmt.target.single_name() {
                            let obj = self.expr_or_error(receiver);
                            out.line(format!(
                                "for {} := range {} {{",
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

                let Some(var) = for_stmt.target.single_name() else {
                    return self.error(
                        ErrorCode::GenerationFailure,
                        "pair targets require iterating .items()".to_string(),
                        for_stmt.location,
                    );
                };
                let iter_ty = iterable.ty().clone();
                match &iter_ty {
                    SemanticType::Dict(_, _) | SemanticType::Set(_) => {
                        let obj = self.expr_or_error(iterable);
                        out.line(format!(
                            "for {} := range {} {{",
                            self.naming.escape(var),
                            obj
                        ));
                    }
                    SemanticType::List(_) => {
                        let obj = self.list_value(iterable);
                        out.line(format!(
                            "for _, {} := range {} {{",
                            self.naming.escape(var),
                            obj
                        ));
                    }
                    other => {
                        return self.error(
                            ErrorCode::GenerationFailure,
                            format!("cannot iterate a value of type '{}'", other),
                            for_stmt.location,
                        );
                    }
                }
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.dedent();
                out.line("}");
            }
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

    /// A list expression as a slice value, dereferencing pointer params
    fn list_value(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::Variable(var) if self.pointer_params.contains(&var.name) => {
                format!("(*{})", self.naming.escape(&var.name))
            }
            other => self.expr_or_error(other),
        }
    }

    fn emit_expression(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Int(value) => format!("int64({})", value),
                LiteralValue::Float(value) => format_float(*value),
                LiteralValue::Bool(value) => format!("{}", value),
                LiteralValue::Str(value) => go_string_literal(value),
                LiteralValue::None => "nil".to_string(),
            }),
            Expression::Variable(var) => Ok(self.list_value_name(&var.name)),
            Expression::Binary(bin) => {
                let ints = matches!(bin.ty, SemanticType::Int);
                let left = self.emit_expression(&bin.left)?;
                let right = self.emit_expression(&bin.right)?;
                Ok(match bin.operator {
                    BinaryOperator::Divide => {
                        format!("(float64({}) / float64({}))", left, right)
                    }
                    BinaryOperator::FloorDivide if ints => {
                        self.helpers.floordiv = true;
                        format!("mgenFloorDiv({}, {})", left, right)
                    }
                    BinaryOperator::FloorDivide => {
                        self.imports.insert("math");
                        format!("math.Floor({} / {})", left, right)
                    }
                    BinaryOperator::Modulo if ints => {
                        self.helpers.floormod = true;
                        format!("mgenFloorMod({}, {})", left, right)
                    }
                    BinaryOperator::Modulo => {
                        self.imports.insert("math");
                        format!("math.Mod({}, {})", left, right)
                    }
                    BinaryOperator::Power if ints => {
                        self.helpers.int_pow = true;
                        format!("mgenPow({}, {})", left, right)
                    }
                    BinaryOperator::Power => {
                        self.imports.insert("math");
                        format!("math.Pow({}, {})", left, right)
                    }
                    op => format!("({} {} {})", left, op, right),
                })
            }
            Expression::Unary(unary) => {
                let operand = self.emit_expression(&unary.operand)?;
                Ok(match unary.operator {
                    UnaryOperator::Negate => format!("(-{})", operand),
                    UnaryOperator::Not => format!("(!{})", operand),
                    UnaryOperator::Invert => format!("(^{})", operand),
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
                Ok(format!("({} {} {})", left, cmp.operator, right))
            }
            Expression::Call(call) => self.emit_call(call),
            Expression::Attribute(attr) => {
                let object = self.emit_expression(&attr.object)?;
                Ok(format!("{}.{}", object, self.naming.escape(&attr.name)))
            }
            Expression::Subscript(sub) => {
                let index = self.emit_expression(&sub.index)?;
                match sub.object.ty() {
                    SemanticType::List(_) => {
                        let object = self.list_value(&sub.object);
                        Ok(format!("{}[{}]", object, index))
                    }
                    SemanticType::Str => {
                        let object = self.emit_expression(&sub.object)?;
                        Ok(format!("string({}[{}])", object, index))
                    }
                    _ => {
                        let object = self.emit_expression(&sub.object)?;
                        Ok(format!("{}[{}]", object, index))
                    }
                }
            }
            Expression::ListDisplay(list) => {
                let go_ty = self
                    .go_type(&list.ty, list.location)
                    .unwrap_or_else(|| "[]int64".to_string());
                let elems: Result<Vec<String>, TranslateError> =
                    list.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("{}{{{}}}", go_ty, elems?.join(", ")))
            }
            Expression::SetDisplay(set) => {
                let go_ty = self
                    .go_type(&set.ty, set.location)
                    .unwrap_or_else(|| "map[int64]bool".to_string());
                let elems: Result<Vec<String>, TranslateError> = set
                    .elements
                    .iter()
                    .map(|e| Ok(format!("{}: true", self.emit_expression(e)?)))
                    .collect();
                Ok(format!("{}{{{}}}", go_ty, elems?.join(", ")))
            }
            Expression::DictDisplay(dict) => {
                let go_ty = self
                    .go_type(&dict.ty, dict.location)
                    .unwrap_or_else(|| "map[string]int64".to_string());
                let mut pairs = Vec::new();
                for (key, value) in dict.keys.iter().zip(&dict.values) {
                    pairs.push(format!(
                        "{}: {}",
                        self.emit_expression(key)?,
                        self.emit_expression(value)?
                    ));
                }
                Ok(format!("{}{{{}}}", go_ty, pairs.join(", ")))
            }
            Expression::ListComp(_) | Expression::SetComp(_) | Expression::DictComp(_) => {
                Err(TranslateError::with_suggestion(
                    ErrorCode::GenerationFailure,
                    "comprehensions are not supported as bare expressions in the go target"
                        .to_string(),
                    expr.location(),
                    "build the container with an explicit loop".to_string(),
                ))
            }
            Expression::TupleDisplay(tuple) => Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                "the go target cannot represent tuple values".to_string(),
                tuple.location,
            )),
        }
    }

    fn list_value_name(&self, name: &str) -> String {
        if self.pointer_params.contains(name) {
            format!("(*{})", self.naming.escape(name))
        } else {
            self.naming.escape(name)
        }
    }

    fn emit_membership(
        &mut self,
        cmp: &mgen_ir::ast::ComparisonExpr,
    ) -> Result<String, TranslateError> {
        let needle = self.emit_expression(&cmp.left)?;
        match cmp.right.ty() {
            SemanticType::Dict(_, _) => {
                self.helpers.contains_map = true;
                let haystack = self.emit_expression(&cmp.right)?;
                Ok(format!("mgenContainsKey({}, {})", haystack, needle))
            }
            SemanticType::Set(_) => {
                let haystack = self.emit_expression(&cmp.right)?;
                Ok(format!("{}[{}]", haystack, needle))
            }
            SemanticType::List(_) => {
                self.helpers.contains_slice = true;
                let haystack = self.list_value(&cmp.right);
                Ok(format!("mgenContains({}, {})", haystack, needle))
            }
            SemanticType::Str => {
                self.imports.insert("strings");
                let haystack = self.emit_expression(&cmp.right)?;
                Ok(format!("strings.Contains({}, {})", haystack, needle))
            }
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
            "print" => {
                self.imports.insert("fmt");
                let mut args = Vec::new();
                for arg in &call.arguments {
                    let text = self.emit_expression(arg)?;
                    match arg.ty() {
                        SemanticType::Bool => {
                            self.helpers.bool_str = true;
                            args.push(format!("mgenBoolStr({})", text));
                        }
                        _ => args.push(text),
                    }
                }
                return Ok(format!("fmt.Println({})", args.join(", ")));
            }
            "len" => {
                let text = self.list_value(&call.arguments[0]);
                return Ok(format!("int64(len({}))", text));
            }
            "abs" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Float => {
                        self.imports.insert("math");
                        format!("math.Abs({})", arg)
                    }
                    _ => format!(
                        "func(v int64) int64 {{ if v < 0 {{ return -v }}; return v }}({})",
                        arg
                    ),
                });
            }
            "min" | "max" => {
                if call.arguments.len() == 2 {
                    let a = self.emit_expression(&call.arguments[0])?;
                    let b = self.emit_expression(&call.arguments[1])?;
                    return Ok(format!("{}({}, {})", name, a, b));
                }
                return Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedMethod,
                    format!("{}() over a container is not supported by the go target", name),
                    call.location,
                    "compute the extremum with an explicit loop".to_string(),
                ));
            }
            "sum" => {
                return Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedMethod,
                    "sum() is not supported by the go target".to_string(),
                    call.location,
                    "accumulate with an explicit loop".to_string(),
                ));
            }
            "str" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => arg,
                    SemanticType::Bool => {
                        self.helpers.bool_str = true;
                        format!("mgenBoolStr({})", arg)
                    }
                    _ => {
                        self.imports.insert("fmt");
                        format!("fmt.Sprint({})", arg)
                    }
                });
            }
            "int" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => {
                        self.imports.insert("strconv");
                        format!(
                            "func(s string) int64 {{ v, _ := strconv.ParseInt(s, 10, 64); return v }}({})",
                            arg
                        )
                    }
                    _ => format!("int64({})", arg),
                });
            }
            "float" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => {
                        self.imports.insert("strconv");
                        format!(
                            "func(s string) float64 {{ v, _ := strconv.ParseFloat(s, 64); return v }}({})",
                            arg
                        )
                    }
                    _ => format!("float64({})", arg),
                });
            }
            "bool" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Int => format!("({} != 0)", arg),
                    SemanticType::Float => format!("({} != 0.0)", arg),
                    SemanticType::Str => format!("({} != \"\")", arg),
                    _ => arg,
                });
            }
            "list" | "dict" | "set" => {
                let go_ty = self
                    .go_type(&call.ty, call.location)
                    .unwrap_or_else(|| "[]int64".to_string());
                return Ok(format!("{}{{}}", go_ty));
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

        if self.context.is_class(name) {
            let args: Result<Vec<String>, TranslateError> =
                call.arguments.iter().map(|a| self.emit_expression(a)).collect();
            return Ok(format!("New{}({})", name, args?.join(", ")));
        }

        let params = self
            .context
            .function_signature(name)
            .map(|sig| sig.params.clone())
            .unwrap_or_default();
        let mut args = Vec::new();
        for (i, arg) in call.arguments.iter().enumerate() {
            let pointer = params.get(i).is_some_and(|(param_name, param_ty)| {
                matches!(param_ty, SemanticType::List(_))
                    && self.context.mutability(name, param_name) == Mutability::Mutable
            });
            let text = self.emit_expression(arg)?;
            if pointer {
                args.push(format!("&{}", text));
            } else {
                args.push(text);
            }
        }
        Ok(format!(
            "{}({})",
            self.function_name(name),
            args.join(", ")
        ))
    }

    fn emit_method_call(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        receiver: &Expression,
        method: &str,
    ) -> Result<String, TranslateError> {
        let receiver_ty = receiver.ty().clone();

        match &receiver_ty {
            SemanticType::List(_) => match method {
                "append" => {
                    let target = self.list_value(receiver);
                    let value = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("{} = append({}, {})", target, target, value))
                }
                "clear" => {
                    let target = self.list_value(receiver);
                    Ok(format!("{} = {}[:0]", target, target))
                }
                "extend" => {
                    let target = self.list_value(receiver);
                    let other = self.list_value(&call.arguments[0]);
                    Ok(format!("{} = append({}, {}...)", target, target, other))
                }
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Dict(_, _) => match method {
                "get" => {
                    let recv = self.emit_expression(receiver)?;
                    let key = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("{}[{}]", recv, key))
                }
                "pop" | "erase" => {
                    let recv = self.emit_expression(receiver)?;
                    let key = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("delete({}, {})", recv, key))
                }
                "clear" => {
                    let recv = self.emit_expression(receiver)?;
                    Ok(format!("clear({})", recv))
                }
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Set(_) => match method {
                "add" => {
                    let recv = self.emit_expression(receiver)?;
                    let value = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("{}[{}] = true", recv, value))
                }
                "remove" | "discard" => {
                    let recv = self.emit_expression(receiver)?;
                    let value = self.emit_expression(&call.arguments[0])?;
                    Ok(format!("delete({}, {})", recv, value))
                }
                "clear" => {
                    let recv = self.emit_expression(receiver)?;
                    Ok(format!("clear({})", recv))
                }
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Str => {
                self.imports.insert("strings");
                let recv = self.emit_expression(receiver)?;
                match method {
                    "upper" => Ok(format!("strings.ToUpper({})", recv)),
                    "lower" => Ok(format!("strings.ToLower({})", recv)),
                    "strip" => Ok(format!("strings.TrimSpace({})", recv)),
                    "replace" => {
                        let from = self.emit_expression(&call.arguments[0])?;
                        let to = self.emit_expression(&call.arguments[1])?;
                        Ok(format!("strings.ReplaceAll({}, {}, {})", recv, from, to))
                    }
                    "find" => {
                        let needle = self.emit_expression(&call.arguments[0])?;
                        Ok(format!("int64(strings.Index({}, {}))", recv, needle))
                    }
                    "startswith" => {
                        let prefix = self.emit_expression(&call.arguments[0])?;
                        Ok(format!("strings.HasPrefix({}, {})", recv, prefix))
                    }
                    "endswith" => {
                        let suffix = self.emit_expression(&call.arguments[0])?;
                        Ok(format!("strings.HasSuffix({}, {})", recv, suffix))
                    }
                    "split" => {
                        let delim = self.emit_expression(&call.arguments[0])?;
                        Ok(format!("strings.Split({}, {})", recv, delim))
                    }
                    "join" => {
                        let parts = self.list_value(&call.arguments[0]);
                        Ok(format!("strings.Join({}, {})", parts, recv))
                    }
                    _ => self.unsupported_method(method, &receiver_ty, call.location),
                }
            }
            SemanticType::Object(_) => {
                let recv = self.emit_expression(receiver)?;
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

    fn unsupported_method(
        &self,
        method: &str,
        receiver_ty: &SemanticType,
        location: SourceLocation,
    ) -> Result<String, TranslateError> {
        Err(TranslateError::with_suggestion(
            ErrorCode::UnsupportedMethod,
            format!(
                "method '{}' on '{}' is not implemented for the go target",
                method, receiver_ty
            ),
            location,
            "rewrite the operation with supported primitives".to_string(),
        ))
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn go_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
