//! C converter
//!
//! Emits C11 linked against the MGen container runtime. Containers are
//! monomorphized runtime types (`vec_int`, `map_str_int`, ...); locals
//! own their containers and the emitter inserts the matching `_drop`
//! call before every return and at the end of the owning scope, since
//! the target has no destructors. Classes become plain structs with
//! free functions for the constructor and methods.

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
use mgen_types::{SemanticType, Target};
use std::collections::{HashMap, HashSet};

pub struct CConverter;

impl TargetConverter for CConverter {
    fn target(&self) -> Target {
        Target::C
    }

    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput> {
        let mut emitter = CEmitter::new(context);
        let text = emitter.emit_module(module);
        if emitter.errors.is_empty() {
            Ok(GeneratedOutput::single(format!("{}.c", stem), text))
        } else {
            Err(emitter.errors)
        }
    }
}

/// What the emitter knows about one local binding
#[derive(Clone)]
struct LocalInfo {
    ty: SemanticType,
    /// Container and object parameters arrive as pointers; locals are
    /// values
    is_pointer: bool,
}

/// Generated static helpers, emitted once when first used
#[derive(Default)]
struct HelperFlags {
    floordiv: bool,
    floormod: bool,
    int_pow: bool,
    math: bool,
    vec_int_contains: bool,
    vec_double_contains: bool,
    vec_str_contains: bool,
    sum_vec_int: bool,
    sum_vec_double: bool,
    minmax_vec_int: bool,
    minmax_vec_double: bool,
}

struct CEmitter<'a> {
    context: &'a mut CompilationContext,
    naming: NamingPolicy,
    errors: Vec<TranslateError>,
    locals: HashMap<String, LocalInfo>,
    declared: HashSet<String>,
    /// Stack of scopes holding the container locals that need a drop
    drop_scopes: Vec<Vec<String>>,
    helpers: HelperFlags,
    tmp_counter: usize,
    current_class: Option<String>,
}

impl<'a> CEmitter<'a> {
    fn new(context: &'a mut CompilationContext) -> Self {
        CEmitter {
            context,
            naming: NamingPolicy::for_target(Target::C),
            errors: Vec::new(),
            locals: HashMap::new(),
            declared: HashSet::new(),
            drop_scopes: Vec::new(),
            helpers: HelperFlags::default(),
            tmp_counter: 0,
            current_class: None,
        }
    }

    fn error(&mut self, code: ErrorCode, message: String, location: SourceLocation) {
        self.errors.push(TranslateError::new(code, message, location));
    }

    fn fresh_tmp(&mut self, prefix: &str) -> String {
        self.tmp_counter += 1;
        format!("{}{}", prefix, self.tmp_counter)
    }

    // ----- module layout -----

    fn emit_module(&mut self, module: &Module) -> String {
        let mut body = FormatWriter::new();

        for decl in &module.declarations {
            match decl {
                Declaration::Class(class) => self.emit_class(&mut body, class),
                Declaration::Function(func) => self.emit_function(&mut body, func, None),
                _ => {}
            }
        }

        if module.function("main").is_some() {
            body.line("int main(void) {");
            body.indent();
            match module.function("main").map(|f| &f.return_type) {
                Some(SemanticType::Int) => body.line("return (int)mgen_user_main();"),
                _ => {
                    body.line("mgen_user_main();");
                    body.line("return 0;");
                }
            }
            body.dedent();
            body.line("}");
        }

        let mut out = FormatWriter::new();
        self.emit_prelude(&mut out, module);
        out.raw(body.finish());
        out.finish()
    }

    fn emit_prelude(&mut self, out: &mut FormatWriter, module: &Module) {
        out.line("#include <stdbool.h>");
        out.line("#include <stdio.h>");
        out.line("#include <stdlib.h>");
        out.line("#include <string.h>");
        if self.helpers.math {
            out.line("#include <math.h>");
        }
        out.line("#include \"mgen_runtime.h\"");
        out.blank();

        self.emit_helper_functions(out);
        self.emit_struct_definitions(out, module);
        self.emit_prototypes(out, module);
        self.emit_globals(out, module);
    }

    fn emit_helper_functions(&self, out: &mut FormatWriter) {
        if self.helpers.floordiv {
            out.line("static long long mgen_floordiv_i64(long long a, long long b) {");
            out.indent();
            out.line("long long q = a / b;");
            out.line("if ((a % b != 0) && ((a < 0) != (b < 0))) {");
            out.indent();
            out.line("q--;");
            out.dedent();
            out.line("}");
            out.line("return q;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.floormod {
            out.line("static long long mgen_floormod_i64(long long a, long long b) {");
            out.indent();
            out.line("long long r = a % b;");
            out.line("if (r != 0 && ((r < 0) != (b < 0))) {");
            out.indent();
            out.line("r += b;");
            out.dedent();
            out.line("}");
            out.line("return r;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.int_pow {
            out.line("static long long mgen_pow_i64(long long base, long long exp) {");
            out.indent();
            out.line("long long result = 1;");
            out.line("while (exp > 0) {");
            out.indent();
            out.line("if (exp & 1) {");
            out.indent();
            out.line("result *= base;");
            out.dedent();
            out.line("}");
            out.line("base *= base;");
            out.line("exp >>= 1;");
            out.dedent();
            out.line("}");
            out.line("return result;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.vec_int_contains {
            out.line("static bool mgen_vec_int_contains(const vec_int *v, long long value) {");
            out.indent();
            out.line("for (size_t i = 0; i < v->size; i++) {");
            out.indent();
            out.line("if (v->data[i] == value) {");
            out.indent();
            out.line("return true;");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.line("return false;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.vec_double_contains {
            out.line("static bool mgen_vec_double_contains(const vec_double *v, double value) {");
            out.indent();
            out.line("for (size_t i = 0; i < v->size; i++) {");
            out.indent();
            out.line("if (v->data[i] == value) {");
            out.indent();
            out.line("return true;");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.line("return false;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.vec_str_contains {
            out.line("static bool mgen_vec_str_contains(const vec_str *v, const char *value) {");
            out.indent();
            out.line("for (size_t i = 0; i < v->size; i++) {");
            out.indent();
            out.line("if (mgen_str_eq(v->data[i], value)) {");
            out.indent();
            out.line("return true;");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.line("return false;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.sum_vec_int {
            out.line("static long long mgen_sum_vec_int(const vec_int *v) {");
            out.indent();
            out.line("long long total = 0;");
            out.line("for (size_t i = 0; i < v->size; i++) {");
            out.indent();
            out.line("total += v->data[i];");
            out.dedent();
            out.line("}");
            out.line("return total;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.sum_vec_double {
            out.line("static double mgen_sum_vec_double(const vec_double *v) {");
            out.indent();
            out.line("double total = 0.0;");
            out.line("for (size_t i = 0; i < v->size; i++) {");
            out.indent();
            out.line("total += v->data[i];");
            out.dedent();
            out.line("}");
            out.line("return total;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.minmax_vec_int {
            for (name, op) in [("min", "<"), ("max", ">")] {
                out.line(format!(
                    "static long long mgen_{}_vec_int(const vec_int *v) {{",
                    name
                ));
                out.indent();
                out.line("if (v->size == 0) {");
                out.indent();
                out.line(format!("mgen_fatal_bounds(\"{}(vec_int)\", 0, 0);", name));
                out.dedent();
                out.line("}");
                out.line("long long best = v->data[0];");
                out.line("for (size_t i = 1; i < v->size; i++) {");
                out.indent();
                out.line(format!("if (v->data[i] {} best) {{", op));
                out.indent();
                out.line("best = v->data[i];");
                out.dedent();
                out.line("}");
                out.dedent();
                out.line("}");
                out.line("return best;");
                out.dedent();
                out.line("}");
                out.blank();
            }
        }
        if self.helpers.minmax_vec_double {
            for (name, op) in [("min", "<"), ("max", ">")] {
                out.line(format!(
                    "static double mgen_{}_vec_double(const vec_double *v) {{",
                    name
                ));
                out.indent();
                out.line("if (v->size == 0) {");
                out.indent();
                out.line(format!("mgen_fatal_bounds(\"{}(vec_double)\", 0, 0);", name));
                out.dedent();
                out.line("}");
                out.line("double best = v->data[0];");
                out.line("for (size_t i = 1; i < v->size; i++) {");
                out.indent();
                out.line(format!("if (v->data[i] {} best) {{", op));
                out.indent();
                out.line("best = v->data[i];");
                out.dedent();
                out.line("}");
                out.dedent();
                out.line("}");
                out.line("return best;");
                out.dedent();
                out.line("}");
                out.blank();
            }
        }
    }

    fn emit_struct_definitions(&mut self, out: &mut FormatWriter, module: &Module) {
        for decl in &module.declarations {
            let Declaration::Class(class) = decl else {
                continue;
            };
            let fields = self
                .context
                .class_info(&class.name)
                .map(|info| info.fields.clone())
                .unwrap_or_default();
            out.line("typedef struct {");
            out.indent();
            for (name, ty) in &fields {
                match self.c_type(ty, class.location) {
                    Some(c_ty) => out.line(format!("{} {};", c_ty, self.naming.escape(name))),
                    None => {}
                }
            }
            out.dedent();
            out.line(format!("}} {};", class.name));
            out.blank();
        }
    }

    fn emit_prototypes(&mut self, out: &mut FormatWriter, module: &Module) {
        let mut any = false;
        for decl in &module.declarations {
            match decl {
                Declaration::Function(func) => {
                    let signature = self.function_signature(func, None);
                    out.line(format!("{};", signature));
                    any = true;
                }
                Declaration::Class(class) => {
                    for method in &class.methods {
                        let signature = self.function_signature(method, Some(&class.name));
                        out.line(format!("{};", signature));
                        any = true;
                    }
                }
                _ => {}
            }
        }
        if any {
            out.blank();
        }
    }

    fn emit_globals(&mut self, out: &mut FormatWriter, module: &Module) {
        let mut any = false;
        for decl in &module.declarations {
            let Declaration::GlobalVar(var) = decl else {
                continue;
            };
            let Some(c_ty) = self.c_type(&var.annotation, var.location) else {
                continue;
            };
            let value = self.expr_or_error(&var.value);
            out.line(format!(
                "static {} {} = {};",
                c_ty,
                self.naming.escape(&var.name),
                value
            ));
            any = true;
        }
        if any {
            out.blank();
        }
    }

    // ----- types -----

    /// Maps a semantic type to its C spelling, registering the runtime
    /// instantiation when the type is a runtime container
    fn c_type(&mut self, ty: &SemanticType, location: SourceLocation) -> Option<String> {
        let mapped = match ty {
            SemanticType::Int => "long long".to_string(),
            SemanticType::Float => "double".to_string(),
            SemanticType::Bool => "bool".to_string(),
            SemanticType::Str => "char *".to_string(),
            SemanticType::Void => "void".to_string(),
            SemanticType::Object(name) => name.clone(),
            _ => match self.container_type(ty) {
                Some(name) => {
                    self.context.require_runtime(&name);
                    name
                }
                None => {
                    self.error(
                        ErrorCode::UnsupportedFeature,
                        format!("the c target cannot represent the type '{}'", ty),
                        location,
                    );
                    return None;
                }
            },
        };
        Some(mapped)
    }

    /// The monomorphized runtime container for a container shape
    fn container_type(&self, ty: &SemanticType) -> Option<String> {
        match ty {
            SemanticType::List(elem) => match elem.as_ref() {
                SemanticType::Int | SemanticType::Bool => Some("vec_int".to_string()),
                SemanticType::Float => Some("vec_double".to_string()),
                SemanticType::Str => Some("vec_str".to_string()),
                _ => None,
            },
            SemanticType::Dict(key, value) => match (key.as_ref(), value.as_ref()) {
                (SemanticType::Str, SemanticType::Int) => Some("map_str_int".to_string()),
                (SemanticType::Int, SemanticType::Int) => Some("map_int_int".to_string()),
                _ => None,
            },
            SemanticType::Set(elem) => match elem.as_ref() {
                SemanticType::Int | SemanticType::Bool => Some("set_int".to_string()),
                SemanticType::Str => Some("set_str".to_string()),
                _ => None,
            },
            _ => None,
        }
    }

    fn is_runtime_container(&self, ty: &SemanticType) -> bool {
        !matches!(ty, SemanticType::Str) && self.container_type(ty).is_some()
    }

    /// Check if values of this type are passed by pointer
    fn passes_by_pointer(&self, ty: &SemanticType) -> bool {
        self.is_runtime_container(ty) || matches!(ty, SemanticType::Object(_))
    }

    // ----- functions -----

    fn function_name(&self, func_name: &str, class: Option<&str>) -> String {
        match class {
            Some(class) => format!("{}_{}", class, func_name.trim_start_matches("__")),
            None if func_name == "main" => "mgen_user_main".to_string(),
            None => self.naming.escape(func_name),
        }
    }

    fn function_signature(&mut self, func: &FunctionDef, class: Option<&str>) -> String {
        let location = func.location;
        let name = if class.is_some() && func.name == "__init__" {
            format!("{}_new", class.expect("constructor has a class"))
        } else {
            self.function_name(&func.name, class)
        };

        let ret = if class.is_some() && func.name == "__init__" {
            class.expect("constructor has a class").to_string()
        } else {
            self.c_type(&func.return_type, location)
                .unwrap_or_else(|| "void".to_string())
        };

        let mut params = Vec::new();
        if let Some(class) = class {
            if func.name != "__init__" {
                params.push(format!("{} *self", class));
            }
        }
        for param in func.value_parameters() {
            let Some(c_ty) = self.c_type(&param.annotation, param.location) else {
                continue;
            };
            if self.passes_by_pointer(&param.annotation) {
                params.push(format!("{} *{}", c_ty, self.naming.escape(&param.name)));
            } else {
                params.push(format!("{} {}", c_ty, self.naming.escape(&param.name)));
            }
        }
        if params.is_empty() {
            params.push("void".to_string());
        }

        format!("{} {}({})", ret, name, params.join(", "))
    }

    fn emit_class(&mut self, out: &mut FormatWriter, class: &ClassDef) {
        for method in &class.methods {
            self.emit_function(out, method, Some(class));
        }
    }

    fn emit_function(&mut self, out: &mut FormatWriter, func: &FunctionDef, class: Option<&ClassDef>) {
        self.locals.clear();
        self.declared.clear();
        self.drop_scopes = vec![Vec::new()];
        self.current_class = class.map(|c| c.name.clone());

        let class_name = class.map(|c| c.name.as_str());
        let signature = self.function_signature(func, class_name);
        out.line(format!("{} {{", signature));
        out.indent();

        let is_constructor = class.is_some() && func.name == "__init__";
        if is_constructor {
            let class_name = class_name.expect("constructor has a class");
            out.line(format!("{} self_value = {{0}};", class_name));
            out.line(format!("{} *self = &self_value;", class_name));
        }

        for param in &func.parameters {
            let ty = if param.name == "self" {
                match &self.current_class {
                    Some(name) => SemanticType::Object(name.clone()),
                    None => SemanticType::Unknown,
                }
            } else {
                param.annotation.clone()
            };
            let is_pointer = param.name == "self" || self.passes_by_pointer(&ty);
            self.locals.insert(
                param.name.clone(),
                LocalInfo { ty, is_pointer },
            );
            self.declared.insert(param.name.clone());
        }

        self.emit_block(out, &func.body);

        if is_constructor {
            self.emit_scope_drops(out, None);
            out.line("return self_value;");
        } else if !matches!(func.body.last(), Some(Statement::Return(_))) {
            self.emit_scope_drops(out, None);
        }

        out.dedent();
        out.line("}");
        out.blank();
    }

    // ----- drops -----

    fn track_container(&mut self, name: &str, ty: &SemanticType) {
        if self.is_runtime_container(ty) {
            self.drop_scopes
                .last_mut()
                .expect("drop scope stack is never empty")
                .push(name.to_string());
        }
    }

    /// Emits drops for every live container local, skipping the returned
    /// binding
    fn emit_scope_drops(&mut self, out: &mut FormatWriter, keep: Option<&str>) {
        let mut lines = Vec::new();
        for scope in &self.drop_scopes {
            for name in scope {
                if Some(name.as_str()) == keep {
                    continue;
                }
                if let Some(info) = self.locals.get(name) {
                    if let Some(container) = self.container_type(&info.ty) {
                        lines.push(format!(
                            "{}_drop(&{});",
                            container,
                            self.naming.escape(name)
                        ));
                    }
                }
            }
        }
        for line in lines {
            out.line(line);
        }
    }

    /// Emits drops for the innermost scope only (end of a loop body)
    fn emit_innermost_drops(&mut self, out: &mut FormatWriter) {
        let scope = self
            .drop_scopes
            .last()
            .cloned()
            .unwrap_or_default();
        for name in scope {
            if let Some(info) = self.locals.get(&name) {
                if let Some(container) = self.container_type(&info.ty) {
                    out.line(format!("{}_drop(&{});", container, self.naming.escape(&name)));
                }
            }
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
            Statement::AnnAssign(ann) => {
                let value_ty = ann.annotation.clone();
                match (&ann.target, &ann.value) {
                    (Expression::Variable(var), Some(value)) => {
                        self.emit_binding(out, &var.name, &value_ty, value, ann.location);
                    }
                    (Expression::Variable(var), None) => {
                        if let Some(c_ty) = self.c_type(&value_ty, ann.location) {
                            let init = self.default_value(&value_ty);
                            out.line(format!(
                                "{} {} = {};",
                                c_ty,
                                self.naming.escape(&var.name),
                                init
                            ));
                            self.register_local(&var.name, &value_ty);
                        }
                    }
                    (target, Some(value)) => {
                        let target_text = self.expr_or_error(target);
                        if self.is_container_construction(value) {
                            if let Some(container) = self.container_type(&value_ty) {
                                out.line(format!("{} = {}_init();", target_text, container));
                            }
                            self.emit_container_fill(out, &target_text, &value_ty, value);
                        } else {
                            let value_text = self.expr_or_error(value);
                            out.line(format!("{} = {};", target_text, value_text));
                        }
                    }
                    _ => {}
                }
            }
            Statement::Assign(assign) => self.emit_assign(out, assign),
            Statement::AugAssign(aug) => {
                let target_ty = aug.target.ty().clone();
                let target = self.expr_or_error(&aug.target);
                let value = self.expr_or_error(&aug.value);
                let ints = matches!(target_ty, SemanticType::Int);
                match aug.operator {
                    BinaryOperator::FloorDivide if ints => {
                        self.helpers.floordiv = true;
                        out.line(format!(
                            "{} = mgen_floordiv_i64({}, {});",
                            target, target, value
                        ));
                    }
                    BinaryOperator::FloorDivide => {
                        self.helpers.math = true;
                        out.line(format!("{} = floor({} / {});", target, target, value));
                    }
                    BinaryOperator::Modulo if ints => {
                        self.helpers.floormod = true;
                        out.line(format!(
                            "{} = mgen_floormod_i64({}, {});",
                            target, target, value
                        ));
                    }
                    BinaryOperator::Modulo => {
                        self.helpers.math = true;
                        out.line(format!("{} = fmod({}, {});", target, target, value));
                    }
                    BinaryOperator::Power if ints => {
                        self.helpers.int_pow = true;
                        out.line(format!("{} = mgen_pow_i64({}, {});", target, target, value));
                    }
                    BinaryOperator::Power => {
                        self.helpers.math = true;
                        out.line(format!("{} = pow({}, {});", target, target, value));
                    }
                    BinaryOperator::Add if matches!(target_ty, SemanticType::Str) => {
                        out.line(format!("{} = mgen_str_concat({}, {});", target, target, value));
                    }
                    BinaryOperator::Divide => {
                        out.line(format!("{} = {} / (double){};", target, target, value));
                    }
                    op => {
                        out.line(format!("{} {}= {};", target, op, value));
                    }
                }
            }
            Statement::If(if_stmt) => {
                let condition = self.expr_or_error(&if_stmt.condition);
                out.line(format!("if ({}) {{", condition));
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
                // `while True:` is recognized specifically
                let header = match &while_stmt.condition {
                    Expression::Literal(lit) if lit.value == LiteralValue::Bool(true) => {
                        "while (1) {".to_string()
                    }
                    other => format!("while ({}) {{", self.expr_or_error(other)),
                };
                out.line(header);
                out.indent();
                self.emit_loop_body(out, &while_stmt.body);
                out.dedent();
                out.line("}");
            }
            Statement::For(for_stmt) => self.emit_for(out, for_stmt),
            Statement::Return(ret) => self.emit_return(out, ret.value.as_ref(), ret.location),
            Statement::Expression(expr_stmt) => {
                if let Some(line) = self.emit_expression_statement(&expr_stmt.expression) {
                    out.line(line);
                }
            }
            Statement::Pass(_) => {}
            Statement::Break(_) => out.line("break;"),
            Statement::Continue(_) => out.line("continue;"),
        }
    }

    fn register_local(&mut self, name: &str, ty: &SemanticType) {
        self.locals.insert(
            name.to_string(),
            LocalInfo {
                ty: ty.clone(),
                is_pointer: false,
            },
        );
        self.declared.insert(name.to_string());
        self.track_container(name, ty);
    }

    /// Emits a first binding or a re-assignment of a named local
    fn emit_binding(
        &mut self,
        out: &mut FormatWriter,
        name: &str,
        ty: &SemanticType,
        value: &Expression,
        location: SourceLocation,
    ) {
        let escaped = self.naming.escape(name);
        let first = !self.declared.contains(name);

        if self.is_container_construction(value) {
            if first {
                let Some(c_ty) = self.c_type(ty, location) else {
                    return;
                };
                out.line(format!("{} {} = {};", c_ty, escaped, self.default_value(ty)));
                self.register_local(name, ty);
            }
            self.emit_container_fill(out, &escaped, ty, value);
            return;
        }

        let value_text = self.expr_or_error(value);
        if first {
            let Some(c_ty) = self.c_type(ty, location) else {
                return;
            };
            out.line(format!("{} {} = {};", c_ty, escaped, value_text));
            self.register_local(name, ty);
        } else {
            out.line(format!("{} = {};", escaped, value_text));
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
                let value = self.expr_or_error(&assign.value);
                let index = self.expr_or_error(&sub.index);
                match &object_ty {
                    SemanticType::List(_) => {
                        let Some(container) = self.container_type(&object_ty) else {
                            return self.unsupported_shape(&object_ty, assign.location);
                        };
                        let obj = self.receiver_ref(&sub.object);
                        out.line(format!(
                            "*{}_at({}, {}) = {};",
                            container, obj, index, value
                        ));
                    }
                    SemanticType::Dict(_, _) => {
                        let Some(container) = self.container_type(&object_ty) else {
                            return self.unsupported_shape(&object_ty, assign.location);
                        };
                        let obj = self.receiver_ref(&sub.object);
                        out.line(format!("{}_set({}, {}, {});", container, obj, index, value));
                    }
                    other => self.unsupported_shape(other, assign.location),
                }
            }
            Expression::Attribute(_) => {
                let target = self.expr_or_error(&assign.target);
                let target_ty = assign.target.ty().clone();
                if self.is_container_construction(&assign.value) {
                    if let Some(container) = self.container_type(&target_ty) {
                        out.line(format!("{} = {}_init();", target, container));
                    }
                    self.emit_container_fill(out, &target, &target_ty, &assign.value);
                } else {
                    let value = self.expr_or_error(&assign.value);
                    out.line(format!("{} = {};", target, value));
                }
            }
            other => {
                self.error(
                    ErrorCode::GenerationFailure,
                    "invalid assignment target survived analysis".to_string(),
                    other.location(),
                );
            }
        }
    }

    fn unsupported_shape(&mut self, ty: &SemanticType, location: SourceLocation) {
        self.error(
            ErrorCode::UnsupportedFeature,
            format!("the c target cannot represent the type '{}'", ty),
            location,
        );
    }

    /// Check if the expression builds a fresh container (display,
    /// comprehension, or empty constructor call)
    fn is_container_construction(&self, expr: &Expression) -> bool {
        matches!(
            expr,
            Expression::ListDisplay(_)
                | Expression::DictDisplay(_)
                | Expression::SetDisplay(_)
                | Expression::ListComp(_)
                | Expression::SetComp(_)
                | Expression::DictComp(_)
        ) || matches!(expr, Expression::Call(call)
            if matches!(call.callee_name(), Some("list") | Some("dict") | Some("set")))
    }

    /// Emits the statements that fill a freshly initialized container
    fn emit_container_fill(
        &mut self,
        out: &mut FormatWriter,
        name: &str,
        ty: &SemanticType,
        value: &Expression,
    ) {
        let Some(container) = self.container_type(ty) else {
            return self.unsupported_shape(ty, value.location());
        };
        match value {
            Expression::ListDisplay(list) => {
                for elem in &list.elements {
                    let text = self.expr_or_error(elem);
                    let text = self.owned_string_value(elem, text, ty);
                    out.line(format!("{}_push(&{}, {});", container, name, text));
                }
            }
            Expression::SetDisplay(set) => {
                for elem in &set.elements {
                    let text = self.expr_or_error(elem);
                    out.line(format!("{}_insert(&{}, {});", container, name, text));
                }
            }
            Expression::DictDisplay(dict) => {
                for (key, val) in dict.keys.iter().zip(&dict.values) {
                    let key_text = self.expr_or_error(key);
                    let val_text = self.expr_or_error(val);
                    out.line(format!("{}_set(&{}, {}, {});", container, name, key_text, val_text));
                }
            }
            Expression::ListComp(comp) => {
                let element = (*comp.element).clone();
                self.emit_comprehension_loop(out, name, &container, "push", &element, &comp.generator, ty);
            }
            Expression::SetComp(comp) => {
                let element = (*comp.element).clone();
                self.emit_comprehension_loop(out, name, &container, "insert", &element, &comp.generator, ty);
            }
            Expression::DictComp(comp) => {
                let generator = comp.generator.clone();
                let for_stmt = ForStatement {
                    target: generator.target.clone(),
                    iterable: (*generator.iterable).clone(),
                    body: Vec::new(),
                    location: comp.location,
                };
                self.emit_iteration(out, &for_stmt, &mut |emitter, out| {
                    let key = emitter.expr_or_error(&comp.key);
                    let value = emitter.expr_or_error(&comp.value);
                    if let Some(condition) = &generator.condition {
                        let cond = emitter.expr_or_error(condition);
                        out.line(format!("if ({}) {{", cond));
                        out.indent();
                        out.line(format!("{}_set(&{}, {}, {});", container, name, key, value));
                        out.dedent();
                        out.line("}");
                    } else {
                        out.line(format!("{}_set(&{}, {}, {});", container, name, key, value));
                    }
                });
            }
            Expression::Call(_) => {
                // list()/dict()/set(): nothing to fill
            }
            _ => {}
        }
    }

    /// Emits the loop lowering of a list or set comprehension
    fn emit_comprehension_loop(
        &mut self,
        out: &mut FormatWriter,
        name: &str,
        container: &str,
        insert_op: &str,
        element: &Expression,
        generator: &mgen_ir::ast::Comprehension,
        target_ty: &SemanticType,
    ) {
        let for_stmt = ForStatement {
            target: generator.target.clone(),
            iterable: (*generator.iterable).clone(),
            body: Vec::new(),
            location: element.location(),
        };
        let condition = generator.condition.clone();
        let element = element.clone();
        let container = container.to_string();
        let insert_op = insert_op.to_string();
        let name = name.to_string();
        let target_ty = target_ty.clone();
        self.emit_iteration(out, &for_stmt, &mut |emitter, out| {
            let text = emitter.expr_or_error(&element);
            let text = emitter.owned_string_value(&element, text, &target_ty);
            let push = format!("{}_{}(&{}, {});", container, insert_op, name, text);
            if let Some(condition) = &condition {
                let cond = emitter.expr_or_error(condition);
                out.line(format!("if ({}) {{", cond));
                out.indent();
                out.line(push);
                out.dedent();
                out.line("}");
            } else {
                out.line(push);
            }
        });
    }

    /// Vec-of-string pushes take ownership; literals and borrowed
    /// strings are duplicated first
    fn owned_string_value(&self, elem: &Expression, text: String, container_ty: &SemanticType) -> String {
        let is_str_elem = matches!(
            container_ty,
            SemanticType::List(elem_ty) if matches!(elem_ty.as_ref(), SemanticType::Str)
        );
        if !is_str_elem {
            return text;
        }
        match elem {
            // String-producing runtime calls already return owned text
            Expression::Call(_) | Expression::Binary(_) => text,
            _ => format!("mgen_strdup({})", text),
        }
    }

    fn default_value(&mut self, ty: &SemanticType) -> String {
        match ty {
            SemanticType::Int => "0".to_string(),
            SemanticType::Float => "0.0".to_string(),
            SemanticType::Bool => "false".to_string(),
            SemanticType::Str => "NULL".to_string(),
            _ => match self.container_type(ty) {
                Some(container) => format!("{}_init()", container),
                None => "{0}".to_string(),
            },
        }
    }

    // ----- loops -----

    fn emit_loop_body(&mut self, out: &mut FormatWriter, body: &[Statement]) {
        self.drop_scopes.push(Vec::new());
        self.emit_block(out, body);
        self.emit_innermost_drops(out);
        self.drop_scopes.pop();
    }

    fn emit_for(&mut self, out: &mut FormatWriter, for_stmt: &ForStatement) {
        let body = for_stmt.body.clone();
        self.emit_iteration(out, for_stmt, &mut |emitter, out| {
            emitter.emit_loop_body(out, &body);
        });
    }

    /// Emits the loop header for a `for` statement and runs `emit_body`
    /// inside it with the loop targets bound
    fn emit_iteration(
        &mut self,
        out: &mut FormatWriter,
        for_stmt: &ForStatement,
        emit_body: &mut dyn FnMut(&mut Self, &mut FormatWriter),
    ) {
        let shape = classify(for_stmt);
        match shape.source {
            IterationSource::Range(args) => {
                let Some(var) = for_stmt.target.single_name() else {
                    self.error(
                        ErrorCode::GenerationFailure,
                        "range loops bind a single variable".to_string(),
                        for_stmt.location,
                    );
                    return;
                };
                let var = self.naming.escape(var);
                let (start, stop, step) = match args {
                    [stop] => ("0".to_string(), self.expr_or_error(stop), "1".to_string()),
                    [start, stop] => (
                        self.expr_or_error(start),
                        self.expr_or_error(stop),
                        "1".to_string(),
                    ),
                    [start, stop, step] => (
                        self.expr_or_error(start),
                        self.expr_or_error(stop),
                        self.expr_or_error(step),
                    ),
                    _ => {
                        self.error(
                            ErrorCode::GenerationFailure,
                            "range() takes 1 to 3 arguments".to_string(),
                            for_stmt.location,
                        );
                        return;
                    }
                };
                self.locals.insert(
                    for_stmt.target.single_name().expect("checked above").to_string(),
                    LocalInfo {
                        ty: SemanticType::Int,
                        is_pointer: false,
                    },
                );
                // Negative literal steps reverse the loop direction
                let condition = match step.trim_start_matches('(').trim_end_matches(')') {
                    s if s.starts_with('-') => format!("{} > {}", var, stop),
                    "1" => format!("{} < {}", var, stop),
                    _ => format!("({} > 0) ? ({} < {}) : ({} > {})", step, var, stop, var, stop),
                };
                out.line(format!(
                    "for (long long {} = {}; {}; {} += {}) {{",
                    var, start, condition, var, step
                ));
                out.indent();
                emit_body(self, out);
                out.dedent();
                out.line("}");
            }
            IterationSource::Container(iterable) => {
                self.emit_container_iteration(out, for_stmt, iterable, emit_body);
            }
        }
    }

    fn emit_container_iteration(
        &mut self,
        out: &mut FormatWriter,
        for_stmt: &ForStatement,
        iterable: &Expression,
        emit_body: &mut dyn FnMut(&mut Self, &mut FormatWriter),
    ) {
        // `for k, v in m.items()` and `for k in m` iterate the map
        // directly through its key list
        let (map_expr, pair_values) = match iterable {
            Expression::Call(call) => match call.method_parts() {
                Some((receiver, "items")) => (Some(receiver), true),
                Some((receiver, "keys")) => (Some(receiver), false),
                _ => (None, false),
            },
            other if matches!(other.ty(), SemanticType::Dict(_, _)) => (Some(other), false),
            _ => (None, false),
        };

        if let Some(map_expr) = map_expr {
            return self.emit_map_iteration(out, for_stmt, map_expr, pair_values, emit_body);
        }

        let iter_ty = iterable.ty().clone();
        let idx = self.fresh_tmp("mgen_i_");
        match &iter_ty {
            SemanticType::List(elem) => {
                let Some(container) = self.container_type(&iter_ty) else {
                    return self.unsupported_shape(&iter_ty, for_stmt.location);
                };
                let Some(var) = for_stmt.target.single_name() else {
                    return self.error(
                        ErrorCode::GenerationFailure,
                        "list iteration binds a single variable".to_string(),
                        for_stmt.location,
                    );
                };
                let Some(elem_ty) = self.c_type(elem, for_stmt.location) else {
                    return;
                };
                let obj = self.receiver_ref(iterable);
                out.line(format!(
                    "for (size_t {idx} = 0; {idx} < {container}_size({obj}); {idx}++) {{"
                ));
                out.indent();
                out.line(format!(
                    "{} {} = *{}_at({}, (long long){});",
                    elem_ty,
                    self.naming.escape(var),
                    container,
                    obj,
                    idx
                ));
                self.locals.insert(
                    var.to_string(),
                    LocalInfo {
                        ty: (**elem).clone(),
                        is_pointer: false,
                    },
                );
                emit_body(self, out);
                out.dedent();
                out.line("}");
            }
            SemanticType::Set(elem) => {
                let Some(container) = self.container_type(&iter_ty) else {
                    return self.unsupported_shape(&iter_ty, for_stmt.location);
                };
                let Some(var) = for_stmt.target.single_name() else {
                    return self.error(
                        ErrorCode::GenerationFailure,
                        "set iteration binds a single variable".to_string(),
                        for_stmt.location,
                    );
                };
                let Some(elem_ty) = self.c_type(elem, for_stmt.location) else {
                    return;
                };
                let obj = self.receiver_ref(iterable);
                let cast = if matches!(elem.as_ref(), SemanticType::Str) {
                    "(char *)"
                } else {
                    ""
                };
                out.line(format!(
                    "for (size_t {idx} = 0; {idx} < {container}_size({obj}); {idx}++) {{"
                ));
                out.indent();
                out.line(format!(
                    "{} {} = {}{}_nth({}, {});",
                    elem_ty,
                    self.naming.escape(var),
                    cast,
                    container,
                    obj,
                    idx
                ));
                self.locals.insert(
                    var.to_string(),
                    LocalInfo {
                        ty: (**elem).clone(),
                        is_pointer: false,
                    },
                );
                emit_body(self, out);
                out.dedent();
                out.line("}");
            }
            other => self.unsupported_shape(other, for_stmt.location),
        }
    }

    fn emit_map_iteration(
        &mut self,
        out: &mut FormatWriter,
        for_stmt: &ForStatement,
        map_expr: &Expression,
        pair_values: bool,
        emit_body: &mut dyn FnMut(&mut Self, &mut FormatWriter),
    ) {
        let map_ty = map_expr.ty().clone();
        let SemanticType::Dict(key_ty, value_ty) = &map_ty else {
            return self.unsupported_shape(&map_ty, for_stmt.location);
        };
        let Some(container) = self.container_type(&map_ty) else {
            return self.unsupported_shape(&map_ty, for_stmt.location);
        };

        let (key_name, value_name) = match &for_stmt.target {
            BindingTarget::Name(name) => (name.clone(), None),
            BindingTarget::Pair(k, v) if pair_values => (k.clone(), Some(v.clone())),
            BindingTarget::Pair(_, _) => {
                return self.error(
                    ErrorCode::GenerationFailure,
                    "pair targets require iterating .items()".to_string(),
                    for_stmt.location,
                );
            }
        };

        let keys_container = if matches!(key_ty.as_ref(), SemanticType::Str) {
            "vec_str"
        } else {
            "vec_int"
        };
        self.context.require_runtime(keys_container);
        let Some(key_c_ty) = self.c_type(key_ty, for_stmt.location) else {
            return;
        };

        let keys = self.fresh_tmp("mgen_keys_");
        let idx = self.fresh_tmp("mgen_i_");
        let obj = self.receiver_ref(map_expr);

        out.line(format!("{} {} = {}_keys({});", keys_container, keys, container, obj));
        // Track the key list so a return inside the body still drops it
        let keys_ty = if matches!(key_ty.as_ref(), SemanticType::Str) {
            SemanticType::List(Box::new(SemanticType::Str))
        } else {
            SemanticType::List(Box::new(SemanticType::Int))
        };
        self.register_local(&keys, &keys_ty);
        out.line(format!(
            "for (size_t {idx} = 0; {idx} < {keys_container}_size(&{keys}); {idx}++) {{"
        ));
        out.indent();
        out.line(format!(
            "{} {} = *{}_at(&{}, (long long){});",
            key_c_ty,
            self.naming.escape(&key_name),
            keys_container,
            keys,
            idx
        ));
        self.locals.insert(
            key_name.clone(),
            LocalInfo {
                ty: (**key_ty).clone(),
                is_pointer: false,
            },
        );
        if let Some(value_name) = &value_name {
            let Some(value_c_ty) = self.c_type(value_ty, for_stmt.location) else {
                return;
            };
            out.line(format!(
                "{} {} = {}_get({}, {});",
                value_c_ty,
                self.naming.escape(value_name),
                container,
                obj,
                self.naming.escape(&key_name)
            ));
            self.locals.insert(
                value_name.clone(),
                LocalInfo {
                    ty: (**value_ty).clone(),
                    is_pointer: false,
                },
            );
        }
        emit_body(self, out);
        out.dedent();
        out.line("}");
        out.line(format!("{}_drop(&{});", keys_container, keys));
        // Already released on the fall-through path
        for scope in &mut self.drop_scopes {
            scope.retain(|name| name != &keys);
        }
    }

    // ----- returns -----

    fn emit_return(
        &mut self,
        out: &mut FormatWriter,
        value: Option<&Expression>,
        _location: SourceLocation,
    ) {
        match value {
            None => {
                self.emit_scope_drops(out, None);
                out.line("return;");
            }
            Some(Expression::Literal(lit)) if lit.value == LiteralValue::None => {
                self.emit_scope_drops(out, None);
                out.line("return;");
            }
            Some(expr) => {
                let keep = match expr {
                    Expression::Variable(var) => Some(var.name.clone()),
                    _ => None,
                };
                let text = self.return_value_text(expr);
                let has_live_containers = self.drop_scopes.iter().any(|s| !s.is_empty());
                if keep.is_none() && has_live_containers {
                    // The value may read a container about to be
                    // released; compute it first
                    let ret_ty = expr.ty().clone();
                    let tmp = self.fresh_tmp("mgen_ret_");
                    match self.c_type(&ret_ty, expr.location()) {
                        Some(c_ty) => {
                            out.line(format!("{} {} = {};", c_ty, tmp, text));
                            self.emit_scope_drops(out, None);
                            out.line(format!("return {};", tmp));
                        }
                        None => {
                            self.emit_scope_drops(out, None);
                            out.line(format!("return {};", text));
                        }
                    }
                } else {
                    self.emit_scope_drops(out, keep.as_deref());
                    out.line(format!("return {};", text));
                }
            }
        }
    }

    /// The text of a returned expression, dereferencing pointer params
    /// returned by value
    fn return_value_text(&mut self, expr: &Expression) -> String {
        if let Expression::Variable(var) = expr {
            if let Some(info) = self.locals.get(&var.name) {
                if info.is_pointer {
                    return format!("*{}", self.naming.escape(&var.name));
                }
            }
        }
        self.expr_or_error(expr)
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

    /// The `&`-qualified receiver of a container operation
    fn receiver_ref(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::Variable(var) => match self.locals.get(&var.name) {
                Some(info) if info.is_pointer => self.naming.escape(&var.name),
                _ => format!("&{}", self.naming.escape(&var.name)),
            },
            other => {
                // The attribute case already spells `->` for pointer bases
                let text = self.expr_or_error(other);
                format!("&{}", text)
            }
        }
    }

    fn emit_expression(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Int(value) => format!("{}", value),
                LiteralValue::Float(value) => format_float(*value),
                LiteralValue::Bool(value) => if *value { "true" } else { "false" }.to_string(),
                LiteralValue::Str(value) => c_string_literal(value),
                LiteralValue::None => "0".to_string(),
            }),
            Expression::Variable(var) => {
                let escaped = self.naming.escape(&var.name);
                match self.locals.get(&var.name) {
                    Some(info) if info.is_pointer && !matches!(info.ty, SemanticType::Object(_)) => {
                        Ok(format!("*{}", escaped))
                    }
                    _ => Ok(escaped),
                }
            }
            Expression::Binary(bin) => self.emit_binary(bin),
            Expression::Unary(unary) => {
                let operand = self.emit_expression(&unary.operand)?;
                Ok(match unary.operator {
                    UnaryOperator::Negate => format!("(-{})", operand),
                    UnaryOperator::Not => format!("(!{})", operand),
                    UnaryOperator::Invert => format!("(~{})", operand),
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
            Expression::Comparison(cmp) => self.emit_comparison(cmp),
            Expression::Call(call) => self.emit_call(call),
            Expression::Attribute(attr) => {
                let object = self.emit_expression(&attr.object)?;
                let accessor = match attr.object.as_ref() {
                    Expression::Variable(var)
                        if self.locals.get(&var.name).is_some_and(|i| i.is_pointer) =>
                    {
                        format!("{}->{}", self.naming.escape(&var.name), self.naming.escape(&attr.name))
                    }
                    _ => format!("{}.{}", object, self.naming.escape(&attr.name)),
                };
                Ok(accessor)
            }
            Expression::Subscript(sub) => self.emit_subscript(sub),
            Expression::TupleDisplay(tuple) => Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                "the c target cannot represent tuple values".to_string(),
                tuple.location,
            )),
            Expression::ListDisplay(_)
            | Expression::DictDisplay(_)
            | Expression::SetDisplay(_)
            | Expression::ListComp(_)
            | Expression::SetComp(_)
            | Expression::DictComp(_) => Err(TranslateError::with_suggestion(
                ErrorCode::GenerationFailure,
                "container displays are only supported as initializers in the c target"
                    .to_string(),
                expr.location(),
                "bind the container to a local first".to_string(),
            )),
        }
    }

    fn emit_binary(&mut self, bin: &mgen_ir::ast::BinaryExpr) -> Result<String, TranslateError> {
        let left_ty = bin.left.ty().clone();
        let left = self.emit_expression(&bin.left)?;
        let right = self.emit_expression(&bin.right)?;
        let ints = matches!(bin.ty, SemanticType::Int);

        Ok(match bin.operator {
            BinaryOperator::Add if matches!(left_ty, SemanticType::Str) => {
                format!("mgen_str_concat({}, {})", left, right)
            }
            BinaryOperator::Divide => format!("((double){} / (double){})", left, right),
            BinaryOperator::FloorDivide if ints => {
                self.helpers.floordiv = true;
                format!("mgen_floordiv_i64({}, {})", left, right)
            }
            BinaryOperator::FloorDivide => {
                self.helpers.math = true;
                format!("floor({} / {})", left, right)
            }
            BinaryOperator::Modulo if ints => {
                self.helpers.floormod = true;
                format!("mgen_floormod_i64({}, {})", left, right)
            }
            BinaryOperator::Modulo => {
                self.helpers.math = true;
                format!("fmod({}, {})", left, right)
            }
            BinaryOperator::Power if ints => {
                self.helpers.int_pow = true;
                format!("mgen_pow_i64({}, {})", left, right)
            }
            BinaryOperator::Power => {
                self.helpers.math = true;
                format!("pow({}, {})", left, right)
            }
            op => format!("({} {} {})", left, op, right),
        })
    }

    fn emit_comparison(
        &mut self,
        cmp: &mgen_ir::ast::ComparisonExpr,
    ) -> Result<String, TranslateError> {
        let left_ty = cmp.left.ty().clone();
        let right_ty = cmp.right.ty().clone();

        if matches!(cmp.operator, CompareOperator::In | CompareOperator::NotIn) {
            let text = self.emit_membership(cmp, &right_ty)?;
            return Ok(if cmp.operator == CompareOperator::NotIn {
                format!("(!{})", text)
            } else {
                text
            });
        }

        let left = self.emit_expression(&cmp.left)?;
        let right = self.emit_expression(&cmp.right)?;

        if matches!(left_ty, SemanticType::Str) && matches!(right_ty, SemanticType::Str) {
            return Ok(match cmp.operator {
                CompareOperator::Equal => format!("mgen_str_eq({}, {})", left, right),
                CompareOperator::NotEqual => format!("(!mgen_str_eq({}, {}))", left, right),
                CompareOperator::Less => format!("(strcmp({}, {}) < 0)", left, right),
                CompareOperator::LessEqual => format!("(strcmp({}, {}) <= 0)", left, right),
                CompareOperator::Greater => format!("(strcmp({}, {}) > 0)", left, right),
                CompareOperator::GreaterEqual => format!("(strcmp({}, {}) >= 0)", left, right),
                _ => unreachable!("membership handled above"),
            });
        }

        Ok(format!("({} {} {})", left, cmp.operator, right))
    }

    fn emit_membership(
        &mut self,
        cmp: &mgen_ir::ast::ComparisonExpr,
        right_ty: &SemanticType,
    ) -> Result<String, TranslateError> {
        let needle = self.emit_expression(&cmp.left)?;
        match right_ty {
            SemanticType::Dict(_, _) => {
                let container = self.container_type(right_ty).ok_or_else(|| {
                    TranslateError::new(
                        ErrorCode::UnsupportedFeature,
                        format!("the c target cannot represent the type '{}'", right_ty),
                        cmp.location,
                    )
                })?;
                let obj = self.receiver_ref(&cmp.right);
                Ok(format!("{}_contains({}, {})", container, obj, needle))
            }
            SemanticType::Set(_) => {
                let container = self.container_type(right_ty).ok_or_else(|| {
                    TranslateError::new(
                        ErrorCode::UnsupportedFeature,
                        format!("the c target cannot represent the type '{}'", right_ty),
                        cmp.location,
                    )
                })?;
                let obj = self.receiver_ref(&cmp.right);
                Ok(format!("{}_contains({}, {})", container, obj, needle))
            }
            SemanticType::List(elem) => {
                let helper = match elem.as_ref() {
                    SemanticType::Int | SemanticType::Bool => {
                        self.helpers.vec_int_contains = true;
                        "mgen_vec_int_contains"
                    }
                    SemanticType::Float => {
                        self.helpers.vec_double_contains = true;
                        "mgen_vec_double_contains"
                    }
                    SemanticType::Str => {
                        self.helpers.vec_str_contains = true;
                        "mgen_vec_str_contains"
                    }
                    other => {
                        return Err(TranslateError::new(
                            ErrorCode::UnsupportedFeature,
                            format!("the c target cannot search a list of '{}'", other),
                            cmp.location,
                        ));
                    }
                };
                let obj = self.receiver_ref(&cmp.right);
                Ok(format!("{}({}, {})", helper, obj, needle))
            }
            SemanticType::Str => {
                let haystack = self.emit_expression(&cmp.right)?;
                Ok(format!("(strstr({}, {}) != NULL)", haystack, needle))
            }
            other => Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                format!("membership tests on '{}' are not supported", other),
                cmp.location,
            )),
        }
    }

    fn emit_subscript(
        &mut self,
        sub: &mgen_ir::ast::SubscriptExpr,
    ) -> Result<String, TranslateError> {
        let object_ty = sub.object.ty().clone();
        let index = self.emit_expression(&sub.index)?;
        match &object_ty {
            SemanticType::List(_) => {
                let container = self.container_type(&object_ty).ok_or_else(|| {
                    TranslateError::new(
                        ErrorCode::UnsupportedFeature,
                        format!("the c target cannot represent the type '{}'", object_ty),
                        sub.location,
                    )
                })?;
                let obj = self.receiver_ref(&sub.object);
                Ok(format!("(*{}_at({}, {}))", container, obj, index))
            }
            SemanticType::Dict(_, _) => {
                let container = self.container_type(&object_ty).ok_or_else(|| {
                    TranslateError::new(
                        ErrorCode::UnsupportedFeature,
                        format!("the c target cannot represent the type '{}'", object_ty),
                        sub.location,
                    )
                })?;
                let obj = self.receiver_ref(&sub.object);
                Ok(format!("{}_get({}, {})", container, obj, index))
            }
            other => Err(TranslateError::new(
                ErrorCode::UnsupportedMethod,
                format!("subscripting '{}' is not supported by the c target", other),
                sub.location,
            )),
        }
    }

    /// Expression statements: mostly method calls routed through the
    /// container-operation strategies
    fn emit_expression_statement(&mut self, expr: &Expression) -> Option<String> {
        match expr {
            Expression::Call(_) => {
                let text = self.expr_or_error(expr);
                Some(format!("{};", text))
            }
            _ => {
                let text = self.expr_or_error(expr);
                Some(format!("(void)({});", text))
            }
        }
    }

    fn emit_call(&mut self, call: &mgen_ir::ast::CallExpr) -> Result<String, TranslateError> {
        // Method calls
        if let Some((receiver, method)) = call.method_parts() {
            let receiver_ty = receiver.ty().clone();
            if receiver_ty.container_kind().is_some() {
                return self.emit_container_method(call, &receiver_ty, method);
            }
            if let SemanticType::Object(class) = &receiver_ty {
                let class = class.clone();
                let obj = self.receiver_ref(receiver);
                let mut args = vec![obj];
                for arg in &call.arguments {
                    args.push(self.emit_method_argument(&class, method, arg)?);
                }
                return Ok(format!("{}_{}({})", class, method, args.join(", ")));
            }
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                format!("method call on unsupported receiver type '{}'", receiver_ty),
                call.location,
            ));
        }

        let Some(name) = call.callee_name() else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "unsupported call target".to_string(),
                call.location,
            ));
        };

        // Builtins
        match name {
            "print" => return self.emit_print(call),
            "len" => return self.emit_len(call),
            "abs" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Float => {
                        self.helpers.math = true;
                        format!("fabs({})", arg)
                    }
                    _ => format!("llabs({})", arg),
                });
            }
            "min" | "max" | "sum" => return self.emit_reduction(call, name),
            "str" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Float => format!("mgen_str_of_double({})", arg),
                    SemanticType::Str => format!("mgen_strdup({})", arg),
                    SemanticType::Bool => format!("mgen_strdup({} ? \"True\" : \"False\")", arg),
                    _ => format!("mgen_str_of_int({})", arg),
                });
            }
            "int" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => format!("atoll({})", arg),
                    _ => format!("((long long)({}))", arg),
                });
            }
            "float" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => format!("atof({})", arg),
                    _ => format!("((double)({}))", arg),
                });
            }
            "bool" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(format!("(({}) != 0)", arg));
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
            let mut args = Vec::new();
            let ctor_params: Vec<SemanticType> = self
                .context
                .class_info(name)
                .and_then(|info| info.methods.get("__init__"))
                .map(|sig| sig.params.iter().map(|(_, ty)| ty.clone()).collect())
                .unwrap_or_default();
            for (i, arg) in call.arguments.iter().enumerate() {
                let expects_pointer = ctor_params
                    .get(i)
                    .is_some_and(|ty| self.passes_by_pointer(ty));
                args.push(self.emit_argument(arg, expects_pointer)?);
            }
            return Ok(format!("{}_new({})", name, args.join(", ")));
        }

        // User function call
        let param_tys: Vec<SemanticType> = self
            .context
            .function_signature(name)
            .map(|sig| sig.params.iter().map(|(_, ty)| ty.clone()).collect())
            .unwrap_or_default();
        let mut args = Vec::new();
        for (i, arg) in call.arguments.iter().enumerate() {
            let expects_pointer = param_tys
                .get(i)
                .is_some_and(|ty| self.passes_by_pointer(ty));
            args.push(self.emit_argument(arg, expects_pointer)?);
        }
        Ok(format!(
            "{}({})",
            self.function_name(name, None),
            args.join(", ")
        ))
    }

    fn emit_method_argument(
        &mut self,
        class: &str,
        method: &str,
        arg: &Expression,
    ) -> Result<String, TranslateError> {
        let expects_pointer = self
            .context
            .class_info(class)
            .and_then(|info| info.methods.get(method))
            .map(|sig| sig.params.clone())
            .unwrap_or_default()
            .first()
            .is_some_and(|(_, ty)| self.passes_by_pointer(ty));
        self.emit_argument(arg, expects_pointer)
    }

    fn emit_argument(
        &mut self,
        arg: &Expression,
        expects_pointer: bool,
    ) -> Result<String, TranslateError> {
        if expects_pointer {
            Ok(self.receiver_ref(arg))
        } else {
            self.emit_expression(arg)
        }
    }

    /// Container-operation strategy dispatch: first on the container
    /// kind, then on the method name
    fn emit_container_method(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        receiver_ty: &SemanticType,
        method: &str,
    ) -> Result<String, TranslateError> {
        let (receiver, _) = call.method_parts().expect("caller matched a method call");

        if matches!(receiver_ty, SemanticType::Str) {
            return self.emit_str_method(call, method);
        }

        let container = self.container_type(receiver_ty).ok_or_else(|| {
            TranslateError::new(
                ErrorCode::UnsupportedFeature,
                format!("the c target cannot represent the type '{}'", receiver_ty),
                call.location,
            )
        })?;
        self.context.require_runtime(&container);
        let obj = self.receiver_ref(receiver);

        let arg = |emitter: &mut Self, i: usize| -> Result<String, TranslateError> {
            emitter.emit_expression(&call.arguments[i])
        };

        match (receiver_ty, method) {
            (SemanticType::List(elem), "append") => {
                let mut value = arg(self, 0)?;
                if matches!(elem.as_ref(), SemanticType::Str) {
                    value = self.owned_string_value(&call.arguments[0], value, receiver_ty);
                }
                Ok(format!("{}_push({}, {})", container, obj, value))
            }
            (SemanticType::List(_), "pop") => Ok(format!("{}_pop({})", container, obj)),
            (SemanticType::List(_), "clear") => Ok(format!("{}_clear({})", container, obj)),
            (SemanticType::Dict(_, _), "get") => {
                let key = arg(self, 0)?;
                Ok(format!("{}_get({}, {})", container, obj, key))
            }
            (SemanticType::Dict(_, _), "pop") | (SemanticType::Dict(_, _), "erase") => {
                let key = arg(self, 0)?;
                Ok(format!("{}_erase({}, {})", container, obj, key))
            }
            (SemanticType::Dict(_, _), "clear") => Ok(format!("{}_clear({})", container, obj)),
            (SemanticType::Set(_), "add") => {
                let value = arg(self, 0)?;
                Ok(format!("{}_insert({}, {})", container, obj, value))
            }
            (SemanticType::Set(_), "remove") | (SemanticType::Set(_), "discard") => {
                let value = arg(self, 0)?;
                Ok(format!("{}_erase({}, {})", container, obj, value))
            }
            (SemanticType::Set(_), "clear") => Ok(format!("{}_clear({})", container, obj)),
            _ => Err(TranslateError::with_suggestion(
                ErrorCode::UnsupportedMethod,
                format!(
                    "method '{}' on '{}' is not implemented for the c target",
                    method, receiver_ty
                ),
                call.location,
                "rewrite the operation with supported primitives".to_string(),
            )),
        }
    }

    fn emit_str_method(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        method: &str,
    ) -> Result<String, TranslateError> {
        let (receiver, _) = call.method_parts().expect("caller matched a method call");
        let recv = self.emit_expression(receiver)?;
        let arg = |emitter: &mut Self, i: usize| -> Result<String, TranslateError> {
            emitter.emit_expression(&call.arguments[i])
        };

        match method {
            "upper" => Ok(format!("mgen_str_upper({})", recv)),
            "lower" => Ok(format!("mgen_str_lower({})", recv)),
            "strip" => Ok(format!("mgen_str_strip({})", recv)),
            "find" => {
                let needle = arg(self, 0)?;
                Ok(format!("mgen_str_find({}, {})", recv, needle))
            }
            "replace" => {
                let from = arg(self, 0)?;
                let to = arg(self, 1)?;
                Ok(format!("mgen_str_replace({}, {}, {})", recv, from, to))
            }
            "startswith" => {
                let prefix = arg(self, 0)?;
                Ok(format!("mgen_str_startswith({}, {})", recv, prefix))
            }
            "endswith" => {
                let suffix = arg(self, 0)?;
                Ok(format!("mgen_str_endswith({}, {})", recv, suffix))
            }
            "split" => {
                self.context.require_runtime("vec_str");
                let delim = arg(self, 0)?;
                Ok(format!("mgen_str_split({}, {})", recv, delim))
            }
            "join" => {
                self.context.require_runtime("vec_str");
                let parts = self.receiver_ref(&call.arguments[0]);
                Ok(format!("mgen_str_join({}, {})", recv, parts))
            }
            _ => Err(TranslateError::new(
                ErrorCode::UnsupportedMethod,
                format!("string method '{}' is not implemented for the c target", method),
                call.location,
            )),
        }
    }

    fn emit_print(&mut self, call: &mgen_ir::ast::CallExpr) -> Result<String, TranslateError> {
        let mut format = String::new();
        let mut args = Vec::new();
        for (i, arg) in call.arguments.iter().enumerate() {
            if i > 0 {
                format.push(' ');
            }
            match arg.ty() {
                SemanticType::Int => {
                    format.push_str("%lld");
                    args.push(self.emit_expression(arg)?);
                }
                SemanticType::Float => {
                    format.push_str("%g");
                    args.push(self.emit_expression(arg)?);
                }
                SemanticType::Bool => {
                    format.push_str("%s");
                    let text = self.emit_expression(arg)?;
                    args.push(format!("({}) ? \"True\" : \"False\"", text));
                }
                SemanticType::Str => {
                    format.push_str("%s");
                    args.push(self.emit_expression(arg)?);
                }
                other => {
                    return Err(TranslateError::new(
                        ErrorCode::UnsupportedMethod,
                        format!("print() cannot format a value of type '{}'", other),
                        arg.location(),
                    ));
                }
            }
        }
        format.push_str("\\n");
        if args.is_empty() {
            Ok(format!("printf(\"{}\")", format))
        } else {
            Ok(format!("printf(\"{}\", {})", format, args.join(", ")))
        }
    }

    fn emit_len(&mut self, call: &mgen_ir::ast::CallExpr) -> Result<String, TranslateError> {
        let arg = &call.arguments[0];
        let ty = arg.ty().clone();
        match &ty {
            SemanticType::Str => {
                let text = self.emit_expression(arg)?;
                Ok(format!("mgen_str_len({})", text))
            }
            _ => {
                let container = self.container_type(&ty).ok_or_else(|| {
                    TranslateError::new(
                        ErrorCode::UnsupportedFeature,
                        format!("len() on '{}' is not supported by the c target", ty),
                        call.location,
                    )
                })?;
                let obj = self.receiver_ref(arg);
                Ok(format!("((long long){}_size({}))", container, obj))
            }
        }
    }

    fn emit_reduction(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        name: &str,
    ) -> Result<String, TranslateError> {
        if call.arguments.len() == 2 && name != "sum" {
            let a = self.emit_expression(&call.arguments[0])?;
            let b = self.emit_expression(&call.arguments[1])?;
            let op = if name == "min" { "<" } else { ">" };
            return Ok(format!("(({}) {} ({}) ? ({}) : ({}))", a, op, b, a, b));
        }
        let arg = &call.arguments[0];
        let ty = arg.ty().clone();
        let helper = match (&ty, name) {
            (SemanticType::List(elem), "sum") if matches!(elem.as_ref(), SemanticType::Int) => {
                self.helpers.sum_vec_int = true;
                "mgen_sum_vec_int"
            }
            (SemanticType::List(elem), "sum") if matches!(elem.as_ref(), SemanticType::Float) => {
                self.helpers.sum_vec_double = true;
                "mgen_sum_vec_double"
            }
            (SemanticType::List(elem), _) if matches!(elem.as_ref(), SemanticType::Int) => {
                self.helpers.minmax_vec_int = true;
                if name == "min" {
                    "mgen_min_vec_int"
                } else {
                    "mgen_max_vec_int"
                }
            }
            (SemanticType::List(elem), _) if matches!(elem.as_ref(), SemanticType::Float) => {
                self.helpers.minmax_vec_double = true;
                if name == "min" {
                    "mgen_min_vec_double"
                } else {
                    "mgen_max_vec_double"
                }
            }
            _ => {
                return Err(TranslateError::new(
                    ErrorCode::UnsupportedMethod,
                    format!("{}() on '{}' is not supported by the c target", name, ty),
                    call.location,
                ));
            }
        };
        let obj = self.receiver_ref(arg);
        Ok(format!("{}({})", helper, obj))
    }
}

/// Formats a float so it always reads back as a float
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Escapes a string into a C string literal
fn c_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
