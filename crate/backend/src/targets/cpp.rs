//! C++ converter
//!
//! Emits C++17 over the standard containers. RAII covers the container
//! lifecycle, so no explicit drops are emitted. Mutability classes pick
//! `const T&` versus `T&` for container and object parameters. Ordered
//! containers (`std::map`, `std::set`) keep iteration deterministic.

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

pub struct CppConverter;

impl TargetConverter for CppConverter {
    fn target(&self) -> Target {
        Target::Cpp
    }

    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput> {
        let mut emitter = CppEmitter::new(context);
        let text = emitter.emit_module(module);
        if emitter.errors.is_empty() {
            Ok(GeneratedOutput::single(format!("{}.cpp", stem), text))
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
    str_helpers: bool,
    split_join: bool,
    algorithm: bool,
    cmath: bool,
}

struct CppEmitter<'a> {
    context: &'a mut CompilationContext,
    naming: NamingPolicy,
    errors: Vec<TranslateError>,
    declared: HashSet<String>,
    helpers: HelperFlags,
}

impl<'a> CppEmitter<'a> {
    fn new(context: &'a mut CompilationContext) -> Self {
        CppEmitter {
            context,
            naming: NamingPolicy::for_target(Target::Cpp),
            errors: Vec::new(),
            declared: HashSet::new(),
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
                Declaration::Class(class) => self.emit_class(&mut body, class),
                Declaration::Function(func) => self.emit_function(&mut body, func, None),
                _ => {}
            }
        }

        if module.function("main").is_some() {
            body.line("int main() {");
            body.indent();
            match module.function("main").map(|f| &f.return_type) {
                Some(SemanticType::Int) => {
                    body.line("return static_cast<int>(mgen_user_main());")
                }
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
        out.line("#include <cstdint>");
        out.line("#include <iostream>");
        out.line("#include <map>");
        out.line("#include <set>");
        out.line("#include <string>");
        out.line("#include <vector>");
        if self.helpers.algorithm || self.helpers.str_helpers {
            out.line("#include <algorithm>");
            out.line("#include <numeric>");
        }
        if self.helpers.str_helpers {
            out.line("#include <cctype>");
        }
        if self.helpers.cmath {
            out.line("#include <cmath>");
        }
        out.blank();

        self.emit_helper_functions(out);
        self.emit_class_declarations(out, module);
        self.emit_prototypes(out, module);
        self.emit_globals(out, module);
    }

    fn emit_helper_functions(&self, out: &mut FormatWriter) {
        if self.helpers.floordiv {
            out.line("static int64_t mgen_floordiv(int64_t a, int64_t b) {");
            out.indent();
            out.line("int64_t q = a / b;");
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
            out.line("static int64_t mgen_floormod(int64_t a, int64_t b) {");
            out.indent();
            out.line("int64_t r = a % b;");
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
            out.line("static int64_t mgen_pow(int64_t base, int64_t exp) {");
            out.indent();
            out.line("int64_t result = 1;");
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
        if self.helpers.str_helpers {
            out.line("static std::string mgen_upper(std::string s) {");
            out.indent();
            out.line("std::transform(s.begin(), s.end(), s.begin(), [](unsigned char c) { return std::toupper(c); });");
            out.line("return s;");
            out.dedent();
            out.line("}");
            out.blank();
            out.line("static std::string mgen_lower(std::string s) {");
            out.indent();
            out.line("std::transform(s.begin(), s.end(), s.begin(), [](unsigned char c) { return std::tolower(c); });");
            out.line("return s;");
            out.dedent();
            out.line("}");
            out.blank();
            out.line("static std::string mgen_strip(const std::string& s) {");
            out.indent();
            out.line("size_t start = s.find_first_not_of(\" \\t\\n\\r\\f\\v\");");
            out.line("if (start == std::string::npos) {");
            out.indent();
            out.line("return \"\";");
            out.dedent();
            out.line("}");
            out.line("size_t end = s.find_last_not_of(\" \\t\\n\\r\\f\\v\");");
            out.line("return s.substr(start, end - start + 1);");
            out.dedent();
            out.line("}");
            out.blank();
            out.line("static std::string mgen_replace(std::string s, const std::string& from, const std::string& to) {");
            out.indent();
            out.line("if (from.empty()) {");
            out.indent();
            out.line("return s;");
            out.dedent();
            out.line("}");
            out.line("size_t pos = 0;");
            out.line("while ((pos = s.find(from, pos)) != std::string::npos) {");
            out.indent();
            out.line("s.replace(pos, from.size(), to);");
            out.line("pos += to.size();");
            out.dedent();
            out.line("}");
            out.line("return s;");
            out.dedent();
            out.line("}");
            out.blank();
        }
        if self.helpers.split_join {
            out.line("static std::vector<std::string> mgen_split(const std::string& s, const std::string& delim) {");
            out.indent();
            out.line("std::vector<std::string> parts;");
            out.line("if (delim.empty()) {");
            out.indent();
            out.line("parts.push_back(s);");
            out.line("return parts;");
            out.dedent();
            out.line("}");
            out.line("size_t start = 0;");
            out.line("size_t pos;");
            out.line("while ((pos = s.find(delim, start)) != std::string::npos) {");
            out.indent();
            out.line("parts.push_back(s.substr(start, pos - start));");
            out.line("start = pos + delim.size();");
            out.dedent();
            out.line("}");
            out.line("parts.push_back(s.substr(start));");
            out.line("return parts;");
            out.dedent();
            out.line("}");
            out.blank();
            out.line("static std::string mgen_join(const std::string& sep, const std::vector<std::string>& parts) {");
            out.indent();
            out.line("std::string out;");
            out.line("for (size_t i = 0; i < parts.size(); i++) {");
            out.indent();
            out.line("if (i > 0) {");
            out.indent();
            out.line("out += sep;");
            out.dedent();
            out.line("}");
            out.line("out += parts[i];");
            out.dedent();
            out.line("}");
            out.line("return out;");
            out.dedent();
            out.line("}");
            out.blank();
        }
    }

    fn emit_class_declarations(&mut self, out: &mut FormatWriter, module: &Module) {
        for decl in &module.declarations {
            let Declaration::Class(class) = decl else {
                continue;
            };
            let fields = self
                .context
                .class_info(&class.name)
                .map(|info| info.fields.clone())
                .unwrap_or_default();
            out.line(format!("struct {} {{", class.name));
            out.indent();
            for (name, ty) in &fields {
                if let Some(cpp_ty) = self.cpp_type(ty, class.location) {
                    out.line(format!("{} {};", cpp_ty, self.naming.escape(name)));
                }
            }
            out.blank();
            for method in &class.methods {
                let signature = self.method_signature(method, class);
                out.line(format!("{};", signature));
            }
            out.dedent();
            out.line("};");
            out.blank();
        }
    }

    fn emit_prototypes(&mut self, out: &mut FormatWriter, module: &Module) {
        let mut any = false;
        for decl in &module.declarations {
            if let Declaration::Function(func) = decl {
                let signature = self.function_signature(func, None);
                out.line(format!("{};", signature));
                any = true;
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
            if let Some(cpp_ty) = self.cpp_type(&var.annotation, var.location) {
                let value = self.expr_or_error(&var.value);
                out.line(format!(
                    "static {} {} = {};",
                    cpp_ty,
                    self.naming.escape(&var.name),
                    value
                ));
                any = true;
            }
        }
        if any {
            out.blank();
        }
    }

    // ----- types -----

    fn cpp_type(&mut self, ty: &SemanticType, location: SourceLocation) -> Option<String> {
        let mapped = match ty {
            SemanticType::Int => "int64_t".to_string(),
            SemanticType::Float => "double".to_string(),
            SemanticType::Bool => "bool".to_string(),
            SemanticType::Str => "std::string".to_string(),
            SemanticType::Void => "void".to_string(),
            SemanticType::Object(name) => name.clone(),
            SemanticType::List(elem) => {
                format!("std::vector<{}>", self.cpp_type(elem, location)?)
            }
            SemanticType::Dict(key, value) => format!(
                "std::map<{}, {}>",
                self.cpp_type(key, location)?,
                self.cpp_type(value, location)?
            ),
            SemanticType::Set(elem) => format!("std::set<{}>", self.cpp_type(elem, location)?),
            other => {
                self.error(
                    ErrorCode::UnsupportedFeature,
                    format!("the cpp target cannot represent the type '{}'", other),
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

    // ----- functions -----

    fn function_name(&self, name: &str) -> String {
        if name == "main" {
            "mgen_user_main".to_string()
        } else {
            self.naming.escape(name)
        }
    }

    /// Parameter spelling: heavy types by reference, const unless the
    /// mutability analysis saw a mutation
    fn parameter_decl(&mut self, key: &str, param: &mgen_ir::ast::Parameter) -> Option<String> {
        let cpp_ty = self.cpp_type(&param.annotation, param.location)?;
        let name = self.naming.escape(&param.name);
        if self.is_heavy(&param.annotation) {
            let mutability = self.context.mutability(key, &param.name);
            if mutability == Mutability::Mutable {
                Some(format!("{}& {}", cpp_ty, name))
            } else {
                Some(format!("const {}& {}", cpp_ty, name))
            }
        } else {
            Some(format!("{} {}", cpp_ty, name))
        }
    }

    fn function_signature(&mut self, func: &FunctionDef, class: Option<&str>) -> String {
        let key = match class {
            Some(class) => format!("{}.{}", class, func.name),
            None => func.name.clone(),
        };
        let ret = self
            .cpp_type(&func.return_type, func.location)
            .unwrap_or_else(|| "void".to_string());
        let params: Vec<String> = func
            .value_parameters()
            .iter()
            .filter_map(|p| self.parameter_decl(&key, p))
            .collect();
        format!(
            "{} {}({})",
            ret,
            self.function_name(&func.name),
            params.join(", ")
        )
    }

    fn method_signature(&mut self, method: &FunctionDef, class: &ClassDef) -> String {
        let key = format!("{}.{}", class.name, method.name);
        if method.name == "__init__" {
            let params: Vec<String> = method
                .value_parameters()
                .iter()
                .filter_map(|p| self.parameter_decl(&key, p))
                .collect();
            return format!("{}({})", class.name, params.join(", "));
        }
        let ret = self
            .cpp_type(&method.return_type, method.location)
            .unwrap_or_else(|| "void".to_string());
        let params: Vec<String> = method
            .value_parameters()
            .iter()
            .filter_map(|p| self.parameter_decl(&key, p))
            .collect();
        let this_const = if self.context.mutability(&key, "self") == Mutability::Mutable {
            ""
        } else {
            " const"
        };
        format!(
            "{} {}({}){}",
            ret,
            self.naming.escape(&method.name),
            params.join(", "),
            this_const
        )
    }

    fn emit_class(&mut self, out: &mut FormatWriter, class: &ClassDef) {
        for method in &class.methods {
            self.emit_method(out, method, class);
        }
    }

    fn emit_method(&mut self, out: &mut FormatWriter, method: &FunctionDef, class: &ClassDef) {
        self.declared.clear();
        for param in &method.parameters {
            self.declared.insert(param.name.clone());
        }

        let key = format!("{}.{}", class.name, method.name);
        if method.name == "__init__" {
            let params: Vec<String> = method
                .value_parameters()
                .iter()
                .filter_map(|p| self.parameter_decl(&key, p))
                .collect();
            out.line(format!("{}::{}({}) {{", class.name, class.name, params.join(", ")));
        } else {
            let ret = self
                .cpp_type(&method.return_type, method.location)
                .unwrap_or_else(|| "void".to_string());
            let params: Vec<String> = method
                .value_parameters()
                .iter()
                .filter_map(|p| self.parameter_decl(&key, p))
                .collect();
            let this_const = if self.context.mutability(&key, "self") == Mutability::Mutable {
                ""
            } else {
                " const"
            };
            out.line(format!(
                "{} {}::{}({}){} {{",
                ret,
                class.name,
                self.naming.escape(&method.name),
                params.join(", "),
                this_const
            ));
        }
        out.indent();
        self.emit_block(out, &method.body);
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn emit_function(&mut self, out: &mut FormatWriter, func: &FunctionDef, class: Option<&str>) {
        self.declared.clear();
        for param in &func.parameters {
            self.declared.insert(param.name.clone());
        }

        let signature = self.function_signature(func, class);
        out.line(format!("{} {{", signature));
        out.indent();
        self.emit_block(out, &func.body);
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
                    if let Some(cpp_ty) = self.cpp_type(&ann.annotation, ann.location) {
                        out.line(format!("{} {}{{}};", cpp_ty, self.naming.escape(&var.name)));
                        self.declared.insert(var.name.clone());
                    }
                }
                (target, Some(value)) => {
                    let target_text = self.expr_or_error(target);
                    let value_text = self.expr_or_error(value);
                    out.line(format!("{} = {};", target_text, value_text));
                }
                _ => {}
            },
            Statement::Assign(assign) => match &assign.target {
                Expression::Variable(var) => {
                    let ty = assign.target.ty().clone();
                    self.emit_binding(out, &var.name, &ty, &assign.value, assign.location);
                }
                target => {
                    let target_text = self.expr_or_error(target);
                    let value_text = self.expr_or_error(&assign.value);
                    out.line(format!("{} = {};", target_text, value_text));
                }
            },
            Statement::AugAssign(aug) => {
                let ints = matches!(aug.target.ty(), SemanticType::Int);
                let target = self.expr_or_error(&aug.target);
                let value = self.expr_or_error(&aug.value);
                match aug.operator {
                    BinaryOperator::FloorDivide if ints => {
                        self.helpers.floordiv = true;
                        out.line(format!("{} = mgen_floordiv({}, {});", target, target, value));
                    }
                    BinaryOperator::FloorDivide => {
                        self.helpers.cmath = true;
                        out.line(format!("{} = std::floor({} / {});", target, target, value));
                    }
                    BinaryOperator::Modulo if ints => {
                        self.helpers.floormod = true;
                        out.line(format!("{} = mgen_floormod({}, {});", target, target, value));
                    }
                    BinaryOperator::Modulo => {
                        self.helpers.cmath = true;
                        out.line(format!("{} = std::fmod({}, {});", target, target, value));
                    }
                    BinaryOperator::Power if ints => {
                        self.helpers.int_pow = true;
                        out.line(format!("{} = mgen_pow({}, {});", target, target, value));
                    }
                    BinaryOperator::Power => {
                        self.helpers.cmath = true;
                        out.line(format!("{} = std::pow({}, {});", target, target, value));
                    }
                    BinaryOperator::Divide => {
                        out.line(format!(
                            "{} = static_cast<double>({}) / static_cast<double>({});",
                            target, target, value
                        ));
                    }
                    op => out.line(format!("{} {}= {};", target, op, value)),
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
                let header = match &while_stmt.condition {
                    Expression::Literal(lit) if lit.value == LiteralValue::Bool(true) => {
                        "while (true) {".to_string()
                    }
                    other => format!("while ({}) {{", self.expr_or_error(other)),
                };
                out.line(header);
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
                    let text = self.expr_or_error(value);
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
        let value_text = self.expr_or_error(value);
        if self.declared.contains(name) {
            out.line(format!("{} = {};", escaped, value_text));
        } else if let Some(cpp_ty) = self.cpp_type(ty, location) {
            out.line(format!("{} {} = {};", cpp_ty, escaped, value_text));
            self.declared.insert(name.to_string());
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
                    _ => format!("({} > 0) ? ({} < {}) : ({} > {})", step, var, stop, var, stop),
                };
                out.line(format!(
                    "for (int64_t {} = {}; {}; {} += {}) {{",
                    var, start, condition, var, step
                ));
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.dedent();
                out.line("}");
            }
            IterationSource::Container(iterable) => {
                // Dict pair iteration binds structured names
                if let Expression::Call(call) = iterable {
                    if let Some((receiver, "items")) = call.method_parts() {
                        if let BindingTarget::Pair(k, v) = &for_stmt.target {
                            let obj = self.expr_or_error(receiver);
                            out.line(format!(
                                "for (const auto& [{}, {}] : {}) {{",
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
                }

                let Some(var) = for_stmt.target.single_name() else {
                    return self.error(
                        ErrorCode::GenerationFailure,
                        "pair targets require iterating .items()".to_string(),
                        for_stmt.location,
                    );
                };
                let iter_text = match iterable {
                    Expression::Call(call) => match call.method_parts() {
                        Some((receiver, "keys")) => {
                            let obj = self.expr_or_error(receiver);
                            return self.emit_key_loop(out, &obj, var, &for_stmt.body);
                        }
                        _ => self.expr_or_error(iterable),
                    },
                    other if matches!(other.ty(), SemanticType::Dict(_, _)) => {
                        let obj = self.expr_or_error(other);
                        return self.emit_key_loop(out, &obj, var, &for_stmt.body);
                    }
                    other => self.expr_or_error(other),
                };
                out.line(format!(
                    "for (const auto& {} : {}) {{",
                    self.naming.escape(var),
                    iter_text
                ));
                out.indent();
                self.emit_block(out, &for_stmt.body);
                out.dedent();
                out.line("}");
            }
        }
    }

    fn emit_key_loop(&mut self, out: &mut FormatWriter, obj: &str, var: &str, body: &[Statement]) {
        out.line(format!(
            "for (const auto& [{}, {}_value_] : {}) {{",
            self.naming.escape(var),
            self.naming.escape(var),
            obj
        ));
        out.indent();
        out.line(format!("(void){}_value_;", self.naming.escape(var)));
        self.emit_block(out, body);
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

    fn emit_expression(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Int(value) => format!("{}", value),
                LiteralValue::Float(value) => format_float(*value),
                LiteralValue::Bool(value) => if *value { "true" } else { "false" }.to_string(),
                LiteralValue::Str(value) => format!("std::string({})", cpp_string_literal(value)),
                LiteralValue::None => "0".to_string(),
            }),
            Expression::Variable(var) => {
                if var.name == "self" {
                    return Ok("(*this)".to_string());
                }
                Ok(self.naming.escape(&var.name))
            }
            Expression::Binary(bin) => {
                let ints = matches!(bin.ty, SemanticType::Int);
                let left = self.emit_expression(&bin.left)?;
                let right = self.emit_expression(&bin.right)?;
                Ok(match bin.operator {
                    BinaryOperator::Divide => format!(
                        "(static_cast<double>({}) / static_cast<double>({}))",
                        left, right
                    ),
                    BinaryOperator::FloorDivide if ints => {
                        self.helpers.floordiv = true;
                        format!("mgen_floordiv({}, {})", left, right)
                    }
                    BinaryOperator::FloorDivide => {
                        self.helpers.cmath = true;
                        format!("std::floor({} / {})", left, right)
                    }
                    BinaryOperator::Modulo if ints => {
                        self.helpers.floormod = true;
                        format!("mgen_floormod({}, {})", left, right)
                    }
                    BinaryOperator::Modulo => {
                        self.helpers.cmath = true;
                        format!("std::fmod({}, {})", left, right)
                    }
                    BinaryOperator::Power if ints => {
                        self.helpers.int_pow = true;
                        format!("mgen_pow({}, {})", left, right)
                    }
                    BinaryOperator::Power => {
                        self.helpers.cmath = true;
                        format!("std::pow({}, {})", left, right)
                    }
                    op => format!("({} {} {})", left, op, right),
                })
            }
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
                if matches!(attr.object.as_ref(), Expression::Variable(var) if var.name == "self")
                {
                    return Ok(format!("this->{}", self.naming.escape(&attr.name)));
                }
                let object = self.emit_expression(&attr.object)?;
                Ok(format!("{}.{}", object, self.naming.escape(&attr.name)))
            }
            Expression::Subscript(sub) => {
                let object = self.emit_expression(&sub.object)?;
                let index = self.emit_expression(&sub.index)?;
                match sub.object.ty() {
                    SemanticType::Dict(_, _) => Ok(format!("{}[{}]", object, index)),
                    SemanticType::Str => Ok(format!("std::string(1, {}[{}])", object, index)),
                    _ => Ok(format!("{}.at({})", object, index)),
                }
            }
            Expression::ListDisplay(list) => {
                let cpp_ty = self
                    .cpp_type(&list.ty, list.location)
                    .unwrap_or_else(|| "std::vector<int64_t>".to_string());
                let elems: Result<Vec<String>, TranslateError> =
                    list.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("{}{{{}}}", cpp_ty, elems?.join(", ")))
            }
            Expression::SetDisplay(set) => {
                let cpp_ty = self
                    .cpp_type(&set.ty, set.location)
                    .unwrap_or_else(|| "std::set<int64_t>".to_string());
                let elems: Result<Vec<String>, TranslateError> =
                    set.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("{}{{{}}}", cpp_ty, elems?.join(", ")))
            }
            Expression::DictDisplay(dict) => {
                let cpp_ty = self
                    .cpp_type(&dict.ty, dict.location)
                    .unwrap_or_else(|| "std::map<std::string, int64_t>".to_string());
                let mut pairs = Vec::new();
                for (key, value) in dict.keys.iter().zip(&dict.values) {
                    pairs.push(format!(
                        "{{{}, {}}}",
                        self.emit_expression(key)?,
                        self.emit_expression(value)?
                    ));
                }
                Ok(format!("{}{{{}}}", cpp_ty, pairs.join(", ")))
            }
            Expression::ListComp(comp) => {
                let _ = comp;
                Err(TranslateError::with_suggestion(
                    ErrorCode::GenerationFailure,
                    "comprehensions are only supported as initializers in the cpp target"
                        .to_string(),
                    expr.location(),
                    "bind the comprehension to a local first".to_string(),
                ))
            }
            Expression::SetComp(_) | Expression::DictComp(_) => Err(TranslateError::with_suggestion(
                ErrorCode::GenerationFailure,
                "comprehensions are only supported as initializers in the cpp target".to_string(),
                expr.location(),
                "bind the comprehension to a local first".to_string(),
            )),
            Expression::TupleDisplay(tuple) => Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                "the cpp target cannot represent tuple values".to_string(),
                tuple.location,
            )),
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
                Ok(format!("({}.count({}) != 0)", haystack, needle))
            }
            SemanticType::List(_) => {
                self.helpers.algorithm = true;
                Ok(format!(
                    "(std::find({}.begin(), {}.end(), {}) != {}.end())",
                    haystack, haystack, needle, haystack
                ))
            }
            SemanticType::Str => Ok(format!(
                "({}.find({}) != std::string::npos)",
                haystack, needle
            )),
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
                return Ok(format!("static_cast<int64_t>({}.size())", arg));
            }
            "abs" => {
                self.helpers.cmath = true;
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(format!("std::abs({})", arg));
            }
            "min" | "max" => {
                self.helpers.algorithm = true;
                if call.arguments.len() == 1 {
                    let arg = self.emit_expression(&call.arguments[0])?;
                    return Ok(format!(
                        "(*std::{}_element({}.begin(), {}.end()))",
                        name, arg, arg
                    ));
                }
                let args: Result<Vec<String>, TranslateError> =
                    call.arguments.iter().map(|a| self.emit_expression(a)).collect();
                return Ok(format!("std::{}({{{}}})", name, args?.join(", ")));
            }
            "sum" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                let zero = match call.arguments[0].ty() {
                    SemanticType::List(elem) if matches!(elem.as_ref(), SemanticType::Float) => {
                        "0.0"
                    }
                    _ => "static_cast<int64_t>(0)",
                };
                self.helpers.algorithm = true;
                return Ok(format!(
                    "std::accumulate({}.begin(), {}.end(), {})",
                    arg, arg, zero
                ));
            }
            "str" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => arg,
                    SemanticType::Bool => {
                        format!("std::string(({}) ? \"True\" : \"False\")", arg)
                    }
                    _ => format!("std::to_string({})", arg),
                });
            }
            "int" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => format!("static_cast<int64_t>(std::stoll({}))", arg),
                    _ => format!("static_cast<int64_t>({})", arg),
                });
            }
            "float" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Str => format!("std::stod({})", arg),
                    _ => format!("static_cast<double>({})", arg),
                });
            }
            "bool" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(format!("static_cast<bool>({})", arg));
            }
            "list" | "dict" | "set" => {
                let cpp_ty = self
                    .cpp_type(&call.ty, call.location)
                    .unwrap_or_else(|| "std::vector<int64_t>".to_string());
                return Ok(format!("{}{{}}", cpp_ty));
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

        let args: Result<Vec<String>, TranslateError> =
            call.arguments.iter().map(|a| self.emit_expression(a)).collect();
        let args = args?.join(", ");

        if self.context.is_class(name) {
            return Ok(format!("{}({})", name, args));
        }
        Ok(format!("{}({})", self.function_name(name), args))
    }

    /// Container-operation strategy dispatch for the std:: containers
    fn emit_method_call(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        receiver: &Expression,
        method: &str,
    ) -> Result<String, TranslateError> {
        let receiver_ty = receiver.ty().clone();
        let recv = self.emit_expression(receiver)?;
        let arg = |emitter: &mut Self, i: usize| -> Result<String, TranslateError> {
            emitter.emit_expression(&call.arguments[i])
        };

        match &receiver_ty {
            SemanticType::List(_) => match method {
                "append" => Ok(format!("{}.push_back({})", recv, arg(self, 0)?)),
                "pop" => Ok(format!("{}.pop_back()", recv)),
                "clear" => Ok(format!("{}.clear()", recv)),
                "extend" => {
                    let other = arg(self, 0)?;
                    Ok(format!(
                        "{}.insert({}.end(), {}.begin(), {}.end())",
                        recv, recv, other, other
                    ))
                }
                "insert" => Ok(format!(
                    "{}.insert({}.begin() + {}, {})",
                    recv,
                    recv,
                    arg(self, 0)?,
                    arg(self, 1)?
                )),
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Dict(_, value_ty) => match method {
                "get" => {
                    let key = arg(self, 0)?;
                    let default = self
                        .cpp_type(value_ty, call.location)
                        .map(|t| format!("{}{{}}", t))
                        .unwrap_or_else(|| "0".to_string());
                    Ok(format!(
                        "({}.count({}) ? {}.at({}) : {})",
                        recv, key, recv, key, default
                    ))
                }
                "pop" | "erase" => Ok(format!("{}.erase({})", recv, arg(self, 0)?)),
                "clear" => Ok(format!("{}.clear()", recv)),
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Set(_) => match method {
                "add" => Ok(format!("{}.insert({})", recv, arg(self, 0)?)),
                "remove" | "discard" => Ok(format!("{}.erase({})", recv, arg(self, 0)?)),
                "clear" => Ok(format!("{}.clear()", recv)),
                _ => self.unsupported_method(method, &receiver_ty, call.location),
            },
            SemanticType::Str => {
                self.helpers.str_helpers = true;
                match method {
                    "upper" => Ok(format!("mgen_upper({})", recv)),
                    "lower" => Ok(format!("mgen_lower({})", recv)),
                    "strip" => Ok(format!("mgen_strip({})", recv)),
                    "replace" => Ok(format!(
                        "mgen_replace({}, {}, {})",
                        recv,
                        arg(self, 0)?,
                        arg(self, 1)?
                    )),
                    "find" => Ok(format!(
                        "static_cast<int64_t>({}.find({}) == std::string::npos ? -1 : static_cast<int64_t>({}.find({})))",
                        recv,
                        arg(self, 0)?,
                        recv,
                        arg(self, 0)?
                    )),
                    "startswith" => Ok(format!("({}.rfind({}, 0) == 0)", recv, arg(self, 0)?)),
                    "endswith" => {
                        let suffix = arg(self, 0)?;
                        Ok(format!(
                            "({0}.size() >= std::string({1}).size() && {0}.compare({0}.size() - std::string({1}).size(), std::string({1}).size(), {1}) == 0)",
                            recv, suffix
                        ))
                    }
                    "split" => {
                        self.helpers.split_join = true;
                        Ok(format!("mgen_split({}, {})", recv, arg(self, 0)?))
                    }
                    "join" => {
                        self.helpers.split_join = true;
                        Ok(format!("mgen_join({}, {})", recv, arg(self, 0)?))
                    }
                    _ => self.unsupported_method(method, &receiver_ty, call.location),
                }
            }
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

    fn unsupported_method(
        &self,
        method: &str,
        receiver_ty: &SemanticType,
        location: SourceLocation,
    ) -> Result<String, TranslateError> {
        Err(TranslateError::with_suggestion(
            ErrorCode::UnsupportedMethod,
            format!(
                "method '{}' on '{}' is not implemented for the cpp target",
                method, receiver_ty
            ),
            location,
            "rewrite the operation with supported primitives".to_string(),
        ))
    }

    fn emit_print(&mut self, call: &mgen_ir::ast::CallExpr) -> Result<String, TranslateError> {
        let mut parts = vec!["std::cout".to_string()];
        for (i, arg) in call.arguments.iter().enumerate() {
            if i > 0 {
                parts.push("\" \"".to_string());
            }
            let text = self.emit_expression(arg)?;
            match arg.ty() {
                SemanticType::Bool => {
                    parts.push(format!("(({}) ? \"True\" : \"False\")", text))
                }
                _ => parts.push(text),
            }
        }
        parts.push("std::endl".to_string());
        Ok(parts.join(" << "))
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn cpp_string_literal(value: &str) -> String {
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
