//! LLVM IR converter
//!
//! Emits textual IR in the classic front-end style: one alloca per local
//! in the entry block, loads and stores instead of SSA phi nodes, and
//! explicit basic blocks for control flow. Containers live in allocas of
//! the runtime struct types, zero-initialized (the runtime's lazy bucket
//! allocation makes an all-zero container valid) and mutated through
//! calls into the same C runtime the C target links. Shapes the textual
//! emitter cannot express (container returns, classes, map iteration)
//! are rejected with a clear diagnostic.

use crate::converter::TargetConverter;
use crate::generated::GeneratedOutput;
use crate::loops::{classify, IterationSource};
use crate::writer::FormatWriter;
use mgen_error::{CompileResult, ErrorCode, TranslateError};
use mgen_ir::SourceLocation;
use mgen_ir::ast::{
    BinaryOperator, CompareOperator, Declaration, Expression, ForStatement, FunctionDef,
    LiteralValue, Module, Statement, UnaryOperator,
};
use mgen_shared::CompilationContext;
use mgen_types::{SemanticType, Target};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub struct LlvmConverter;

impl TargetConverter for LlvmConverter {
    fn target(&self) -> Target {
        Target::LlvmIr
    }

    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput> {
        let mut emitter = LlvmEmitter::new(context);
        let text = emitter.emit_module(module);
        if emitter.errors.is_empty() {
            Ok(GeneratedOutput::single(format!("{}.ll", stem), text))
        } else {
            Err(emitter.errors)
        }
    }
}

struct LlvmEmitter<'a> {
    context: &'a mut CompilationContext,
    errors: Vec<TranslateError>,
    /// name -> (alloca register, semantic type, whether the slot holds
    /// a pointer to the value rather than the value itself)
    locals: HashMap<String, (String, SemanticType, bool)>,
    /// Containers needing a drop call on exit paths
    live_containers: Vec<String>,
    temp_counter: usize,
    label_counter: usize,
    /// String literal globals: text -> (symbol, byte length)
    string_globals: BTreeMap<String, (String, usize)>,
    /// extern declarations needed by the emitted calls
    declares: BTreeSet<String>,
    needs_floordiv: bool,
    needs_floormod: bool,
    current_terminated: bool,
}

impl<'a> LlvmEmitter<'a> {
    fn new(context: &'a mut CompilationContext) -> Self {
        LlvmEmitter {
            context,
            errors: Vec::new(),
            locals: HashMap::new(),
            live_containers: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
            string_globals: BTreeMap::new(),
            declares: BTreeSet::new(),
            needs_floordiv: false,
            needs_floormod: false,
            current_terminated: false,
        }
    }

    fn error(&mut self, code: ErrorCode, message: String, location: SourceLocation) {
        self.errors.push(TranslateError::new(code, message, location));
    }

    fn temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("%t{}", self.temp_counter)
    }

    fn label(&mut self, prefix: &str) -> String {
        self.label_counter += 1;
        format!("{}{}", prefix, self.label_counter)
    }

    // ----- module layout -----

    fn emit_module(&mut self, module: &Module) -> String {
        let mut body = FormatWriter::with_unit("  ");

        for decl in &module.declarations {
            match decl {
                Declaration::Function(func) => self.emit_function(&mut body, func),
                Declaration::Class(class) => self.error(
                    ErrorCode::UnsupportedFeature,
                    "classes are not supported by the llvm target".to_string(),
                    class.location,
                ),
                Declaration::GlobalVar(var) => self.error(
                    ErrorCode::UnsupportedFeature,
                    "module-level variables are not supported by the llvm target".to_string(),
                    var.location,
                ),
                Declaration::Import(_) => {}
            }
        }

        if module.function("main").is_some() {
            body.line("define i32 @main() {");
            body.line("entry:");
            match module.function("main").map(|f| &f.return_type) {
                Some(SemanticType::Int) => {
                    body.line("  %ret = call i64 @mgen_user_main()");
                    body.line("  %code = trunc i64 %ret to i32");
                    body.line("  ret i32 %code");
                }
                _ => {
                    body.line("  call void @mgen_user_main()");
                    body.line("  ret i32 0");
                }
            }
            body.line("}");
        }

        let mut out = FormatWriter::with_unit("  ");
        out.line("; generated by mgen");
        out.blank();
        self.emit_type_definitions(&mut out);
        self.emit_string_globals(&mut out);
        self.emit_declares(&mut out);
        self.emit_int_helpers(&mut out);
        out.raw(body.finish());
        out.finish()
    }

    fn emit_type_definitions(&mut self, out: &mut FormatWriter) {
        let mut any = false;
        for name in self.context.runtime_requirements().clone() {
            out.line(format!("%struct.{} = type {{ ptr, i64, i64 }}", name));
            any = true;
        }
        if any {
            out.blank();
        }
    }

    fn emit_string_globals(&self, out: &mut FormatWriter) {
        for (text, (symbol, len)) in &self.string_globals {
            out.line(format!(
                "{} = private unnamed_addr constant [{} x i8] c\"{}\"",
                symbol,
                len,
                encode_c_string(text)
            ));
        }
        if !self.string_globals.is_empty() {
            out.blank();
        }
    }

    fn emit_declares(&self, out: &mut FormatWriter) {
        for declare in &self.declares {
            out.line(format!("declare {}", declare));
        }
        if !self.declares.is_empty() {
            out.blank();
        }
    }

    fn emit_int_helpers(&self, out: &mut FormatWriter) {
        if self.needs_floordiv {
            out.line("define internal i64 @mgen_floordiv_i64(i64 %a, i64 %b) {");
            out.line("entry:");
            out.line("  %q = sdiv i64 %a, %b");
            out.line("  %r = srem i64 %a, %b");
            out.line("  %rnz = icmp ne i64 %r, 0");
            out.line("  %sa = icmp slt i64 %a, 0");
            out.line("  %sb = icmp slt i64 %b, 0");
            out.line("  %sdiff = xor i1 %sa, %sb");
            out.line("  %adjust = and i1 %rnz, %sdiff");
            out.line("  %qm1 = sub i64 %q, 1");
            out.line("  %res = select i1 %adjust, i64 %qm1, i64 %q");
            out.line("  ret i64 %res");
            out.line("}");
            out.blank();
        }
        if self.needs_floormod {
            out.line("define internal i64 @mgen_floormod_i64(i64 %a, i64 %b) {");
            out.line("entry:");
            out.line("  %r = srem i64 %a, %b");
            out.line("  %rnz = icmp ne i64 %r, 0");
            out.line("  %sr = icmp slt i64 %r, 0");
            out.line("  %sb = icmp slt i64 %b, 0");
            out.line("  %sdiff = xor i1 %sr, %sb");
            out.line("  %adjust = and i1 %rnz, %sdiff");
            out.line("  %rpb = add i64 %r, %b");
            out.line("  %res = select i1 %adjust, i64 %rpb, i64 %r");
            out.line("  ret i64 %res");
            out.line("}");
            out.blank();
        }
    }

    // ----- types -----

    fn llvm_type(&mut self, ty: &SemanticType, location: SourceLocation) -> Option<&'static str> {
        match ty {
            SemanticType::Int => Some("i64"),
            SemanticType::Float => Some("double"),
            SemanticType::Bool => Some("i1"),
            SemanticType::Str => Some("ptr"),
            SemanticType::Void => Some("void"),
            other => {
                if self.runtime_struct(other).is_some() {
                    return Some("ptr");
                }
                self.error(
                    ErrorCode::UnsupportedFeature,
                    format!("the llvm target cannot represent the type '{}'", other),
                    location,
                );
                None
            }
        }
    }

    /// The runtime struct name for a container shape
    fn runtime_struct(&self, ty: &SemanticType) -> Option<&'static str> {
        match ty {
            SemanticType::List(elem) => match elem.as_ref() {
                SemanticType::Int | SemanticType::Bool => Some("vec_int"),
                SemanticType::Float => Some("vec_double"),
                SemanticType::Str => Some("vec_str"),
                _ => None,
            },
            SemanticType::Dict(key, value) => match (key.as_ref(), value.as_ref()) {
                (SemanticType::Str, SemanticType::Int) => Some("map_str_int"),
                (SemanticType::Int, SemanticType::Int) => Some("map_int_int"),
                _ => None,
            },
            SemanticType::Set(elem) => match elem.as_ref() {
                SemanticType::Int | SemanticType::Bool => Some("set_int"),
                SemanticType::Str => Some("set_str"),
                _ => None,
            },
            _ => None,
        }
    }

    fn string_global(&mut self, text: &str) -> String {
        let next_index = self.string_globals.len();
        let (symbol, _) = self
            .string_globals
            .entry(text.to_string())
            .or_insert_with(|| (format!("@.str.{}", next_index), text.len() + 1));
        symbol.clone()
    }

    // ----- functions -----

    fn emit_function(&mut self, out: &mut FormatWriter, func: &FunctionDef) {
        self.locals.clear();
        self.live_containers.clear();
        self.temp_counter = 0;
        self.label_counter = 0;
        self.current_terminated = false;

        let name = if func.name == "main" {
            "mgen_user_main".to_string()
        } else {
            func.name.clone()
        };

        if self.runtime_struct(&func.return_type).is_some()
            || matches!(func.return_type, SemanticType::Object(_) | SemanticType::Tuple(_))
        {
            return self.error(
                ErrorCode::GenerationFailure,
                "the llvm target cannot return container values".to_string(),
                func.location,
            );
        }
        let Some(ret_ty) = self.llvm_type(&func.return_type.clone(), func.location) else {
            return;
        };

        let mut params = Vec::new();
        for param in func.value_parameters() {
            let Some(param_ty) = self.llvm_type(&param.annotation.clone(), param.location) else {
                return;
            };
            params.push(format!("{} %arg.{}", param_ty, param.name));
        }

        out.line(format!("define {} @{}({}) {{", ret_ty, name, params.join(", ")));
        out.line("entry:");
        out.indent();

        // Parameter slots
        for param in func.value_parameters() {
            let Some(param_ty) = self.llvm_type(&param.annotation.clone(), param.location) else {
                return;
            };
            let slot = format!("%{}.addr", param.name);
            out.line(format!("{} = alloca {}", slot, param_ty));
            out.line(format!(
                "store {} %arg.{}, ptr {}",
                param_ty, param.name, slot
            ));
            let indirect = self.runtime_struct(&param.annotation).is_some();
            self.locals
                .insert(param.name.clone(), (slot, param.annotation.clone(), indirect));
        }

        // Local slots, one alloca per binding in the entry block
        let mut local_types: Vec<(String, SemanticType)> = Vec::new();
        collect_locals(&func.body, &mut local_types);
        for (local, ty) in local_types {
            if self.locals.contains_key(&local) {
                continue;
            }
            if let Some(runtime) = self.runtime_struct(&ty) {
                self.context.require_runtime(runtime);
                let slot = format!("%{}.addr", local);
                out.line(format!("{} = alloca %struct.{}", slot, runtime));
                out.line(format!(
                    "store %struct.{} zeroinitializer, ptr {}",
                    runtime, slot
                ));
                self.live_containers.push(local.clone());
                self.locals.insert(local, (slot, ty, false));
            } else if let Some(llvm_ty) = self.llvm_type(&ty, func.location) {
                let slot = format!("%{}.addr", local);
                out.line(format!("{} = alloca {}", slot, llvm_ty));
                self.locals.insert(local, (slot, ty, false));
            }
        }

        self.emit_block(out, &func.body);

        if !self.current_terminated {
            self.emit_drops(out, None);
            match func.return_type {
                SemanticType::Void => out.line("ret void"),
                SemanticType::Int => out.line("ret i64 0"),
                SemanticType::Float => out.line("ret double 0.0"),
                SemanticType::Bool => out.line("ret i1 false"),
                _ => out.line("ret ptr null"),
            }
        }

        out.dedent();
        out.line("}");
        out.blank();
    }

    fn emit_drops(&mut self, out: &mut FormatWriter, keep: Option<&str>) {
        let containers = self.live_containers.clone();
        for name in containers {
            if Some(name.as_str()) == keep {
                continue;
            }
            let Some((slot, ty, _)) = self.locals.get(&name).cloned() else {
                continue;
            };
            if let Some(runtime) = self.runtime_struct(&ty) {
                self.declare(&format!("void @{}_drop(ptr)", runtime));
                out.line(format!("call void @{}_drop(ptr {})", runtime, slot));
            }
        }
    }

    fn declare(&mut self, signature: &str) {
        self.declares.insert(signature.to_string());
    }

    // ----- statements -----

    fn emit_block(&mut self, out: &mut FormatWriter, statements: &[Statement]) {
        for stmt in statements {
            if self.current_terminated {
                // Unreachable statements were already diagnosed by SA001
                break;
            }
            self.emit_statement(out, stmt);
        }
    }

    fn emit_statement(&mut self, out: &mut FormatWriter, stmt: &Statement) {
        match stmt {
            Statement::AnnAssign(ann) => {
                if let (Expression::Variable(var), Some(value)) = (&ann.target, &ann.value) {
                    self.emit_store_local(out, &var.name, value, ann.location);
                }
            }
            Statement::Assign(assign) => match &assign.target {
                Expression::Variable(var) => {
                    self.emit_store_local(out, &var.name, &assign.value, assign.location);
                }
                Expression::Subscript(sub) => {
                    self.emit_subscript_store(out, sub, &assign.value, assign.location);
                }
                other => self.error(
                    ErrorCode::GenerationFailure,
                    "unsupported store target for the llvm target".to_string(),
                    other.location(),
                ),
            },
            Statement::AugAssign(aug) => {
                if let Expression::Variable(var) = &aug.target {
                    let combined = Expression::Binary(mgen_ir::ast::BinaryExpr {
                        left: Box::new(aug.target.clone()),
                        operator: aug.operator,
                        right: Box::new(aug.value.clone()),
                        ty: aug.target.ty().clone(),
                        location: aug.location,
                    });
                    self.emit_store_local(out, &var.name, &combined, aug.location);
                } else if let Expression::Subscript(sub) = &aug.target {
                    let combined = Expression::Binary(mgen_ir::ast::BinaryExpr {
                        left: Box::new(aug.target.clone()),
                        operator: aug.operator,
                        right: Box::new(aug.value.clone()),
                        ty: aug.target.ty().clone(),
                        location: aug.location,
                    });
                    self.emit_subscript_store(out, sub, &combined, aug.location);
                }
            }
            Statement::If(if_stmt) => {
                let Ok(cond) = self.emit_checked(out, &if_stmt.condition) else {
                    return;
                };
                let then_label = self.label("then");
                let else_label = self.label("else");
                let end_label = self.label("endif");
                let has_else = !if_stmt.else_branch.is_empty();
                let false_target = if has_else { &else_label } else { &end_label };
                out.line(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond, then_label, false_target
                ));

                out.dedent();
                out.line(format!("{}:", then_label));
                out.indent();
                self.current_terminated = false;
                self.emit_block(out, &if_stmt.then_branch);
                if !self.current_terminated {
                    out.line(format!("br label %{}", end_label));
                }

                if has_else {
                    out.dedent();
                    out.line(format!("{}:", else_label));
                    out.indent();
                    self.current_terminated = false;
                    self.emit_block(out, &if_stmt.else_branch);
                    if !self.current_terminated {
                        out.line(format!("br label %{}", end_label));
                    }
                }

                out.dedent();
                out.line(format!("{}:", end_label));
                out.indent();
                self.current_terminated = false;
            }
            Statement::While(while_stmt) => {
                let cond_label = self.label("while.cond");
                let body_label = self.label("while.body");
                let end_label = self.label("while.end");
                out.line(format!("br label %{}", cond_label));
                out.dedent();
                out.line(format!("{}:", cond_label));
                out.indent();
                self.current_terminated = false;
                let Ok(cond) = self.emit_checked(out, &while_stmt.condition) else {
                    return;
                };
                out.line(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond, body_label, end_label
                ));
                out.dedent();
                out.line(format!("{}:", body_label));
                out.indent();
                self.current_terminated = false;
                self.emit_block(out, &while_stmt.body);
                if !self.current_terminated {
                    out.line(format!("br label %{}", cond_label));
                }
                out.dedent();
                out.line(format!("{}:", end_label));
                out.indent();
                self.current_terminated = false;
            }
            Statement::For(for_stmt) => self.emit_for(out, for_stmt),
            Statement::Return(ret) => self.emit_return(out, ret.value.as_ref(), ret.location),
            Statement::Expression(expr_stmt) => {
                let _ = self.emit_checked(out, &expr_stmt.expression);
            }
            Statement::Pass(_) => {}
            Statement::Break(loc) | Statement::Continue(loc) => self.error(
                ErrorCode::GenerationFailure,
                "break/continue are not supported by the llvm target".to_string(),
                *loc,
            ),
        }
    }

    fn emit_store_local(
        &mut self,
        out: &mut FormatWriter,
        name: &str,
        value: &Expression,
        location: SourceLocation,
    ) {
        // Container re-initialization is a zero store over the slot
        if let Some((slot, ty, _)) = self.locals.get(name).cloned() {
            if let Some(runtime) = self.runtime_struct(&ty) {
                match value {
                    Expression::ListDisplay(list) if list.elements.is_empty() => {
                        out.line(format!(
                            "store %struct.{} zeroinitializer, ptr {}",
                            runtime, slot
                        ));
                        return;
                    }
                    Expression::DictDisplay(dict) if dict.keys.is_empty() => {
                        out.line(format!(
                            "store %struct.{} zeroinitializer, ptr {}",
                            runtime, slot
                        ));
                        return;
                    }
                    Expression::Call(call)
                        if matches!(call.callee_name(), Some("list") | Some("dict") | Some("set")) =>
                    {
                        out.line(format!(
                            "store %struct.{} zeroinitializer, ptr {}",
                            runtime, slot
                        ));
                        return;
                    }
                    _ => {
                        return self.error(
                            ErrorCode::GenerationFailure,
                            "containers can only be initialized empty in the llvm target"
                                .to_string(),
                            location,
                        );
                    }
                }
            }
            let Ok(text) = self.emit_checked(out, value) else {
                return;
            };
            let llvm_ty = self.llvm_type(&ty, location).unwrap_or("i64");
            out.line(format!("store {} {}, ptr {}", llvm_ty, text, slot));
        } else {
            self.error(
                ErrorCode::GenerationFailure,
                format!("no slot for local '{}'", name),
                location,
            );
        }
    }

    fn emit_subscript_store(
        &mut self,
        out: &mut FormatWriter,
        sub: &mgen_ir::ast::SubscriptExpr,
        value: &Expression,
        location: SourceLocation,
    ) {
        let object_ty = sub.object.ty().clone();
        let Some(runtime) = self.runtime_struct(&object_ty) else {
            return self.error(
                ErrorCode::GenerationFailure,
                format!("subscript store on '{}' is not supported", object_ty),
                location,
            );
        };
        let Ok(obj) = self.container_ptr(out, &sub.object) else {
            return;
        };
        let Ok(index) = self.emit_checked(out, &sub.index) else {
            return;
        };
        let Ok(text) = self.emit_checked(out, value) else {
            return;
        };
        match &object_ty {
            SemanticType::List(elem) => {
                let elem_ty = if matches!(elem.as_ref(), SemanticType::Float) {
                    "double"
                } else if matches!(elem.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                self.declare(&format!("ptr @{}_at(ptr, i64)", runtime));
                let slot = self.temp();
                out.line(format!(
                    "{} = call ptr @{}_at(ptr {}, i64 {})",
                    slot, runtime, obj, index
                ));
                out.line(format!("store {} {}, ptr {}", elem_ty, text, slot));
            }
            SemanticType::Dict(key, _) => {
                let key_ty = if matches!(key.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                self.declare(&format!("void @{}_set(ptr, {}, i64)", runtime, key_ty));
                out.line(format!(
                    "call void @{}_set(ptr {}, {} {}, i64 {})",
                    runtime, obj, key_ty, index, text
                ));
            }
            _ => {}
        }
    }

    fn emit_return(
        &mut self,
        out: &mut FormatWriter,
        value: Option<&Expression>,
        _location: SourceLocation,
    ) {
        match value {
            None => {
                self.emit_drops(out, None);
                out.line("ret void");
            }
            Some(Expression::Literal(lit)) if lit.value == LiteralValue::None => {
                self.emit_drops(out, None);
                out.line("ret void");
            }
            Some(expr) => {
                let Ok(text) = self.emit_checked(out, expr) else {
                    return;
                };
                let ty = expr.ty().clone();
                let llvm_ty = self.llvm_type(&ty, expr.location()).unwrap_or("i64");
                self.emit_drops(out, None);
                out.line(format!("ret {} {}", llvm_ty, text));
            }
        }
        self.current_terminated = true;
    }

    // ----- loops -----

    fn emit_for(&mut self, out: &mut FormatWriter, for_stmt: &ForStatement) {
        let shape = classify(for_stmt);
        let Some(var) = for_stmt.target.single_name() else {
            return self.error(
                ErrorCode::GenerationFailure,
                "pair loop targets are not supported by the llvm target".to_string(),
                for_stmt.location,
            );
        };
        let Some((slot, _, _)) = self.locals.get(var).cloned() else {
            return self.error(
                ErrorCode::GenerationFailure,
                format!("no slot for loop variable '{}'", var),
                for_stmt.location,
            );
        };

        match shape.source {
            IterationSource::Range(args) => {
                let (start, stop, step) = match args {
                    [stop] => {
                        let Ok(stop) = self.emit_checked(out, stop) else {
                            return;
                        };
                        ("0".to_string(), stop, "1".to_string())
                    }
                    [start, stop] => {
                        let (Ok(start), Ok(stop)) =
                            (self.emit_checked(out, start), self.emit_checked(out, stop))
                        else {
                            return;
                        };
                        (start, stop, "1".to_string())
                    }
                    [start, stop, step] => {
                        let (Ok(start), Ok(stop), Ok(step)) = (
                            self.emit_checked(out, start),
                            self.emit_checked(out, stop),
                            self.emit_checked(out, step),
                        ) else {
                            return;
                        };
                        (start, stop, step)
                    }
                    _ => {
                        return self.error(
                            ErrorCode::GenerationFailure,
                            "range() takes 1 to 3 arguments".to_string(),
                            for_stmt.location,
                        );
                    }
                };

                out.line(format!("store i64 {}, ptr {}", start, slot));
                let cond_label = self.label("for.cond");
                let body_label = self.label("for.body");
                let end_label = self.label("for.end");
                out.line(format!("br label %{}", cond_label));
                out.dedent();
                out.line(format!("{}:", cond_label));
                out.indent();
                self.current_terminated = false;
                let current = self.temp();
                out.line(format!("{} = load i64, ptr {}", current, slot));
                // Direction-aware bound check
                let pos = self.temp();
                out.line(format!("{} = icmp sgt i64 {}, 0", pos, step));
                let lt = self.temp();
                out.line(format!("{} = icmp slt i64 {}, {}", lt, current, stop));
                let gt = self.temp();
                out.line(format!("{} = icmp sgt i64 {}, {}", gt, current, stop));
                let cond = self.temp();
                out.line(format!("{} = select i1 {}, i1 {}, i1 {}", cond, pos, lt, gt));
                out.line(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond, body_label, end_label
                ));
                out.dedent();
                out.line(format!("{}:", body_label));
                out.indent();
                self.current_terminated = false;
                self.emit_block(out, &for_stmt.body);
                if !self.current_terminated {
                    let reload = self.temp();
                    out.line(format!("{} = load i64, ptr {}", reload, slot));
                    let next = self.temp();
                    out.line(format!("{} = add i64 {}, {}", next, reload, step));
                    out.line(format!("store i64 {}, ptr {}", next, slot));
                    out.line(format!("br label %{}", cond_label));
                }
                out.dedent();
                out.line(format!("{}:", end_label));
                out.indent();
                self.current_terminated = false;
            }
            IterationSource::Container(iterable) => {
                self.emit_container_loop(out, for_stmt, iterable, &slot);
            }
        }
    }

    /// Index-based iteration over vec and set containers through the
    /// runtime's size/at/nth operations
    fn emit_container_loop(
        &mut self,
        out: &mut FormatWriter,
        for_stmt: &ForStatement,
        iterable: &Expression,
        var_slot: &str,
    ) {
        let iter_ty = iterable.ty().clone();
        let Some(runtime) = self.runtime_struct(&iter_ty) else {
            return self.error(
                ErrorCode::GenerationFailure,
                format!("the llvm target cannot iterate a value of type '{}'", iter_ty),
                for_stmt.location,
            );
        };
        if matches!(iter_ty, SemanticType::Dict(_, _)) {
            return self.error(
                ErrorCode::GenerationFailure,
                "map iteration is not supported by the llvm target".to_string(),
                for_stmt.location,
            );
        }
        let Ok(obj) = self.container_ptr(out, iterable) else {
            return;
        };

        self.declare(&format!("i64 @{}_size(ptr)", runtime));
        let size = self.temp();
        out.line(format!("{} = call i64 @{}_size(ptr {})", size, runtime, obj));

        let idx_slot = self.temp();
        out.line(format!("{} = alloca i64", idx_slot));
        out.line(format!("store i64 0, ptr {}", idx_slot));

        let cond_label = self.label("iter.cond");
        let body_label = self.label("iter.body");
        let end_label = self.label("iter.end");
        out.line(format!("br label %{}", cond_label));
        out.dedent();
        out.line(format!("{}:", cond_label));
        out.indent();
        let idx = self.temp();
        out.line(format!("{} = load i64, ptr {}", idx, idx_slot));
        let cond = self.temp();
        out.line(format!("{} = icmp slt i64 {}, {}", cond, idx, size));
        out.line(format!(
            "br i1 {}, label %{}, label %{}",
            cond, body_label, end_label
        ));
        out.dedent();
        out.line(format!("{}:", body_label));
        out.indent();
        self.current_terminated = false;

        // Load the element into the loop variable slot
        let elem_ty = match &iter_ty {
            SemanticType::List(elem) if matches!(elem.as_ref(), SemanticType::Float) => "double",
            SemanticType::List(elem) | SemanticType::Set(elem)
                if matches!(elem.as_ref(), SemanticType::Str) =>
            {
                "ptr"
            }
            _ => "i64",
        };
        match &iter_ty {
            SemanticType::List(_) => {
                self.declare(&format!("ptr @{}_at(ptr, i64)", runtime));
                let elem_ptr = self.temp();
                out.line(format!(
                    "{} = call ptr @{}_at(ptr {}, i64 {})",
                    elem_ptr, runtime, obj, idx
                ));
                let elem = self.temp();
                out.line(format!("{} = load {}, ptr {}", elem, elem_ty, elem_ptr));
                out.line(format!("store {} {}, ptr {}", elem_ty, elem, var_slot));
            }
            SemanticType::Set(_) => {
                self.declare(&format!("{} @{}_nth(ptr, i64)", elem_ty, runtime));
                let elem = self.temp();
                out.line(format!(
                    "{} = call {} @{}_nth(ptr {}, i64 {})",
                    elem, elem_ty, runtime, obj, idx
                ));
                out.line(format!("store {} {}, ptr {}", elem_ty, elem, var_slot));
            }
            _ => {}
        }

        self.emit_block(out, &for_stmt.body);
        if !self.current_terminated {
            let reload = self.temp();
            out.line(format!("{} = load i64, ptr {}", reload, idx_slot));
            let next = self.temp();
            out.line(format!("{} = add i64 {}, 1", next, reload));
            out.line(format!("store i64 {}, ptr {}", next, idx_slot));
            out.line(format!("br label %{}", cond_label));
        }
        out.dedent();
        out.line(format!("{}:", end_label));
        out.indent();
        self.current_terminated = false;
    }

    // ----- expressions -----

    fn emit_checked(
        &mut self,
        out: &mut FormatWriter,
        expr: &Expression,
    ) -> Result<String, ()> {
        match self.emit_expression(out, expr) {
            Ok(text) => Ok(text),
            Err(error) => {
                self.errors.push(error);
                Err(())
            }
        }
    }

    /// A pointer to the runtime container behind an expression
    ///
    /// Local containers live directly in their alloca; container
    /// parameters arrive as a pointer stored in the slot and need a load.
    fn container_ptr(
        &mut self,
        out: &mut FormatWriter,
        expr: &Expression,
    ) -> Result<String, ()> {
        match expr {
            Expression::Variable(var) => match self.locals.get(&var.name).cloned() {
                Some((slot, _, true)) => {
                    let loaded = self.temp();
                    out.line(format!("{} = load ptr, ptr {}", loaded, slot));
                    Ok(loaded)
                }
                Some((slot, _, false)) => Ok(slot),
                None => {
                    self.error(
                        ErrorCode::GenerationFailure,
                        format!("no slot for '{}'", var.name),
                        var.location,
                    );
                    Err(())
                }
            },
            other => {
                self.error(
                    ErrorCode::GenerationFailure,
                    "container operations require a named container in the llvm target"
                        .to_string(),
                    other.location(),
                );
                Err(())
            }
        }
    }

    fn emit_expression(
        &mut self,
        out: &mut FormatWriter,
        expr: &Expression,
    ) -> Result<String, TranslateError> {
        match expr {
            Expression::Literal(lit) => match &lit.value {
                LiteralValue::Int(value) => Ok(format!("{}", value)),
                LiteralValue::Float(value) => Ok(format_double(*value)),
                LiteralValue::Bool(value) => Ok(if *value { "true" } else { "false" }.to_string()),
                LiteralValue::Str(value) => {
                    let symbol = self.string_global(value);
                    Ok(symbol)
                }
                LiteralValue::None => Ok("0".to_string()),
            },
            Expression::Variable(var) => {
                let Some((slot, ty, indirect)) = self.locals.get(&var.name).cloned() else {
                    return Err(TranslateError::new(
                        ErrorCode::GenerationFailure,
                        format!("no slot for '{}'", var.name),
                        var.location,
                    ));
                };
                if self.runtime_struct(&ty).is_some() {
                    // Containers are used through their pointer
                    if indirect {
                        let loaded = self.temp();
                        out.line(format!("{} = load ptr, ptr {}", loaded, slot));
                        return Ok(loaded);
                    }
                    return Ok(slot);
                }
                let llvm_ty = self.llvm_type(&ty, var.location).unwrap_or("i64");
                let value = self.temp();
                out.line(format!("{} = load {}, ptr {}", value, llvm_ty, slot));
                Ok(value)
            }
            Expression::Binary(bin) => self.emit_binary(out, bin),
            Expression::Unary(unary) => {
                let operand = self.emit_expression(out, &unary.operand)?;
                let value = self.temp();
                match unary.operator {
                    UnaryOperator::Negate => {
                        if matches!(unary.ty, SemanticType::Float) {
                            out.line(format!("{} = fneg double {}", value, operand));
                        } else {
                            out.line(format!("{} = sub i64 0, {}", value, operand));
                        }
                    }
                    UnaryOperator::Not => {
                        out.line(format!("{} = xor i1 {}, true", value, operand));
                    }
                    UnaryOperator::Invert => {
                        out.line(format!("{} = xor i64 {}, -1", value, operand));
                    }
                }
                Ok(value)
            }
            Expression::Boolean(boolean) => {
                let left = self.emit_expression(out, &boolean.left)?;
                let right = self.emit_expression(out, &boolean.right)?;
                let value = self.temp();
                let op = match boolean.operator {
                    mgen_ir::ast::BoolOperator::And => "and",
                    mgen_ir::ast::BoolOperator::Or => "or",
                };
                out.line(format!("{} = {} i1 {}, {}", value, op, left, right));
                Ok(value)
            }
            Expression::Comparison(cmp) => self.emit_comparison(out, cmp),
            Expression::Call(call) => self.emit_call(out, call),
            Expression::Subscript(sub) => self.emit_subscript(out, sub),
            other => Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                "this expression form is not supported by the llvm target".to_string(),
                other.location(),
            )),
        }
    }

    fn emit_binary(
        &mut self,
        out: &mut FormatWriter,
        bin: &mgen_ir::ast::BinaryExpr,
    ) -> Result<String, TranslateError> {
        let floats = matches!(bin.ty, SemanticType::Float);
        let mut left = self.emit_expression(out, &bin.left)?;
        let mut right = self.emit_expression(out, &bin.right)?;

        // Promote mixed operands for float arithmetic
        if floats {
            if matches!(bin.left.ty(), SemanticType::Int) {
                let widened = self.temp();
                out.line(format!("{} = sitofp i64 {} to double", widened, left));
                left = widened;
            }
            if matches!(bin.right.ty(), SemanticType::Int) {
                let widened = self.temp();
                out.line(format!("{} = sitofp i64 {} to double", widened, right));
                right = widened;
            }
        }

        let value = self.temp();
        let line = match bin.operator {
            BinaryOperator::Add if floats => format!("{} = fadd double {}, {}", value, left, right),
            BinaryOperator::Add => format!("{} = add i64 {}, {}", value, left, right),
            BinaryOperator::Subtract if floats => {
                format!("{} = fsub double {}, {}", value, left, right)
            }
            BinaryOperator::Subtract => format!("{} = sub i64 {}, {}", value, left, right),
            BinaryOperator::Multiply if floats => {
                format!("{} = fmul double {}, {}", value, left, right)
            }
            BinaryOperator::Multiply => format!("{} = mul i64 {}, {}", value, left, right),
            BinaryOperator::Divide => format!("{} = fdiv double {}, {}", value, left, right),
            BinaryOperator::FloorDivide if floats => {
                format!("{} = fdiv double {}, {}", value, left, right)
            }
            BinaryOperator::FloorDivide => {
                self.needs_floordiv = true;
                format!(
                    "{} = call i64 @mgen_floordiv_i64(i64 {}, i64 {})",
                    value, left, right
                )
            }
            BinaryOperator::Modulo if floats => {
                format!("{} = frem double {}, {}", value, left, right)
            }
            BinaryOperator::Modulo => {
                self.needs_floormod = true;
                format!(
                    "{} = call i64 @mgen_floormod_i64(i64 {}, i64 {})",
                    value, left, right
                )
            }
            BinaryOperator::Power => {
                return Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedMethod,
                    "the power operator is not supported by the llvm target".to_string(),
                    bin.location,
                    "expand the power into explicit multiplication".to_string(),
                ));
            }
            BinaryOperator::BitAnd => format!("{} = and i64 {}, {}", value, left, right),
            BinaryOperator::BitOr => format!("{} = or i64 {}, {}", value, left, right),
            BinaryOperator::BitXor => format!("{} = xor i64 {}, {}", value, left, right),
            BinaryOperator::ShiftLeft => format!("{} = shl i64 {}, {}", value, left, right),
            BinaryOperator::ShiftRight => format!("{} = ashr i64 {}, {}", value, left, right),
        };
        out.line(line);
        Ok(value)
    }

    fn emit_comparison(
        &mut self,
        out: &mut FormatWriter,
        cmp: &mgen_ir::ast::ComparisonExpr,
    ) -> Result<String, TranslateError> {
        if matches!(cmp.operator, CompareOperator::In | CompareOperator::NotIn) {
            let contained = self.emit_membership(out, cmp)?;
            if cmp.operator == CompareOperator::NotIn {
                let value = self.temp();
                out.line(format!("{} = xor i1 {}, true", value, contained));
                return Ok(value);
            }
            return Ok(contained);
        }

        let left_ty = cmp.left.ty().clone();
        let left = self.emit_expression(out, &cmp.left)?;
        let right = self.emit_expression(out, &cmp.right)?;
        let value = self.temp();

        if matches!(left_ty, SemanticType::Str) {
            self.declare("i1 @mgen_str_eq(ptr, ptr)");
            match cmp.operator {
                CompareOperator::Equal => {
                    out.line(format!(
                        "{} = call i1 @mgen_str_eq(ptr {}, ptr {})",
                        value, left, right
                    ));
                    return Ok(value);
                }
                CompareOperator::NotEqual => {
                    let eq = self.temp();
                    out.line(format!(
                        "{} = call i1 @mgen_str_eq(ptr {}, ptr {})",
                        eq, left, right
                    ));
                    out.line(format!("{} = xor i1 {}, true", value, eq));
                    return Ok(value);
                }
                _ => {
                    return Err(TranslateError::new(
                        ErrorCode::UnsupportedMethod,
                        "string ordering is not supported by the llvm target".to_string(),
                        cmp.location,
                    ));
                }
            }
        }

        if matches!(left_ty, SemanticType::Float) {
            let op = match cmp.operator {
                CompareOperator::Equal => "oeq",
                CompareOperator::NotEqual => "one",
                CompareOperator::Less => "olt",
                CompareOperator::LessEqual => "ole",
                CompareOperator::Greater => "ogt",
                CompareOperator::GreaterEqual => "oge",
                _ => unreachable!("membership handled above"),
            };
            out.line(format!("{} = fcmp {} double {}, {}", value, op, left, right));
        } else {
            let op = match cmp.operator {
                CompareOperator::Equal => "eq",
                CompareOperator::NotEqual => "ne",
                CompareOperator::Less => "slt",
                CompareOperator::LessEqual => "sle",
                CompareOperator::Greater => "sgt",
                CompareOperator::GreaterEqual => "sge",
                _ => unreachable!("membership handled above"),
            };
            out.line(format!("{} = icmp {} i64 {}, {}", value, op, left, right));
        }
        Ok(value)
    }

    fn emit_membership(
        &mut self,
        out: &mut FormatWriter,
        cmp: &mgen_ir::ast::ComparisonExpr,
    ) -> Result<String, TranslateError> {
        let right_ty = cmp.right.ty().clone();
        let Some(runtime) = self.runtime_struct(&right_ty) else {
            return Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                format!(
                    "membership tests on '{}' are not supported by the llvm target",
                    right_ty
                ),
                cmp.location,
            ));
        };
        if matches!(right_ty, SemanticType::List(_)) {
            return Err(TranslateError::with_suggestion(
                ErrorCode::UnsupportedMethod,
                "list membership is not supported by the llvm target".to_string(),
                cmp.location,
                "use a set for membership tests".to_string(),
            ));
        }
        let needle = self.emit_expression(out, &cmp.left)?;
        let needle_ty = if matches!(cmp.left.ty(), SemanticType::Str) {
            "ptr"
        } else {
            "i64"
        };
        let Ok(obj) = self.container_ptr(out, &cmp.right) else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "membership requires a named container".to_string(),
                cmp.location,
            ));
        };
        self.declare(&format!("i1 @{}_contains(ptr, {})", runtime, needle_ty));
        let value = self.temp();
        out.line(format!(
            "{} = call i1 @{}_contains(ptr {}, {} {})",
            value, runtime, obj, needle_ty, needle
        ));
        Ok(value)
    }

    fn emit_subscript(
        &mut self,
        out: &mut FormatWriter,
        sub: &mgen_ir::ast::SubscriptExpr,
    ) -> Result<String, TranslateError> {
        let object_ty = sub.object.ty().clone();
        let Some(runtime) = self.runtime_struct(&object_ty) else {
            return Err(TranslateError::new(
                ErrorCode::UnsupportedMethod,
                format!("subscripting '{}' is not supported by the llvm target", object_ty),
                sub.location,
            ));
        };
        let index = self.emit_expression(out, &sub.index)?;
        let Ok(obj) = self.container_ptr(out, &sub.object) else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "subscripts require a named container".to_string(),
                sub.location,
            ));
        };
        match &object_ty {
            SemanticType::List(elem) => {
                let elem_ty = if matches!(elem.as_ref(), SemanticType::Float) {
                    "double"
                } else if matches!(elem.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                self.declare(&format!("ptr @{}_at(ptr, i64)", runtime));
                let elem_ptr = self.temp();
                out.line(format!(
                    "{} = call ptr @{}_at(ptr {}, i64 {})",
                    elem_ptr, runtime, obj, index
                ));
                let value = self.temp();
                out.line(format!("{} = load {}, ptr {}", value, elem_ty, elem_ptr));
                Ok(value)
            }
            SemanticType::Dict(key, _) => {
                let key_ty = if matches!(key.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                self.declare(&format!("i64 @{}_get(ptr, {})", runtime, key_ty));
                let value = self.temp();
                out.line(format!(
                    "{} = call i64 @{}_get(ptr {}, {} {})",
                    value, runtime, obj, key_ty, index
                ));
                Ok(value)
            }
            _ => Err(TranslateError::new(
                ErrorCode::UnsupportedMethod,
                "unsupported subscript for the llvm target".to_string(),
                sub.location,
            )),
        }
    }

    fn emit_call(
        &mut self,
        out: &mut FormatWriter,
        call: &mgen_ir::ast::CallExpr,
    ) -> Result<String, TranslateError> {
        if let Some((receiver, method)) = call.method_parts() {
            return self.emit_method_call(out, call, receiver, method);
        }

        let Some(name) = call.callee_name().map(|n| n.to_string()) else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "unsupported call target".to_string(),
                call.location,
            ));
        };

        match name.as_str() {
            "print" => return self.emit_print(out, call),
            "len" => {
                let arg_ty = call.arguments[0].ty().clone();
                if matches!(arg_ty, SemanticType::Str) {
                    let text = self.emit_expression(out, &call.arguments[0])?;
                    self.declare("i64 @mgen_str_len(ptr)");
                    let value = self.temp();
                    out.line(format!("{} = call i64 @mgen_str_len(ptr {})", value, text));
                    return Ok(value);
                }
                let Some(runtime) = self.runtime_struct(&arg_ty) else {
                    return Err(TranslateError::new(
                        ErrorCode::UnsupportedFeature,
                        format!("len() on '{}' is not supported by the llvm target", arg_ty),
                        call.location,
                    ));
                };
                let Ok(obj) = self.container_ptr(out, &call.arguments[0]) else {
                    return Err(TranslateError::new(
                        ErrorCode::GenerationFailure,
                        "len() requires a named container".to_string(),
                        call.location,
                    ));
                };
                self.declare(&format!("i64 @{}_size(ptr)", runtime));
                let value = self.temp();
                out.line(format!("{} = call i64 @{}_size(ptr {})", value, runtime, obj));
                return Ok(value);
            }
            "abs" => {
                let arg = self.emit_expression(out, &call.arguments[0])?;
                if matches!(call.arguments[0].ty(), SemanticType::Float) {
                    self.declare("double @llvm.fabs.f64(double)");
                    let value = self.temp();
                    out.line(format!(
                        "{} = call double @llvm.fabs.f64(double {})",
                        value, arg
                    ));
                    return Ok(value);
                }
                let negated = self.temp();
                out.line(format!("{} = sub i64 0, {}", negated, arg));
                let is_negative = self.temp();
                out.line(format!("{} = icmp slt i64 {}, 0", is_negative, arg));
                let value = self.temp();
                out.line(format!(
                    "{} = select i1 {}, i64 {}, i64 {}",
                    value, is_negative, negated, arg
                ));
                return Ok(value);
            }
            "int" => {
                let arg = self.emit_expression(out, &call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Float => {
                        let value = self.temp();
                        out.line(format!("{} = fptosi double {} to i64", value, arg));
                        value
                    }
                    SemanticType::Bool => {
                        let value = self.temp();
                        out.line(format!("{} = zext i1 {} to i64", value, arg));
                        value
                    }
                    _ => arg,
                });
            }
            "float" => {
                let arg = self.emit_expression(out, &call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Int => {
                        let value = self.temp();
                        out.line(format!("{} = sitofp i64 {} to double", value, arg));
                        value
                    }
                    _ => arg,
                });
            }
            "bool" => {
                let arg = self.emit_expression(out, &call.arguments[0])?;
                let value = self.temp();
                out.line(format!("{} = icmp ne i64 {}, 0", value, arg));
                return Ok(value);
            }
            "min" | "max" | "sum" | "str" | "range" | "list" | "dict" | "set" => {
                return Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedMethod,
                    format!("{}() is not supported by the llvm target here", name),
                    call.location,
                    "compute the value with explicit loops".to_string(),
                ));
            }
            _ => {}
        }

        // User function call
        let Some(signature) = self.context.function_signature(&name).cloned() else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                format!("call to unknown function '{}'", name),
                call.location,
            ));
        };
        let mut args = Vec::new();
        for (arg, (_, param_ty)) in call.arguments.iter().zip(&signature.params) {
            if self.runtime_struct(param_ty).is_some() {
                let Ok(obj) = self.container_ptr(out, arg) else {
                    return Err(TranslateError::new(
                        ErrorCode::GenerationFailure,
                        "container arguments must be named containers".to_string(),
                        call.location,
                    ));
                };
                args.push(format!("ptr {}", obj));
            } else {
                let text = self.emit_expression(out, arg)?;
                let llvm_ty = self
                    .llvm_type(&param_ty.clone(), call.location)
                    .unwrap_or("i64");
                args.push(format!("{} {}", llvm_ty, text));
            }
        }
        let callee = if name == "main" {
            "mgen_user_main"
        } else {
            name.as_str()
        };
        match &signature.return_type {
            SemanticType::Void => {
                out.line(format!("call void @{}({})", callee, args.join(", ")));
                Ok("0".to_string())
            }
            ret => {
                let llvm_ty = self.llvm_type(&ret.clone(), call.location).unwrap_or("i64");
                let value = self.temp();
                out.line(format!(
                    "{} = call {} @{}({})",
                    value,
                    llvm_ty,
                    callee,
                    args.join(", ")
                ));
                Ok(value)
            }
        }
    }

    /// Container-operation strategies over the runtime ABI
    fn emit_method_call(
        &mut self,
        out: &mut FormatWriter,
        call: &mgen_ir::ast::CallExpr,
        receiver: &Expression,
        method: &str,
    ) -> Result<String, TranslateError> {
        let receiver_ty = receiver.ty().clone();
        let Some(runtime) = self.runtime_struct(&receiver_ty) else {
            return Err(TranslateError::new(
                ErrorCode::UnsupportedMethod,
                format!(
                    "method '{}' on '{}' is not implemented for the llvm target",
                    method, receiver_ty
                ),
                call.location,
            ));
        };
        let Ok(obj) = self.container_ptr(out, receiver) else {
            return Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "container operations require a named container".to_string(),
                call.location,
            ));
        };

        match (&receiver_ty, method) {
            (SemanticType::List(elem), "append") => {
                let elem_ty = if matches!(elem.as_ref(), SemanticType::Float) {
                    "double"
                } else if matches!(elem.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                let value = self.emit_expression(out, &call.arguments[0])?;
                self.declare(&format!("void @{}_push(ptr, {})", runtime, elem_ty));
                out.line(format!(
                    "call void @{}_push(ptr {}, {} {})",
                    runtime, obj, elem_ty, value
                ));
                Ok("0".to_string())
            }
            (SemanticType::List(_), "pop") => {
                self.declare(&format!("i64 @{}_pop(ptr)", runtime));
                let value = self.temp();
                out.line(format!("{} = call i64 @{}_pop(ptr {})", value, runtime, obj));
                Ok(value)
            }
            (SemanticType::List(_), "clear")
            | (SemanticType::Dict(_, _), "clear")
            | (SemanticType::Set(_), "clear") => {
                self.declare(&format!("void @{}_clear(ptr)", runtime));
                out.line(format!("call void @{}_clear(ptr {})", runtime, obj));
                Ok("0".to_string())
            }
            (SemanticType::Set(elem), "add") => {
                let elem_ty = if matches!(elem.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                let value = self.emit_expression(out, &call.arguments[0])?;
                self.declare(&format!("i1 @{}_insert(ptr, {})", runtime, elem_ty));
                let added = self.temp();
                out.line(format!(
                    "{} = call i1 @{}_insert(ptr {}, {} {})",
                    added, runtime, obj, elem_ty, value
                ));
                Ok(added)
            }
            (SemanticType::Set(elem), "remove") | (SemanticType::Set(elem), "discard") => {
                let elem_ty = if matches!(elem.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                let value = self.emit_expression(out, &call.arguments[0])?;
                self.declare(&format!("void @{}_erase(ptr, {})", runtime, elem_ty));
                out.line(format!(
                    "call void @{}_erase(ptr {}, {} {})",
                    runtime, obj, elem_ty, value
                ));
                Ok("0".to_string())
            }
            (SemanticType::Dict(key, _), "get") => {
                let key_ty = if matches!(key.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                let key_text = self.emit_expression(out, &call.arguments[0])?;
                self.declare(&format!("i64 @{}_get(ptr, {})", runtime, key_ty));
                let value = self.temp();
                out.line(format!(
                    "{} = call i64 @{}_get(ptr {}, {} {})",
                    value, runtime, obj, key_ty, key_text
                ));
                Ok(value)
            }
            (SemanticType::Dict(key, _), "pop") | (SemanticType::Dict(key, _), "erase") => {
                let key_ty = if matches!(key.as_ref(), SemanticType::Str) {
                    "ptr"
                } else {
                    "i64"
                };
                let key_text = self.emit_expression(out, &call.arguments[0])?;
                self.declare(&format!("void @{}_erase(ptr, {})", runtime, key_ty));
                out.line(format!(
                    "call void @{}_erase(ptr {}, {} {})",
                    runtime, obj, key_ty, key_text
                ));
                Ok("0".to_string())
            }
            _ => Err(TranslateError::with_suggestion(
                ErrorCode::UnsupportedMethod,
                format!(
                    "method '{}' on '{}' is not implemented for the llvm target",
                    method, receiver_ty
                ),
                call.location,
                "rewrite the operation with supported primitives".to_string(),
            )),
        }
    }

    fn emit_print(
        &mut self,
        out: &mut FormatWriter,
        call: &mgen_ir::ast::CallExpr,
    ) -> Result<String, TranslateError> {
        self.declare("i32 @printf(ptr, ...)");
        for arg in &call.arguments {
            match arg.ty().clone() {
                SemanticType::Int => {
                    let text = self.emit_expression(out, arg)?;
                    let fmt = self.string_global("%lld\n");
                    let value = self.temp();
                    out.line(format!(
                        "{} = call i32 (ptr, ...) @printf(ptr {}, i64 {})",
                        value, fmt, text
                    ));
                }
                SemanticType::Float => {
                    let text = self.emit_expression(out, arg)?;
                    let fmt = self.string_global("%g\n");
                    let value = self.temp();
                    out.line(format!(
                        "{} = call i32 (ptr, ...) @printf(ptr {}, double {})",
                        value, fmt, text
                    ));
                }
                SemanticType::Str => {
                    let text = self.emit_expression(out, arg)?;
                    let fmt = self.string_global("%s\n");
                    let value = self.temp();
                    out.line(format!(
                        "{} = call i32 (ptr, ...) @printf(ptr {}, ptr {})",
                        value, fmt, text
                    ));
                }
                SemanticType::Bool => {
                    let text = self.emit_expression(out, arg)?;
                    let true_str = self.string_global("True\n");
                    let false_str = self.string_global("False\n");
                    let chosen = self.temp();
                    out.line(format!(
                        "{} = select i1 {}, ptr {}, ptr {}",
                        chosen, text, true_str, false_str
                    ));
                    let value = self.temp();
                    out.line(format!(
                        "{} = call i32 (ptr, ...) @printf(ptr {})",
                        value, chosen
                    ));
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
        Ok("0".to_string())
    }
}

/// Collects every local binding (and loop variable) with its semantic
/// type, so the entry block can alloca one slot per local
fn collect_locals(body: &[Statement], locals: &mut Vec<(String, SemanticType)>) {
    for stmt in body {
        match stmt {
            Statement::AnnAssign(ann) => {
                if let Expression::Variable(var) = &ann.target {
                    locals.push((var.name.clone(), ann.annotation.clone()));
                }
            }
            Statement::Assign(assign) => {
                if let Expression::Variable(var) = &assign.target {
                    locals.push((var.name.clone(), var.ty.clone()));
                }
            }
            Statement::If(if_stmt) => {
                collect_locals(&if_stmt.then_branch, locals);
                collect_locals(&if_stmt.else_branch, locals);
            }
            Statement::While(while_stmt) => collect_locals(&while_stmt.body, locals),
            Statement::For(for_stmt) => {
                if let Some(name) = for_stmt.target.single_name() {
                    let elem = for_stmt
                        .iterable
                        .ty()
                        .iteration_element()
                        .unwrap_or(SemanticType::Int);
                    locals.push((name.to_string(), elem));
                }
                collect_locals(&for_stmt.body, locals);
            }
            _ => {}
        }
    }
}

fn format_double(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Escapes text into the LLVM c"..." constant syntax, with terminator
fn encode_c_string(text: &str) -> String {
    let mut out = String::new();
    for byte in text.bytes() {
        match byte {
            b'\\' => out.push_str("\\5C"),
            b'"' => out.push_str("\\22"),
            b'\n' => out.push_str("\\0A"),
            b'\t' => out.push_str("\\09"),
            b'\r' => out.push_str("\\0D"),
            0x20..=0x7E => out.push(byte as char),
            other => out.push_str(&format!("\\{:02X}", other)),
        }
    }
    out.push_str("\\00");
    out
}
