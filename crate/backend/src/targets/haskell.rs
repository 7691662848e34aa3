//! Haskell converter
//!
//! Emits pure function definitions: statement sequences become nested
//! `let`/`if` expressions, accumulation loops become folds, append-build
//! loops become maps, and comprehensions map onto native list
//! comprehensions. Mutation that has no pure rendering (general loops
//! over mutable state, IO outside `main`) is rejected with a clear
//! diagnostic rather than translated badly.

use crate::converter::TargetConverter;
use crate::generated::GeneratedOutput;
use crate::loops::{classify, BodyPattern, IterationSource};
use crate::naming::NamingPolicy;
use crate::writer::FormatWriter;
use mgen_error::{CompileResult, ErrorCode, TranslateError};
use mgen_ir::SourceLocation;
use mgen_ir::ast::{
    BinaryOperator, BindingTarget, CompareOperator, Declaration, Expression, ForStatement,
    FunctionDef, LiteralValue, Module, Statement, UnaryOperator,
};
use mgen_shared::CompilationContext;
use mgen_types::{SemanticType, Target};

pub struct HaskellConverter;

impl TargetConverter for HaskellConverter {
    fn target(&self) -> Target {
        Target::Haskell
    }

    fn convert(
        &self,
        module: &Module,
        context: &mut CompilationContext,
        stem: &str,
    ) -> CompileResult<GeneratedOutput> {
        let _ = context;
        let mut emitter = HaskellEmitter::new();
        let text = emitter.emit_module(module);
        if emitter.errors.is_empty() {
            Ok(GeneratedOutput::single(format!("{}.hs", stem), text))
        } else {
            Err(emitter.errors)
        }
    }
}

struct HaskellEmitter {
    naming: NamingPolicy,
    errors: Vec<TranslateError>,
    uses_map: bool,
    uses_set: bool,
    uses_char: bool,
    uses_list: bool,
    uses_bits: bool,
}

impl HaskellEmitter {
    fn new() -> Self {
        HaskellEmitter {
            naming: NamingPolicy::for_target(Target::Haskell),
            errors: Vec::new(),
            uses_map: false,
            uses_set: false,
            uses_char: false,
            uses_list: false,
            uses_bits: false,
        }
    }

    fn error(&mut self, code: ErrorCode, message: String, location: SourceLocation) {
        self.errors.push(TranslateError::new(code, message, location));
    }

    fn emit_module(&mut self, module: &Module) -> String {
        let mut body = FormatWriter::new();

        for decl in &module.declarations {
            match decl {
                Declaration::Function(func) if func.name == "main" => {
                    self.emit_main(&mut body, func)
                }
                Declaration::Function(func) => self.emit_function(&mut body, func),
                Declaration::GlobalVar(var) => {
                    if let Some(hs_ty) = self.hs_type(&var.annotation, var.location) {
                        let name = self.naming.escape(&var.name);
                        let value = self.expr_or_error(&var.value);
                        body.line(format!("{} :: {}", name, hs_ty));
                        body.line(format!("{} = {}", name, value));
                        body.blank();
                    }
                }
                Declaration::Class(class) => {
                    self.error(
                        ErrorCode::UnsupportedFeature,
                        "classes are not supported by the haskell target".to_string(),
                        class.location,
                    );
                }
                Declaration::Import(_) => {}
            }
        }

        let mut out = FormatWriter::new();
        out.line("module Main where");
        out.blank();
        if self.uses_bits {
            out.line("import Data.Bits");
        }
        if self.uses_char {
            out.line("import Data.Char (toLower, toUpper)");
        }
        if self.uses_list {
            out.line("import Data.List (isPrefixOf, isSuffixOf)");
        }
        if self.uses_map {
            out.line("import qualified Data.Map as Map");
        }
        if self.uses_set {
            out.line("import qualified Data.Set as Set");
        }
        if self.uses_bits || self.uses_char || self.uses_list || self.uses_map || self.uses_set {
            out.blank();
        }
        out.raw(body.finish());

        // A Main module must export main
        if module.function("main").is_none() {
            out.line("main :: IO ()");
            out.line("main = return ()");
        }
        out.finish()
    }

    // ----- types -----

    fn hs_type(&mut self, ty: &SemanticType, location: SourceLocation) -> Option<String> {
        let mapped = match ty {
            SemanticType::Int => "Int".to_string(),
            SemanticType::Float => "Double".to_string(),
            SemanticType::Bool => "Bool".to_string(),
            SemanticType::Str => "String".to_string(),
            SemanticType::Void => "()".to_string(),
            SemanticType::List(elem) => format!("[{}]", self.hs_type(elem, location)?),
            SemanticType::Dict(key, value) => {
                self.uses_map = true;
                format!(
                    "(Map.Map {} {})",
                    self.hs_type(key, location)?,
                    self.hs_type(value, location)?
                )
            }
            SemanticType::Set(elem) => {
                self.uses_set = true;
                format!("(Set.Set {})", self.hs_type(elem, location)?)
            }
            other => {
                self.error(
                    ErrorCode::UnsupportedFeature,
                    format!("the haskell target cannot represent the type '{}'", other),
                    location,
                );
                return None;
            }
        };
        Some(mapped)
    }

    // ----- functions -----

    fn emit_function(&mut self, out: &mut FormatWriter, func: &FunctionDef) {
        let name = self.naming.escape(&func.name);

        let mut signature_parts = Vec::new();
        for param in func.value_parameters() {
            match self.hs_type(&param.annotation, param.location) {
                Some(ty) => signature_parts.push(ty),
                None => return,
            }
        }
        let Some(ret) = self.hs_type(&func.return_type, func.location) else {
            return;
        };
        signature_parts.push(ret);

        let params: Vec<String> = func
            .value_parameters()
            .iter()
            .map(|p| self.naming.escape(&p.name))
            .collect();

        match self.translate_body(&func.body, func.location) {
            Ok(body_expr) => {
                out.line(format!("{} :: {}", name, signature_parts.join(" -> ")));
                out.line(format!("{} {} = {}", name, params.join(" "), body_expr));
                out.blank();
            }
            Err(error) => self.errors.push(error),
        }
    }

    /// `main` is the one place IO is allowed: prints become putStrLn
    /// lines of a do block
    fn emit_main(&mut self, out: &mut FormatWriter, func: &FunctionDef) {
        out.line("main :: IO ()");
        out.line("main = do");
        out.indent();
        let mut emitted = false;
        for stmt in &func.body {
            match stmt {
                Statement::Expression(expr_stmt) => {
                    if let Expression::Call(call) = &expr_stmt.expression {
                        if call.callee_name() == Some("print") {
                            for arg in &call.arguments {
                                let line = self.print_line(arg);
                                out.line(line);
                                emitted = true;
                            }
                            continue;
                        }
                    }
                    let text = self.expr_or_error(&expr_stmt.expression);
                    out.line(format!("_ <- return ({})", text));
                    emitted = true;
                }
                Statement::AnnAssign(ann) => {
                    if let (Expression::Variable(var), Some(value)) = (&ann.target, &ann.value) {
                        let text = self.expr_or_error(value);
                        out.line(format!(
                            "let {} = {}",
                            self.naming.escape(&var.name),
                            text
                        ));
                        emitted = true;
                    }
                }
                Statement::Assign(assign) => {
                    if let Expression::Variable(var) = &assign.target {
                        let text = self.expr_or_error(&assign.value);
                        out.line(format!(
                            "let {} = {}",
                            self.naming.escape(&var.name),
                            text
                        ));
                        emitted = true;
                    }
                }
                Statement::Return(_) | Statement::Pass(_) => {}
                other => {
                    self.error(
                        ErrorCode::GenerationFailure,
                        "this statement cannot be expressed in main's do block".to_string(),
                        statement_location(other),
                    );
                }
            }
        }
        if !emitted {
            out.line("return ()");
        }
        out.dedent();
        out.blank();
    }

    fn print_line(&mut self, arg: &Expression) -> String {
        let text = self.expr_or_error(arg);
        match arg.ty() {
            SemanticType::Str => format!("putStrLn ({})", text),
            SemanticType::Bool => {
                format!("putStrLn (if {} then \"True\" else \"False\")", text)
            }
            _ => format!("print ({})", text),
        }
    }

    // ----- statement-to-expression translation -----

    /// Translates a statement sequence into one pure expression
    ///
    /// Recognized shapes: terminal returns, if/elif chains whose branches
    /// return, single bindings (which become shadowing lets), fold-able
    /// accumulation loops, and append-build loops. Everything else is
    /// mutation the pure target cannot express.
    fn translate_body(
        &mut self,
        statements: &[Statement],
        location: SourceLocation,
    ) -> Result<String, TranslateError> {
        let Some((first, rest)) = statements.split_first() else {
            return Ok("()".to_string());
        };

        match first {
            Statement::Return(ret) => {
                let value = match &ret.value {
                    Some(Expression::Literal(lit)) if lit.value == LiteralValue::None => {
                        "()".to_string()
                    }
                    Some(value) => self.emit_expression(value)?,
                    None => "()".to_string(),
                };
                Ok(value)
            }
            Statement::Pass(_) => self.translate_body(rest, location),
            Statement::AnnAssign(ann) => {
                let Expression::Variable(var) = &ann.target else {
                    return Err(self.pure_error(ann.location));
                };
                let value = match &ann.value {
                    Some(value) => self.emit_expression(value)?,
                    None => return Err(self.pure_error(ann.location)),
                };
                let tail = self.translate_body(rest, location)?;
                Ok(format!(
                    "let {} = {} in {}",
                    self.naming.escape(&var.name),
                    value,
                    tail
                ))
            }
            Statement::Assign(assign) => {
                let Expression::Variable(var) = &assign.target else {
                    return Err(self.pure_error(assign.location));
                };
                let value = self.emit_expression(&assign.value)?;
                let tail = self.translate_body(rest, location)?;
                Ok(format!(
                    "let {} = {} in {}",
                    self.naming.escape(&var.name),
                    value,
                    tail
                ))
            }
            Statement::AugAssign(aug) => {
                let Expression::Variable(var) = &aug.target else {
                    return Err(self.pure_error(aug.location));
                };
                let value = self.emit_expression(&aug.value)?;
                let name = self.naming.escape(&var.name);
                let op = self.binary_operator_text(aug.operator, aug.target.ty())?;
                let tail = self.translate_body(rest, location)?;
                Ok(format!(
                    "let {} = {} {} {} in {}",
                    name, name, op, value, tail
                ))
            }
            Statement::If(if_stmt) => {
                let condition = self.emit_expression(&if_stmt.condition)?;
                if all_paths_return(&if_stmt.then_branch) {
                    let then_expr = self.translate_body(&if_stmt.then_branch, if_stmt.location)?;
                    let else_statements: Vec<Statement> = if_stmt
                        .else_branch
                        .iter()
                        .chain(rest)
                        .cloned()
                        .collect();
                    let else_expr = self.translate_body(&else_statements, if_stmt.location)?;
                    Ok(format!(
                        "if {} then {} else {}",
                        condition, then_expr, else_expr
                    ))
                } else {
                    Err(self.pure_error(if_stmt.location))
                }
            }
            Statement::For(for_stmt) => {
                let folded = self.translate_fold_loop(for_stmt)?;
                let tail = self.translate_body(rest, location)?;
                Ok(format!("{} in {}", folded, tail))
            }
            other => Err(self.pure_error(statement_location(other))),
        }
    }

    /// A fold-able loop as a shadowing let binding (without the `in`)
    fn translate_fold_loop(
        &mut self,
        for_stmt: &ForStatement,
    ) -> Result<String, TranslateError> {
        let shape = classify(for_stmt);
        let source = self.iteration_source_text(&shape.source, for_stmt)?;
        let Some(var) = for_stmt.target.single_name() else {
            return Err(self.pure_error(for_stmt.location));
        };
        let var = self.naming.escape(var);

        match shape.body {
            BodyPattern::Accumulate {
                accumulator,
                operator,
                value,
            } => {
                let acc = self.naming.escape(accumulator);
                let value_text = self.emit_expression(value)?;
                let op = self.binary_operator_text(operator, value.ty())?;
                Ok(format!(
                    "let {acc} = foldl (\\{acc} {var} -> {acc} {op} {value_text}) {acc} {source}"
                ))
            }
            BodyPattern::AppendBuild { list, element } => {
                let list = self.naming.escape(list);
                let element_text = self.emit_expression(element)?;
                Ok(format!(
                    "let {list} = {list} ++ map (\\{var} -> {element_text}) {source}"
                ))
            }
            _ => Err(self.pure_error(for_stmt.location)),
        }
    }

    fn iteration_source_text(
        &mut self,
        source: &IterationSource<'_>,
        for_stmt: &ForStatement,
    ) -> Result<String, TranslateError> {
        match source {
            IterationSource::Range(args) => self.range_text(args, for_stmt.location),
            IterationSource::Container(iterable) => {
                let text = self.emit_expression(iterable)?;
                Ok(match iterable.ty() {
                    SemanticType::Set(_) => format!("(Set.toList {})", text),
                    SemanticType::Dict(_, _) => format!("(Map.keys {})", text),
                    _ => text,
                })
            }
        }
    }

    fn range_text(
        &mut self,
        args: &[Expression],
        location: SourceLocation,
    ) -> Result<String, TranslateError> {
        match args {
            [stop] => {
                let stop = self.emit_expression(stop)?;
                Ok(format!("[0 .. {} - 1]", stop))
            }
            [start, stop] => {
                let start = self.emit_expression(start)?;
                let stop = self.emit_expression(stop)?;
                Ok(format!("[{} .. {} - 1]", start, stop))
            }
            [start, stop, step] => {
                let start = self.emit_expression(start)?;
                let stop = self.emit_expression(stop)?;
                let step = self.emit_expression(step)?;
                // Arithmetic sequence; works for negative steps as well
                Ok(format!(
                    "(takeWhile (\\mgenI -> if {step} > 0 then mgenI < {stop} else mgenI > {stop}) (iterate (+ {step}) {start}))"
                ))
            }
            _ => Err(TranslateError::new(
                ErrorCode::GenerationFailure,
                "range() takes 1 to 3 arguments".to_string(),
                location,
            )),
        }
    }

    fn pure_error(&self, location: SourceLocation) -> TranslateError {
        TranslateError::with_suggestion(
            ErrorCode::GenerationFailure,
            "this statement cannot be expressed in pure form for the haskell target".to_string(),
            location,
            "restructure the function around returns, folds, or comprehensions".to_string(),
        )
    }

    // ----- expressions -----

    fn expr_or_error(&mut self, expr: &Expression) -> String {
        match self.emit_expression(expr) {
            Ok(text) => text,
            Err(error) => {
                self.errors.push(error);
                "undefined".to_string()
            }
        }
    }

    fn binary_operator_text(
        &mut self,
        operator: BinaryOperator,
        operand_ty: &SemanticType,
    ) -> Result<&'static str, TranslateError> {
        let ints = matches!(operand_ty, SemanticType::Int);
        Ok(match operator {
            BinaryOperator::Add if matches!(operand_ty, SemanticType::Str) => "++",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::FloorDivide => "`div`",
            BinaryOperator::Modulo => "`mod`",
            BinaryOperator::Power if ints => "^",
            BinaryOperator::Power => "**",
            BinaryOperator::BitAnd => {
                self.uses_bits = true;
                ".&."
            }
            BinaryOperator::BitOr => {
                self.uses_bits = true;
                ".|."
            }
            BinaryOperator::BitXor => {
                self.uses_bits = true;
                "`xor`"
            }
            BinaryOperator::ShiftLeft => {
                self.uses_bits = true;
                "`shiftL`"
            }
            BinaryOperator::ShiftRight => {
                self.uses_bits = true;
                "`shiftR`"
            }
        })
    }

    fn emit_expression(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Int(value) if *value < 0 => format!("({})", value),
                LiteralValue::Int(value) => format!("{}", value),
                LiteralValue::Float(value) => format_float(*value),
                LiteralValue::Bool(value) => if *value { "True" } else { "False" }.to_string(),
                LiteralValue::Str(value) => format!("{:?}", value),
                LiteralValue::None => "()".to_string(),
            }),
            Expression::Variable(var) => Ok(self.naming.escape(&var.name)),
            Expression::Binary(bin) => {
                let left = self.emit_expression(&bin.left)?;
                let right = self.emit_expression(&bin.right)?;
                // True division needs Int operands lifted to Double
                if matches!(bin.operator, BinaryOperator::Divide)
                    && matches!(bin.left.ty(), SemanticType::Int)
                {
                    return Ok(format!(
                        "(fromIntegral ({}) / fromIntegral ({}))",
                        left, right
                    ));
                }
                let op = self.binary_operator_text(bin.operator, bin.left.ty())?;
                Ok(format!("({} {} {})", left, op, right))
            }
            Expression::Unary(unary) => {
                let operand = self.emit_expression(&unary.operand)?;
                Ok(match unary.operator {
                    UnaryOperator::Negate => format!("(negate {})", operand),
                    UnaryOperator::Not => format!("(not {})", operand),
                    UnaryOperator::Invert => {
                        self.uses_bits = true;
                        format!("(complement {})", operand)
                    }
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
                        format!("(not {})", text)
                    } else {
                        text
                    });
                }
                let left = self.emit_expression(&cmp.left)?;
                let right = self.emit_expression(&cmp.right)?;
                let op = match cmp.operator {
                    CompareOperator::Equal => "==",
                    CompareOperator::NotEqual => "/=",
                    CompareOperator::Less => "<",
                    CompareOperator::LessEqual => "<=",
                    CompareOperator::Greater => ">",
                    CompareOperator::GreaterEqual => ">=",
                    _ => unreachable!("membership handled above"),
                };
                Ok(format!("({} {} {})", left, op, right))
            }
            Expression::Call(call) => self.emit_call(call),
            Expression::Subscript(sub) => {
                let object = self.emit_expression(&sub.object)?;
                let index = self.emit_expression(&sub.index)?;
                match sub.object.ty() {
                    SemanticType::Dict(_, _) => {
                        self.uses_map = true;
                        Ok(format!("(({}) Map.! ({}))", object, index))
                    }
                    _ => Ok(format!("(({}) !! ({}))", object, index)),
                }
            }
            Expression::ListDisplay(list) => {
                let elems: Result<Vec<String>, TranslateError> =
                    list.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("[{}]", elems?.join(", ")))
            }
            Expression::SetDisplay(set) => {
                self.uses_set = true;
                let elems: Result<Vec<String>, TranslateError> =
                    set.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("(Set.fromList [{}])", elems?.join(", ")))
            }
            Expression::DictDisplay(dict) => {
                self.uses_map = true;
                let mut pairs = Vec::new();
                for (key, value) in dict.keys.iter().zip(&dict.values) {
                    pairs.push(format!(
                        "({}, {})",
                        self.emit_expression(key)?,
                        self.emit_expression(value)?
                    ));
                }
                Ok(format!("(Map.fromList [{}])", pairs.join(", ")))
            }
            Expression::ListComp(comp) => {
                let element = self.emit_expression(&comp.element)?;
                let clause = self.comprehension_clause(&comp.generator)?;
                Ok(format!("[{} | {}]", element, clause))
            }
            Expression::SetComp(comp) => {
                self.uses_set = true;
                let element = self.emit_expression(&comp.element)?;
                let clause = self.comprehension_clause(&comp.generator)?;
                Ok(format!("(Set.fromList [{} | {}])", element, clause))
            }
            Expression::DictComp(comp) => {
                self.uses_map = true;
                let key = self.emit_expression(&comp.key)?;
                let value = self.emit_expression(&comp.value)?;
                let clause = self.comprehension_clause(&comp.generator)?;
                Ok(format!(
                    "(Map.fromList [({}, {}) | {}])",
                    key, value, clause
                ))
            }
            Expression::TupleDisplay(tuple) => {
                let elems: Result<Vec<String>, TranslateError> =
                    tuple.elements.iter().map(|e| self.emit_expression(e)).collect();
                Ok(format!("({})", elems?.join(", ")))
            }
            Expression::Attribute(attr) => Err(TranslateError::new(
                ErrorCode::UnsupportedFeature,
                "attribute access is not supported by the haskell target".to_string(),
                attr.location,
            )),
        }
    }

    fn comprehension_clause(
        &mut self,
        generator: &mgen_ir::ast::Comprehension,
    ) -> Result<String, TranslateError> {
        let target = match &generator.target {
            BindingTarget::Name(name) => self.naming.escape(name),
            BindingTarget::Pair(a, b) => {
                format!("({}, {})", self.naming.escape(a), self.naming.escape(b))
            }
        };
        let source = match generator.iterable.as_ref() {
            Expression::Call(call) if call.callee_name() == Some("range") => {
                self.range_text(&call.arguments, generator.iterable.location())?
            }
            Expression::Call(call)
                if call.method_parts().is_some_and(|(_, m)| m == "items") =>
            {
                self.uses_map = true;
                let (receiver, _) = call.method_parts().expect("matched above");
                let text = self.emit_expression(receiver)?;
                format!("(Map.toList {})", text)
            }
            other => {
                let text = self.emit_expression(other)?;
                match other.ty() {
                    SemanticType::Set(_) => format!("(Set.toList {})", text),
                    SemanticType::Dict(_, _) => format!("(Map.keys {})", text),
                    _ => text,
                }
            }
        };
        let mut clause = format!("{} <- {}", target, source);
        if let Some(condition) = &generator.condition {
            let cond = self.emit_expression(condition)?;
            clause.push_str(&format!(", {}", cond));
        }
        Ok(clause)
    }

    fn emit_membership(
        &mut self,
        cmp: &mgen_ir::ast::ComparisonExpr,
    ) -> Result<String, TranslateError> {
        let needle = self.emit_expression(&cmp.left)?;
        let haystack = self.emit_expression(&cmp.right)?;
        match cmp.right.ty() {
            SemanticType::Dict(_, _) => {
                self.uses_map = true;
                Ok(format!("(Map.member ({}) {})", needle, haystack))
            }
            SemanticType::Set(_) => {
                self.uses_set = true;
                Ok(format!("(Set.member ({}) {})", needle, haystack))
            }
            SemanticType::List(_) => Ok(format!("(elem ({}) {})", needle, haystack)),
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
            "len" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Dict(_, _) => {
                        self.uses_map = true;
                        format!("(Map.size {})", arg)
                    }
                    SemanticType::Set(_) => {
                        self.uses_set = true;
                        format!("(Set.size {})", arg)
                    }
                    _ => format!("(length {})", arg),
                });
            }
            "abs" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(format!("(abs {})", arg));
            }
            "min" | "max" => {
                if call.arguments.len() == 1 {
                    let arg = self.emit_expression(&call.arguments[0])?;
                    return Ok(format!("({}imum {})", name, arg));
                }
                let a = self.emit_expression(&call.arguments[0])?;
                let b = self.emit_expression(&call.arguments[1])?;
                return Ok(format!("({} {} {})", name, a, b));
            }
            "sum" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(format!("(sum {})", arg));
            }
            "str" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(format!("(show {})", arg));
            }
            "int" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Float => format!("(truncate {})", arg),
                    SemanticType::Str => format!("(read {} :: Int)", arg),
                    _ => arg,
                });
            }
            "float" => {
                let arg = self.emit_expression(&call.arguments[0])?;
                return Ok(match call.arguments[0].ty() {
                    SemanticType::Int => format!("(fromIntegral {})", arg),
                    _ => arg,
                });
            }
            "list" => return Ok("[]".to_string()),
            "set" => {
                self.uses_set = true;
                return Ok("Set.empty".to_string());
            }
            "dict" => {
                self.uses_map = true;
                return Ok("Map.empty".to_string());
            }
            "print" => {
                return Err(TranslateError::with_suggestion(
                    ErrorCode::GenerationFailure,
                    "IO effects are only supported in main for the haskell target".to_string(),
                    call.location,
                    "move the print into main".to_string(),
                ));
            }
            "range" => {
                return self.range_text(&call.arguments, call.location);
            }
            _ => {}
        }

        let args: Result<Vec<String>, TranslateError> = call
            .arguments
            .iter()
            .map(|a| Ok(format!("({})", self.emit_expression(a)?)))
            .collect();
        Ok(format!(
            "({} {})",
            self.naming.escape(name),
            args?.join(" ")
        ))
    }

    fn emit_method_call(
        &mut self,
        call: &mgen_ir::ast::CallExpr,
        receiver: &Expression,
        method: &str,
    ) -> Result<String, TranslateError> {
        let receiver_ty = receiver.ty().clone();
        let recv = self.emit_expression(receiver)?;

        match (&receiver_ty, method) {
            (SemanticType::Dict(_, _), "get") => {
                self.uses_map = true;
                let key = self.emit_expression(&call.arguments[0])?;
                Ok(format!(
                    "(Map.findWithDefault {} ({}) {})",
                    default_for(&call.ty),
                    key,
                    recv
                ))
            }
            (SemanticType::Dict(_, _), "keys") => {
                self.uses_map = true;
                Ok(format!("(Map.keys {})", recv))
            }
            (SemanticType::Dict(_, _), "values") => {
                self.uses_map = true;
                Ok(format!("(Map.elems {})", recv))
            }
            (SemanticType::Set(_), "union") => {
                self.uses_set = true;
                let other = self.emit_expression(&call.arguments[0])?;
                Ok(format!("(Set.union {} {})", recv, other))
            }
            (SemanticType::Set(_), "intersection") => {
                self.uses_set = true;
                let other = self.emit_expression(&call.arguments[0])?;
                Ok(format!("(Set.intersection {} {})", recv, other))
            }
            (SemanticType::Set(_), "difference") => {
                self.uses_set = true;
                let other = self.emit_expression(&call.arguments[0])?;
                Ok(format!("(Set.difference {} {})", recv, other))
            }
            (SemanticType::Str, "upper") => {
                self.uses_char = true;
                Ok(format!("(map toUpper {})", recv))
            }
            (SemanticType::Str, "lower") => {
                self.uses_char = true;
                Ok(format!("(map toLower {})", recv))
            }
            (SemanticType::Str, "startswith") => {
                self.uses_list = true;
                let prefix = self.emit_expression(&call.arguments[0])?;
                Ok(format!("(({}) `isPrefixOf` ({}))", prefix, recv))
            }
            (SemanticType::Str, "endswith") => {
                self.uses_list = true;
                let suffix = self.emit_expression(&call.arguments[0])?;
                Ok(format!("(({}) `isSuffixOf` ({}))", suffix, recv))
            }
            _ => Err(TranslateError::with_suggestion(
                ErrorCode::UnsupportedMethod,
                format!(
                    "method '{}' on '{}' is not implemented for the haskell target",
                    method, receiver_ty
                ),
                call.location,
                "mutating methods have no pure rendering; restructure around folds".to_string(),
            )),
        }
    }
}

/// Check if every control path through the block ends in a return
fn all_paths_return(block: &[Statement]) -> bool {
    match block.last() {
        Some(Statement::Return(_)) => true,
        Some(Statement::If(if_stmt)) => {
            !if_stmt.else_branch.is_empty()
                && all_paths_return(&if_stmt.then_branch)
                && all_paths_return(&if_stmt.else_branch)
        }
        _ => false,
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

fn default_for(ty: &SemanticType) -> &'static str {
    match ty {
        SemanticType::Int => "0",
        SemanticType::Float => "0.0",
        SemanticType::Bool => "False",
        SemanticType::Str => "\"\"",
        _ => "undefined",
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
