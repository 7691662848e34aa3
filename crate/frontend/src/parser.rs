use crate::token::{Token, TokenKind};
use mgen_error::{CompileResult, ErrorCode, TranslateError};
use mgen_ir::SourceLocation;
use mgen_ir::ast::{
    AnnAssignStatement, AssignStatement, AttributeExpr, AugAssignStatement, BinaryExpr,
    BinaryOperator, BindingTarget, BoolOperator, BooleanExpr, CallExpr, ClassDef,
    CompareOperator, ComparisonExpr, Comprehension, Declaration, DictCompExpr, DictExpr,
    Expression, ExpressionStatement, ForStatement, FunctionDef, GlobalVarDecl, IfStatement,
    ImportDecl, ListCompExpr, ListExpr, LiteralExpr, LiteralValue, Module, Parameter,
    ReturnStatement, SetCompExpr, SetExpr, Statement, SubscriptExpr, TupleExpr, UnaryExpr,
    UnaryOperator, VariableExpr, WhileStatement,
};
use mgen_types::{
    SemanticType, TYPE_NAME_BOOL, TYPE_NAME_DICT, TYPE_NAME_FLOAT, TYPE_NAME_INT, TYPE_NAME_LIST,
    TYPE_NAME_SET, TYPE_NAME_STR, TYPE_NAME_TUPLE,
};

/// Parses a token stream into a validated module
///
/// Constructs outside the supported subset are rejected with one
/// `UnsupportedFeature` diagnostic per occurrence; the parser recovers and
/// keeps validating so a single run reports every violation. The returned
/// module contains only nodes of the supported subset.
///
/// ### Arguments
/// * `tokens` - The tokens to parse
///
/// ### Returns
/// The parsed module, or every validation error found in one pass
pub fn parse(tokens: &[Token]) -> CompileResult<Module> {
    let mut parser = Parser::new(tokens);
    parser.parse()
}

/// Parser that converts tokens into the typed AST
struct Parser<'a> {
    /// The tokens being parsed
    tokens: &'a [Token],
    /// Current position in the token list
    current: usize,
    /// Errors collected during parsing
    errors: Vec<TranslateError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parses the whole token stream into a module
    fn parse(&mut self) -> CompileResult<Module> {
        let mut module = Module::default();

        while !self.is_at_end() {
            if self.match_token(TokenKind::Newline) {
                continue;
            }
            // Dedents left behind by error recovery carry no structure
            // at module level
            if self.match_token(TokenKind::Dedent) {
                continue;
            }
            match self.declaration() {
                Ok(Some(decl)) => module.declarations.push(decl),
                Ok(None) => {}
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(module)
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    // ----- token plumbing -----

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(
        &mut self,
        kind: TokenKind,
        code: ErrorCode,
        message: &str,
    ) -> Result<&Token, TranslateError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(TranslateError::new(
                code,
                format!("{}, found '{}'", message, self.describe_current()),
                self.peek().location,
            ))
        }
    }

    fn describe_current(&self) -> String {
        let token = self.peek();
        match token.kind {
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            _ => token.lexeme.clone(),
        }
    }

    fn location(&self) -> SourceLocation {
        self.peek().location
    }

    /// Records a subset violation and keeps parsing
    fn reject(&mut self, message: &str, location: SourceLocation, suggestion: &str) {
        self.errors.push(TranslateError::with_suggestion(
            ErrorCode::UnsupportedFeature,
            message.to_string(),
            location,
            suggestion.to_string(),
        ));
    }

    /// Skips to just past the next Newline (or a block boundary)
    fn skip_logical_line(&mut self) {
        while !self.is_at_end() {
            if self.match_token(TokenKind::Newline) {
                return;
            }
            if self.check(TokenKind::Dedent) {
                return;
            }
            self.advance();
        }
    }

    /// Skips a whole suite: the rest of the header line and, if an
    /// indented block follows, everything up to its matching Dedent
    fn skip_suite(&mut self) {
        self.skip_logical_line();
        if !self.match_token(TokenKind::Indent) {
            return;
        }
        let mut depth = 1;
        while !self.is_at_end() && depth > 0 {
            match self.advance().kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth -= 1,
                _ => {}
            }
        }
    }

    /// Recovers from a structural parse error by skipping to the next
    /// statement boundary
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Newline => {
                    self.advance();
                    return;
                }
                TokenKind::Dedent => {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ----- declarations -----

    /// Parses one top-level declaration
    ///
    /// Returns `Ok(None)` when a rejected construct was recorded and
    /// skipped, so the caller simply moves on to the next declaration.
    fn declaration(&mut self) -> Result<Option<Declaration>, TranslateError> {
        match self.peek_kind() {
            TokenKind::At => {
                let location = self.location();
                self.reject(
                    "decorators are not supported",
                    location,
                    "remove the decorator and call the wrapper explicitly",
                );
                self.skip_logical_line();
                Ok(None)
            }
            TokenKind::Async => {
                let location = self.location();
                self.reject(
                    "asynchronous function definitions are not supported",
                    location,
                    "use a synchronous function definition",
                );
                self.advance();
                if self.check(TokenKind::Def) {
                    // Parse the definition for further validation, then
                    // discard it: an async def never reaches generation.
                    let _ = self.function_def()?;
                }
                Ok(None)
            }
            TokenKind::Def => Ok(Some(Declaration::Function(self.function_def()?))),
            TokenKind::Class => self.class_def(),
            TokenKind::Import | TokenKind::From => Ok(Some(self.import_decl()?)),
            TokenKind::Try | TokenKind::With | TokenKind::Raise => {
                let location = self.location();
                self.reject(
                    &format!("'{}' statements are not supported", self.peek().lexeme),
                    location,
                    "restructure the code without exception or context-manager constructs",
                );
                self.skip_suite();
                Ok(None)
            }
            TokenKind::Identifier if self.peek_next_kind() == TokenKind::Colon => {
                Ok(Some(self.global_var()?))
            }
            _ => Err(TranslateError::with_suggestion(
                ErrorCode::InvalidSyntax,
                format!(
                    "only declarations are allowed at module level, found '{}'",
                    self.describe_current()
                ),
                self.location(),
                "move executable statements into a function",
            )),
        }
    }

    /// Parses a function definition
    fn function_def(&mut self) -> Result<FunctionDef, TranslateError> {
        let location = self.location();
        self.expect(TokenKind::Def, ErrorCode::InvalidSyntax, "expected 'def'")?;
        let name = self
            .expect(
                TokenKind::Identifier,
                ErrorCode::ExpectedIdentifier,
                "expected a function name after 'def'",
            )?
            .lexeme
            .clone();

        self.expect(
            TokenKind::LeftParen,
            ErrorCode::InvalidSyntax,
            "expected '(' after the function name",
        )?;
        let parameters = self.parameter_list()?;
        self.expect(
            TokenKind::RightParen,
            ErrorCode::InvalidSyntax,
            "expected ')' after the parameter list",
        )?;

        let return_type = if self.match_token(TokenKind::Arrow) {
            self.annotation()?
        } else {
            SemanticType::Void
        };

        self.expect(
            TokenKind::Colon,
            ErrorCode::ExpectedColon,
            "expected ':' after the function signature",
        )?;
        let body = self.block()?;

        Ok(FunctionDef {
            name,
            parameters,
            return_type,
            body,
            location,
        })
    }

    /// Parses the parameter list of a function definition
    fn parameter_list(&mut self) -> Result<Vec<Parameter>, TranslateError> {
        let mut parameters = Vec::new();

        while !self.check(TokenKind::RightParen) && !self.is_at_end() {
            if self.check(TokenKind::Star) || self.check(TokenKind::DoubleStar) {
                let location = self.location();
                let what = if self.check(TokenKind::Star) {
                    "*args parameters are not supported"
                } else {
                    "**kwargs parameters are not supported"
                };
                self.reject(
                    what,
                    location,
                    "declare each parameter explicitly with an annotation",
                );
                self.advance();
                if self.check(TokenKind::Identifier) {
                    self.advance();
                }
            } else {
                let param = self.parameter(parameters.is_empty())?;
                parameters.push(param);
            }

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(parameters)
    }

    /// Parses a single parameter
    ///
    /// `self` as the first parameter is exempt from the annotation
    /// requirement; every other parameter must carry one. Defaults are
    /// outside the subset.
    fn parameter(&mut self, is_first: bool) -> Result<Parameter, TranslateError> {
        let token = self.expect(
            TokenKind::Identifier,
            ErrorCode::ExpectedIdentifier,
            "expected a parameter name",
        )?;
        let name = token.lexeme.clone();
        let location = token.location;

        let annotation = if self.match_token(TokenKind::Colon) {
            self.annotation()?
        } else if is_first && name == "self" {
            SemanticType::Unknown
        } else {
            self.errors.push(TranslateError::with_suggestion(
                ErrorCode::MissingAnnotation,
                format!("parameter '{}' is missing a type annotation", name),
                location,
                "annotate every parameter, e.g. 'n: int'",
            ));
            SemanticType::Unknown
        };

        if self.check(TokenKind::Equal) {
            let eq_location = self.location();
            self.reject(
                "parameter default values are not supported",
                eq_location,
                "require callers to pass the argument explicitly",
            );
            self.advance();
            let _ = self.expression()?;
        }

        Ok(Parameter {
            name,
            annotation,
            location,
        })
    }

    /// Parses a type annotation into a semantic type
    fn annotation(&mut self) -> Result<SemanticType, TranslateError> {
        if self.match_token(TokenKind::None) {
            return Ok(SemanticType::Void);
        }

        let token = self.expect(
            TokenKind::Identifier,
            ErrorCode::ExpectedIdentifier,
            "expected a type annotation",
        )?;
        let name = token.lexeme.clone();

        match name.as_str() {
            TYPE_NAME_INT => Ok(SemanticType::Int),
            TYPE_NAME_FLOAT => Ok(SemanticType::Float),
            TYPE_NAME_BOOL => Ok(SemanticType::Bool),
            TYPE_NAME_STR => Ok(SemanticType::Str),
            "Any" => Ok(SemanticType::Any),
            TYPE_NAME_LIST => {
                if self.match_token(TokenKind::LeftBracket) {
                    let elem = self.annotation()?;
                    self.expect_bracket_close()?;
                    Ok(SemanticType::List(Box::new(elem)))
                } else {
                    Ok(SemanticType::List(Box::new(SemanticType::Unknown)))
                }
            }
            TYPE_NAME_SET => {
                if self.match_token(TokenKind::LeftBracket) {
                    let elem = self.annotation()?;
                    self.expect_bracket_close()?;
                    Ok(SemanticType::Set(Box::new(elem)))
                } else {
                    Ok(SemanticType::Set(Box::new(SemanticType::Unknown)))
                }
            }
            TYPE_NAME_DICT => {
                if self.match_token(TokenKind::LeftBracket) {
                    let key = self.annotation()?;
                    self.expect(
                        TokenKind::Comma,
                        ErrorCode::InvalidSyntax,
                        "expected ',' between dict key and value types",
                    )?;
                    let value = self.annotation()?;
                    self.expect_bracket_close()?;
                    Ok(SemanticType::Dict(Box::new(key), Box::new(value)))
                } else {
                    Ok(SemanticType::Dict(
                        Box::new(SemanticType::Unknown),
                        Box::new(SemanticType::Unknown),
                    ))
                }
            }
            TYPE_NAME_TUPLE => {
                let mut elems = Vec::new();
                if self.match_token(TokenKind::LeftBracket) {
                    loop {
                        elems.push(self.annotation()?);
                        if !self.match_token(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect_bracket_close()?;
                }
                Ok(SemanticType::Tuple(elems))
            }
            "Callable" => {
                self.expect(
                    TokenKind::LeftBracket,
                    ErrorCode::InvalidSyntax,
                    "expected '[' after 'Callable'",
                )?;
                self.expect(
                    TokenKind::LeftBracket,
                    ErrorCode::InvalidSyntax,
                    "expected '[' opening the Callable parameter list",
                )?;
                let mut params = Vec::new();
                while !self.check(TokenKind::RightBracket) {
                    params.push(self.annotation()?);
                    if !self.match_token(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_bracket_close()?;
                self.expect(
                    TokenKind::Comma,
                    ErrorCode::InvalidSyntax,
                    "expected ',' before the Callable return type",
                )?;
                let ret = self.annotation()?;
                self.expect_bracket_close()?;
                Ok(SemanticType::Callable(params, Box::new(ret)))
            }
            _ => Ok(SemanticType::Object(name)),
        }
    }

    fn expect_bracket_close(&mut self) -> Result<(), TranslateError> {
        self.expect(
            TokenKind::RightBracket,
            ErrorCode::InvalidSyntax,
            "expected ']' closing the type annotation",
        )?;
        Ok(())
    }

    /// Parses a class definition
    fn class_def(&mut self) -> Result<Option<Declaration>, TranslateError> {
        let location = self.location();
        self.expect(TokenKind::Class, ErrorCode::InvalidSyntax, "expected 'class'")?;
        let name = self
            .expect(
                TokenKind::Identifier,
                ErrorCode::ExpectedIdentifier,
                "expected a class name after 'class'",
            )?
            .lexeme
            .clone();

        if self.match_token(TokenKind::LeftParen) {
            let mut bases = 0;
            let mut has_metaclass = false;
            while !self.check(TokenKind::RightParen) && !self.is_at_end() {
                if self.check(TokenKind::Identifier) && self.peek().lexeme == "metaclass" {
                    has_metaclass = true;
                }
                if self.check(TokenKind::Identifier) {
                    bases += 1;
                }
                self.advance();
            }
            self.expect(
                TokenKind::RightParen,
                ErrorCode::InvalidSyntax,
                "expected ')' after the class bases",
            )?;
            if has_metaclass {
                self.reject(
                    "metaclasses are not supported",
                    location,
                    "declare the class without a metaclass",
                );
            } else if bases > 1 {
                self.reject(
                    "multiple inheritance is not supported",
                    location,
                    "declare the class without base classes",
                );
            } else if bases == 1 {
                self.reject(
                    "class inheritance is not supported",
                    location,
                    "declare the class without base classes",
                );
            }
        }

        self.expect(
            TokenKind::Colon,
            ErrorCode::ExpectedColon,
            "expected ':' after the class header",
        )?;
        self.expect(
            TokenKind::Newline,
            ErrorCode::InvalidSyntax,
            "expected a newline after the class header",
        )?;
        self.expect(
            TokenKind::Indent,
            ErrorCode::ExpectedIndentedBlock,
            "expected an indented class body",
        )?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.is_at_end() {
            if self.match_token(TokenKind::Newline) {
                continue;
            }
            if self.match_token(TokenKind::Pass) {
                let _ = self.expect(
                    TokenKind::Newline,
                    ErrorCode::InvalidSyntax,
                    "expected a newline after 'pass'",
                );
                continue;
            }
            if self.check(TokenKind::StringLiteral) {
                // Docstring
                self.advance();
                let _ = self.match_token(TokenKind::Newline);
                continue;
            }
            if self.check(TokenKind::Def) {
                methods.push(self.function_def()?);
                continue;
            }
            if self.check(TokenKind::Async) {
                let async_location = self.location();
                self.reject(
                    "asynchronous method definitions are not supported",
                    async_location,
                    "use a synchronous method definition",
                );
                self.advance();
                if self.check(TokenKind::Def) {
                    let _ = self.function_def()?;
                }
                continue;
            }
            return Err(TranslateError::new(
                ErrorCode::InvalidSyntax,
                format!(
                    "class bodies may contain only method definitions, found '{}'",
                    self.describe_current()
                ),
                self.location(),
            ));
        }
        self.match_token(TokenKind::Dedent);

        Ok(Some(Declaration::Class(ClassDef {
            name,
            methods,
            location,
        })))
    }

    /// Parses an import declaration
    fn import_decl(&mut self) -> Result<Declaration, TranslateError> {
        let location = self.location();
        let mut names = Vec::new();

        let module = if self.match_token(TokenKind::From) {
            let module = self.dotted_name()?;
            self.expect(
                TokenKind::Import,
                ErrorCode::InvalidSyntax,
                "expected 'import' after the module path",
            )?;
            loop {
                let name = self
                    .expect(
                        TokenKind::Identifier,
                        ErrorCode::ExpectedIdentifier,
                        "expected an imported name",
                    )?
                    .lexeme
                    .clone();
                names.push(name);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            module
        } else {
            self.expect(TokenKind::Import, ErrorCode::InvalidSyntax, "expected 'import'")?;
            self.dotted_name()?
        };

        let _ = self.expect(
            TokenKind::Newline,
            ErrorCode::InvalidSyntax,
            "expected a newline after the import",
        );

        Ok(Declaration::Import(ImportDecl {
            module,
            names,
            location,
        }))
    }

    fn dotted_name(&mut self) -> Result<String, TranslateError> {
        let mut name = self
            .expect(
                TokenKind::Identifier,
                ErrorCode::ExpectedIdentifier,
                "expected a module name",
            )?
            .lexeme
            .clone();
        while self.match_token(TokenKind::Dot) {
            let part = self.expect(
                TokenKind::Identifier,
                ErrorCode::ExpectedIdentifier,
                "expected a name after '.'",
            )?;
            name.push('.');
            name.push_str(&part.lexeme);
        }
        Ok(name)
    }

    /// Parses a module-level annotated variable
    fn global_var(&mut self) -> Result<Declaration, TranslateError> {
        let token = self.advance();
        let name = token.lexeme.clone();
        let location = token.location;

        if !self.match_token(TokenKind::Colon) {
            return Err(TranslateError::with_suggestion(
                ErrorCode::MissingAnnotation,
                format!("module-level variable '{}' requires a type annotation", name),
                location,
                "annotate the variable, e.g. 'count: int = 0'",
            ));
        }
        let annotation = self.annotation()?;
        self.expect(
            TokenKind::Equal,
            ErrorCode::InvalidSyntax,
            "expected '=' after the variable annotation",
        )?;
        let value = self.expression()?;
        let _ = self.expect(
            TokenKind::Newline,
            ErrorCode::InvalidSyntax,
            "expected a newline after the declaration",
        );

        Ok(Declaration::GlobalVar(GlobalVarDecl {
            name,
            annotation,
            value,
            location,
        }))
    }

    // ----- statements -----

    /// Parses a block: either an indented suite or a single inline
    /// simple statement after the colon
    fn block(&mut self) -> Result<Vec<Statement>, TranslateError> {
        if !self.match_token(TokenKind::Newline) {
            // Inline suite, e.g. `if n <= 1: return n`
            let stmt = self.simple_statement()?;
            let _ = self.expect(
                TokenKind::Newline,
                ErrorCode::InvalidSyntax,
                "expected a newline after the statement",
            );
            return Ok(stmt.into_iter().collect());
        }

        self.expect(
            TokenKind::Indent,
            ErrorCode::ExpectedIndentedBlock,
            "expected an indented block",
        )?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.is_at_end() {
            if self.match_token(TokenKind::Newline) {
                continue;
            }
            match self.statement() {
                Ok(Some(stmt)) => statements.push(stmt),
                Ok(None) => {}
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }
        self.match_token(TokenKind::Dedent);

        Ok(statements)
    }

    /// Parses one statement inside a function body
    ///
    /// Returns `Ok(None)` when a rejected construct was recorded and
    /// skipped.
    fn statement(&mut self) -> Result<Option<Statement>, TranslateError> {
        match self.peek_kind() {
            TokenKind::If => self.if_statement().map(Some),
            TokenKind::While => self.while_statement().map(Some),
            TokenKind::For => self.for_statement().map(Some),
            TokenKind::Try | TokenKind::With => {
                let location = self.location();
                let what = if self.check(TokenKind::Try) {
                    "exception handling is not supported"
                } else {
                    "context-manager statements are not supported"
                };
                self.reject(
                    what,
                    location,
                    "restructure the code to report failures through return values",
                );
                self.skip_suite();
                Ok(None)
            }
            // Clauses dangling from an already-rejected construct
            TokenKind::Except | TokenKind::Finally => {
                self.skip_suite();
                Ok(None)
            }
            TokenKind::Raise => {
                let location = self.location();
                self.reject(
                    "'raise' is not supported",
                    location,
                    "report failures through return values",
                );
                self.skip_logical_line();
                Ok(None)
            }
            TokenKind::Global | TokenKind::Nonlocal => {
                let location = self.location();
                self.reject(
                    &format!("'{}' declarations are not supported", self.peek().lexeme),
                    location,
                    "pass state explicitly through parameters and return values",
                );
                self.skip_logical_line();
                Ok(None)
            }
            TokenKind::Del => {
                let location = self.location();
                self.reject(
                    "'del' is not supported",
                    location,
                    "let bindings go out of scope instead",
                );
                self.skip_logical_line();
                Ok(None)
            }
            TokenKind::Assert => {
                let location = self.location();
                self.reject(
                    "'assert' is not supported",
                    location,
                    "check the condition with an if statement",
                );
                self.skip_logical_line();
                Ok(None)
            }
            TokenKind::Yield => {
                let location = self.location();
                self.reject(
                    "generators are not supported",
                    location,
                    "build and return a list instead of yielding",
                );
                self.skip_logical_line();
                Ok(None)
            }
            TokenKind::Def => {
                let location = self.location();
                self.reject(
                    "nested function definitions are not supported",
                    location,
                    "define the function at module level",
                );
                self.skip_suite();
                Ok(None)
            }
            TokenKind::Async => {
                let location = self.location();
                self.reject(
                    "asynchronous constructs are not supported",
                    location,
                    "use the synchronous form",
                );
                self.advance();
                self.skip_suite();
                Ok(None)
            }
            TokenKind::Import | TokenKind::From => {
                let location = self.location();
                self.reject(
                    "imports inside functions are not supported",
                    location,
                    "move the import to module level",
                );
                self.skip_logical_line();
                Ok(None)
            }
            _ => {
                let stmt = self.simple_statement()?;
                let _ = self.expect(
                    TokenKind::Newline,
                    ErrorCode::InvalidSyntax,
                    "expected a newline after the statement",
                );
                Ok(stmt)
            }
        }
    }

    /// Parses an if statement, folding `elif` chains into the else branch
    fn if_statement(&mut self) -> Result<Statement, TranslateError> {
        self.advance(); // consume 'if' or 'elif'
        self.if_statement_tail()
    }

    fn if_statement_tail(&mut self) -> Result<Statement, TranslateError> {
        let location = self.previous().location;
        let condition = self.expression()?;
        self.expect(
            TokenKind::Colon,
            ErrorCode::ExpectedColon,
            "expected ':' after the condition",
        )?;
        let then_branch = self.block()?;

        let else_branch = if self.check(TokenKind::Elif) {
            self.advance();
            vec![self.if_statement_tail()?]
        } else if self.match_token(TokenKind::Else) {
            self.expect(
                TokenKind::Colon,
                ErrorCode::ExpectedColon,
                "expected ':' after 'else'",
            )?;
            self.block()?
        } else {
            Vec::new()
        };

        Ok(Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
            location,
        }))
    }

    /// Parses a while loop
    fn while_statement(&mut self) -> Result<Statement, TranslateError> {
        let location = self.location();
        self.advance();
        let condition = self.expression()?;
        self.expect(
            TokenKind::Colon,
            ErrorCode::ExpectedColon,
            "expected ':' after the condition",
        )?;
        let body = self.block()?;

        Ok(Statement::While(WhileStatement {
            condition,
            body,
            location,
        }))
    }

    /// Parses a for loop
    fn for_statement(&mut self) -> Result<Statement, TranslateError> {
        let location = self.location();
        self.advance();

        let first = self
            .expect(
                TokenKind::Identifier,
                ErrorCode::ExpectedIdentifier,
                "expected a loop variable after 'for'",
            )?
            .lexeme
            .clone();
        let target = if self.match_token(TokenKind::Comma) {
            let second = self
                .expect(
                    TokenKind::Identifier,
                    ErrorCode::ExpectedIdentifier,
                    "expected a second loop variable after ','",
                )?
                .lexeme
                .clone();
            BindingTarget::Pair(first, second)
        } else {
            BindingTarget::Name(first)
        };

        self.expect(
            TokenKind::In,
            ErrorCode::InvalidSyntax,
            "expected 'in' after the loop variables",
        )?;
        let iterable = self.expression()?;
        self.expect(
            TokenKind::Colon,
            ErrorCode::ExpectedColon,
            "expected ':' after the loop header",
        )?;
        let body = self.block()?;

        Ok(Statement::For(ForStatement {
            target,
            iterable,
            body,
            location,
        }))
    }

    /// Parses a simple (one-line) statement
    ///
    /// Returns `Ok(None)` for rejected constructs discovered at
    /// expression level.
    fn simple_statement(&mut self) -> Result<Option<Statement>, TranslateError> {
        match self.peek_kind() {
            TokenKind::Return => {
                let location = self.location();
                self.advance();
                let value = if self.check(TokenKind::Newline) || self.check(TokenKind::Eof) {
                    None
                } else {
                    Some(self.expression()?)
                };
                Ok(Some(Statement::Return(ReturnStatement { value, location })))
            }
            TokenKind::Pass => {
                let location = self.location();
                self.advance();
                Ok(Some(Statement::Pass(location)))
            }
            TokenKind::Break => {
                let location = self.location();
                self.advance();
                Ok(Some(Statement::Break(location)))
            }
            TokenKind::Continue => {
                let location = self.location();
                self.advance();
                Ok(Some(Statement::Continue(location)))
            }
            _ => self.assignment_or_expression().map(Some),
        }
    }

    /// Parses an assignment, augmented assignment, annotated assignment,
    /// or bare expression statement
    fn assignment_or_expression(&mut self) -> Result<Statement, TranslateError> {
        let location = self.location();
        let expr = self.expression()?;

        if self.match_token(TokenKind::Colon) {
            self.check_assignable(&expr, "annotated assignment")?;
            let annotation = self.annotation()?;
            let value = if self.match_token(TokenKind::Equal) {
                Some(self.expression()?)
            } else {
                None
            };
            return Ok(Statement::AnnAssign(AnnAssignStatement {
                target: expr,
                annotation,
                value,
                location,
            }));
        }

        if self.match_token(TokenKind::Equal) {
            self.check_assignable(&expr, "assignment")?;
            let value = self.expression()?;
            return Ok(Statement::Assign(AssignStatement {
                target: expr,
                value,
                location,
            }));
        }

        if let Some(operator) = self.match_augmented_operator() {
            self.check_assignable(&expr, "augmented assignment")?;
            let value = self.expression()?;
            return Ok(Statement::AugAssign(AugAssignStatement {
                target: expr,
                operator,
                value,
                location,
            }));
        }

        Ok(Statement::Expression(ExpressionStatement {
            expression: expr,
            location,
        }))
    }

    fn match_augmented_operator(&mut self) -> Option<BinaryOperator> {
        let operator = match self.peek_kind() {
            TokenKind::PlusEqual => BinaryOperator::Add,
            TokenKind::MinusEqual => BinaryOperator::Subtract,
            TokenKind::StarEqual => BinaryOperator::Multiply,
            TokenKind::SlashEqual => BinaryOperator::Divide,
            TokenKind::DoubleSlashEqual => BinaryOperator::FloorDivide,
            TokenKind::PercentEqual => BinaryOperator::Modulo,
            _ => return None,
        };
        self.advance();
        Some(operator)
    }

    fn check_assignable(&self, expr: &Expression, what: &str) -> Result<(), TranslateError> {
        match expr {
            Expression::Variable(_) | Expression::Subscript(_) | Expression::Attribute(_) => Ok(()),
            _ => Err(TranslateError::new(
                ErrorCode::InvalidSyntax,
                format!("invalid target for {}", what),
                expr.location(),
            )),
        }
    }

    // ----- expressions -----

    fn expression(&mut self) -> Result<Expression, TranslateError> {
        self.or_expression()
    }

    fn or_expression(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.and_expression()?;
        while self.match_token(TokenKind::Or) {
            let right = self.and_expression()?;
            expr = self.make_boolean(expr, BoolOperator::Or, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.not_expression()?;
        while self.match_token(TokenKind::And) {
            let right = self.not_expression()?;
            expr = self.make_boolean(expr, BoolOperator::And, right);
        }
        Ok(expr)
    }

    fn make_boolean(&self, left: Expression, operator: BoolOperator, right: Expression) -> Expression {
        let location = left.location();
        Expression::Boolean(BooleanExpr {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            ty: SemanticType::Unknown,
            location,
        })
    }

    fn not_expression(&mut self) -> Result<Expression, TranslateError> {
        if self.check(TokenKind::Not) && self.peek_next_kind() != TokenKind::In {
            let location = self.location();
            self.advance();
            let operand = self.not_expression()?;
            return Ok(Expression::Unary(UnaryExpr {
                operator: UnaryOperator::Not,
                operand: Box::new(operand),
                ty: SemanticType::Unknown,
                location,
            }));
        }
        self.comparison()
    }

    fn peek_next_kind(&self) -> TokenKind {
        self.tokens
            .get(self.current + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Parses a comparison; chains are outside the subset
    fn comparison(&mut self) -> Result<Expression, TranslateError> {
        let left = self.bitor_expression()?;

        let operator = match self.peek_kind() {
            TokenKind::EqualEqual => Some(CompareOperator::Equal),
            TokenKind::NotEqual => Some(CompareOperator::NotEqual),
            TokenKind::Less => Some(CompareOperator::Less),
            TokenKind::LessEqual => Some(CompareOperator::LessEqual),
            TokenKind::Greater => Some(CompareOperator::Greater),
            TokenKind::GreaterEqual => Some(CompareOperator::GreaterEqual),
            TokenKind::In => Some(CompareOperator::In),
            TokenKind::Not if self.peek_next_kind() == TokenKind::In => {
                Some(CompareOperator::NotIn)
            }
            TokenKind::Is => {
                let location = self.location();
                self.reject(
                    "identity comparison with 'is' is not supported",
                    location,
                    "compare with '==' instead",
                );
                Some(CompareOperator::Equal)
            }
            _ => None,
        };

        let Some(operator) = operator else {
            return Ok(left);
        };
        let was_is = self.peek_kind() == TokenKind::Is;
        self.advance();
        if operator == CompareOperator::NotIn {
            self.advance(); // the 'in' after 'not'
        }
        if was_is {
            // `is not` reads as a single rejected operator
            self.match_token(TokenKind::Not);
        }

        let right = self.bitor_expression()?;
        let location = left.location();
        let expr = Expression::Comparison(ComparisonExpr {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            ty: SemanticType::Unknown,
            location,
        });

        if matches!(
            self.peek_kind(),
            TokenKind::EqualEqual
                | TokenKind::NotEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
        ) {
            return Err(TranslateError::with_suggestion(
                ErrorCode::InvalidSyntax,
                "comparison chaining is not supported".to_string(),
                self.location(),
                "split the chain into two comparisons joined with 'and'",
            ));
        }

        Ok(expr)
    }

    fn bitor_expression(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.bitxor_expression()?;
        while self.check(TokenKind::Pipe) {
            self.advance();
            let right = self.bitxor_expression()?;
            expr = self.make_binary(expr, BinaryOperator::BitOr, right);
        }
        Ok(expr)
    }

    fn bitxor_expression(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.bitand_expression()?;
        while self.check(TokenKind::Caret) {
            self.advance();
            let right = self.bitand_expression()?;
            expr = self.make_binary(expr, BinaryOperator::BitXor, right);
        }
        Ok(expr)
    }

    fn bitand_expression(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.shift_expression()?;
        while self.check(TokenKind::Ampersand) {
            self.advance();
            let right = self.shift_expression()?;
            expr = self.make_binary(expr, BinaryOperator::BitAnd, right);
        }
        Ok(expr)
    }

    fn shift_expression(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.arith_expression()?;
        loop {
            let operator = match self.peek_kind() {
                TokenKind::ShiftLeft => BinaryOperator::ShiftLeft,
                TokenKind::ShiftRight => BinaryOperator::ShiftRight,
                _ => break,
            };
            self.advance();
            let right = self.arith_expression()?;
            expr = self.make_binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn arith_expression(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.term()?;
        loop {
            let operator = match self.peek_kind() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            expr = self.make_binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.factor()?;
        loop {
            let operator = match self.peek_kind() {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::DoubleSlash => BinaryOperator::FloorDivide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            expr = self.make_binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expression, TranslateError> {
        let operator = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOperator::Negate),
            TokenKind::Tilde => Some(UnaryOperator::Invert),
            _ => None,
        };
        if let Some(operator) = operator {
            let location = self.location();
            self.advance();
            let operand = self.factor()?;
            return Ok(Expression::Unary(UnaryExpr {
                operator,
                operand: Box::new(operand),
                ty: SemanticType::Unknown,
                location,
            }));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expression, TranslateError> {
        let base = self.postfix()?;
        if self.match_token(TokenKind::DoubleStar) {
            let exponent = self.factor()?;
            return Ok(self.make_binary(base, BinaryOperator::Power, exponent));
        }
        Ok(base)
    }

    fn make_binary(&self, left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        let location = left.location();
        Expression::Binary(BinaryExpr {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            ty: SemanticType::Unknown,
            location,
        })
    }

    /// Parses calls, attribute accesses, and subscripts
    fn postfix(&mut self) -> Result<Expression, TranslateError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(TokenKind::Dot) {
                let name_token = self.expect(
                    TokenKind::Identifier,
                    ErrorCode::ExpectedIdentifier,
                    "expected an attribute name after '.'",
                )?;
                let name = name_token.lexeme.clone();
                let location = expr.location();
                expr = Expression::Attribute(AttributeExpr {
                    object: Box::new(expr),
                    name,
                    ty: SemanticType::Unknown,
                    location,
                });
            } else if self.match_token(TokenKind::LeftBracket) {
                let index = self.expression()?;
                self.expect(
                    TokenKind::RightBracket,
                    ErrorCode::InvalidSyntax,
                    "expected ']' after the subscript",
                )?;
                let location = expr.location();
                expr = Expression::Subscript(SubscriptExpr {
                    object: Box::new(expr),
                    index: Box::new(index),
                    ty: SemanticType::Unknown,
                    location,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parses the argument list of a call whose callee is already parsed
    fn finish_call(&mut self, callee: Expression) -> Result<Expression, TranslateError> {
        let location = callee.location();
        let mut arguments = Vec::new();

        while !self.check(TokenKind::RightParen) && !self.is_at_end() {
            if self.check(TokenKind::Star) || self.check(TokenKind::DoubleStar) {
                let star_location = self.location();
                self.reject(
                    "argument unpacking is not supported",
                    star_location,
                    "pass each argument explicitly",
                );
                self.advance();
                continue;
            }

            let arg = self.expression()?;

            if self.check(TokenKind::For) {
                return Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedFeature,
                    "generator expressions are not supported".to_string(),
                    self.location(),
                    "build a list with a list comprehension instead",
                ));
            }
            if self.check(TokenKind::Equal) {
                let eq_location = self.location();
                self.reject(
                    "keyword arguments are not supported",
                    eq_location,
                    "pass arguments positionally",
                );
                self.advance();
                let _ = self.expression()?;
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                continue;
            }

            arguments.push(arg);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect(
            TokenKind::RightParen,
            ErrorCode::InvalidSyntax,
            "expected ')' after the call arguments",
        )?;

        let call = CallExpr {
            function: Box::new(callee),
            arguments,
            ty: SemanticType::Unknown,
            location,
        };

        if let Some(name) = call.callee_name() {
            if name == "eval" || name == "exec" {
                self.reject(
                    &format!("runtime '{}' is not supported", name),
                    location,
                    "express the computation directly in the source",
                );
            }
        }

        Ok(Expression::Call(call))
    }

    /// Parses a primary expression
    fn primary(&mut self) -> Result<Expression, TranslateError> {
        let location = self.location();

        match self.peek_kind() {
            TokenKind::IntLiteral => {
                let token = self.advance();
                let lexeme = token.lexeme.clone();
                let value = lexeme.parse::<i64>().map_err(|_| {
                    TranslateError::new(
                        ErrorCode::InvalidNumberLiteral,
                        format!("integer literal '{}' does not fit in 64 bits", lexeme),
                        location,
                    )
                })?;
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Int(value),
                    ty: SemanticType::Int,
                    location,
                }))
            }
            TokenKind::FloatLiteral => {
                let token = self.advance();
                let lexeme = token.lexeme.clone();
                let value = lexeme.parse::<f64>().map_err(|_| {
                    TranslateError::new(
                        ErrorCode::InvalidNumberLiteral,
                        format!("invalid float literal '{}'", lexeme),
                        location,
                    )
                })?;
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Float(value),
                    ty: SemanticType::Float,
                    location,
                }))
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Str(token.lexeme.clone()),
                    ty: SemanticType::Str,
                    location,
                }))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Bool(token.kind == TokenKind::True),
                    ty: SemanticType::Bool,
                    location,
                }))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::None,
                    ty: SemanticType::Void,
                    location,
                }))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expression::Variable(VariableExpr {
                    name: token.lexeme.clone(),
                    ty: SemanticType::Unknown,
                    location,
                }))
            }
            TokenKind::LeftParen => self.paren_expression(),
            TokenKind::LeftBracket => self.list_display(),
            TokenKind::LeftBrace => self.brace_display(),
            TokenKind::Await => {
                self.advance();
                let inner = self.expression()?;
                self.reject(
                    "'await' is not supported",
                    location,
                    "call the function synchronously",
                );
                Ok(inner)
            }
            TokenKind::Lambda => {
                self.advance();
                // Consume the lambda header and body so parsing can continue
                while !self.check(TokenKind::Colon) && !self.check(TokenKind::Newline) && !self.is_at_end()
                {
                    self.advance();
                }
                if self.match_token(TokenKind::Colon) {
                    let _ = self.expression();
                }
                Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedFeature,
                    "lambda expressions are not supported".to_string(),
                    location,
                    "define a named function at module level",
                ))
            }
            TokenKind::Yield => {
                self.advance();
                Err(TranslateError::with_suggestion(
                    ErrorCode::UnsupportedFeature,
                    "generators are not supported".to_string(),
                    location,
                    "build and return a list instead of yielding",
                ))
            }
            _ => Err(TranslateError::new(
                ErrorCode::ExpectedExpression,
                format!("expected an expression, found '{}'", self.describe_current()),
                location,
            )),
        }
    }

    /// Parses a parenthesized expression, tuple display, or rejects a
    /// generator expression
    fn paren_expression(&mut self) -> Result<Expression, TranslateError> {
        let location = self.location();
        self.advance();

        if self.match_token(TokenKind::RightParen) {
            return Ok(Expression::TupleDisplay(TupleExpr {
                elements: Vec::new(),
                ty: SemanticType::Unknown,
                location,
            }));
        }

        let first = self.expression()?;

        if self.check(TokenKind::For) {
            return Err(TranslateError::with_suggestion(
                ErrorCode::UnsupportedFeature,
                "generator expressions are not supported".to_string(),
                self.location(),
                "use a list comprehension instead",
            ));
        }

        if self.match_token(TokenKind::Comma) {
            let mut elements = vec![first];
            while !self.check(TokenKind::RightParen) && !self.is_at_end() {
                elements.push(self.expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(
                TokenKind::RightParen,
                ErrorCode::InvalidSyntax,
                "expected ')' closing the tuple",
            )?;
            return Ok(Expression::TupleDisplay(TupleExpr {
                elements,
                ty: SemanticType::Unknown,
                location,
            }));
        }

        self.expect(
            TokenKind::RightParen,
            ErrorCode::InvalidSyntax,
            "expected ')' closing the expression",
        )?;
        Ok(first)
    }

    /// Parses a list display or list comprehension
    fn list_display(&mut self) -> Result<Expression, TranslateError> {
        let location = self.location();
        self.advance();

        if self.match_token(TokenKind::RightBracket) {
            return Ok(Expression::ListDisplay(ListExpr {
                elements: Vec::new(),
                ty: SemanticType::Unknown,
                location,
            }));
        }

        let first = self.expression()?;

        if self.check(TokenKind::For) {
            let generator = self.comprehension_clause()?;
            self.expect(
                TokenKind::RightBracket,
                ErrorCode::InvalidSyntax,
                "expected ']' closing the comprehension",
            )?;
            return Ok(Expression::ListComp(ListCompExpr {
                element: Box::new(first),
                generator,
                ty: SemanticType::Unknown,
                location,
            }));
        }

        let mut elements = vec![first];
        while self.match_token(TokenKind::Comma) {
            if self.check(TokenKind::RightBracket) {
                break;
            }
            elements.push(self.expression()?);
        }
        self.expect(
            TokenKind::RightBracket,
            ErrorCode::InvalidSyntax,
            "expected ']' closing the list",
        )?;

        Ok(Expression::ListDisplay(ListExpr {
            elements,
            ty: SemanticType::Unknown,
            location,
        }))
    }

    /// Parses a dict or set display, or their comprehension forms
    fn brace_display(&mut self) -> Result<Expression, TranslateError> {
        let location = self.location();
        self.advance();

        if self.match_token(TokenKind::RightBrace) {
            return Ok(Expression::DictDisplay(DictExpr {
                keys: Vec::new(),
                values: Vec::new(),
                ty: SemanticType::Unknown,
                location,
            }));
        }

        let first = self.expression()?;

        if self.match_token(TokenKind::Colon) {
            let first_value = self.expression()?;

            if self.check(TokenKind::For) {
                let generator = self.comprehension_clause()?;
                self.expect(
                    TokenKind::RightBrace,
                    ErrorCode::InvalidSyntax,
                    "expected '}' closing the comprehension",
                )?;
                return Ok(Expression::DictComp(DictCompExpr {
                    key: Box::new(first),
                    value: Box::new(first_value),
                    generator,
                    ty: SemanticType::Unknown,
                    location,
                }));
            }

            let mut keys = vec![first];
            let mut values = vec![first_value];
            while self.match_token(TokenKind::Comma) {
                if self.check(TokenKind::RightBrace) {
                    break;
                }
                keys.push(self.expression()?);
                self.expect(
                    TokenKind::Colon,
                    ErrorCode::ExpectedColon,
                    "expected ':' between dict key and value",
                )?;
                values.push(self.expression()?);
            }
            self.expect(
                TokenKind::RightBrace,
                ErrorCode::InvalidSyntax,
                "expected '}' closing the dict",
            )?;
            return Ok(Expression::DictDisplay(DictExpr {
                keys,
                values,
                ty: SemanticType::Unknown,
                location,
            }));
        }

        if self.check(TokenKind::For) {
            let generator = self.comprehension_clause()?;
            self.expect(
                TokenKind::RightBrace,
                ErrorCode::InvalidSyntax,
                "expected '}' closing the comprehension",
            )?;
            return Ok(Expression::SetComp(SetCompExpr {
                element: Box::new(first),
                generator,
                ty: SemanticType::Unknown,
                location,
            }));
        }

        let mut elements = vec![first];
        while self.match_token(TokenKind::Comma) {
            if self.check(TokenKind::RightBrace) {
                break;
            }
            elements.push(self.expression()?);
        }
        self.expect(
            TokenKind::RightBrace,
            ErrorCode::InvalidSyntax,
            "expected '}' closing the set",
        )?;

        Ok(Expression::SetDisplay(SetExpr {
            elements,
            ty: SemanticType::Unknown,
            location,
        }))
    }

    /// Parses the `for target in iterable [if condition]` clause shared by
    /// all comprehension forms
    fn comprehension_clause(&mut self) -> Result<Comprehension, TranslateError> {
        self.expect(TokenKind::For, ErrorCode::InvalidSyntax, "expected 'for'")?;

        let first = self
            .expect(
                TokenKind::Identifier,
                ErrorCode::ExpectedIdentifier,
                "expected a comprehension variable",
            )?
            .lexeme
            .clone();
        let target = if self.match_token(TokenKind::Comma) {
            let second = self
                .expect(
                    TokenKind::Identifier,
                    ErrorCode::ExpectedIdentifier,
                    "expected a second comprehension variable",
                )?
                .lexeme
                .clone();
            BindingTarget::Pair(first, second)
        } else {
            BindingTarget::Name(first)
        };

        self.expect(
            TokenKind::In,
            ErrorCode::InvalidSyntax,
            "expected 'in' in the comprehension",
        )?;
        let iterable = self.expression()?;

        let condition = if self.match_token(TokenKind::If) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        if self.check(TokenKind::For) {
            return Err(TranslateError::with_suggestion(
                ErrorCode::UnsupportedFeature,
                "nested comprehension generators are not supported".to_string(),
                self.location(),
                "use explicit nested loops instead",
            ));
        }

        Ok(Comprehension {
            target,
            iterable: Box::new(iterable),
            condition,
        })
    }
}
