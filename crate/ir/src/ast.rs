use crate::SourceLocation;
use mgen_types::SemanticType;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Addition operator
    Add,
    /// Subtraction operator
    Subtract,
    /// Multiplication operator
    Multiply,
    /// True division operator (yields float on integers)
    Divide,
    /// Floor division operator (preserves integers)
    FloorDivide,
    /// Modulo operator
    Modulo,
    /// Power operator
    Power,
    /// Bitwise AND operator
    BitAnd,
    /// Bitwise OR operator
    BitOr,
    /// Bitwise XOR operator
    BitXor,
    /// Left shift operator
    ShiftLeft,
    /// Right shift operator
    ShiftRight,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op_str = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::FloorDivide => "//",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
        };
        write!(f, "{}", op_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    /// Equality operator
    Equal,
    /// Not equal operator
    NotEqual,
    /// Less than operator
    Less,
    /// Less than or equal to operator
    LessEqual,
    /// Greater than operator
    Greater,
    /// Greater than or equal to operator
    GreaterEqual,
    /// Membership operator
    In,
    /// Negated membership operator
    NotIn,
}

impl Display for CompareOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op_str = match self {
            CompareOperator::Equal => "==",
            CompareOperator::NotEqual => "!=",
            CompareOperator::Less => "<",
            CompareOperator::LessEqual => "<=",
            CompareOperator::Greater => ">",
            CompareOperator::GreaterEqual => ">=",
            CompareOperator::In => "in",
            CompareOperator::NotIn => "not in",
        };
        write!(f, "{}", op_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    /// Short-circuiting logical AND
    And,
    /// Short-circuiting logical OR
    Or,
}

impl Display for BoolOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op_str = match self {
            BoolOperator::And => "and",
            BoolOperator::Or => "or",
        };
        write!(f, "{}", op_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic negation operator
    Negate,
    /// Logical NOT operator
    Not,
    /// Bitwise complement operator
    Invert,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op_str = match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "not",
            UnaryOperator::Invert => "~",
        };
        write!(f, "{}", op_str)
    }
}

/// Possible values for literal expressions
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String value
    Str(String),
    /// The `None` literal
    None,
}

/// Expression nodes in the AST
///
/// Every variant carries a source location; the `ty` field is `Unknown`
/// after parsing and set by the type inference engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value (constant)
    Literal(LiteralExpr),
    /// A variable reference
    Variable(VariableExpr),
    /// A binary arithmetic or bitwise operation
    Binary(BinaryExpr),
    /// A unary operation
    Unary(UnaryExpr),
    /// A short-circuiting boolean operation
    Boolean(BooleanExpr),
    /// A comparison, including membership tests
    Comparison(ComparisonExpr),
    /// A function, constructor, or method call
    Call(CallExpr),
    /// Attribute access (e.g. `self.count`)
    Attribute(AttributeExpr),
    /// Subscript access (e.g. `items[0]`)
    Subscript(SubscriptExpr),
    /// A list display
    ListDisplay(ListExpr),
    /// A dict display
    DictDisplay(DictExpr),
    /// A set display
    SetDisplay(SetExpr),
    /// A tuple display
    TupleDisplay(TupleExpr),
    /// A list comprehension
    ListComp(ListCompExpr),
    /// A dict comprehension
    DictComp(DictCompExpr),
    /// A set comprehension
    SetComp(SetCompExpr),
}

/// A literal expression
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    /// Value of the literal
    pub value: LiteralValue,
    /// Semantic type of the literal
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A variable reference
#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    /// Name of the referenced binding
    pub name: String,
    /// Semantic type of the binding at this use
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A binary expression (e.g. `a + b`)
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    /// Left operand
    pub left: Box<Expression>,
    /// Operator
    pub operator: BinaryOperator,
    /// Right operand
    pub right: Box<Expression>,
    /// Semantic type of the operation result
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A unary expression (e.g. `-x`, `not done`)
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub operand: Box<Expression>,
    /// Semantic type of the operation result
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A short-circuiting boolean expression (`a and b`, `a or b`)
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpr {
    /// Left operand
    pub left: Box<Expression>,
    /// Operator
    pub operator: BoolOperator,
    /// Right operand
    pub right: Box<Expression>,
    /// Semantic type (always Bool after analysis)
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A comparison expression (`a < b`, `key in freq`)
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    /// Left operand
    pub left: Box<Expression>,
    /// Operator
    pub operator: CompareOperator,
    /// Right operand
    pub right: Box<Expression>,
    /// Semantic type (always Bool after analysis)
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A call expression
///
/// The callee is a variable for free functions and constructors, or an
/// attribute expression for method calls; the converter routes container
/// method calls through the container-operation strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    /// The called expression
    pub function: Box<Expression>,
    /// Arguments passed to the call
    pub arguments: Vec<Expression>,
    /// Semantic type of the call result
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

impl CallExpr {
    /// The callee name when the call is a free function or constructor call
    pub fn callee_name(&self) -> Option<&str> {
        match self.function.as_ref() {
            Expression::Variable(var) => Some(&var.name),
            _ => None,
        }
    }

    /// The receiver and method name when the call is a method call
    pub fn method_parts(&self) -> Option<(&Expression, &str)> {
        match self.function.as_ref() {
            Expression::Attribute(attr) => Some((attr.object.as_ref(), attr.name.as_str())),
            _ => None,
        }
    }
}

/// An attribute access expression
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeExpr {
    /// The object whose attribute is accessed
    pub object: Box<Expression>,
    /// Name of the accessed attribute
    pub name: String,
    /// Semantic type of the attribute
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A subscript access expression
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptExpr {
    /// The subscripted object
    pub object: Box<Expression>,
    /// The index or key expression
    pub index: Box<Expression>,
    /// Semantic type of the element
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A list display (e.g. `[1, 2, 3]`)
#[derive(Debug, Clone, PartialEq)]
pub struct ListExpr {
    /// Element expressions
    pub elements: Vec<Expression>,
    /// Semantic type of the list
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A dict display (e.g. `{"a": 1}`)
#[derive(Debug, Clone, PartialEq)]
pub struct DictExpr {
    /// Key expressions, parallel to `values`
    pub keys: Vec<Expression>,
    /// Value expressions, parallel to `keys`
    pub values: Vec<Expression>,
    /// Semantic type of the dict
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A set display (e.g. `{1, 2}`); the empty set is spelled `set()`
#[derive(Debug, Clone, PartialEq)]
pub struct SetExpr {
    /// Element expressions
    pub elements: Vec<Expression>,
    /// Semantic type of the set
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A tuple display (e.g. `(1, "a")`)
#[derive(Debug, Clone, PartialEq)]
pub struct TupleExpr {
    /// Element expressions
    pub elements: Vec<Expression>,
    /// Semantic type of the tuple
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// The target bound by a `for` loop or comprehension generator
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    /// A single bound name
    Name(String),
    /// A pair of bound names (e.g. `for k, v in m.items()`)
    Pair(String, String),
}

impl BindingTarget {
    /// The single bound name, when the target binds exactly one
    pub fn single_name(&self) -> Option<&str> {
        match self {
            BindingTarget::Name(name) => Some(name),
            BindingTarget::Pair(_, _) => None,
        }
    }
}

/// The generator clause shared by all comprehension forms
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    /// The bound loop target
    pub target: BindingTarget,
    /// The iterated expression
    pub iterable: Box<Expression>,
    /// Optional filter condition
    pub condition: Option<Box<Expression>>,
}

/// A list comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct ListCompExpr {
    /// The yielded element expression
    pub element: Box<Expression>,
    /// The generator clause
    pub generator: Comprehension,
    /// Semantic type of the produced list
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A dict comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct DictCompExpr {
    /// The yielded key expression
    pub key: Box<Expression>,
    /// The yielded value expression
    pub value: Box<Expression>,
    /// The generator clause
    pub generator: Comprehension,
    /// Semantic type of the produced dict
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A set comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct SetCompExpr {
    /// The yielded element expression
    pub element: Box<Expression>,
    /// The generator clause
    pub generator: Comprehension,
    /// Semantic type of the produced set
    pub ty: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

impl Expression {
    /// The source location of this expression
    pub fn location(&self) -> SourceLocation {
        match self {
            Expression::Literal(e) => e.location,
            Expression::Variable(e) => e.location,
            Expression::Binary(e) => e.location,
            Expression::Unary(e) => e.location,
            Expression::Boolean(e) => e.location,
            Expression::Comparison(e) => e.location,
            Expression::Call(e) => e.location,
            Expression::Attribute(e) => e.location,
            Expression::Subscript(e) => e.location,
            Expression::ListDisplay(e) => e.location,
            Expression::DictDisplay(e) => e.location,
            Expression::SetDisplay(e) => e.location,
            Expression::TupleDisplay(e) => e.location,
            Expression::ListComp(e) => e.location,
            Expression::DictComp(e) => e.location,
            Expression::SetComp(e) => e.location,
        }
    }

    /// The semantic type assigned to this expression
    pub fn ty(&self) -> &SemanticType {
        match self {
            Expression::Literal(e) => &e.ty,
            Expression::Variable(e) => &e.ty,
            Expression::Binary(e) => &e.ty,
            Expression::Unary(e) => &e.ty,
            Expression::Boolean(e) => &e.ty,
            Expression::Comparison(e) => &e.ty,
            Expression::Call(e) => &e.ty,
            Expression::Attribute(e) => &e.ty,
            Expression::Subscript(e) => &e.ty,
            Expression::ListDisplay(e) => &e.ty,
            Expression::DictDisplay(e) => &e.ty,
            Expression::SetDisplay(e) => &e.ty,
            Expression::TupleDisplay(e) => &e.ty,
            Expression::ListComp(e) => &e.ty,
            Expression::DictComp(e) => &e.ty,
            Expression::SetComp(e) => &e.ty,
        }
    }

    /// Replaces the semantic type assigned to this expression
    pub fn set_ty(&mut self, ty: SemanticType) {
        match self {
            Expression::Literal(e) => e.ty = ty,
            Expression::Variable(e) => e.ty = ty,
            Expression::Binary(e) => e.ty = ty,
            Expression::Unary(e) => e.ty = ty,
            Expression::Boolean(e) => e.ty = ty,
            Expression::Comparison(e) => e.ty = ty,
            Expression::Call(e) => e.ty = ty,
            Expression::Attribute(e) => e.ty = ty,
            Expression::Subscript(e) => e.ty = ty,
            Expression::ListDisplay(e) => e.ty = ty,
            Expression::DictDisplay(e) => e.ty = ty,
            Expression::SetDisplay(e) => e.ty = ty,
            Expression::TupleDisplay(e) => e.ty = ty,
            Expression::ListComp(e) => e.ty = ty,
            Expression::DictComp(e) => e.ty = ty,
            Expression::SetComp(e) => e.ty = ty,
        }
    }
}

/// Statement nodes in the AST
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Plain assignment
    Assign(AssignStatement),
    /// Augmented assignment (e.g. `total += x`)
    AugAssign(AugAssignStatement),
    /// Annotated assignment (e.g. `total: int = 0`)
    AnnAssign(AnnAssignStatement),
    /// Conditional statement; `elif` chains nest in the else branch
    If(IfStatement),
    /// While loop
    While(WhileStatement),
    /// For loop over an iterable
    For(ForStatement),
    /// Return statement
    Return(ReturnStatement),
    /// Bare expression statement
    Expression(ExpressionStatement),
    /// No-op statement
    Pass(SourceLocation),
    /// Loop exit statement
    Break(SourceLocation),
    /// Loop continuation statement
    Continue(SourceLocation),
}

/// A plain assignment statement
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStatement {
    /// Assignment target (variable, subscript, or attribute)
    pub target: Expression,
    /// Assigned value
    pub value: Expression,
    /// Source code location information
    pub location: SourceLocation,
}

/// An augmented assignment statement
#[derive(Debug, Clone, PartialEq)]
pub struct AugAssignStatement {
    /// Assignment target (variable, subscript, or attribute)
    pub target: Expression,
    /// The combining operator
    pub operator: BinaryOperator,
    /// Right-hand operand
    pub value: Expression,
    /// Source code location information
    pub location: SourceLocation,
}

/// An annotated assignment statement
#[derive(Debug, Clone, PartialEq)]
pub struct AnnAssignStatement {
    /// Assignment target (variable or attribute)
    pub target: Expression,
    /// The declared semantic type
    pub annotation: SemanticType,
    /// Optional initializer
    pub value: Option<Expression>,
    /// Source code location information
    pub location: SourceLocation,
}

/// A conditional statement
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The branch condition
    pub condition: Expression,
    /// Statements executed when the condition holds
    pub then_branch: Vec<Statement>,
    /// Statements executed otherwise (possibly a nested `If` for `elif`)
    pub else_branch: Vec<Statement>,
    /// Source code location information
    pub location: SourceLocation,
}

/// A while loop
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// The loop condition
    pub condition: Expression,
    /// The loop body
    pub body: Vec<Statement>,
    /// Source code location information
    pub location: SourceLocation,
}

/// A for loop
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// The bound loop target
    pub target: BindingTarget,
    /// The iterated expression
    pub iterable: Expression,
    /// The loop body
    pub body: Vec<Statement>,
    /// Source code location information
    pub location: SourceLocation,
}

/// A return statement
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    /// The returned value, if any
    pub value: Option<Expression>,
    /// Source code location information
    pub location: SourceLocation,
}

/// A bare expression statement
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    /// The evaluated expression
    pub expression: Expression,
    /// Source code location information
    pub location: SourceLocation,
}

/// A function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared semantic type (`Unknown` only for `self`)
    pub annotation: SemanticType,
    /// Source code location information
    pub location: SourceLocation,
}

/// A function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Function parameters
    pub parameters: Vec<Parameter>,
    /// Declared return type (`Void` when no annotation names a value)
    pub return_type: SemanticType,
    /// Function body
    pub body: Vec<Statement>,
    /// Source code location information
    pub location: SourceLocation,
}

impl FunctionDef {
    /// Check if this definition is a method taking `self`
    pub fn is_method(&self) -> bool {
        self.parameters.first().is_some_and(|p| p.name == "self")
    }

    /// The parameters excluding `self`
    pub fn value_parameters(&self) -> &[Parameter] {
        if self.is_method() {
            &self.parameters[1..]
        } else {
            &self.parameters
        }
    }
}

/// A class definition without inheritance
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Class name
    pub name: String,
    /// Methods including the constructor (`__init__`)
    pub methods: Vec<FunctionDef>,
    /// Source code location information
    pub location: SourceLocation,
}

impl ClassDef {
    /// The constructor, if the class declares one
    pub fn constructor(&self) -> Option<&FunctionDef> {
        self.methods.iter().find(|m| m.name == "__init__")
    }
}

/// A module-level annotated variable
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVarDecl {
    /// Variable name
    pub name: String,
    /// Declared semantic type
    pub annotation: SemanticType,
    /// Initializer expression
    pub value: Expression,
    /// Source code location information
    pub location: SourceLocation,
}

/// An import declaration; recorded but never translated
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// The imported module path
    pub module: String,
    /// Names imported from the module (empty for a plain `import`)
    pub names: Vec<String>,
    /// Source code location information
    pub location: SourceLocation,
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// A function definition
    Function(FunctionDef),
    /// A class definition
    Class(ClassDef),
    /// A module-level annotated variable
    GlobalVar(GlobalVarDecl),
    /// An import declaration
    Import(ImportDecl),
}

/// A parsed source file: an ordered sequence of top-level declarations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// The declarations in source order
    pub declarations: Vec<Declaration>,
}

impl Module {
    /// All function definitions, including methods of every class
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.declarations.iter().flat_map(|decl| {
            let funcs: &[FunctionDef] = match decl {
                Declaration::Function(func) => std::slice::from_ref(func),
                Declaration::Class(class) => &class.methods,
                _ => &[],
            };
            funcs.iter()
        })
    }

    /// Looks up a top-level function by name
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.declarations.iter().find_map(|decl| match decl {
            Declaration::Function(func) if func.name == name => Some(func),
            _ => None,
        })
    }

    /// Looks up a class by name
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.declarations.iter().find_map(|decl| match decl {
            Declaration::Class(class) if class.name == name => Some(class),
            _ => None,
        })
    }
}
