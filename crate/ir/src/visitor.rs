use crate::ast::{
    AnnAssignStatement, AssignStatement, AttributeExpr, AugAssignStatement, BinaryExpr,
    BooleanExpr, CallExpr, ComparisonExpr, DictCompExpr, DictExpr, Expression,
    ExpressionStatement, ForStatement, IfStatement, ListCompExpr, ListExpr, LiteralExpr,
    ReturnStatement, SetCompExpr, SetExpr, Statement, SubscriptExpr, TupleExpr, UnaryExpr,
    VariableExpr, WhileStatement,
};
use crate::SourceLocation;

/// Trait implementing the visitor pattern for traversing the AST
///
/// This trait allows implementing different behaviors when traversing the
/// AST, such as constraint checking, printing, or code generation.
///
/// The generic parameter T represents the return type of the visit methods.
pub trait Visitor<T> {
    /// Visit a general statement
    fn visit_statement(&mut self, stmt: &Statement) -> T {
        match stmt {
            Statement::Assign(assign) => self.visit_assign_statement(assign),
            Statement::AugAssign(aug) => self.visit_aug_assign_statement(aug),
            Statement::AnnAssign(ann) => self.visit_ann_assign_statement(ann),
            Statement::If(if_stmt) => self.visit_if_statement(if_stmt),
            Statement::While(while_stmt) => self.visit_while_statement(while_stmt),
            Statement::For(for_stmt) => self.visit_for_statement(for_stmt),
            Statement::Return(ret) => self.visit_return_statement(ret),
            Statement::Expression(expr) => self.visit_expression_statement(expr),
            Statement::Pass(loc) => self.visit_pass_statement(loc),
            Statement::Break(loc) => self.visit_break_statement(loc),
            Statement::Continue(loc) => self.visit_continue_statement(loc),
        }
    }

    /// Visit a plain assignment statement
    fn visit_assign_statement(&mut self, stmt: &AssignStatement) -> T;

    /// Visit an augmented assignment statement
    fn visit_aug_assign_statement(&mut self, stmt: &AugAssignStatement) -> T;

    /// Visit an annotated assignment statement
    fn visit_ann_assign_statement(&mut self, stmt: &AnnAssignStatement) -> T;

    /// Visit a conditional statement
    fn visit_if_statement(&mut self, stmt: &IfStatement) -> T;

    /// Visit a while loop
    fn visit_while_statement(&mut self, stmt: &WhileStatement) -> T;

    /// Visit a for loop
    fn visit_for_statement(&mut self, stmt: &ForStatement) -> T;

    /// Visit a return statement
    fn visit_return_statement(&mut self, stmt: &ReturnStatement) -> T;

    /// Visit a bare expression statement
    fn visit_expression_statement(&mut self, stmt: &ExpressionStatement) -> T;

    /// Visit a pass statement
    fn visit_pass_statement(&mut self, location: &SourceLocation) -> T;

    /// Visit a break statement
    fn visit_break_statement(&mut self, location: &SourceLocation) -> T;

    /// Visit a continue statement
    fn visit_continue_statement(&mut self, location: &SourceLocation) -> T;

    /// Visit a general expression
    fn visit_expression(&mut self, expr: &Expression) -> T {
        match expr {
            Expression::Literal(lit) => self.visit_literal_expression(lit),
            Expression::Variable(var) => self.visit_variable_expression(var),
            Expression::Binary(bin) => self.visit_binary_expression(bin),
            Expression::Unary(unary) => self.visit_unary_expression(unary),
            Expression::Boolean(boolean) => self.visit_boolean_expression(boolean),
            Expression::Comparison(cmp) => self.visit_comparison_expression(cmp),
            Expression::Call(call) => self.visit_call_expression(call),
            Expression::Attribute(attr) => self.visit_attribute_expression(attr),
            Expression::Subscript(sub) => self.visit_subscript_expression(sub),
            Expression::ListDisplay(list) => self.visit_list_display(list),
            Expression::DictDisplay(dict) => self.visit_dict_display(dict),
            Expression::SetDisplay(set) => self.visit_set_display(set),
            Expression::TupleDisplay(tuple) => self.visit_tuple_display(tuple),
            Expression::ListComp(comp) => self.visit_list_comprehension(comp),
            Expression::DictComp(comp) => self.visit_dict_comprehension(comp),
            Expression::SetComp(comp) => self.visit_set_comprehension(comp),
        }
    }

    /// Visit a literal expression
    fn visit_literal_expression(&mut self, expr: &LiteralExpr) -> T;

    /// Visit a variable reference expression
    fn visit_variable_expression(&mut self, expr: &VariableExpr) -> T;

    /// Visit a binary expression
    fn visit_binary_expression(&mut self, expr: &BinaryExpr) -> T;

    /// Visit a unary expression
    fn visit_unary_expression(&mut self, expr: &UnaryExpr) -> T;

    /// Visit a short-circuiting boolean expression
    fn visit_boolean_expression(&mut self, expr: &BooleanExpr) -> T;

    /// Visit a comparison expression
    fn visit_comparison_expression(&mut self, expr: &ComparisonExpr) -> T;

    /// Visit a call expression
    fn visit_call_expression(&mut self, expr: &CallExpr) -> T;

    /// Visit an attribute access expression
    fn visit_attribute_expression(&mut self, expr: &AttributeExpr) -> T;

    /// Visit a subscript access expression
    fn visit_subscript_expression(&mut self, expr: &SubscriptExpr) -> T;

    /// Visit a list display
    fn visit_list_display(&mut self, expr: &ListExpr) -> T;

    /// Visit a dict display
    fn visit_dict_display(&mut self, expr: &DictExpr) -> T;

    /// Visit a set display
    fn visit_set_display(&mut self, expr: &SetExpr) -> T;

    /// Visit a tuple display
    fn visit_tuple_display(&mut self, expr: &TupleExpr) -> T;

    /// Visit a list comprehension
    fn visit_list_comprehension(&mut self, expr: &ListCompExpr) -> T;

    /// Visit a dict comprehension
    fn visit_dict_comprehension(&mut self, expr: &DictCompExpr) -> T;

    /// Visit a set comprehension
    fn visit_set_comprehension(&mut self, expr: &SetCompExpr) -> T;
}
