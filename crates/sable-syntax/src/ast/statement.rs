//! Statement AST nodes

use super::*;
use crate::span::Span;

/// { statements }
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// Statement inside a function body
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),

    /// var x = 1, y; final int z = 2;
    VariableDecl(VariableDecl),

    /// Expression statement (e.g., function call)
    Expression(ExpressionStatement),

    If(IfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    Return(ReturnStatement),
    Break(JumpStatement),
    Continue(JumpStatement),

    /// throw e; or a bare `throw;` rethrow
    Throw(ThrowStatement),

    Try(TryStatement),
    Switch(SwitchStatement),

    /// label: statement
    Labeled(LabeledStatement),

    /// Named local function
    FunctionDecl(FunctionExpression),

    Assert(AssertStatement),
    Empty(Span),
}

impl Statement {
    /// Get the span of this statement
    pub fn span(&self) -> &Span {
        match self {
            Statement::Block(s) => &s.span,
            Statement::VariableDecl(s) => &s.span,
            Statement::Expression(s) => &s.span,
            Statement::If(s) => &s.span,
            Statement::While(s) => &s.span,
            Statement::DoWhile(s) => &s.span,
            Statement::For(s) => &s.span,
            Statement::ForIn(s) => &s.span,
            Statement::Return(s) => &s.span,
            Statement::Break(s) => &s.span,
            Statement::Continue(s) => &s.span,
            Statement::Throw(s) => &s.span,
            Statement::Try(s) => &s.span,
            Statement::Switch(s) => &s.span,
            Statement::Labeled(s) => &s.span,
            Statement::FunctionDecl(s) => &s.span,
            Statement::Assert(s) => &s.span,
            Statement::Empty(span) => span,
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub modifiers: Modifiers,
    pub type_annotation: Option<TypeNode>,
    pub declarators: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub id: NodeId,
    pub name: Identifier,
    pub initializer: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

// ============================================================================
// Control Flow
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub condition: Expression,
    pub span: Span,
}

/// for (init; condition; update) body
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: Option<Box<Statement>>,
    pub condition: Option<Expression>,
    pub update: Vec<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

/// for (var x in items) body
#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    pub variable: ForInTarget,
    pub iterable: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInTarget {
    Declaration(VariableDecl),
    Identifier(Identifier),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

/// break label; / continue label;
#[derive(Debug, Clone, PartialEq)]
pub struct JumpStatement {
    pub id: NodeId,
    pub label: Option<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
    pub span: Span,
}

/// catch (Type e, trace) { ... }
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub exception: Parameter,
    pub stack_trace: Option<Parameter>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

/// label: case expr: statements (no test means `default:`)
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub labels: Vec<Identifier>,
    pub test: Option<Expression>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssertStatement {
    pub condition: Expression,
    pub span: Span,
}
