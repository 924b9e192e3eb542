//! Expression AST nodes
//!
//! This module defines all expression types, including:
//! - Literals, string interpolation, array and map literals
//! - Unary, binary, assignment and conditional operations
//! - Property access and the three invocation forms
//! - Object creation with `new`/`const` and its constructor reference
//! - Function literals

use super::*;
use crate::span::Span;
use std::fmt;

/// Expression (produces a value)
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// 42, 3.14, "text", true, null
    Literal(Literal),

    /// "Hello, ${name}!"
    Interpolation(StringInterpolation),

    Identifier(Identifier),
    This(ThisExpression),
    Super(SuperExpression),

    /// target.name
    Property(PropertyAccess),

    /// target[index]
    Index(IndexExpression),

    /// foo(args)
    Call(UnqualifiedCall),

    /// target.name(args)
    MethodCall(MethodCall),

    /// (expr)(args)
    FunctionCall(FunctionObjectCall),

    /// new A(args) / const A.named(args)
    New(NewExpression),

    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Assignment(AssignmentExpression),

    /// cond ? a : b
    Conditional(ConditionalExpression),

    /// x is T / x is! T
    Is(IsExpression),

    /// [1, 2] / const <int>[1, 2]
    Array(ArrayLiteral),

    /// {"a": 1} / const <String, int>{"a": 1}
    Map(MapLiteral),

    /// (x) => x + 1, named or anonymous
    Function(FunctionExpression),

    Parenthesized(ParenthesizedExpression),
}

impl Expression {
    /// Get the span of this expression
    pub fn span(&self) -> &Span {
        match self {
            Expression::Literal(e) => &e.span,
            Expression::Interpolation(e) => &e.span,
            Expression::Identifier(e) => &e.span,
            Expression::This(e) => &e.span,
            Expression::Super(e) => &e.span,
            Expression::Property(e) => &e.span,
            Expression::Index(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::MethodCall(e) => &e.span,
            Expression::FunctionCall(e) => &e.span,
            Expression::New(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Assignment(e) => &e.span,
            Expression::Conditional(e) => &e.span,
            Expression::Is(e) => &e.span,
            Expression::Array(e) => &e.span,
            Expression::Map(e) => &e.span,
            Expression::Function(e) => &e.span,
            Expression::Parenthesized(e) => &e.span,
        }
    }

    /// Get the node id of this expression
    pub fn id(&self) -> NodeId {
        match self {
            Expression::Literal(e) => e.id,
            Expression::Interpolation(e) => e.id,
            Expression::Identifier(e) => e.id,
            Expression::This(e) => e.id,
            Expression::Super(e) => e.id,
            Expression::Property(e) => e.id,
            Expression::Index(e) => e.id,
            Expression::Call(e) => e.id,
            Expression::MethodCall(e) => e.id,
            Expression::FunctionCall(e) => e.id,
            Expression::New(e) => e.id,
            Expression::Unary(e) => e.id,
            Expression::Binary(e) => e.id,
            Expression::Assignment(e) => e.id,
            Expression::Conditional(e) => e.id,
            Expression::Is(e) => e.id,
            Expression::Array(e) => e.id,
            Expression::Map(e) => e.id,
            Expression::Function(e) => e.id,
            Expression::Parenthesized(e) => e.id,
        }
    }
}

// ============================================================================
// Literals
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub id: NodeId,
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Double(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringInterpolation {
    pub id: NodeId,
    pub parts: Vec<InterpolationPart>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationPart {
    Text(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub id: NodeId,
    pub is_const: bool,
    pub type_arg: Option<TypeNode>,
    pub elements: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLiteral {
    pub id: NodeId,
    pub is_const: bool,
    pub type_args: Vec<TypeNode>,
    pub entries: Vec<MapEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Expression,
    pub value: Expression,
}

// ============================================================================
// References
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ThisExpression {
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperExpression {
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccess {
    pub id: NodeId,
    pub target: Box<Expression>,
    pub name: Identifier,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub id: NodeId,
    pub target: Box<Expression>,
    pub index: Box<Expression>,
    pub span: Span,
}

// ============================================================================
// Invocations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    pub positional: Vec<Expression>,
    pub named: Vec<NamedArgument>,
}

impl Arguments {
    pub fn positional(args: Vec<Expression>) -> Self {
        Self {
            positional: args,
            named: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// All argument values in source order
    pub fn values(&self) -> impl Iterator<Item = &Expression> {
        self.positional
            .iter()
            .chain(self.named.iter().map(|arg| &arg.value))
    }
}

/// name: value
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArgument {
    pub name: Identifier,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnqualifiedCall {
    pub id: NodeId,
    pub target: Identifier,
    pub args: Arguments,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub id: NodeId,
    pub target: Box<Expression>,
    pub name: Identifier,
    pub args: Arguments,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionObjectCall {
    pub id: NodeId,
    pub target: Box<Expression>,
    pub args: Arguments,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    pub id: NodeId,
    pub is_const: bool,
    pub constructor: ConstructorRef,
    pub args: Arguments,
    pub span: Span,
}

/// The constructor name after `new`
///
/// The parser cannot tell `prefix.Type` from `Type.named`; both arrive as
/// [`ConstructorRef::Named`] and the resolver decides.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorRef {
    /// A, A<T>
    Type(TypeNode),
    /// Q.name, Q.name<T>
    Named(NamedConstructorRef),
}

impl ConstructorRef {
    pub fn span(&self) -> &Span {
        match self {
            ConstructorRef::Type(ty) => &ty.span,
            ConstructorRef::Named(named) => &named.span,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            ConstructorRef::Type(ty) => ty.id,
            ConstructorRef::Named(named) => named.id,
        }
    }
}

impl fmt::Display for ConstructorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorRef::Type(ty) => write!(f, "{}", ty),
            ConstructorRef::Named(named) => {
                write!(f, "{}.{}", named.qualifier, named.name.name)?;
                if !named.type_args.is_empty() {
                    let args: Vec<String> = named.type_args.iter().map(|t| t.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedConstructorRef {
    pub id: NodeId,
    pub qualifier: Box<ConstructorRef>,
    pub name: Identifier,
    pub type_args: Vec<TypeNode>,
    pub span: Span,
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub id: NodeId,
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,         // -
    Not,           // !
    BitwiseNot,    // ~
    PrefixIncrement,  // ++x
    PrefixDecrement,  // --x
    PostfixIncrement, // x++
    PostfixDecrement, // x--
}

impl UnaryOperator {
    /// ++ and -- write their operand
    pub fn is_update(self) -> bool {
        matches!(
            self,
            UnaryOperator::PrefixIncrement
                | UnaryOperator::PrefixDecrement
                | UnaryOperator::PostfixIncrement
                | UnaryOperator::PostfixDecrement
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub id: NodeId,
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,            // +
    Subtract,       // -
    Multiply,       // *
    Divide,         // /
    TruncatingDivide, // ~/
    Modulo,         // %

    // Comparison
    Equal,          // ==
    NotEqual,       // !=
    StrictEqual,    // ===
    StrictNotEqual, // !==
    LessThan,       // <
    LessEqual,      // <=
    GreaterThan,    // >
    GreaterEqual,   // >=

    // Logical
    And,            // &&
    Or,             // ||

    // Bitwise
    BitwiseAnd,     // &
    BitwiseOr,      // |
    BitwiseXor,     // ^
    LeftShift,      // <<
    RightShift,     // >>
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::TruncatingDivide => "~/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::StrictEqual => "===",
            BinaryOperator::StrictNotEqual => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    pub id: NodeId,
    /// None for plain `=`, Some(op) for `op=`
    pub operator: Option<BinaryOperator>,
    pub target: Box<Expression>,
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub id: NodeId,
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsExpression {
    pub id: NodeId,
    pub value: Box<Expression>,
    pub ty: TypeNode,
    pub negated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression {
    pub id: NodeId,
    pub inner: Box<Expression>,
    pub span: Span,
}

// ============================================================================
// Functions
// ============================================================================

/// Function literal or local function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub id: NodeId,
    pub name: Option<Identifier>,
    pub return_type: Option<TypeNode>,
    pub params: Vec<Parameter>,
    pub body: Block,
    pub span: Span,
}
