//! Programmatic construction of syntax trees
//!
//! The parser is a separate component; embedders that synthesize code and the
//! resolver's tests build trees with [`AstBuilder`] instead. Every node gets a
//! fresh [`NodeId`] and a distinct [`Span`] in the builder's source, so
//! diagnostics can be told apart by location.
//!
//! All methods take `&self`, which lets calls nest freely:
//!
//! ```
//! use sable_syntax::{AstBuilder, SourceId};
//!
//! let b = AstBuilder::new(SourceId(1));
//! let call = b.call("print", vec![b.int(1), b.id("x")]);
//! assert_eq!(call.span().source, SourceId(1));
//! ```

use crate::ast::*;
use crate::span::{SourceId, Span};
use std::cell::Cell;

/// Allocates node ids and spans for one compilation unit
#[derive(Debug)]
pub struct AstBuilder {
    source: SourceId,
    next_id: Cell<u32>,
    next_line: Cell<u32>,
}

impl AstBuilder {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            next_id: Cell::new(0),
            next_line: Cell::new(1),
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn node_id(&self) -> NodeId {
        let index = self.next_id.get();
        self.next_id.set(index + 1);
        NodeId::new(self.source, index)
    }

    /// A span on its own line
    pub fn span(&self) -> Span {
        let line = self.next_line.get();
        self.next_line.set(line + 1);
        let start = (line as usize - 1) * 16;
        Span::new(self.source, start, start + 8, line, 1)
    }

    pub fn ident(&self, name: &str) -> Identifier {
        Identifier {
            id: self.node_id(),
            name: name.to_string(),
            span: self.span(),
        }
    }

    // ========================================================================
    // Libraries
    // ========================================================================

    pub fn unit(&self, path: &str, declarations: Vec<TopLevelDecl>) -> CompilationUnit {
        CompilationUnit {
            source: self.source,
            path: path.to_string(),
            declarations,
        }
    }

    pub fn import(&self, library: &str) -> ImportDirective {
        ImportDirective {
            library: library.to_string(),
            prefix: None,
            combinators: Combinators::default(),
            span: self.span(),
        }
    }

    pub fn import_as(&self, library: &str, prefix: &str) -> ImportDirective {
        let mut import = self.import(library);
        import.prefix = Some(self.ident(prefix));
        import
    }

    pub fn import_show(&self, library: &str, names: &[&str]) -> ImportDirective {
        let mut import = self.import(library);
        import.combinators.show = names.iter().map(|n| self.ident(n)).collect();
        import
    }

    pub fn import_hide(&self, library: &str, names: &[&str]) -> ImportDirective {
        let mut import = self.import(library);
        import.combinators.hide = names.iter().map(|n| self.ident(n)).collect();
        import
    }

    pub fn export(&self, library: &str) -> ExportDirective {
        ExportDirective {
            library: library.to_string(),
            combinators: Combinators::default(),
            span: self.span(),
        }
    }

    pub fn export_show(&self, library: &str, names: &[&str]) -> ExportDirective {
        let mut export = self.export(library);
        export.combinators.show = names.iter().map(|n| self.ident(n)).collect();
        export
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn ty(&self, name: &str) -> TypeNode {
        self.generic_ty(name, Vec::new())
    }

    pub fn generic_ty(&self, name: &str, args: Vec<TypeNode>) -> TypeNode {
        TypeNode {
            id: self.node_id(),
            prefix: None,
            name: self.ident(name),
            args,
            span: self.span(),
        }
    }

    pub fn prefixed_ty(&self, prefix: &str, name: &str) -> TypeNode {
        TypeNode {
            id: self.node_id(),
            prefix: Some(self.ident(prefix)),
            name: self.ident(name),
            args: Vec::new(),
            span: self.span(),
        }
    }

    pub fn type_param(&self, name: &str, bound: Option<TypeNode>) -> TypeParameter {
        TypeParameter {
            id: self.node_id(),
            name: self.ident(name),
            bound,
            span: self.span(),
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub fn class(&self, name: &str) -> ClassDecl {
        ClassDecl {
            id: self.node_id(),
            name: self.ident(name),
            modifiers: Modifiers::empty(),
            is_interface: false,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            default_clause: None,
            members: Vec::new(),
            span: self.span(),
        }
    }

    pub fn interface(&self, name: &str) -> ClassDecl {
        let mut decl = self.class(name);
        decl.is_interface = true;
        decl
    }

    pub fn default_clause(&self, class: &str, type_params: Vec<TypeParameter>) -> DefaultClause {
        DefaultClause {
            id: self.node_id(),
            class: self.ty(class),
            type_params,
            span: self.span(),
        }
    }

    fn method_decl(&self, name: MethodName, params: Vec<Parameter>, body: Option<FunctionBody>) -> MethodDecl {
        MethodDecl {
            id: self.node_id(),
            name,
            modifiers: Modifiers::empty(),
            return_type: None,
            params,
            initializers: Vec::new(),
            redirect: None,
            body,
            span: self.span(),
        }
    }

    /// Method or top-level function with a block body
    pub fn method(&self, name: &str, params: Vec<Parameter>, body: Vec<Statement>) -> MethodDecl {
        let body = FunctionBody::Block(self.block(body));
        self.method_decl(MethodName::Simple(self.ident(name)), params, Some(body))
    }

    /// Method without a body
    pub fn abstract_method(&self, name: &str, params: Vec<Parameter>) -> MethodDecl {
        self.method_decl(MethodName::Simple(self.ident(name)), params, None)
    }

    pub fn static_method(&self, name: &str, params: Vec<Parameter>, body: Vec<Statement>) -> MethodDecl {
        self.method(name, params, body).with_modifiers(Modifiers::STATIC)
    }

    /// Unnamed generative constructor with an empty body
    pub fn constructor(&self, class: &str, params: Vec<Parameter>) -> MethodDecl {
        let body = FunctionBody::Block(self.block(Vec::new()));
        self.method_decl(MethodName::Simple(self.ident(class)), params, Some(body))
    }

    /// `Class.name(...)` constructor with an empty body
    pub fn named_constructor(&self, class: &str, name: &str, params: Vec<Parameter>) -> MethodDecl {
        let method_name = MethodName::Qualified {
            qualifier: self.ident(class),
            name: self.ident(name),
        };
        let body = FunctionBody::Block(self.block(Vec::new()));
        self.method_decl(method_name, params, Some(body))
    }

    /// factory Class() / factory Class.name() with the given body
    pub fn factory(&self, class: &str, name: Option<&str>, params: Vec<Parameter>, body: Vec<Statement>) -> MethodDecl {
        let method_name = match name {
            Some(name) => MethodName::Qualified {
                qualifier: self.ident(class),
                name: self.ident(name),
            },
            None => MethodName::Simple(self.ident(class)),
        };
        let body = FunctionBody::Block(self.block(body));
        self.method_decl(method_name, params, Some(body))
            .with_modifiers(Modifiers::FACTORY)
    }

    pub fn getter(&self, name: &str, body: Vec<Statement>) -> MethodDecl {
        self.method(name, Vec::new(), body)
            .with_modifiers(Modifiers::GETTER)
    }

    pub fn setter(&self, name: &str, param: &str) -> MethodDecl {
        self.method(name, vec![self.param(param)], Vec::new())
            .with_modifiers(Modifiers::SETTER)
    }

    /// operator + (other) { ... }
    pub fn operator(&self, symbol: &str, params: Vec<Parameter>, body: Vec<Statement>) -> MethodDecl {
        self.method(symbol, params, body)
            .with_modifiers(Modifiers::OPERATOR)
    }

    pub fn fields(&self, modifiers: Modifiers, ty: Option<TypeNode>, fields: Vec<FieldDecl>) -> FieldList {
        FieldList {
            modifiers,
            type_annotation: ty,
            fields,
            span: self.span(),
        }
    }

    /// A field list holding a single field
    pub fn field_list(&self, modifiers: Modifiers, name: &str, initializer: Option<Expression>) -> FieldList {
        let field = self.field(name, initializer);
        self.fields(modifiers, None, vec![field])
    }

    pub fn field(&self, name: &str, initializer: Option<Expression>) -> FieldDecl {
        FieldDecl {
            id: self.node_id(),
            name: self.ident(name),
            initializer,
            span: self.span(),
        }
    }

    pub fn param(&self, name: &str) -> Parameter {
        Parameter {
            id: self.node_id(),
            name: self.ident(name),
            modifiers: Modifiers::empty(),
            type_annotation: None,
            field_initializer: false,
            default_value: None,
            span: self.span(),
        }
    }

    pub fn typed_param(&self, ty: &str, name: &str) -> Parameter {
        self.param(name).with_type(self.ty(ty))
    }

    /// this.name
    pub fn field_param(&self, name: &str) -> Parameter {
        let mut param = self.param(name);
        param.field_initializer = true;
        param
    }

    pub fn named_param(&self, name: &str, default_value: Option<Expression>) -> Parameter {
        let mut param = self.param(name).with_modifiers(Modifiers::NAMED);
        param.default_value = default_value;
        param
    }

    /// Initializer list entry `name = value`
    pub fn field_init(&self, name: &str, value: Expression) -> Initializer {
        Initializer::Field(FieldInitializer {
            id: self.node_id(),
            name: self.ident(name),
            value,
            span: self.span(),
        })
    }

    pub fn super_call(&self, name: Option<&str>, args: Vec<Expression>) -> Initializer {
        Initializer::Super(self.constructor_call(name, args))
    }

    pub fn this_call(&self, name: Option<&str>, args: Vec<Expression>) -> Initializer {
        Initializer::Redirect(self.constructor_call(name, args))
    }

    fn constructor_call(&self, name: Option<&str>, args: Vec<Expression>) -> ConstructorCall {
        ConstructorCall {
            id: self.node_id(),
            name: name.map(|n| self.ident(n)),
            args: Arguments::positional(args),
            span: self.span(),
        }
    }

    pub fn typedef(&self, name: &str, return_type: Option<TypeNode>, params: Vec<Parameter>) -> FunctionTypeAlias {
        FunctionTypeAlias {
            id: self.node_id(),
            name: self.ident(name),
            type_params: Vec::new(),
            return_type,
            params,
            span: self.span(),
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn block(&self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.node_id(),
            statements,
            span: self.span(),
        }
    }

    pub fn block_stmt(&self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.block(statements))
    }

    /// var name = initializer;
    pub fn var(&self, name: &str, initializer: Option<Expression>) -> Statement {
        self.var_decl(Modifiers::empty(), None, name, initializer)
    }

    pub fn var_decl(
        &self,
        modifiers: Modifiers,
        ty: Option<TypeNode>,
        name: &str,
        initializer: Option<Expression>,
    ) -> Statement {
        let declarator = VariableDeclarator {
            id: self.node_id(),
            name: self.ident(name),
            initializer,
            span: self.span(),
        };
        Statement::VariableDecl(VariableDecl {
            modifiers,
            type_annotation: ty,
            declarators: vec![declarator],
            span: self.span(),
        })
    }

    pub fn expr_stmt(&self, expression: Expression) -> Statement {
        Statement::Expression(ExpressionStatement {
            expression,
            span: self.span(),
        })
    }

    pub fn ret(&self, value: Option<Expression>) -> Statement {
        Statement::Return(ReturnStatement {
            value,
            span: self.span(),
        })
    }

    pub fn if_stmt(&self, condition: Expression, then_branch: Statement, else_branch: Option<Statement>) -> Statement {
        Statement::If(IfStatement {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
            span: self.span(),
        })
    }

    pub fn while_stmt(&self, condition: Expression, body: Statement) -> Statement {
        Statement::While(WhileStatement {
            condition,
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn for_stmt(
        &self,
        init: Option<Statement>,
        condition: Option<Expression>,
        update: Vec<Expression>,
        body: Statement,
    ) -> Statement {
        Statement::For(ForStatement {
            init: init.map(Box::new),
            condition,
            update,
            body: Box::new(body),
            span: self.span(),
        })
    }

    /// for (var name in iterable) body
    pub fn for_in(&self, name: &str, iterable: Expression, body: Statement) -> Statement {
        let declarator = VariableDeclarator {
            id: self.node_id(),
            name: self.ident(name),
            initializer: None,
            span: self.span(),
        };
        let decl = VariableDecl {
            modifiers: Modifiers::empty(),
            type_annotation: None,
            declarators: vec![declarator],
            span: self.span(),
        };
        Statement::ForIn(ForInStatement {
            variable: ForInTarget::Declaration(decl),
            iterable,
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn labeled(&self, label: &str, body: Statement) -> Statement {
        Statement::Labeled(LabeledStatement {
            label: self.ident(label),
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn break_stmt(&self, label: Option<&str>) -> Statement {
        Statement::Break(self.jump(label))
    }

    pub fn continue_stmt(&self, label: Option<&str>) -> Statement {
        Statement::Continue(self.jump(label))
    }

    fn jump(&self, label: Option<&str>) -> JumpStatement {
        JumpStatement {
            id: self.node_id(),
            label: label.map(|l| self.ident(l)),
            span: self.span(),
        }
    }

    pub fn throw(&self, value: Option<Expression>) -> Statement {
        Statement::Throw(ThrowStatement {
            value,
            span: self.span(),
        })
    }

    /// try { body } catch (exception) { handler }
    pub fn try_catch(&self, body: Vec<Statement>, exception: &str, handler: Vec<Statement>) -> Statement {
        let clause = CatchClause {
            exception: self.param(exception),
            stack_trace: None,
            body: self.block(handler),
            span: self.span(),
        };
        Statement::Try(TryStatement {
            body: self.block(body),
            catches: vec![clause],
            finally: None,
            span: self.span(),
        })
    }

    pub fn switch(&self, discriminant: Expression, cases: Vec<SwitchCase>) -> Statement {
        Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            span: self.span(),
        })
    }

    pub fn case(&self, labels: &[&str], test: Option<Expression>, body: Vec<Statement>) -> SwitchCase {
        SwitchCase {
            labels: labels.iter().map(|l| self.ident(l)).collect(),
            test,
            body,
            span: self.span(),
        }
    }

    pub fn local_function(&self, name: &str, params: Vec<Parameter>, body: Vec<Statement>) -> Statement {
        let mut function = self.function_expr(params, body);
        function.name = Some(self.ident(name));
        Statement::FunctionDecl(function)
    }

    pub fn assert_stmt(&self, condition: Expression) -> Statement {
        Statement::Assert(AssertStatement {
            condition,
            span: self.span(),
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn literal(&self, value: LiteralValue) -> Expression {
        Expression::Literal(Literal {
            id: self.node_id(),
            value,
            span: self.span(),
        })
    }

    pub fn int(&self, value: i64) -> Expression {
        self.literal(LiteralValue::Int(value))
    }

    pub fn double(&self, value: f64) -> Expression {
        self.literal(LiteralValue::Double(value))
    }

    pub fn string(&self, value: &str) -> Expression {
        self.literal(LiteralValue::String(value.to_string()))
    }

    pub fn bool(&self, value: bool) -> Expression {
        self.literal(LiteralValue::Bool(value))
    }

    pub fn null(&self) -> Expression {
        self.literal(LiteralValue::Null)
    }

    pub fn interpolation(&self, parts: Vec<InterpolationPart>) -> Expression {
        Expression::Interpolation(StringInterpolation {
            id: self.node_id(),
            parts,
            span: self.span(),
        })
    }

    /// Identifier expression
    pub fn id(&self, name: &str) -> Expression {
        Expression::Identifier(self.ident(name))
    }

    pub fn this(&self) -> Expression {
        Expression::This(ThisExpression {
            id: self.node_id(),
            span: self.span(),
        })
    }

    pub fn super_expr(&self) -> Expression {
        Expression::Super(SuperExpression {
            id: self.node_id(),
            span: self.span(),
        })
    }

    pub fn prop(&self, target: Expression, name: &str) -> Expression {
        Expression::Property(PropertyAccess {
            id: self.node_id(),
            target: Box::new(target),
            name: self.ident(name),
            span: self.span(),
        })
    }

    pub fn index(&self, target: Expression, index: Expression) -> Expression {
        Expression::Index(IndexExpression {
            id: self.node_id(),
            target: Box::new(target),
            index: Box::new(index),
            span: self.span(),
        })
    }

    /// name(args)
    pub fn call(&self, name: &str, args: Vec<Expression>) -> Expression {
        self.call_with(name, Arguments::positional(args))
    }

    pub fn call_with(&self, name: &str, args: Arguments) -> Expression {
        Expression::Call(UnqualifiedCall {
            id: self.node_id(),
            target: self.ident(name),
            args,
            span: self.span(),
        })
    }

    /// target.name(args)
    pub fn method_call(&self, target: Expression, name: &str, args: Vec<Expression>) -> Expression {
        Expression::MethodCall(MethodCall {
            id: self.node_id(),
            target: Box::new(target),
            name: self.ident(name),
            args: Arguments::positional(args),
            span: self.span(),
        })
    }

    /// target(args) on an arbitrary expression
    pub fn function_call(&self, target: Expression, args: Vec<Expression>) -> Expression {
        Expression::FunctionCall(FunctionObjectCall {
            id: self.node_id(),
            target: Box::new(target),
            args: Arguments::positional(args),
            span: self.span(),
        })
    }

    pub fn named_arg(&self, name: &str, value: Expression) -> NamedArgument {
        NamedArgument {
            name: self.ident(name),
            value,
        }
    }

    /// new ctor(args)
    pub fn new_expr(&self, constructor: ConstructorRef, args: Vec<Expression>) -> Expression {
        Expression::New(NewExpression {
            id: self.node_id(),
            is_const: false,
            constructor,
            args: Arguments::positional(args),
            span: self.span(),
        })
    }

    /// const ctor(args)
    pub fn const_new(&self, constructor: ConstructorRef, args: Vec<Expression>) -> Expression {
        match self.new_expr(constructor, args) {
            Expression::New(mut new) => {
                new.is_const = true;
                Expression::New(new)
            }
            other => other,
        }
    }

    /// Bare type constructor reference: A
    pub fn ctor(&self, class: &str) -> ConstructorRef {
        ConstructorRef::Type(self.ty(class))
    }

    /// A<args>
    pub fn generic_ctor(&self, class: &str, args: Vec<TypeNode>) -> ConstructorRef {
        ConstructorRef::Type(self.generic_ty(class, args))
    }

    /// qualifier.name
    pub fn named_ctor(&self, qualifier: ConstructorRef, name: &str) -> ConstructorRef {
        self.named_generic_ctor(qualifier, name, Vec::new())
    }

    /// qualifier.name<type_args>
    pub fn named_generic_ctor(&self, qualifier: ConstructorRef, name: &str, type_args: Vec<TypeNode>) -> ConstructorRef {
        ConstructorRef::Named(NamedConstructorRef {
            id: self.node_id(),
            qualifier: Box::new(qualifier),
            name: self.ident(name),
            type_args,
            span: self.span(),
        })
    }

    pub fn binary(&self, operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::Binary(BinaryExpression {
            id: self.node_id(),
            operator,
            left: Box::new(left),
            right: Box::new(right),
            span: self.span(),
        })
    }

    pub fn unary(&self, operator: UnaryOperator, operand: Expression) -> Expression {
        Expression::Unary(UnaryExpression {
            id: self.node_id(),
            operator,
            operand: Box::new(operand),
            span: self.span(),
        })
    }

    pub fn assign(&self, target: Expression, value: Expression) -> Expression {
        self.compound_assign(None, target, value)
    }

    pub fn compound_assign(&self, operator: Option<BinaryOperator>, target: Expression, value: Expression) -> Expression {
        Expression::Assignment(AssignmentExpression {
            id: self.node_id(),
            operator,
            target: Box::new(target),
            value: Box::new(value),
            span: self.span(),
        })
    }

    pub fn conditional(&self, test: Expression, consequent: Expression, alternate: Expression) -> Expression {
        Expression::Conditional(ConditionalExpression {
            id: self.node_id(),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.span(),
        })
    }

    pub fn is_expr(&self, value: Expression, ty: TypeNode) -> Expression {
        Expression::Is(IsExpression {
            id: self.node_id(),
            value: Box::new(value),
            ty,
            negated: false,
            span: self.span(),
        })
    }

    pub fn array(&self, elements: Vec<Expression>) -> Expression {
        Expression::Array(ArrayLiteral {
            id: self.node_id(),
            is_const: false,
            type_arg: None,
            elements,
            span: self.span(),
        })
    }

    pub fn const_array(&self, type_arg: Option<TypeNode>, elements: Vec<Expression>) -> Expression {
        Expression::Array(ArrayLiteral {
            id: self.node_id(),
            is_const: true,
            type_arg,
            elements,
            span: self.span(),
        })
    }

    pub fn map(&self, entries: Vec<(Expression, Expression)>) -> Expression {
        self.map_literal(false, Vec::new(), entries)
    }

    pub fn const_map(&self, type_args: Vec<TypeNode>, entries: Vec<(Expression, Expression)>) -> Expression {
        self.map_literal(true, type_args, entries)
    }

    fn map_literal(&self, is_const: bool, type_args: Vec<TypeNode>, entries: Vec<(Expression, Expression)>) -> Expression {
        Expression::Map(MapLiteral {
            id: self.node_id(),
            is_const,
            type_args,
            entries: entries
                .into_iter()
                .map(|(key, value)| MapEntry { key, value })
                .collect(),
            span: self.span(),
        })
    }

    pub fn function_expr(&self, params: Vec<Parameter>, body: Vec<Statement>) -> FunctionExpression {
        FunctionExpression {
            id: self.node_id(),
            name: None,
            return_type: None,
            params,
            body: self.block(body),
            span: self.span(),
        }
    }

    /// Anonymous function literal
    pub fn function(&self, params: Vec<Parameter>, body: Vec<Statement>) -> Expression {
        Expression::Function(self.function_expr(params, body))
    }

    pub fn paren(&self, inner: Expression) -> Expression {
        Expression::Parenthesized(ParenthesizedExpression {
            id: self.node_id(),
            inner: Box::new(inner),
            span: self.span(),
        })
    }
}
