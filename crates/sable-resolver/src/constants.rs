//! Compile-time constant validation
//!
//! Runs after name resolution. Expressions in positions that must be
//! constant (const literals and `const` instance creation, initializers of
//! final top-level and static fields, default parameter values, switch case
//! expressions, const locals, and the initializer lists of const
//! constructors) are checked against the constant grammar and given an
//! inferred constant type. Types of constant field initializers are
//! recorded on the field symbol; a field whose constant value depends on
//! itself is reported instead of recursing.

use crate::context::CompilerContext;
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::pipeline::Program;
use crate::state::ProgramState;
use crate::symbols::{SymbolId, SymbolKind};
use crate::types::{CoreTypes, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};
use sable_syntax::{
    ArrayLiteral, BinaryOperator, Block, ClassDecl, Expression, FieldList, FunctionBody, Initializer,
    InterpolationPart, LiteralValue, MapLiteral, MethodDecl, NewExpression, NodeId, Parameter, Span, Statement,
    TopLevelDecl, TypeNode, UnaryOperator,
};
use tracing::{debug, instrument};

/// Where a constant expression appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Strict,
    /// Initializer list of a const constructor; parameters count as constants
    ConstConstructor,
}

pub struct ConstantAnalyzer<'s, 'c, 'p> {
    state: &'s mut ProgramState,
    ctx: &'s mut CompilerContext<'c>,
    /// Constant fields and const locals → their initializer
    initializers: FxHashMap<SymbolId, &'p Expression>,
    /// Inferred type per expression node
    inferred: FxHashMap<NodeId, TypeId>,
    /// Types of const locals
    locals: FxHashMap<SymbolId, TypeId>,
    visiting: FxHashSet<SymbolId>,
    checked: usize,
}

impl<'s, 'c, 'p> ConstantAnalyzer<'s, 'c, 'p> {
    pub fn new(state: &'s mut ProgramState, ctx: &'s mut CompilerContext<'c>) -> Self {
        Self {
            state,
            ctx,
            initializers: FxHashMap::default(),
            inferred: FxHashMap::default(),
            locals: FxHashMap::default(),
            visiting: FxHashSet::default(),
            checked: 0,
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn analyze(&mut self, program: &'p Program) -> ResolveResult<()> {
        self.collect_initializers(program);
        for library in &program.libraries {
            for unit in &library.units {
                for decl in &unit.declarations {
                    match decl {
                        TopLevelDecl::Class(class) => self.analyze_class(class)?,
                        TopLevelDecl::Function(function) => self.analyze_method(function)?,
                        TopLevelDecl::Fields(list) => self.analyze_fields(list, list.modifiers.is_final())?,
                        TopLevelDecl::TypeAlias(_) => {}
                    }
                }
            }
        }
        debug!(checked = self.checked, inferred = self.inferred.len(), "validated constants");
        Ok(())
    }

    /// Initializers that later references may need before their declaration is visited
    fn collect_initializers(&mut self, program: &'p Program) {
        let lists = program
            .libraries
            .iter()
            .flat_map(|library| &library.units)
            .flat_map(|unit| &unit.declarations)
            .flat_map(|decl| -> Vec<&'p FieldList> {
                match decl {
                    TopLevelDecl::Fields(list) => vec![list],
                    TopLevelDecl::Class(class) => class.field_lists().filter(|l| l.modifiers.is_static()).collect(),
                    _ => Vec::new(),
                }
            });
        for list in lists.filter(|l| l.modifiers.is_final()) {
            for field in &list.fields {
                let (Some(value), Some(symbol)) = (&field.initializer, self.state.bindings.declaration(field.id)) else {
                    continue;
                };
                self.initializers.insert(symbol, value);
            }
        }
    }

    fn analyze_class(&mut self, class: &'p ClassDecl) -> ResolveResult<()> {
        let has_const_constructor = class.methods().any(|m| m.modifiers.is_const() && !m.modifiers.is_factory());
        for list in class.field_lists() {
            let constant = list.modifiers.is_final() && (list.modifiers.is_static() || has_const_constructor);
            self.analyze_fields(list, constant)?;
        }
        for method in class.methods() {
            let symbol = self.state.bindings.expect_declaration(method.id)?;
            if self.state.symbols.kind(symbol) == SymbolKind::Constructor {
                self.analyze_constructor(method)?;
            } else {
                self.analyze_method(method)?;
            }
        }
        Ok(())
    }

    fn analyze_fields(&mut self, list: &'p FieldList, constant: bool) -> ResolveResult<()> {
        for field in &list.fields {
            let Some(value) = &field.initializer else { continue };
            if constant {
                let symbol = self.state.bindings.expect_declaration(field.id)?;
                self.initializers.entry(symbol).or_insert(value);
                self.constant_type_of(symbol, field.name.span)?;
            } else {
                self.walk_expression(value)?;
            }
        }
        Ok(())
    }

    fn analyze_method(&mut self, method: &'p MethodDecl) -> ResolveResult<()> {
        self.check_defaults(&method.params)?;
        if let Some(FunctionBody::Block(block)) = &method.body {
            self.walk_block(block)?;
        }
        Ok(())
    }

    fn analyze_constructor(&mut self, ctor: &'p MethodDecl) -> ResolveResult<()> {
        self.check_defaults(&ctor.params)?;
        let is_const = ctor.modifiers.is_const();
        for initializer in &ctor.initializers {
            let values: Vec<&'p Expression> = match initializer {
                Initializer::Field(init) => vec![&init.value],
                Initializer::Super(call) | Initializer::Redirect(call) => call.args.values().collect(),
            };
            for value in values {
                if is_const {
                    self.infer(value, Position::ConstConstructor)?;
                } else {
                    self.walk_expression(value)?;
                }
            }
        }
        if let Some(FunctionBody::Block(block)) = &ctor.body {
            self.walk_block(block)?;
        }
        Ok(())
    }

    /// Default parameter values are always constant
    fn check_defaults(&mut self, params: &'p [Parameter]) -> ResolveResult<()> {
        for value in params.iter().filter_map(|p| p.default_value.as_ref()) {
            self.infer(value, Position::Strict)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Walk of non-constant code, looking for positions that must be constant
    // ------------------------------------------------------------------

    fn walk_block(&mut self, block: &'p Block) -> ResolveResult<()> {
        for statement in &block.statements {
            self.walk_statement(statement)?;
        }
        Ok(())
    }

    fn walk_statement(&mut self, statement: &'p Statement) -> ResolveResult<()> {
        match statement {
            Statement::Block(block) => self.walk_block(block)?,
            Statement::VariableDecl(decl) => {
                for declarator in &decl.declarators {
                    let Some(value) = &declarator.initializer else { continue };
                    if decl.modifiers.is_const() {
                        let symbol = self.state.bindings.expect_declaration(declarator.id)?;
                        self.initializers.insert(symbol, value);
                        self.constant_type_of(symbol, declarator.name.span)?;
                    } else {
                        self.walk_expression(value)?;
                    }
                }
            }
            Statement::Expression(stmt) => self.walk_expression(&stmt.expression)?,
            Statement::If(stmt) => {
                self.walk_expression(&stmt.condition)?;
                self.walk_statement(&stmt.then_branch)?;
                if let Some(otherwise) = &stmt.else_branch {
                    self.walk_statement(otherwise)?;
                }
            }
            Statement::While(stmt) => {
                self.walk_expression(&stmt.condition)?;
                self.walk_statement(&stmt.body)?;
            }
            Statement::DoWhile(stmt) => {
                self.walk_statement(&stmt.body)?;
                self.walk_expression(&stmt.condition)?;
            }
            Statement::For(stmt) => {
                if let Some(init) = &stmt.init {
                    self.walk_statement(init)?;
                }
                if let Some(condition) = &stmt.condition {
                    self.walk_expression(condition)?;
                }
                for update in &stmt.update {
                    self.walk_expression(update)?;
                }
                self.walk_statement(&stmt.body)?;
            }
            Statement::ForIn(stmt) => {
                self.walk_expression(&stmt.iterable)?;
                self.walk_statement(&stmt.body)?;
            }
            Statement::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    self.walk_expression(value)?;
                }
            }
            Statement::Throw(stmt) => {
                if let Some(value) = &stmt.value {
                    self.walk_expression(value)?;
                }
            }
            Statement::Try(stmt) => {
                self.walk_block(&stmt.body)?;
                for clause in &stmt.catches {
                    self.walk_block(&clause.body)?;
                }
                if let Some(finally) = &stmt.finally {
                    self.walk_block(finally)?;
                }
            }
            Statement::Switch(stmt) => {
                self.walk_expression(&stmt.discriminant)?;
                for case in &stmt.cases {
                    if let Some(test) = &case.test {
                        self.infer(test, Position::Strict)?;
                    }
                    for statement in &case.body {
                        self.walk_statement(statement)?;
                    }
                }
            }
            Statement::Labeled(stmt) => self.walk_statement(&stmt.body)?,
            Statement::FunctionDecl(function) => {
                self.check_defaults(&function.params)?;
                self.walk_block(&function.body)?;
            }
            Statement::Assert(stmt) => self.walk_expression(&stmt.condition)?,
            Statement::Break(_) | Statement::Continue(_) | Statement::Empty(_) => {}
        }
        Ok(())
    }

    fn walk_expression(&mut self, expr: &'p Expression) -> ResolveResult<()> {
        match expr {
            Expression::Array(array) if array.is_const => {
                self.infer(expr, Position::Strict)?;
            }
            Expression::Map(map) if map.is_const => {
                self.infer(expr, Position::Strict)?;
            }
            Expression::New(new) if new.is_const => {
                self.infer(expr, Position::Strict)?;
            }
            Expression::Literal(_) | Expression::Identifier(_) | Expression::This(_) | Expression::Super(_) => {}
            Expression::Interpolation(interpolation) => {
                for part in &interpolation.parts {
                    if let InterpolationPart::Expression(value) = part {
                        self.walk_expression(value)?;
                    }
                }
            }
            Expression::Property(property) => self.walk_expression(&property.target)?,
            Expression::Index(index) => {
                self.walk_expression(&index.target)?;
                self.walk_expression(&index.index)?;
            }
            Expression::Call(call) => self.walk_arguments(call.args.values())?,
            Expression::MethodCall(call) => {
                self.walk_expression(&call.target)?;
                self.walk_arguments(call.args.values())?;
            }
            Expression::FunctionCall(call) => {
                self.walk_expression(&call.target)?;
                self.walk_arguments(call.args.values())?;
            }
            Expression::New(new) => self.walk_arguments(new.args.values())?,
            Expression::Unary(unary) => self.walk_expression(&unary.operand)?,
            Expression::Binary(binary) => {
                self.walk_expression(&binary.left)?;
                self.walk_expression(&binary.right)?;
            }
            Expression::Assignment(assignment) => {
                self.walk_expression(&assignment.target)?;
                self.walk_expression(&assignment.value)?;
            }
            Expression::Conditional(conditional) => {
                self.walk_expression(&conditional.test)?;
                self.walk_expression(&conditional.consequent)?;
                self.walk_expression(&conditional.alternate)?;
            }
            Expression::Is(is) => self.walk_expression(&is.value)?,
            Expression::Array(array) => self.walk_arguments(array.elements.iter())?,
            Expression::Map(map) => {
                for entry in &map.entries {
                    self.walk_expression(&entry.key)?;
                    self.walk_expression(&entry.value)?;
                }
            }
            Expression::Function(function) => {
                self.check_defaults(&function.params)?;
                self.walk_block(&function.body)?;
            }
            Expression::Parenthesized(paren) => self.walk_expression(&paren.inner)?,
        }
        Ok(())
    }

    fn walk_arguments(&mut self, values: impl Iterator<Item = &'p Expression>) -> ResolveResult<()> {
        for value in values {
            self.walk_expression(value)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Constant grammar and type inference
    // ------------------------------------------------------------------

    /// Constant type of `expr`, reporting the first violation and yielding Dynamic for it
    fn infer(&mut self, expr: &'p Expression, position: Position) -> ResolveResult<TypeId> {
        if let Some(&ty) = self.inferred.get(&expr.id()) {
            return Ok(ty);
        }
        self.checked += 1;
        let core = *self.state.core()?;
        let ty = match expr {
            Expression::Literal(literal) => match literal.value {
                LiteralValue::Int(_) => core.int.ty,
                LiteralValue::Double(_) => core.double.ty,
                LiteralValue::String(_) => core.string.ty,
                LiteralValue::Bool(_) => core.bool.ty,
                LiteralValue::Null => TypeId::DYNAMIC,
            },
            Expression::Interpolation(interpolation) => {
                for part in &interpolation.parts {
                    let InterpolationPart::Expression(value) = part else { continue };
                    let ty = self.infer(value, position)?;
                    if !is_string_number_bool(&core, ty) {
                        self.report(value.span(), ResolverErrorCode::ExpectedConstantExpressionStringNumberBool);
                        break;
                    }
                }
                core.string.ty
            }
            Expression::Identifier(ident) => match self.state.bindings.symbol(ident.id) {
                Some(symbol) => self.reference_type(symbol, ident.span, position)?,
                None => TypeId::DYNAMIC,
            },
            Expression::Property(property) => match self.state.bindings.symbol(property.id) {
                Some(symbol) => self.reference_type(symbol, property.name.span, position)?,
                None if self.qualifier_reported(&property.target) => TypeId::DYNAMIC,
                None => self.report(&property.span, ResolverErrorCode::ExpectedConstantExpression),
            },
            Expression::Parenthesized(paren) => self.infer(&paren.inner, position)?,
            Expression::Unary(unary) => {
                let operand = self.infer(&unary.operand, position)?;
                let span = unary.operand.span();
                match unary.operator {
                    UnaryOperator::Minus if is_numeric(&core, operand) => operand,
                    UnaryOperator::Minus => self.report(span, ResolverErrorCode::ExpectedConstantExpressionNumber),
                    UnaryOperator::Not if is_type(operand, core.bool.ty) => core.bool.ty,
                    UnaryOperator::Not => self.report(span, ResolverErrorCode::ExpectedConstantExpressionBoolean),
                    UnaryOperator::BitwiseNot if is_type(operand, core.int.ty) => core.int.ty,
                    UnaryOperator::BitwiseNot => self.report(span, ResolverErrorCode::ExpectedConstantExpressionInt),
                    _ => self.report(&unary.span, ResolverErrorCode::ExpectedConstantExpression),
                }
            }
            Expression::Binary(binary) => {
                let left = self.infer(&binary.left, position)?;
                let right = self.infer(&binary.right, position)?;
                self.binary_type(&core, binary.operator, (left, binary.left.span()), (right, binary.right.span()))
            }
            Expression::Conditional(conditional) => {
                let test = self.infer(&conditional.test, position)?;
                if !is_type(test, core.bool.ty) {
                    self.report(conditional.test.span(), ResolverErrorCode::ExpectedConstantExpressionBoolean);
                }
                let consequent = self.infer(&conditional.consequent, position)?;
                let alternate = self.infer(&conditional.alternate, position)?;
                if consequent == alternate { consequent } else { TypeId::DYNAMIC }
            }
            Expression::Array(array) if array.is_const => self.const_array(&core, array, position)?,
            Expression::Map(map) if map.is_const => self.const_map(&core, map, position)?,
            Expression::New(new) if new.is_const => self.const_new(new, position)?,
            _ => self.report(expr.span(), ResolverErrorCode::ExpectedConstantExpression),
        };
        self.inferred.insert(expr.id(), ty);
        Ok(ty)
    }

    /// A bound name or property used in a constant
    fn reference_type(&mut self, symbol: SymbolId, span: Span, position: Position) -> ResolveResult<TypeId> {
        let modifiers = self.state.symbols.modifiers(symbol);
        Ok(match self.state.symbols.kind(symbol) {
            SymbolKind::Field if modifiers.is_final() && !self.state.symbols.is_instance_member(symbol) => {
                self.constant_type_of(symbol, span)?
            }
            SymbolKind::Variable if modifiers.is_const() => self.constant_type_of(symbol, span)?,
            SymbolKind::Parameter if position == Position::ConstConstructor => self.state.symbols.ty(symbol),
            SymbolKind::Method if !self.state.symbols.is_instance_member(symbol) => self.state.symbols.ty(symbol),
            SymbolKind::None | SymbolKind::Duplicate => TypeId::DYNAMIC,
            _ => self.report(&span, ResolverErrorCode::ExpectedConstantExpression),
        })
    }

    /// Constant type of a final field or const local, inferring its initializer on first use
    fn constant_type_of(&mut self, symbol: SymbolId, span: Span) -> ResolveResult<TypeId> {
        if let Some(ty) = self.known_constant(symbol) {
            return Ok(ty);
        }
        let Some(&value) = self.initializers.get(&symbol) else {
            return Ok(TypeId::DYNAMIC);
        };
        if !self.visiting.insert(symbol) {
            let name = self.state.symbols.name(symbol).to_string();
            self.ctx.report(span, ResolverErrorCode::CircularReference, &[&name]);
            return Ok(TypeId::DYNAMIC);
        }
        let ty = self.infer(value, Position::Strict)?;
        self.visiting.remove(&symbol);
        if self.state.symbols.kind(symbol) == SymbolKind::Field {
            let field = self.state.symbols.field_mut(symbol)?;
            if !field.constant_type.is_set() {
                field.constant_type.set(ty, "constant type", symbol)?;
            }
        } else {
            self.locals.insert(symbol, ty);
        }
        Ok(ty)
    }

    fn known_constant(&self, symbol: SymbolId) -> Option<TypeId> {
        match self.state.symbols.field(symbol) {
            Some(field) => field.constant_type.get(),
            None => self.locals.get(&symbol).copied(),
        }
    }

    /// Whether an unbound `q.name` already failed on its qualifier
    fn qualifier_reported(&self, target: &Expression) -> bool {
        let Expression::Identifier(ident) = target else { return false };
        match self.state.bindings.symbol(ident.id) {
            Some(symbol) => matches!(
                self.state.symbols.kind(symbol),
                SymbolKind::Class | SymbolKind::LibraryPrefix
            ),
            None => true,
        }
    }

    fn binary_type(
        &mut self,
        core: &CoreTypes,
        operator: BinaryOperator,
        (left, left_span): (TypeId, &Span),
        (right, right_span): (TypeId, &Span),
    ) -> TypeId {
        use BinaryOperator::*;
        let (rule, code) = match operator {
            Equal | NotEqual | StrictEqual | StrictNotEqual => {
                (Operand::StringNumberBool, ResolverErrorCode::ExpectedConstantExpressionStringNumberBool)
            }
            And | Or => (Operand::Bool, ResolverErrorCode::ExpectedConstantExpressionBoolean),
            BitwiseAnd | BitwiseOr | BitwiseXor | LeftShift | RightShift => {
                (Operand::Int, ResolverErrorCode::ExpectedConstantExpressionInt)
            }
            Add | Subtract | Multiply | Divide | TruncatingDivide | Modulo | LessThan | LessEqual | GreaterThan
            | GreaterEqual => (Operand::Number, ResolverErrorCode::ExpectedConstantExpressionNumber),
        };
        if !rule.accepts(core, left) {
            return self.report(left_span, code);
        }
        if !rule.accepts(core, right) {
            return self.report(right_span, code);
        }
        match operator {
            Equal | NotEqual | StrictEqual | StrictNotEqual | And | Or | LessThan | LessEqual | GreaterThan
            | GreaterEqual => core.bool.ty,
            BitwiseAnd | BitwiseOr | BitwiseXor | LeftShift | RightShift => core.int.ty,
            Add | Subtract | Multiply | Divide | TruncatingDivide | Modulo => {
                let int = core.int.ty;
                let double = core.double.ty;
                if left == int && right == int {
                    int
                } else if (left == double || right == double) && (left == int || left == double) && (right == int || right == double) {
                    double
                } else {
                    core.num.ty
                }
            }
        }
    }

    fn const_array(&mut self, core: &CoreTypes, array: &'p ArrayLiteral, position: Position) -> ResolveResult<TypeId> {
        let mut args = Vec::new();
        if let Some(arg) = &array.type_arg {
            if !self.check_type_argument(arg, ResolverErrorCode::ConstArrayWithTypeVariable) {
                return Ok(TypeId::DYNAMIC);
            }
            args.extend(self.state.bindings.ty(arg.id));
        }
        for element in &array.elements {
            self.infer(element, position)?;
        }
        Ok(self.state.types.interface(core.list.class, args))
    }

    fn const_map(&mut self, core: &CoreTypes, map: &'p MapLiteral, position: Position) -> ResolveResult<TypeId> {
        let mut args = Vec::new();
        for arg in &map.type_args {
            if !self.check_type_argument(arg, ResolverErrorCode::ConstMapWithTypeVariable) {
                return Ok(TypeId::DYNAMIC);
            }
            args.extend(self.state.bindings.ty(arg.id));
        }
        for entry in &map.entries {
            let key = self.infer(&entry.key, position)?;
            if key != core.string.ty {
                self.report(entry.key.span(), ResolverErrorCode::ConstMapKeyMustBeString);
            }
            self.infer(&entry.value, position)?;
        }
        if args.len() != 2 {
            args.clear();
        }
        Ok(self.state.types.interface(core.map.class, args))
    }

    /// False after reporting a type argument that mentions a type variable
    fn check_type_argument(&mut self, arg: &TypeNode, code: ResolverErrorCode) -> bool {
        let variable = self
            .state
            .bindings
            .ty(arg.id)
            .and_then(|ty| self.state.types.find_type_variable(ty));
        let Some(variable) = variable else { return true };
        let name = self.state.symbols.name(variable).to_string();
        self.ctx.report(arg.span, code, &[&name]);
        false
    }

    fn const_new(&mut self, new: &'p NewExpression, position: Position) -> ResolveResult<TypeId> {
        let mut ty = TypeId::DYNAMIC;
        if let Some(ctor) = self.state.bindings.symbol(new.id) {
            if !self.state.symbols.modifiers(ctor).is_const() {
                let name = self.state.symbols.name(ctor).to_string();
                self.ctx
                    .report(new.span, ResolverErrorCode::ConstNewRequiresConstConstructor, &[&name]);
            }
            if let Some(data) = self.state.symbols.constructor(ctor) {
                ty = self.state.symbols.ty(data.constructor_type);
            }
        }
        for value in new.args.values() {
            self.infer(value, position)?;
        }
        Ok(ty)
    }

    fn report(&mut self, span: &Span, code: ResolverErrorCode) -> TypeId {
        self.ctx.report(*span, code, &[]);
        TypeId::DYNAMIC
    }
}

/// Operand types an operator accepts in a constant
#[derive(Debug, Clone, Copy)]
enum Operand {
    Bool,
    Int,
    Number,
    StringNumberBool,
}

impl Operand {
    fn accepts(self, core: &CoreTypes, ty: TypeId) -> bool {
        match self {
            Operand::Bool => is_type(ty, core.bool.ty),
            Operand::Int => is_type(ty, core.int.ty),
            Operand::Number => is_numeric(core, ty),
            Operand::StringNumberBool => is_string_number_bool(core, ty),
        }
    }
}

/// Dynamic stands in for operands whose type is unknown and is accepted everywhere
fn is_type(ty: TypeId, expected: TypeId) -> bool {
    ty == TypeId::DYNAMIC || ty == expected
}

fn is_numeric(core: &CoreTypes, ty: TypeId) -> bool {
    ty == TypeId::DYNAMIC || core.is_numeric(ty)
}

fn is_string_number_bool(core: &CoreTypes, ty: TypeId) -> bool {
    is_numeric(core, ty) || ty == core.string.ty || ty == core.bool.ty
}
