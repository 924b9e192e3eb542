//! Expression resolution: names, `this`/`super`, property access and assignment

use super::{Access, ResolveContext, Resolver};
use crate::builder::{build_parameters, function_type, resolve_return_type};
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::scope::ScopeKind;
use crate::symbols::{MethodSymbol, Symbol, SymbolData, SymbolId, SymbolKind};
use sable_syntax::{
    is_private_name, Expression, FunctionExpression, Identifier, InterpolationPart, Modifiers, PropertyAccess, Span,
    SuperExpression, ThisExpression,
};
use tracing::trace;

impl<'s, 'c> Resolver<'s, 'c> {
    pub(crate) fn resolve_expression(&mut self, cx: &ResolveContext, expr: &Expression, access: Access) -> ResolveResult<()> {
        match expr {
            Expression::Literal(_) => {}
            Expression::Interpolation(interpolation) => {
                for part in &interpolation.parts {
                    if let InterpolationPart::Expression(value) = part {
                        self.resolve_expression(cx, value, Access::Read)?;
                    }
                }
            }
            Expression::Identifier(ident) => {
                self.resolve_identifier(cx, ident, access)?;
            }
            Expression::This(this) => {
                self.check_this(cx, this);
            }
            Expression::Super(sup) => {
                self.check_super(cx, sup);
            }
            Expression::Property(property) => {
                self.resolve_property(cx, property, access)?;
            }
            Expression::Index(index) => {
                self.resolve_expression(cx, &index.target, Access::Read)?;
                self.resolve_expression(cx, &index.index, Access::Read)?;
            }
            Expression::Call(call) => self.resolve_unqualified_call(cx, call)?,
            Expression::MethodCall(call) => self.resolve_method_call(cx, call)?,
            Expression::FunctionCall(call) => {
                self.resolve_expression(cx, &call.target, Access::Read)?;
                self.resolve_arguments(cx, &call.args)?;
            }
            Expression::New(new) => self.resolve_new(cx, new)?,
            Expression::Unary(unary) => {
                if unary.operator.is_update() {
                    self.resolve_assignable(cx, &unary.operand, Access::ReadWrite)?;
                } else {
                    self.resolve_expression(cx, &unary.operand, Access::Read)?;
                }
            }
            Expression::Binary(binary) => {
                self.resolve_expression(cx, &binary.left, Access::Read)?;
                self.resolve_expression(cx, &binary.right, Access::Read)?;
            }
            Expression::Assignment(assignment) => {
                let access = if assignment.operator.is_some() { Access::ReadWrite } else { Access::Write };
                self.resolve_assignable(cx, &assignment.target, access)?;
                self.resolve_expression(cx, &assignment.value, Access::Read)?;
            }
            Expression::Conditional(conditional) => {
                self.resolve_expression(cx, &conditional.test, Access::Read)?;
                self.resolve_expression(cx, &conditional.consequent, Access::Read)?;
                self.resolve_expression(cx, &conditional.alternate, Access::Read)?;
            }
            Expression::Is(is) => {
                self.resolve_expression(cx, &is.value, Access::Read)?;
                self.state.resolve_type(self.ctx, cx.scope, &is.ty, cx.is_static)?;
            }
            Expression::Array(array) => {
                if let Some(arg) = &array.type_arg {
                    self.state.resolve_type(self.ctx, cx.scope, arg, cx.is_static)?;
                }
                for element in &array.elements {
                    self.resolve_expression(cx, element, Access::Read)?;
                }
            }
            Expression::Map(map) => {
                for arg in &map.type_args {
                    self.state.resolve_type(self.ctx, cx.scope, arg, cx.is_static)?;
                }
                for entry in &map.entries {
                    self.resolve_expression(cx, &entry.key, Access::Read)?;
                    self.resolve_expression(cx, &entry.value, Access::Read)?;
                }
            }
            Expression::Function(function) => {
                self.resolve_function_literal(cx, function, false)?;
            }
            Expression::Parenthesized(paren) => self.resolve_expression(cx, &paren.inner, access)?,
        }
        Ok(())
    }

    /// Target of an assignment or `++`/`--`
    fn resolve_assignable(&mut self, cx: &ResolveContext, target: &Expression, access: Access) -> ResolveResult<()> {
        match target {
            Expression::Identifier(_) | Expression::Property(_) => self.resolve_expression(cx, target, access),
            Expression::Index(_) => self.resolve_expression(cx, target, Access::Read),
            Expression::Parenthesized(paren) => self.resolve_assignable(cx, &paren.inner, access),
            other => {
                self.resolve_expression(cx, other, Access::Read)?;
                let text = match other {
                    Expression::This(_) => "this",
                    Expression::Super(_) => "super",
                    _ => "expression",
                };
                self.ctx.report(*other.span(), ResolverErrorCode::CannotAssignTo, &[text]);
                Ok(())
            }
        }
    }

    /// Resolve a simple name used as a value
    pub(crate) fn resolve_identifier(
        &mut self,
        cx: &ResolveContext,
        ident: &Identifier,
        access: Access,
    ) -> ResolveResult<SymbolId> {
        let name = ident.name.as_str();
        if let Some(var) = cx.initializing {
            if self.state.symbols.name(var) == name {
                self.ctx
                    .report(ident.span, ResolverErrorCode::VariableReferencesSameNameInInitializer, &[name]);
                return Ok(SymbolId::NONE);
            }
        }
        if self.state.scopes.is_declared_later(cx.scope, name) {
            self.ctx
                .report(ident.span, ResolverErrorCode::UsingLocalVariableBeforeDeclaration, &[name]);
            return Ok(SymbolId::NONE);
        }

        let symbol = self.lookup(cx, name);
        if symbol.is_none() {
            if !self.report_hidden_private(cx, name, ident.span) && cx.reports_unresolved() {
                self.ctx.report(ident.span, ResolverErrorCode::CannotBeResolved, &[name]);
            }
            return Ok(SymbolId::NONE);
        }
        if self.check_reference(cx, symbol, name, ident.span, access) {
            self.state.bindings.bind_symbol(ident.id, symbol)?;
        }
        Ok(symbol)
    }

    /// Legality of a resolved name in `cx`; false when the use is meaningless
    pub(crate) fn check_reference(
        &mut self,
        cx: &ResolveContext,
        symbol: SymbolId,
        name: &str,
        span: Span,
        access: Access,
    ) -> bool {
        let kind = self.state.symbols.kind(symbol);
        let instance = self.state.symbols.is_instance_member(symbol);
        match kind {
            SymbolKind::Duplicate => {
                self.report_duplicate_import(name, symbol, span);
                return false;
            }
            SymbolKind::LibraryPrefix if access != Access::Qualifier => {
                self.ctx.report(span, ResolverErrorCode::PrefixIsNotAValue, &[name]);
                return false;
            }
            SymbolKind::TypeVariable => {
                self.ctx
                    .report(span, ResolverErrorCode::TypeVariableNotAllowedInIdentifier, &[name]);
                return false;
            }
            SymbolKind::Field => {
                if instance {
                    if cx.is_static {
                        self.ctx.report(span, ResolverErrorCode::IllegalFieldAccessFromStatic, &[name]);
                    } else if cx.in_field_initializer {
                        self.ctx.report(
                            span,
                            ResolverErrorCode::CannotUseInstanceFieldInInstanceFieldInitializer,
                            &[name],
                        );
                    } else if cx.in_initializer && access.reads() {
                        self.ctx
                            .report(span, ResolverErrorCode::CannotAccessFieldInInitializer, &[name]);
                    }
                }
                self.check_field_access(symbol, name, span, access);
            }
            SymbolKind::Method => {
                if access.writes() {
                    self.ctx.report(span, ResolverErrorCode::CannotAssignToMethod, &[name]);
                } else if instance {
                    if cx.is_static {
                        self.ctx.report(span, ResolverErrorCode::IllegalMethodAccessFromStatic, &[name]);
                    } else if cx.in_redirect {
                        self.ctx.report(span, ResolverErrorCode::InstanceMethodFromRedirect, &[name]);
                    } else if cx.in_initializer {
                        self.ctx.report(span, ResolverErrorCode::InstanceMethodFromInitializer, &[name]);
                    }
                }
            }
            SymbolKind::Variable | SymbolKind::Parameter => {
                if access.writes() && self.state.symbols.modifiers(symbol).is_final() {
                    self.ctx.report(span, ResolverErrorCode::CannotAssignToFinal, &[name]);
                }
            }
            SymbolKind::Class | SymbolKind::FunctionTypeAlias | SymbolKind::Dynamic | SymbolKind::Void => {
                if access.writes() {
                    self.ctx.report(span, ResolverErrorCode::CannotAssignTo, &[name]);
                }
            }
            _ => {}
        }
        true
    }

    /// Final fields, getter-only and setter-only accessors
    fn check_field_access(&mut self, field: SymbolId, name: &str, span: Span, access: Access) {
        let Some(data) = self.state.symbols.field(field) else { return };
        let (is_accessor, getter, setter) = (data.is_accessor(), data.getter, data.setter);
        if access.writes() {
            if is_accessor && setter.is_none() {
                self.ctx.report(span, ResolverErrorCode::FieldDoesNotHaveASetter, &[name]);
            } else if !is_accessor && self.state.symbols.modifiers(field).is_final() {
                self.ctx.report(span, ResolverErrorCode::CannotAssignToFinal, &[name]);
            }
        }
        if access.reads() && is_accessor && getter.is_none() {
            self.ctx.report(span, ResolverErrorCode::FieldDoesNotHaveAGetter, &[name]);
        }
    }

    /// `this` is legal only in instance code outside initializers
    pub(crate) fn check_this(&mut self, cx: &ResolveContext, this: &ThisExpression) -> bool {
        let code = if cx.class.is_none() {
            Some(ResolverErrorCode::ThisOutsideOfMethod)
        } else if cx.is_static {
            Some(ResolverErrorCode::ThisInStaticMethod)
        } else if cx.is_factory {
            Some(ResolverErrorCode::ThisInFactoryConstructor)
        } else if cx.in_field_initializer {
            Some(ResolverErrorCode::CannotUseThisInInstanceFieldInitializer)
        } else if cx.in_initializer {
            Some(ResolverErrorCode::ThisInInitializerAsExpression)
        } else {
            None
        };
        match code {
            Some(code) => {
                self.ctx.report(this.span, code, &[]);
                false
            }
            None => true,
        }
    }

    /// Validate `super` and bind it to the class's super pseudo-symbol
    pub(crate) fn check_super(&mut self, cx: &ResolveContext, sup: &SuperExpression) -> Option<SymbolId> {
        let Some(class) = cx.class else {
            self.ctx.report(sup.span, ResolverErrorCode::SuperOutsideOfMethod, &[]);
            return None;
        };
        if cx.is_static {
            self.ctx.report(sup.span, ResolverErrorCode::SuperInStaticMethod, &[]);
            return None;
        }
        if cx.is_factory {
            self.ctx.report(sup.span, ResolverErrorCode::SuperInFactoryConstructor, &[]);
            return None;
        }
        let symbol = self.state.symbols.super_symbol(class);
        if self.state.bindings.bind_symbol(sup.id, symbol).is_err() {
            return None;
        }
        self.state.symbols.class(class).and_then(|c| c.superclass)
    }

    /// `target.name`
    pub(crate) fn resolve_property(
        &mut self,
        cx: &ResolveContext,
        property: &PropertyAccess,
        access: Access,
    ) -> ResolveResult<SymbolId> {
        let name = property.name.name.as_str();
        let span = property.name.span;
        let member = match property.target.as_ref() {
            Expression::This(this) => {
                if !self.check_this(cx, this) {
                    return Ok(SymbolId::NONE);
                }
                let Some(class) = cx.class else { return Ok(SymbolId::NONE) };
                let Some(member) = self.visible_member(cx, class, name, span) else {
                    return Ok(SymbolId::NONE);
                };
                member
            }
            Expression::Super(sup) => {
                let Some(superclass) = self.check_super(cx, sup) else {
                    return Ok(SymbolId::NONE);
                };
                let Some(member) = self.visible_member(cx, superclass, name, span) else {
                    return Ok(SymbolId::NONE);
                };
                if !self.check_super_member(cx, superclass, member, name, span, false) {
                    return Ok(SymbolId::NONE);
                }
                member
            }
            Expression::Identifier(qualifier) => {
                let target = self.resolve_identifier(cx, qualifier, Access::Qualifier)?;
                match self.state.symbols.kind(target) {
                    SymbolKind::Class => self.static_member(cx, target, name, span, false),
                    SymbolKind::LibraryPrefix => {
                        match self.state.find_in_prefix(self.ctx, target, property.id, &property.name)? {
                            None => return Ok(SymbolId::NONE),
                            Some(found) if found.is_none() => {
                                self.ctx.report(span, ResolverErrorCode::CannotBeResolved, &[name]);
                                return Ok(SymbolId::NONE);
                            }
                            Some(found) => found,
                        }
                    }
                    _ => SymbolId::NONE,
                }
            }
            other => {
                self.resolve_expression(cx, other, Access::Read)?;
                SymbolId::NONE
            }
        };

        if member.is_none() {
            return Ok(SymbolId::NONE);
        }
        let member_cx = ResolveContext { is_static: false, ..*cx };
        if self.check_reference(&member_cx, member, name, span, access) {
            self.state.bindings.bind_symbol(property.id, member)?;
            trace!(name, "resolved property");
        }
        Ok(member)
    }

    /// Instance member `name` of `class` as seen from the current library.
    /// `None` once a private member of another library has been reported.
    pub(crate) fn visible_member(
        &mut self,
        cx: &ResolveContext,
        class: SymbolId,
        name: &str,
        span: Span,
    ) -> Option<SymbolId> {
        let member = self.state.scopes.find_member(&self.state.symbols, class, Some(cx.library), name);
        if !member.is_none() || !is_private_name(name) {
            return Some(member);
        }
        let hidden = self.state.scopes.find_member(&self.state.symbols, class, None, name);
        if !hidden.is_none() && self.report_private_member(cx, hidden, class, span) {
            return None;
        }
        Some(member)
    }

    /// Member `name` accessed through class `class`; must be static
    pub(crate) fn static_member(
        &mut self,
        cx: &ResolveContext,
        class: SymbolId,
        name: &str,
        span: Span,
        invoked: bool,
    ) -> SymbolId {
        let class_name = self.state.symbols.name(class).to_string();
        let member = self
            .state
            .symbols
            .class(class)
            .and_then(|c| c.members.get(name))
            .filter(|&m| self.state.symbols.kind(m) != SymbolKind::TypeVariable);
        let Some(member) = member else {
            let code = if invoked {
                ResolverErrorCode::CannotResolveMethodInClass
            } else {
                ResolverErrorCode::NotAStaticField
            };
            self.ctx.report(span, code, &[name, &class_name]);
            return SymbolId::NONE;
        };
        if self.report_private_member(cx, member, class, span) {
            return SymbolId::NONE;
        }
        if !self.state.symbols.get(member).is_static() {
            let code = if self.state.symbols.kind(member) == SymbolKind::Method {
                ResolverErrorCode::NotAStaticMethod
            } else {
                ResolverErrorCode::NotAStaticField
            };
            self.ctx.report(span, code, &[name, &class_name]);
            return SymbolId::NONE;
        }
        member
    }

    /// `super.name`: must exist, be an instance member and be outside initializers
    pub(crate) fn check_super_member(
        &mut self,
        cx: &ResolveContext,
        superclass: SymbolId,
        member: SymbolId,
        name: &str,
        span: Span,
        invoked: bool,
    ) -> bool {
        if member.is_none() {
            let super_name = self.state.symbols.name(superclass).to_string();
            let code = if invoked {
                ResolverErrorCode::CannotResolveMethodInClass
            } else {
                ResolverErrorCode::CannotResolveField
            };
            self.ctx.report(span, code, &[name, &super_name]);
            return false;
        }
        if self.state.symbols.get(member).is_static() {
            self.ctx
                .report(span, ResolverErrorCode::StaticMemberAccessedThroughSuper, &[name]);
            return false;
        }
        if cx.in_initializer {
            self.ctx.report(
                span,
                ResolverErrorCode::SuperMethodInvocationInConstructorInitializer,
                &[name],
            );
            return false;
        }
        true
    }

    /// Function literal or named local function
    ///
    /// A named local function is declared in the current scope before its
    /// body is resolved so that it can call itself.
    pub(crate) fn resolve_function_literal(
        &mut self,
        cx: &ResolveContext,
        function: &FunctionExpression,
        is_declaration: bool,
    ) -> ResolveResult<SymbolId> {
        let name = function.name.as_ref().map(|n| n.name.as_str()).unwrap_or("<function>");
        let symbol = self.state.symbols.add(
            Symbol::new(name, SymbolData::Method(MethodSymbol::default()))
                .with_modifiers(Modifiers::HAS_BODY)
                .with_enclosing(cx.function.unwrap_or(cx.enclosing))
                .with_span(function.span)
                .with_node(function.id),
        );
        self.state.bindings.declare(function.id, symbol)?;
        if is_declaration {
            if let Some(ident) = &function.name {
                self.declare_local(cx, ident, symbol)?;
            }
        }

        let scope = self.state.scopes.push(ScopeKind::Function, Some(cx.scope), Some(cx.library));
        let params = build_parameters(self.state, self.ctx, scope, symbol, &function.params, cx.is_static)?;
        let return_type = resolve_return_type(self.state, self.ctx, scope, function.return_type.as_ref(), cx.is_static)?;
        let ty = function_type(self.state, &params, return_type);
        if let Some(method) = self.state.symbols.method_mut(symbol) {
            method.parameters = params;
            method.return_type = return_type;
        }
        self.state.symbols.set_type(symbol, ty)?;

        let body_cx = ResolveContext {
            scope,
            function: Some(symbol),
            in_catch: false,
            in_generative_constructor: false,
            initializing: None,
            ..*cx
        };
        self.declare_parameters(&body_cx, &function.params)?;
        self.resolve_block(&body_cx, &function.body)?;
        self.state.scopes.pop(scope)?;
        Ok(symbol)
    }
}
