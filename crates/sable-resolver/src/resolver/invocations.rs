//! Call resolution: `f()`, `target.m()` and argument lists

use super::{Access, ResolveContext, Resolver};
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::symbols::{SymbolId, SymbolKind};
use rustc_hash::FxHashSet;
use sable_syntax::{Arguments, Expression, MethodCall, Span, UnqualifiedCall};

impl<'s, 'c> Resolver<'s, 'c> {
    pub(crate) fn resolve_arguments(&mut self, cx: &ResolveContext, args: &Arguments) -> ResolveResult<()> {
        for value in &args.positional {
            self.resolve_expression(cx, value, Access::Read)?;
        }
        let mut seen = FxHashSet::default();
        for arg in &args.named {
            if !seen.insert(arg.name.name.as_str()) {
                self.ctx
                    .report(arg.name.span, ResolverErrorCode::DuplicateNamedArgument, &[&arg.name.name]);
            }
            self.resolve_expression(cx, &arg.value, Access::Read)?;
        }
        Ok(())
    }

    /// `name(args)`
    pub(crate) fn resolve_unqualified_call(&mut self, cx: &ResolveContext, call: &UnqualifiedCall) -> ResolveResult<()> {
        let name = call.target.name.as_str();
        let span = call.target.span;
        let symbol = self.lookup(cx, name);

        if symbol.is_none() {
            let label = self.state.scopes.find_label(&self.state.symbols, cx.scope, name, cx.function);
            if !label.is_none() {
                self.ctx.report(span, ResolverErrorCode::CannotCallLabel, &[name]);
            } else if !self.report_hidden_private(cx, name, span) && cx.reports_unresolved() {
                self.ctx.report(span, ResolverErrorCode::CannotResolveMethod, &[name]);
            }
            return self.resolve_arguments(cx, &call.args);
        }

        if self.check_invocation(cx, symbol, name, span) {
            self.state.bindings.bind_symbol(call.id, symbol)?;
            self.state.bindings.bind_symbol(call.target.id, symbol)?;
        }
        self.resolve_arguments(cx, &call.args)
    }

    /// Whether `symbol` may be invoked by name from `cx`
    fn check_invocation(&mut self, cx: &ResolveContext, symbol: SymbolId, name: &str, span: Span) -> bool {
        match self.state.symbols.kind(symbol) {
            SymbolKind::Class => {
                self.ctx.report(span, ResolverErrorCode::DidYouMeanNew, &[name]);
                false
            }
            SymbolKind::Method if self.state.symbols.is_instance_member(symbol) => {
                let code = if cx.is_static {
                    Some(ResolverErrorCode::InstanceMethodFromStatic)
                } else if cx.in_redirect {
                    Some(ResolverErrorCode::InstanceMethodFromRedirect)
                } else if cx.in_initializer {
                    Some(ResolverErrorCode::InstanceMethodFromInitializer)
                } else {
                    None
                };
                if let Some(code) = code {
                    self.ctx.report(span, code, &[name]);
                }
                true
            }
            _ => self.check_reference(cx, symbol, name, span, Access::Read),
        }
    }

    /// `target.name(args)`
    pub(crate) fn resolve_method_call(&mut self, cx: &ResolveContext, call: &MethodCall) -> ResolveResult<()> {
        let name = call.name.name.as_str();
        let span = call.name.span;
        let member = match call.target.as_ref() {
            Expression::This(this) => match cx.class {
                Some(class) if self.check_this(cx, this) => match self.visible_member(cx, class, name, span) {
                    Some(member) if member.is_none() || self.check_invocation(cx, member, name, span) => member,
                    _ => SymbolId::NONE,
                },
                _ => SymbolId::NONE,
            },
            Expression::Super(sup) => match self.check_super(cx, sup) {
                Some(superclass) => match self.visible_member(cx, superclass, name, span) {
                    Some(member) if self.check_super_member(cx, superclass, member, name, span, true) => member,
                    _ => SymbolId::NONE,
                },
                None => SymbolId::NONE,
            },
            Expression::Identifier(qualifier) => {
                let target = self.resolve_identifier(cx, qualifier, Access::Qualifier)?;
                match self.state.symbols.kind(target) {
                    SymbolKind::Class => self.static_member(cx, target, name, span, true),
                    SymbolKind::LibraryPrefix => self.prefixed_callee(cx, target, call)?,
                    _ => SymbolId::NONE,
                }
            }
            other => {
                self.resolve_expression(cx, other, Access::Read)?;
                SymbolId::NONE
            }
        };

        if !member.is_none() {
            self.state.bindings.bind_symbol(call.id, member)?;
        }
        self.resolve_arguments(cx, &call.args)
    }

    /// `prefix.name(args)`
    fn prefixed_callee(&mut self, cx: &ResolveContext, prefix: SymbolId, call: &MethodCall) -> ResolveResult<SymbolId> {
        let name = call.name.name.as_str();
        let span = call.name.span;
        let Some(found) = self.state.find_in_prefix(self.ctx, prefix, call.id, &call.name)? else {
            return Ok(SymbolId::NONE);
        };
        if found.is_none() {
            self.ctx.report(span, ResolverErrorCode::CannotResolveMethod, &[name]);
            return Ok(SymbolId::NONE);
        }
        Ok(if self.check_invocation(cx, found, name, span) { found } else { SymbolId::NONE })
    }
}
