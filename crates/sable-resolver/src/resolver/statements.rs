//! Statement resolution: blocks, locals, loops, labels and exception handling

use super::{Access, ResolveContext, Resolver};
use crate::builder::build_parameters;
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::scope::ScopeKind;
use crate::symbols::{LabelSymbol, Symbol, SymbolData, SymbolId};
use crate::types::TypeId;
use rustc_hash::FxHashSet;
use sable_syntax::{
    Block, CatchClause, ForInTarget, Identifier, JumpStatement, Modifiers, Statement, SwitchStatement, VariableDecl,
};
use std::slice;

impl<'s, 'c> Resolver<'s, 'c> {
    pub(crate) fn resolve_block(&mut self, cx: &ResolveContext, block: &Block) -> ResolveResult<()> {
        let scope = self.state.scopes.push(ScopeKind::Block, Some(cx.scope), Some(cx.library));
        let block_cx = ResolveContext { scope, ..*cx };
        self.resolve_statements(&block_cx, &block.statements)?;
        self.state.scopes.pop(scope)
    }

    /// Statements sharing one frame; names they declare are unusable before their declaration
    fn resolve_statements(&mut self, cx: &ResolveContext, statements: &[Statement]) -> ResolveResult<()> {
        for statement in statements {
            match statement {
                Statement::VariableDecl(decl) => {
                    for declarator in &decl.declarators {
                        self.state.scopes.mark_declared_later(cx.scope, &declarator.name.name);
                    }
                }
                Statement::FunctionDecl(function) => {
                    if let Some(name) = &function.name {
                        self.state.scopes.mark_declared_later(cx.scope, &name.name);
                    }
                }
                _ => {}
            }
        }
        for statement in statements {
            self.resolve_statement(cx, statement)?;
        }
        Ok(())
    }

    fn resolve_statement(&mut self, cx: &ResolveContext, statement: &Statement) -> ResolveResult<()> {
        match statement {
            Statement::Block(block) => self.resolve_block(cx, block),
            Statement::VariableDecl(decl) => self.resolve_variable_decl(cx, decl),
            Statement::Expression(stmt) => self.resolve_expression(cx, &stmt.expression, Access::Read),
            Statement::If(stmt) => {
                self.resolve_expression(cx, &stmt.condition, Access::Read)?;
                self.resolve_statement(cx, &stmt.then_branch)?;
                if let Some(otherwise) = &stmt.else_branch {
                    self.resolve_statement(cx, otherwise)?;
                }
                Ok(())
            }
            Statement::While(stmt) => {
                self.resolve_expression(cx, &stmt.condition, Access::Read)?;
                self.in_loop(cx, |this, loop_cx| this.resolve_statement(loop_cx, &stmt.body))
            }
            Statement::DoWhile(stmt) => {
                self.in_loop(cx, |this, loop_cx| this.resolve_statement(loop_cx, &stmt.body))?;
                self.resolve_expression(cx, &stmt.condition, Access::Read)
            }
            Statement::For(stmt) => self.in_loop(cx, |this, loop_cx| {
                if let Some(init) = &stmt.init {
                    this.resolve_statement(loop_cx, init)?;
                }
                if let Some(condition) = &stmt.condition {
                    this.resolve_expression(loop_cx, condition, Access::Read)?;
                }
                for update in &stmt.update {
                    this.resolve_expression(loop_cx, update, Access::Read)?;
                }
                this.resolve_statement(loop_cx, &stmt.body)
            }),
            Statement::ForIn(stmt) => {
                self.resolve_expression(cx, &stmt.iterable, Access::Read)?;
                self.in_loop(cx, |this, loop_cx| {
                    match &stmt.variable {
                        ForInTarget::Declaration(decl) => this.resolve_variable_decl(loop_cx, decl)?,
                        ForInTarget::Identifier(ident) => {
                            this.resolve_identifier(loop_cx, ident, Access::Write)?;
                        }
                    }
                    this.resolve_statement(loop_cx, &stmt.body)
                })
            }
            Statement::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    if cx.in_generative_constructor {
                        self.ctx.report(stmt.span, ResolverErrorCode::InvalidReturnInConstructor, &[]);
                    }
                    self.resolve_expression(cx, value, Access::Read)?;
                }
                Ok(())
            }
            Statement::Break(jump) | Statement::Continue(jump) => self.resolve_jump(cx, jump),
            Statement::Throw(stmt) => match &stmt.value {
                Some(value) => self.resolve_expression(cx, value, Access::Read),
                None => {
                    if !cx.in_catch {
                        self.ctx.report(stmt.span, ResolverErrorCode::RethrowNotInCatch, &[]);
                    }
                    Ok(())
                }
            },
            Statement::Try(stmt) => {
                self.resolve_block(cx, &stmt.body)?;
                for clause in &stmt.catches {
                    self.resolve_catch(cx, clause)?;
                }
                if let Some(finally) = &stmt.finally {
                    self.resolve_block(cx, finally)?;
                }
                Ok(())
            }
            Statement::Switch(stmt) => self.resolve_switch(cx, stmt),
            Statement::Labeled(stmt) => {
                let label = self.declare_label_symbol(cx, &stmt.label)?;
                let scope = self.state.scopes.push(ScopeKind::Block, Some(cx.scope), Some(cx.library));
                self.state.scopes.declare_label(scope, label);
                self.resolve_statement(&ResolveContext { scope, ..*cx }, &stmt.body)?;
                self.state.scopes.pop(scope)
            }
            Statement::FunctionDecl(function) => {
                self.resolve_function_literal(cx, function, true)?;
                Ok(())
            }
            Statement::Assert(stmt) => self.resolve_expression(cx, &stmt.condition, Access::Read),
            Statement::Empty(_) => Ok(()),
        }
    }

    fn in_loop(
        &mut self,
        cx: &ResolveContext,
        body: impl FnOnce(&mut Self, &ResolveContext) -> ResolveResult<()>,
    ) -> ResolveResult<()> {
        let scope = self.state.scopes.push(ScopeKind::Loop, Some(cx.scope), Some(cx.library));
        body(self, &ResolveContext { scope, ..*cx })?;
        self.state.scopes.pop(scope)
    }

    pub(crate) fn resolve_variable_decl(&mut self, cx: &ResolveContext, decl: &VariableDecl) -> ResolveResult<()> {
        let ty = match &decl.type_annotation {
            Some(node) => self.state.resolve_type(self.ctx, cx.scope, node, cx.is_static)?,
            None => TypeId::DYNAMIC,
        };
        for declarator in &decl.declarators {
            let name = declarator.name.name.as_str();
            let mut modifiers = decl.modifiers;
            if declarator.initializer.is_some() {
                modifiers |= Modifiers::INITIALIZED;
            }
            let symbol = self.state.symbols.add(
                Symbol::new(name, SymbolData::Variable)
                    .with_modifiers(modifiers)
                    .with_enclosing(cx.function.unwrap_or(cx.enclosing))
                    .with_span(declarator.name.span)
                    .with_node(declarator.id),
            );
            self.state.symbols.set_type(symbol, ty)?;
            self.state.bindings.declare(declarator.id, symbol)?;

            match &declarator.initializer {
                Some(value) => {
                    let init_cx = ResolveContext {
                        initializing: Some(symbol),
                        ..*cx
                    };
                    self.resolve_expression(&init_cx, value, Access::Read)?;
                }
                None if decl.modifiers.is_const() => {
                    self.ctx
                        .report(declarator.name.span, ResolverErrorCode::ConstantsMustBeInitialized, &[name]);
                }
                None => {}
            }
            self.declare_local(cx, &declarator.name, symbol)?;
        }
        Ok(())
    }

    /// Bind a local in the current frame
    ///
    /// A second declaration in the same frame is an error; hiding a local of
    /// an enclosing block of the same function is a warning.
    pub(crate) fn declare_local(&mut self, cx: &ResolveContext, ident: &Identifier, symbol: SymbolId) -> ResolveResult<()> {
        let name = ident.name.as_str();
        self.state.scopes.mark_declared(cx.scope, name);
        if let Some(previous) = self.state.scopes.local(cx.scope, name) {
            let (location, related) = self.declared_at(previous);
            self.ctx.report_with_related(
                ident.span,
                ResolverErrorCode::DuplicateLocalVariable,
                &[name, &location],
                related,
            );
            return Ok(());
        }
        if let Some(outer) = self.state.scopes.find_outer_local(&self.state.symbols, cx.scope, name) {
            let (location, related) = self.declared_at(outer);
            self.ctx.report_with_related(
                ident.span,
                ResolverErrorCode::ShadowedLocalVariable,
                &[name, &location],
                related,
            );
        }
        self.state.scopes.declare(cx.scope, name, symbol);
        Ok(())
    }

    fn declared_at(&self, symbol: SymbolId) -> (String, Vec<sable_syntax::Span>) {
        match self.state.symbols.get(symbol).span {
            Some(span) => (self.ctx.location(span), vec![span]),
            None => (String::new(), Vec::new()),
        }
    }

    fn declare_label_symbol(&mut self, cx: &ResolveContext, label: &Identifier) -> ResolveResult<SymbolId> {
        let symbol = self.state.symbols.add(
            Symbol::new(&label.name, SymbolData::Label(LabelSymbol { function: cx.function }))
                .with_enclosing(cx.function.unwrap_or(cx.enclosing))
                .with_span(label.span)
                .with_node(label.id),
        );
        self.state.bindings.declare(label.id, symbol)?;
        Ok(symbol)
    }

    fn resolve_jump(&mut self, cx: &ResolveContext, jump: &JumpStatement) -> ResolveResult<()> {
        let Some(label) = &jump.label else { return Ok(()) };
        let found = self
            .state
            .scopes
            .find_label(&self.state.symbols, cx.scope, &label.name, cx.function);
        if found.is_none() {
            self.ctx
                .report(label.span, ResolverErrorCode::CannotResolveLabel, &[&label.name]);
            return Ok(());
        }
        self.state.bindings.bind_symbol(label.id, found)
    }

    fn resolve_switch(&mut self, cx: &ResolveContext, stmt: &SwitchStatement) -> ResolveResult<()> {
        self.resolve_expression(cx, &stmt.discriminant, Access::Read)?;
        let scope = self.state.scopes.push(ScopeKind::Switch, Some(cx.scope), Some(cx.library));
        let switch_cx = ResolveContext { scope, ..*cx };

        let mut seen = FxHashSet::default();
        for case in &stmt.cases {
            for label in &case.labels {
                if !seen.insert(label.name.as_str()) {
                    self.ctx
                        .report(label.span, ResolverErrorCode::DuplicateLabelInSwitch, &[&label.name]);
                    continue;
                }
                let symbol = self.declare_label_symbol(&switch_cx, label)?;
                self.state.scopes.declare_label(scope, symbol);
            }
        }

        for case in &stmt.cases {
            if let Some(test) = &case.test {
                self.resolve_expression(&switch_cx, test, Access::Read)?;
            }
            let body = self.state.scopes.push(ScopeKind::Block, Some(scope), Some(cx.library));
            self.resolve_statements(&ResolveContext { scope: body, ..switch_cx }, &case.body)?;
            self.state.scopes.pop(body)?;
        }
        self.state.scopes.pop(scope)
    }

    fn resolve_catch(&mut self, cx: &ResolveContext, clause: &CatchClause) -> ResolveResult<()> {
        let scope = self.state.scopes.push(ScopeKind::Catch, Some(cx.scope), Some(cx.library));
        let owner = cx.function.unwrap_or(cx.enclosing);
        let catch_cx = ResolveContext {
            scope,
            in_catch: true,
            ..*cx
        };
        let params = slice::from_ref(&clause.exception);
        build_parameters(self.state, self.ctx, scope, owner, params, cx.is_static)?;
        self.declare_parameters(&catch_cx, params)?;
        if let Some(trace) = &clause.stack_trace {
            let params = slice::from_ref(trace);
            build_parameters(self.state, self.ctx, scope, owner, params, cx.is_static)?;
            self.declare_parameters(&catch_cx, params)?;
        }
        self.resolve_block(&catch_cx, &clause.body)?;
        self.state.scopes.pop(scope)
    }
}
