//! Name and type resolution over member bodies
//!
//! The resolver walks every function, constructor and field initializer
//! with a [`ResolveContext`] describing where it is: the current scope, the
//! enclosing member and class, the innermost function, and which
//! restricted positions (static code, initializer lists, field
//! initializers) it is inside. Each descent copies the context with the
//! fields it changes; nothing is restored by hand.
//!
//! Resolution results are written to the [`Bindings`](crate::bindings::Bindings)
//! side tables. Problems in the source are reported and resolution carries on
//! with a Dynamic or unbound result.

mod constructors;
mod expressions;
mod invocations;
mod statements;

use crate::builder::setter_key;
use crate::context::CompilerContext;
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::pipeline::Program;
use crate::scope::{ScopeId, ScopeKind, ScopeTable};
use crate::state::ProgramState;
use crate::symbols::{SymbolId, SymbolKind};
use rustc_hash::FxHashMap;
use sable_syntax::{ClassDecl, CompilationUnit, FieldList, FunctionBody, MethodDecl, Parameter, Span, TopLevelDecl};
use tracing::{debug, instrument, trace};

/// Where in the program the walk currently is
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolveContext {
    pub scope: ScopeId,
    pub library: SymbolId,
    /// Member, top-level element or field whose code is being resolved
    pub enclosing: SymbolId,
    pub class: Option<SymbolId>,
    /// Innermost function; labels only match within it
    pub function: Option<SymbolId>,
    pub is_static: bool,
    pub is_factory: bool,
    /// Constructor initializer list
    pub in_initializer: bool,
    /// Arguments of a `this(...)` redirection
    pub in_redirect: bool,
    /// Initializer of an instance field
    pub in_field_initializer: bool,
    pub in_catch: bool,
    pub in_generative_constructor: bool,
    /// Local variable whose initializer is being resolved
    pub initializing: Option<SymbolId>,
}

impl ResolveContext {
    fn new(scope: ScopeId, library: SymbolId, enclosing: SymbolId) -> Self {
        ResolveContext {
            scope,
            library,
            enclosing,
            class: None,
            function: None,
            is_static: true,
            is_factory: false,
            in_initializer: false,
            in_redirect: false,
            in_field_initializer: false,
            in_catch: false,
            in_generative_constructor: false,
            initializing: None,
        }
    }

    /// Code where an unresolved name cannot be a dynamic `this` member
    fn reports_unresolved(&self) -> bool {
        self.class.is_none() || self.is_static || self.is_factory || self.in_initializer
    }
}

/// How an expression is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
    /// Compound assignment and `++`/`--`
    ReadWrite,
    /// Left-hand side of `a.b`
    Qualifier,
}

impl Access {
    fn reads(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite | Access::Qualifier)
    }

    fn writes(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

pub struct Resolver<'s, 'c> {
    state: &'s mut ProgramState,
    ctx: &'s mut CompilerContext<'c>,
}

impl<'s, 'c> Resolver<'s, 'c> {
    pub fn new(state: &'s mut ProgramState, ctx: &'s mut CompilerContext<'c>) -> Self {
        Self { state, ctx }
    }

    /// Resolve every body in the program, then check constructor chains
    #[instrument(level = "debug", skip_all)]
    pub fn resolve(&mut self, program: &Program) -> ResolveResult<()> {
        for library in &program.libraries {
            let Some(&lib) = self.state.libraries.get(&library.name) else {
                continue;
            };
            let scope = self.state.symbols.library(lib).map(|l| l.scope).unwrap_or(ScopeTable::LANGUAGE);
            for unit in &library.units {
                self.resolve_unit(lib, scope, unit)?;
            }
            debug!(library = %library.name, bindings = self.state.bindings.symbol_count(), "resolved library");
        }
        // Redirect chains can span units; follow them once every target is bound
        for unit in program.libraries.iter().flat_map(|library| &library.units) {
            self.check_constructor_cycles(unit)?;
        }
        Ok(())
    }

    fn resolve_unit(&mut self, lib: SymbolId, scope: ScopeId, unit: &CompilationUnit) -> ResolveResult<()> {
        for decl in &unit.declarations {
            match decl {
                TopLevelDecl::Class(class) => self.resolve_class(lib, scope, class)?,
                TopLevelDecl::Function(function) => {
                    let symbol = self.state.bindings.expect_declaration(function.id)?;
                    let cx = ResolveContext::new(scope, lib, symbol);
                    self.resolve_function_body(&cx, symbol, function, ScopeKind::Method)?;
                }
                TopLevelDecl::Fields(list) => {
                    for field in &list.fields {
                        let Some(value) = &field.initializer else { continue };
                        let symbol = self.state.bindings.expect_declaration(field.id)?;
                        let cx = ResolveContext::new(scope, lib, symbol);
                        self.resolve_expression(&cx, value, Access::Read)?;
                    }
                }
                TopLevelDecl::TypeAlias(_) => {}
            }
        }
        Ok(())
    }

    fn resolve_class(&mut self, lib: SymbolId, parent: ScopeId, decl: &ClassDecl) -> ResolveResult<()> {
        let class = self.state.bindings.expect_declaration(decl.id)?;
        trace!(class = %decl.name.name, "resolving class");
        let scope = self.state.scopes.push(ScopeKind::Class(class), Some(parent), Some(lib));
        let cx = ResolveContext {
            class: Some(class),
            is_static: false,
            ..ResolveContext::new(scope, lib, class)
        };

        for list in decl.field_lists() {
            self.resolve_field_initializers(&cx, list)?;
        }
        for method in decl.methods() {
            let symbol = self.state.bindings.expect_declaration(method.id)?;
            if self.state.symbols.kind(symbol) == SymbolKind::Constructor {
                self.resolve_constructor(&cx, class, method, symbol)?;
            } else {
                let method_cx = ResolveContext {
                    enclosing: symbol,
                    is_static: self.state.symbols.get(symbol).is_static(),
                    ..cx
                };
                self.resolve_function_body(&method_cx, symbol, method, ScopeKind::Method)?;
            }
        }

        let needs_default = self
            .state
            .symbols
            .class(class)
            .is_some_and(|c| !c.is_interface && !c.constructors.iter().any(|&ctor| self.constructs(ctor, class)));
        if needs_default {
            let synthetic = self.synthetic_constructor(class)?;
            self.resolve_implicit_super(class, synthetic, decl.name.span)?;
            if !decl.modifiers.is_native() {
                self.check_final_fields(class, &FxHashMap::default(), decl.name.span);
            }
        }

        self.state.scopes.pop(scope)
    }

    fn resolve_field_initializers(&mut self, cx: &ResolveContext, list: &FieldList) -> ResolveResult<()> {
        let is_static = list.modifiers.is_static();
        for field in &list.fields {
            let Some(value) = &field.initializer else { continue };
            let symbol = self.state.bindings.expect_declaration(field.id)?;
            let field_cx = ResolveContext {
                enclosing: symbol,
                is_static,
                in_field_initializer: !is_static,
                ..*cx
            };
            self.resolve_expression(&field_cx, value, Access::Read)?;
        }
        Ok(())
    }

    /// Parameters, default values and body of a method or top-level function
    fn resolve_function_body(
        &mut self,
        cx: &ResolveContext,
        symbol: SymbolId,
        decl: &MethodDecl,
        kind: ScopeKind,
    ) -> ResolveResult<()> {
        let scope = self.state.scopes.push(kind, Some(cx.scope), Some(cx.library));
        let body_cx = ResolveContext {
            scope,
            enclosing: symbol,
            function: Some(symbol),
            ..*cx
        };
        self.declare_parameters(&body_cx, &decl.params)?;
        if let Some(FunctionBody::Block(block)) = &decl.body {
            self.resolve_block(&body_cx, block)?;
        }
        self.state.scopes.pop(scope)
    }

    /// Bind parameter symbols in the current frame and resolve default values
    fn declare_parameters(&mut self, cx: &ResolveContext, params: &[Parameter]) -> ResolveResult<()> {
        for param in params {
            if let Some(value) = &param.default_value {
                self.resolve_expression(cx, value, Access::Read)?;
            }
            let symbol = self.state.bindings.expect_declaration(param.id)?;
            if self.state.scopes.local(cx.scope, &param.name.name).is_none() {
                self.state.scopes.declare(cx.scope, param.name.name.clone(), symbol);
            }
        }
        Ok(())
    }

    /// Scope lookup of `name`, falling back to the setter-only key
    fn lookup(&self, cx: &ResolveContext, name: &str) -> SymbolId {
        let found = self.state.scopes.find(&self.state.symbols, cx.scope, Some(cx.library), name);
        if !found.is_none() {
            return found;
        }
        self.state
            .scopes
            .find(&self.state.symbols, cx.scope, Some(cx.library), &setter_key(name))
    }

    /// Report a private name that exists in another library; true when reported
    fn report_hidden_private(&mut self, cx: &ResolveContext, name: &str, span: Span) -> bool {
        if !sable_syntax::is_private_name(name) {
            return false;
        }
        let mut hidden = self.state.scopes.find(&self.state.symbols, cx.scope, None, name);
        if hidden.is_none() {
            hidden = self.state.scopes.find(&self.state.symbols, cx.scope, None, &setter_key(name));
        }
        if hidden.is_none() {
            return false;
        }
        let owner = self.state.library_name(hidden);
        self.ctx
            .report(span, ResolverErrorCode::IllegalAccessToPrivate, &[name, &owner]);
        true
    }

    /// Report a use of a name that several imports provide
    fn report_duplicate_import(&mut self, name: &str, duplicate: SymbolId, span: Span) {
        let libraries = self.state.describe_duplicate(duplicate);
        let related = self.state.duplicate_spans(duplicate);
        self.ctx.report_with_related(
            span,
            ResolverErrorCode::DuplicateImportedName,
            &[name, &libraries],
            related,
        );
    }

    /// Whether `member` of another class is private to a library other than the caller's
    fn report_private_member(&mut self, cx: &ResolveContext, member: SymbolId, class: SymbolId, span: Span) -> bool {
        if !self.state.symbols.is_private_to_other(member, cx.library) {
            return false;
        }
        let name = self.state.symbols.name(member).to_string();
        let class_name = self.state.symbols.name(class).to_string();
        let owner = self.state.library_name(member);
        self.ctx.report(
            span,
            ResolverErrorCode::IllegalAccessToPrivateMember,
            &[&name, &class_name, &owner],
        );
        true
    }

    fn constructs(&self, constructor: SymbolId, class: SymbolId) -> bool {
        self.state
            .symbols
            .constructor(constructor)
            .is_some_and(|c| c.constructor_type == class)
    }
}
