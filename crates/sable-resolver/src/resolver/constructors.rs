//! Constructors: `new` targets, initializer lists, super calls and redirects

use super::{Access, ResolveContext, Resolver};
use crate::builder::function_type;
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::scope::ScopeKind;
use crate::symbols::{ConstructorSymbol, Symbol, SymbolData, SymbolId, SymbolKind};
use crate::types::TypeId;
use rustc_hash::{FxHashMap, FxHashSet};
use sable_syntax::{
    CompilationUnit, ConstructorCall, ConstructorRef, FieldInitializer, FunctionBody, Initializer, MethodDecl,
    Modifiers, NewExpression, Span, TopLevelDecl, TypeNode,
};
use tracing::trace;

fn display_name(class: &str, raw_name: &str) -> String {
    if raw_name.is_empty() {
        class.to_string()
    } else {
        format!("{class}.{raw_name}")
    }
}

impl<'s, 'c> Resolver<'s, 'c> {
    pub(super) fn resolve_constructor(
        &mut self,
        cx: &ResolveContext,
        class: SymbolId,
        decl: &MethodDecl,
        ctor: SymbolId,
    ) -> ResolveResult<()> {
        let is_factory = decl.modifiers.is_factory();
        let scope = self.state.scopes.push(ScopeKind::Method, Some(cx.scope), Some(cx.library));
        let body_cx = ResolveContext {
            scope,
            enclosing: ctor,
            function: Some(ctor),
            is_static: false,
            is_factory,
            in_generative_constructor: !is_factory,
            ..*cx
        };
        self.declare_parameters(&body_cx, &decl.params)?;

        if let Some(target) = &decl.redirect {
            if let Some(found) = self.resolve_constructor_ref(&body_cx, target)? {
                self.state.symbols.constructor_mut(ctor)?.redirecting_factory = Some(found);
            }
        }
        self.resolve_initializers(&body_cx, class, decl, ctor)?;
        if let Some(FunctionBody::Block(block)) = &decl.body {
            self.resolve_block(&body_cx, block)?;
        }
        self.state.scopes.pop(scope)
    }

    /// `new T(args)` / `const T.name(args)`
    pub(crate) fn resolve_new(&mut self, cx: &ResolveContext, new: &NewExpression) -> ResolveResult<()> {
        if let Some(ctor) = self.resolve_constructor_ref(cx, &new.constructor)? {
            self.state.bindings.bind_symbol(new.id, ctor)?;
        }
        self.resolve_arguments(cx, &new.args)
    }

    /// Constructor named by a `new` target or a redirecting factory
    ///
    /// `Q.name` is ambiguous between a prefixed class and a named
    /// constructor; a qualifier that names an import prefix selects the
    /// first reading.
    pub(crate) fn resolve_constructor_ref(
        &mut self,
        cx: &ResolveContext,
        target: &ConstructorRef,
    ) -> ResolveResult<Option<SymbolId>> {
        let display = target.to_string();
        let (class, raw_name) = match target {
            ConstructorRef::Type(node) => (self.constructed_class(cx, node)?, ""),
            ConstructorRef::Named(named) => match named.qualifier.as_ref() {
                ConstructorRef::Type(q) if self.names_prefix(cx, q) => {
                    let node = TypeNode {
                        id: named.id,
                        prefix: Some(q.name.clone()),
                        name: named.name.clone(),
                        args: named.type_args.clone(),
                        span: named.span,
                    };
                    (self.constructed_class(cx, &node)?, "")
                }
                ConstructorRef::Type(q) => {
                    if !named.type_args.is_empty() {
                        self.ctx
                            .report(named.span, ResolverErrorCode::TypeArgumentsOnlyOnClass, &[&display]);
                    }
                    (self.constructed_class(cx, q)?, named.name.name.as_str())
                }
                ConstructorRef::Named(inner) => match inner.qualifier.as_ref() {
                    ConstructorRef::Type(p) if self.names_prefix(cx, p) => {
                        if !named.type_args.is_empty() {
                            self.ctx
                                .report(named.span, ResolverErrorCode::TypeArgumentsOnlyOnClass, &[&display]);
                        }
                        let node = TypeNode {
                            id: inner.id,
                            prefix: Some(p.name.clone()),
                            name: inner.name.clone(),
                            args: inner.type_args.clone(),
                            span: inner.span,
                        };
                        (self.constructed_class(cx, &node)?, named.name.name.as_str())
                    }
                    _ => {
                        self.ctx.report(named.span, ResolverErrorCode::TooManyQualifiers, &[&display]);
                        return Ok(None);
                    }
                },
            },
        };
        let Some(class) = class else { return Ok(None) };
        self.find_constructor_for(cx, class, raw_name, *target.span(), &display)
    }

    /// Whether a bare qualifier names an import prefix
    fn names_prefix(&self, cx: &ResolveContext, qualifier: &TypeNode) -> bool {
        qualifier.prefix.is_none()
            && qualifier.args.is_empty()
            && self.state.symbols.kind(self.lookup(cx, &qualifier.name.name)) == SymbolKind::LibraryPrefix
    }

    /// Class instantiated by a `new` target type
    fn constructed_class(&mut self, cx: &ResolveContext, node: &TypeNode) -> ResolveResult<Option<SymbolId>> {
        if node.prefix.is_none() {
            let found = self.lookup(cx, &node.name.name);
            if self.state.symbols.kind(found) == SymbolKind::TypeVariable {
                self.ctx.report(
                    node.span,
                    ResolverErrorCode::NewExpressionCantUseTypeVariable,
                    &[&node.name.name],
                );
                return Ok(None);
            }
        }
        let ty = self.state.resolve_type(self.ctx, cx.scope, node, cx.is_static)?;
        if let Some(class) = self.state.types.class_of(ty) {
            return Ok(Some(class));
        }
        let silent = ty == TypeId::DYNAMIC && self.state.bindings.symbol(node.id) != Some(SymbolId::DYNAMIC);
        if !silent {
            self.ctx.report(node.span, ResolverErrorCode::NotAClass, &[&node.to_string()]);
        }
        Ok(None)
    }

    /// Constructor `raw_name` of `class`, going through the default class of an interface
    fn find_constructor_for(
        &mut self,
        cx: &ResolveContext,
        class: SymbolId,
        raw_name: &str,
        span: Span,
        shown: &str,
    ) -> ResolveResult<Option<SymbolId>> {
        if self.private_constructor(cx, class, raw_name, span) {
            return Ok(None);
        }
        let Some(data) = self.state.symbols.class(class) else { return Ok(None) };
        let (is_interface, default_class) = (data.is_interface, data.default_class);
        let own = self.state.symbols.find_constructor(class, raw_name, class);

        if !is_interface {
            let found = match own {
                Some(ctor) => Some(ctor),
                None if raw_name.is_empty() && !self.declares_constructors(class) => {
                    Some(self.synthetic_constructor(class)?)
                }
                None => None,
            };
            if found.is_none() {
                self.ctx.report(span, ResolverErrorCode::CannotResolveConstructor, &[shown]);
            }
            return Ok(found);
        }

        let Some(default) = default_class.and_then(|ty| self.state.types.class_of(ty)) else {
            if own.is_none() {
                self.ctx.report(span, ResolverErrorCode::CannotResolveConstructor, &[shown]);
            }
            return Ok(own);
        };
        let target = match self
            .state
            .symbols
            .find_constructor(default, raw_name, class)
            .or_else(|| self.state.symbols.find_constructor(default, raw_name, default))
        {
            Some(ctor) => Some(ctor),
            None if raw_name.is_empty() && !self.declares_constructors(default) => {
                Some(self.synthetic_constructor(default)?)
            }
            None => None,
        };
        let Some(target) = target else {
            let default_name = self.state.symbols.name(default).to_string();
            self.ctx.report(
                span,
                ResolverErrorCode::DefaultConstructorUnresolved,
                &[shown, &default_name],
            );
            return Ok(own);
        };
        if let Some(interface_ctor) = own {
            let data = self.state.symbols.constructor_mut(interface_ctor)?;
            if data.default_constructor.is_none() {
                data.default_constructor = Some(target);
            }
        }
        trace!(name = %shown, "resolved through default class");
        Ok(Some(target))
    }

    fn private_constructor(&mut self, cx: &ResolveContext, class: SymbolId, raw_name: &str, span: Span) -> bool {
        if !sable_syntax::is_private_name(raw_name) || self.state.symbols.library_of(class) == Some(cx.library) {
            return false;
        }
        let class_name = self.state.symbols.name(class).to_string();
        let owner = self.state.library_name(class);
        self.ctx.report(
            span,
            ResolverErrorCode::IllegalAccessToPrivateMember,
            &[raw_name, &class_name, &owner],
        );
        true
    }

    /// Whether `class` declares any constructor of its own type
    fn declares_constructors(&self, class: SymbolId) -> bool {
        self.state
            .symbols
            .class(class)
            .is_some_and(|c| c.constructors.iter().any(|&ctor| self.constructs(ctor, class)))
    }

    /// Implicit no-argument constructor of a class that declares none
    ///
    /// Created on first request and cached; never added to the class's
    /// constructor list.
    pub(crate) fn synthetic_constructor(&mut self, class: SymbolId) -> ResolveResult<SymbolId> {
        if let Some(&existing) = self.state.synthetic_constructors.get(&class) {
            return Ok(existing);
        }
        let name = self.state.symbols.name(class).to_string();
        let mut symbol = Symbol::new(
            name,
            SymbolData::Constructor(ConstructorSymbol {
                constructor_type: class,
                ..ConstructorSymbol::default()
            }),
        )
        .with_modifiers(Modifiers::SYNTHETIC)
        .with_enclosing(class);
        if let Some(span) = self.state.symbols.get(class).span {
            symbol = symbol.with_span(span);
        }
        let ctor = self.state.symbols.add(symbol);
        let class_ty = self.state.symbols.ty(class);
        let ty = function_type(self.state, &[], class_ty);
        self.state.symbols.constructor_mut(ctor)?.method.return_type = class_ty;
        self.state.symbols.set_type(ctor, ty)?;
        self.state.synthetic_constructors.insert(class, ctor);
        Ok(ctor)
    }

    /// Unnamed constructor of the superclass, called when no initializer names one
    pub(super) fn resolve_implicit_super(&mut self, class: SymbolId, ctor: SymbolId, span: Span) -> ResolveResult<()> {
        let Some(superclass) = self.state.symbols.class(class).and_then(|c| c.superclass) else {
            return Ok(());
        };
        let target = match self.state.symbols.find_constructor(superclass, "", superclass) {
            Some(found) => Some(found),
            None if !self.declares_constructors(superclass) => Some(self.synthetic_constructor(superclass)?),
            None => None,
        };
        match target {
            Some(target) => self.state.symbols.constructor_mut(ctor)?.super_target = Some(target),
            None => {
                let name = self.state.symbols.name(superclass).to_string();
                self.ctx
                    .report(span, ResolverErrorCode::CannotResolveImplicitSuperConstructor, &[&name]);
            }
        }
        Ok(())
    }

    fn resolve_initializers(
        &mut self,
        cx: &ResolveContext,
        class: SymbolId,
        decl: &MethodDecl,
        ctor: SymbolId,
    ) -> ResolveResult<()> {
        let display = decl.name.to_string();
        let span = decl.name.span();
        let is_factory = decl.modifiers.is_factory();
        let init_cx = ResolveContext { in_initializer: true, ..*cx };

        let mut initialized: FxHashMap<SymbolId, Span> = FxHashMap::default();
        for param in decl.params.iter().filter(|p| p.field_initializer) {
            let symbol = self.state.bindings.expect_declaration(param.id)?;
            let Some(field) = self.state.symbols.parameter(symbol).and_then(|p| p.initialized_field) else {
                continue;
            };
            let modifiers = self.state.symbols.modifiers(field);
            if modifiers.is_final() && modifiers.contains(Modifiers::INITIALIZED) {
                self.ctx
                    .report(param.name.span, ResolverErrorCode::DuplicateInitialization, &[&param.name.name]);
            }
            initialized.insert(field, param.name.span);
        }

        let redirects = decl.initializers.iter().any(|i| matches!(i, Initializer::Redirect(_)));
        if is_factory && !decl.initializers.is_empty() {
            self.ctx
                .report(span, ResolverErrorCode::InitializersOnlyInConstructors, &[&display]);
        } else if redirects && decl.initializers.len() > 1 {
            self.ctx
                .report(span, ResolverErrorCode::RedirectingConstructorHasInitializers, &[&display]);
        }

        let mut explicit_super = false;
        for initializer in &decl.initializers {
            match initializer {
                Initializer::Field(init) => {
                    self.resolve_expression(&init_cx, &init.value, Access::Read)?;
                    self.initialize_field(class, init, &mut initialized)?;
                }
                Initializer::Super(call) => {
                    explicit_super = true;
                    self.resolve_arguments(&init_cx, &call.args)?;
                    self.resolve_super_call(cx, class, ctor, call)?;
                }
                Initializer::Redirect(call) => {
                    let redirect_cx = ResolveContext { in_redirect: true, ..init_cx };
                    self.resolve_arguments(&redirect_cx, &call.args)?;
                    self.resolve_redirect(class, ctor, call)?;
                }
            }
        }

        let generative = !is_factory && !redirects;
        if generative && !explicit_super && self.constructs(ctor, class) {
            self.resolve_implicit_super(class, ctor, span)?;
        }
        let native = decl.modifiers.intersects(Modifiers::NATIVE | Modifiers::EXTERNAL)
            || matches!(decl.body, Some(FunctionBody::Native(_)))
            || self.state.symbols.modifiers(class).is_native();
        if generative && !native {
            self.check_final_fields(class, &initialized, span);
        }
        Ok(())
    }

    /// `name = value` in an initializer list
    fn initialize_field(
        &mut self,
        class: SymbolId,
        init: &FieldInitializer,
        initialized: &mut FxHashMap<SymbolId, Span>,
    ) -> ResolveResult<()> {
        let name = init.name.name.as_str();
        let span = init.name.span;
        let own = self.state.symbols.class(class).and_then(|c| c.members.get(name));
        let Some(member) = own else {
            let inherited = self
                .state
                .symbols
                .lookup_member(class, name)
                .filter(|&m| self.state.symbols.kind(m) == SymbolKind::Field);
            if inherited.is_some() {
                self.ctx.report(span, ResolverErrorCode::CannotInitFieldFromSubclass, &[name]);
            } else {
                let class_name = self.state.symbols.name(class).to_string();
                self.ctx
                    .report(span, ResolverErrorCode::CannotResolveField, &[name, &class_name]);
            }
            return Ok(());
        };

        let is_storage = self.state.symbols.field(member).is_some_and(|f| !f.is_accessor());
        if !is_storage {
            self.ctx.report(span, ResolverErrorCode::ExpectedFieldNotMethod, &[name]);
            return Ok(());
        }
        let modifiers = self.state.symbols.modifiers(member);
        if modifiers.is_static() {
            self.ctx
                .report(span, ResolverErrorCode::CannotInitStaticFieldInInitializer, &[name]);
            return Ok(());
        }
        let initialized_at_declaration = modifiers.is_final() && modifiers.contains(Modifiers::INITIALIZED);
        if initialized.contains_key(&member) || initialized_at_declaration {
            self.ctx.report(span, ResolverErrorCode::DuplicateInitialization, &[name]);
        } else {
            initialized.insert(member, span);
        }
        self.state.bindings.bind_symbol(init.id, member)
    }

    /// Final instance fields left uninitialized by a generative constructor
    pub(super) fn check_final_fields(&mut self, class: SymbolId, initialized: &FxHashMap<SymbolId, Span>, span: Span) {
        let Some(data) = self.state.symbols.class(class) else { return };
        let missing: Vec<String> = data
            .members
            .values()
            .filter(|&member| {
                let symbol = self.state.symbols.get(member);
                symbol.kind() == SymbolKind::Field
                    && self.state.symbols.field(member).is_some_and(|f| !f.is_accessor())
                    && !symbol.modifiers.is_static()
                    && symbol.modifiers.is_final()
                    && !symbol.modifiers.contains(Modifiers::INITIALIZED)
                    && !initialized.contains_key(&member)
            })
            .map(|member| self.state.symbols.name(member).to_string())
            .collect();
        for name in missing {
            self.ctx.report(span, ResolverErrorCode::FinalFieldMustBeInitialized, &[&name]);
        }
    }

    fn resolve_super_call(
        &mut self,
        cx: &ResolveContext,
        class: SymbolId,
        ctor: SymbolId,
        call: &ConstructorCall,
    ) -> ResolveResult<()> {
        let Some(superclass) = self.state.symbols.class(class).and_then(|c| c.superclass) else {
            return Ok(());
        };
        let raw_name = call.name.as_ref().map(|n| n.name.as_str()).unwrap_or("");
        if self.private_constructor(cx, superclass, raw_name, call.span) {
            return Ok(());
        }
        let target = match self.state.symbols.find_constructor(superclass, raw_name, superclass) {
            Some(found) => Some(found),
            None if raw_name.is_empty() && !self.declares_constructors(superclass) => {
                Some(self.synthetic_constructor(superclass)?)
            }
            None => None,
        };
        let Some(target) = target else {
            let display = display_name(self.state.symbols.name(superclass), raw_name);
            self.ctx
                .report(call.span, ResolverErrorCode::CannotResolveSuperConstructor, &[&display]);
            return Ok(());
        };
        self.state.symbols.constructor_mut(ctor)?.super_target = Some(target);
        self.state.bindings.bind_symbol(call.id, target)
    }

    fn resolve_redirect(&mut self, class: SymbolId, ctor: SymbolId, call: &ConstructorCall) -> ResolveResult<()> {
        let raw_name = call.name.as_ref().map(|n| n.name.as_str()).unwrap_or("");
        let Some(target) = self.state.symbols.find_constructor(class, raw_name, class) else {
            let display = display_name(self.state.symbols.name(class), raw_name);
            self.ctx
                .report(call.span, ResolverErrorCode::CannotResolveConstructor, &[&display]);
            return Ok(());
        };
        self.state.symbols.constructor_mut(ctor)?.redirect_target = Some(target);
        self.state.bindings.bind_symbol(call.id, target)
    }

    /// Report constructors whose redirect/super chain returns to them
    pub(super) fn check_constructor_cycles(&mut self, unit: &CompilationUnit) -> ResolveResult<()> {
        for decl in &unit.declarations {
            let TopLevelDecl::Class(class) = decl else { continue };
            for method in class.methods() {
                let Some(ctor) = self.state.bindings.declaration(method.id) else { continue };
                if self.state.symbols.kind(ctor) == SymbolKind::Constructor && self.returns_to(ctor) {
                    self.ctx.report(
                        method.name.span(),
                        ResolverErrorCode::RedirectionConstructorCycle,
                        &[&method.name.to_string()],
                    );
                }
            }
        }
        Ok(())
    }

    fn returns_to(&self, start: SymbolId) -> bool {
        let mut visited = FxHashSet::default();
        let mut current = start;
        loop {
            let Some(data) = self.state.symbols.constructor(current) else {
                return false;
            };
            let Some(next) = data.redirecting_factory.or(data.redirect_target).or(data.super_target) else {
                return false;
            };
            if next == start {
                return true;
            }
            if !visited.insert(next) {
                return false;
            }
            current = next;
        }
    }
}
