//! Member builder
//!
//! Fields are built before methods so `this.x` constructor parameters can
//! see their fields. Getters and setters of one name share a synthetic
//! accessor field.

use super::{build_parameters, function_type, push_alias_scope, resolve_return_type};
use crate::context::CompilerContext;
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::pipeline::Program;
use crate::scope::{ScopeId, ScopeKind, ScopeTable};
use crate::state::ProgramState;
use crate::symbols::{ConstructorSymbol, FieldSymbol, MethodSymbol, Symbol, SymbolData, SymbolId, SymbolKind};
use crate::types::TypeId;
use sable_syntax::{
    ClassDecl, FieldList, FunctionTypeAlias, Initializer, MethodDecl, MethodName, Modifiers, Parameter, TopLevelDecl,
};
use tracing::{debug, instrument};

pub struct MemberBuilder<'s, 'c> {
    state: &'s mut ProgramState,
    ctx: &'s mut CompilerContext<'c>,
}

impl<'s, 'c> MemberBuilder<'s, 'c> {
    pub fn new(state: &'s mut ProgramState, ctx: &'s mut CompilerContext<'c>) -> Self {
        Self { state, ctx }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn build(&mut self, program: &Program) -> ResolveResult<()> {
        for library in &program.libraries {
            let Some(&lib) = self.state.libraries.get(&library.name) else {
                continue;
            };
            let scope = self.state.symbols.library(lib).map(|l| l.scope).unwrap_or(ScopeTable::LANGUAGE);
            let mut classes = 0usize;
            for unit in &library.units {
                for decl in &unit.declarations {
                    match decl {
                        TopLevelDecl::Class(class) => {
                            self.build_class(class)?;
                            classes += 1;
                        }
                        TopLevelDecl::Function(function) => self.build_function(scope, function)?,
                        TopLevelDecl::Fields(list) => self.build_top_level_fields(scope, list)?,
                        TopLevelDecl::TypeAlias(alias) => self.build_alias(alias)?,
                    }
                }
            }
            let accessors: Vec<SymbolId> = self.state.scopes.get(scope).symbols().map(|(_, s)| s).collect();
            self.type_accessor_fields(&accessors)?;
            debug!(library = %library.name, classes, "built members");
        }
        Ok(())
    }

    fn build_function(&mut self, scope: ScopeId, decl: &MethodDecl) -> ResolveResult<()> {
        let function = self.state.bindings.expect_declaration(decl.id)?;
        self.check_not_constructor(decl);
        let params = build_parameters(self.state, self.ctx, scope, function, &decl.params, false)?;
        self.check_field_parameters(&decl.params);
        let return_type = resolve_return_type(self.state, self.ctx, scope, decl.return_type.as_ref(), false)?;
        self.finish_signature(function, params, return_type)?;
        if decl.body.is_some() {
            self.state.symbols.get_mut(function).modifiers |= Modifiers::HAS_BODY;
        }

        let is_entry_point = self
            .state
            .symbols
            .library_of(function)
            .and_then(|lib| self.state.symbols.library(lib))
            .is_some_and(|lib| lib.entry_point == Some(function));
        if is_entry_point && !decl.params.is_empty() {
            self.ctx.report(decl.name.span(), ResolverErrorCode::MainFunctionParameters, &[]);
        }
        Ok(())
    }

    fn build_top_level_fields(&mut self, scope: ScopeId, list: &FieldList) -> ResolveResult<()> {
        let ty = resolve_return_type(self.state, self.ctx, scope, list.type_annotation.as_ref(), false)?;
        for field in &list.fields {
            let symbol = self.state.bindings.expect_declaration(field.id)?;
            self.state.symbols.set_type(symbol, ty)?;
            if field.initializer.is_none() {
                if list.modifiers.is_const() {
                    self.ctx
                        .report(field.name.span, ResolverErrorCode::ConstantsMustBeInitialized, &[&field.name.name]);
                } else if list.modifiers.is_final() {
                    self.ctx
                        .report(field.name.span, ResolverErrorCode::TopLevelFinalRequiresValue, &[&field.name.name]);
                }
            }
        }
        Ok(())
    }

    fn build_alias(&mut self, decl: &FunctionTypeAlias) -> ResolveResult<()> {
        let alias = self.state.bindings.expect_declaration(decl.id)?;
        let scope = push_alias_scope(self.state, alias);
        let params = build_parameters(self.state, self.ctx, scope, alias, &decl.params, false)?;
        let return_type = resolve_return_type(self.state, self.ctx, scope, decl.return_type.as_ref(), false)?;
        let ty = function_type(self.state, &params, return_type);
        self.state.symbols.alias_mut(alias)?.function_type = Some(ty);
        self.state.scopes.pop(scope)
    }

    fn build_class(&mut self, decl: &ClassDecl) -> ResolveResult<()> {
        let class = self.state.bindings.expect_declaration(decl.id)?;
        let library = self.state.symbols.library_of(class);
        let parent = library
            .and_then(|lib| self.state.symbols.library(lib))
            .map(|lib| lib.scope)
            .unwrap_or(ScopeTable::LANGUAGE);
        let scope = self.state.scopes.push(ScopeKind::Class(class), Some(parent), library);

        for list in decl.field_lists() {
            self.build_fields(class, scope, list)?;
        }
        for method in decl.methods() {
            if is_constructor(decl, method) {
                self.build_constructor(class, scope, decl, method)?;
            } else {
                self.build_method(class, scope, method)?;
            }
        }

        let members: Vec<SymbolId> = self
            .state
            .symbols
            .class(class)
            .map(|c| c.members.values().collect())
            .unwrap_or_default();
        self.type_accessor_fields(&members)?;
        self.check_constructor_names(class);
        self.check_const_class(class, &members);

        self.state.scopes.pop(scope)
    }

    fn build_fields(&mut self, class: SymbolId, scope: ScopeId, list: &FieldList) -> ResolveResult<()> {
        let is_static = list.modifiers.is_static();
        let ty = resolve_return_type(self.state, self.ctx, scope, list.type_annotation.as_ref(), is_static)?;
        for field in &list.fields {
            let mut modifiers = list.modifiers;
            if field.initializer.is_some() {
                modifiers |= Modifiers::INITIALIZED;
            }
            let symbol = self.state.symbols.add(
                Symbol::new(&field.name.name, SymbolData::Field(FieldSymbol::default()))
                    .with_modifiers(modifiers)
                    .with_enclosing(class)
                    .with_span(field.name.span)
                    .with_node(field.id),
            );
            self.state.symbols.set_type(symbol, ty)?;
            self.state.bindings.declare(field.id, symbol)?;
            self.add_member(class, &field.name.name, symbol);

            if field.initializer.is_none() {
                if modifiers.is_const() {
                    self.ctx
                        .report(field.name.span, ResolverErrorCode::ConstantsMustBeInitialized, &[&field.name.name]);
                } else if is_static && modifiers.is_final() {
                    self.ctx
                        .report(field.name.span, ResolverErrorCode::StaticFinalRequiresValue, &[&field.name.name]);
                }
            }
        }
        Ok(())
    }

    fn build_method(&mut self, class: SymbolId, scope: ScopeId, decl: &MethodDecl) -> ResolveResult<()> {
        let name = decl.name.identifier().name.clone();
        self.check_not_constructor(decl);

        let mut modifiers = decl.modifiers;
        if decl.body.is_some() {
            modifiers |= Modifiers::HAS_BODY;
        } else if !modifiers.intersects(Modifiers::NATIVE | Modifiers::EXTERNAL) {
            modifiers |= Modifiers::ABSTRACT;
        }
        let method = self.state.symbols.add(
            Symbol::new(&name, SymbolData::Method(MethodSymbol::default()))
                .with_modifiers(modifiers)
                .with_enclosing(class)
                .with_span(decl.name.span())
                .with_node(decl.id),
        );
        self.state.bindings.declare(decl.id, method)?;

        let is_static = modifiers.is_static();
        let params = build_parameters(self.state, self.ctx, scope, method, &decl.params, is_static)?;
        self.check_field_parameters(&decl.params);
        let return_type = resolve_return_type(self.state, self.ctx, scope, decl.return_type.as_ref(), is_static)?;
        self.finish_signature(method, params, return_type)?;

        if modifiers.is_getter() || modifiers.is_setter() {
            self.add_accessor(class, &name, method, modifiers.is_getter())
        } else if modifiers.is_operator() {
            self.add_member(class, &format!("operator {}", name), method);
            Ok(())
        } else {
            self.add_member(class, &name, method);
            Ok(())
        }
    }

    fn build_constructor(
        &mut self,
        class: SymbolId,
        scope: ScopeId,
        class_decl: &ClassDecl,
        decl: &MethodDecl,
    ) -> ResolveResult<()> {
        let (qualifier, raw_name) = match &decl.name {
            MethodName::Simple(name) => (name, String::new()),
            MethodName::Qualified { qualifier, name } => (qualifier, name.name.clone()),
        };
        let display = decl.name.to_string();
        let is_factory = decl.modifiers.is_factory();

        let constructor_type = if qualifier.name == class_decl.name.name {
            class
        } else {
            let library = self.state.scopes.library_of(scope);
            let found = self.state.scopes.find(&self.state.symbols, scope, library, &qualifier.name);
            if self.state.symbols.kind(found) == SymbolKind::Class {
                found
            } else {
                self.ctx.report(qualifier.span, ResolverErrorCode::NotAClass, &[&qualifier.name]);
                class
            }
        };
        if constructor_type != class && !is_factory {
            self.ctx
                .report(decl.name.span(), ResolverErrorCode::CannotDeclareNonFactoryConstructor, &[&display]);
        }
        self.check_constructor_modifiers(decl, &display);

        let redirecting =
            decl.redirect.is_some() || decl.initializers.iter().any(|i| matches!(i, Initializer::Redirect(_)));
        let mut modifiers = decl.modifiers;
        if redirecting {
            modifiers |= Modifiers::REDIRECTING;
        }
        if decl.body.is_some() {
            modifiers |= Modifiers::HAS_BODY;
        }
        let constructor = self.state.symbols.add(
            Symbol::new(
                &display,
                SymbolData::Constructor(ConstructorSymbol {
                    constructor_type,
                    raw_name: raw_name.clone(),
                    ..ConstructorSymbol::default()
                }),
            )
            .with_modifiers(modifiers)
            .with_enclosing(class)
            .with_span(decl.name.span())
            .with_node(decl.id),
        );
        self.state.bindings.declare(decl.id, constructor)?;

        match self.state.symbols.find_constructor(class, &raw_name, constructor_type) {
            Some(previous) => self.report_duplicate(&display, previous, constructor),
            None => {
                if let Some(data) = self.state.symbols.class_mut(class) {
                    data.constructors.push(constructor);
                }
            }
        }

        let params = build_parameters(self.state, self.ctx, scope, constructor, &decl.params, false)?;
        for (param, &symbol) in decl.params.iter().zip(&params) {
            if param.field_initializer {
                self.bind_field_parameter(class, param, symbol, is_factory, redirecting)?;
            }
        }
        let return_type = self.state.symbols.ty(constructor_type);
        self.finish_signature(constructor, params, return_type)
    }

    fn check_constructor_modifiers(&mut self, decl: &MethodDecl, display: &str) {
        let span = decl.name.span();
        let modifiers = decl.modifiers;
        if modifiers.is_static() {
            self.ctx.report(span, ResolverErrorCode::ConstructorCannotBeStatic, &[display]);
        }
        if modifiers.is_abstract() {
            self.ctx.report(span, ResolverErrorCode::ConstructorCannotBeAbstract, &[display]);
        }
        if decl.return_type.is_some() {
            self.ctx.report(span, ResolverErrorCode::ConstructorCannotHaveReturnType, &[display]);
        }
        if modifiers.is_factory() && modifiers.is_const() {
            self.ctx.report(span, ResolverErrorCode::FactoryCannotBeConst, &[display]);
        }
        if modifiers.is_const() && !modifiers.is_factory() && matches!(decl.body, Some(sable_syntax::FunctionBody::Block(_)))
        {
            self.ctx.report(span, ResolverErrorCode::ConstConstructorCannotHaveBody, &[display]);
        }
    }

    /// `this.x` parameter: link it to its field and take the field's type
    fn bind_field_parameter(
        &mut self,
        class: SymbolId,
        param: &Parameter,
        symbol: SymbolId,
        is_factory: bool,
        redirecting: bool,
    ) -> ResolveResult<()> {
        let name = &param.name.name;
        let span = param.name.span;
        if is_factory {
            self.ctx.report(span, ResolverErrorCode::ParameterInitOutsideConstructor, &[name]);
            return Ok(());
        }
        if redirecting {
            self.ctx
                .report(span, ResolverErrorCode::ParameterInitWithRedirectingConstructor, &[name]);
            return Ok(());
        }
        let member = self.state.symbols.class(class).and_then(|c| c.members.get(name));
        let field = member.filter(|&m| self.state.symbols.field(m).is_some_and(|f| !f.is_accessor()));
        let Some(field) = field else {
            if member.is_some() {
                self.ctx.report(span, ResolverErrorCode::ExpectedFieldNotMethod, &[name]);
            } else {
                let class_name = self.state.symbols.name(class).to_string();
                self.ctx
                    .report(span, ResolverErrorCode::ParameterNotMatchField, &[name, &class_name]);
            }
            return Ok(());
        };
        if self.state.symbols.get(field).is_static() {
            self.ctx.report(span, ResolverErrorCode::ParameterInitStaticField, &[name]);
            return Ok(());
        }
        if let SymbolData::Parameter(data) = &mut self.state.symbols.get_mut(symbol).data {
            data.initialized_field = Some(field);
        }
        if param.type_annotation.is_none() {
            let ty = self.state.symbols.ty(field);
            self.state.symbols.set_type(symbol, ty)?;
        }
        Ok(())
    }

    fn check_field_parameters(&mut self, params: &[Parameter]) {
        for param in params.iter().filter(|p| p.field_initializer) {
            self.ctx.report(
                param.name.span,
                ResolverErrorCode::ParameterInitOutsideConstructor,
                &[&param.name.name],
            );
        }
    }

    fn check_not_constructor(&mut self, decl: &MethodDecl) {
        if !decl.initializers.is_empty() {
            self.ctx.report(
                decl.name.span(),
                ResolverErrorCode::InitializersOnlyInConstructors,
                &[&decl.name.to_string()],
            );
        }
    }

    fn finish_signature(&mut self, method: SymbolId, params: Vec<SymbolId>, return_type: TypeId) -> ResolveResult<()> {
        let ty = function_type(self.state, &params, return_type);
        if let Some(data) = self.state.symbols.method_mut(method) {
            data.parameters = params;
            data.return_type = return_type;
        }
        self.state.symbols.set_type(method, ty)
    }

    /// Merge a getter or setter into the accessor field of its name
    fn add_accessor(&mut self, class: SymbolId, name: &str, method: SymbolId, is_getter: bool) -> ResolveResult<()> {
        let existing = self.state.symbols.class(class).and_then(|c| c.members.get(name));
        let field = match existing {
            Some(field) if self.state.symbols.field(field).is_some_and(FieldSymbol::is_accessor) => field,
            Some(other) => {
                self.report_duplicate(name, other, method);
                return Ok(());
            }
            None => {
                let mut modifiers = Modifiers::ABSTRACT_FIELD;
                if self.state.symbols.get(method).is_static() {
                    modifiers |= Modifiers::STATIC;
                }
                let span = self.state.symbols.get(method).span;
                let mut symbol = Symbol::new(name, SymbolData::Field(FieldSymbol::default()))
                    .with_modifiers(modifiers)
                    .with_enclosing(class);
                if let Some(span) = span {
                    symbol = symbol.with_span(span);
                }
                let field = self.state.symbols.add(symbol);
                if let Some(data) = self.state.symbols.class_mut(class) {
                    data.members.insert(name, field);
                }
                field
            }
        };

        let data = self.state.symbols.field_mut(field)?;
        let previous = if is_getter { data.getter } else { data.setter };
        if let Some(previous) = previous {
            self.report_duplicate(name, previous, method);
            return Ok(());
        }
        let data = self.state.symbols.field_mut(field)?;
        if is_getter {
            data.getter = Some(method);
        } else {
            data.setter = Some(method);
        }
        Ok(())
    }

    /// Add a member unless it collides with an incompatible one under the same key
    fn add_member(&mut self, class: SymbolId, key: &str, member: SymbolId) {
        let existing = self
            .state
            .symbols
            .class(class)
            .map(|c| c.members.get_all(key).to_vec())
            .unwrap_or_default();
        for other in existing {
            if !self.compatible(other, member) {
                let name = self.state.symbols.name(member).to_string();
                self.report_duplicate(&name, other, member);
                return;
            }
        }
        if let Some(data) = self.state.symbols.class_mut(class) {
            data.members.insert(key, member);
        }
    }

    /// Operators of one symbol may coexist when their arities differ (unary and binary `-`)
    fn compatible(&self, a: SymbolId, b: SymbolId) -> bool {
        let symbols = &self.state.symbols;
        if !(symbols.modifiers(a).is_operator() && symbols.modifiers(b).is_operator()) {
            return false;
        }
        match (symbols.method(a), symbols.method(b)) {
            (Some(x), Some(y)) => x.parameters.len() != y.parameters.len(),
            _ => false,
        }
    }

    fn report_duplicate(&mut self, name: &str, first: SymbolId, second: SymbolId) {
        let (Some(a), Some(b)) = (self.state.symbols.get(first).span, self.state.symbols.get(second).span) else {
            return;
        };
        let at_a = self.ctx.location(a);
        let at_b = self.ctx.location(b);
        self.ctx
            .report_with_related(b, ResolverErrorCode::DuplicateMember, &[name, &at_a], vec![a]);
        self.ctx
            .report_with_related(a, ResolverErrorCode::DuplicateMember, &[name, &at_b], vec![b]);
    }

    /// Accessor fields take the getter's return type, else the setter's parameter type
    fn type_accessor_fields(&mut self, candidates: &[SymbolId]) -> ResolveResult<()> {
        for &field in candidates {
            let Some(data) = self.state.symbols.field(field) else { continue };
            if !data.is_accessor() || self.state.symbols.get(field).has_type() {
                continue;
            }
            let from_getter = data.getter.and_then(|g| self.state.symbols.method(g)).map(|m| m.return_type);
            let from_setter = data
                .setter
                .and_then(|s| self.state.symbols.method(s))
                .and_then(|m| m.parameters.first().copied())
                .map(|p| self.state.symbols.ty(p));
            let ty = from_getter.or(from_setter).unwrap_or(TypeId::DYNAMIC);
            self.state.symbols.set_type(field, ty)?;
        }
        Ok(())
    }

    fn check_constructor_names(&mut self, class: SymbolId) {
        let Some(data) = self.state.symbols.class(class) else { return };
        let mut clashes = Vec::new();
        for &constructor in &data.constructors {
            let Some(ctor) = self.state.symbols.constructor(constructor) else { continue };
            if !ctor.raw_name.is_empty() && ctor.constructor_type == class && data.members.contains_key(&ctor.raw_name) {
                clashes.push((constructor, ctor.raw_name.clone()));
            }
        }
        for (constructor, member) in clashes {
            let symbol = self.state.symbols.get(constructor);
            if let Some(span) = symbol.span {
                let name = symbol.name.clone();
                self.ctx
                    .report(span, ResolverErrorCode::ConstructorWithNameOfMember, &[&name, &member]);
            }
        }
    }

    /// Classes with a const constructor may only have final instance fields
    fn check_const_class(&mut self, class: SymbolId, members: &[SymbolId]) {
        let symbols = &self.state.symbols;
        let has_const = symbols
            .class(class)
            .is_some_and(|c| c.constructors.iter().any(|&ctor| symbols.modifiers(ctor).is_const()));
        if !has_const {
            return;
        }
        let class_name = symbols.name(class).to_string();
        let offending: Vec<SymbolId> = members
            .iter()
            .copied()
            .filter(|&m| {
                symbols.field(m).is_some_and(|f| !f.is_accessor())
                    && !symbols.get(m).is_static()
                    && !symbols.modifiers(m).is_final()
            })
            .collect();
        for field in offending {
            let symbol = self.state.symbols.get(field);
            if let Some(span) = symbol.span {
                let name = symbol.name.clone();
                self.ctx
                    .report(span, ResolverErrorCode::ConstClassWithNonFinalFields, &[&class_name, &name]);
            }
        }
    }
}

/// A factory, a qualified name or the class's own name makes a constructor
fn is_constructor(class: &ClassDecl, method: &MethodDecl) -> bool {
    if method.modifiers.is_factory() {
        return true;
    }
    match &method.name {
        MethodName::Qualified { .. } => true,
        MethodName::Simple(name) => name.name == class.name.name && !method.modifiers.is_getter() && !method.modifiers.is_setter(),
    }
}

/// Record which supertype members each class member overrides
///
/// Runs after resolution. A static member hiding an inherited instance
/// member is reported instead of recorded.
#[instrument(level = "debug", skip_all)]
pub fn compute_overrides(state: &mut ProgramState, ctx: &mut CompilerContext<'_>) -> ResolveResult<()> {
    let classes: Vec<SymbolId> = state
        .symbols
        .iter()
        .filter(|(_, symbol)| symbol.kind() == SymbolKind::Class)
        .map(|(id, _)| id)
        .collect();
    let mut recorded = 0usize;
    for class in classes {
        let Ok(supertypes) = state.symbols.all_supertypes(class, &mut state.types) else {
            continue;
        };
        let ancestors: Vec<SymbolId> = supertypes.iter().filter_map(|&t| state.types.class_of(t)).collect();
        let own: Vec<(String, SymbolId)> = state
            .symbols
            .class(class)
            .map(|c| c.members.iter().map(|(key, m)| (key.to_string(), m)).collect())
            .unwrap_or_default();

        for (key, member) in own {
            let is_static = state.symbols.get(member).is_static();
            let mut overridden = Vec::new();
            let mut hidden_instance = None;
            for &ancestor in &ancestors {
                let Some(data) = state.symbols.class(ancestor) else { continue };
                for &inherited in data.members.get_all(&key) {
                    if state.symbols.get(inherited).is_static() {
                        continue;
                    }
                    if is_static {
                        hidden_instance.get_or_insert(ancestor);
                    } else {
                        overridden.push(inherited);
                    }
                }
            }
            if let Some(ancestor) = hidden_instance {
                if let Some(span) = state.symbols.get(member).span {
                    let name = state.symbols.name(member).to_string();
                    let owner = state.symbols.name(ancestor).to_string();
                    ctx.report(span, ResolverErrorCode::CannotOverrideInstanceMember, &[&name, &owner]);
                }
                continue;
            }
            recorded += overridden.len();
            match &mut state.symbols.get_mut(member).data {
                SymbolData::Method(method) => method.overridden = overridden,
                SymbolData::Field(field) => field.overridden = overridden,
                _ => {}
            }
        }
    }
    debug!(recorded, "computed override sets");
    Ok(())
}
