//! Top-level builder and library scopes

use super::declare_type_parameters;
use crate::context::CompilerContext;
use crate::corelib::CORE_LIBRARY;
use crate::diagnostic::ResolverErrorCode;
use crate::error::{InternalError, ResolveResult};
use crate::pipeline::Program;
use crate::scope::{ScopeId, ScopeKind, ScopeTable};
use crate::state::ProgramState;
use crate::symbols::{
    ClassSymbol, DuplicateSymbol, FieldSymbol, FunctionTypeAliasSymbol, LibraryPrefixSymbol, LibrarySymbol,
    MethodSymbol, Symbol, SymbolData, SymbolId, SymbolKind,
};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use sable_syntax::{
    is_private_name, ClassDecl, Combinators, CompilationUnit, FunctionTypeAlias, Identifier, LibraryUnit, MethodDecl,
    Modifiers, SourceId, TopLevelDecl,
};
use tracing::{debug, instrument};

const SETTER_PREFIX: &str = "setter ";

/// Key a setter-only accessor is stored under
pub(crate) fn setter_key(name: &str) -> String {
    format!("{}{}", SETTER_PREFIX, name)
}

/// Creates library, class, function, field and typedef symbols and fills
/// import and library scopes
pub struct TopLevelBuilder<'s, 'c> {
    state: &'s mut ProgramState,
    ctx: &'s mut CompilerContext<'c>,
}

impl<'s, 'c> TopLevelBuilder<'s, 'c> {
    pub fn new(state: &'s mut ProgramState, ctx: &'s mut CompilerContext<'c>) -> Self {
        Self { state, ctx }
    }

    /// Declare every library, then compute re-exports, then process imports
    #[instrument(level = "debug", skip_all, fields(libraries = program.libraries.len()))]
    pub fn build(&mut self, program: &Program) -> ResolveResult<()> {
        for unit in &program.libraries {
            self.declare_library(unit)?;
        }

        let units: FxHashMap<SymbolId, &LibraryUnit> = program
            .libraries
            .iter()
            .filter_map(|unit| self.state.libraries.get(&unit.name).map(|&lib| (lib, unit)))
            .collect();
        let mut visiting = FxHashSet::default();
        for &lib in self.state.libraries.clone().values() {
            self.compute_exports(&units, lib, &mut visiting)?;
        }

        for unit in &program.libraries {
            let lib = self.state.libraries[&unit.name];
            self.process_imports(unit, lib)?;
        }
        Ok(())
    }

    fn declare_library(&mut self, unit: &LibraryUnit) -> ResolveResult<SymbolId> {
        if self.state.libraries.contains_key(&unit.name) {
            return Err(InternalError::DuplicateLibrary { name: unit.name.clone() });
        }
        let is_core = unit.name == CORE_LIBRARY;
        let lib = self.state.symbols.add(Symbol::new(
            &unit.name,
            SymbolData::Library(LibrarySymbol {
                import_scope: ScopeTable::LANGUAGE,
                scope: ScopeTable::LANGUAGE,
                exports: IndexMap::new(),
                exports_computed: false,
                entry_point: None,
                is_core,
                sources: unit.units.iter().map(|u| u.source).collect(),
            }),
        ));
        let import_scope = self.state.scopes.push(ScopeKind::Import, Some(ScopeTable::LANGUAGE), Some(lib));
        let scope = self.state.scopes.push(ScopeKind::Library, Some(import_scope), Some(lib));
        {
            let data = self.state.symbols.library_mut(lib)?;
            data.import_scope = import_scope;
            data.scope = scope;
        }
        self.state.libraries.insert(unit.name.clone(), lib);
        if is_core {
            self.state.core_library = Some(lib);
        }

        let mut accessors = FxHashMap::default();
        for compilation_unit in &unit.units {
            self.ctx.register_source(compilation_unit.source, &compilation_unit.path);
            self.declare_unit(lib, scope, compilation_unit, &mut accessors)?;
        }
        debug!(library = %unit.name, units = unit.units.len(), "declared library");
        Ok(lib)
    }

    fn declare_unit(
        &mut self,
        lib: SymbolId,
        scope: ScopeId,
        unit: &CompilationUnit,
        accessors: &mut FxHashMap<String, SymbolId>,
    ) -> ResolveResult<()> {
        for decl in &unit.declarations {
            match decl {
                TopLevelDecl::Class(class) => {
                    let symbol = self.declare_class(lib, unit.source, class)?;
                    self.declare_name(scope, &class.name.name, symbol)?;
                }
                TopLevelDecl::Function(function) if function.modifiers.is_getter() || function.modifiers.is_setter() => {
                    self.declare_accessor(lib, scope, function, accessors)?;
                }
                TopLevelDecl::Function(function) => {
                    let name = &function.name.identifier().name;
                    let symbol = self.state.symbols.add(
                        Symbol::new(name, SymbolData::Method(MethodSymbol::default()))
                            .with_modifiers(function.modifiers)
                            .with_enclosing(lib)
                            .with_span(function.name.span())
                            .with_node(function.id),
                    );
                    self.state.bindings.declare(function.id, symbol)?;
                    if name == "main" {
                        self.state.symbols.library_mut(lib)?.entry_point = Some(symbol);
                    }
                    self.declare_name(scope, name, symbol)?;
                }
                TopLevelDecl::Fields(list) => {
                    for field in &list.fields {
                        let mut modifiers = list.modifiers;
                        if field.initializer.is_some() {
                            modifiers |= Modifiers::INITIALIZED;
                        }
                        let symbol = self.state.symbols.add(
                            Symbol::new(&field.name.name, SymbolData::Field(FieldSymbol::default()))
                                .with_modifiers(modifiers)
                                .with_enclosing(lib)
                                .with_span(field.name.span)
                                .with_node(field.id),
                        );
                        self.state.bindings.declare(field.id, symbol)?;
                        self.declare_name(scope, &field.name.name, symbol)?;
                    }
                }
                TopLevelDecl::TypeAlias(alias) => {
                    let symbol = self.declare_alias(lib, alias)?;
                    self.declare_name(scope, &alias.name.name, symbol)?;
                }
            }
        }
        Ok(())
    }

    fn declare_class(&mut self, lib: SymbolId, source: SourceId, decl: &ClassDecl) -> ResolveResult<SymbolId> {
        let mut data = ClassSymbol::new(lib, decl.is_interface);
        data.source = Some(source);
        let mut modifiers = decl.modifiers;
        if decl.is_interface {
            modifiers |= Modifiers::ABSTRACT;
        }
        let class = self.state.symbols.add(
            Symbol::new(&decl.name.name, SymbolData::Class(data))
                .with_modifiers(modifiers)
                .with_enclosing(lib)
                .with_span(decl.name.span)
                .with_node(decl.id),
        );
        self.state.bindings.declare(decl.id, class)?;

        let params = declare_type_parameters(self.state, self.ctx, class, &decl.type_params)?;
        let args = params.iter().map(|&tv| self.state.symbols.ty(tv)).collect();
        if let Some(data) = self.state.symbols.class_mut(class) {
            data.type_parameters = params;
        }
        let ty = self.state.types.interface(class, args);
        self.state.symbols.set_type(class, ty)?;
        Ok(class)
    }

    fn declare_alias(&mut self, lib: SymbolId, decl: &FunctionTypeAlias) -> ResolveResult<SymbolId> {
        let alias = self.state.symbols.add(
            Symbol::new(&decl.name.name, SymbolData::FunctionTypeAlias(FunctionTypeAliasSymbol::default()))
                .with_enclosing(lib)
                .with_span(decl.name.span)
                .with_node(decl.id),
        );
        self.state.bindings.declare(decl.id, alias)?;
        let params = declare_type_parameters(self.state, self.ctx, alias, &decl.type_params)?;
        let args = params.iter().map(|&tv| self.state.symbols.ty(tv)).collect();
        self.state.symbols.alias_mut(alias)?.type_parameters = params;
        let ty = self.state.types.alias(alias, args);
        self.state.symbols.set_type(alias, ty)?;
        Ok(alias)
    }

    /// Merge a top-level getter or setter into its accessor field
    fn declare_accessor(
        &mut self,
        lib: SymbolId,
        scope: ScopeId,
        decl: &MethodDecl,
        accessors: &mut FxHashMap<String, SymbolId>,
    ) -> ResolveResult<()> {
        let name = decl.name.identifier().name.clone();
        let is_getter = decl.modifiers.is_getter();
        let method = self.state.symbols.add(
            Symbol::new(&name, SymbolData::Method(MethodSymbol::default()))
                .with_modifiers(decl.modifiers)
                .with_enclosing(lib)
                .with_span(decl.name.span())
                .with_node(decl.id),
        );
        self.state.bindings.declare(decl.id, method)?;

        let field = match accessors.get(&name) {
            Some(&field) => field,
            None => {
                let field = self.state.symbols.add(
                    Symbol::new(&name, SymbolData::Field(FieldSymbol::default()))
                        .with_modifiers(Modifiers::ABSTRACT_FIELD)
                        .with_enclosing(lib)
                        .with_span(decl.name.span()),
                );
                accessors.insert(name.clone(), field);
                field
            }
        };

        let data = self.state.symbols.field_mut(field)?;
        let existing = if is_getter { data.getter } else { data.setter };
        if let Some(existing) = existing {
            self.report_duplicate(&name, existing, method);
            return Ok(());
        }
        let data = self.state.symbols.field_mut(field)?;
        if is_getter {
            data.getter = Some(method);
        } else {
            data.setter = Some(method);
        }
        let has_getter = data.getter.is_some();

        if has_getter {
            self.declare_name(scope, &name, field)
        } else {
            self.declare_name(scope, &setter_key(&name), field)
        }
    }

    /// Bind `key` in the library scope; collisions are reported at both declarations
    fn declare_name(&mut self, scope: ScopeId, key: &str, symbol: SymbolId) -> ResolveResult<()> {
        let (name, counterpart) = match key.strip_prefix(SETTER_PREFIX) {
            Some(base) => (base.to_string(), base.to_string()),
            None => (key.to_string(), setter_key(key)),
        };
        let clash = self
            .state
            .scopes
            .local(scope, key)
            .or_else(|| self.state.scopes.local(scope, &counterpart))
            .filter(|&other| other != symbol);
        if let Some(other) = clash {
            self.report_duplicate(&name, other, symbol);
            return Ok(());
        }
        self.state.scopes.declare(scope, key, symbol);
        Ok(())
    }

    fn report_duplicate(&mut self, name: &str, first: SymbolId, second: SymbolId) {
        let (Some(a), Some(b)) = (self.state.symbols.get(first).span, self.state.symbols.get(second).span) else {
            return;
        };
        let at_a = self.ctx.location(a);
        let at_b = self.ctx.location(b);
        self.ctx
            .report_with_related(b, ResolverErrorCode::DuplicateTopLevelDeclaration, &[name, &at_a], vec![a]);
        self.ctx
            .report_with_related(a, ResolverErrorCode::DuplicateTopLevelDeclaration, &[name, &at_b], vec![b]);
    }

    /// Public own names followed by re-exports
    fn visible_names(&self, lib: SymbolId) -> Vec<(String, SymbolId)> {
        let Some(data) = self.state.symbols.library(lib) else {
            return Vec::new();
        };
        let mut names: IndexMap<String, SymbolId> = self
            .state
            .scopes
            .get(data.scope)
            .symbols()
            .filter(|(key, _)| !is_private_name(key.strip_prefix(SETTER_PREFIX).unwrap_or(key)))
            .map(|(key, symbol)| (key.to_string(), symbol))
            .collect();
        for (key, &symbol) in &data.exports {
            names.entry(key.clone()).or_insert(symbol);
        }
        names.into_iter().collect()
    }

    fn compute_exports(
        &mut self,
        units: &FxHashMap<SymbolId, &LibraryUnit>,
        lib: SymbolId,
        visiting: &mut FxHashSet<SymbolId>,
    ) -> ResolveResult<()> {
        let computed = self.state.symbols.library(lib).is_some_and(|l| l.exports_computed);
        if computed || !visiting.insert(lib) {
            return Ok(());
        }
        let Some(unit) = units.get(&lib) else {
            visiting.remove(&lib);
            return Ok(());
        };

        let mut exports = IndexMap::new();
        for directive in &unit.exports {
            let Some(&target) = self.state.libraries.get(&directive.library) else {
                self.ctx
                    .report(directive.span, ResolverErrorCode::LibraryNotFound, &[&directive.library]);
                continue;
            };
            self.compute_exports(units, target, visiting)?;
            let names = self.visible_names(target);
            self.check_combinators(&directive.library, &directive.combinators, &names);
            for (key, symbol) in names {
                let base = key.strip_prefix(SETTER_PREFIX).unwrap_or(&key);
                if directive.combinators.allows(base) {
                    exports.entry(key).or_insert(symbol);
                }
            }
        }

        let data = self.state.symbols.library_mut(lib)?;
        data.exports = exports;
        data.exports_computed = true;
        visiting.remove(&lib);
        Ok(())
    }

    fn process_imports(&mut self, unit: &LibraryUnit, lib: SymbolId) -> ResolveResult<()> {
        if let Some(core) = self.state.core_library {
            if core != lib {
                self.import_library(lib, core, None, &Combinators::default())?;
            }
        }
        for directive in &unit.imports {
            let Some(&target) = self.state.libraries.get(&directive.library) else {
                self.ctx
                    .report(directive.span, ResolverErrorCode::LibraryNotFound, &[&directive.library]);
                continue;
            };
            let names = self.visible_names(target);
            self.check_combinators(&directive.library, &directive.combinators, &names);
            self.import_library(lib, target, directive.prefix.as_ref(), &directive.combinators)?;
        }
        Ok(())
    }

    fn check_combinators(&mut self, library: &str, combinators: &Combinators, names: &[(String, SymbolId)]) {
        for ident in combinators.names() {
            let setter = setter_key(&ident.name);
            if !names.iter().any(|(key, _)| *key == ident.name || *key == setter) {
                self.ctx
                    .report(ident.span, ResolverErrorCode::ImportedNameNotFound, &[library, &ident.name]);
            }
        }
    }

    fn import_library(
        &mut self,
        lib: SymbolId,
        target: SymbolId,
        prefix: Option<&Identifier>,
        combinators: &Combinators,
    ) -> ResolveResult<()> {
        let destination = match prefix {
            Some(prefix) => match self.prefix_scope(lib, prefix, target)? {
                Some(scope) => scope,
                None => return Ok(()),
            },
            None => self.state.symbols.library(lib).map(|l| l.import_scope).unwrap_or(ScopeTable::LANGUAGE),
        };
        let names = self.visible_names(target);
        let mut imported = 0usize;
        for (key, symbol) in names {
            let base = key.strip_prefix(SETTER_PREFIX).unwrap_or(&key);
            if !combinators.allows(base) {
                continue;
            }
            self.import_name(destination, &key, symbol)?;
            imported += 1;
        }
        debug!(
            library = self.state.symbols.name(lib),
            from = self.state.symbols.name(target),
            imported,
            "imported library"
        );
        Ok(())
    }

    /// Scope of the prefix symbol for `prefix`, created on first use
    fn prefix_scope(&mut self, lib: SymbolId, prefix: &Identifier, target: SymbolId) -> ResolveResult<Option<ScopeId>> {
        let Some(data) = self.state.symbols.library(lib) else {
            return Ok(None);
        };
        let (import_scope, scope) = (data.import_scope, data.scope);
        if self.state.scopes.local(scope, &prefix.name).is_some() {
            self.ctx
                .report(prefix.span, ResolverErrorCode::PrefixConflictsWithDeclaration, &[&prefix.name]);
            return Ok(None);
        }
        match self.state.scopes.local(import_scope, &prefix.name) {
            Some(existing) if self.state.symbols.kind(existing) == SymbolKind::LibraryPrefix => {
                let data = self.state.symbols.prefix_mut(existing)?;
                if !data.libraries.contains(&target) {
                    data.libraries.push(target);
                }
                let prefix_scope = data.scope;
                self.state.bindings.bind_symbol(prefix.id, existing)?;
                Ok(Some(prefix_scope))
            }
            Some(_) => {
                self.ctx
                    .report(prefix.span, ResolverErrorCode::PrefixConflictsWithDeclaration, &[&prefix.name]);
                Ok(None)
            }
            None => {
                let prefix_scope = self.state.scopes.push(ScopeKind::Prefix, None, Some(lib));
                let symbol = self.state.symbols.add(
                    Symbol::new(
                        &prefix.name,
                        SymbolData::LibraryPrefix(LibraryPrefixSymbol {
                            scope: prefix_scope,
                            libraries: vec![target],
                        }),
                    )
                    .with_enclosing(lib)
                    .with_span(prefix.span)
                    .with_node(prefix.id),
                );
                self.state.scopes.declare(import_scope, prefix.name.clone(), symbol);
                self.state.bindings.bind_symbol(prefix.id, symbol)?;
                Ok(Some(prefix_scope))
            }
        }
    }

    /// Bind an imported name; names reaching the same frame from different
    /// libraries become a duplicate symbol
    fn import_name(&mut self, scope: ScopeId, key: &str, symbol: SymbolId) -> ResolveResult<()> {
        match self.state.scopes.local(scope, key) {
            None => {
                self.state.scopes.declare(scope, key, symbol);
            }
            Some(existing) if existing == symbol => {}
            Some(existing) if self.state.symbols.kind(existing) == SymbolKind::Duplicate => {
                let data = self.state.symbols.duplicate_mut(existing)?;
                if !data.symbols.contains(&symbol) {
                    data.symbols.push(symbol);
                }
            }
            Some(existing) => {
                let name = key.strip_prefix(SETTER_PREFIX).unwrap_or(key);
                let duplicate = self.state.symbols.add(Symbol::new(
                    name,
                    SymbolData::Duplicate(DuplicateSymbol {
                        symbols: vec![existing, symbol],
                    }),
                ));
                self.state.scopes.declare(scope, key, duplicate);
            }
        }
        Ok(())
    }
}

