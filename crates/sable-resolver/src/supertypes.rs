//! Supertype resolution
//!
//! Resolves `extends`, `implements` and `default` clauses and type-parameter
//! bounds, then checks every class for cyclic supertypes.

use crate::context::CompilerContext;
use crate::diagnostic::{ResolverErrorCode, TypeErrorCode};
use crate::error::ResolveResult;
use crate::pipeline::Program;
use crate::builder::push_alias_scope;
use crate::scope::{ScopeId, ScopeKind, ScopeTable};
use crate::state::ProgramState;
use crate::symbols::{SymbolId, SymbolKind};
use crate::types::{Type, TypeId};
use sable_syntax::{
    type_parameters_text, ClassDecl, FunctionTypeAlias, SourceId, TopLevelDecl, TypeNode, TypeParameter,
};
use tracing::{debug, instrument};

/// Core classes that only core-library sources may extend or implement
const BUILTIN_SUPERTYPES: &[&str] = &["int", "double", "num", "bool", "String", "Dynamic", "Function"];

pub struct SupertypeResolver<'s, 'c> {
    state: &'s mut ProgramState,
    ctx: &'s mut CompilerContext<'c>,
}

impl<'s, 'c> SupertypeResolver<'s, 'c> {
    pub fn new(state: &'s mut ProgramState, ctx: &'s mut CompilerContext<'c>) -> Self {
        Self { state, ctx }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn build(&mut self, program: &Program) -> ResolveResult<()> {
        let mut classes = Vec::new();
        for library in &program.libraries {
            for unit in &library.units {
                for decl in &unit.declarations {
                    match decl {
                        TopLevelDecl::Class(class) => classes.push(self.resolve_class(unit.source, class)?),
                        TopLevelDecl::TypeAlias(alias) => self.resolve_alias(alias)?,
                        _ => {}
                    }
                }
            }
        }
        let cyclic = self.detect_cycles(&classes);
        debug!(classes = classes.len(), cyclic, "resolved supertypes");
        Ok(())
    }

    fn resolve_class(&mut self, source: SourceId, decl: &ClassDecl) -> ResolveResult<SymbolId> {
        let class = self.state.bindings.expect_declaration(decl.id)?;
        let library = self.state.symbols.library_of(class);
        let library_scope = library
            .and_then(|lib| self.state.symbols.library(lib))
            .map(|lib| lib.scope)
            .unwrap_or(ScopeTable::LANGUAGE);
        let scope = self.state.scopes.push(ScopeKind::Class(class), Some(library_scope), library);
        let core = *self.state.core()?;
        let is_core = self.ctx.is_core_source(source);

        let params = self.state.symbols.class(class).map(|c| c.type_parameters.clone()).unwrap_or_default();
        self.resolve_bounds(scope, library_scope, &decl.type_params, &params, core.object.ty)?;

        let supertype = if class == core.object.class {
            None
        } else {
            let resolved = match (&decl.superclass, decl.is_interface) {
                (Some(node), false) => self.resolve_supertype(scope, node, is_core, ResolverErrorCode::NotAClass)?,
                _ => None,
            };
            Some(resolved.unwrap_or(core.object.ty))
        };
        self.state.symbols.set_supertype(class, supertype, &self.state.types)?;

        for node in &decl.interfaces {
            let Some(interface) = self.resolve_supertype(scope, node, is_core, ResolverErrorCode::NotAnInterface)? else {
                continue;
            };
            let target = self.state.types.class_of(interface);
            let already = self
                .state
                .symbols
                .class(class)
                .is_some_and(|c| target.is_some_and(|t| c.interface_classes.contains(&t)));
            if already {
                self.ctx
                    .report(node.span, ResolverErrorCode::DuplicateImplementsType, &[&node.to_string()]);
                continue;
            }
            self.state.symbols.add_interface(class, interface, &self.state.types)?;
        }

        if let Some(clause) = &decl.default_clause {
            if !decl.is_interface {
                self.ctx.report(clause.span, ResolverErrorCode::DefaultClauseOnClass, &[]);
            } else {
                self.resolve_default(scope, class, decl)?;
            }
        }

        self.state.scopes.pop(scope)?;
        Ok(class)
    }

    fn resolve_alias(&mut self, decl: &FunctionTypeAlias) -> ResolveResult<()> {
        let alias = self.state.bindings.expect_declaration(decl.id)?;
        let object = self.state.core()?.object.ty;
        let scope = push_alias_scope(self.state, alias);
        let outer = self.state.scopes.get(scope).parent.unwrap_or(ScopeTable::LANGUAGE);
        let params = self.state.symbols.alias(alias).map(|a| a.type_parameters.clone()).unwrap_or_default();
        self.resolve_bounds(scope, outer, &decl.type_params, &params, object)?;
        self.state.scopes.pop(scope)
    }

    /// Bounds resolve in the class scope so they may mention sibling parameters
    fn resolve_bounds(
        &mut self,
        scope: ScopeId,
        outer: ScopeId,
        decls: &[TypeParameter],
        params: &[SymbolId],
        object: TypeId,
    ) -> ResolveResult<()> {
        let library = self.state.scopes.library_of(scope);
        for (decl, &tv) in decls.iter().zip(params) {
            let hidden = self.state.scopes.find(&self.state.symbols, outer, library, &decl.name.name);
            if matches!(self.state.symbols.kind(hidden), SymbolKind::Class | SymbolKind::FunctionTypeAlias) {
                if let Some(at) = self.state.symbols.get(hidden).span {
                    let location = self.ctx.location(at);
                    self.ctx.report_with_related(
                        decl.name.span,
                        ResolverErrorCode::TypeVariableShadowsType,
                        &[&decl.name.name, &location],
                        vec![at],
                    );
                }
            }
            let bound = match &decl.bound {
                Some(node) => self.state.resolve_type(self.ctx, scope, node, false)?,
                None => object,
            };
            self.state.symbols.type_variable_mut(tv)?.bound.set(bound, "type variable bound", tv)?;
        }

        for (decl, &tv) in decls.iter().zip(params) {
            if self.bound_cycles(tv) {
                self.ctx
                    .report(decl.name.span, TypeErrorCode::CyclicTypeVariableBound, &[&decl.name.name]);
            }
        }
        Ok(())
    }

    /// Whether following bounds that are type variables leads back to `tv`
    fn bound_cycles(&self, tv: SymbolId) -> bool {
        let mut current = tv;
        let mut steps = 0usize;
        loop {
            let Some(bound) = self.state.symbols.type_variable(current).and_then(|t| t.bound.get()) else {
                return false;
            };
            let Type::Variable(next) = self.state.types.get(bound) else {
                return false;
            };
            if *next == tv {
                return true;
            }
            current = *next;
            steps += 1;
            if steps > self.state.symbols.len() {
                return false;
            }
        }
    }

    /// Resolve one `extends`/`implements` target; None when it cannot serve as a supertype
    fn resolve_supertype(
        &mut self,
        scope: ScopeId,
        node: &TypeNode,
        is_core: bool,
        not_a_class: ResolverErrorCode,
    ) -> ResolveResult<Option<TypeId>> {
        let ty = self.state.resolve_type(self.ctx, scope, node, false)?;
        if ty == TypeId::DYNAMIC {
            if node.prefix.is_none() && node.name.name == "Dynamic" && !is_core {
                self.ctx
                    .report(node.span, ResolverErrorCode::CannotExtendBuiltin, &[&node.name.name]);
            }
            return Ok(None);
        }
        let Some(target) = self.state.types.class_of(ty) else {
            self.ctx.report(node.span, not_a_class, &[&node.to_string()]);
            return Ok(None);
        };
        let in_core = self.state.symbols.library_of(target) == self.state.core_library;
        if !is_core && in_core && BUILTIN_SUPERTYPES.contains(&self.state.symbols.name(target)) {
            self.ctx
                .report(node.span, ResolverErrorCode::CannotExtendBuiltin, &[self.state.symbols.name(target)]);
            return Ok(None);
        }
        Ok(Some(ty))
    }

    fn resolve_default(&mut self, scope: ScopeId, interface: SymbolId, decl: &ClassDecl) -> ResolveResult<()> {
        let Some(clause) = &decl.default_clause else {
            return Ok(());
        };
        let ty = self.state.resolve_type(self.ctx, scope, &clause.class, false)?;
        let target = self
            .state
            .types
            .class_of(ty)
            .filter(|&c| self.state.symbols.class(c).is_some_and(|data| !data.is_interface));
        let Some(target) = target else {
            self.ctx
                .report(clause.class.span, ResolverErrorCode::DefaultMustSpecifyClass, &[&clause.class.to_string()]);
            return Ok(());
        };

        if !decl.type_params.is_empty() || !clause.type_params.is_empty() {
            let expected = type_parameters_text(&decl.type_params);
            let found = type_parameters_text(&clause.type_params);
            if expected != found {
                self.ctx.report(
                    clause.span,
                    ResolverErrorCode::TypeParametersMustMatchExactly,
                    &[self.state.symbols.name(target), &expected, &found],
                );
            }
        }

        let own = self.state.symbols.type_parameter_types(interface);
        let arity = self.state.symbols.class(target).map(|c| c.type_parameters.len()).unwrap_or(0);
        let args = if arity == own.len() { own } else { Vec::new() };
        let default_type = self.state.types.interface(target, args);
        if let Some(data) = self.state.symbols.class_mut(interface) {
            data.default_class = Some(default_type);
        }
        Ok(())
    }

    /// Report each class whose own supertype closure loops back to it
    fn detect_cycles(&mut self, classes: &[SymbolId]) -> usize {
        let mut cyclic = 0;
        for &class in classes {
            if let Err(err) = self.state.symbols.all_supertypes(class, &mut self.state.types) {
                if err.class == class {
                    cyclic += 1;
                    if let Some(span) = self.state.symbols.get(class).span {
                        let name = self.state.symbols.name(class).to_string();
                        self.ctx.report(span, ResolverErrorCode::CyclicClass, &[&name]);
                    }
                }
            }
        }
        cyclic
    }
}
