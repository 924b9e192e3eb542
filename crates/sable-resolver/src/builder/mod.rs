//! Declaration builders
//!
//! [`TopLevelBuilder`] creates symbols for top-level declarations and
//! populates library scopes; [`MemberBuilder`] fills in class members,
//! signatures and parameters once supertypes are known.

mod members;
mod top_level;

pub use members::{compute_overrides, MemberBuilder};
pub use top_level::TopLevelBuilder;
pub(crate) use top_level::setter_key;

use crate::context::CompilerContext;
use crate::diagnostic::ResolverErrorCode;
use crate::error::ResolveResult;
use crate::scope::ScopeId;
use crate::state::ProgramState;
use crate::symbols::{ParameterSymbol, Symbol, SymbolData, SymbolId, TypeVariableSymbol};
use crate::types::{FunctionType, TypeId};
use rustc_hash::FxHashSet;
use sable_syntax::{Parameter, TypeNode, TypeParameter};

/// Create type-variable symbols for a class or typedef
pub(crate) fn declare_type_parameters(
    state: &mut ProgramState,
    ctx: &mut CompilerContext<'_>,
    owner: SymbolId,
    params: &[TypeParameter],
) -> ResolveResult<Vec<SymbolId>> {
    let mut seen = FxHashSet::default();
    let mut declared = Vec::with_capacity(params.len());
    for param in params {
        if !seen.insert(param.name.name.as_str()) {
            ctx.report(param.name.span, ResolverErrorCode::DuplicateTypeVariable, &[&param.name.name]);
        }
        let tv = state.symbols.add(
            Symbol::new(&param.name.name, SymbolData::TypeVariable(TypeVariableSymbol::default()))
                .with_enclosing(owner)
                .with_span(param.name.span)
                .with_node(param.id),
        );
        let ty = state.types.variable(tv);
        state.symbols.set_type(tv, ty)?;
        state.bindings.declare(param.id, tv)?;
        declared.push(tv);
    }
    Ok(declared)
}

/// Create parameter symbols, resolving annotated types in `scope`
///
/// Unannotated parameters are left untyped so a `this.x` parameter can take
/// the type of its field later.
pub(crate) fn build_parameters(
    state: &mut ProgramState,
    ctx: &mut CompilerContext<'_>,
    scope: ScopeId,
    owner: SymbolId,
    params: &[Parameter],
    is_static: bool,
) -> ResolveResult<Vec<SymbolId>> {
    let mut seen = FxHashSet::default();
    let mut symbols = Vec::with_capacity(params.len());
    for param in params {
        let name = &param.name.name;
        if !seen.insert(name.as_str()) {
            ctx.report(param.name.span, ResolverErrorCode::DuplicateParameter, &[name]);
        }
        if param.modifiers.is_named() && param.name.is_private() {
            ctx.report(param.name.span, ResolverErrorCode::NamedParameterCannotStartWithUnderscore, &[name]);
        }
        let symbol = state.symbols.add(
            Symbol::new(
                name,
                SymbolData::Parameter(ParameterSymbol {
                    initialized_field: None,
                    has_default: param.default_value.is_some(),
                }),
            )
            .with_modifiers(param.modifiers)
            .with_enclosing(owner)
            .with_span(param.name.span)
            .with_node(param.id),
        );
        if let Some(annotation) = &param.type_annotation {
            let ty = state.resolve_type(ctx, scope, annotation, is_static)?;
            state.symbols.set_type(symbol, ty)?;
        }
        state.bindings.declare(param.id, symbol)?;
        symbols.push(symbol);
    }
    Ok(symbols)
}

/// Resolve an optional return annotation; missing annotations are Dynamic
pub(crate) fn resolve_return_type(
    state: &mut ProgramState,
    ctx: &mut CompilerContext<'_>,
    scope: ScopeId,
    annotation: Option<&TypeNode>,
    is_static: bool,
) -> ResolveResult<TypeId> {
    match annotation {
        Some(node) => state.resolve_type(ctx, scope, node, is_static),
        None => Ok(TypeId::DYNAMIC),
    }
}

/// Function type of a signature from its parameter symbols
pub(crate) fn function_type(state: &mut ProgramState, params: &[SymbolId], return_type: TypeId) -> TypeId {
    let mut function = FunctionType {
        return_type,
        ..FunctionType::default()
    };
    for &param in params {
        let symbol = state.symbols.get(param);
        let ty = symbol.ty();
        if symbol.modifiers.is_named() {
            function.named.push((symbol.name.clone(), ty));
        } else if symbol.modifiers.is_optional() {
            function.optional.push(ty);
        } else {
            function.params.push(ty);
        }
    }
    state.types.function(function)
}

/// Push a frame binding a typedef's type parameters over its library scope
pub(crate) fn push_alias_scope(state: &mut ProgramState, alias: SymbolId) -> ScopeId {
    let library = state.symbols.library_of(alias);
    let parent = library
        .and_then(|lib| state.symbols.library(lib))
        .map(|lib| lib.scope)
        .unwrap_or(crate::scope::ScopeTable::LANGUAGE);
    let scope = state.scopes.push(crate::scope::ScopeKind::Function, Some(parent), library);
    let params = state.symbols.alias(alias).map(|a| a.type_parameters.clone()).unwrap_or_default();
    for tv in params {
        let name = state.symbols.name(tv).to_string();
        state.scopes.declare(scope, name, tv);
    }
    scope
}
