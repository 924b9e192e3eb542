//! State shared by every resolution pass

use crate::bindings::Bindings;
use crate::context::CompilerContext;
use crate::diagnostic::{ResolverErrorCode, TypeErrorCode};
use crate::error::{InternalError, ResolveResult};
use crate::scope::{ScopeId, ScopeTable};
use crate::symbols::{SymbolId, SymbolKind, SymbolTable};
use crate::types::{CoreTypes, TypeId, TypeStore};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use sable_syntax::{is_private_name, TypeNode};
use tracing::trace;

/// Symbol graph, scopes and side tables under construction
#[derive(Debug, Default)]
pub struct ProgramState {
    pub symbols: SymbolTable,
    pub types: TypeStore,
    pub scopes: ScopeTable,
    pub bindings: Bindings,
    /// Library name → library symbol
    pub libraries: IndexMap<String, SymbolId>,
    pub core_library: Option<SymbolId>,
    pub core: Option<CoreTypes>,
    /// Implicit constructors of classes that declare none, created on demand
    pub synthetic_constructors: FxHashMap<SymbolId, SymbolId>,
}

impl ProgramState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn core(&self) -> ResolveResult<&CoreTypes> {
        self.core.as_ref().ok_or_else(|| InternalError::MissingCoreType { name: "Object".to_string() })
    }

    /// Name of the library enclosing `symbol`
    pub fn library_name(&self, symbol: SymbolId) -> String {
        self.symbols
            .library_of(symbol)
            .map(|lib| self.symbols.name(lib).to_string())
            .unwrap_or_default()
    }

    /// Names of the libraries contributing to a duplicate import, for messages
    pub fn describe_duplicate(&self, duplicate: SymbolId) -> String {
        let Some(data) = self.symbols.duplicate(duplicate) else {
            return String::new();
        };
        let names: Vec<String> = data.symbols.iter().map(|&s| self.library_name(s)).collect();
        names.join(", ")
    }

    /// Declaration spans of the symbols behind a duplicate import
    pub fn duplicate_spans(&self, duplicate: SymbolId) -> Vec<sable_syntax::Span> {
        self.symbols
            .duplicate(duplicate)
            .map(|data| data.symbols.iter().filter_map(|&s| self.symbols.get(s).span).collect())
            .unwrap_or_default()
    }

    /// Resolve a type annotation in `scope`
    ///
    /// Unresolvable annotations are reported and resolve to Dynamic. With
    /// `is_static` set, class type variables are rejected.
    pub fn resolve_type(
        &mut self,
        ctx: &mut CompilerContext<'_>,
        scope: ScopeId,
        node: &TypeNode,
        is_static: bool,
    ) -> ResolveResult<TypeId> {
        let library = self.scopes.library_of(scope);
        let name = &node.name.name;
        let symbol = match &node.prefix {
            Some(prefix) => {
                let target = self.scopes.find(&self.symbols, scope, library, &prefix.name);
                if self.symbols.kind(target) != SymbolKind::LibraryPrefix {
                    let code = if target.is_none() { TypeErrorCode::NoSuchType } else { TypeErrorCode::NotAType };
                    ctx.report(node.span, code, &[&node.to_string()]);
                    self.bindings.bind_type(node.id, TypeId::DYNAMIC)?;
                    return Ok(TypeId::DYNAMIC);
                }
                self.bindings.bind_symbol(prefix.id, target)?;
                match self.find_in_prefix(ctx, target, node.id, &node.name)? {
                    Some(found) => found,
                    None => {
                        self.bindings.bind_type(node.id, TypeId::DYNAMIC)?;
                        return Ok(TypeId::DYNAMIC);
                    }
                }
            }
            None => {
                let found = self.scopes.find(&self.symbols, scope, library, name);
                if found.is_none() && is_private_name(name) {
                    let hidden = self.scopes.find(&self.symbols, scope, None, name);
                    if !hidden.is_none() {
                        let owner = self.library_name(hidden);
                        ctx.report(node.name.span, ResolverErrorCode::IllegalAccessToPrivate, &[name, &owner]);
                        self.bindings.bind_type(node.id, TypeId::DYNAMIC)?;
                        return Ok(TypeId::DYNAMIC);
                    }
                }
                found
            }
        };

        let ty = match self.symbols.kind(symbol) {
            SymbolKind::None => {
                ctx.report(node.span, TypeErrorCode::NoSuchType, &[&node.to_string()]);
                TypeId::DYNAMIC
            }
            SymbolKind::Dynamic => TypeId::DYNAMIC,
            SymbolKind::Void => TypeId::VOID,
            SymbolKind::Class | SymbolKind::FunctionTypeAlias => {
                let expected = match self.symbols.class(symbol) {
                    Some(class) => class.type_parameters.len(),
                    None => self.symbols.alias(symbol).map(|a| a.type_parameters.len()).unwrap_or(0),
                };
                let mut args = Vec::with_capacity(node.args.len());
                for arg in &node.args {
                    args.push(self.resolve_type(ctx, scope, arg, is_static)?);
                }
                if !args.is_empty() && args.len() != expected {
                    ctx.report(
                        node.span,
                        TypeErrorCode::WrongNumberOfTypeArguments,
                        &[name, &expected.to_string(), &args.len().to_string()],
                    );
                    args.clear();
                }
                if self.symbols.kind(symbol) == SymbolKind::Class {
                    self.types.interface(symbol, args)
                } else {
                    self.types.alias(symbol, args)
                }
            }
            SymbolKind::TypeVariable => {
                if !node.args.is_empty() {
                    ctx.report(node.span, TypeErrorCode::TypeArgumentsOnTypeVariable, &[name]);
                }
                if is_static && self.symbols.is_class_member(symbol) {
                    ctx.report(node.span, TypeErrorCode::TypeVariableInStaticContext, &[name]);
                    TypeId::DYNAMIC
                } else {
                    self.symbols.ty(symbol)
                }
            }
            SymbolKind::Duplicate => {
                let libraries = self.describe_duplicate(symbol);
                let related = self.duplicate_spans(symbol);
                ctx.report_with_related(node.span, TypeErrorCode::AmbiguousType, &[name, &libraries], related);
                TypeId::DYNAMIC
            }
            _ => {
                ctx.report(node.span, TypeErrorCode::NotAType, &[&node.to_string()]);
                TypeId::DYNAMIC
            }
        };

        if !symbol.is_none() {
            self.bindings.bind_symbol(node.id, symbol)?;
        }
        self.bindings.bind_type(node.id, ty)?;
        trace!(ty = %node, "resolved type annotation");
        Ok(ty)
    }

    /// Look `name` up through a library prefix
    ///
    /// Returns None once a private name of the prefixed library has been
    /// reported; `Some(SymbolId::NONE)` when the name does not exist.
    pub fn find_in_prefix(
        &mut self,
        ctx: &mut CompilerContext<'_>,
        prefix: SymbolId,
        node: sable_syntax::NodeId,
        name: &sable_syntax::Identifier,
    ) -> ResolveResult<Option<SymbolId>> {
        let Some(data) = self.symbols.prefix(prefix) else {
            return Ok(Some(SymbolId::NONE));
        };
        let (scope, libraries) = (data.scope, data.libraries.clone());
        if let Some(&first) = libraries.first() {
            self.bindings.bind_qualifier(node, first)?;
        }
        let found = self.scopes.local(scope, &name.name).unwrap_or(SymbolId::NONE);
        if found.is_none() && name.is_private() {
            for library in libraries {
                let Some(lib) = self.symbols.library(library) else { continue };
                if self.scopes.local(lib.scope, &name.name).is_some() {
                    let owner = self.symbols.name(library).to_string();
                    ctx.report(name.span, ResolverErrorCode::IllegalAccessToPrivate, &[&name.name, &owner]);
                    return Ok(None);
                }
            }
        }
        Ok(Some(found))
    }
}
