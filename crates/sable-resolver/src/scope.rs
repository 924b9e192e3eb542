//! Scope chain
//!
//! Scopes live in an arena. Library, import and prefix scopes persist for
//! the whole run; class, method and block scopes are pushed while a body is
//! walked and popped in stack order.

use crate::error::{InternalError, ResolveResult};
use crate::symbols::{SymbolId, SymbolKind, SymbolTable};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use sable_syntax::is_private_name;

/// Scope identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// Scope kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Root frame binding `Dynamic` and `void`
    Language,
    /// Names imported into a library
    Import,
    /// A library's own top-level names
    Library,
    /// Names imported under `as prefix`
    Prefix,
    /// Members of a class, searched through its supertypes
    Class(SymbolId),
    Method,
    Function,
    Block,
    Loop,
    Switch,
    Catch,
}

impl ScopeKind {
    /// Frames that hold local variables and parameters
    pub fn is_local(self) -> bool {
        matches!(
            self,
            ScopeKind::Method | ScopeKind::Function | ScopeKind::Block | ScopeKind::Loop | ScopeKind::Switch | ScopeKind::Catch
        )
    }
}

/// One frame of the scope chain
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Library that owns the frame; None for the language scope
    pub library: Option<SymbolId>,
    symbols: IndexMap<String, SymbolId>,
    labels: Vec<SymbolId>,
    /// Names declared further down the current block
    declared_later: FxHashSet<String>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, library: Option<SymbolId>) -> Self {
        Scope {
            id,
            kind,
            parent,
            library,
            symbols: IndexMap::new(),
            labels: Vec::new(),
            declared_later: FxHashSet::default(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, SymbolId)> {
        self.symbols.iter().map(|(name, &id)| (name.as_str(), id))
    }

    pub fn labels(&self) -> &[SymbolId] {
        &self.labels
    }
}

/// Arena of scopes
#[derive(Debug, Clone)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    pub const LANGUAGE: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        let mut language = Scope::new(Self::LANGUAGE, ScopeKind::Language, None, None);
        language.symbols.insert("Dynamic".to_string(), SymbolId::DYNAMIC);
        language.symbols.insert("void".to_string(), SymbolId::VOID);
        ScopeTable { scopes: vec![language] }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// Push a new scope as a child of `parent`
    pub fn push(&mut self, kind: ScopeKind, parent: Option<ScopeId>, library: Option<SymbolId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, kind, parent, library));
        id
    }

    /// Pop the innermost scope, which must be `id`
    pub fn pop(&mut self, id: ScopeId) -> ResolveResult<()> {
        let top = self.scopes.len() as u32 - 1;
        if id.0 != top {
            return Err(InternalError::UnbalancedScope { popped: id.0, top });
        }
        self.scopes.pop();
        Ok(())
    }

    /// Bind `name` in `scope`, returning the binding it replaces in that frame
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>, symbol: SymbolId) -> Option<SymbolId> {
        self.get_mut(scope).symbols.insert(name.into(), symbol)
    }

    /// The binding of `name` in exactly this frame
    pub fn local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.get(scope).symbols.get(name).copied()
    }

    /// Walk the chain from `scope` outwards
    ///
    /// Frames owned by a library other than `from_library` do not supply
    /// private names. `from_library` None disables the privacy filter.
    pub fn find(&self, symbols: &SymbolTable, scope: ScopeId, from_library: Option<SymbolId>, name: &str) -> SymbolId {
        let private = is_private_name(name);
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.get(id);
            let hidden = private && from_library.is_some() && frame.library.is_some() && frame.library != from_library;
            if !hidden {
                let found = self.find_local(symbols, id, from_library, name);
                if !found.is_none() {
                    return found;
                }
            }
            current = frame.parent;
        }
        SymbolId::NONE
    }

    /// Search one frame; class frames also search the class's supertypes
    pub fn find_local(&self, symbols: &SymbolTable, scope: ScopeId, from_library: Option<SymbolId>, name: &str) -> SymbolId {
        let frame = self.get(scope);
        if let Some(&symbol) = frame.symbols.get(name) {
            return symbol;
        }
        match frame.kind {
            ScopeKind::Class(class) => {
                let mut visited = FxHashSet::default();
                find_in_class(symbols, class, from_library, name, &mut visited, true)
            }
            _ => SymbolId::NONE,
        }
    }

    /// Member `name` of `class` or its supertypes as seen from `from_library`
    pub fn find_member(&self, symbols: &SymbolTable, class: SymbolId, from_library: Option<SymbolId>, name: &str) -> SymbolId {
        let mut visited = FxHashSet::default();
        find_in_class(symbols, class, from_library, name, &mut visited, false)
    }

    pub fn declare_label(&mut self, scope: ScopeId, label: SymbolId) {
        self.get_mut(scope).labels.push(label);
    }

    /// Label `name` declared by `function` in this frame or an enclosing one
    pub fn find_label(&self, symbols: &SymbolTable, scope: ScopeId, name: &str, function: Option<SymbolId>) -> SymbolId {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.get(id);
            if !frame.kind.is_local() {
                break;
            }
            let found = frame.labels.iter().rev().copied().find(|&label| {
                symbols.name(label) == name && symbols.label(label).is_some_and(|l| l.function == function)
            });
            if let Some(label) = found {
                return label;
            }
            current = frame.parent;
        }
        SymbolId::NONE
    }

    /// Record names that a block declares later than the current statement
    pub fn mark_declared_later(&mut self, scope: ScopeId, name: &str) {
        self.get_mut(scope).declared_later.insert(name.to_string());
    }

    /// The declaration of `name` has been reached
    pub fn mark_declared(&mut self, scope: ScopeId, name: &str) {
        self.get_mut(scope).declared_later.remove(name);
    }

    /// Whether `name` refers to a local declared later in an enclosing block
    /// before any earlier binding of the same name is found
    pub fn is_declared_later(&self, scope: ScopeId, name: &str) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.get(id);
            if !frame.kind.is_local() {
                return false;
            }
            if frame.symbols.contains_key(name) {
                return false;
            }
            if frame.declared_later.contains(name) {
                return true;
            }
            current = frame.parent;
        }
        false
    }

    /// Variable or parameter `name` in a local frame enclosing `scope`
    /// (exclusive), up to the nearest method or function frame
    pub fn find_outer_local(&self, symbols: &SymbolTable, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let frame = self.get(scope);
        if matches!(frame.kind, ScopeKind::Method | ScopeKind::Function) {
            return None;
        }
        let mut current = frame.parent;
        while let Some(id) = current {
            let frame = self.get(id);
            if !frame.kind.is_local() {
                return None;
            }
            if let Some(&symbol) = frame.symbols.get(name) {
                return matches!(symbols.kind(symbol), SymbolKind::Variable | SymbolKind::Parameter).then_some(symbol);
            }
            if matches!(frame.kind, ScopeKind::Method | ScopeKind::Function) {
                return None;
            }
            current = frame.parent;
        }
        None
    }

    /// Library owning `scope`
    pub fn library_of(&self, scope: ScopeId) -> Option<SymbolId> {
        self.get(scope).library
    }
}

/// Class frame search
///
/// Type parameters are only visible in the class being searched from; a
/// type variable found in a supertype counts as not found.
fn find_in_class(
    symbols: &SymbolTable,
    class: SymbolId,
    from_library: Option<SymbolId>,
    name: &str,
    visited: &mut FxHashSet<SymbolId>,
    is_origin: bool,
) -> SymbolId {
    if !visited.insert(class) {
        return SymbolId::NONE;
    }
    let Some(data) = symbols.class(class) else {
        return SymbolId::NONE;
    };
    let hidden = is_private_name(name) && from_library.is_some_and(|lib| lib != data.library);
    if !hidden {
        if is_origin {
            if let Some(&tv) = data.type_parameters.iter().find(|&&tv| symbols.name(tv) == name) {
                return tv;
            }
        }
        if let Some(member) = data.members.get(name) {
            return member;
        }
    }
    for sup in data.direct_supertypes() {
        let found = find_in_class(symbols, sup, from_library, name, visited, false);
        if !found.is_none() && symbols.kind(found) != SymbolKind::TypeVariable {
            return found;
        }
    }
    SymbolId::NONE
}
