//! Resolved-slot side tables
//!
//! The syntax tree is immutable; the symbol and type each node resolves to
//! are recorded here, keyed by [`NodeId`]. A slot can be written again with
//! the same value but never rebound to a different one.

use crate::error::{InternalError, ResolveResult};
use crate::symbols::SymbolId;
use crate::types::TypeId;
use rustc_hash::FxHashMap;
use sable_syntax::NodeId;
use std::collections::hash_map::Entry;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct Bindings {
    symbols: FxHashMap<NodeId, SymbolId>,
    types: FxHashMap<NodeId, TypeId>,
    /// Library a prefix-qualified reference went through
    qualifiers: FxHashMap<NodeId, SymbolId>,
    /// Symbol created for a declaration node
    declarations: FxHashMap<NodeId, SymbolId>,
}

fn write_once<V: Copy + PartialEq>(
    map: &mut FxHashMap<NodeId, V>,
    node: NodeId,
    value: V,
    slot: &'static str,
) -> ResolveResult<()> {
    match map.entry(node) {
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
        Entry::Occupied(entry) if *entry.get() == value => Ok(()),
        Entry::Occupied(_) => Err(InternalError::SlotRebound { slot, node }),
    }
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_symbol(&mut self, node: NodeId, symbol: SymbolId) -> ResolveResult<()> {
        trace!(%node, symbol = symbol.0, "bind symbol");
        write_once(&mut self.symbols, node, symbol, "symbol")
    }

    pub fn bind_type(&mut self, node: NodeId, ty: TypeId) -> ResolveResult<()> {
        write_once(&mut self.types, node, ty, "type")
    }

    pub fn bind_qualifier(&mut self, node: NodeId, library: SymbolId) -> ResolveResult<()> {
        write_once(&mut self.qualifiers, node, library, "qualifier")
    }

    pub fn declare(&mut self, node: NodeId, symbol: SymbolId) -> ResolveResult<()> {
        write_once(&mut self.declarations, node, symbol, "declaration")
    }

    pub fn symbol(&self, node: NodeId) -> Option<SymbolId> {
        self.symbols.get(&node).copied()
    }

    pub fn ty(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(&node).copied()
    }

    pub fn qualifier(&self, node: NodeId) -> Option<SymbolId> {
        self.qualifiers.get(&node).copied()
    }

    pub fn declaration(&self, node: NodeId) -> Option<SymbolId> {
        self.declarations.get(&node).copied()
    }

    /// Declared symbol of a node the builders must have visited
    pub fn expect_declaration(&self, node: NodeId) -> ResolveResult<SymbolId> {
        self.declaration(node).ok_or(InternalError::UnboundDeclaration { node })
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}
