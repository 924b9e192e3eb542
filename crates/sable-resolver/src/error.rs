//! Internal error types
//!
//! User-facing problems are [`Diagnostic`](crate::diagnostic::Diagnostic)s
//! and never abort a pass. The types here signal either a resolver bug
//! ([`InternalError`]) or an expected alternate outcome that callers must
//! handle explicitly ([`CyclicDeclarationError`]).

use crate::symbols::SymbolId;
use sable_syntax::NodeId;
use thiserror::Error;

/// Result type of every resolution pass
pub type ResolveResult<T> = Result<T, InternalError>;

/// Invariant violation inside the resolver
///
/// Never caused by a defect in the program being resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// An assign-once cell was written twice
    #[error("{what} of symbol {symbol:?} assigned twice")]
    AssignedTwice {
        /// Which cell
        what: &'static str,
        /// Owning symbol
        symbol: SymbolId,
    },

    /// A node's resolved slot was bound to two different symbols or types
    #[error("resolved {slot} slot of node {node} rebound")]
    SlotRebound {
        /// "symbol", "type", "qualifier" or "declaration"
        slot: &'static str,
        /// Node whose slot was written
        node: NodeId,
    },

    /// A symbol did not have the kind its handle implied
    #[error("symbol {symbol:?} is not a {expected}")]
    UnexpectedKind {
        /// The symbol
        symbol: SymbolId,
        /// Kind the caller relied on
        expected: &'static str,
    },

    /// A declaration node was never given a symbol by the builders
    #[error("declaration node {node} has no symbol")]
    UnboundDeclaration {
        /// Declaration node
        node: NodeId,
    },

    /// The core library does not declare a type the resolver depends on
    #[error("core library does not declare '{name}'")]
    MissingCoreType {
        /// Type name
        name: String,
    },

    /// The program contains no core library
    #[error("program has no core library '{name}'")]
    MissingCoreLibrary {
        /// Expected library name
        name: String,
    },

    /// Two libraries in the program share a name
    #[error("library '{name}' is defined more than once")]
    DuplicateLibrary {
        /// Library name
        name: String,
    },

    /// Scopes were popped out of order
    #[error("scope {popped} popped while {top} is innermost")]
    UnbalancedScope {
        /// Scope being popped
        popped: u32,
        /// Innermost scope
        top: u32,
    },
}

/// The supertype graph reaches `class` again while computing its own closure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("class {class:?} is its own supertype")]
pub struct CyclicDeclarationError {
    /// Class whose closure was already in progress
    pub class: SymbolId,
}
