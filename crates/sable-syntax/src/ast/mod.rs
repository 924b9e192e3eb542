//! Abstract Syntax Tree (AST) definitions for Sable
//!
//! The tree is produced by the parser (or by [`AstBuilder`](crate::AstBuilder))
//! and is never mutated by the resolver. Nodes that receive a resolved symbol
//! or type carry a [`NodeId`].

pub mod declaration;
pub mod expression;
pub mod statement;
pub mod types;

pub use declaration::*;
pub use expression::*;
pub use statement::*;
pub use types::*;

use crate::span::{SourceId, Span};
use bitflags::bitflags;
use std::fmt;

/// Stable identity of a node within the whole program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub source: SourceId,
    pub index: u32,
}

impl NodeId {
    pub fn new(source: SourceId, index: u32) -> Self {
        Self { source, index }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.index)
    }
}

/// Identifier: x, foo, _private
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

impl Identifier {
    /// Library-private names start with an underscore
    pub fn is_private(&self) -> bool {
        is_private_name(&self.name)
    }
}

/// Whether `name` is visible only inside its declaring library
pub fn is_private_name(name: &str) -> bool {
    name.starts_with('_')
}

bitflags! {
    /// Declaration modifiers
    ///
    /// The low bits mirror source keywords. The high bits are never produced
    /// by the parser; the resolver sets them on symbols.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const STATIC = 1 << 0;
        const FINAL = 1 << 1;
        const CONST = 1 << 2;
        const ABSTRACT = 1 << 3;
        const FACTORY = 1 << 4;
        const EXTERNAL = 1 << 5;
        const OPERATOR = 1 << 6;
        const GETTER = 1 << 7;
        const SETTER = 1 << 8;
        const NAMED = 1 << 9;
        const OPTIONAL = 1 << 10;
        const NATIVE = 1 << 11;

        /// Field synthesized from a getter and/or setter
        const ABSTRACT_FIELD = 1 << 16;
        /// Field or variable declared with an initializer
        const INITIALIZED = 1 << 17;
        /// Implicit declaration with no source counterpart
        const SYNTHETIC = 1 << 18;
        /// Constructor whose body is another constructor
        const REDIRECTING = 1 << 19;
        const HAS_BODY = 1 << 20;
    }
}

impl Modifiers {
    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    /// `final` or `const`
    pub fn is_final(self) -> bool {
        self.intersects(Modifiers::FINAL | Modifiers::CONST)
    }

    pub fn is_const(self) -> bool {
        self.contains(Modifiers::CONST)
    }

    pub fn is_factory(self) -> bool {
        self.contains(Modifiers::FACTORY)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }

    pub fn is_getter(self) -> bool {
        self.contains(Modifiers::GETTER)
    }

    pub fn is_setter(self) -> bool {
        self.contains(Modifiers::SETTER)
    }

    pub fn is_operator(self) -> bool {
        self.contains(Modifiers::OPERATOR)
    }

    pub fn is_native(self) -> bool {
        self.contains(Modifiers::NATIVE)
    }

    pub fn is_named(self) -> bool {
        self.contains(Modifiers::NAMED)
    }

    pub fn is_optional(self) -> bool {
        self.intersects(Modifiers::OPTIONAL | Modifiers::NAMED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_counts_as_final() {
        assert!(Modifiers::CONST.is_final());
        assert!(Modifiers::FINAL.is_final());
        assert!(!Modifiers::STATIC.is_final());
    }

    #[test]
    fn test_named_parameters_are_optional() {
        assert!(Modifiers::NAMED.is_optional());
        assert!(Modifiers::OPTIONAL.is_optional());
        assert!(!Modifiers::empty().is_optional());
    }

    #[test]
    fn test_private_names() {
        assert!(is_private_name("_x"));
        assert!(!is_private_name("x_"));
    }
}
