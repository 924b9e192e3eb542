//! Sable syntax tree
//!
//! The tree handed to the semantic resolver by the parser. Every node that
//! the resolver binds to a symbol or a type carries a [`NodeId`]; resolution
//! results live in side tables keyed by that id rather than inside the tree.
//!
//! Trees can also be assembled programmatically through [`AstBuilder`],
//! which allocates node ids and distinct spans.

pub mod ast;
pub mod builder;
pub mod span;

pub use ast::*;
pub use builder::AstBuilder;
pub use span::{SourceId, Span};
