//! Sable Semantic Resolver
//!
//! Turns parsed Sable libraries into a resolved symbol graph.
//!
//! This crate provides:
//! - Symbols, scopes and interned types for every declaration
//! - Library scopes with imports, prefixes and re-exports
//! - Class headers: supertypes, interfaces, default classes and cycle detection
//! - Member signatures, constructors and override sets
//! - Name and type resolution of every body, written to side tables
//! - Compile-time-constant validation
//! - Diagnostics with stable codes, rendered through codespan
//!
//! # Usage
//!
//! ```
//! use sable_resolver::{corelib, resolve_program, CollectingListener, Program, ResolverConfig};
//! use sable_syntax::{AstBuilder, LibraryUnit, SourceId, TopLevelDecl};
//!
//! let b = AstBuilder::new(SourceId(1));
//! let main = b.method("main", Vec::new(), vec![b.expr_stmt(b.call("print", vec![b.string("hi")]))]);
//! let app = LibraryUnit::new("app").with_unit(b.unit("app.sbl", vec![TopLevelDecl::Function(main)]));
//!
//! let program = Program::new()
//!     .with_library(corelib::bootstrap_core_library())
//!     .with_library(app);
//! let mut listener = CollectingListener::new();
//! let resolved = resolve_program(&program, &ResolverConfig::default(), &mut listener).unwrap();
//! assert!(!resolved.has_errors(SourceId(1)));
//! ```

pub mod bindings;
pub mod builder;
pub mod config;
pub mod constants;
pub mod context;
pub mod corelib;
pub mod diagnostic;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod scope;
pub mod state;
pub mod supertypes;
pub mod symbols;
pub mod types;

pub use bindings::Bindings;
pub use config::{ConfigError, ResolverConfig, WarningConfig};
pub use context::{CollectingListener, CompilerContext, DiagnosticListener};
pub use diagnostic::{Diagnostic, ErrorCode, ResolverErrorCode, Severity, SourceFiles, TypeErrorCode};
pub use error::{InternalError, ResolveResult};
pub use pipeline::{resolve_program, Program, ResolvedProgram};
pub use scope::{ScopeId, ScopeKind, ScopeTable};
pub use symbols::{Symbol, SymbolData, SymbolId, SymbolKind, SymbolTable};
pub use types::{CoreTypes, Type, TypeId, TypeStore};
