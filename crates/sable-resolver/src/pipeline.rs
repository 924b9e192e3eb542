//! Pass driver
//!
//! [`resolve_program`] runs every pass over a whole program, in order:
//!
//! 1. top-level declarations, re-exports and imports
//! 2. core types and class headers (supertypes, interfaces, defaults, cycles)
//! 3. members: fields, methods, constructors and their signatures
//! 4. bodies: names, types and constructor chains
//! 5. override sets
//! 6. compile-time constants
//!
//! Diagnostics go to the listener as they are found. Only internal
//! invariant violations stop the pipeline.

use crate::bindings::Bindings;
use crate::builder::{compute_overrides, MemberBuilder, TopLevelBuilder};
use crate::config::ResolverConfig;
use crate::constants::ConstantAnalyzer;
use crate::context::{CompilerContext, DiagnosticListener};
use crate::corelib::CORE_LIBRARY;
use crate::error::{InternalError, ResolveResult};
use crate::resolver::Resolver;
use crate::scope::ScopeTable;
use crate::state::ProgramState;
use crate::supertypes::SupertypeResolver;
use crate::symbols::{SymbolId, SymbolTable};
use crate::types::{CoreTypes, TypeStore};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use sable_syntax::{LibraryUnit, SourceId};
use tracing::{debug, instrument};

/// Every library of a program, the core library included
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub libraries: Vec<LibraryUnit>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, library: LibraryUnit) -> Self {
        self.libraries.push(library);
        self
    }
}

/// Symbol graph and side tables of a resolved program
#[derive(Debug)]
pub struct ResolvedProgram {
    pub symbols: SymbolTable,
    pub types: TypeStore,
    pub scopes: ScopeTable,
    pub bindings: Bindings,
    /// Library name → library symbol
    pub libraries: IndexMap<String, SymbolId>,
    pub core: CoreTypes,
    /// Implicit constructors created for classes that declare none
    pub synthetic_constructors: FxHashMap<SymbolId, SymbolId>,
    error_sources: FxHashSet<SourceId>,
}

impl ResolvedProgram {
    /// Whether an error was reported in `source`; such units are not compiled
    pub fn has_errors(&self, source: SourceId) -> bool {
        self.error_sources.contains(&source)
    }

    pub fn library(&self, name: &str) -> Option<SymbolId> {
        self.libraries.get(name).copied()
    }

    /// Top-level declaration `name` of library `library`
    pub fn top_level(&self, library: &str, name: &str) -> Option<SymbolId> {
        let lib = self.library(library)?;
        let scope = self.symbols.library(lib)?.scope;
        self.scopes.local(scope, name)
    }

    /// Member `name` declared by class `class` of library `library`
    pub fn member(&self, library: &str, class: &str, name: &str) -> Option<SymbolId> {
        let class = self.top_level(library, class)?;
        self.symbols.class(class)?.members.get(name)
    }
}

/// Resolve `program`, reporting diagnostics to `listener`
#[instrument(level = "debug", skip_all, fields(libraries = program.libraries.len()))]
pub fn resolve_program(
    program: &Program,
    config: &ResolverConfig,
    listener: &mut dyn DiagnosticListener,
) -> ResolveResult<ResolvedProgram> {
    let mut state = ProgramState::new();
    let mut ctx = CompilerContext::new(config, listener);

    TopLevelBuilder::new(&mut state, &mut ctx).build(program)?;

    let core_library = state.core_library.ok_or_else(|| InternalError::MissingCoreLibrary {
        name: CORE_LIBRARY.to_string(),
    })?;
    let core_scope = state
        .symbols
        .library(core_library)
        .map(|lib| lib.scope)
        .ok_or_else(|| InternalError::MissingCoreLibrary {
            name: CORE_LIBRARY.to_string(),
        })?;
    let core = CoreTypes::lookup(&state.symbols, &state.scopes, core_scope)?;
    state.core = Some(core);

    SupertypeResolver::new(&mut state, &mut ctx).build(program)?;
    MemberBuilder::new(&mut state, &mut ctx).build(program)?;
    Resolver::new(&mut state, &mut ctx).resolve(program)?;
    compute_overrides(&mut state, &mut ctx)?;
    ConstantAnalyzer::new(&mut state, &mut ctx).analyze(program)?;

    let error_sources = ctx.error_sources().clone();
    debug!(
        symbols = state.symbols.len(),
        types = state.types.len(),
        error_sources = error_sources.len(),
        "resolved program"
    );

    Ok(ResolvedProgram {
        symbols: state.symbols,
        types: state.types,
        scopes: state.scopes,
        bindings: state.bindings,
        libraries: state.libraries,
        core,
        synthetic_constructors: state.synthetic_constructors,
        error_sources,
    })
}
