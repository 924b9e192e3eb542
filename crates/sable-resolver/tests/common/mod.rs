//! Helpers shared by the resolver integration tests

#![allow(dead_code)]

use sable_resolver::corelib::bootstrap_core_library;
use sable_resolver::{
    resolve_program, CollectingListener, Diagnostic, ErrorCode, Program, ResolvedProgram, ResolverConfig, SymbolId,
};
use sable_syntax::{AstBuilder, LibraryUnit, SourceId, TopLevelDecl};

pub const APP: &str = "app";
pub const APP_SOURCE: SourceId = SourceId(1);

/// A resolved program together with everything reported while resolving it
pub struct Resolved {
    pub program: ResolvedProgram,
    pub listener: CollectingListener,
}

impl Resolved {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.listener.diagnostics()
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.listener.codes()
    }

    pub fn count(&self, code: impl Into<ErrorCode>) -> usize {
        self.listener.count(code)
    }

    pub fn has(&self, code: impl Into<ErrorCode>) -> bool {
        self.listener.contains(code)
    }

    pub fn assert_clean(&self) {
        assert!(
            self.diagnostics().is_empty(),
            "Expected no diagnostics, got: {:#?}",
            self.diagnostics()
        );
    }

    pub fn assert_reports(&self, code: impl Into<ErrorCode>) {
        let code = code.into();
        assert!(self.has(code), "Expected {} ({}), got: {:?}", code, code.name(), self.codes());
    }

    pub fn assert_only(&self, code: impl Into<ErrorCode>) {
        let code = code.into();
        let codes = self.codes();
        assert!(
            !codes.is_empty() && codes.iter().all(|&c| c == code),
            "Expected only {} ({}), got: {:?}",
            code,
            code.name(),
            codes
        );
    }

    /// Top-level declaration of the app library
    pub fn top_level(&self, name: &str) -> SymbolId {
        self.program
            .top_level(APP, name)
            .unwrap_or_else(|| panic!("app should declare '{}'", name))
    }

    /// Member `name` declared by app class `class`
    pub fn member(&self, class: &str, name: &str) -> SymbolId {
        self.program
            .member(APP, class, name)
            .unwrap_or_else(|| panic!("class {} should declare '{}'", class, name))
    }
}

pub fn app() -> AstBuilder {
    AstBuilder::new(APP_SOURCE)
}

/// Library `name` made of one unit at `<name>.sbl`
pub fn library(b: &AstBuilder, name: &str, declarations: Vec<TopLevelDecl>) -> LibraryUnit {
    LibraryUnit::new(name).with_unit(b.unit(&format!("{}.sbl", name), declarations))
}

pub fn resolve(libraries: Vec<LibraryUnit>) -> Resolved {
    resolve_with(libraries, &ResolverConfig::default())
}

pub fn resolve_with(libraries: Vec<LibraryUnit>, config: &ResolverConfig) -> Resolved {
    init_tracing();
    let mut program = Program::new().with_library(bootstrap_core_library());
    for library in libraries {
        program = program.with_library(library);
    }
    let mut listener = CollectingListener::new();
    let program = resolve_program(&program, config, &mut listener).unwrap();
    Resolved { program, listener }
}

/// Resolve a single app library against the core library
pub fn resolve_app(b: &AstBuilder, declarations: Vec<TopLevelDecl>) -> Resolved {
    resolve(vec![library(b, APP, declarations)])
}

/// Route resolver logs to the test harness; `RUST_LOG=sable_resolver=debug` shows them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
