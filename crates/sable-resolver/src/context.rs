//! Compiler context: the sink every pass reports diagnostics to

use crate::config::ResolverConfig;
use crate::diagnostic::{Diagnostic, ErrorCode, Severity};
use rustc_hash::{FxHashMap, FxHashSet};
use sable_syntax::{SourceId, Span};
use tracing::debug;

/// Receives diagnostics as they are produced
pub trait DiagnosticListener {
    fn on_diagnostic(&mut self, diagnostic: Diagnostic);
}

/// Listener that keeps every diagnostic in report order
#[derive(Debug, Default)]
pub struct CollectingListener {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn for_source(&self, source: SourceId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.span.source == source)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn count(&self, code: impl Into<ErrorCode>) -> usize {
        let code = code.into();
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn contains(&self, code: impl Into<ErrorCode>) -> bool {
        self.count(code) > 0
    }
}

impl DiagnosticListener for CollectingListener {
    fn on_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Applies configuration to reported diagnostics and forwards the survivors
pub struct CompilerContext<'a> {
    config: &'a ResolverConfig,
    listener: &'a mut dyn DiagnosticListener,
    paths: FxHashMap<SourceId, String>,
    core_sources: FxHashSet<SourceId>,
    error_sources: FxHashSet<SourceId>,
}

impl<'a> CompilerContext<'a> {
    pub fn new(config: &'a ResolverConfig, listener: &'a mut dyn DiagnosticListener) -> Self {
        Self {
            config,
            listener,
            paths: FxHashMap::default(),
            core_sources: FxHashSet::default(),
            error_sources: FxHashSet::default(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        self.config
    }

    /// Record the path of a compilation unit
    pub fn register_source(&mut self, source: SourceId, path: &str) {
        if self.config.is_core_path(path) {
            self.core_sources.insert(source);
        }
        self.paths.insert(source, path.to_string());
    }

    pub fn is_core_source(&self, source: SourceId) -> bool {
        self.core_sources.contains(&source)
    }

    /// `path:line:column` for use in messages
    pub fn location(&self, span: Span) -> String {
        match self.paths.get(&span.source) {
            Some(path) => format!("{}:{}:{}", path, span.line, span.column),
            None => span.to_string(),
        }
    }

    pub fn report(&mut self, span: Span, code: impl Into<ErrorCode>, args: &[&str]) {
        self.report_with_related(span, code, args, Vec::new());
    }

    pub fn report_with_related(&mut self, span: Span, code: impl Into<ErrorCode>, args: &[&str], related: Vec<Span>) {
        let code = code.into();
        let mut diagnostic = Diagnostic::new(code, span, args.iter().map(|a| a.to_string()).collect());
        diagnostic.related = related;
        self.emit(diagnostic);
    }

    /// Filter, adjust severity and forward
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        let code = diagnostic.code;
        let mut diagnostic = diagnostic;
        if diagnostic.severity != Severity::Error {
            if !self.config.warnings.is_enabled(code) {
                return;
            }
            if self.config.suppress_core_warnings && self.is_core_source(diagnostic.span.source) {
                return;
            }
            if self.config.warnings.is_denied(code) {
                diagnostic.severity = Severity::Error;
            }
        }
        debug!(code = %code, name = code.name(), at = %diagnostic.span, "diagnostic");
        if diagnostic.is_error() {
            self.error_sources.insert(diagnostic.span.source);
        }
        self.listener.on_diagnostic(diagnostic);
    }

    /// Whether any error was reported against `source`
    pub fn has_errors(&self, source: SourceId) -> bool {
        self.error_sources.contains(&source)
    }

    pub fn error_sources(&self) -> &FxHashSet<SourceId> {
        &self.error_sources
    }
}
