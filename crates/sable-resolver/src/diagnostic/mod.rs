//! Diagnostics produced by resolution
//!
//! A [`Diagnostic`] is plain data: code, severity, primary span, message
//! arguments and related spans. Rendering to a terminal or to JSON goes
//! through codespan-reporting and needs the source text, which the resolver
//! itself never sees.

mod codes;

pub use codes::{ErrorCode, ResolverErrorCode, Severity, TypeErrorCode};

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity as CsSeverity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use termcolor::WriteColor;
use rustc_hash::FxHashMap;
use sable_syntax::{SourceId, Span};
use serde::{Deserialize, Serialize};

/// A single reported problem
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: ErrorCode,
    /// Effective severity after configuration was applied
    pub severity: Severity,
    pub span: Span,
    pub args: Vec<String>,
    /// Other locations involved, e.g. the first of two duplicate declarations
    pub related: Vec<Span>,
}

impl Diagnostic {
    pub fn new(code: impl Into<ErrorCode>, span: Span, args: Vec<String>) -> Self {
        let code = code.into();
        Diagnostic {
            code,
            severity: code.severity(),
            span,
            args,
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, span: Span) -> Self {
        self.related.push(span);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn message(&self) -> String {
        self.code.format(&self.args)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Convert to a codespan diagnostic; spans from unregistered sources are dropped
    pub fn to_codespan(&self, files: &SourceFiles) -> CsDiagnostic<usize> {
        let severity = match self.severity {
            Severity::Error => CsSeverity::Error,
            Severity::Warning => CsSeverity::Warning,
            Severity::Info => CsSeverity::Note,
        };
        let mut labels = Vec::new();
        if let Some(file) = files.file_id(self.span.source) {
            labels.push(Label::primary(file, self.span.start..self.span.end).with_message(self.code.name()));
        }
        for related in &self.related {
            if let Some(file) = files.file_id(related.source) {
                labels.push(Label::secondary(file, related.start..related.end).with_message("related declaration"));
            }
        }
        CsDiagnostic::new(severity)
            .with_message(self.message())
            .with_code(self.code.as_str())
            .with_labels(labels)
    }

    /// Emit the diagnostic to the terminal
    pub fn emit(&self, files: &SourceFiles, writer: &mut dyn WriteColor) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, &files.files, &self.to_codespan(files))
    }

    pub fn to_json(&self, files: &SourceFiles) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

/// Source texts indexed for rendering
pub struct SourceFiles {
    files: SimpleFiles<String, String>,
    ids: FxHashMap<SourceId, usize>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: FxHashMap::default(),
        }
    }

    pub fn add(&mut self, source: SourceId, path: impl Into<String>, text: impl Into<String>) {
        let file = self.files.add(path.into(), text.into());
        self.ids.insert(source, file);
    }

    pub fn file_id(&self, source: SourceId) -> Option<usize> {
        self.ids.get(&source).copied()
    }
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "E1001")
    pub code: String,
    /// Kebab-case code name
    pub name: String,
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<JsonLabel>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// "primary" or "secondary"
    pub style: String,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SourceFiles) -> Self {
        let rendered = diag.to_codespan(files);
        let labels = rendered
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;
                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_str().to_string(),
            name: diag.code.name().to_string(),
            severity: diag.severity,
            message: diag.message(),
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    fn files() -> SourceFiles {
        let mut files = SourceFiles::new();
        files.add(SourceId(0), "lib/a.sbl", "class A {}\nclass A {}\n");
        files
    }

    #[test]
    fn test_message_and_severity() {
        let diag = Diagnostic::new(
            ResolverErrorCode::CannotResolveMethodInClass,
            Span::new(SourceId(0), 0, 5, 1, 1),
            vec!["foo".into(), "A".into()],
        );
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message(), "cannot resolve method 'foo' in class 'A'");
    }

    #[test]
    fn test_codespan_labels() {
        let diag = Diagnostic::new(
            ResolverErrorCode::DuplicateTopLevelDeclaration,
            Span::new(SourceId(0), 17, 18, 2, 7),
            vec!["A".into(), "lib/a.sbl:1:7".into()],
        )
        .with_related(Span::new(SourceId(0), 6, 7, 1, 7));
        let rendered = diag.to_codespan(&files());
        assert_eq!(rendered.code.as_deref(), Some("E1101"));
        assert_eq!(rendered.labels.len(), 2);
        assert_eq!(rendered.labels[0].style, LabelStyle::Primary);
        assert_eq!(rendered.labels[1].style, LabelStyle::Secondary);
    }

    #[test]
    fn test_unknown_source_has_no_labels() {
        let diag = Diagnostic::new(ResolverErrorCode::CyclicClass, Span::new(SourceId(9), 0, 1, 1, 1), vec!["A".into()]);
        assert!(diag.to_codespan(&files()).labels.is_empty());
    }

    #[test]
    fn test_json_output() {
        let diag = Diagnostic::new(ResolverErrorCode::CyclicClass, Span::new(SourceId(0), 6, 7, 1, 7), vec!["A".into()]);
        let json = diag.to_json(&files()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["code"], "E1401");
        assert_eq!(parsed["name"], "cyclic-class");
        assert_eq!(parsed["severity"], "error");
        assert_eq!(parsed["labels"][0]["file"], "lib/a.sbl");
        assert_eq!(parsed["labels"][0]["start_line"], 1);
        assert_eq!(parsed["labels"][0]["start_column"], 7);
    }

    #[test]
    fn test_emit_plain_text() {
        let diag = Diagnostic::new(ResolverErrorCode::CyclicClass, Span::new(SourceId(0), 6, 7, 1, 7), vec!["A".into()]);
        let mut out = NoColor::new(Vec::new());
        diag.emit(&files(), &mut out).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("error[E1401]: 'A' is a supertype of itself"));
    }
}
