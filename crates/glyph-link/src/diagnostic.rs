//! Diagnostic reporting
//!
//! Link errors and warnings are collected in [`Diagnostics`] and rendered
//! with source context through codespan-reporting.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use glyph_types::Span;
use termcolor::WriteColor;

use crate::error::{LinkError, LinkWarning};

/// Error code for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// Source files spans refer to, by position
pub type SourceFiles = SimpleFiles<String, String>;

/// A diagnostic message with source code context
#[derive(Debug, Clone)]
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self.inner = self.inner.with_code(code.0);
        self
    }

    /// Add a primary label if the span points into a registered file
    pub fn with_primary_label(mut self, span: Option<Span>, files: usize, message: impl Into<String>) -> Self {
        if let Some(span) = span.filter(|s| s.file < files) {
            self.inner.labels.push(Label::primary(span.file, span.range()).with_message(message));
        }
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Error code, if any
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Severity
    pub fn severity(&self) -> Severity {
        self.inner.severity
    }

    /// Main message
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Notes in order
    pub fn notes(&self) -> &[String] {
        &self.inner.notes
    }

    /// Underlying codespan diagnostic
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Create a diagnostic from a link error. `files` is the number of
    /// registered source files.
    pub fn from_link_error(error: &LinkError, files: usize) -> Self {
        use LinkError::*;

        let diag = Diagnostic::error(error.to_string()).with_code(error_code(error));
        match error {
            PromiseViolation {
                promise,
                expected,
                found,
                span,
                ..
            } => {
                let diag = diag.with_primary_label(*span, files, format!("incompatible {promise}"));
                if expected.is_empty() && found.is_empty() {
                    diag
                } else {
                    diag.with_note(format!("expected {expected}, found {found}"))
                }
            }
            InvalidOverride { span, .. } => diag
                .with_primary_label(*span, files, "invalid override")
                .with_help("members matching a superclass member must be declared ✒️"),
            MissingRequiredInitializer { span, initializer, .. } => diag
                .with_primary_label(*span, files, "class declared here")
                .with_help(format!("implement 🔑🆕 {initializer}")),
            ConformanceViolation { span, .. } => {
                diag.with_primary_label(*span, files, "conformance not satisfied")
            }
            DuplicateDeclaration { span, .. } => {
                diag.with_primary_label(*span, files, "duplicate declaration")
            }
            UnknownType { span, .. } => diag.with_primary_label(*span, files, "type not found"),
            other => diag.with_primary_label(other.span(), files, ""),
        }
    }

    /// Create a diagnostic from a link warning
    pub fn from_link_warning(warning: &LinkWarning, files: usize) -> Self {
        let diag = Diagnostic::warning(warning.to_string()).with_code(warning_code(warning));
        match warning {
            LinkWarning::InstanceVariablesWithoutInitializers { span, .. } => diag
                .with_primary_label(*span, files, "declared here")
                .with_help("add an initializer that sets the instance variables"),
            LinkWarning::OverridesDeprecated { span, .. } => {
                diag.with_primary_label(*span, files, "")
            }
        }
    }

    /// Render to a color-capable writer
    pub fn emit(&self, writer: &mut dyn WriteColor, files: &SourceFiles) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, files, &self.inner)
    }
}

/// Get error code for a LinkError
pub fn error_code(error: &LinkError) -> ErrorCode {
    use LinkError::*;

    match error {
        DuplicateDeclaration { .. } => ErrorCode("E1001"),
        UnknownType { .. } => ErrorCode("E1002"),
        UnresolvedGenericVariable { .. } => ErrorCode("E1003"),
        MissingSupertype { .. } => ErrorCode("E1004"),
        InvalidSupertype { .. } => ErrorCode("E1005"),
        ReservedName { .. } => ErrorCode("E1006"),
        NativeNotAllowed { .. } => ErrorCode("E1007"),
        InvalidPackage { .. } => ErrorCode("E1008"),
        InvalidEntryPoint { .. } => ErrorCode("E1009"),
        DuplicateEntryPoint { .. } => ErrorCode("E1010"),
        Model { .. } => ErrorCode("E1011"),
        PromiseViolation { .. } => ErrorCode("E2001"),
        InvalidOverride { .. } => ErrorCode("E2002"),
        MissingRequiredInitializer { .. } => ErrorCode("E2003"),
        ConformanceViolation { .. } => ErrorCode("E3001"),
        InvalidConformance { .. } => ErrorCode("E3002"),
        SerializationLimitExceeded { .. } => ErrorCode("E4001"),
    }
}

/// Get warning code for a LinkWarning
pub fn warning_code(warning: &LinkWarning) -> ErrorCode {
    match warning {
        LinkWarning::InstanceVariablesWithoutInitializers { .. } => ErrorCode("W0001"),
        LinkWarning::OverridesDeprecated { .. } => ErrorCode("W0002"),
    }
}

/// Ordered collection of link errors and warnings
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<LinkError>,
    warnings: Vec<LinkWarning>,
}

impl Diagnostics {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    pub fn error(&mut self, error: LinkError) {
        tracing::debug!(%error, "link error");
        self.errors.push(error);
    }

    /// Record a warning
    pub fn warning(&mut self, warning: LinkWarning) {
        tracing::debug!(%warning, "link warning");
        self.warnings.push(warning);
    }

    /// Whether any error was recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors in the order they were found
    pub fn errors(&self) -> &[LinkError] {
        &self.errors
    }

    /// Warnings in the order they were found
    pub fn warnings(&self) -> &[LinkWarning] {
        &self.warnings
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Move everything from `other` into this collection
    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Render every entry, errors first
    pub fn to_diagnostics(&self, files: usize) -> Vec<Diagnostic> {
        self.errors
            .iter()
            .map(|e| Diagnostic::from_link_error(e, files))
            .chain(self.warnings.iter().map(|w| Diagnostic::from_link_warning(w, files)))
            .collect()
    }

    /// Emit every entry to `writer`
    pub fn emit(&self, writer: &mut dyn WriteColor, files: &SourceFiles, file_count: usize) -> Result<(), codespan_reporting::files::Error> {
        for diagnostic in self.to_diagnostics(file_count) {
            diagnostic.emit(writer, files)?;
        }
        Ok(())
    }
}

/// Helper to create a SimpleFiles instance from (path, source) pairs
pub fn create_files<I, P, S>(sources: I) -> SourceFiles
where
    I: IntoIterator<Item = (P, S)>,
    P: Into<String>,
    S: Into<String>,
{
    let mut files = SimpleFiles::new();
    for (path, source) in sources {
        files.add(path.into(), source.into());
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Promise;
    use termcolor::NoColor;

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::error("Test error").with_code(ErrorCode("E2001"));
        assert_eq!(diag.code(), Some(ErrorCode("E2001")));
        assert_eq!(diag.severity(), Severity::Error);
    }

    #[test]
    fn test_promise_violation_notes_types() {
        let error = LinkError::PromiseViolation {
            class: "B".into(),
            superclass: "A".into(),
            member: "m".into(),
            kind: "Method",
            promise: Promise::ReturnType,
            expected: "🚂".into(),
            found: "🍬🚂".into(),
            span: Some(Span::new(0, 4, 8)),
        };
        let diag = Diagnostic::from_link_error(&error, 1);
        assert_eq!(diag.code(), Some(ErrorCode("E2001")));
        assert_eq!(diag.notes(), ["expected 🚂, found 🍬🚂"]);
        assert_eq!(diag.inner().labels.len(), 1);
    }

    #[test]
    fn test_span_outside_registered_files_has_no_label() {
        let error = LinkError::UnknownType {
            name: "🐟".into(),
            span: Some(Span::new(3, 0, 1)),
        };
        let diag = Diagnostic::from_link_error(&error, 1);
        assert!(diag.inner().labels.is_empty());
    }

    #[test]
    fn test_emit_renders_source() {
        let files = create_files([("main.🍇", "🐇 🐟 🍇 🍉")]);
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(LinkError::UnknownType {
            name: "🐟".into(),
            span: Some(Span::new(0, 5, 9)),
        });
        diagnostics.warning(LinkWarning::InstanceVariablesWithoutInitializers {
            class: "🐇".into(),
            count: 1,
            span: None,
        });

        let mut out = NoColor::new(Vec::new());
        diagnostics.emit(&mut out, &files, 1).unwrap();
        let rendered = String::from_utf8(out.into_inner()).unwrap();
        assert!(rendered.contains("error[E1002]"));
        assert!(rendered.contains("main.🍇"));
        assert!(rendered.contains("warning[W0001]"));
    }
}
