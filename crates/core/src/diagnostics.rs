//! Diagnostics
//!
//! Severity-tagged messages produced while resolving native toolchains.
//! Every locator takes its own sink by `&mut`; sinks are never shared
//! between concurrent resolutions.

use std::fmt;
use tracing::{error, info, warn};

/// Severity of a diagnostic, ordered by effect on resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Purely informational, never changes the outcome
    Info,
    /// Recoverable, resolution continues with a fallback
    Warn,
    /// Resolution completes but the result is flagged as unsuccessful
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.as_str(), self.message)
    }
}

/// Receiver of diagnostics
pub trait DiagnosticSink {
    /// Accept one diagnostic
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Severity shorthands for any sink, trait objects included
pub trait DiagnosticSinkExt: DiagnosticSink {
    fn error(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Error, message));
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Warn, message));
    }

    fn info(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Info, message));
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSinkExt for T {}

/// Sink that keeps every diagnostic in arrival order
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    diagnostics: Vec<Diagnostic>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics in arrival order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take the recorded diagnostics, leaving the sink empty
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn messages(&self, severity: Severity) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Severity::Warn)
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages(Severity::Info)
    }

    /// Whether any error was recorded
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Sink that forwards to `tracing`, tagged with a scope (usually a module or ABI)
#[derive(Debug, Clone)]
pub struct TracingSink {
    scope: String,
}

impl TracingSink {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into() }
    }
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => info!(scope = %self.scope, "{}", diagnostic.message),
            Severity::Warn => warn!(scope = %self.scope, "{}", diagnostic.message),
            Severity::Error => error!(scope = %self.scope, "{}", diagnostic.message),
        }
    }
}

/// Sink that records and forwards to another sink at the same time
pub struct TeeSink<'a> {
    pub recorded: RecordingSink,
    inner: &'a mut dyn DiagnosticSink,
}

impl<'a> TeeSink<'a> {
    pub fn new(inner: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            recorded: RecordingSink::new(),
            inner,
        }
    }
}

impl DiagnosticSink for TeeSink<'_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.recorded.report(diagnostic.clone());
        self.inner.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_filters_by_severity() {
        let mut sink = RecordingSink::new();
        sink.info("considered /a");
        sink.warn("skipped /b");
        sink.error("nothing found");
        sink.info("considered /c");

        assert_eq!(sink.infos(), vec!["considered /a", "considered /c"]);
        assert_eq!(sink.warnings(), vec!["skipped /b"]);
        assert_eq!(sink.errors(), vec!["nothing found"]);
        assert!(sink.has_errors());
    }

    #[test]
    fn test_dyn_sink_helpers() {
        let mut recording = RecordingSink::new();
        {
            let sink: &mut dyn DiagnosticSink = &mut recording;
            sink.error("boom");
        }
        assert_eq!(recording.diagnostics()[0].to_string(), "error: boom");
    }

    #[test]
    fn test_tee_sink_records_and_forwards() {
        let mut outer = RecordingSink::new();
        let recorded = {
            let mut tee = TeeSink::new(&mut outer);
            tee.warn("w");
            tee.recorded.clone()
        };
        assert_eq!(recorded.warnings(), vec!["w"]);
        assert_eq!(outer.warnings(), vec!["w"]);
    }
}
