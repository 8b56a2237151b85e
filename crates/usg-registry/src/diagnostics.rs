//! Per-record diagnostics.
//!
//! Every rejected or flagged record produces one [`Diagnostic`], delivered
//! to a [`DiagnosticSink`] at the moment it is found. Nothing is buffered
//! until the end of the run; the caller decides how to render.

use std::fmt;

use crate::collection::CollectionKind;
use crate::error::RecordError;

/// One rejected or flagged record.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub collection: CollectionKind,
    /// Record identifier when known, otherwise its relative path.
    pub subject: String,
    pub error: RecordError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.collection.label(),
            self.subject,
            self.error
        )
    }
}

/// Receives diagnostics as they are produced.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics raised against one collection.
    pub fn for_collection(&self, kind: CollectionKind) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.collection == kind)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Hand a diagnostic to the sink. The sink owns user-facing output; the
/// trace event is only visible at debug level.
pub(crate) fn report(
    sink: &mut dyn DiagnosticSink,
    collection: CollectionKind,
    subject: impl Into<String>,
    error: RecordError,
) {
    let diagnostic = Diagnostic {
        collection,
        subject: subject.into(),
        error,
    };
    tracing::debug!(
        collection = %diagnostic.collection,
        subject = %diagnostic.subject,
        error = %diagnostic.error,
        "record rejected"
    );
    sink.emit(&diagnostic);
}
