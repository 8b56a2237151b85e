//! # Orchestrator
//!
//! One validation run, start to finish:
//!
//! 1. Resolve the collection load order from the declared references.
//! 2. Load the schema directory and compile the event schema.
//! 3. Load the registry metadata.
//! 4. Load every non-event collection, in load order.
//! 5. Cross-check non-event references (flag, count, retain).
//! 6. Load and validate events against the loaded collections.
//! 7. Write one index document per collection.
//! 8. Write per-collection counts into the metadata.
//!
//! Steps 1 through 6 can fail fatally; nothing is written until all of
//! them have succeeded. Per-record failures never stop the run. They reach
//! the sink as they happen and are totalled in the [`RunReport`].

use std::path::PathBuf;

use usg_core::Timestamp;
use usg_schema::SchemaRegistry;

use crate::collection::{load_order, CollectionKind, Screening};
use crate::context::RegistryContext;
use crate::diagnostics::DiagnosticSink;
use crate::error::RegistryError;
use crate::events::load_events;
use crate::index::IndexDocument;
use crate::layout::RegistryLayout;
use crate::loader::{load_collection, LoadedCollection};
use crate::metadata::{CollectionCounts, RegistryMetadata};
use crate::references::cross_check;

/// Inputs to a run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub layout: RegistryLayout,
    /// Version tag selecting `event-schema.v<version>.json`.
    pub event_schema_version: String,
    /// Written into every index document.
    pub generated_at: Timestamp,
}

/// Per-collection numbers for the closing summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionTally {
    pub kind: CollectionKind,
    /// Record files encountered.
    pub files: usize,
    /// Records that passed every check.
    pub valid: usize,
    /// Records rejected by the loader (and, for events, by schema or
    /// reference screening).
    pub errors: usize,
    /// Entries written to the index. Exceeds `valid` when non-event
    /// records were flagged by the reference check.
    pub indexed: usize,
}

impl CollectionTally {
    fn from_loaded(collection: &LoadedCollection) -> Self {
        Self {
            kind: collection.kind(),
            files: collection.files(),
            valid: collection.valid(),
            errors: collection.errors(),
            indexed: collection.ok(),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One tally per collection, in [`CollectionKind`] order.
    pub tallies: Vec<CollectionTally>,
    /// Records rejected while loading non-event collections.
    pub loader_errors: usize,
    /// Non-event records flagged by the cross-collection reference check.
    pub reference_errors: usize,
    /// Event records rejected for any reason.
    pub event_errors: usize,
    /// Index documents written, in [`CollectionKind`] order.
    pub indexes: Vec<PathBuf>,
    pub metadata_path: PathBuf,
    pub generated_at: Timestamp,
}

impl RunReport {
    pub fn total_errors(&self) -> usize {
        self.loader_errors + self.reference_errors + self.event_errors
    }

    /// True when no record was rejected or flagged.
    pub fn passed(&self) -> bool {
        self.total_errors() == 0
    }

    pub fn tally(&self, kind: CollectionKind) -> Option<&CollectionTally> {
        self.tallies.iter().find(|t| t.kind == kind)
    }
}

/// Execute a full validation and indexing run.
///
/// # Errors
///
/// Any [`RegistryError`]: a missing collection directory, schema, or
/// metadata file aborts before any output is written. Write failures abort
/// the remaining writes.
pub fn run(
    options: &PipelineOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<RunReport, RegistryError> {
    let layout = &options.layout;

    let order = load_order()?;
    tracing::debug!(order = ?order, "collection load order resolved");

    let schemas = SchemaRegistry::load(&layout.schema_dir)?;
    let event_schema = schemas.event_schema(&options.event_schema_version)?;
    tracing::info!(schema = event_schema.schema_name(), "event schema compiled");

    let mut metadata = RegistryMetadata::load(&layout.metadata_path)?;

    let mut ctx = RegistryContext::new();
    let mut loader_errors = 0;
    for &kind in &order {
        if kind.spec().screening != Screening::CrossChecked {
            continue;
        }
        let loaded = load_collection(
            kind,
            &layout.collection_dir(kind),
            &layout.registry_dir,
            sink,
        )?;
        loader_errors += loaded.errors();
        ctx.insert(loaded);
    }

    let reference_errors = cross_check(&mut ctx, sink);

    let events = load_events(
        &layout.collection_dir(CollectionKind::Events),
        &layout.registry_dir,
        &event_schema,
        &ctx,
        sink,
    )?;
    let event_errors = events.errors();
    ctx.insert(events);

    let mut tallies = Vec::with_capacity(CollectionKind::ALL.len());
    let mut indexes = Vec::with_capacity(CollectionKind::ALL.len());
    for collection in ctx.collections() {
        let doc = IndexDocument::build(collection, options.generated_at);
        indexes.push(doc.write_to(&layout.index_dir)?);
        tallies.push(CollectionTally::from_loaded(collection));
    }

    let counts: Vec<CollectionCounts> = tallies
        .iter()
        .map(|t| CollectionCounts {
            kind: t.kind,
            files: t.files,
            valid: t.valid,
        })
        .collect();
    metadata.apply_counts(&counts);
    metadata.save()?;

    let report = RunReport {
        tallies,
        loader_errors,
        reference_errors,
        event_errors,
        indexes,
        metadata_path: metadata.path().to_path_buf(),
        generated_at: options.generated_at,
    };
    tracing::info!(
        loader_errors,
        reference_errors,
        event_errors,
        total_errors = report.total_errors(),
        "registry run complete"
    );
    Ok(report)
}
