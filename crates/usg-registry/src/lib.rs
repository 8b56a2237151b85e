//! # usg-registry — Validation & Indexing Engine
//!
//! Reads the record collections of a USG registry checkout, validates them,
//! and regenerates the derived artifacts:
//!
//! - [`collection`]: the six collections, their references, and the load
//!   order those references imply.
//! - [`loader`]: generic per-collection loading (parse, identify,
//!   deduplicate, digest).
//! - [`references`]: referential integrity between collections.
//! - [`events`]: strict event loading (schema conformance plus references).
//! - [`index`]: sorted, deterministic index documents.
//! - [`metadata`]: per-collection counts in `registry-metadata.json`.
//! - [`pipeline`]: one end-to-end run producing a [`RunReport`].
//!
//! ## Crate Policy
//!
//! - A structural problem (missing directory, schema, or metadata) is a
//!   [`RegistryError`] and aborts before anything is written.
//! - A problem with one record file is a [`RecordError`]. It is delivered
//!   to a [`DiagnosticSink`] and counted; the run continues.
//! - Output depends only on file contents and names, never on directory
//!   enumeration order.

pub mod collection;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod index;
pub mod layout;
pub mod loader;
pub mod metadata;
pub mod pipeline;
pub mod record;
pub mod references;

pub use collection::{load_order, CollectionKind, CollectionSpec, Reference, Requirement};
pub use context::RegistryContext;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink};
pub use error::{RecordError, RegistryError};
pub use index::{IndexDocument, INDEX_VERSION};
pub use layout::RegistryLayout;
pub use loader::LoadedCollection;
pub use metadata::RegistryMetadata;
pub use pipeline::{run, CollectionTally, PipelineOptions, RunReport};
pub use record::Record;
