//! # Event Loader & Validator
//!
//! Events are the only strictly screened collection: on top of the generic
//! loader's parse, identity, and uniqueness checks, each event must conform
//! to the event schema and resolve all of its references against the
//! collections already in the context. Any failure excludes the event.
//!
//! Check order per event: parse → identifier → duplicate → schema →
//! league → home team → away team → broadcaster → venue → rights bundle.

use std::path::Path;

use serde_json::Value;
use usg_schema::EventSchema;

use crate::collection::CollectionKind;
use crate::context::RegistryContext;
use crate::diagnostics::DiagnosticSink;
use crate::error::{RecordError, RegistryError};
use crate::loader::{load_screened, LoadedCollection};
use crate::references::check_references;

/// Load and validate the events directory.
///
/// `ctx` must already hold every collection events reference.
pub fn load_events(
    dir: &Path,
    registry_dir: &Path,
    schema: &EventSchema,
    ctx: &RegistryContext,
    sink: &mut dyn DiagnosticSink,
) -> Result<LoadedCollection, RegistryError> {
    let kind = CollectionKind::Events;
    let references = kind.references();

    load_screened(kind, dir, registry_dir, sink, |record| {
        let document = Value::Object(record.fields().clone());
        schema
            .validate(&document)
            .map_err(|violations| RecordError::SchemaViolation {
                schema_name: schema.schema_name().to_string(),
                violations,
            })?;
        check_references(record, references, ctx)
    })
}
