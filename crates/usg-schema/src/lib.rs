//! # usg-schema — Schema Loading & Event Validation
//!
//! Wraps the externally supplied JSON Schema documents that define the
//! shape of registry records. The schema content is opaque to this crate;
//! its job is loading, compiling, invoking, and translating failures into
//! structured [`Violation`]s.
//!
//! - [`SchemaRegistry`]: loads every `*.json` schema in a directory and
//!   resolves cross-schema `$ref`s locally.
//! - [`EventSchema`]: the compiled predicate for event records, selected
//!   by version tag (`event-schema.v<version>.json`).
//!
//! ## Crate Policy
//!
//! - A missing or uncompilable schema is a startup error, never a
//!   per-record error.
//! - No network retrieval: unresolved `$ref`s resolve to a permissive
//!   empty schema.

pub mod validate;

pub use validate::{
    event_schema_file_name, EventSchema, SchemaError, SchemaRegistry, ValidationViolations,
    Violation, DEFAULT_EVENT_SCHEMA_VERSION,
};
