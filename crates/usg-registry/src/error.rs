//! Registry error types.
//!
//! Two tiers, matching how failures propagate:
//!
//! - [`RegistryError`]: structural preconditions and output failures.
//!   These abort the run.
//! - [`RecordError`]: why a single record file was rejected. These are
//!   reported, counted, and never halt the run.

use std::path::PathBuf;

use thiserror::Error;
use usg_schema::{SchemaError, ValidationViolations};

use crate::collection::CollectionKind;

/// A fatal registry error.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A collection directory does not exist.
    #[error("missing {collection} directory at {}", path.display())]
    MissingDirectory {
        collection: CollectionKind,
        path: PathBuf,
    },

    /// A collection directory exists but could not be enumerated.
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The registry metadata file does not exist.
    #[error("missing registry metadata at {}", path.display())]
    MissingMetadata { path: PathBuf },

    /// The registry metadata file is unreadable or not a JSON object.
    #[error("invalid registry metadata at {}: {reason}", path.display())]
    InvalidMetadata { path: PathBuf, reason: String },

    /// The event schema could not be loaded or compiled.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The declared references between collections contain a cycle.
    #[error("collection dependency cycle among: {0:?}")]
    DependencyCycle(Vec<CollectionKind>),

    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An output document could not be serialized.
    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Why a single record was rejected.
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    /// The file could not be read.
    #[error("cannot read file: {reason}")]
    Unreadable { reason: String },

    /// The file content is not valid structured data.
    #[error("invalid {format}: {reason}")]
    Parse { format: &'static str, reason: String },

    /// The parsed document is not a mapping of fields.
    #[error("record must be an object, found {found}")]
    NotAnObject { found: &'static str },

    /// The identifier field is absent, null, or empty.
    #[error("missing {field}")]
    MissingId { field: &'static str },

    /// The identifier field holds a non-string value.
    #[error("{field} must be a string, found {found}")]
    InvalidId {
        field: &'static str,
        found: &'static str,
    },

    /// Another record in the same collection already claimed this identifier.
    #[error("duplicate {field} {id:?} (already defined by {first_path})")]
    DuplicateId {
        field: &'static str,
        id: String,
        first_path: String,
    },

    /// The record does not conform to its schema.
    #[error("failed schema validation against {schema_name}: {violations}")]
    SchemaViolation {
        schema_name: String,
        violations: ValidationViolations,
    },

    /// A required reference is absent or empty.
    #[error("missing required reference {field} (-> {target})")]
    MissingReference {
        field: &'static str,
        target: CollectionKind,
    },

    /// A reference field holds a non-string value.
    #[error("{field} must be a string reference to {target}, found {found}")]
    InvalidReference {
        field: &'static str,
        target: CollectionKind,
        found: &'static str,
    },

    /// A reference does not resolve in its target collection.
    #[error("{field} references unknown {target} entry {value:?}")]
    DanglingReference {
        field: &'static str,
        target: CollectionKind,
        value: String,
    },
}

impl RecordError {
    /// True for reference-check failures.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Self::MissingReference { .. }
                | Self::InvalidReference { .. }
                | Self::DanglingReference { .. }
        )
    }
}

/// JSON type name of a value, for diagnostics.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
