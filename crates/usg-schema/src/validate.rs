//! # Schema Validation
//!
//! Runtime validation of registry records against JSON Schema definitions.
//!
//! ## Trust Boundary
//!
//! Event records must conform to the versioned event schema before any
//! reference check runs. Non-conforming records are rejected with
//! structured violations: the instance path, the schema path, and a
//! human-readable message.
//!
//! ## Schema Resolution
//!
//! Every `*.json` file in the schema directory is loaded and indexed by
//! filename and by its `$id`. Cross-schema `$ref`s resolve against that
//! index; anything unresolved (metaschemas included) resolves to `{}` so
//! that compilation never reaches the network.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;
use thiserror::Error;

/// Version tag of the event schema used when none is configured.
pub const DEFAULT_EVENT_SCHEMA_VERSION: &str = "1.0";

/// File name of the event schema for a version tag, e.g. `event-schema.v1.0.json`.
pub fn event_schema_file_name(version: &str) -> String {
    format!("event-schema.v{version}.json")
}

/// Resolves `$ref` URIs against schemas already loaded in memory.
struct LocalSchemaRetriever {
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        // Relative refs arrive joined onto the referrer's base URI; fall back
        // to the trailing file name.
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas_by_uri.get(filename) {
            return Ok(value.clone());
        }

        tracing::debug!(uri = uri_str, "unresolved schema reference; using permissive schema");
        Ok(serde_json::json!({}))
    }
}

/// Error loading or compiling schemas.
///
/// Every variant is fatal for a run: a registry cannot be trusted if its
/// event predicate is unavailable.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema directory could not be read.
    #[error("cannot read schema directory {path}: {source}")]
    DirectoryUnreadable {
        /// The schema directory.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A schema file could not be read or is not valid JSON.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema filename.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The requested schema is not present in the schema directory.
    #[error("required schema '{schema_name}' not found in {schema_dir}")]
    SchemaMissing {
        /// Schema filename.
        schema_name: String,
        /// Directory that was searched.
        schema_dir: PathBuf,
    },

    /// The schema could not be compiled into a validator.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema filename.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Non-empty collection of violations produced by one failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// All schema documents found in a schema directory, indexed by filename.
#[derive(Debug)]
pub struct SchemaRegistry {
    schema_dir: PathBuf,
    schemas: HashMap<String, Value>,
}

impl SchemaRegistry {
    /// Load every `*.json` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DirectoryUnreadable`] if the directory is
    /// missing and [`SchemaError::SchemaLoadError`] if any schema file is
    /// unreadable or not valid JSON.
    pub fn load(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = HashMap::new();

        let entries =
            std::fs::read_dir(&schema_dir).map_err(|source| SchemaError::DirectoryUnreadable {
                path: schema_dir.clone(),
                source,
            })?;

        for entry in entries {
            let entry = entry.map_err(|source| SchemaError::DirectoryUnreadable {
                path: schema_dir.clone(),
                source,
            })?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") || !path.is_file() {
                continue;
            }
            let content =
                std::fs::read_to_string(&path).map_err(|e| SchemaError::SchemaLoadError {
                    schema_name: name.to_string(),
                    reason: format!("cannot read file: {e}"),
                })?;
            let value: Value =
                serde_json::from_str(&content).map_err(|e| SchemaError::SchemaLoadError {
                    schema_name: name.to_string(),
                    reason: format!("invalid JSON: {e}"),
                })?;
            schemas.insert(name.to_string(), value);
        }

        tracing::debug!(
            schema_dir = %schema_dir.display(),
            schema_count = schemas.len(),
            "loaded schema registry"
        );

        Ok(Self {
            schema_dir,
            schemas,
        })
    }

    fn build_options(&self) -> ValidationOptions {
        let mut schemas_by_uri: HashMap<String, Value> = HashMap::new();
        for (filename, value) in &self.schemas {
            if let Some(id) = value.get("$id").and_then(|v| v.as_str()) {
                schemas_by_uri.insert(id.to_string(), value.clone());
            }
            schemas_by_uri.insert(filename.clone(), value.clone());
        }

        let mut opts = jsonschema::options();
        opts.should_validate_formats(true);
        opts.with_retriever(LocalSchemaRetriever { schemas_by_uri });
        opts
    }

    /// Compile a validator for a schema by filename.
    ///
    /// The draft is taken from the schema's `$schema` keyword.
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaMissing`] if no such schema was loaded;
    /// [`SchemaError::ValidatorBuildError`] if it does not compile.
    pub fn build_validator(&self, schema_name: &str) -> Result<Validator, SchemaError> {
        let schema_value =
            self.schemas
                .get(schema_name)
                .ok_or_else(|| SchemaError::SchemaMissing {
                    schema_name: schema_name.to_string(),
                    schema_dir: self.schema_dir.clone(),
                })?;

        self.build_options()
            .build(schema_value)
            .map_err(|e| SchemaError::ValidatorBuildError {
                schema_name: schema_name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Compile the event schema for `version`.
    pub fn event_schema(&self, version: &str) -> Result<EventSchema, SchemaError> {
        let schema_name = event_schema_file_name(version);
        let validator = self.build_validator(&schema_name)?;
        Ok(EventSchema {
            schema_name,
            validator,
        })
    }
}

/// The compiled conformance predicate for event records.
pub struct EventSchema {
    schema_name: String,
    validator: Validator,
}

impl EventSchema {
    /// Filename of the schema this predicate was compiled from.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Check a record against the schema.
    ///
    /// # Errors
    ///
    /// Returns every violation the validator reports when the record does
    /// not conform.
    pub fn validate(&self, record: &Value) -> Result<(), ValidationViolations> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(record)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationViolations { violations })
        }
    }
}

impl fmt::Debug for EventSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSchema")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}
