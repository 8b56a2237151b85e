//! # Registry Metadata
//!
//! `registry-metadata.json` is owned by registry maintainers. A run only
//! rewrites the `counts` object: `<index_key>_files` and `<index_key>_valid`
//! per collection. Every other top-level field, and any other key inside
//! `counts`, is carried through untouched and in its original order.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::collection::CollectionKind;
use crate::error::{json_type_name, RegistryError};
use crate::index::write_json;

/// Per-collection numbers written into `counts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionCounts {
    pub kind: CollectionKind,
    pub files: usize,
    pub valid: usize,
}

/// The parsed metadata document and where it came from.
#[derive(Debug, Clone)]
pub struct RegistryMetadata {
    path: PathBuf,
    document: Map<String, Value>,
}

impl RegistryMetadata {
    /// Read and parse the metadata file.
    ///
    /// # Errors
    ///
    /// [`RegistryError::MissingMetadata`] when the file does not exist,
    /// [`RegistryError::InvalidMetadata`] when it cannot be read or is not a
    /// JSON object.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.is_file() {
            return Err(RegistryError::MissingMetadata {
                path: path.to_path_buf(),
            });
        }
        let invalid = |reason: String| RegistryError::InvalidMetadata {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;
        match value {
            Value::Object(document) => Ok(Self {
                path: path.to_path_buf(),
                document,
            }),
            other => Err(invalid(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `counts` object, if present.
    pub fn counts(&self) -> Option<&Map<String, Value>> {
        self.document.get("counts").and_then(Value::as_object)
    }

    /// Overwrite the count fields for each collection in `tallies`.
    ///
    /// A missing or non-object `counts` is replaced by an object.
    pub fn apply_counts(&mut self, tallies: &[CollectionCounts]) {
        let counts = self
            .document
            .entry("counts")
            .or_insert_with(|| Value::Object(Map::new()));
        if !counts.is_object() {
            tracing::warn!(path = %self.path.display(), "metadata counts is not an object; replacing");
            *counts = Value::Object(Map::new());
        }
        let Value::Object(counts) = counts else {
            return;
        };
        for tally in tallies {
            let key = tally.kind.index_key();
            counts.insert(format!("{key}_files"), Value::from(tally.files));
            counts.insert(format!("{key}_valid"), Value::from(tally.valid));
        }
    }

    /// Write the document back to where it was loaded from.
    pub fn save(&self) -> Result<(), RegistryError> {
        write_json(&self.path, &self.document)?;
        tracing::debug!(path = %self.path.display(), "registry metadata updated");
        Ok(())
    }
}
