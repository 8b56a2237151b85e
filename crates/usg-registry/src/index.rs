//! # Index Builder
//!
//! Projects each collection's accepted records into an index document:
//!
//! ```json
//! {
//!   "index_version": "0.2.0",
//!   "generated_at": "2026-03-07T19:30:00Z",
//!   "schema": "urn:usg:index:teams:1.0",
//!   "count": 2,
//!   "teams": [ { "team_id": "T1", ... }, { "team_id": "T2", ... } ]
//! }
//! ```
//!
//! Entries are ordered by identifier (byte order), never by directory
//! enumeration order, so identical input yields identical output apart
//! from `generated_at`. Index files are rewritten whole on every run.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use usg_core::Timestamp;

use crate::collection::CollectionKind;
use crate::error::RegistryError;
use crate::loader::LoadedCollection;

/// Version tag written into every index document.
pub const INDEX_VERSION: &str = "0.2.0";

/// URN identifying the shape of a collection's index document.
pub fn index_schema_urn(kind: CollectionKind) -> String {
    format!("urn:usg:index:{}:1.0", kind.index_key())
}

/// File name of a collection's index document, e.g. `rights-bundles.index.json`.
pub fn index_file_name(kind: CollectionKind) -> String {
    format!("{}.index.json", kind.dir_name())
}

/// A generated index document for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    kind: CollectionKind,
    generated_at: Timestamp,
    entries: Vec<Map<String, Value>>,
}

impl IndexDocument {
    /// Project every accepted record of `collection`.
    pub fn build(collection: &LoadedCollection, generated_at: Timestamp) -> Self {
        let kind = collection.kind();
        let project = kind.spec().project;
        // `records()` iterates a BTreeMap, so entries arrive sorted by id.
        let entries = collection.records().map(project).collect();
        Self {
            kind,
            generated_at,
            entries,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Identifiers of the entries, in document order.
    pub fn ids(&self) -> Vec<&str> {
        let id_field = self.kind.id_field();
        self.entries
            .iter()
            .filter_map(|e| e.get(id_field).and_then(Value::as_str))
            .collect()
    }

    /// Write to `<index_dir>/<collection>.index.json`, creating the
    /// directory if needed. Returns the written path.
    pub fn write_to(&self, index_dir: &Path) -> Result<PathBuf, RegistryError> {
        std::fs::create_dir_all(index_dir).map_err(|source| RegistryError::Write {
            path: index_dir.to_path_buf(),
            source,
        })?;
        let path = index_dir.join(index_file_name(self.kind));
        write_json(&path, self)?;
        tracing::debug!(
            collection = %self.kind,
            count = self.count(),
            path = %path.display(),
            "index written"
        );
        Ok(path)
    }
}

impl Serialize for IndexDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("index_version", INDEX_VERSION)?;
        map.serialize_entry("generated_at", &self.generated_at.to_iso8601())?;
        map.serialize_entry("schema", &index_schema_urn(self.kind))?;
        map.serialize_entry("count", &self.entries.len())?;
        map.serialize_entry(self.kind.index_key(), &self.entries)?;
        map.end()
    }
}

/// Serialize `value` as two-space-indented JSON with a trailing newline and
/// replace `path` with it.
///
/// The bytes go to a sibling temporary file that is then renamed over
/// `path`, so readers never observe a partially written document. On
/// failure the temporary file is removed and `path` is left as it was.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), RegistryError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| RegistryError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');

    let tmp_path = tmp_sibling(path);
    if let Err(source) = write_then_rename(&tmp_path, path, &bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(RegistryError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_then_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(tmp_path, path)
}
