//! # Object Loader
//!
//! Loads one collection directory into an identifier → record map.
//!
//! ## Per-file pipeline
//!
//! 1. **Enumerate**: regular files directly in the directory with a record
//!    extension (`.json`, `.yaml`, `.yml`), processed in file-name order.
//! 2. **Parse**: unreadable or malformed files are reported and skipped.
//! 3. **Identify**: the identifier field must be a non-empty string.
//! 4. **Deduplicate**: the first accepted record for an identifier wins;
//!    later claimants are reported and skipped.
//! 5. **Screen**: an optional collection-specific check (schema and
//!    references for events). Failures are reported and skipped.
//! 6. **Accept**: the record is stored with its relative path and digest.
//!
//! A missing directory is fatal. Everything else is a per-record error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use usg_core::sha256_hex;

use crate::collection::CollectionKind;
use crate::diagnostics::{report, DiagnosticSink};
use crate::error::{RecordError, RegistryError};
use crate::record::{extract_id, relative_path, Record, RecordFormat};

/// The outcome of loading one collection.
#[derive(Debug, Clone)]
pub struct LoadedCollection {
    kind: CollectionKind,
    records: BTreeMap<String, Record>,
    files: usize,
    errors: usize,
    flagged: BTreeSet<String>,
}

impl LoadedCollection {
    /// An empty collection with no files seen.
    pub fn empty(kind: CollectionKind) -> Self {
        Self {
            kind,
            records: BTreeMap::new(),
            files: 0,
            errors: 0,
            flagged: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Accepted records, ascending by identifier.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Accepted identifiers, ascending.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|k| k.as_str())
    }

    /// Record files encountered.
    pub fn files(&self) -> usize {
        self.files
    }

    /// Records accepted by the loader.
    pub fn ok(&self) -> usize {
        self.records.len()
    }

    /// Records rejected by the loader.
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Records that passed every check: accepted and not flagged by a
    /// later cross-collection check.
    pub fn valid(&self) -> usize {
        self.records.len() - self.flagged.len()
    }

    /// Mark an accepted record as failing a cross-collection check.
    ///
    /// The record stays in the map. Returns false if the id is unknown or
    /// already flagged.
    pub fn flag(&mut self, id: &str) -> bool {
        self.records.contains_key(id) && self.flagged.insert(id.to_string())
    }

    pub fn is_flagged(&self, id: &str) -> bool {
        self.flagged.contains(id)
    }
}

/// Load a collection with no screening beyond shape and uniqueness.
///
/// # Errors
///
/// [`RegistryError::MissingDirectory`] if `dir` does not exist.
pub fn load_collection(
    kind: CollectionKind,
    dir: &Path,
    registry_dir: &Path,
    sink: &mut dyn DiagnosticSink,
) -> Result<LoadedCollection, RegistryError> {
    load_screened(kind, dir, registry_dir, sink, |_| Ok(()))
}

/// Load a collection, running `screen` on each uniquely identified record
/// before accepting it.
pub fn load_screened<F>(
    kind: CollectionKind,
    dir: &Path,
    registry_dir: &Path,
    sink: &mut dyn DiagnosticSink,
    mut screen: F,
) -> Result<LoadedCollection, RegistryError>
where
    F: FnMut(&Record) -> Result<(), RecordError>,
{
    let files = list_record_files(kind, dir)?;
    let id_field = kind.id_field();
    let mut loaded = LoadedCollection::empty(kind);
    loaded.files = files.len();

    for (path, format) in files {
        let rel = relative_path(registry_dir, &path);

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                loaded.errors += 1;
                report(sink, kind, rel, RecordError::Unreadable { reason: e.to_string() });
                continue;
            }
        };

        let fields = match format.parse(&bytes) {
            Ok(f) => f,
            Err(e) => {
                loaded.errors += 1;
                report(sink, kind, rel, e);
                continue;
            }
        };

        let id = match extract_id(&fields, id_field) {
            Ok(id) => id,
            Err(e) => {
                loaded.errors += 1;
                report(sink, kind, rel, e);
                continue;
            }
        };

        if let Some(first) = loaded.records.get(&id) {
            let error = RecordError::DuplicateId {
                field: id_field,
                id: id.clone(),
                first_path: first.path().to_string(),
            };
            loaded.errors += 1;
            report(sink, kind, rel, error);
            continue;
        }

        let record = Record::new(id, rel, sha256_hex(&bytes), fields);
        if let Err(e) = screen(&record) {
            loaded.errors += 1;
            report(sink, kind, record.id(), e);
            continue;
        }

        loaded.records.insert(record.id().to_string(), record);
    }

    tracing::info!(
        collection = %kind,
        files = loaded.files,
        ok = loaded.ok(),
        errors = loaded.errors,
        "collection loaded"
    );

    Ok(loaded)
}

/// Record files directly inside `dir`, sorted by file name.
fn list_record_files(
    kind: CollectionKind,
    dir: &Path,
) -> Result<Vec<(PathBuf, RecordFormat)>, RegistryError> {
    if !dir.is_dir() {
        return Err(RegistryError::MissingDirectory {
            collection: kind,
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| RegistryError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RegistryError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(format) = RecordFormat::from_path(&path) {
            files.push((path, format));
        }
    }
    files.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    fn setup(files: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("teams");
        std::fs::create_dir_all(&dir).unwrap();
        for (name, body) in files {
            std::fs::write(dir.join(name), body).unwrap();
        }
        (root, dir)
    }

    #[test]
    fn loads_valid_records_with_path_and_digest() {
        let body = r#"{"team_id": "T1", "league_id": "L1"}"#;
        let (root, dir) = setup(&[("T1.json", body)]);
        let mut sink = CollectingSink::new();

        let loaded = load_collection(CollectionKind::Teams, &dir, root.path(), &mut sink).unwrap();

        assert!(sink.is_empty());
        assert_eq!((loaded.files(), loaded.ok(), loaded.errors()), (1, 1, 0));
        let record = loaded.get("T1").unwrap();
        assert_eq!(record.path(), "teams/T1.json");
        assert_eq!(record.digest(), sha256_hex(body.as_bytes()));
        assert!(!record.fields().contains_key("path"));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let err = load_collection(
            CollectionKind::Venues,
            &root.path().join("venues"),
            root.path(),
            &mut CollectingSink::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingDirectory { collection: CollectionKind::Venues, .. }
        ));
    }

    #[test]
    fn malformed_and_shapeless_files_are_skipped() {
        let (root, dir) = setup(&[
            ("a.json", "{ not json"),
            ("b.json", r#"{"name": "no id"}"#),
            ("c.json", r#"{"team_id": 12}"#),
            ("d.json", r#"{"team_id": "T4"}"#),
            ("notes.txt", "ignored"),
        ]);
        let mut sink = CollectingSink::new();

        let loaded = load_collection(CollectionKind::Teams, &dir, root.path(), &mut sink).unwrap();

        assert_eq!((loaded.files(), loaded.ok(), loaded.errors()), (4, 1, 3));
        let subjects: Vec<&str> = sink.diagnostics().iter().map(|d| d.subject.as_str()).collect();
        assert_eq!(subjects, vec!["teams/a.json", "teams/b.json", "teams/c.json"]);
    }

    #[test]
    fn duplicate_identifier_first_file_wins() {
        let (root, dir) = setup(&[
            ("a.json", r#"{"team_id": "T1", "name": "first"}"#),
            ("b.json", r#"{"team_id": "T1", "name": "second"}"#),
        ]);
        let mut sink = CollectingSink::new();

        let loaded = load_collection(CollectionKind::Teams, &dir, root.path(), &mut sink).unwrap();

        assert_eq!(loaded.ok(), 1);
        assert_eq!(loaded.errors(), 1);
        assert_eq!(loaded.get("T1").unwrap().get("name").unwrap(), "first");
        assert!(matches!(
            &sink.diagnostics()[0].error,
            RecordError::DuplicateId { first_path, .. } if first_path == "teams/a.json"
        ));
    }

    #[test]
    fn yaml_records_load() {
        let (root, dir) = setup(&[("T9.yaml", "team_id: T9\nleague_id: L1\n")]);
        let loaded = load_collection(
            CollectionKind::Teams,
            &dir,
            root.path(),
            &mut CollectingSink::new(),
        )
        .unwrap();
        assert_eq!(loaded.get("T9").unwrap().path(), "teams/T9.yaml");
    }

    #[test]
    fn screen_failure_excludes_record() {
        let (root, dir) = setup(&[
            ("a.json", r#"{"team_id": "T1"}"#),
            ("b.json", r#"{"team_id": "T2"}"#),
        ]);
        let mut sink = CollectingSink::new();

        let loaded = load_screened(CollectionKind::Teams, &dir, root.path(), &mut sink, |r| {
            if r.id() == "T2" {
                Err(RecordError::MissingReference {
                    field: "league_id",
                    target: CollectionKind::Leagues,
                })
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec!["T1"]);
        assert_eq!(loaded.errors(), 1);
        assert_eq!(sink.diagnostics()[0].subject, "T2");
    }

    #[test]
    fn flagged_records_stay_but_are_not_valid() {
        let (root, dir) = setup(&[("a.json", r#"{"team_id": "T1"}"#)]);
        let mut loaded = load_collection(
            CollectionKind::Teams,
            &dir,
            root.path(),
            &mut CollectingSink::new(),
        )
        .unwrap();

        assert!(loaded.flag("T1"));
        assert!(!loaded.flag("T1"));
        assert!(!loaded.flag("nope"));
        assert!(loaded.contains("T1"));
        assert_eq!(loaded.valid(), 0);
    }
}
