//! On-disk layout of a registry checkout.

use std::path::{Path, PathBuf};

use crate::collection::CollectionKind;

/// Paths the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLayout {
    /// Parent of every collection directory; record paths are relative to it.
    pub registry_dir: PathBuf,
    pub schema_dir: PathBuf,
    pub index_dir: PathBuf,
    pub metadata_path: PathBuf,
}

impl RegistryLayout {
    /// The conventional layout under a repository root:
    ///
    /// ```text
    /// <root>/registry/<collection>/...
    /// <root>/registry/_index/
    /// <root>/registry/registry-metadata.json
    /// <root>/schemas/usg/
    /// ```
    pub fn from_root(root: &Path) -> Self {
        let registry_dir = root.join("registry");
        Self {
            schema_dir: root.join("schemas").join("usg"),
            index_dir: registry_dir.join("_index"),
            metadata_path: registry_dir.join("registry-metadata.json"),
            registry_dir,
        }
    }

    pub fn collection_dir(&self, kind: CollectionKind) -> PathBuf {
        self.registry_dir.join(kind.dir_name())
    }
}
