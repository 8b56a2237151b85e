//! Optional YAML configuration for `usg validate`.
//!
//! ```yaml
//! registry_dir: registry
//! schema_dir: schemas/usg
//! index_dir: registry/_index
//! metadata_file: registry/registry-metadata.json
//! event_schema_version: "1.0"
//! ```
//!
//! Every key is optional. Relative paths are taken against the repository
//! root. `index_dir` and `metadata_file` default to locations inside
//! `registry_dir`, so moving the registry moves them too.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use usg_registry::RegistryLayout;

use crate::under_root;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    pub registry_dir: Option<PathBuf>,
    pub schema_dir: Option<PathBuf>,
    pub index_dir: Option<PathBuf>,
    pub metadata_file: Option<PathBuf>,
    pub event_schema_version: Option<String>,
}

impl ValidatorConfig {
    /// Parse a config file. An empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// The registry layout under `repo_root` with this config's overrides.
    pub fn layout(&self, repo_root: &Path) -> RegistryLayout {
        let anchor = |p: &PathBuf| under_root(p, repo_root);

        let mut layout = RegistryLayout::from_root(repo_root);
        if let Some(dir) = &self.registry_dir {
            layout.registry_dir = anchor(dir);
            layout.index_dir = layout.registry_dir.join("_index");
            layout.metadata_path = layout.registry_dir.join("registry-metadata.json");
        }
        if let Some(dir) = &self.schema_dir {
            layout.schema_dir = anchor(dir);
        }
        if let Some(dir) = &self.index_dir {
            layout.index_dir = anchor(dir);
        }
        if let Some(file) = &self.metadata_file {
            layout.metadata_path = anchor(file);
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_conventional_layout() {
        let root = Path::new("/repo");
        assert_eq!(
            ValidatorConfig::default().layout(root),
            RegistryLayout::from_root(root)
        );
    }

    #[test]
    fn registry_dir_moves_index_and_metadata() {
        let config = ValidatorConfig {
            registry_dir: Some(PathBuf::from("data/reg")),
            ..Default::default()
        };
        let layout = config.layout(Path::new("/repo"));
        assert_eq!(layout.registry_dir, Path::new("/repo/data/reg"));
        assert_eq!(layout.index_dir, Path::new("/repo/data/reg/_index"));
        assert_eq!(
            layout.metadata_path,
            Path::new("/repo/data/reg/registry-metadata.json")
        );
        assert_eq!(layout.schema_dir, Path::new("/repo/schemas/usg"));
    }

    #[test]
    fn explicit_paths_override() {
        let config = ValidatorConfig {
            schema_dir: Some(PathBuf::from("/opt/schemas")),
            index_dir: Some(PathBuf::from("out/index")),
            ..Default::default()
        };
        let layout = config.layout(Path::new("/repo"));
        assert_eq!(layout.schema_dir, Path::new("/opt/schemas"));
        assert_eq!(layout.index_dir, Path::new("/repo/out/index"));
    }

    #[test]
    fn load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usg.yaml");
        std::fs::write(&path, "event_schema_version: \"1.1\"\nschema_dir: s\n").unwrap();

        let config = ValidatorConfig::load(&path).unwrap();
        assert_eq!(config.event_schema_version.as_deref(), Some("1.1"));
        assert_eq!(config.schema_dir, Some(PathBuf::from("s")));
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usg.yaml");
        std::fs::write(&path, "registry_directory: oops\n").unwrap();
        assert!(ValidatorConfig::load(&path).is_err());
    }

    #[test]
    fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usg.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(ValidatorConfig::load(&path).unwrap(), ValidatorConfig::default());
    }
}
