//! # usg-cli — Command-Line Interface for the USG Registry
//!
//! Provides the `usg` binary. Argument parsing and terminal output live
//! here; validation, indexing, and metadata updates are delegated to
//! `usg-registry`.
//!
//! ```bash
//! usg validate
//! usg validate --generated-at 2026-03-07T19:30:00Z -v
//! usg --root /srv/registry --config usg.yaml validate --schema-version 1.1
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: every record passed.
//! - `1`: at least one record was rejected or flagged.
//! - `2`: the run could not complete (missing directory, schema, or
//!   metadata, unreadable config, write failure).

pub mod config;
pub mod validate;

use std::path::{Path, PathBuf};

/// Anchor an output or layout path at the repository root.
///
/// Unlike [`resolve_path`] the target need not exist yet.
pub fn under_root(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

/// Resolve a path that may be relative to the repository root.
///
/// Absolute paths are returned as-is. A relative path that exists under
/// `repo_root` resolves there; otherwise it is left relative to the
/// current directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}

/// Walk up from `start` to the first directory containing both
/// `registry/` and `schemas/`.
pub fn resolve_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join("registry").is_dir() && dir.join("schemas").is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
