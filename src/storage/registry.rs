//! Version manifest for the serving archive.
//!
//! The pusher appends one entry per published run to `manifest.json` at the
//! archive root. The manifest records versions in creation order, so the
//! serving adapter can resolve "latest" without relying on lexicographic
//! directory names.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{load_json, save_json, StorageError};

/// File name of the manifest at the archive root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One published model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Run identifier the model came from.
    pub run_id: String,
    /// Model path relative to the archive root.
    pub path: PathBuf,
    /// When the version was published.
    pub pushed_at: DateTime<Utc>,
}

/// Append-only list of published versions, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<ModelVersion>,
}

impl VersionManifest {
    /// Loads the manifest at `archive_root`, or an empty one if none exists.
    pub fn load(archive_root: &Path) -> Result<Self, StorageError> {
        match load_json(archive_root.join(MANIFEST_FILE)) {
            Ok(manifest) => Ok(manifest),
            Err(StorageError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Appends a version and persists the manifest atomically.
    pub fn push(
        archive_root: &Path,
        version: ModelVersion,
    ) -> Result<Self, StorageError> {
        let mut manifest = Self::load(archive_root)?;
        manifest.versions.push(version);
        save_json(archive_root.join(MANIFEST_FILE), &manifest)?;
        Ok(manifest)
    }

    /// The most recently published version, if any.
    pub fn latest(&self) -> Option<&ModelVersion> {
        self.versions.last()
    }
}
