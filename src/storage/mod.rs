//! Opaque-object persistence.
//!
//! Preprocessors, bundled predictors, labeled matrices, and the version
//! manifest are all saved as JSON blobs. Writes go through a temp file and a
//! rename so a crash never leaves a half-written object at the final path.

pub mod registry;

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from object persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to encode object for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode object at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes `value` to `path`, creating parent directories as needed.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), StorageError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_vec(value).map_err(|source| StorageError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = temp_sibling(path);
    fs::write(&tmp, &data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a JSON object from `path`. A missing file maps to
/// [`StorageError::NotFound`].
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, StorageError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_path_buf())
        } else {
            StorageError::Io(e)
        }
    })?;
    serde_json::from_slice(&data).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "object".to_string());
    path.with_file_name(format!("{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        values: Vec<f64>,
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deep").join("blob.json");
        let blob = Blob {
            name: "scaler".into(),
            values: vec![1.0, 2.5],
        };
        save_json(&path, &blob).expect("save");
        let back: Blob = load_json(&path).expect("load");
        assert_eq!(back, blob);
        // No temp file left behind.
        assert!(!path.with_file_name("blob.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_json::<Blob>(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
