//! JSON snapshot files shared by the rule and request stores.
//!
//! Each store owns one directory and one aggregate snapshot inside it. The
//! snapshot is always a pretty-printed JSON array holding the full current set
//! and is rewritten wholesale on every mutation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Failures while reading or writing store files.
///
/// Stores log these and keep serving from memory; they are never returned to
/// request handlers.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Location of a store's aggregate snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    dir: PathBuf,
    file_name: String,
}

impl SnapshotFile {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Directory holding the snapshot (and any sibling files the store writes).
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Create the store directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), PersistenceError> {
        if self.dir.is_dir() {
            info!("Using existing directory: {}", self.dir.display());
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;
        info!("Created directory: {}", self.dir.display());
        Ok(())
    }

    /// Read the snapshot. `Ok(None)` means there is no snapshot on disk yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>, PersistenceError> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(&path, e)),
        };
        let items = serde_json::from_str(&contents).map_err(|e| PersistenceError::json(&path, e))?;
        Ok(Some(items))
    }

    /// Overwrite the snapshot with `items`.
    pub fn save<T: Serialize>(&self, items: &[T]) -> Result<(), PersistenceError> {
        write_json_file(&self.path(), &items)
    }
}

/// Write a single value as pretty-printed JSON, replacing any existing file.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PersistenceError::json(path, e))?;
    fs::write(path, json).map_err(|e| PersistenceError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        value: u32,
    }

    #[test]
    fn test_ensure_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(tmp.path().join("a/b/c"), "items.json");

        snapshot.ensure_dir().unwrap();
        assert!(snapshot.dir().is_dir());

        // Second call reuses the directory
        snapshot.ensure_dir().unwrap();
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(tmp.path(), "items.json");

        let loaded: Option<Vec<Item>> = snapshot.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(tmp.path(), "items.json");
        let items = vec![
            Item {
                id: "a".into(),
                value: 1,
            },
            Item {
                id: "b".into(),
                value: 2,
            },
        ];

        snapshot.save(&items).unwrap();

        let raw = fs::read_to_string(snapshot.path()).unwrap();
        assert!(raw.contains('\n'), "snapshot should be pretty-printed");

        let loaded: Vec<Item> = snapshot.load().unwrap().unwrap();
        assert_eq!(loaded, items);
    }

    #[test]
    fn test_load_malformed_is_json_error() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(tmp.path(), "items.json");
        fs::write(snapshot.path(), "{ not json").unwrap();

        let result: Result<Option<Vec<Item>>, _> = snapshot.load();
        assert!(matches!(result, Err(PersistenceError::Json { .. })));
    }

    #[test]
    fn test_save_into_missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(tmp.path().join("missing"), "items.json");

        let result = snapshot.save::<Item>(&[]);
        assert!(matches!(result, Err(PersistenceError::Io { .. })));
    }
}
